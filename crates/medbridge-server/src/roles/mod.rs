//! HTTP surfaces of the three services.

pub mod clinician;
pub mod hub;
pub mod intake;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use medbridge_core::{NewPatient, Patient};
use medbridge_fhir::FhirClient;
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};

/// `{"status": "<code>"}` body of the satellites' status-update endpoints.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Validate locally, then forward to the hub.
pub(crate) async fn relay_status_update(
    fhir: &FhirClient,
    encounter_id: &str,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    fhir.update_encounter_status(encounter_id, &request.status)
        .await?;
    Ok(Json(json!({ "message": "Status updated successfully" })))
}

pub(crate) fn validate_new_patient(patient: &NewPatient) -> ApiResult<()> {
    if patient.first_name.trim().is_empty()
        || patient.last_name.trim().is_empty()
        || patient.date_of_birth.trim().is_empty()
    {
        return Err(ApiError::bad_request(
            "first_name, last_name, and date_of_birth are required",
        ));
    }
    Ok(())
}

pub(crate) fn patient_json(patient: &Patient) -> ApiResult<Value> {
    serde_json::to_value(patient).map_err(|e| ApiError::internal(e.to_string()))
}

/// Record ids arrive as JSON strings or numbers.
pub(crate) fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        _ => Err(serde::de::Error::custom("expected a string or numeric id")),
    }
}
