//! Intake: local patient registry, relayed to the hub over MLLP, and a
//! thin encounter front end over the hub's FHIR surface.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use medbridge_core::{NewPatient, Patient, event_types};
use medbridge_fhir::{EncounterSummary, FhirClient, PractitionerSummary};
use medbridge_hl7::AdtSender;
use medbridge_storage::{MemoryStore, PatientRepository};
use serde::Deserialize;
use serde_json::{Value, json};
use time::OffsetDateTime;

use super::{
    UpdateStatusRequest, id_from_string_or_number, patient_json, relay_status_update,
    validate_new_patient,
};
use crate::error::{ApiError, ApiResult};
use crate::receiver;
use crate::ws::{self, HubHandle};

#[derive(Clone)]
pub struct IntakeState {
    pub patients: Arc<dyn PatientRepository>,
    pub adt: Arc<AdtSender>,
    pub fhir: FhirClient,
    pub ws: HubHandle,
}

impl IntakeState {
    pub fn new(store: Arc<MemoryStore>, adt: AdtSender, fhir: FhirClient, ws: HubHandle) -> Self {
        Self {
            patients: store,
            adt: Arc::new(adt),
            fhir,
            ws,
        }
    }

    fn relay_admission(&self, patient: Patient) {
        let adt = Arc::clone(&self.adt);
        tokio::spawn(async move {
            match adt.send_admission(&patient).await {
                Ok(outcome) => {
                    tracing::info!(patient_id = %patient.id, ?outcome, "admission relayed to hub");
                }
                Err(e) => {
                    tracing::warn!(patient_id = %patient.id, error = %e, "admission relay failed");
                }
            }
        });
    }

    fn relay_discharge(&self, patient_id: String, hub_id: String) {
        let adt = Arc::clone(&self.adt);
        tokio::spawn(async move {
            match adt.send_discharge(&patient_id, &hub_id).await {
                Ok(outcome) => {
                    tracing::info!(%patient_id, %hub_id, ?outcome, "discharge relayed to hub");
                }
                Err(e) => {
                    tracing::warn!(%patient_id, %hub_id, error = %e, "discharge relay failed");
                }
            }
        });
    }
}

pub fn routes(state: IntakeState) -> Router {
    let ws = state.ws.clone();
    Router::new()
        .route("/api/patients", get(list_patients).post(create_patient))
        .route("/api/patients/{id}", get(get_patient).delete(delete_patient))
        .route("/api/encounters", get(list_encounters).post(create_encounter))
        .route("/api/encounters/{id}/status", patch(update_encounter_status))
        .route("/api/practitioners", get(list_practitioners))
        .with_state(state)
        .merge(ws::routes(ws.clone()))
        .merge(receiver::routes(ws))
}

async fn list_patients(State(state): State<IntakeState>) -> ApiResult<Json<Vec<Patient>>> {
    Ok(Json(state.patients.get_all_patients().await?))
}

async fn create_patient(
    State(state): State<IntakeState>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(new) = payload?;
    validate_new_patient(&new)?;

    let patient = state.patients.create_patient(new).await?;
    tracing::info!(patient_id = %patient.id, "patient registered");

    let data = patient_json(&patient)?;
    state
        .ws
        .broadcast(event_types::PATIENT_CREATED, data.clone())
        .await;
    state.relay_admission(patient);

    Ok((StatusCode::CREATED, Json(data)))
}

fn patient_not_found(err: medbridge_storage::StorageError) -> ApiError {
    if err.is_not_found() {
        ApiError::not_found("patient not found")
    } else {
        err.into()
    }
}

async fn get_patient(
    State(state): State<IntakeState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Patient>> {
    let patient = state
        .patients
        .get_patient_by_id(&id)
        .await
        .map_err(patient_not_found)?;
    Ok(Json(patient))
}

async fn delete_patient(
    State(state): State<IntakeState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let patient = state
        .patients
        .delete_patient(&id)
        .await
        .map_err(patient_not_found)?;
    tracing::info!(patient_id = %patient.id, "patient deleted");

    state
        .ws
        .broadcast(event_types::PATIENT_DELETED, json!({ "id": patient.id }))
        .await;
    match patient.hub_id.filter(|hub_id| !hub_id.is_empty()) {
        Some(hub_id) => state.relay_discharge(patient.id, hub_id),
        None => tracing::debug!(patient_id = %id, "patient never reached the hub, no discharge sent"),
    }

    Ok(Json(json!({ "message": "patient deleted successfully" })))
}

async fn list_encounters(
    State(state): State<IntakeState>,
) -> ApiResult<Json<Vec<EncounterSummary>>> {
    Ok(Json(state.fhir.get_encounters().await?))
}

#[derive(Debug, Deserialize)]
struct CreateEncounterRequest {
    #[serde(deserialize_with = "id_from_string_or_number")]
    patient_id: String,
    practitioner_id: String,
    #[serde(with = "time::serde::rfc3339")]
    start_time: OffsetDateTime,
}

async fn create_encounter(
    State(state): State<IntakeState>,
    payload: Result<Json<CreateEncounterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(request) = payload?;
    let patient = state
        .patients
        .get_patient_by_id(&request.patient_id)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                ApiError::bad_request("patient not found")
            } else {
                e.into()
            }
        })?;
    let Some(hub_id) = patient.hub_id.filter(|hub_id| !hub_id.is_empty()) else {
        return Err(ApiError::bad_request(
            "patient does not have HIS Patient ID yet",
        ));
    };

    let encounter_id = state
        .fhir
        .create_encounter(&hub_id, &request.practitioner_id, request.start_time)
        .await?;
    tracing::info!(%encounter_id, patient_id = %patient.id, "encounter created at hub");
    Ok((StatusCode::CREATED, Json(json!({ "id": encounter_id }))))
}

async fn update_encounter_status(
    State(state): State<IntakeState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    relay_status_update(&state.fhir, &id, payload).await
}

async fn list_practitioners(
    State(state): State<IntakeState>,
) -> ApiResult<Json<Vec<PractitionerSummary>>> {
    Ok(Json(state.fhir.get_practitioners().await?))
}
