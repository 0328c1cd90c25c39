//! Hub: canonical store, FHIR gateway and MLLP endpoint.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use medbridge_core::{NewPatient, event_types};
use medbridge_fhir::bundle::searchset;
use medbridge_fhir::{
    EncounterResource, PractitionerResource, encounter_to_fhir, practitioner_to_fhir,
    status_from_patch,
};
use medbridge_hl7::{AdtHandler, MessageHandler};
use medbridge_notifications::{EncounterEvent, EncounterNotifier};
use medbridge_storage::{
    EncounterRepository, MemoryStore, PatientRepository, PractitionerRepository,
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{patient_json, validate_new_patient};
use crate::error::{ApiError, ApiResult};
use crate::ws::{self, HubHandle};

#[derive(Clone)]
pub struct HubState {
    pub patients: Arc<dyn PatientRepository>,
    pub practitioners: Arc<dyn PractitionerRepository>,
    pub encounters: Arc<dyn EncounterRepository>,
    pub notifier: EncounterNotifier,
    pub ws: HubHandle,
}

impl HubState {
    pub fn new(store: Arc<MemoryStore>, notifier: EncounterNotifier, ws: HubHandle) -> Self {
        Self {
            patients: store.clone(),
            practitioners: store.clone(),
            encounters: store,
            notifier,
            ws,
        }
    }

    /// Local broadcast plus one detached notification per satellite.
    async fn publish_encounter(&self, event: EncounterEvent, resource: &Value) {
        self.ws.broadcast(event.as_str(), resource.clone()).await;
        drop(self.notifier.notify(event, resource.clone()));
    }
}

/// ADT dispatch into the canonical patient store, publishing to hub UIs.
pub fn adt_handler(state: &HubState) -> Arc<dyn MessageHandler> {
    Arc::new(AdtHandler::new(
        state.patients.clone(),
        Arc::new(state.ws.clone()),
    ))
}

pub fn routes(state: HubState) -> Router {
    let ws = state.ws.clone();
    Router::new()
        .route(
            "/fhir/Practitioner",
            get(list_practitioners).post(create_practitioner),
        )
        .route("/fhir/Practitioner/{id}", get(get_practitioner))
        .route("/fhir/Encounter", get(list_encounters).post(create_encounter))
        .route(
            "/fhir/Encounter/{id}",
            get(get_encounter).patch(update_encounter_status),
        )
        .route("/api/patients", get(list_patients).post(create_patient))
        .route("/api/patients/batch-delete", post(batch_delete_patients))
        .route("/api/patients/{id}", get(get_patient))
        .with_state(state)
        .merge(ws::routes(ws))
}

fn expect_resource_type(body: &Value, expected: &str) -> ApiResult<()> {
    match body.get("resourceType").and_then(Value::as_str) {
        Some(found) if found != expected => Err(ApiError::bad_request(format!(
            "expected resourceType {expected}, got {found}"
        ))),
        _ => Ok(()),
    }
}

async fn list_practitioners(State(state): State<HubState>) -> ApiResult<Json<Value>> {
    let practitioners = state.practitioners.get_all_practitioners().await?;
    Ok(Json(searchset(
        practitioners.iter().map(practitioner_to_fhir).collect(),
    )))
}

async fn create_practitioner(
    State(state): State<HubState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(body) = payload?;
    expect_resource_type(&body, medbridge_fhir::practitioner::RESOURCE_TYPE)?;
    let new = PractitionerResource::new(&body).to_new_practitioner()?;
    let practitioner = state.practitioners.create_practitioner(new).await?;
    tracing::info!(practitioner_id = %practitioner.id, "practitioner created");
    Ok((StatusCode::CREATED, Json(practitioner_to_fhir(&practitioner))))
}

async fn get_practitioner(
    State(state): State<HubState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let practitioner = state.practitioners.get_practitioner_by_id(&id).await?;
    Ok(Json(practitioner_to_fhir(&practitioner)))
}

async fn list_encounters(State(state): State<HubState>) -> ApiResult<Json<Value>> {
    let encounters = state.encounters.get_all_encounters().await?;
    Ok(Json(searchset(
        encounters.iter().map(encounter_to_fhir).collect(),
    )))
}

async fn create_encounter(
    State(state): State<HubState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(body) = payload?;
    expect_resource_type(&body, medbridge_fhir::encounter::RESOURCE_TYPE)?;
    let new = EncounterResource::new(&body).to_new_encounter()?;
    let encounter = state.encounters.create_encounter(new).await?;
    let details = state.encounters.get_encounter_by_id(&encounter.id).await?;
    let resource = encounter_to_fhir(&details);
    tracing::info!(
        encounter_id = %encounter.id,
        patient_id = %encounter.patient_id,
        practitioner_id = %encounter.practitioner_id,
        status = %encounter.status,
        "encounter created"
    );

    state
        .publish_encounter(EncounterEvent::Created, &resource)
        .await;
    Ok((StatusCode::CREATED, Json(resource)))
}

async fn get_encounter(
    State(state): State<HubState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let details = state.encounters.get_encounter_by_id(&id).await?;
    Ok(Json(encounter_to_fhir(&details)))
}

async fn update_encounter_status(
    State(state): State<HubState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = payload?;
    let status = status_from_patch(&body)?;
    state.encounters.update_encounter_status(&id, status).await?;
    let details = state.encounters.get_encounter_by_id(&id).await?;
    let resource = encounter_to_fhir(&details);
    tracing::info!(encounter_id = %id, status = %status, "encounter status updated");

    state
        .publish_encounter(EncounterEvent::StatusUpdated, &resource)
        .await;
    Ok(Json(resource))
}

async fn list_patients(State(state): State<HubState>) -> ApiResult<Json<Value>> {
    let patients = state.patients.get_all_patients().await?;
    serde_json::to_value(patients)
        .map(Json)
        .map_err(|e| ApiError::internal(e.to_string()))
}

async fn get_patient(
    State(state): State<HubState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let patient = state
        .patients
        .get_patient_by_id(&id)
        .await
        .map_err(|e| match e {
            e if e.is_not_found() => ApiError::not_found("patient not found"),
            e => e.into(),
        })?;
    Ok(Json(patient_json(&patient)?))
}

/// Register a canonical patient directly, outside the MLLP path.
async fn create_patient(
    State(state): State<HubState>,
    payload: Result<Json<NewPatient>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(new) = payload?;
    validate_new_patient(&new)?;
    let patient = state.patients.create_patient(new).await?;
    let data = patient_json(&patient)?;
    state
        .ws
        .broadcast(event_types::PATIENT_CREATED, data.clone())
        .await;
    Ok((StatusCode::CREATED, Json(data)))
}

#[derive(Debug, Deserialize)]
struct BatchDeleteRequest {
    ids: Vec<String>,
}

async fn batch_delete_patients(
    State(state): State<HubState>,
    payload: Result<Json<BatchDeleteRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let mut deleted = Vec::with_capacity(request.ids.len());
    for id in request.ids {
        match state.patients.delete_patient(&id).await {
            Ok(patient) => {
                state
                    .ws
                    .broadcast(event_types::PATIENT_DELETED, json!({ "id": patient.id }))
                    .await;
                deleted.push(patient.id);
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(patient_id = %id, "batch delete: patient not found");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(Json(json!({ "deleted": deleted })))
}
