//! Clinician gateway: read-mostly view of the hub for practitioners.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use medbridge_fhir::{EncounterSummary, FhirClient, PractitionerSummary};
use serde_json::Value;

use super::{UpdateStatusRequest, relay_status_update};
use crate::error::ApiResult;
use crate::receiver;
use crate::ws::{self, HubHandle};

#[derive(Clone)]
pub struct ClinicianState {
    pub fhir: FhirClient,
    pub ws: HubHandle,
}

pub fn routes(state: ClinicianState) -> Router {
    let ws = state.ws.clone();
    Router::new()
        .route("/api/practitioners", get(list_practitioners))
        .route("/api/practitioners/{id}", get(get_practitioner))
        .route(
            "/api/practitioners/{id}/encounters",
            get(list_practitioner_encounters),
        )
        .route("/api/encounters/{id}/status", patch(update_encounter_status))
        .with_state(state)
        .merge(ws::routes(ws.clone()))
        .merge(receiver::routes(ws))
}

async fn list_practitioners(
    State(state): State<ClinicianState>,
) -> ApiResult<Json<Vec<PractitionerSummary>>> {
    Ok(Json(state.fhir.get_practitioners().await?))
}

async fn get_practitioner(
    State(state): State<ClinicianState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PractitionerSummary>> {
    Ok(Json(state.fhir.get_practitioner(&id).await?))
}

async fn list_practitioner_encounters(
    State(state): State<ClinicianState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<EncounterSummary>>> {
    Ok(Json(state.fhir.get_encounters_by_practitioner(&id).await?))
}

async fn update_encounter_status(
    State(state): State<ClinicianState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    relay_status_update(&state.fhir, &id, payload).await
}
