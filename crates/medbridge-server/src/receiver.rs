//! `POST /fhir/notifications/encounter`, served by both satellites.
//!
//! The hub posts `{"type", "data"}` with `data` an Encounter resource; known
//! events are flattened to an [`EncounterSummary`] and re-broadcast to the
//! local WebSocket clients.
//!
//! [`EncounterSummary`]: medbridge_fhir::EncounterSummary

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use medbridge_fhir::EncounterResource;
use medbridge_notifications::{ENCOUNTER_NOTIFICATION_PATH, EncounterEvent};
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::ws::HubHandle;

pub fn routes(hub: HubHandle) -> Router {
    Router::new()
        .route(ENCOUNTER_NOTIFICATION_PATH, post(receive_encounter_notification))
        .with_state(hub)
}

pub async fn receive_encounter_notification(
    State(hub): State<HubHandle>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let notification: Value =
        serde_json::from_slice(&body).map_err(|_| ApiError::bad_request("Invalid JSON"))?;
    let event_type = notification
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::bad_request("Missing notification type"))?;
    let data = notification
        .get("data")
        .filter(|data| data.is_object())
        .ok_or_else(|| ApiError::bad_request("Missing notification data"))?;

    let summary = EncounterResource::new(data).summary();
    tracing::info!(event_type, encounter_id = %summary.id, "encounter notification received");

    match event_type.parse::<EncounterEvent>() {
        Ok(event) => {
            let data = serde_json::to_value(&summary)
                .map_err(|e| ApiError::internal(e.to_string()))?;
            hub.broadcast(event.as_str(), data).await;
        }
        Err(_) => tracing::warn!(event_type, "unknown notification type"),
    }

    Ok(Json(json!({ "status": "received" })))
}
