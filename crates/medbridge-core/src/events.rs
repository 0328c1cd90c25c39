//! Publisher seam between domain operations and UI fan-out.
//!
//! Services publish `{type, data}` events through an [`EventPublisher`]
//! without knowing who (if anyone) is listening. The server crate's
//! WebSocket hub is the production implementation.

use async_trait::async_trait;
use serde_json::Value;

/// Event type names carried in the `type` field of UI and notification frames.
pub mod event_types {
    pub const PATIENT_CREATED: &str = "patient_created";
    pub const PATIENT_DELETED: &str = "patient_deleted";
    pub const PATIENT_HUB_ID_UPDATE: &str = "patient_his_id_update";
    pub const ENCOUNTER_CREATED: &str = "encounter_created";
    pub const ENCOUNTER_STATUS_UPDATED: &str = "encounter_status_updated";
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event. Delivery is best-effort; implementations never fail
    /// the caller.
    async fn publish(&self, event_type: &str, data: Value);
}

/// Publisher that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, event_type: &str, _data: Value) {
        tracing::trace!(event_type, "event dropped (no publisher configured)");
    }
}
