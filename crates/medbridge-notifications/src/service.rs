use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::adapters::NotificationAdapter;
use crate::types::{EncounterEvent, NotificationEnvelope, NotificationTarget};

/// Fans encounter changes out to every configured satellite.
///
/// Each delivery runs in its own task. Failures are logged at `warn` and
/// dropped; nothing is retried.
#[derive(Clone)]
pub struct EncounterNotifier {
    adapter: Arc<dyn NotificationAdapter>,
    targets: Arc<[NotificationTarget]>,
}

impl EncounterNotifier {
    pub fn new(adapter: Arc<dyn NotificationAdapter>, targets: Vec<NotificationTarget>) -> Self {
        Self {
            adapter,
            targets: targets.into(),
        }
    }

    pub fn targets(&self) -> &[NotificationTarget] {
        &self.targets
    }

    /// Spawn one delivery per target. Callers normally drop the handles.
    pub fn notify(&self, event: EncounterEvent, resource: Value) -> Vec<JoinHandle<()>> {
        let envelope = Arc::new(NotificationEnvelope::new(event, resource));

        self.targets
            .iter()
            .cloned()
            .map(|target| {
                let adapter = Arc::clone(&self.adapter);
                let envelope = Arc::clone(&envelope);
                tokio::spawn(async move { deliver(adapter.as_ref(), &target, &envelope).await })
            })
            .collect()
    }

    pub fn encounter_created(&self, resource: Value) -> Vec<JoinHandle<()>> {
        self.notify(EncounterEvent::Created, resource)
    }

    pub fn encounter_status_updated(&self, resource: Value) -> Vec<JoinHandle<()>> {
        self.notify(EncounterEvent::StatusUpdated, resource)
    }
}

async fn deliver(
    adapter: &dyn NotificationAdapter,
    target: &NotificationTarget,
    envelope: &NotificationEnvelope,
) {
    match adapter.send(target, envelope).await {
        Ok(result) if result.success => {
            tracing::info!(satellite = %target.name, event = %envelope.event_type, "notification delivered");
        }
        Ok(result) => {
            tracing::warn!(
                satellite = %target.name,
                event = %envelope.event_type,
                status = ?result.status,
                error = result.error.as_deref().unwrap_or_default(),
                "notification rejected"
            );
        }
        Err(e) => {
            tracing::warn!(
                satellite = %target.name,
                event = %envelope.event_type,
                error = %e,
                "notification failed"
            );
        }
    }
}
