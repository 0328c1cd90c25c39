pub mod webhook;

use async_trait::async_trait;

use crate::error::NotificationError;
use crate::types::{NotificationEnvelope, NotificationTarget};

/// Result of sending a notification
#[derive(Debug)]
pub struct SendResult {
    pub success: bool,
    pub status: Option<u16>,
    pub error: Option<String>,
}

/// Adapter for delivering a notification to one satellite
#[async_trait]
pub trait NotificationAdapter: Send + Sync {
    /// Send a notification. `Err` means the request never completed; a
    /// completed request with a non-success status is an unsuccessful
    /// [`SendResult`].
    async fn send(
        &self,
        target: &NotificationTarget,
        envelope: &NotificationEnvelope,
    ) -> Result<SendResult, NotificationError>;
}

pub use webhook::WebhookAdapter;
