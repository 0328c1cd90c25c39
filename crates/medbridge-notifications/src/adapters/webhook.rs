use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{NotificationAdapter, SendResult};
use crate::error::NotificationError;
use crate::types::{NotificationEnvelope, NotificationTarget};

/// Per-request deadline, kept below the MLLP client deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct WebhookAdapter {
    http_client: Client,
    timeout: Duration,
}

impl WebhookAdapter {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Adapter trusting an extra PEM CA bundle, for satellites with
    /// self-signed certificates.
    pub fn with_ca_certificate(pem: &[u8]) -> Result<Self, NotificationError> {
        let certificate = reqwest::Certificate::from_pem(pem)
            .map_err(|e| NotificationError::invalid_config(format!("CA certificate: {e}")))?;
        let client = Client::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|e| NotificationError::invalid_config(e.to_string()))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(http_client: Client) -> Self {
        Self {
            http_client,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for WebhookAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationAdapter for WebhookAdapter {
    async fn send(
        &self,
        target: &NotificationTarget,
        envelope: &NotificationEnvelope,
    ) -> Result<SendResult, NotificationError> {
        let url = target.endpoint();
        tracing::debug!(satellite = %target.name, %url, event = %envelope.event_type, "sending notification");

        let response = self
            .http_client
            .post(&url)
            .timeout(self.timeout)
            .json(envelope)
            .send()
            .await
            .map_err(|e| NotificationError::send_failed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(SendResult {
                success: true,
                status: Some(status.as_u16()),
                error: None,
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            Ok(SendResult {
                success: false,
                status: Some(status.as_u16()),
                error: Some(format!("Webhook failed: {body}")),
            })
        }
    }
}
