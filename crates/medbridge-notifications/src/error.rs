use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Unknown notification type: {0}")]
    UnknownType(String),
}

impl NotificationError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed(message.into())
    }
}
