use medbridge_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FhirError {
    /// Rejected locally, no request was sent.
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("hub returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("request to hub failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid hub response: {0}")]
    Decode(String),
}

impl FhirError {
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Upstream { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, FhirError>;
