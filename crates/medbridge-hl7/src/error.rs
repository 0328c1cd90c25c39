use std::io;
use std::time::Duration;

use medbridge_storage::StorageError;
use thiserror::Error;

/// A malformed MLLP envelope. Always fatal for the connection it occurred on.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid start byte: expected 0x0B, got 0x{0:02X}")]
    InvalidStartByte(u8),

    #[error("stream ended before the end-of-frame sequence")]
    IncompleteFrame,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failures of a single MLLP client exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("TLS handshake failed: {0}")]
    Tls(#[source] io::Error),

    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    #[error("MLLP exchange timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed before a reply frame was read")]
    ConnectionClosed,
}

#[derive(Debug, Error)]
pub enum Hl7Error {
    #[error("HL7 parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl Hl7Error {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

pub type Result<T> = std::result::Result<T, Hl7Error>;
