//! ACK generation (hub side) and parsing (intake side).

use std::fmt;

use bytes::Bytes;
use medbridge_core::hl7_timestamp;
use time::OffsetDateTime;

use crate::error::{Hl7Error, Result};
use crate::message::{ADT_ADMIT, ADT_DISCHARGE};
use crate::segment::{RawMessage, escape};

/// Control ID echoed when the inbound message could not be parsed.
pub const UNKNOWN_CONTROL_ID: &str = "UNKNOWN";

const ACK_HEADER: &str = "MSH|^~\\&|HIS|HOSPITAL|RECEPTION|CLINIC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AckCode {
    /// `AA`
    Accept,
    /// `AE`
    Error,
    /// `AR`
    Reject,
}

impl AckCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "AA",
            Self::Error => "AE",
            Self::Reject => "AR",
        }
    }

    /// Original (`AA`/`AE`/`AR`) and enhanced (`CA`/`CE`/`CR`) mode codes.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "AA" | "CA" => Some(Self::Accept),
            "AE" | "CE" => Some(Self::Error),
            "AR" | "CR" => Some(Self::Reject),
            _ => None,
        }
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

impl fmt::Display for AckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MSH-9 of the ACK answering a message of the given type.
pub fn ack_type_for(message_type: &str) -> &'static str {
    match message_type {
        ADT_ADMIT => "ACK^A04",
        ADT_DISCHARGE => "ACK^A23",
        _ => "ACK",
    }
}

/// Build an ACK payload. The ACK's own control ID is its timestamp.
pub fn build_ack(
    ack_type: &str,
    code: AckCode,
    original_control_id: &str,
    hub_patient_id: Option<&str>,
    at: OffsetDateTime,
) -> Bytes {
    let ts = hl7_timestamp(at);
    let mut ack = format!(
        "{ACK_HEADER}|{ts}||{ack_type}|{ts}|P|2.5\rMSA|{code}|{}",
        escape(original_control_id)
    );
    if let Some(hub_id) = hub_patient_id {
        ack.push_str("\rPID|||");
        ack.push_str(&escape(hub_id));
    }
    Bytes::from(ack)
}

/// What the intake side reads back from an ACK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckMessage {
    pub code: AckCode,
    /// MSA-2, the control ID of the message being acknowledged.
    pub control_id: String,
    /// PID-3 when the hub returned an assigned identifier.
    pub patient_id: Option<String>,
}

impl AckMessage {
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let raw = RawMessage::parse(payload)?;
        let msa = raw
            .segment("MSA")
            .ok_or_else(|| Hl7Error::parse("ACK has no MSA segment"))?;

        let control_id = msa.component(2, 1);
        if control_id.is_empty() {
            return Err(Hl7Error::parse("no message ID in ACK"));
        }
        let code_field = msa.field(1);
        let code = AckCode::from_code(code_field)
            .ok_or_else(|| Hl7Error::parse(format!("unknown acknowledgment code {code_field:?}")))?;

        let patient_id = raw
            .segment("PID")
            .map(|pid| pid.component(3, 1))
            .filter(|id| !id.is_empty());

        Ok(Self {
            code,
            control_id,
            patient_id,
        })
    }
}
