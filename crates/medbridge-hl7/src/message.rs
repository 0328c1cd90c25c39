//! ADT^A04 (admit) and ADT^A23 (discharge) messages.

use bytes::Bytes;
use medbridge_core::{Patient, generate_control_id, hl7_timestamp};
use time::OffsetDateTime;

use crate::error::Result;
use crate::segment::{RawMessage, escape};

pub const ADT_ADMIT: &str = "ADT^A04";
pub const ADT_DISCHARGE: &str = "ADT^A23";

const OUTBOUND_HEADER: &str = "MSH|^~\\&|RECEPTION|CLINIC|HIS|HOSPITAL";

/// Flat view of an inbound ADT message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdtMessage {
    /// `<code>^<trigger>` from MSH-9.
    pub message_type: String,
    /// MSH-10.
    pub control_id: String,
    /// PID-3, first repetition, first component.
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    /// `YYYYMMDD`, empty when PID-7 is missing or malformed.
    pub date_of_birth: String,
    pub gender: String,
}

impl AdtMessage {
    /// Parse an inbound payload. Missing segments and fields read as empty
    /// strings; only a payload that is not an HL7 message at all fails.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let raw = RawMessage::parse(payload)?;
        let mut message = Self::default();

        if let Some(msh) = raw.segment("MSH") {
            let code = msh.component(9, 1);
            let trigger = msh.component(9, 2);
            message.message_type = if trigger.is_empty() {
                code
            } else {
                format!("{code}^{trigger}")
            };
            message.control_id = msh.value(10);
        }

        if let Some(pid) = raw.segment("PID") {
            message.patient_id = pid.component(3, 1);
            message.last_name = pid.subcomponent(5, 1);
            message.first_name = pid.component(5, 2);
            message.middle_name = pid.component(5, 3);
            message.date_of_birth = birth_date_digits(pid.field(7));
            message.gender = pid.field(8).to_string();
        }

        Ok(message)
    }

    pub fn is_admit(&self) -> bool {
        self.message_type == ADT_ADMIT
    }

    pub fn is_discharge(&self) -> bool {
        self.message_type == ADT_DISCHARGE
    }
}

fn birth_date_digits(value: &str) -> String {
    medbridge_core::datetime::parse_hl7_date(value)
        .ok()
        .and_then(|_| value.get(..8))
        .map(str::to_string)
        .unwrap_or_default()
}

/// A generated outbound message together with the control ID its ACK must echo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub control_id: String,
    pub message_type: &'static str,
    pub payload: Bytes,
}

impl OutboundMessage {
    /// Payload with segment separators rendered as `|` for log lines.
    pub fn loggable(&self) -> String {
        loggable(&self.payload)
    }
}

/// Render an HL7 payload on one line.
pub fn loggable(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload).replace('\r', "|")
}

fn header(message_type: &str, control_id: &str, at: OffsetDateTime) -> String {
    format!(
        "{OUTBOUND_HEADER}|{}||{message_type}|{control_id}|P|2.5",
        hl7_timestamp(at)
    )
}

/// ADT^A04 for a locally stored patient.
pub fn admit_message(patient: &Patient, at: OffsetDateTime) -> OutboundMessage {
    let control_id = generate_control_id();
    let pid = format!(
        "PID|||{}||{}^{}^{}||{}|{}",
        escape(&patient.id),
        escape(&patient.last_name),
        escape(&patient.first_name),
        escape(patient.middle_name()),
        patient.date_of_birth.replace('-', ""),
        escape(&patient.gender.to_uppercase()),
    );
    let payload = format!("{}\r{pid}", header(ADT_ADMIT, &control_id, at));

    OutboundMessage {
        control_id,
        message_type: ADT_ADMIT,
        payload: Bytes::from(payload),
    }
}

/// ADT^A23 identifying the patient by the hub-assigned id.
pub fn discharge_message(hub_id: &str, at: OffsetDateTime) -> OutboundMessage {
    let control_id = generate_control_id();
    let payload = format!(
        "{}\rPID|||{}",
        header(ADT_DISCHARGE, &control_id, at),
        escape(hub_id)
    );

    OutboundMessage {
        control_id,
        message_type: ADT_DISCHARGE,
        payload: Bytes::from(payload),
    }
}
