//! Domain records exchanged between persistence and the protocol codecs.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::status::EncounterStatus;

/// A patient as stored by either the intake service (local record, hub id
/// attached later) or the hub (canonical record, `hub_id` unused).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    #[serde(rename = "his_patient_id")]
    pub hub_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub date_of_birth: String,
    pub gender: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Patient {
    pub fn middle_name(&self) -> &str {
        self.middle_name.as_deref().unwrap_or_default()
    }
}

/// Patient data supplied on creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub date_of_birth: String,
    #[serde(default)]
    pub gender: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Practitioner {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub specialization: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Practitioner {
    pub fn middle_name(&self) -> &str {
        self.middle_name.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPractitioner {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub specialization: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    pub id: String,
    pub patient_id: String,
    pub practitioner_id: String,
    pub status: EncounterStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEncounter {
    pub patient_id: String,
    pub practitioner_id: String,
    pub status: EncounterStatus,
    pub start_time: OffsetDateTime,
}

/// An encounter joined with the patient and practitioner it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterDetails {
    #[serde(flatten)]
    pub encounter: Encounter,
    pub patient: Patient,
    pub practitioner: Practitioner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hl7MessageStatus {
    Sent,
    Acknowledged,
    Rejected,
}

/// Correlates an outbound ADT message with the ACK that answers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hl7MessageRecord {
    pub message_id: String,
    pub patient_id: String,
    pub message_type: String,
    pub status: Hl7MessageStatus,
    #[serde(rename = "his_patient_id")]
    pub hub_patient_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ack_received_at: Option<OffsetDateTime>,
}

impl Hl7MessageRecord {
    pub fn sent(
        message_id: impl Into<String>,
        patient_id: impl Into<String>,
        message_type: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            patient_id: patient_id.into(),
            message_type: message_type.into(),
            status: Hl7MessageStatus::Sent,
            hub_patient_id: None,
            created_at: OffsetDateTime::now_utc(),
            ack_received_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_patient_serializes_hub_id_under_legacy_name() {
        let patient = Patient {
            id: "1".into(),
            hub_id: Some("abc".into()),
            first_name: "Jane".into(),
            last_name: "Smith".into(),
            middle_name: None,
            date_of_birth: "1990-01-01".into(),
            gender: "female".into(),
            created_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC),
        };
        let json = serde_json::to_value(&patient).unwrap();
        assert_eq!(json["his_patient_id"], "abc");
        assert_eq!(json["created_at"], "2024-01-01T00:00:00Z");
        assert_eq!(patient.middle_name(), "");
    }

    #[test]
    fn test_new_message_record_is_sent() {
        let record = Hl7MessageRecord::sent("msg-1", "7", "ADT^A04");
        assert_eq!(record.status, Hl7MessageStatus::Sent);
        assert!(record.ack_received_at.is_none());
        assert!(record.hub_patient_id.is_none());
    }
}
