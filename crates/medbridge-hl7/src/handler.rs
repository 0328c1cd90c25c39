//! Hub-side dispatch of inbound ADT messages.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use medbridge_core::datetime::hl7_date_to_iso;
use medbridge_core::{EventPublisher, NewPatient, event_types, now_utc};
use medbridge_storage::PatientRepository;
use serde_json::json;

use crate::ack::{AckCode, UNKNOWN_CONTROL_ID, ack_type_for, build_ack};
use crate::message::{AdtMessage, loggable};

/// Turns one inbound frame payload into exactly one reply payload.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, payload: Bytes) -> Bytes;
}

/// Admits (`ADT^A04`) and discharges (`ADT^A23`) patients in the canonical
/// store. Every outcome, including failures, is expressed as an ACK.
pub struct AdtHandler {
    patients: Arc<dyn PatientRepository>,
    events: Arc<dyn EventPublisher>,
}

impl AdtHandler {
    pub fn new(patients: Arc<dyn PatientRepository>, events: Arc<dyn EventPublisher>) -> Self {
        Self { patients, events }
    }

    async fn admit(&self, message: &AdtMessage) -> Bytes {
        let ack_type = ack_type_for(&message.message_type);
        let date_of_birth = match hl7_date_to_iso(&message.date_of_birth) {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!(control_id = %message.control_id, error = %e, "admission rejected: bad date of birth");
                return build_ack(ack_type, AckCode::Error, &message.control_id, None, now_utc());
            }
        };

        let new_patient = NewPatient {
            first_name: message.first_name.clone(),
            last_name: message.last_name.clone(),
            middle_name: Some(message.middle_name.clone()).filter(|m| !m.is_empty()),
            date_of_birth,
            gender: message.gender.to_lowercase(),
        };

        match self.patients.create_patient(new_patient).await {
            Ok(patient) => {
                tracing::info!(control_id = %message.control_id, patient_id = %patient.id, "patient admitted");
                let hub_id = patient.id.clone();
                match serde_json::to_value(&patient) {
                    Ok(data) => self.events.publish(event_types::PATIENT_CREATED, data).await,
                    Err(e) => tracing::warn!(error = %e, "failed to serialize admitted patient"),
                }
                build_ack(
                    ack_type,
                    AckCode::Accept,
                    &message.control_id,
                    Some(&hub_id),
                    now_utc(),
                )
            }
            Err(e) => {
                tracing::error!(control_id = %message.control_id, error = %e, "failed to create patient");
                build_ack(ack_type, AckCode::Error, &message.control_id, None, now_utc())
            }
        }
    }

    async fn discharge(&self, message: &AdtMessage) -> Bytes {
        let ack_type = ack_type_for(&message.message_type);
        match self.patients.delete_patient(&message.patient_id).await {
            Ok(_) => {
                tracing::info!(control_id = %message.control_id, patient_id = %message.patient_id, "patient discharged");
                self.events
                    .publish(
                        event_types::PATIENT_DELETED,
                        json!({ "id": message.patient_id }),
                    )
                    .await;
                build_ack(ack_type, AckCode::Accept, &message.control_id, None, now_utc())
            }
            Err(e) => {
                tracing::error!(
                    control_id = %message.control_id,
                    patient_id = %message.patient_id,
                    error = %e,
                    "failed to delete patient"
                );
                build_ack(ack_type, AckCode::Error, &message.control_id, None, now_utc())
            }
        }
    }
}

#[async_trait]
impl MessageHandler for AdtHandler {
    async fn handle(&self, payload: Bytes) -> Bytes {
        tracing::debug!(message = %loggable(&payload), "received HL7 message");

        let message = match AdtMessage::parse(&payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "unparsable HL7 message");
                return build_ack("ACK", AckCode::Reject, UNKNOWN_CONTROL_ID, None, now_utc());
            }
        };

        let ack = if message.is_admit() {
            self.admit(&message).await
        } else if message.is_discharge() {
            self.discharge(&message).await
        } else {
            tracing::warn!(message_type = %message.message_type, control_id = %message.control_id, "unsupported message type");
            build_ack("ACK", AckCode::Reject, &message.control_id, None, now_utc())
        };

        tracing::debug!(ack = %loggable(&ack), "sending ACK");
        ack
    }
}
