//! Intake-side relay of patient admissions and discharges to the hub.
//!
//! Each send records an [`Hl7MessageRecord`] before dialing, waits for the
//! ACK and only acts on it when MSA-2 echoes the generated control ID.

use std::sync::Arc;

use medbridge_core::{
    EventPublisher, Hl7MessageRecord, Hl7MessageStatus, Patient, event_types, now_utc,
};
use medbridge_storage::{Hl7MessageRepository, PatientRepository};
use serde_json::json;

use crate::ack::{AckCode, AckMessage};
use crate::error::Result;
use crate::message::{OutboundMessage, admit_message, discharge_message, loggable};
use crate::transport::MllpClient;

/// How the hub answered one ADT message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdtOutcome {
    /// `AA`; `hub_id` is set when the ACK carried a PID segment.
    Accepted { hub_id: Option<String> },
    /// `AE` or `AR`.
    Rejected { code: AckCode },
    /// The ACK acknowledged a different message. Nothing was updated.
    CorrelationMismatch { expected: String, actual: String },
}

pub struct AdtSender {
    client: MllpClient,
    messages: Arc<dyn Hl7MessageRepository>,
    patients: Arc<dyn PatientRepository>,
    events: Arc<dyn EventPublisher>,
}

impl AdtSender {
    pub fn new(
        client: MllpClient,
        messages: Arc<dyn Hl7MessageRepository>,
        patients: Arc<dyn PatientRepository>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            client,
            messages,
            patients,
            events,
        }
    }

    /// Send ADT^A04 for a local patient and attach the hub id it comes back with.
    pub async fn send_admission(&self, patient: &Patient) -> Result<AdtOutcome> {
        let message = admit_message(patient, now_utc());
        let (ack, outcome) = self.exchange(&message, &patient.id).await?;

        if let (Some(ack), AdtOutcome::Accepted { hub_id }) = (&ack, &outcome) {
            self.messages
                .complete_message(
                    &ack.control_id,
                    Hl7MessageStatus::Acknowledged,
                    hub_id.as_deref(),
                )
                .await?;
            if let Some(hub_id) = hub_id {
                self.patients.update_patient_hub_id(&patient.id, hub_id).await?;
                tracing::info!(patient_id = %patient.id, hub_id = %hub_id, "hub patient id attached");
                self.events
                    .publish(
                        event_types::PATIENT_HUB_ID_UPDATE,
                        json!({ "id": patient.id, "his_patient_id": hub_id }),
                    )
                    .await;
            }
        }
        Ok(outcome)
    }

    /// Send ADT^A23 for a patient the hub knows as `hub_id`.
    pub async fn send_discharge(&self, patient_id: &str, hub_id: &str) -> Result<AdtOutcome> {
        let message = discharge_message(hub_id, now_utc());
        let (ack, outcome) = self.exchange(&message, patient_id).await?;

        if let (Some(ack), AdtOutcome::Accepted { .. }) = (&ack, &outcome) {
            self.messages
                .complete_message(&ack.control_id, Hl7MessageStatus::Acknowledged, Some(hub_id))
                .await?;
        }
        Ok(outcome)
    }

    /// Record, send and correlate. Rejections are recorded here; acceptance
    /// is left to the caller, which knows what to update.
    async fn exchange(
        &self,
        message: &OutboundMessage,
        patient_id: &str,
    ) -> Result<(Option<AckMessage>, AdtOutcome)> {
        self.messages
            .record_message(Hl7MessageRecord::sent(
                message.control_id.clone(),
                patient_id,
                message.message_type,
            ))
            .await?;

        tracing::info!(
            patient_id,
            control_id = %message.control_id,
            message_type = message.message_type,
            hub = %self.client.addr(),
            "sending ADT message"
        );
        tracing::debug!(message = %message.loggable(), "outbound HL7");

        let reply = self.client.send(message.payload.clone()).await?;
        tracing::debug!(ack = %loggable(&reply), "received ACK");
        let ack = AckMessage::parse(&reply)?;

        if ack.control_id != message.control_id {
            tracing::warn!(
                expected = %message.control_id,
                actual = %ack.control_id,
                "ACK control id mismatch, dropping acknowledgment"
            );
            return Ok((
                None,
                AdtOutcome::CorrelationMismatch {
                    expected: message.control_id.clone(),
                    actual: ack.control_id,
                },
            ));
        }

        if ack.code.is_accept() {
            let hub_id = ack.patient_id.clone();
            return Ok((Some(ack), AdtOutcome::Accepted { hub_id }));
        }

        tracing::warn!(control_id = %message.control_id, code = %ack.code, "ADT message rejected by hub");
        self.messages
            .complete_message(&message.control_id, Hl7MessageStatus::Rejected, None)
            .await?;
        Ok((None, AdtOutcome::Rejected { code: ack.code }))
    }
}
