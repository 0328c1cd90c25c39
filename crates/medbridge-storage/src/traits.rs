//! Repository traits consumed by the protocol handlers and HTTP surfaces.
//!
//! Each service wires in the backend it needs; the in-memory
//! [`MemoryStore`](crate::MemoryStore) implements all four.

use async_trait::async_trait;
use medbridge_core::{
    Encounter, EncounterDetails, EncounterStatus, Hl7MessageRecord, Hl7MessageStatus,
    NewEncounter, NewPatient, NewPractitioner, Patient, Practitioner,
};

use crate::error::StorageError;

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait PatientRepository: Send + Sync {
    /// Persists a new patient and returns it with its assigned id.
    async fn create_patient(&self, patient: NewPatient) -> StorageResult<Patient>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no patient has this id.
    async fn get_patient_by_id(&self, id: &str) -> StorageResult<Patient>;

    async fn get_all_patients(&self) -> StorageResult<Vec<Patient>>;

    /// Deletes the patient and returns the removed record.
    async fn delete_patient(&self, id: &str) -> StorageResult<Patient>;

    /// Attaches the hub-assigned identifier to a local patient.
    async fn update_patient_hub_id(&self, id: &str, hub_id: &str) -> StorageResult<Patient>;
}

#[async_trait]
pub trait PractitionerRepository: Send + Sync {
    async fn create_practitioner(&self, practitioner: NewPractitioner)
    -> StorageResult<Practitioner>;

    async fn get_practitioner_by_id(&self, id: &str) -> StorageResult<Practitioner>;

    async fn get_all_practitioners(&self) -> StorageResult<Vec<Practitioner>>;
}

#[async_trait]
pub trait EncounterRepository: Send + Sync {
    /// Creates an encounter after checking that both referenced records exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidReference` when the patient or
    /// practitioner is unknown.
    async fn create_encounter(&self, encounter: NewEncounter) -> StorageResult<Encounter>;

    /// Returns the encounter joined with its patient and practitioner.
    async fn get_encounter_by_id(&self, id: &str) -> StorageResult<EncounterDetails>;

    /// All encounters, newest start time first.
    async fn get_all_encounters(&self) -> StorageResult<Vec<EncounterDetails>>;

    async fn update_encounter_status(
        &self,
        id: &str,
        status: EncounterStatus,
    ) -> StorageResult<Encounter>;
}

#[async_trait]
pub trait Hl7MessageRepository: Send + Sync {
    /// Stores a freshly sent message record.
    async fn record_message(&self, record: Hl7MessageRecord) -> StorageResult<()>;

    /// Moves a record out of `sent` once its ACK has been read.
    async fn complete_message(
        &self,
        message_id: &str,
        status: Hl7MessageStatus,
        hub_patient_id: Option<&str>,
    ) -> StorageResult<Hl7MessageRecord>;

    async fn get_message(&self, message_id: &str) -> StorageResult<Hl7MessageRecord>;
}
