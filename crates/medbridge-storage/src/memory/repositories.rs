use async_trait::async_trait;
use medbridge_core::{
    Encounter, EncounterDetails, EncounterStatus, Hl7MessageRecord, Hl7MessageStatus,
    NewEncounter, NewPatient, NewPractitioner, Patient, Practitioner, now_utc,
};

use super::MemoryStore;
use crate::error::StorageError;
use crate::traits::{
    EncounterRepository, Hl7MessageRepository, PatientRepository, PractitionerRepository,
    StorageResult,
};

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl MemoryStore {
    async fn join(&self, encounter: Encounter) -> Option<EncounterDetails> {
        let patient = self
            .patients
            .read()
            .await
            .rows
            .get(&encounter.patient_id)
            .cloned()?;
        let practitioner = self
            .practitioners
            .read()
            .await
            .rows
            .get(&encounter.practitioner_id)
            .cloned()?;
        Some(EncounterDetails {
            encounter,
            patient,
            practitioner,
        })
    }
}

#[async_trait]
impl PatientRepository for MemoryStore {
    async fn create_patient(&self, patient: NewPatient) -> StorageResult<Patient> {
        let mut table = self.patients.write().await;
        let id = table.next_id(self.ids);
        let now = now_utc();
        let record = Patient {
            id: id.clone(),
            hub_id: None,
            first_name: patient.first_name,
            last_name: patient.last_name,
            middle_name: non_empty(patient.middle_name),
            date_of_birth: patient.date_of_birth,
            gender: patient.gender,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, record.clone());
        tracing::debug!(patient_id = %record.id, "patient stored");
        Ok(record)
    }

    async fn get_patient_by_id(&self, id: &str) -> StorageResult<Patient> {
        self.patients
            .read()
            .await
            .rows
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("Patient", id))
    }

    async fn get_all_patients(&self) -> StorageResult<Vec<Patient>> {
        Ok(self.patients.read().await.rows.values().cloned().collect())
    }

    async fn delete_patient(&self, id: &str) -> StorageResult<Patient> {
        self.patients
            .write()
            .await
            .rows
            .shift_remove(id)
            .ok_or_else(|| StorageError::not_found("Patient", id))
    }

    async fn update_patient_hub_id(&self, id: &str, hub_id: &str) -> StorageResult<Patient> {
        let mut table = self.patients.write().await;
        let patient = table
            .rows
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found("Patient", id))?;
        patient.hub_id = Some(hub_id.to_string());
        patient.updated_at = now_utc();
        Ok(patient.clone())
    }
}

#[async_trait]
impl PractitionerRepository for MemoryStore {
    async fn create_practitioner(
        &self,
        practitioner: NewPractitioner,
    ) -> StorageResult<Practitioner> {
        let mut table = self.practitioners.write().await;
        let id = table.next_id(self.ids);
        let record = Practitioner {
            id: id.clone(),
            first_name: practitioner.first_name,
            last_name: practitioner.last_name,
            middle_name: non_empty(practitioner.middle_name),
            specialization: practitioner.specialization,
            created_at: now_utc(),
        };
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn get_practitioner_by_id(&self, id: &str) -> StorageResult<Practitioner> {
        self.practitioners
            .read()
            .await
            .rows
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("Practitioner", id))
    }

    async fn get_all_practitioners(&self) -> StorageResult<Vec<Practitioner>> {
        Ok(self
            .practitioners
            .read()
            .await
            .rows
            .values()
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EncounterRepository for MemoryStore {
    async fn create_encounter(&self, encounter: NewEncounter) -> StorageResult<Encounter> {
        if !self
            .patients
            .read()
            .await
            .rows
            .contains_key(&encounter.patient_id)
        {
            return Err(StorageError::invalid_reference(format!(
                "patient {} does not exist",
                encounter.patient_id
            )));
        }
        if !self
            .practitioners
            .read()
            .await
            .rows
            .contains_key(&encounter.practitioner_id)
        {
            return Err(StorageError::invalid_reference(format!(
                "practitioner {} does not exist",
                encounter.practitioner_id
            )));
        }

        let mut table = self.encounters.write().await;
        let id = table.next_id(self.ids);
        let record = Encounter {
            id: id.clone(),
            patient_id: encounter.patient_id,
            practitioner_id: encounter.practitioner_id,
            status: encounter.status,
            start_time: encounter.start_time,
            created_at: now_utc(),
        };
        table.rows.insert(id, record.clone());
        tracing::debug!(encounter_id = %record.id, status = %record.status, "encounter stored");
        Ok(record)
    }

    async fn get_encounter_by_id(&self, id: &str) -> StorageResult<EncounterDetails> {
        let encounter = self
            .encounters
            .read()
            .await
            .rows
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("Encounter", id))?;
        self.join(encounter)
            .await
            .ok_or_else(|| StorageError::not_found("Encounter", id))
    }

    async fn get_all_encounters(&self) -> StorageResult<Vec<EncounterDetails>> {
        let mut encounters: Vec<Encounter> =
            self.encounters.read().await.rows.values().cloned().collect();
        encounters.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        let mut details = Vec::with_capacity(encounters.len());
        for encounter in encounters {
            if let Some(joined) = self.join(encounter).await {
                details.push(joined);
            }
        }
        Ok(details)
    }

    async fn update_encounter_status(
        &self,
        id: &str,
        status: EncounterStatus,
    ) -> StorageResult<Encounter> {
        let mut table = self.encounters.write().await;
        let encounter = table
            .rows
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found("Encounter", id))?;
        encounter.status = status;
        Ok(encounter.clone())
    }
}

#[async_trait]
impl Hl7MessageRepository for MemoryStore {
    async fn record_message(&self, record: Hl7MessageRecord) -> StorageResult<()> {
        self.messages
            .write()
            .await
            .rows
            .insert(record.message_id.clone(), record);
        Ok(())
    }

    async fn complete_message(
        &self,
        message_id: &str,
        status: Hl7MessageStatus,
        hub_patient_id: Option<&str>,
    ) -> StorageResult<Hl7MessageRecord> {
        let mut table = self.messages.write().await;
        let record = table
            .rows
            .get_mut(message_id)
            .ok_or_else(|| StorageError::not_found("Hl7Message", message_id))?;
        record.status = status;
        if let Some(hub_id) = hub_patient_id {
            record.hub_patient_id = Some(hub_id.to_string());
        }
        record.ack_received_at = Some(now_utc());
        Ok(record.clone())
    }

    async fn get_message(&self, message_id: &str) -> StorageResult<Hl7MessageRecord> {
        self.messages
            .read()
            .await
            .rows
            .get(message_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("Hl7Message", message_id))
    }
}
