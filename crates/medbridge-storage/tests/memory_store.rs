use medbridge_core::{
    EncounterStatus, Hl7MessageRecord, Hl7MessageStatus, NewEncounter, NewPatient,
    NewPractitioner,
};
use medbridge_storage::{
    EncounterRepository, Hl7MessageRepository, IdStrategy, MemoryStore, PatientRepository,
    PractitionerRepository,
};
use time::macros::datetime;

fn jane() -> NewPatient {
    NewPatient {
        first_name: "Jane".into(),
        last_name: "Smith".into(),
        middle_name: Some(String::new()),
        date_of_birth: "1990-01-01".into(),
        gender: "female".into(),
    }
}

fn house() -> NewPractitioner {
    NewPractitioner {
        first_name: "Gregory".into(),
        last_name: "House".into(),
        middle_name: None,
        specialization: "Diagnostics".into(),
    }
}

#[tokio::test]
async fn sequential_ids_per_table() {
    let store = MemoryStore::new(IdStrategy::Sequential);
    let first = store.create_patient(jane()).await.unwrap();
    let second = store.create_patient(jane()).await.unwrap();
    let practitioner = store.create_practitioner(house()).await.unwrap();

    assert_eq!(first.id, "1");
    assert_eq!(second.id, "2");
    assert_eq!(practitioner.id, "1");
    assert!(first.hub_id.is_none());
    assert!(first.middle_name.is_none(), "blank middle name is dropped");
}

#[tokio::test]
async fn uuid_ids_by_default() {
    let store = MemoryStore::default();
    let patient = store.create_patient(jane()).await.unwrap();
    assert_eq!(patient.id.len(), 36);
    assert_eq!(store.id_strategy(), IdStrategy::Uuid);
}

#[tokio::test]
async fn patient_lifecycle() {
    let store = MemoryStore::new(IdStrategy::Sequential);
    let patient = store.create_patient(jane()).await.unwrap();

    let updated = store
        .update_patient_hub_id(&patient.id, "hub-42")
        .await
        .unwrap();
    assert_eq!(updated.hub_id.as_deref(), Some("hub-42"));
    assert_eq!(
        store.get_patient_by_id(&patient.id).await.unwrap().hub_id,
        Some("hub-42".to_string())
    );

    let removed = store.delete_patient(&patient.id).await.unwrap();
    assert_eq!(removed.id, patient.id);
    assert!(
        store
            .get_patient_by_id(&patient.id)
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(store.delete_patient(&patient.id).await.is_err());
    assert!(store.get_all_patients().await.unwrap().is_empty());
}

#[tokio::test]
async fn encounter_requires_existing_references() {
    let store = MemoryStore::default();
    let patient = store.create_patient(jane()).await.unwrap();

    let err = store
        .create_encounter(NewEncounter {
            patient_id: patient.id.clone(),
            practitioner_id: "missing".into(),
            status: EncounterStatus::Planned,
            start_time: datetime!(2024-03-01 10:00 UTC),
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("practitioner missing"));

    let err = store
        .create_encounter(NewEncounter {
            patient_id: "missing".into(),
            practitioner_id: "missing".into(),
            status: EncounterStatus::Planned,
            start_time: datetime!(2024-03-01 10:00 UTC),
        })
        .await
        .unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn encounters_are_joined_and_newest_first() {
    let store = MemoryStore::default();
    let patient = store.create_patient(jane()).await.unwrap();
    let practitioner = store.create_practitioner(house()).await.unwrap();

    let older = store
        .create_encounter(NewEncounter {
            patient_id: patient.id.clone(),
            practitioner_id: practitioner.id.clone(),
            status: EncounterStatus::Planned,
            start_time: datetime!(2024-03-01 10:00 UTC),
        })
        .await
        .unwrap();
    let newer = store
        .create_encounter(NewEncounter {
            patient_id: patient.id.clone(),
            practitioner_id: practitioner.id.clone(),
            status: EncounterStatus::Arrived,
            start_time: datetime!(2024-03-02 10:00 UTC),
        })
        .await
        .unwrap();

    let all = store.get_all_encounters().await.unwrap();
    let ids: Vec<_> = all.iter().map(|d| d.encounter.id.clone()).collect();
    assert_eq!(ids, vec![newer.id.clone(), older.id.clone()]);

    let details = store.get_encounter_by_id(&older.id).await.unwrap();
    assert_eq!(details.patient.last_name, "Smith");
    assert_eq!(details.practitioner.specialization, "Diagnostics");

    let updated = store
        .update_encounter_status(&older.id, EncounterStatus::Completed)
        .await
        .unwrap();
    assert_eq!(updated.status, EncounterStatus::Completed);
    assert!(
        store
            .update_encounter_status("nope", EncounterStatus::Completed)
            .await
            .unwrap_err()
            .is_not_found()
    );
}

#[tokio::test]
async fn message_records_track_acknowledgement() {
    let store = MemoryStore::new(IdStrategy::Sequential);
    store
        .record_message(Hl7MessageRecord::sent("ctrl-1", "1", "ADT^A04"))
        .await
        .unwrap();

    let record = store.get_message("ctrl-1").await.unwrap();
    assert_eq!(record.status, Hl7MessageStatus::Sent);

    let record = store
        .complete_message("ctrl-1", Hl7MessageStatus::Acknowledged, Some("hub-9"))
        .await
        .unwrap();
    assert_eq!(record.status, Hl7MessageStatus::Acknowledged);
    assert_eq!(record.hub_patient_id.as_deref(), Some("hub-9"));
    assert!(record.ack_received_at.is_some());

    assert!(
        store
            .complete_message("ctrl-2", Hl7MessageStatus::Rejected, None)
            .await
            .unwrap_err()
            .is_not_found()
    );
}
