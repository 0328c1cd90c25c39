use medbridge_core::datetime::format_rfc3339;
use medbridge_core::{
    CoreError, EncounterDetails, EncounterStatus, NewEncounter, from_unix_micros, now_utc,
    to_unix_micros,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;

use crate::display::{
    extract_gender, id_from_reference, parse_practitioner_display, patient_display,
    practitioner_display, reference, strip_gender,
};
use crate::value::{i64_value, path, string_value, wrap};

pub const RESOURCE_TYPE: &str = "Encounter";
pub const PRECISION_SECOND: &str = "SECOND";

/// Read access to an Encounter resource.
#[derive(Debug, Clone, Copy)]
pub struct EncounterResource<'a>(&'a Value);

impl<'a> EncounterResource<'a> {
    pub fn new(resource: &'a Value) -> Self {
        Self(resource)
    }

    pub fn id(&self) -> Option<String> {
        string_value(self.0.get("id"))
    }

    /// Raw status code as found on the wire.
    pub fn status_code(&self) -> Option<String> {
        string_value(self.0.get("status"))
    }

    /// Internal status; unknown or missing codes read as `arrived`.
    pub fn status(&self) -> EncounterStatus {
        self.status_code()
            .map(|code| EncounterStatus::from_fhir_code(&code))
            .unwrap_or_default()
    }

    pub fn subject_reference(&self) -> Option<String> {
        string_value(path(self.0, &["subject", "reference"]))
    }

    pub fn subject_display(&self) -> Option<String> {
        string_value(path(self.0, &["subject", "display"]))
    }

    pub fn patient_id(&self) -> Option<String> {
        self.subject_reference().map(|r| id_from_reference(&r))
    }

    pub fn participant_reference(&self) -> Option<String> {
        string_value(path(self.0, &["participant", "0", "individual", "reference"]))
    }

    pub fn participant_display(&self) -> Option<String> {
        string_value(path(self.0, &["participant", "0", "individual", "display"]))
    }

    pub fn practitioner_id(&self) -> Option<String> {
        self.participant_reference().map(|r| id_from_reference(&r))
    }

    /// True when any participant references the given practitioner id.
    pub fn has_participant(&self, practitioner_id: &str) -> bool {
        self.0
            .get("participant")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|p| string_value(path(p, &["individual", "reference"])))
            .any(|r| id_from_reference(&r) == practitioner_id)
    }

    /// `period.start.valueUs` as a number, numeric string, or wrapped.
    pub fn start_micros(&self) -> Option<i64> {
        i64_value(path(self.0, &["period", "start", "valueUs"]))
    }

    pub fn start_time(&self) -> Option<OffsetDateTime> {
        self.start_micros().and_then(from_unix_micros)
    }

    /// Flattened view for satellite UIs.
    pub fn summary(&self) -> EncounterSummary {
        let subject = self.subject_display().unwrap_or_default();
        let (practitioner_name, practitioner_specialization) =
            parse_practitioner_display(&self.participant_display().unwrap_or_default());
        let created_at = self
            .start_micros()
            .filter(|micros| *micros > 0)
            .and_then(from_unix_micros)
            .unwrap_or_else(now_utc);

        EncounterSummary {
            id: self.id().unwrap_or_default(),
            patient_id: self.patient_id().unwrap_or_default(),
            patient_name: strip_gender(&subject),
            patient_gender: extract_gender(&subject),
            practitioner_id: self.practitioner_id().unwrap_or_default(),
            practitioner_name,
            practitioner_specialization,
            status: self.status().as_str().to_string(),
            created_at: format_rfc3339(created_at),
        }
    }

    /// Data for a new encounter record. Patient and practitioner references
    /// are required; a missing status reads as `arrived` and a missing start
    /// as now.
    pub fn to_new_encounter(&self) -> Result<NewEncounter, CoreError> {
        let patient_id = self.patient_id().filter(|id| !id.is_empty());
        let practitioner_id = self.practitioner_id().filter(|id| !id.is_empty());
        let (Some(patient_id), Some(practitioner_id)) = (patient_id, practitioner_id) else {
            return Err(CoreError::validation(
                "encounter subject.reference and participant[0].individual.reference are required",
            ));
        };

        Ok(NewEncounter {
            patient_id,
            practitioner_id,
            status: self.status(),
            start_time: self.start_time().unwrap_or_else(now_utc),
        })
    }
}

fn period_start(start_time: OffsetDateTime) -> Value {
    json!({
        "valueUs": to_unix_micros(start_time).to_string(),
        "precision": PRECISION_SECOND,
    })
}

/// Hub representation of a stored encounter, display strings included.
pub fn encounter_to_fhir(details: &EncounterDetails) -> Value {
    let encounter = &details.encounter;
    let patient = &details.patient;
    let practitioner = &details.practitioner;

    json!({
        "resourceType": RESOURCE_TYPE,
        "id": wrap(encounter.id.as_str()),
        "status": wrap(encounter.status.fhir_code()),
        "subject": {
            "reference": wrap(reference("Patient", &encounter.patient_id)),
            "display": wrap(patient_display(
                &patient.last_name,
                &patient.first_name,
                patient.middle_name(),
                &patient.gender,
            )),
        },
        "participant": [{
            "individual": {
                "reference": wrap(reference("Practitioner", &encounter.practitioner_id)),
                "display": wrap(practitioner_display(
                    &practitioner.last_name,
                    &practitioner.first_name,
                    practitioner.middle_name(),
                    &practitioner.specialization,
                )),
            },
        }],
        "period": { "start": period_start(encounter.start_time) },
    })
}

/// Body of a satellite's create request: references only, status `PLANNED`.
pub fn encounter_request(
    patient_hub_id: &str,
    practitioner_id: &str,
    start_time: OffsetDateTime,
) -> Value {
    json!({
        "resourceType": RESOURCE_TYPE,
        "status": wrap(EncounterStatus::Planned.fhir_code()),
        "subject": { "reference": wrap(reference("Patient", patient_hub_id)) },
        "participant": [{
            "individual": { "reference": wrap(reference("Practitioner", practitioner_id)) },
        }],
        "period": { "start": period_start(start_time) },
    })
}

/// `{"status": {"value": "<internal>"}}`
pub fn status_patch(status: EncounterStatus) -> Value {
    json!({ "status": wrap(status.as_str()) })
}

/// Validate the status carried by a PATCH body, bare or wrapped.
pub fn status_from_patch(body: &Value) -> Result<EncounterStatus, CoreError> {
    let status = string_value(body.get("status"))
        .ok_or_else(|| CoreError::validation("status is required"))?;
    EncounterStatus::parse(&status)
}

/// Flattened encounter as served to UIs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterSummary {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub patient_gender: String,
    pub practitioner_id: String,
    pub practitioner_name: String,
    pub practitioner_specialization: String,
    pub status: String,
    pub created_at: String,
}
