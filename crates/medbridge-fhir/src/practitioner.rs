use medbridge_core::{CoreError, NewPractitioner, Practitioner};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::value::{path, string_value, wrap};

pub const RESOURCE_TYPE: &str = "Practitioner";

/// Read access to a Practitioner resource. Only the first `name` entry and
/// the first `qualification` are looked at.
#[derive(Debug, Clone, Copy)]
pub struct PractitionerResource<'a>(&'a Value);

impl<'a> PractitionerResource<'a> {
    pub fn new(resource: &'a Value) -> Self {
        Self(resource)
    }

    pub fn id(&self) -> Option<String> {
        string_value(self.0.get("id"))
    }

    pub fn family(&self) -> Option<String> {
        string_value(path(self.0, &["name", "0", "family"]))
    }

    pub fn given(&self, index: usize) -> Option<String> {
        let index = index.to_string();
        string_value(path(self.0, &["name", "0", "given", &index]))
    }

    pub fn first_name(&self) -> Option<String> {
        self.given(0)
    }

    pub fn middle_name(&self) -> Option<String> {
        self.given(1)
    }

    pub fn specialization(&self) -> Option<String> {
        string_value(path(self.0, &["qualification", "0", "code", "text"]))
    }

    pub fn summary(&self) -> PractitionerSummary {
        PractitionerSummary {
            id: self.id().unwrap_or_default(),
            first_name: self.first_name().unwrap_or_default(),
            middle_name: self.middle_name().unwrap_or_default(),
            last_name: self.family().unwrap_or_default(),
            specialization: self.specialization().unwrap_or_default(),
        }
    }

    /// Data for a new practitioner record; first and last name are required.
    pub fn to_new_practitioner(&self) -> Result<NewPractitioner, CoreError> {
        let first_name = self.first_name().unwrap_or_default();
        let last_name = self.family().unwrap_or_default();
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(CoreError::validation(
                "practitioner name.family and name.given are required",
            ));
        }
        Ok(NewPractitioner {
            first_name,
            last_name,
            middle_name: self.middle_name().filter(|m| !m.is_empty()),
            specialization: self.specialization().unwrap_or_default(),
        })
    }
}

pub fn practitioner_to_fhir(practitioner: &Practitioner) -> Value {
    let mut given = vec![wrap(practitioner.first_name.as_str())];
    if !practitioner.middle_name().is_empty() {
        given.push(wrap(practitioner.middle_name()));
    }

    json!({
        "resourceType": RESOURCE_TYPE,
        "id": wrap(practitioner.id.as_str()),
        "name": [{
            "family": wrap(practitioner.last_name.as_str()),
            "given": given,
        }],
        "qualification": [{
            "code": { "text": wrap(practitioner.specialization.as_str()) },
        }],
    })
}

/// Flattened practitioner as served to UIs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PractitionerSummary {
    pub id: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub middle_name: String,
    pub last_name: String,
    pub specialization: String,
}
