use std::fmt;
use std::str::FromStr;

use medbridge_core::event_types;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NotificationError;

/// Path every satellite exposes for encounter notifications.
pub const ENCOUNTER_NOTIFICATION_PATH: &str = "/fhir/notifications/encounter";

/// Encounter change pushed from the hub to the satellites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncounterEvent {
    Created,
    StatusUpdated,
}

impl EncounterEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => event_types::ENCOUNTER_CREATED,
            Self::StatusUpdated => event_types::ENCOUNTER_STATUS_UPDATED,
        }
    }
}

impl fmt::Display for EncounterEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncounterEvent {
    type Err = NotificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            event_types::ENCOUNTER_CREATED => Ok(Self::Created),
            event_types::ENCOUNTER_STATUS_UPDATED => Ok(Self::StatusUpdated),
            other => Err(NotificationError::UnknownType(other.to_string())),
        }
    }
}

/// Body of a notification call: `{"type": ..., "data": <FHIR resource>}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
}

impl NotificationEnvelope {
    pub fn new(event: EncounterEvent, data: Value) -> Self {
        Self {
            event_type: event.as_str().to_string(),
            data,
        }
    }

    /// The known event this envelope carries, if any.
    pub fn event(&self) -> Option<EncounterEvent> {
        self.event_type.parse().ok()
    }
}

/// A satellite receiving encounter notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTarget {
    pub name: String,
    pub base_url: String,
}

impl NotificationTarget {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{ENCOUNTER_NOTIFICATION_PATH}", self.base_url)
    }
}
