//! Encounter status vocabulary.
//!
//! Internal records use the lowercase, hyphenated codes below. The FHIR wire
//! vocabulary uses upper-case enum names, with `completed` exchanged as
//! `FINISHED`:
//!
//! | internal      | FHIR          |
//! |---------------|---------------|
//! | `planned`     | `PLANNED`     |
//! | `arrived`     | `ARRIVED`     |
//! | `in-progress` | `IN_PROGRESS` |
//! | `completed`   | `FINISHED`    |
//! | `cancelled`   | `CANCELLED`   |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncounterStatus {
    Planned,
    #[default]
    Arrived,
    InProgress,
    Completed,
    Cancelled,
}

impl EncounterStatus {
    pub const ALL: [EncounterStatus; 5] = [
        Self::Planned,
        Self::Arrived,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Internal code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Arrived => "arrived",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// FHIR wire code.
    pub fn fhir_code(&self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::Arrived => "ARRIVED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "FINISHED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Lowercase, `_` to `-`, and `finished` to `completed`.
    pub fn normalize(value: &str) -> String {
        let normalized = value.trim().to_lowercase().replace('_', "-");
        if normalized == "finished" {
            "completed".to_string()
        } else {
            normalized
        }
    }

    fn lookup(value: &str) -> Option<Self> {
        let normalized = Self::normalize(value);
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
    }

    /// Strict parse used to validate status-update requests.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::lookup(value).ok_or_else(|| {
            CoreError::validation(format!(
                "invalid encounter status: {value} (valid statuses: {})",
                Self::allowed_values()
            ))
        })
    }

    /// Decode a wire code, falling back to `arrived` for anything unknown.
    pub fn from_fhir_code(code: &str) -> Self {
        Self::lookup(code).unwrap_or(Self::Arrived)
    }

    /// Map an arbitrary status string to its wire code, `ARRIVED` if unknown.
    pub fn fhir_code_for(value: &str) -> &'static str {
        Self::lookup(value).unwrap_or(Self::Arrived).fhir_code()
    }

    pub fn allowed_values() -> String {
        Self::ALL
            .iter()
            .map(|status| status.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for EncounterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncounterStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
