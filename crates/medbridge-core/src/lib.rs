pub mod datetime;
pub mod error;
pub mod events;
pub mod id;
pub mod models;
pub mod status;

pub use datetime::{from_unix_micros, hl7_timestamp, now_utc, to_unix_micros};
pub use error::{CoreError, ErrorCategory, Result};
pub use events::{EventPublisher, NoopPublisher, event_types};
pub use id::{generate_control_id, generate_id};
pub use models::{
    Encounter, EncounterDetails, Hl7MessageRecord, Hl7MessageStatus, NewEncounter, NewPatient,
    NewPractitioner, Patient, Practitioner,
};
pub use status::EncounterStatus;
