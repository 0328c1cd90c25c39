//! FHIR wire codec for the narrow Practitioner / Encounter shapes exchanged
//! between the hub and its satellites, plus the satellites' hub client.
//!
//! Scalars travel as `{"value": ...}` (see [`value`]); patient gender and
//! practitioner specialization ride inside display strings (see [`display`]).

pub mod bundle;
pub mod client;
pub mod display;
pub mod encounter;
pub mod error;
pub mod practitioner;
pub mod value;

pub use client::FhirClient;
pub use encounter::{
    EncounterResource, EncounterSummary, encounter_request, encounter_to_fhir, status_from_patch,
    status_patch,
};
pub use error::{FhirError, Result};
pub use practitioner::{PractitionerResource, PractitionerSummary, practitioner_to_fhir};
