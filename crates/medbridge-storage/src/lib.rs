//! Persistence layer for MedBridge.
//!
//! The services only talk to the repository traits in [`traits`]; the
//! in-memory [`MemoryStore`] is the bundled backend.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{ErrorCategory, StorageError};
pub use memory::{IdStrategy, MemoryStore};
pub use traits::{
    EncounterRepository, Hl7MessageRepository, PatientRepository, PractitionerRepository,
    StorageResult,
};
