//! Best-effort propagation of encounter changes from the hub to the
//! intake and clinician services.

pub mod adapters;
pub mod error;
pub mod service;
pub mod types;

pub use adapters::{NotificationAdapter, SendResult, WebhookAdapter};
pub use error::NotificationError;
pub use service::EncounterNotifier;
pub use types::*;
