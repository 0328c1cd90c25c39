//! The three MedBridge services: hub, intake and clinician.

pub mod config;
pub mod error;
pub mod observability;
pub mod receiver;
pub mod roles;
pub mod server;
pub mod tls;
pub mod ws;

pub use config::{AppConfig, ServiceRole};
pub use error::{ApiError, ApiResult};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{MedbridgeServer, ServerBuilder, build_app};
