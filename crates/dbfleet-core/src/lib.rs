pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod redact;
pub mod secrets;
pub mod target;

pub use error::{FleetError, Result};
