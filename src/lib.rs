//! Chatbridge library
//!
//! Headless integration runtime for an asynchronously-loaded customer
//! messaging widget: readiness gating, retrying action dispatch, and
//! idempotent element enhancement over vendor-bus and page-surface ports.

pub mod cli;
pub mod config;
pub mod errors;
pub mod integration;
pub mod sim;

pub use config::{load_config, AppConfig, LoadedConfig};
pub use errors::IntegrationError;
pub use integration::Integration;
