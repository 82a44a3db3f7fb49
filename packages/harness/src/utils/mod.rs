// packages/harness/src/utils/mod.rs
//! Shared utilities: errors, configuration, timing helpers

pub mod config;
pub mod errors;
pub mod timing;

pub use config::{HarnessConfig, InterceptionConfig, LoggingConfig, ResourcesConfig};
pub use errors::{CallbackError, HarnessError, Result};
pub use timing::sleep_at_least;
