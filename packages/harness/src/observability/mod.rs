// packages/harness/src/observability/mod.rs
//! Logging setup
//!
//! The harness logs through `tracing`; these helpers install a
//! `tracing-subscriber` registry for binaries and test suites that embed it.
//! Dispatch counters go through `metrics` and are no-ops until the host
//! installs a recorder.

use crate::utils::config::LoggingConfig;
use crate::utils::errors::{HarnessError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Counter incremented on every dispatch reaching the fake service
pub const DISPATCH_COUNTER: &str = "intercept_harness_dispatch_total";

/// Counter incremented when a call arrives with no callback installed
pub const UNMOCKED_COUNTER: &str = "intercept_harness_unmocked_total";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.level)?,
    };

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| HarnessError::Observability(e.to_string()))
}

/// Parse a configured level directive such as `info` or `intercept_harness=debug`
pub fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| HarnessError::Observability(format!("Invalid log filter {:?}: {}", level, e)))
}

/// Subscriber for test binaries: captured per test, safe to call repeatedly
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_tracing_twice() {
        init_test_tracing();
        init_test_tracing();
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let err = level_filter("harness=notalevel").unwrap_err();
        assert!(matches!(err, HarnessError::Observability(ref msg) if msg.contains("notalevel")));
    }

    #[test]
    fn test_default_level_parses() {
        assert!(level_filter(&LoggingConfig::default().level).is_ok());
        assert!(level_filter("intercept_harness=debug,warn").is_ok());
    }
}
