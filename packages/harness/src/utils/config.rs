// packages/harness/src/utils/config.rs
//! Harness configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `intercept-harness.{toml,yaml,json}` (or an explicit file), then
//! `HARNESS__SECTION__KEY` environment variables.

use crate::utils::errors::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bundled dependency list, in load order
pub const DEFAULT_RESOURCES: [&str; 3] = [
    "resources/mojo_bindings.yaml",
    "resources/string16.yaml",
    "resources/idle_manager.yaml",
];

/// Interface intercepted by default
pub const DEFAULT_INTERFACE: &str = "blink.mojom.IdleManager";

/// Engine enum mirrored into the symbolic state constants
pub const DEFAULT_STATE_ENUM: &str = "blink.mojom.IdleState";

/// Top-level harness configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub resources: ResourcesConfig,

    #[serde(default)]
    pub interception: InterceptionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where definition resources come from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// Directory to read resources from; bundled resources when unset
    pub root: Option<PathBuf>,

    /// Ordered resource identifiers
    pub scripts: Vec<String>,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            root: None,
            scripts: DEFAULT_RESOURCES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// What gets intercepted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterceptionConfig {
    /// Canonical name of the intercepted interface
    pub interface: String,

    /// Enum whose ACTIVE/IDLE/LOCKED values are mirrored
    pub state_enum: String,
}

impl Default for InterceptionConfig {
    fn default() -> Self {
        Self {
            interface: DEFAULT_INTERFACE.to_string(),
            state_enum: DEFAULT_STATE_ENUM.to_string(),
        }
    }
}

/// Logging setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl HarnessConfig {
    /// Load from defaults, `intercept-harness.*` in the working directory,
    /// and the environment
    pub fn load() -> Result<Self> {
        Self::build(None)
    }

    /// Load with an explicit configuration file in place of the default
    /// lookup
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(Some(path.as_ref()))
    }

    fn build(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        builder = match path {
            Some(path) => {
                debug!("Loading harness configuration from {:?}", path);
                builder.add_source(File::from(path))
            }
            None => builder.add_source(File::with_name("intercept-harness").required(false)),
        };

        let config = builder
            .add_source(
                Environment::with_prefix("HARNESS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("resources.scripts")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = HarnessConfig::default();
        assert_eq!(config.resources.scripts.len(), 3);
        assert!(config.resources.root.is_none());
        assert_eq!(config.interception.interface, "blink.mojom.IdleManager");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[resources]
root = "/srv/defs"
scripts = ["a.yaml", "b.yaml"]

[logging]
json = true
"#
        )
        .unwrap();

        let config = HarnessConfig::load_from(file.path()).unwrap();
        assert_eq!(config.resources.root, Some(PathBuf::from("/srv/defs")));
        assert_eq!(config.resources.scripts, vec!["a.yaml", "b.yaml"]);
        assert!(config.logging.json);
        // Untouched sections keep their defaults
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.interception.state_enum, "blink.mojom.IdleState");
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = HarnessConfig::load_from("/nonexistent/harness.toml");
        assert!(result.is_err());
    }
}
