//! Matcher configuration.
//!
//! Loaded from TOML; every section is optional.
//!
//! ```toml
//! [matching]
//! min_score = 0.75
//!
//! [env]
//! REGION = "eu"
//!
//! [[hints]]
//! name = "Ping"
//! id = 5
//! fields = [{ field_name = "seq", field_type = "varint", field_id = 1 }]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matcher::{DEFAULT_MIN_SCORE, FieldData};
use crate::registry::PacketId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("min_score must be within 0.0..=1.0, got {value}")]
    InvalidMinScore { value: f64 },
}

/// # Examples
/// ```
/// use biscuit_core::Config;
///
/// let config = Config::from_toml_str("[matching]\nmin_score = 0.5\n")?;
/// assert_eq!(config.matching.min_score, 0.5);
/// assert!(config.hints.is_empty());
/// # Ok::<(), biscuit_core::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub matching: MatchingConfig,
    /// Values exposed to comparers through `Host::env`.
    pub env: BTreeMap<String, String>,
    /// Known packets used to seed the registry before matching.
    pub hints: Vec<Hint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchingConfig {
    /// Lowest shape score accepted as an identification.
    pub min_score: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

/// A packet known ahead of time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hint {
    pub name: String,
    pub id: PacketId,
    #[serde(default)]
    pub fields: Vec<FieldData>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let value = self.matching.min_score;
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidMinScore { value });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError};

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.matching.min_score, crate::matcher::DEFAULT_MIN_SCORE);
        assert!(config.env.is_empty());
        assert!(config.hints.is_empty());
    }

    #[test]
    fn parse_hints_and_env() {
        let config = Config::from_toml_str(
            r#"
[env]
REGION = "eu"

[[hints]]
name = "Ping"
id = 5
fields = [
  { field_name = "seq", field_type = "varint", field_id = 1 },
  { field_name = "note", field_type = "string", field_id = 2 },
]

[[hints]]
name = "Bye"
id = 9
"#,
        )
        .unwrap();
        assert_eq!(config.env.get("REGION").map(String::as_str), Some("eu"));
        assert_eq!(config.hints.len(), 2);
        assert_eq!(config.hints[0].fields[1].field_type, "string");
        assert!(config.hints[1].fields.is_empty());
    }

    #[test]
    fn reject_out_of_range_score() {
        let err = Config::from_toml_str("[matching]\nmin_score = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMinScore { .. }));
    }

    #[test]
    fn reject_unknown_keys() {
        let err = Config::from_toml_str("[matching]\nthreshold = 0.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn reject_out_of_range_packet_id() {
        let err = Config::from_toml_str("[[hints]]\nname = \"Big\"\nid = 70000\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
