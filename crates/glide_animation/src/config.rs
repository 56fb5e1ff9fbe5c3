//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Animation engine configuration
///
/// ```
/// use glide_animation::EngineConfig;
///
/// let config = EngineConfig::from_toml_str("pool_capacity = 16").unwrap();
/// assert_eq!(config.pool_capacity, 16);
/// assert!(config.skip_first_tick);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ignore the very first `tick` so a large startup delta never lands
    /// on a freshly started animation
    pub skip_first_tick: bool,
    /// Maximum number of recycled value records kept per value kind
    pub pool_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            skip_first_tick: true,
            pool_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// Configuration for deterministic stepping (tests, offline rendering)
    pub fn deterministic() -> Self {
        Self {
            skip_first_tick: false,
            ..Self::default()
        }
    }

    /// Parse a configuration from TOML; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| EngineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_parse_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            skip_first_tick = false
            pool_capacity = 8
            "#,
        )
        .unwrap();
        assert!(!config.skip_first_tick);
        assert_eq!(config.pool_capacity, 8);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = EngineConfig::from_toml_str("pool_capacity = \"lots\"").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let text = EngineConfig::deterministic().to_toml_string().unwrap();
        assert_eq!(
            EngineConfig::from_toml_str(&text).unwrap(),
            EngineConfig::deterministic()
        );
    }
}
