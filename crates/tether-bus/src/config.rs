//! Bus configuration
//!
//! Tunables for channel sizing, loadable from TOML.

use serde::Deserialize;

/// Errors that can occur while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse bus config: {0}")]
    Parse(String),
}

/// Host-runtime channel tunables
///
/// The TOML format is:
///
/// ```toml
/// [bus]
/// default_qos_depth = 10
/// event_channel_capacity = 64
/// parameter_channel_capacity = 64
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// QoS depth used when an endpoint does not specify one
    pub default_qos_depth: usize,

    /// Capacity of the parameter-event broadcast channel
    pub event_channel_capacity: usize,

    /// Capacity of the parameter service command channel
    pub parameter_channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            default_qos_depth: 10,
            event_channel_capacity: 64,
            parameter_channel_capacity: 64,
        }
    }
}

impl BusConfig {
    /// Parse a config from TOML content
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        struct TomlDoc {
            #[serde(default)]
            bus: Option<BusConfig>,
        }

        let doc: TomlDoc =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(doc.bus.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_from_toml() {
        let toml = r#"
[bus]
default_qos_depth = 7
event_channel_capacity = 128
"#;
        let config = BusConfig::from_toml(toml).unwrap();
        assert_eq!(config.default_qos_depth, 7);
        assert_eq!(config.event_channel_capacity, 128);
        // Unspecified fields fall back to defaults
        assert_eq!(config.parameter_channel_capacity, 64);
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = BusConfig::from_toml("").unwrap();
        assert_eq!(config.default_qos_depth, 10);
        assert_eq!(config.event_channel_capacity, 64);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(BusConfig::from_toml("[bus\n???").is_err());
    }
}
