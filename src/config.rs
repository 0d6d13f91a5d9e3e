/// Transport configuration
///
/// Configuration can be built in code or loaded from a JSON or YAML
/// document. Missing fields fall back to their defaults.

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{ModbusError, ModbusResult};
use crate::DEFAULT_TIMEOUT_MS;

/// MBAP transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Deadline applied to each exchange, in milliseconds
    pub timeout_ms: u64,
    /// Hex-dump every frame sent and received at debug level
    pub packet_logging: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            packet_logging: false,
        }
    }
}

impl TransportConfig {
    /// Create a configuration with the given timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout_ms: timeout.as_millis() as u64,
            ..Default::default()
        }
    }

    /// Load and validate a configuration from JSON
    pub fn from_json_str(json: &str) -> ModbusResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from YAML
    pub fn from_yaml_str(yaml: &str) -> ModbusResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ModbusResult<()> {
        if self.timeout_ms == 0 {
            return Err(ModbusError::configuration("timeout_ms must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(!config.packet_logging);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let config = TransportConfig::from_json_str(r#"{"timeout_ms": 1500, "packet_logging": true}"#).unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(1500));
        assert!(config.packet_logging);

        // missing fields use defaults
        let config = TransportConfig::from_json_str("{}").unwrap();
        assert_eq!(config, TransportConfig::default());
    }

    #[test]
    fn test_from_yaml() {
        let config = TransportConfig::from_yaml_str("timeout_ms: 250\n").unwrap();
        assert_eq!(config.timeout_ms, 250);
        assert!(!config.packet_logging);
    }

    #[test]
    fn test_rejects_invalid() {
        let err = TransportConfig::from_json_str(r#"{"timeout_ms": 0}"#).unwrap_err();
        assert!(matches!(err, ModbusError::Configuration { .. }));

        let err = TransportConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ModbusError::Configuration { .. }));

        let err = TransportConfig::from_yaml_str("timeout_ms: [1, 2]").unwrap_err();
        assert!(matches!(err, ModbusError::Configuration { .. }));
    }

    #[test]
    fn test_with_timeout() {
        let config = TransportConfig::with_timeout(Duration::from_millis(42));
        assert_eq!(config.timeout_ms, 42);
    }
}
