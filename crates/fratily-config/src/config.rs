//! The root configuration type.

use serde::{Deserialize, Serialize};

use crate::{
    AppSection, ConfigError, LogFormat, LoggingSection, RoutingSection, SenderSection,
    ServerSection,
};

/// Complete Fratily configuration.
///
/// Built once at startup, usually with [`ConfigLoader`](crate::ConfigLoader),
/// and handed to the application that needs it.
///
/// # Example
///
/// ```
/// use fratily_config::FratilyConfig;
///
/// let config = FratilyConfig::default();
/// assert_eq!(config.server.http_addr, "127.0.0.1:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct FratilyConfig {
    /// Application section.
    #[serde(default)]
    pub app: AppSection,

    /// Server section.
    #[serde(default)]
    pub server: ServerSection,

    /// Response sending section.
    #[serde(default)]
    pub sender: SenderSection,

    /// Routing section.
    #[serde(default)]
    pub routing: RoutingSection,

    /// Logging section.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl FratilyConfig {
    /// Checks values serde cannot check.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                "must not be empty",
            ));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_secs",
                "must be greater than zero",
            ));
        }
        if !matches!(self.server.timeout_status, 503 | 504) {
            return Err(ConfigError::invalid_value(
                "server.timeout_status",
                format!("must be 503 or 504, got {}", self.server.timeout_status),
            ));
        }
        if self.sender.chunk_size == Some(0) {
            return Err(ConfigError::invalid_value(
                "sender.chunk_size",
                "must be greater than zero",
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }
        Ok(())
    }

    /// Development preset: debug error pages, debug logs, pretty output.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.app.debug = true;
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config
    }

    /// Production preset: plain error pages, JSON logs, all interfaces,
    /// 8 KiB body chunks.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.app.debug = false;
        config.server.http_addr = "0.0.0.0:8080".to_string();
        config.sender.chunk_size = Some(8192);
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        let dev = FratilyConfig::development();
        assert!(dev.app.debug);
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert!(dev.validate().is_ok());

        let prod = FratilyConfig::production();
        assert!(!prod.app.debug);
        assert_eq!(prod.sender.chunk_size, Some(8192));
        assert!(prod.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = FratilyConfig::default();
        config.sender.chunk_size = Some(0);
        assert!(config.validate().unwrap_err().to_string().contains("sender.chunk_size"));

        let mut config = FratilyConfig::default();
        config.server.timeout_status = 500;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("server.timeout_status"));

        let mut config = FratilyConfig::default();
        config.server.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = FratilyConfig::default();
        config.server.http_addr = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml_str = r#"
            [server]
            http_addr = "127.0.0.1:8000"
            max_connections = 10
        "#;
        assert!(toml::from_str::<FratilyConfig>(toml_str).is_err());
        assert!(toml::from_str::<FratilyConfig>("[metrics]\nenabled = true").is_err());
    }

    #[test]
    fn test_toml_round_trip_keeps_sections() {
        let text = toml::to_string_pretty(&FratilyConfig::production()).unwrap();
        assert!(text.contains("[server]"));
        assert!(text.contains("[logging]"));
        assert_eq!(
            toml::from_str::<FratilyConfig>(&text).unwrap(),
            FratilyConfig::production()
        );
    }
}
