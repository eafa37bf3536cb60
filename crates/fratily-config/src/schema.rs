//! Configuration sections.
//!
//! Every section rejects unknown fields and fills unset fields with
//! defaults, so a file only needs the values it changes.

use serde::{Deserialize, Serialize};

/// Application identity and mode.
///
/// ```
/// use fratily_config::AppSection;
///
/// let app = AppSection::default();
/// assert_eq!(app.name, "fratily");
/// assert!(!app.debug);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct AppSection {
    /// Application name, used in logs.
    pub name: String,

    /// Debug mode: error responses carry fault details.
    pub debug: bool,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "fratily".to_string(),
            debug: false,
        }
    }
}

/// HTTP listener and request limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct ServerSection {
    /// Bind address (e.g. "0.0.0.0:8080").
    pub http_addr: String,

    /// Dispatch deadline in seconds.
    pub request_timeout_secs: u64,

    /// Graceful shutdown timeout in seconds.
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body.
    pub max_body_bytes: usize,

    /// Status of responses to requests past the deadline: 503 or 504.
    pub timeout_status: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
            timeout_status: 504,
        }
    }
}

/// Response sending.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct SenderSection {
    /// Chunk size for seekable bodies. Unset sends bodies whole.
    pub chunk_size: Option<usize>,
}

/// What routing does with a request no route matches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundPolicy {
    /// Answer `404 Not Found`.
    #[default]
    Fault,
    /// Pass the request on unrouted, for middleware that serves it.
    Continue,
}

/// Routing behavior.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct RoutingSection {
    /// What happens to requests no route matches.
    pub not_found_mode: NotFoundPolicy,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable.
    Pretty,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingSection {
    /// Filter directive (e.g. "info" or "fratily=debug,hyper=warn").
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_uses_defaults() {
        let server: ServerSection = toml::from_str(r#"http_addr = "0.0.0.0:80""#).unwrap();
        assert_eq!(server.http_addr, "0.0.0.0:80");
        assert_eq!(server.timeout_status, 504);
    }

    #[test]
    fn test_not_found_mode_names() {
        let routing: RoutingSection = toml::from_str(r#"not_found_mode = "continue""#).unwrap();
        assert_eq!(routing.not_found_mode, NotFoundPolicy::Continue);
    }

    #[test]
    fn test_log_format_names() {
        let logging: LoggingSection = toml::from_str(r#"format = "pretty""#).unwrap();
        assert_eq!(logging.format, LogFormat::Pretty);
        assert!(toml::from_str::<LoggingSection>(r#"format = "xml""#).is_err());
    }
}
