//! Logging configuration.

/// Logging configuration.
///
/// ```
/// use fratily_telemetry::LogConfig;
///
/// let config = LogConfig::default().level("info,fratily=debug");
/// assert!(config.json_format);
/// assert_eq!(config.level, "info,fratily=debug");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is installed at all.
    pub enabled: bool,

    /// `EnvFilter` directive (e.g. "info" or "fratily=debug,hyper=warn").
    pub level: String,

    /// JSON lines when true, pretty multi-line output otherwise.
    pub json_format: bool,

    /// Terminal colors for the pretty format.
    pub ansi: bool,

    /// Whether to include the event target (module path).
    pub include_target: bool,

    /// Whether to include file and line.
    pub file_line_info: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Human-readable debug output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            ansi: true,
            include_target: true,
            file_line_info: true,
        }
    }

    /// JSON lines at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            ansi: false,
            include_target: true,
            file_line_info: false,
        }
    }

    /// Sets the filter directive.
    #[must_use]
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Chooses JSON or pretty output.
    #[must_use]
    pub fn json(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }

    /// Turns logging off entirely.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
