//! Logging for Fratily services.
//!
//! Fratily code logs through `tracing`. This crate installs the subscriber
//! that turns those events into output: JSON lines in production, pretty
//! text in development.
//!
//! # Example
//!
//! ```no_run
//! use fratily_telemetry::{init_logging, LogConfig};
//!
//! # fn main() -> Result<(), fratily_telemetry::TelemetryError> {
//! init_logging(&LogConfig::production().level("info,fratily_server=debug"))?;
//!
//! tracing::info!(http.path = "/health", "probe");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::LogConfig;
pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
