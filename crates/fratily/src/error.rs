//! Application-level errors.

use fratily_config::ConfigError;
use fratily_core::Fault;
use fratily_server::ServerError;
use fratily_telemetry::TelemetryError;
use thiserror::Error;

/// Errors raised while assembling or starting an application.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid route or middleware wiring.
    #[error(transparent)]
    Fault(#[from] Fault),

    /// The server failed to start or stopped with an error.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Logging could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

impl Error {
    /// Wraps any other error as an application fault.
    pub fn other(source: impl Into<anyhow::Error>) -> Self {
        Self::Fault(Fault::other(source))
    }
}

/// Result type for application assembly.
pub type Result<T> = std::result::Result<T, Error>;
