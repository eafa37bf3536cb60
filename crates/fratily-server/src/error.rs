//! Server errors.

use std::net::AddrParseError;

use fratily_core::Fault;
use thiserror::Error;

/// Errors that stop the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address could not be parsed.
    #[error("invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        #[source]
        source: AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address.
        addr: String,
        /// Bind failure.
        #[source]
        source: std::io::Error,
    },

    /// I/O failure outside a single connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A fatal fault escaped the kernel.
    #[error(transparent)]
    Fault(#[from] Fault),
}

/// Result alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let source = "nope".parse::<std::net::SocketAddr>().unwrap_err();
        let err = ServerError::InvalidAddress {
            addr: "nope".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("invalid address 'nope'"));

        let err = ServerError::from(Fault::ChainExhaustedWithNoFallback);
        assert_eq!(err.to_string(), Fault::ChainExhaustedWithNoFallback.to_string());
    }
}
