//! Global subscriber installation. Kept in its own test binary: the
//! subscriber is process-wide.

use fratily_telemetry::{init_logging, LogConfig, TelemetryError};

#[test]
fn second_install_is_rejected() {
    init_logging(&LogConfig::development().level("debug")).unwrap();
    tracing::info!(request_id = "r-1", "installed");

    let err = init_logging(&LogConfig::production()).unwrap_err();
    assert!(matches!(err, TelemetryError::LoggingInit(_)));
}
