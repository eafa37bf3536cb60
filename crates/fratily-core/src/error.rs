//! Fault types for Fratily.
//!
//! Every failure that can happen while a request travels through the kernel
//! is a [`Fault`]. Faults are grouped by [`FaultKind`], and the kind decides
//! whether the kernel may translate the fault into an error response or must
//! let it propagate to the outermost caller.
//!
//! | Kind | Variants | Recovered by the kernel |
//! |---|---|---|
//! | `Routing` | `NotFound`, `MethodNotAllowed` | yes |
//! | `Status` | `HttpStatus`, `Timeout` | yes |
//! | `Invocation` | `MissingArgument`, `InvalidActionResult`, `ActionNotCallable`, `ActionMethodNotPublicOrIsStatic` | yes |
//! | `Application` | `Application` | yes |
//! | `Configuration` | `InvalidRoute` | no |
//! | `Chain` | `FallbackInvokedTwice`, `ChainExhaustedWithNoFallback` | no |
//! | `Transport` | `BodyNotReadable`, `BodyNotWritable`, `Transport` | no |
//! | `Escalated` | `ErrorHandling` | no |

use std::panic::Location;
use std::time::Duration;

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`Fault`].
pub type FaultResult<T> = Result<T, Fault>;

/// Classification of faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The request did not resolve to a route.
    Routing,
    /// A typed HTTP status signal.
    Status,
    /// Argument binding or return value coercion failed.
    Invocation,
    /// An error raised by application code.
    Application,
    /// Broken registration-time configuration.
    Configuration,
    /// Middleware wiring bug.
    Chain,
    /// The response could not be written.
    Transport,
    /// A fault raised while building an error response.
    Escalated,
}

impl FaultKind {
    /// Returns `true` if the kernel may translate faults of this kind into
    /// an error response.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Routing | Self::Status | Self::Invocation | Self::Application
        )
    }
}

/// Standard fault type for Fratily.
///
/// # Example
///
/// ```
/// use fratily_core::{Fault, FaultKind};
/// use http::StatusCode;
///
/// let fault = Fault::status(StatusCode::FORBIDDEN, "members only");
/// assert_eq!(fault.kind(), FaultKind::Status);
/// assert_eq!(fault.status_code(), StatusCode::FORBIDDEN);
/// assert!(fault.is_recoverable());
/// ```
#[derive(Error, Debug)]
pub enum Fault {
    /// No route pattern matches the request path.
    #[error("no route matches {method} {path}")]
    NotFound {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
        /// Where the fault was raised.
        location: &'static Location<'static>,
    },

    /// A route pattern matches the path but not the method.
    #[error("method {method} is not allowed for {path} (allowed: {})", join_methods(.allowed))]
    MethodNotAllowed {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
        /// Methods the matching routes accept.
        allowed: Vec<Method>,
        /// Where the fault was raised.
        location: &'static Location<'static>,
    },

    /// Application code asked for a specific HTTP status.
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        /// The status to respond with.
        status: StatusCode,
        /// Human-readable message.
        message: String,
        /// Where the fault was raised.
        location: &'static Location<'static>,
    },

    /// The transport deadline was exceeded.
    #[error("request exceeded the {deadline:?} deadline")]
    Timeout {
        /// The configured deadline.
        deadline: Duration,
        /// Status used for the error response (503 or 504).
        status: StatusCode,
    },

    /// No binding source satisfied a required action parameter.
    #[error("action {action} is missing a value for parameter `{parameter}`")]
    MissingArgument {
        /// Action identity.
        action: String,
        /// Parameter name.
        parameter: String,
        /// Where the fault was raised.
        location: &'static Location<'static>,
    },

    /// The action returned a value that cannot become a response.
    #[error("action {action} returned an unsupported value of type {actual}")]
    InvalidActionResult {
        /// Action identity.
        action: String,
        /// Name of the returned type.
        actual: String,
        /// Where the fault was raised.
        location: &'static Location<'static>,
    },

    /// The action reference does not resolve to something callable.
    #[error("action {action} is not callable: {reason}")]
    ActionNotCallable {
        /// Action identity.
        action: String,
        /// Why resolution failed.
        reason: String,
        /// Where the fault was raised.
        location: &'static Location<'static>,
    },

    /// The controller method is private or static.
    #[error("{controller}:{method} must be a public, non-static method")]
    ActionMethodNotPublicOrIsStatic {
        /// Controller name.
        controller: String,
        /// Method name.
        method: String,
    },

    /// A route definition was rejected at registration.
    #[error("invalid route: {reason}")]
    InvalidRoute {
        /// Why the route was rejected.
        reason: String,
    },

    /// The fallback handler was entered a second time within one request.
    #[error("the fallback handler was invoked twice within one request")]
    FallbackInvokedTwice,

    /// The chain ran out of middleware and has no fallback.
    #[error("the middleware chain is exhausted and no fallback handler is configured")]
    ChainExhaustedWithNoFallback,

    /// The response body cannot be read.
    #[error("response body is not readable")]
    BodyNotReadable,

    /// The response body cannot be written.
    #[error("response body is not writable")]
    BodyNotWritable,

    /// Writing to the transport failed.
    #[error("transport write failed: {0}")]
    Transport(#[from] std::io::Error),

    /// Building the error response raised another fault.
    #[error("error handling failed with `{secondary}` while handling `{original}`")]
    ErrorHandling {
        /// The fault being translated.
        original: Box<Fault>,
        /// The fault raised by the error path.
        secondary: Box<Fault>,
    },

    /// Any error raised by application code.
    #[error("{source}")]
    Application {
        /// The underlying error.
        source: anyhow::Error,
        /// Where the fault entered the kernel's error type.
        location: &'static Location<'static>,
    },
}

impl Fault {
    /// Creates a not found fault.
    #[must_use]
    #[track_caller]
    pub fn not_found(method: Method, path: impl Into<String>) -> Self {
        Self::NotFound {
            method,
            path: path.into(),
            location: Location::caller(),
        }
    }

    /// Creates a method not allowed fault.
    #[must_use]
    #[track_caller]
    pub fn method_not_allowed(method: Method, path: impl Into<String>, allowed: Vec<Method>) -> Self {
        Self::MethodNotAllowed {
            method,
            path: path.into(),
            allowed,
            location: Location::caller(),
        }
    }

    /// Creates an HTTP status signal.
    #[must_use]
    #[track_caller]
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
            location: Location::caller(),
        }
    }

    /// Creates a missing argument fault.
    #[must_use]
    #[track_caller]
    pub fn missing_argument(action: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingArgument {
            action: action.into(),
            parameter: parameter.into(),
            location: Location::caller(),
        }
    }

    /// Creates an invalid action result fault.
    #[must_use]
    #[track_caller]
    pub fn invalid_action_result(action: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidActionResult {
            action: action.into(),
            actual: actual.into(),
            location: Location::caller(),
        }
    }

    /// Creates an action not callable fault.
    #[must_use]
    #[track_caller]
    pub fn not_callable(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ActionNotCallable {
            action: action.into(),
            reason: reason.into(),
            location: Location::caller(),
        }
    }

    /// Creates an invalid route fault.
    #[must_use]
    pub fn invalid_route(reason: impl Into<String>) -> Self {
        Self::InvalidRoute {
            reason: reason.into(),
        }
    }

    /// Wraps an application error, recording the caller's location.
    #[track_caller]
    pub fn other(source: impl Into<anyhow::Error>) -> Self {
        Self::Application {
            source: source.into(),
            location: Location::caller(),
        }
    }

    /// Combines a fault raised by the error path with the fault it was
    /// handling.
    #[must_use]
    pub fn escalate(original: Self, secondary: Self) -> Self {
        Self::ErrorHandling {
            original: Box::new(original),
            secondary: Box::new(secondary),
        }
    }

    /// Returns the fault kind.
    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        match self {
            Self::NotFound { .. } | Self::MethodNotAllowed { .. } => FaultKind::Routing,
            Self::HttpStatus { .. } | Self::Timeout { .. } => FaultKind::Status,
            Self::MissingArgument { .. }
            | Self::InvalidActionResult { .. }
            | Self::ActionNotCallable { .. }
            | Self::ActionMethodNotPublicOrIsStatic { .. } => FaultKind::Invocation,
            Self::Application { .. } => FaultKind::Application,
            Self::InvalidRoute { .. } => FaultKind::Configuration,
            Self::FallbackInvokedTwice | Self::ChainExhaustedWithNoFallback => FaultKind::Chain,
            Self::BodyNotReadable | Self::BodyNotWritable | Self::Transport(_) => {
                FaultKind::Transport
            }
            Self::ErrorHandling { .. } => FaultKind::Escalated,
        }
    }

    /// Returns `true` if the kernel may translate this fault into an error
    /// response.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        self.kind().is_recoverable()
    }

    /// Returns the HTTP status an error response for this fault carries.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::HttpStatus { status, .. } | Self::Timeout { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the allowed methods for a method-not-allowed fault.
    #[must_use]
    pub fn allowed_methods(&self) -> Option<&[Method]> {
        match self {
            Self::MethodNotAllowed { allowed, .. } => Some(allowed.as_slice()),
            _ => None,
        }
    }

    /// Returns where the fault was raised, for faults that record it.
    #[must_use]
    pub const fn location(&self) -> Option<&'static Location<'static>> {
        match self {
            Self::NotFound { location, .. }
            | Self::MethodNotAllowed { location, .. }
            | Self::HttpStatus { location, .. }
            | Self::MissingArgument { location, .. }
            | Self::InvalidActionResult { location, .. }
            | Self::ActionNotCallable { location, .. }
            | Self::Application { location, .. } => Some(*location),
            _ => None,
        }
    }

    /// Returns the variant name, used as the fault's type in debug output.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::MethodNotAllowed { .. } => "MethodNotAllowed",
            Self::HttpStatus { .. } => "HttpStatus",
            Self::Timeout { .. } => "Timeout",
            Self::MissingArgument { .. } => "MissingArgument",
            Self::InvalidActionResult { .. } => "InvalidActionResult",
            Self::ActionNotCallable { .. } => "ActionNotCallable",
            Self::ActionMethodNotPublicOrIsStatic { .. } => "ActionMethodNotPublicOrIsStatic",
            Self::InvalidRoute { .. } => "InvalidRoute",
            Self::FallbackInvokedTwice => "FallbackInvokedTwice",
            Self::ChainExhaustedWithNoFallback => "ChainExhaustedWithNoFallback",
            Self::BodyNotReadable => "BodyNotReadable",
            Self::BodyNotWritable => "BodyNotWritable",
            Self::Transport(_) => "Transport",
            Self::ErrorHandling { .. } => "ErrorHandling",
            Self::Application { .. } => "Application",
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            Self::HttpStatus { .. } => "HTTP_STATUS",
            Self::Timeout { .. } => "TIMEOUT",
            Self::MissingArgument { .. } => "MISSING_ARGUMENT",
            Self::InvalidActionResult { .. } => "INVALID_ACTION_RESULT",
            Self::ActionNotCallable { .. } | Self::ActionMethodNotPublicOrIsStatic { .. } => {
                "ACTION_NOT_CALLABLE"
            }
            Self::InvalidRoute { .. } => "INVALID_ROUTE",
            Self::FallbackInvokedTwice | Self::ChainExhaustedWithNoFallback => "CHAIN_FAULT",
            Self::BodyNotReadable | Self::BodyNotWritable | Self::Transport(_) => {
                "TRANSPORT_FAULT"
            }
            Self::ErrorHandling { .. } => "ERROR_HANDLING_FAILED",
            Self::Application { .. } => "INTERNAL_ERROR",
        }
    }

    /// Converts this fault to a serializable error envelope.
    ///
    /// Only routing and status faults expose their message; everything else
    /// reports the generic phrase of its status code.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        let status = self.status_code();
        let message = match self.kind() {
            FaultKind::Routing | FaultKind::Status => self.to_string(),
            _ => crate::status::reason_phrase(status.as_u16())
                .unwrap_or(crate::status::UNKNOWN_STATUS_PHRASE)
                .to_string(),
        };

        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
                status: status.as_u16(),
                allowed: self
                    .allowed_methods()
                    .map(|methods| methods.iter().map(ToString::to_string).collect()),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

impl From<anyhow::Error> for Fault {
    #[track_caller]
    fn from(source: anyhow::Error) -> Self {
        Self::other(source)
    }
}

/// Joins methods the way an `Allow` header lists them.
#[must_use]
pub fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status code.
    pub status: u16,
    /// Allowed methods, for 405 responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_faults_map_to_their_status() {
        let fault = Fault::not_found(Method::GET, "/gadgets/5");
        assert_eq!(fault.kind(), FaultKind::Routing);
        assert_eq!(fault.status_code(), StatusCode::NOT_FOUND);

        let fault = Fault::method_not_allowed(Method::POST, "/widgets/5", vec![Method::GET]);
        assert_eq!(fault.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(fault.allowed_methods(), Some(&[Method::GET][..]));
        assert!(fault.to_string().contains("allowed: GET"));
    }

    #[test]
    fn test_chain_and_transport_faults_are_fatal() {
        assert!(!Fault::FallbackInvokedTwice.is_recoverable());
        assert!(!Fault::ChainExhaustedWithNoFallback.is_recoverable());
        assert!(!Fault::BodyNotReadable.is_recoverable());
        assert!(!Fault::invalid_route("empty path").is_recoverable());
        assert!(!Fault::escalate(Fault::BodyNotWritable, Fault::BodyNotReadable).is_recoverable());
    }

    #[test]
    fn test_invocation_faults_are_recoverable() {
        let fault = Fault::missing_argument("users:show", "id");
        assert_eq!(fault.kind(), FaultKind::Invocation);
        assert!(fault.is_recoverable());
        assert_eq!(fault.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(fault.to_string().contains("`id`"));
    }

    #[test]
    fn test_kernel_faults_record_where_they_were_raised() {
        let line = line!() + 1;
        let faults = [
            Fault::not_found(Method::GET, "/"),
            Fault::missing_argument("users:show", "id"),
            Fault::invalid_action_result("users:list", "array"),
            Fault::status(StatusCode::FORBIDDEN, "members only"),
        ];
        for fault in &faults {
            let location = fault.location().unwrap();
            assert_eq!(location.file(), file!());
            assert!(location.line() > line && location.line() <= line + 4);
        }
        assert!(Fault::FallbackInvokedTwice.location().is_none());
    }

    #[test]
    fn test_application_fault_records_location() {
        let fault = Fault::other(anyhow::anyhow!("database unavailable"));
        let location = fault.location().unwrap();
        assert!(location.file().ends_with("error.rs"));
        assert_eq!(fault.to_string(), "database unavailable");
        assert_eq!(fault.kind(), FaultKind::Application);
    }

    #[test]
    fn test_timeout_uses_configured_status() {
        let fault = Fault::Timeout {
            deadline: Duration::from_secs(3),
            status: StatusCode::SERVICE_UNAVAILABLE,
        };
        assert_eq!(fault.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(fault.is_recoverable());
    }

    #[test]
    fn test_envelope_hides_internal_messages() {
        let fault = Fault::other(anyhow::anyhow!("secret connection string"));
        let envelope = fault.to_envelope(Some("req-1"));
        assert_eq!(envelope.error.message, "Internal Server Error");
        assert_eq!(envelope.error.code, "INTERNAL_ERROR");

        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"request_id\":\"req-1\""));
        assert!(!json.contains("secret"));
        assert!(!json.contains("allowed"));
    }

    #[test]
    fn test_envelope_lists_allowed_methods() {
        let fault =
            Fault::method_not_allowed(Method::DELETE, "/widgets", vec![Method::GET, Method::POST]);
        let envelope = fault.to_envelope(None);
        assert_eq!(envelope.error.status, 405);
        assert_eq!(
            envelope.error.allowed,
            Some(vec!["GET".to_string(), "POST".to_string()])
        );
    }
}
