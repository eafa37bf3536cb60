//! The error path.
//!
//! When a recoverable fault escapes the middleware chain, the kernel hands
//! it to an [`ErrorController`], which turns it into a response. The
//! default [`HttpErrorController`] picks a handler registered for the
//! fault's status, or renders the fault with an [`ErrorRenderer`]:
//!
//! | Renderer | Body |
//! |---|---|
//! | [`PlainRenderer`] | `404 Not Found` |
//! | [`JsonRenderer`] | the fault's JSON error envelope |
//! | [`DebugRenderer`] | fault type, message, origin, cause chain and captured frames |
//!
//! A `405` response always carries an `Allow` header listing the methods
//! the matching routes accept.

use std::backtrace::BacktraceStatus;
use std::collections::HashMap;
use std::error::Error as _;
use std::fmt::Write as _;
use std::sync::Arc;

use fratily_core::status::reason_phrase_or_unknown;
use fratily_core::{
    join_methods, BoxFuture, Fault, FaultResult, RequestHead, RequestId, Response, ResponseExt,
};
use http::header::ALLOW;
use http::{HeaderValue, StatusCode};

/// Translates faults into responses.
pub trait ErrorController: Send + Sync + 'static {
    /// Builds the error response for `fault`.
    ///
    /// A fault returned from here is not translated again; the kernel
    /// escalates it to the caller.
    fn handle<'a>(
        &'a self,
        request: &'a RequestHead,
        fault: &'a Fault,
        request_id: RequestId,
    ) -> BoxFuture<'a, FaultResult<Response>>;
}

/// Renders a fault as a response body.
pub trait ErrorRenderer: Send + Sync + 'static {
    /// Renders `fault` with its status.
    fn render(&self, fault: &Fault, request_id: RequestId) -> Response;
}

/// Status code and phrase only.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl ErrorRenderer for PlainRenderer {
    fn render(&self, fault: &Fault, _request_id: RequestId) -> Response {
        let status = fault.status_code();
        Response::text(
            status,
            format!("{} {}", status.as_u16(), reason_phrase_or_unknown(status.as_u16())),
        )
    }
}

/// The JSON error envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ErrorRenderer for JsonRenderer {
    fn render(&self, fault: &Fault, request_id: RequestId) -> Response {
        let envelope = fault.to_envelope(Some(&request_id.to_string()));
        Response::json(fault.status_code(), &envelope)
    }
}

/// Everything known about the fault, for development.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugRenderer;

impl DebugRenderer {
    fn body(fault: &Fault, request_id: RequestId) -> String {
        let status = fault.status_code();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} {}\n",
            status.as_u16(),
            reason_phrase_or_unknown(status.as_u16())
        );
        let _ = writeln!(out, "type:       {} ({:?})", fault.name(), fault.kind());
        let _ = writeln!(out, "message:    {fault}");
        let _ = writeln!(out, "request id: {request_id}");
        if let Some(location) = fault.location() {
            let _ = writeln!(out, "origin:     {}:{}", location.file(), location.line());
        }

        let mut source = fault.source();
        if source.is_some() {
            let _ = writeln!(out, "\ncaused by:");
        }
        while let Some(cause) = source {
            let _ = writeln!(out, "  - {cause}");
            source = cause.source();
        }

        if let Fault::Application { source, .. } = fault {
            let backtrace = source.backtrace();
            if backtrace.status() == BacktraceStatus::Captured {
                let _ = writeln!(out, "\nframes:\n{backtrace}");
            }
        }
        out
    }
}

impl ErrorRenderer for DebugRenderer {
    fn render(&self, fault: &Fault, request_id: RequestId) -> Response {
        Response::text(fault.status_code(), Self::body(fault, request_id))
    }
}

/// Handler answering one status code.
pub type StatusHandler =
    Arc<dyn Fn(&RequestHead, &Fault) -> FaultResult<Response> + Send + Sync + 'static>;

/// Error controller with per-status handlers and a fallback renderer.
///
/// # Example
///
/// ```
/// use fratily_core::{Response, ResponseExt};
/// use fratily_server::HttpErrorController;
/// use http::StatusCode;
///
/// let controller = HttpErrorController::plain().on_status(StatusCode::NOT_FOUND, |request, _| {
///     Ok(Response::text(StatusCode::NOT_FOUND, format!("nothing at {}", request.path())))
/// });
/// assert!(controller.handles(StatusCode::NOT_FOUND));
/// ```
#[derive(Clone)]
pub struct HttpErrorController {
    renderer: Arc<dyn ErrorRenderer>,
    handlers: HashMap<StatusCode, StatusHandler>,
}

impl HttpErrorController {
    /// Creates a controller rendering faults with `renderer`.
    #[must_use]
    pub fn new(renderer: Arc<dyn ErrorRenderer>) -> Self {
        Self {
            renderer,
            handlers: HashMap::new(),
        }
    }

    /// Controller for production: status and phrase only.
    #[must_use]
    pub fn plain() -> Self {
        Self::new(Arc::new(PlainRenderer))
    }

    /// Controller for development: full fault details.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Arc::new(DebugRenderer))
    }

    /// Picks the debug or plain controller.
    #[must_use]
    pub fn for_mode(debug: bool) -> Self {
        if debug {
            Self::debug()
        } else {
            Self::plain()
        }
    }

    /// Registers a handler for one status code.
    #[must_use]
    pub fn on_status<F>(mut self, status: StatusCode, handler: F) -> Self
    where
        F: Fn(&RequestHead, &Fault) -> FaultResult<Response> + Send + Sync + 'static,
    {
        self.handlers.insert(status, Arc::new(handler));
        self
    }

    /// Returns `true` if a handler is registered for `status`.
    #[must_use]
    pub fn handles(&self, status: StatusCode) -> bool {
        self.handlers.contains_key(&status)
    }

    fn respond(
        &self,
        request: &RequestHead,
        fault: &Fault,
        request_id: RequestId,
    ) -> FaultResult<Response> {
        let status = fault.status_code();
        let mut response = match self.handlers.get(&status) {
            Some(handler) => handler(request, fault)?,
            None => self.renderer.render(fault, request_id),
        };

        if let Some(allowed) = fault.allowed_methods() {
            let value = HeaderValue::from_str(&join_methods(allowed))
                .map_err(|e| Fault::other(anyhow::Error::new(e)))?;
            response.headers_mut().insert(ALLOW, value);
        }
        Ok(response)
    }
}

impl Default for HttpErrorController {
    fn default() -> Self {
        Self::plain()
    }
}

impl ErrorController for HttpErrorController {
    fn handle<'a>(
        &'a self,
        request: &'a RequestHead,
        fault: &'a Fault,
        request_id: RequestId,
    ) -> BoxFuture<'a, FaultResult<Response>> {
        Box::pin(async move { self.respond(request, fault, request_id) })
    }
}

impl std::fmt::Debug for HttpErrorController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut statuses: Vec<u16> = self.handlers.keys().map(StatusCode::as_u16).collect();
        statuses.sort_unstable();
        f.debug_struct("HttpErrorController")
            .field("handlers", &statuses)
            .finish_non_exhaustive()
    }
}
