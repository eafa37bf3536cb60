//! Kernel events.
//!
//! Three points in a request's life accept listeners:
//!
//! | Event | Fired | Listeners may |
//! |---|---|---|
//! | [`RequestEvent`] | before dispatch | answer the request, skipping the chain |
//! | [`ResponseEvent`] | once a response is decided | replace the response |
//! | [`TerminateEvent`] | after the response was sent | observe only |
//!
//! Listeners run in registration order. Request listeners stop at the first
//! one that answers.

use std::sync::Arc;
use std::time::Duration;

use fratily_core::{RequestHead, RequestId, Response};

/// Pre-dispatch event.
#[derive(Debug)]
pub struct RequestEvent<'a> {
    request: &'a RequestHead,
    request_id: RequestId,
    response: Option<Response>,
}

impl<'a> RequestEvent<'a> {
    pub(crate) fn new(request: &'a RequestHead, request_id: RequestId) -> Self {
        Self {
            request,
            request_id,
            response: None,
        }
    }

    /// The incoming request.
    #[must_use]
    pub fn request(&self) -> &RequestHead {
        self.request
    }

    /// The request's ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Answers the request. The middleware chain will not run.
    pub fn set_response(&mut self, response: Response) {
        self.response = Some(response);
    }

    /// Returns `true` once a listener answered.
    #[must_use]
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    pub(crate) fn into_response(self) -> Option<Response> {
        self.response
    }
}

/// Event fired once the response is decided, before it is sent.
#[derive(Debug)]
pub struct ResponseEvent<'a> {
    request: &'a RequestHead,
    response: Response,
}

impl<'a> ResponseEvent<'a> {
    pub(crate) fn new(request: &'a RequestHead, response: Response) -> Self {
        Self { request, response }
    }

    /// The request being answered.
    #[must_use]
    pub fn request(&self) -> &RequestHead {
        self.request
    }

    /// The response about to be sent.
    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Mutable access to the response.
    pub fn response_mut(&mut self) -> &mut Response {
        &mut self.response
    }

    /// Replaces the response.
    pub fn set_response(&mut self, response: Response) {
        self.response = response;
    }

    pub(crate) fn into_response(self) -> Response {
        self.response
    }
}

/// Post-send event.
#[derive(Debug, Clone, Copy)]
pub struct TerminateEvent<'a> {
    /// The request.
    pub request: &'a RequestHead,
    /// The response that was sent.
    pub response: &'a Response,
    /// The request's ID.
    pub request_id: RequestId,
    /// Time from the start of handling to the end of sending.
    pub elapsed: Duration,
}

type RequestListener = Arc<dyn Fn(&mut RequestEvent<'_>) + Send + Sync>;
type ResponseListener = Arc<dyn Fn(&mut ResponseEvent<'_>) + Send + Sync>;
type TerminateListener = Arc<dyn Fn(&TerminateEvent<'_>) + Send + Sync>;

/// Listener lists for the kernel events.
///
/// # Example
///
/// ```
/// use fratily_core::{Response, ResponseExt};
/// use fratily_server::KernelHooks;
/// use http::StatusCode;
///
/// let hooks = KernelHooks::new()
///     .on_request(|event| {
///         if event.request().path() == "/maintenance" {
///             event.set_response(Response::text(StatusCode::SERVICE_UNAVAILABLE, "back soon"));
///         }
///     })
///     .on_terminate(|event| {
///         tracing::info!(status = %event.response.status(), "request finished");
///     });
/// assert_eq!(hooks.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct KernelHooks {
    request: Vec<RequestListener>,
    response: Vec<ResponseListener>,
    terminate: Vec<TerminateListener>,
}

impl KernelHooks {
    /// Creates empty hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pre-dispatch listener.
    #[must_use]
    pub fn on_request<F>(mut self, listener: F) -> Self
    where
        F: Fn(&mut RequestEvent<'_>) + Send + Sync + 'static,
    {
        self.request.push(Arc::new(listener));
        self
    }

    /// Adds a response listener.
    #[must_use]
    pub fn on_response<F>(mut self, listener: F) -> Self
    where
        F: Fn(&mut ResponseEvent<'_>) + Send + Sync + 'static,
    {
        self.response.push(Arc::new(listener));
        self
    }

    /// Adds a post-send listener.
    #[must_use]
    pub fn on_terminate<F>(mut self, listener: F) -> Self
    where
        F: Fn(&TerminateEvent<'_>) + Send + Sync + 'static,
    {
        self.terminate.push(Arc::new(listener));
        self
    }

    /// Returns the total number of listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.request.len() + self.response.len() + self.terminate.len()
    }

    /// Returns `true` if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn fire_request(&self, event: &mut RequestEvent<'_>) {
        for listener in &self.request {
            listener(event);
            if event.has_response() {
                break;
            }
        }
    }

    pub(crate) fn fire_response(&self, event: &mut ResponseEvent<'_>) {
        for listener in &self.response {
            listener(event);
        }
    }

    pub(crate) fn fire_terminate(&self, event: &TerminateEvent<'_>) {
        for listener in &self.terminate {
            listener(event);
        }
    }
}

impl std::fmt::Debug for KernelHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelHooks")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .field("terminate", &self.terminate.len())
            .finish()
    }
}
