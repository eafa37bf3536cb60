//! Per-request state shared along the chain.

use std::time::{Duration, Instant};

use fratily_core::RequestId;
use http::Extensions;

/// State one request carries through the chain.
///
/// A context is built by the kernel for each request and handed to every
/// middleware by `&mut`; nothing in it outlives the request. The request
/// ID middleware fills in the ID, routing records the route name, and any
/// middleware may leave typed values for the ones inside it.
///
/// # Example
///
/// ```
/// use fratily_middleware::MiddlewareContext;
///
/// #[derive(Clone)]
/// struct Locale(&'static str);
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_route_name("users.show".to_string());
/// ctx.set_extension(Locale("fr"));
///
/// assert_eq!(ctx.route_name(), Some("users.show"));
/// assert_eq!(ctx.get_extension::<Locale>().map(|l| l.0), Some("fr"));
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,
    route_name: Option<String>,
    started: Instant,
    extensions: Extensions,
}

impl MiddlewareContext {
    /// Creates a context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context for a request whose ID is already known.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            route_name: None,
            started: Instant::now(),
            extensions: Extensions::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Replaces the request ID.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the name of the matched route.
    #[must_use]
    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    /// Records the name of the matched route.
    pub fn set_route_name(&mut self, route_name: String) {
        self.route_name = Some(route_name);
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Stores a value, replacing any previous value of the same type.
    pub fn set_extension<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(value);
    }

    /// Returns the stored value of type `T`.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get()
    }

    /// Removes and returns the stored value of type `T`.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions.remove()
    }

    /// Returns `true` if a value of type `T` is stored.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.get::<T>().is_some()
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}
