//! The middleware chain.
//!
//! A [`MiddlewareChain`] is an ordered list of middleware plus an optional
//! fallback handler. The list is immutable once the chain is in use: every
//! call to [`MiddlewareChain::handle`] walks it with a fresh, request-local
//! [`Next`] cursor and a fresh [`FallbackGuard`], so concurrent requests
//! never observe each other's traversal state.

use std::sync::Arc;

use fratily_core::{FaultResult, Request, Response};

use crate::context::MiddlewareContext;
use crate::middleware::{BoxedMiddleware, FallbackGuard, Middleware, Next};

/// An ordered middleware list around a fallback handler.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use fratily_core::{Body, Request};
/// use fratily_middleware::{DefaultResponder, MiddlewareChain, MiddlewareContext};
///
/// # tokio_test::block_on(async {
/// let chain = MiddlewareChain::new().with_fallback(Arc::new(DefaultResponder));
///
/// let mut ctx = MiddlewareContext::new();
/// let request: Request = http::Request::builder().uri("/").body(Body::empty()).unwrap();
/// let response = chain.handle(&mut ctx, request).await.unwrap();
/// assert_eq!(response.status(), 200);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middleware: Vec<BoxedMiddleware>,
    fallback: Option<BoxedMiddleware>,
}

impl MiddlewareChain {
    /// Creates an empty chain with no fallback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fallback handler.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn Middleware>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Appends a middleware to the end of the list.
    #[must_use]
    pub fn with(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.push(middleware);
        self
    }

    /// Appends a middleware to the end of the list.
    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.middleware.push(middleware);
    }

    /// Inserts a middleware at the front of the list.
    pub fn prepend(&mut self, middleware: Arc<dyn Middleware>) {
        self.middleware.insert(0, middleware);
    }

    /// Appends every middleware from an iterator.
    pub fn extend(&mut self, middleware: impl IntoIterator<Item = Arc<dyn Middleware>>) {
        self.middleware.extend(middleware);
    }

    /// Runs a request through the chain.
    ///
    /// # Errors
    ///
    /// Returns whatever fault stopped the request, including the chain
    /// faults [`Fault::FallbackInvokedTwice`](fratily_core::Fault::FallbackInvokedTwice)
    /// and [`Fault::ChainExhaustedWithNoFallback`](fratily_core::Fault::ChainExhaustedWithNoFallback).
    pub async fn handle(
        &self,
        ctx: &mut MiddlewareContext,
        request: Request,
    ) -> FaultResult<Response> {
        let guard = FallbackGuard::new();
        Next::new(&self.middleware, self.fallback.as_deref(), &guard)
            .run(ctx, request)
            .await
    }

    /// Returns the middleware names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Returns the fallback's name, if there is one.
    #[must_use]
    pub fn fallback_name(&self) -> Option<&'static str> {
        self.fallback.as_ref().map(|f| f.name())
    }

    /// Returns the number of middleware, excluding the fallback.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Returns `true` if the list holds no middleware.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("middleware", &self.names())
            .field("fallback", &self.fallback_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::DefaultResponder;
    use crate::stages::RequestIdMiddleware;
    use fratily_core::{Body, Fault};

    fn request() -> Request {
        http::Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    #[test]
    fn test_builder_order() {
        let mut chain = MiddlewareChain::new()
            .with(Arc::new(DefaultResponder))
            .with_fallback(Arc::new(DefaultResponder));
        chain.prepend(Arc::new(RequestIdMiddleware::new()));

        assert_eq!(chain.names(), ["request_id", "default_responder"]);
        assert_eq!(chain.fallback_name(), Some("default_responder"));
        assert_eq!(chain.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_chain_without_fallback() {
        let chain = MiddlewareChain::new();
        assert!(chain.is_empty());

        let mut ctx = MiddlewareContext::new();
        let result = chain.handle(&mut ctx, request()).await;
        assert!(matches!(result, Err(Fault::ChainExhaustedWithNoFallback)));
    }

    #[tokio::test]
    async fn test_chain_is_reusable_across_requests() {
        let chain = MiddlewareChain::new().with_fallback(Arc::new(DefaultResponder));

        for _ in 0..3 {
            let mut ctx = MiddlewareContext::new();
            let response = chain.handle(&mut ctx, request()).await.unwrap();
            assert_eq!(response.status(), 200);
        }
    }
}
