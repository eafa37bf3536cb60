//! Dispatch middleware.
//!
//! Reads the route stored by [`RoutingMiddleware`](super::RoutingMiddleware)
//! and runs the route's own stack in front of the rest of the chain:
//!
//! ```text
//! app before-action → route middleware.before → action → route middleware.after → app after-action
//! ```
//!
//! Each list is inserted exactly once. The stack is built per request from
//! shared middleware instances, and once it is exhausted the outer chain
//! resumes with the next middleware or the fallback.

use std::sync::Arc;

use fratily_core::{Container, FaultResult, Request, Response};
use fratily_router::RoutedRequest;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, BoxedMiddleware, Middleware, Next};
use crate::registry::MiddlewareRegistry;
use crate::stages::ActionMiddleware;

/// Middleware that invokes the matched route's action.
#[derive(Clone)]
pub struct DispatchMiddleware {
    container: Arc<Container>,
    registry: Arc<MiddlewareRegistry>,
    before_action: Vec<BoxedMiddleware>,
    after_action: Vec<BoxedMiddleware>,
}

impl DispatchMiddleware {
    /// Creates dispatch middleware resolving route middleware names through
    /// `registry` and action arguments through `container`.
    #[must_use]
    pub fn new(container: Arc<Container>, registry: Arc<MiddlewareRegistry>) -> Self {
        Self {
            container,
            registry,
            before_action: Vec::new(),
            after_action: Vec::new(),
        }
    }

    /// Sets the application middleware run before every action.
    #[must_use]
    pub fn before_action(mut self, middleware: Vec<BoxedMiddleware>) -> Self {
        self.before_action = middleware;
        self
    }

    /// Sets the application middleware run after every action.
    #[must_use]
    pub fn after_action(mut self, middleware: Vec<BoxedMiddleware>) -> Self {
        self.after_action = middleware;
        self
    }

    /// Returns the service container.
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }
}

impl Middleware for DispatchMiddleware {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<Response>> {
        Box::pin(async move {
            let Some(route) = request.matched_route().cloned() else {
                return next.run(ctx, request).await;
            };
            let params = request.route_params().cloned().unwrap_or_default();
            let data = route.data();

            let before = self
                .registry
                .resolve(data.before_middleware().iter().map(String::as_str))?;
            let after = self
                .registry
                .resolve(data.after_middleware().iter().map(String::as_str))?;

            let mut stack: Vec<BoxedMiddleware> = Vec::with_capacity(
                self.before_action.len() + before.len() + 1 + after.len() + self.after_action.len(),
            );
            stack.extend(self.before_action.iter().cloned());
            stack.extend(before);
            stack.push(Arc::new(ActionMiddleware::new(
                route.action().clone(),
                params,
                Arc::clone(&self.container),
            )));
            stack.extend(after);
            stack.extend(self.after_action.iter().cloned());

            tracing::debug!(
                route = route.name(),
                action = route.action().name(),
                stack = stack.len(),
                "dispatching"
            );
            Next::nested(&stack, next).run(ctx, request).await
        })
    }
}

impl std::fmt::Debug for DispatchMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |list: &[BoxedMiddleware]| list.iter().map(|m| m.name()).collect::<Vec<_>>();
        f.debug_struct("DispatchMiddleware")
            .field("before_action", &names(&self.before_action))
            .field("after_action", &names(&self.after_action))
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
