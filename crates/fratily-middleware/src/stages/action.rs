//! Action middleware.
//!
//! Binds a matched action to one request. Arguments are bound before the
//! rest of the chain runs, so a missing argument stops the request before
//! any downstream middleware sees it. The rest of the chain then produces
//! the in-flight response, the action is called, and its return value is
//! coerced onto that response.

use std::sync::Arc;

use fratily_core::{Action, Container, FaultResult, Params, Request, Response};

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};

/// Middleware invoking one action for one request.
///
/// Built by the dispatch middleware for every routed request and dropped
/// once the response is produced.
#[derive(Debug)]
pub struct ActionMiddleware {
    action: Action,
    params: Params,
    container: Arc<Container>,
}

impl ActionMiddleware {
    /// Creates the middleware for a matched action.
    #[must_use]
    pub fn new(action: Action, params: Params, container: Arc<Container>) -> Self {
        Self {
            action,
            params,
            container,
        }
    }

    /// Returns the action.
    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }
}

impl Middleware for ActionMiddleware {
    fn name(&self) -> &'static str {
        "action"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<Response>> {
        Box::pin(async move {
            let args = self.action.plan().bind(&request, &self.params, &self.container)?;

            let response = next.run(ctx, request).await?;

            tracing::debug!(action = self.action.name(), "invoking action");
            let value = self.action.call(args).await?;
            value.coerce(self.action.name(), response)
        })
    }
}
