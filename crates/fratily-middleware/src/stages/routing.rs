//! Routing middleware.
//!
//! Resolves the request's method and path against the [`Router`] and stores
//! the outcome on the request for the dispatch middleware further in:
//!
//! - [`MatchedRoute`] holds the matched route, and through it the action
//! - [`RouteParams`] holds the route parameters followed by query-string
//!   pairs whose names are not route parameters
//!
//! A path that matches no pattern faults with `NotFound` (or continues
//! unrouted in [`NotFoundMode::Continue`]); a path that matches with the
//! wrong method always faults with `MethodNotAllowed`.

use std::sync::Arc;

use fratily_core::{Fault, FaultResult, Params, Request, Response};
use fratily_router::{MatchedRoute, RouteMatch, RouteParams, Router};

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};

/// What routing does with a request no pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotFoundMode {
    /// Fault with `NotFound`.
    #[default]
    Fault,
    /// Pass the request on unrouted.
    Continue,
}

/// Middleware that resolves the route of each request.
#[derive(Debug, Clone)]
pub struct RoutingMiddleware {
    router: Arc<Router>,
    not_found: NotFoundMode,
}

impl RoutingMiddleware {
    /// Creates routing middleware over a router.
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            router,
            not_found: NotFoundMode::default(),
        }
    }

    /// Sets the not-found mode.
    #[must_use]
    pub fn not_found_mode(mut self, mode: NotFoundMode) -> Self {
        self.not_found = mode;
        self
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }
}

/// Appends query-string pairs whose names are not already parameters.
fn merge_query(params: &mut Params, query: Option<&str>) {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return;
    };
    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => {
            for (name, value) in pairs {
                params.push_absent(name, value);
            }
        }
        Err(error) => tracing::debug!(%error, "ignoring malformed query string"),
    }
}

impl Middleware for RoutingMiddleware {
    fn name(&self) -> &'static str {
        "routing"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        mut request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<Response>> {
        Box::pin(async move {
            let method = request.method().clone();
            let path = request.uri().path().to_string();

            match self.router.match_route(&method, &path) {
                RouteMatch::Found { route, mut params } => {
                    merge_query(&mut params, request.uri().query());
                    tracing::debug!(
                        route = route.name(),
                        method = %method,
                        path = %path,
                        "route matched"
                    );
                    ctx.set_route_name(route.name().to_string());
                    request.extensions_mut().insert(MatchedRoute(route));
                    request.extensions_mut().insert(RouteParams(params));
                    next.run(ctx, request).await
                }
                RouteMatch::MethodNotAllowed { allowed } => {
                    Err(Fault::method_not_allowed(method, path, allowed.methods()))
                }
                RouteMatch::NotFound => match self.not_found {
                    NotFoundMode::Fault => Err(Fault::not_found(method, path)),
                    NotFoundMode::Continue => {
                        tracing::debug!(method = %method, path = %path, "no route, continuing");
                        next.run(ctx, request).await
                    }
                },
            }
        })
    }
}
