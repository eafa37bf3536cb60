//! Request ID assignment.
//!
//! Every request gets a [`RequestId`] before anything else runs: the
//! `X-Request-ID` header's value when the middleware trusts incoming IDs
//! and the value is a UUID, otherwise the ID the [`MiddlewareContext`] was
//! created with. The kernel creates that context with the ID its request
//! listeners saw; a bare context carries a fresh UUID v7. The ID is echoed
//! on the response.

use fratily_core::{FaultResult, Request, RequestId, Response};
use http::HeaderValue;

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};

/// Header carrying the request ID in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assigns request IDs. Always the first middleware of an application.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdMiddleware {
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Always generates a fresh ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses a valid incoming `X-Request-ID`, for deployments behind a
    /// proxy that assigns them.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    /// Returns the incoming ID this middleware would accept for `request`.
    #[must_use]
    pub fn incoming(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }
        let value = request.headers().get(REQUEST_ID_HEADER)?;
        RequestId::parse(value.to_str().ok()?)
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<Response>> {
        Box::pin(async move {
            let request_id = self.incoming(&request).unwrap_or_else(|| ctx.request_id());
            ctx.set_request_id(request_id);

            let mut response = next.run(ctx, request).await?;
            if let Ok(value) = HeaderValue::try_from(request_id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}
