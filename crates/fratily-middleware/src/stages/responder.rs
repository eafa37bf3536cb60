//! The default fallback handler.

use fratily_core::{Body, FaultResult, Request, Response};

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};

/// Fallback that answers with an empty `200 OK`.
///
/// The response it produces is the in-flight response the action's return
/// value is written onto.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResponder;

impl Middleware for DefaultResponder {
    fn name(&self) -> &'static str {
        "default_responder"
    }

    fn process<'a>(
        &'a self,
        _ctx: &'a mut MiddlewareContext,
        _request: Request,
        _next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<Response>> {
        Box::pin(async { Ok(Response::new(Body::empty())) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FallbackGuard;
    use http::StatusCode;

    #[tokio::test]
    async fn test_answers_empty_ok() {
        let guard = FallbackGuard::new();
        let mut ctx = MiddlewareContext::new();
        let request = http::Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = DefaultResponder
            .process(&mut ctx, request, Next::new(&[], None, &guard))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().len(), Some(0));
        assert!(response.body().is_writable());
    }
}
