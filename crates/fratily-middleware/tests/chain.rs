//! Chain execution tests.
//!
//! These tests drive whole chains through the public API:
//!
//! 1. Onion ordering in both directions
//! 2. Fallback entered at most once per request
//! 3. Empty chain without a fallback
//! 4. Independent chains running concurrently keep their own cursors

use std::sync::Arc;

use fratily_core::{Body, Fault, FaultResult, Request, Response};
use fratily_middleware::{
    BoxFuture, FnMiddleware, Middleware, MiddlewareChain, MiddlewareContext, Next,
};
use proptest::prelude::*;

/// Logs `before` and `after` entries into the context, yielding to the
/// scheduler around the call to the rest of the chain.
struct Logging {
    name: &'static str,
}

impl Middleware for Logging {
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<Response>> {
        Box::pin(async move {
            log(ctx, format!("{}.before", self.name));
            tokio::task::yield_now().await;
            let response = next.run(ctx, request).await?;
            tokio::task::yield_now().await;
            log(ctx, format!("{}.after", self.name));
            Ok(response)
        })
    }
}

/// Fallback that logs itself and answers `200 OK`.
struct Terminal;

impl Middleware for Terminal {
    fn name(&self) -> &'static str {
        "F"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        _request: Request,
        _next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<Response>> {
        Box::pin(async move {
            log(ctx, "F".to_string());
            Ok(Response::new(Body::from("done")))
        })
    }
}

fn log(ctx: &mut MiddlewareContext, entry: String) {
    let mut entries: Vec<String> = ctx.remove_extension().unwrap_or_default();
    entries.push(entry);
    ctx.set_extension(entries);
}

fn entries(ctx: &MiddlewareContext) -> Vec<String> {
    ctx.get_extension::<Vec<String>>().cloned().unwrap_or_default()
}

fn request() -> Request {
    http::Request::builder().uri("/").body(Body::empty()).unwrap()
}

/// Builds a fresh chain of logging middleware from a list of names.
fn build(names: &[&'static str]) -> MiddlewareChain {
    let mut chain = MiddlewareChain::new().with_fallback(Arc::new(Terminal));
    for name in names {
        chain.push(Arc::new(Logging { name: *name }));
    }
    chain
}

fn expected(names: &[&'static str]) -> Vec<String> {
    let mut order: Vec<String> = names.iter().map(|n| format!("{n}.before")).collect();
    order.push("F".to_string());
    order.extend(names.iter().rev().map(|n| format!("{n}.after")));
    order
}

#[tokio::test]
async fn test_onion_ordering() {
    let chain = build(&["A", "B", "C"]);
    let mut ctx = MiddlewareContext::new();

    let response = chain.handle(&mut ctx, request()).await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        entries(&ctx),
        [
            "A.before", "B.before", "C.before", "F", "C.after", "B.after", "A.after",
        ]
    );
}

#[tokio::test]
async fn test_short_circuit_skips_inner_middleware() {
    let mut chain = build(&["A"]);
    chain.push(Arc::new(FnMiddleware::new("stop", |_ctx, _request, _next| {
        Box::pin(async { Ok(Response::new(Body::from("stopped"))) })
    })));
    chain.push(Arc::new(Logging { name: "C" }));
    let mut ctx = MiddlewareContext::new();

    let response = chain.handle(&mut ctx, request()).await.unwrap();

    assert_eq!(&response.body().contents().unwrap()[..], b"stopped");
    assert_eq!(entries(&ctx), ["A.before", "A.after"]);
}

#[tokio::test]
async fn test_fallback_entered_twice() {
    let reentrant = FnMiddleware::new("reentrant", |ctx, request, next| {
        Box::pin(async move { next.run(ctx, request).await })
    });
    let chain = MiddlewareChain::new()
        .with(Arc::new(Logging { name: "A" }))
        .with_fallback(Arc::new(reentrant));
    let mut ctx = MiddlewareContext::new();

    let err = chain.handle(&mut ctx, request()).await.unwrap_err();

    assert!(matches!(err, Fault::FallbackInvokedTwice));
    assert!(!err.is_recoverable());
    assert_eq!(entries(&ctx), ["A.before"]);
}

#[tokio::test]
async fn test_empty_chain_without_fallback() {
    let chain = MiddlewareChain::new();
    let mut ctx = MiddlewareContext::new();

    let err = chain.handle(&mut ctx, request()).await.unwrap_err();
    assert!(matches!(err, Fault::ChainExhaustedWithNoFallback));
}

#[tokio::test]
async fn test_middleware_only_chain_without_fallback() {
    let chain = MiddlewareChain::new().with(Arc::new(Logging { name: "A" }));
    let mut ctx = MiddlewareContext::new();

    let err = chain.handle(&mut ctx, request()).await.unwrap_err();
    assert!(matches!(err, Fault::ChainExhaustedWithNoFallback));
}

#[tokio::test]
async fn test_shared_chain_handles_concurrent_requests() {
    let chain = Arc::new(build(&["A", "B"]));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let chain = Arc::clone(&chain);
            tokio::spawn(async move {
                let mut ctx = MiddlewareContext::new();
                chain.handle(&mut ctx, request()).await.map(|_| entries(&ctx))
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), expected(&["A", "B"]));
    }
}

const NAMES: [&str; 5] = ["auth", "csrf", "session", "cache", "gzip"];

proptest! {
    #[test]
    fn prop_independent_chains_do_not_interfere(
        left in proptest::sample::subsequence(NAMES.to_vec(), 0..=NAMES.len()),
        right in proptest::sample::subsequence(NAMES.to_vec(), 0..=NAMES.len()),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (left_log, right_log) = runtime.block_on(async {
            let left_chain = build(&left);
            let right_chain = build(&right);
            let mut left_ctx = MiddlewareContext::new();
            let mut right_ctx = MiddlewareContext::new();

            let (a, b) = tokio::join!(
                left_chain.handle(&mut left_ctx, request()),
                right_chain.handle(&mut right_ctx, request()),
            );
            a.unwrap();
            b.unwrap();
            (entries(&left_ctx), entries(&right_ctx))
        });

        prop_assert_eq!(left_log, expected(&left));
        prop_assert_eq!(right_log, expected(&right));
    }
}
