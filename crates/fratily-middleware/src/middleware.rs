//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait and the [`Next`]
//! continuation middleware use to call the rest of the chain.
//!
//! # The onion
//!
//! Middleware run in list order on the way in. Each one wraps the call to
//! the next, so the code after `next.run(..).await` runs in reverse order on
//! the way out. When the list is exhausted the fallback handler runs, at
//! most once per request.
//!
//! # Example
//!
//! ```
//! use fratily_middleware::{BoxFuture, Middleware, MiddlewareContext, Next};
//! use fratily_core::{FaultResult, Request, Response};
//!
//! struct Logging;
//!
//! impl Middleware for Logging {
//!     fn name(&self) -> &'static str {
//!         "logging"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut MiddlewareContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, FaultResult<Response>> {
//!         Box::pin(async move {
//!             tracing::debug!(request_id = %ctx.request_id(), "inbound");
//!             let response = next.run(ctx, request).await?;
//!             tracing::debug!(status = %response.status(), "outbound");
//!             Ok(response)
//!         })
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fratily_core::{Fault, FaultResult, Request, Response};

pub use fratily_core::BoxFuture;

use crate::context::MiddlewareContext;

/// A shared, type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The core middleware trait.
///
/// Middleware receives a mutable context, the incoming request, and a
/// [`Next`] continuation for the rest of the chain.
///
/// # Invariants
///
/// - Middleware call `next.run()` at most once; not calling it
///   short-circuits the chain
/// - Middleware SHOULD NOT swallow faults returned by downstream middleware
/// - Middleware hold no per-request state in `self`; instances are shared
///   by concurrent requests
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware.
    ///
    /// This name is used for logging and debugging.
    fn name(&self) -> &'static str;

    /// Process the request through this middleware.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The mutable middleware context
    /// * `request` - The incoming HTTP request
    /// * `next` - Continuation invoking the rest of the chain
    ///
    /// # Returns
    ///
    /// The HTTP response (either from downstream or generated here), or the
    /// fault that stopped the request.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<Response>>;
}

/// Records whether a request has entered its fallback handler.
///
/// One guard exists per request; it is never shared between requests.
#[derive(Debug, Default)]
pub struct FallbackGuard(AtomicBool);

impl FallbackGuard {
    /// Creates a guard for a new request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the fallback as entered. Returns `true` if it already was.
    fn enter(&self) -> bool {
        self.0.swap(true, Ordering::AcqRel)
    }

    /// Returns `true` once the fallback has been entered.
    #[must_use]
    pub fn entered(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// What runs once the middleware list is exhausted.
enum Terminal<'a> {
    /// The chain's fallback handler.
    Fallback {
        handler: Option<&'a dyn Middleware>,
        guard: &'a FallbackGuard,
    },
    /// Continue with an enclosing chain.
    Resume(Box<Next<'a>>),
}

/// Continuation invoking the rest of the chain.
///
/// A `Next` is a request-local cursor over an immutable middleware list.
/// [`Next::run`] consumes it, so a middleware cannot call the rest of the
/// chain twice.
pub struct Next<'a> {
    remaining: &'a [BoxedMiddleware],
    terminal: Terminal<'a>,
}

impl<'a> Next<'a> {
    /// Creates a cursor at the start of `middleware`, ending in `fallback`.
    #[must_use]
    pub fn new(
        middleware: &'a [BoxedMiddleware],
        fallback: Option<&'a dyn Middleware>,
        guard: &'a FallbackGuard,
    ) -> Self {
        Self {
            remaining: middleware,
            terminal: Terminal::Fallback {
                handler: fallback,
                guard,
            },
        }
    }

    /// Creates a cursor over an inner list that continues with `outer` once
    /// the inner list is exhausted.
    #[must_use]
    pub fn nested(middleware: &'a [BoxedMiddleware], outer: Next<'a>) -> Self {
        Self {
            remaining: middleware,
            terminal: Terminal::Resume(Box::new(outer)),
        }
    }

    /// Returns the number of middleware left before the terminal step.
    #[must_use]
    pub fn remaining(&self) -> usize {
        match &self.terminal {
            Terminal::Fallback { .. } => self.remaining.len(),
            Terminal::Resume(outer) => self.remaining.len() + outer.remaining(),
        }
    }

    /// Invokes the next middleware, or the fallback when none remain.
    ///
    /// # Errors
    ///
    /// - [`Fault::FallbackInvokedTwice`] if the fallback was already entered
    ///   for this request
    /// - [`Fault::ChainExhaustedWithNoFallback`] if the list is exhausted
    ///   and there is no fallback
    /// - any fault raised downstream
    pub fn run(
        self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
    ) -> BoxFuture<'a, FaultResult<Response>> {
        let Self {
            remaining,
            terminal,
        } = self;

        if let Some((middleware, rest)) = remaining.split_first() {
            let next = Self {
                remaining: rest,
                terminal,
            };
            return middleware.process(ctx, request, next);
        }

        match terminal {
            Terminal::Resume(outer) => outer.run(ctx, request),
            Terminal::Fallback { handler, guard } => {
                if guard.enter() {
                    tracing::error!("fallback handler entered twice");
                    return Box::pin(async { Err(Fault::FallbackInvokedTwice) });
                }
                match handler {
                    Some(handler) => {
                        let exhausted = Self::new(&[], Some(handler), guard);
                        handler.process(ctx, request, exhausted)
                    }
                    None => Box::pin(async { Err(Fault::ChainExhaustedWithNoFallback) }),
                }
            }
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.remaining())
            .finish_non_exhaustive()
    }
}

/// A middleware that can be created from a function.
///
/// This allows defining simple middleware without implementing the trait
/// directly.
///
/// # Example
///
/// ```
/// use fratily_middleware::FnMiddleware;
///
/// let timing = FnMiddleware::new("timing", |ctx, request, next| {
///     Box::pin(async move {
///         let response = next.run(ctx, request).await?;
///         tracing::debug!(elapsed = ?ctx.elapsed(), "request finished");
///         Ok(response)
///     })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(
            &'a mut MiddlewareContext,
            Request,
            Next<'a>,
        ) -> BoxFuture<'a, FaultResult<Response>>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(
            &'a mut MiddlewareContext,
            Request,
            Next<'a>,
        ) -> BoxFuture<'a, FaultResult<Response>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<Response>> {
        (self.func)(ctx, request, next)
    }
}
