//! # Fratily Middleware
//!
//! The middleware chain at the center of the Fratily kernel.
//!
//! A [`MiddlewareChain`] is an ordered list of [`Middleware`] around one
//! fallback handler. Each middleware receives the request and a [`Next`]
//! continuation; code before `next.run(..)` runs in list order on the way
//! in, code after it runs in reverse order on the way out:
//!
//! ```text
//! A.before → B.before → C.before → fallback → C.after → B.after → A.after
//! ```
//!
//! ## Key Properties
//!
//! - **Immutable lists**: a chain is never mutated while requests run
//! - **Request-local cursor**: every request walks the list with its own [`Next`]
//! - **Single fallback**: the fallback runs at most once per request; a second
//!   entry is [`Fault::FallbackInvokedTwice`](fratily_core::Fault::FallbackInvokedTwice)
//!
//! ## Built-in middleware
//!
//! | Middleware | Purpose |
//! |---|---|
//! | [`RequestIdMiddleware`] | Assign a UUID v7 request ID and echo it on the response |
//! | [`RoutingMiddleware`] | Resolve the route and store it on the request |
//! | [`DispatchMiddleware`] | Run the route's middleware stack around its action |
//! | [`ActionMiddleware`] | Bind arguments, invoke the action, coerce its result |
//! | [`DefaultResponder`] | Fallback answering with an empty `200 OK` |

#![doc(html_root_url = "https://docs.rs/fratily-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod context;
pub mod middleware;
pub mod registry;
pub mod stages;

pub use chain::MiddlewareChain;
pub use context::MiddlewareContext;
pub use middleware::{BoxFuture, BoxedMiddleware, FallbackGuard, FnMiddleware, Middleware, Next};
pub use registry::MiddlewareRegistry;
pub use stages::{
    ActionMiddleware, DefaultResponder, DispatchMiddleware, NotFoundMode, RequestIdMiddleware,
    RoutingMiddleware, REQUEST_ID_HEADER,
};
