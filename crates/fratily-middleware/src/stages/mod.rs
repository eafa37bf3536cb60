//! Built-in middleware.
//!
//! A kernel chain is normally assembled as:
//!
//! ```text
//! Request → RequestId → (application middleware) → Routing → Dispatch → DefaultResponder
//!                                                               ↓
//!                                 before-action → route before → Action → route after → after-action
//! ```
//!
//! - [`request_id`] - Assign and echo the request ID
//! - [`routing`] - Resolve the route and store it on the request
//! - [`dispatch`] - Run the matched route's middleware stack
//! - [`action`] - Bind, invoke and coerce one action
//! - [`responder`] - The default fallback handler

pub mod action;
pub mod dispatch;
pub mod request_id;
pub mod responder;
pub mod routing;

pub use action::ActionMiddleware;
pub use dispatch::DispatchMiddleware;
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
pub use responder::DefaultResponder;
pub use routing::{NotFoundMode, RoutingMiddleware};
