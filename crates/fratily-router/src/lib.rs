//! Radix tree router for Fratily.
//!
//! Routes are registered on a [`RouteCollector`] at startup and frozen into
//! a [`Router`]. Matching a method and path yields a [`RouteMatch`]: the
//! route and its parameters, "not found", or "method not allowed" with the
//! set of methods the path does accept.
//!
//! # Features
//!
//! - **Radix Tree Matching**: O(k) path lookup vs O(n) linear scan
//! - **Path Parameters**: Extract named parameters from paths (`/users/{id}`)
//! - **Wildcards**: Catch-all routes (`/files/*path`)
//! - **Method Sets**: A route accepts a set of methods; a path match with
//!   the wrong method reports the allowed set
//! - **Reverse Routing**: Rebuild a path from a route name and parameters
//!
//! # Architecture
//!
//! The router uses a radix tree where each node represents a path segment:
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐        "*path"
//!        │           │
//!    [#0 GET]     "{id}"
//!    [#1 POST]      │
//!               [#2 GET|PUT]
//! ```
//!
//! Leaves hold one endpoint per route: the route's method set and its index
//! in the route table.

mod attributes;
mod collector;
mod method;
mod node;
mod route;
mod router;

pub use attributes::{MatchedRoute, RouteParams, RoutedRequest};
pub use collector::RouteCollector;
pub use fratily_core::Params;
pub use method::MethodSet;
pub use node::{Endpoint, Node, SegmentKind};
pub use route::{Route, RouteData};
pub use router::{RouteMatch, Router};
