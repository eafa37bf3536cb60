//! High-level router API.
//!
//! This module provides the [`Router`] built by a
//! [`RouteCollector`](crate::RouteCollector) and the [`RouteMatch`] it
//! produces for each request.

use std::collections::HashMap;
use std::sync::Arc;

use fratily_core::Params;
use http::Method;

use crate::method::MethodSet;
use crate::node::{parse_pattern, Node, PathMatch, SegmentKind};
use crate::route::Route;

/// Result of one routing attempt.
///
/// A path that matches a pattern but not the method is
/// [`MethodNotAllowed`](RouteMatch::MethodNotAllowed), never
/// [`NotFound`](RouteMatch::NotFound).
#[derive(Debug, Clone)]
pub enum RouteMatch {
    /// A route accepts the method and path.
    Found {
        /// The matched route.
        route: Arc<Route>,
        /// Parameters extracted from the path, in pattern order.
        params: Params,
    },
    /// No pattern matches the path.
    NotFound,
    /// Some pattern matches the path, none accepts the method.
    MethodNotAllowed {
        /// Methods the matching routes accept.
        allowed: MethodSet,
    },
}

impl RouteMatch {
    /// Returns `true` for [`RouteMatch::Found`].
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// A radix tree router.
///
/// Routes are matched in O(k) time where k is the number of path segments.
///
/// # Example
///
/// ```rust
/// use fratily_core::{Action, FaultResult};
/// use fratily_router::{MethodSet, RouteCollector, RouteData, RouteMatch};
/// use http::Method;
///
/// let show = Action::new("show", [], |_| async { FaultResult::Ok(()) });
///
/// let mut collector = RouteCollector::new();
/// collector
///     .add_route(Some("widgets.show"), "/widgets/{id}", MethodSet::GET, show, RouteData::new())
///     .unwrap();
/// let router = collector.build();
///
/// match router.match_route(&Method::GET, "/widgets/5") {
///     RouteMatch::Found { route, params } => {
///         assert_eq!(route.name(), "widgets.show");
///         assert_eq!(params.get("id"), Some("5"));
///     }
///     other => panic!("unexpected {other:?}"),
/// }
///
/// assert!(matches!(
///     router.match_route(&Method::POST, "/widgets/5"),
///     RouteMatch::MethodNotAllowed { allowed } if allowed == MethodSet::GET
/// ));
/// assert!(matches!(router.match_route(&Method::GET, "/gadgets/5"), RouteMatch::NotFound));
/// ```
///
/// # Route Priority
///
/// When multiple routes could match, the router uses the following priority:
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/{id}`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
///
/// A lower-priority route is tried when a higher-priority one matches the
/// path but rejects the method.
#[derive(Debug, Clone, Default)]
pub struct Router {
    root: Node,
    routes: Vec<Arc<Route>>,
    names: HashMap<String, usize>,
}

impl Router {
    pub(crate) fn from_parts(
        root: Node,
        routes: Vec<Arc<Route>>,
        names: HashMap<String, usize>,
    ) -> Self {
        Self { root, routes, names }
    }

    /// Matches a method and path against the registered routes.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> RouteMatch {
        match self.root.match_path(method, path) {
            PathMatch::Found { route, params } => match self.routes.get(route) {
                Some(route) => RouteMatch::Found {
                    route: Arc::clone(route),
                    params,
                },
                None => RouteMatch::NotFound,
            },
            PathMatch::MethodNotAllowed(allowed) => RouteMatch::MethodNotAllowed { allowed },
            PathMatch::NotFound => RouteMatch::NotFound,
        }
    }

    /// Returns the route registered under `name`.
    #[must_use]
    pub fn route(&self, name: &str) -> Option<&Arc<Route>> {
        self.names.get(name).and_then(|&i| self.routes.get(i))
    }

    /// Builds the path of a named route.
    ///
    /// Returns `None` if no route has that name or a parameter the pattern
    /// needs is missing from `params`.
    ///
    /// ```rust
    /// use fratily_core::{Action, FaultResult, Params};
    /// use fratily_router::{MethodSet, RouteCollector, RouteData};
    ///
    /// let action = Action::new("file", [], |_| async { FaultResult::Ok(()) });
    /// let mut collector = RouteCollector::new();
    /// collector
    ///     .add_route(Some("file"), "/orgs/{org}/files/*path", MethodSet::GET, action, RouteData::new())
    ///     .unwrap();
    /// let router = collector.build();
    ///
    /// let mut params = Params::new();
    /// params.push("org", "acme");
    /// params.push("path", "docs/readme.md");
    /// assert_eq!(router.path_for("file", &params).as_deref(), Some("/orgs/acme/files/docs/readme.md"));
    /// ```
    #[must_use]
    pub fn path_for(&self, name: &str, params: &Params) -> Option<String> {
        let route = self.route(name)?;
        let segments = parse_pattern(route.pattern()).ok()?;
        if segments.is_empty() {
            return Some("/".to_string());
        }

        let mut path = String::new();
        for (segment, kind) in &segments {
            path.push('/');
            match kind {
                SegmentKind::Static => path.push_str(segment),
                SegmentKind::Param(param) | SegmentKind::Wildcard(param) => {
                    path.push_str(params.get(param)?);
                }
            }
        }
        Some(path)
    }

    /// Iterates over the routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
