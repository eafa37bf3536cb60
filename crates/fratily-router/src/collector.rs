//! Route registration.

use std::collections::HashMap;
use std::sync::Arc;

use fratily_core::{Action, Fault, FaultResult};
use uuid::Uuid;

use crate::method::MethodSet;
use crate::node::Node;
use crate::route::{Route, RouteData};
use crate::router::Router;

/// Collects routes at startup and builds the [`Router`].
///
/// Every route is validated when it is added, so a broken definition fails
/// at boot rather than on the first request that reaches it.
///
/// # Example
///
/// ```rust
/// use fratily_core::{Action, FaultResult};
/// use fratily_router::{MethodSet, RouteCollector, RouteData};
///
/// let list = Action::new("list", [], |_| async { FaultResult::Ok("[]") });
///
/// let mut collector = RouteCollector::new();
/// collector
///     .add_route(Some("widgets.list"), "/widgets", MethodSet::GET, list, RouteData::new())
///     .unwrap();
///
/// let router = collector.build();
/// assert_eq!(router.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RouteCollector {
    root: Node,
    routes: Vec<Arc<Route>>,
    names: HashMap<String, usize>,
}

impl RouteCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route.
    ///
    /// When `name` is `None` a unique name is generated from the pattern.
    /// Returns the name the route was registered under.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::InvalidRoute`] when:
    /// - the pattern is empty or does not start with `/`
    /// - the pattern has malformed parameters or wildcards
    /// - the name is empty or already taken
    /// - the method set is empty
    pub fn add_route(
        &mut self,
        name: Option<&str>,
        pattern: &str,
        methods: MethodSet,
        action: Action,
        data: RouteData,
    ) -> FaultResult<String> {
        if pattern.is_empty() || !pattern.starts_with('/') {
            return Err(Fault::invalid_route(format!(
                "path pattern `{pattern}` must start with `/`"
            )));
        }
        if methods.is_empty() {
            return Err(Fault::invalid_route(format!(
                "route `{pattern}` accepts no methods"
            )));
        }

        let name = match name {
            Some("") => {
                return Err(Fault::invalid_route(format!(
                    "route `{pattern}` has an empty name"
                )))
            }
            Some(name) if self.names.contains_key(name) => {
                return Err(Fault::invalid_route(format!(
                    "route name `{name}` is already registered"
                )))
            }
            Some(name) => name.to_string(),
            None => self.generate_name(pattern),
        };

        let index = self.routes.len();
        self.root.insert(pattern, methods, index)?;

        tracing::debug!(route = %name, pattern, methods = %methods, "route registered");
        self.routes.push(Arc::new(Route::new(
            name.clone(),
            pattern.to_string(),
            methods,
            action,
            data,
        )));
        self.names.insert(name.clone(), index);
        Ok(name)
    }

    fn generate_name(&self, pattern: &str) -> String {
        let stem: String = pattern
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        loop {
            let tag = Uuid::now_v7().simple().to_string();
            let name = format!("route{stem}_{}", &tag[tag.len() - 8..]);
            if !self.names.contains_key(&name) {
                return name;
            }
        }
    }

    /// Returns `true` if a route is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Iterates over the registered routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(AsRef::as_ref)
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Freezes the collected routes into a router.
    #[must_use]
    pub fn build(self) -> Router {
        Router::from_parts(self.root, self.routes, self.names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action() -> Action {
        Action::new("noop", [], |_| async { FaultResult::Ok(()) })
    }

    fn add(collector: &mut RouteCollector, name: Option<&str>, pattern: &str) -> FaultResult<String> {
        collector.add_route(name, pattern, MethodSet::GET, action(), RouteData::new())
    }

    #[test]
    fn test_rejects_bad_patterns() {
        let mut collector = RouteCollector::new();
        for pattern in ["", "users", "/files/*rest/more"] {
            let err = add(&mut collector, None, pattern).unwrap_err();
            assert!(matches!(err, Fault::InvalidRoute { .. }), "{pattern}");
        }
        assert!(collector.is_empty());
    }

    #[test]
    fn test_rejects_duplicate_and_empty_names() {
        let mut collector = RouteCollector::new();
        add(&mut collector, Some("home"), "/").unwrap();

        let err = add(&mut collector, Some("home"), "/other").unwrap_err();
        assert!(err.to_string().contains("already registered"));

        let err = add(&mut collector, Some(""), "/other").unwrap_err();
        assert!(err.to_string().contains("empty name"));
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_rejects_empty_method_set() {
        let mut collector = RouteCollector::new();
        let err = collector
            .add_route(None, "/", MethodSet::EMPTY, action(), RouteData::new())
            .unwrap_err();
        assert!(err.to_string().contains("no methods"));
    }

    #[test]
    fn test_generated_names_are_unique() {
        let mut collector = RouteCollector::new();
        let first = add(&mut collector, None, "/users/{id}").unwrap();
        let second = add(&mut collector, None, "/users/{id}").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("route_users__id_"));
        assert!(collector.contains(&first));
        assert!(collector.contains(&second));
    }
}
