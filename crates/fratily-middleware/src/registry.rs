//! Named middleware registry.
//!
//! Routes refer to their `middleware.before` and `middleware.after` entries
//! by name. The registry maps those names to shared middleware instances so
//! the dispatch middleware can build each route's stack per request.

use std::collections::HashMap;
use std::sync::Arc;

use fratily_core::{Fault, FaultResult};

use crate::middleware::{BoxedMiddleware, Middleware};

/// Registry of middleware available to routes by name.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use fratily_middleware::{DefaultResponder, MiddlewareRegistry};
///
/// let mut registry = MiddlewareRegistry::new();
/// registry.register("respond", Arc::new(DefaultResponder));
///
/// assert!(registry.contains("respond"));
/// assert!(registry.resolve(["respond"]).is_ok());
/// assert!(registry.resolve(["missing"]).is_err());
/// ```
#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    entries: HashMap<String, BoxedMiddleware>,
}

impl MiddlewareRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a middleware under a name, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, middleware: Arc<dyn Middleware>) {
        let name = name.into();
        if self.entries.insert(name.clone(), middleware).is_some() {
            tracing::warn!(middleware = %name, "replacing registered middleware");
        }
    }

    /// Returns the middleware registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoxedMiddleware> {
        self.entries.get(name)
    }

    /// Returns `true` if a middleware is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Resolves a list of names into middleware, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::InvalidRoute`] naming the first unknown middleware.
    pub fn resolve<'n>(
        &self,
        names: impl IntoIterator<Item = &'n str>,
    ) -> FaultResult<Vec<BoxedMiddleware>> {
        names
            .into_iter()
            .map(|name| {
                self.get(name).cloned().ok_or_else(|| {
                    Fault::invalid_route(format!("unknown middleware '{name}'"))
                })
            })
            .collect()
    }

    /// Returns the number of registered middleware.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("MiddlewareRegistry")
            .field("entries", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{DefaultResponder, RequestIdMiddleware};

    #[test]
    fn test_resolve_keeps_order() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("id", Arc::new(RequestIdMiddleware::new()));
        registry.register("respond", Arc::new(DefaultResponder));

        let resolved = registry.resolve(["respond", "id"]).unwrap();
        let names: Vec<_> = resolved.iter().map(|m| m.name()).collect();
        assert_eq!(names, ["default_responder", "request_id"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unknown_name_is_invalid_route() {
        let registry = MiddlewareRegistry::new();
        assert!(registry.is_empty());

        let err = registry.resolve(["auth"]).err().unwrap();
        assert!(matches!(err, Fault::InvalidRoute { .. }));
        assert!(err.to_string().contains("auth"));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("x", Arc::new(DefaultResponder));
        registry.register("x", Arc::new(RequestIdMiddleware::new()));

        assert_eq!(registry.get("x").unwrap().name(), "request_id");
        assert_eq!(registry.len(), 1);
    }
}
