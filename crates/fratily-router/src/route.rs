//! Registered routes.

use std::collections::BTreeMap;

use fratily_core::Action;

use crate::method::MethodSet;

/// Auxiliary data attached to a route.
///
/// Besides free-form attributes, the data names the middleware scoped to
/// the route: `before` runs ahead of the action, `after` runs behind it.
/// Middleware are referenced by the name they were registered under on the
/// application.
///
/// # Example
///
/// ```rust
/// use fratily_router::RouteData;
///
/// let data = RouteData::new()
///     .before("auth")
///     .after("etag")
///     .with("cache", "public");
///
/// assert_eq!(data.before_middleware(), ["auth"]);
/// assert_eq!(data.after_middleware(), ["etag"]);
/// assert_eq!(data.get("cache"), Some("public"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteData {
    before: Vec<String>,
    after: Vec<String>,
    attributes: BTreeMap<String, String>,
}

impl RouteData {
    /// Creates empty route data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a middleware that runs before the action.
    #[must_use]
    pub fn before(mut self, middleware: impl Into<String>) -> Self {
        self.before.push(middleware.into());
        self
    }

    /// Adds a middleware that runs after the action.
    #[must_use]
    pub fn after(mut self, middleware: impl Into<String>) -> Self {
        self.after.push(middleware.into());
        self
    }

    /// Sets a free-form attribute.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Names of the middleware that run before the action.
    #[must_use]
    pub fn before_middleware(&self) -> &[String] {
        &self.before
    }

    /// Names of the middleware that run after the action.
    #[must_use]
    pub fn after_middleware(&self) -> &[String] {
        &self.after
    }

    /// Returns a free-form attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Iterates over every middleware name the route references.
    pub fn middleware_names(&self) -> impl Iterator<Item = &str> {
        self.before
            .iter()
            .chain(self.after.iter())
            .map(String::as_str)
    }
}

/// A route registered at startup.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    pattern: String,
    methods: MethodSet,
    action: Action,
    data: RouteData,
}

impl Route {
    pub(crate) fn new(
        name: String,
        pattern: String,
        methods: MethodSet,
        action: Action,
        data: RouteData,
    ) -> Self {
        Self {
            name,
            pattern,
            methods,
            action,
            data,
        }
    }

    /// The unique route name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path pattern, e.g. `/users/{id}`.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Methods the route accepts.
    #[must_use]
    pub fn methods(&self) -> MethodSet {
        self.methods
    }

    /// The action the route dispatches to.
    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Auxiliary data.
    #[must_use]
    pub fn data(&self) -> &RouteData {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_middleware_names_keep_order() {
        let data = RouteData::new().before("a").before("b").after("c");
        let names: Vec<&str> = data.middleware_names().collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn test_attributes_overwrite() {
        let data = RouteData::new().with("k", "1").with("k", "2");
        assert_eq!(data.get("k"), Some("2"));
        assert_eq!(data.get("missing"), None);
    }
}
