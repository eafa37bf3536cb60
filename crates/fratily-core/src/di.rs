//! Service locator.
//!
//! The [`Container`] is filled at application startup and is read-only while
//! requests are handled. It holds three kinds of entries:
//!
//! - **services** keyed by their type, used to bind action parameters that
//!   declare a service type
//! - **named values**, including the `action.params.` namespace consulted
//!   when an action parameter is bound by name
//! - **controllers** keyed by the name used in `"controller:method"` action
//!   strings
//!
//! # Example
//!
//! ```rust
//! use fratily_core::Container;
//! use std::sync::Arc;
//!
//! struct Database {
//!     dsn: String,
//! }
//!
//! let mut container = Container::new();
//! container.register(Arc::new(Database { dsn: "postgres://localhost/app".into() }));
//! container.set_action_param("locale", "en".to_string());
//!
//! let db: Arc<Database> = container.resolve().unwrap();
//! assert_eq!(db.dsn, "postgres://localhost/app");
//! assert!(container.has("action.params.locale"));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::controller::Controller;

/// Namespace prefix for values bound to action parameters by name.
pub const ACTION_PARAMS_NAMESPACE: &str = "action.params.";

/// A type-erased shared service.
pub type SharedService = Arc<dyn Any + Send + Sync>;

/// A service locator, shared behind an `Arc` once the application is
/// built.
#[derive(Default)]
pub struct Container {
    services: HashMap<TypeId, SharedService>,
    named: HashMap<String, SharedService>,
    controllers: HashMap<String, Arc<dyn Controller>>,
}

impl Container {
    /// Creates a new empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service under its type.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    /// Resolves a service by type.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| s.clone().downcast::<T>().ok())
    }

    /// Resolves a type-erased service by its type ID.
    #[must_use]
    pub fn resolve_by_id(&self, type_id: TypeId) -> Option<SharedService> {
        self.services.get(&type_id).cloned()
    }

    /// Checks if a service of type `T` is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Stores a value under a name.
    pub fn set<T: Send + Sync + 'static>(&mut self, name: impl Into<String>, value: T) {
        self.named.insert(name.into(), Arc::new(value));
    }

    /// Returns the value stored under a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<SharedService> {
        self.named.get(name).cloned()
    }

    /// Returns the value stored under a name, if it has type `T`.
    #[must_use]
    pub fn get_as<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.get(name).and_then(|value| value.downcast::<T>().ok())
    }

    /// Checks if a value is stored under a name.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// Stores a value bound to every action parameter called `param`.
    pub fn set_action_param<T: Send + Sync + 'static>(&mut self, param: &str, value: T) {
        self.set(format!("{ACTION_PARAMS_NAMESPACE}{param}"), value);
    }

    /// Returns the value bound to action parameters called `param`.
    #[must_use]
    pub fn action_param(&self, param: &str) -> Option<SharedService> {
        self.named
            .get(&format!("{ACTION_PARAMS_NAMESPACE}{param}"))
            .cloned()
    }

    /// Registers a controller under the name used in action strings.
    pub fn register_controller<C: Controller>(&mut self, name: impl Into<String>, controller: Arc<C>) {
        self.controllers.insert(name.into(), controller);
    }

    /// Returns the controller registered under a name.
    #[must_use]
    pub fn controller(&self, name: &str) -> Option<Arc<dyn Controller>> {
        self.controllers.get(name).cloned()
    }

    /// Returns the number of typed services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty() && self.named.is_empty() && self.controllers.is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.named.keys().map(String::as_str).collect();
        names.sort_unstable();
        let mut controllers: Vec<&str> = self.controllers.keys().map(String::as_str).collect();
        controllers.sort_unstable();

        f.debug_struct("Container")
            .field("service_count", &self.services.len())
            .field("names", &names)
            .field("controllers", &controllers)
            .finish()
    }
}
