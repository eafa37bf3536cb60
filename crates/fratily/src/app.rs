//! Application assembly.
//!
//! [`Application`] collects routes, middleware, services and settings, then
//! builds the [`Kernel`] that serves them. The chain it builds is always:
//!
//! ```text
//! request id → outer middleware... → routing → dispatch → default responder
//! ```
//!
//! Dispatch runs the per-action stack for the matched route: application
//! before-action middleware, the route's `before` middleware, the action,
//! the route's `after` middleware, application after-action middleware.

use std::sync::Arc;
use std::time::Duration;

use fratily_config::{FratilyConfig, LogFormat, NotFoundPolicy};
use fratily_core::{Action, Container, Controller, Fault, FaultResult};
use fratily_middleware::{
    BoxedMiddleware, DefaultResponder, DispatchMiddleware, Middleware, MiddlewareChain,
    MiddlewareRegistry, NotFoundMode, RequestIdMiddleware, RoutingMiddleware,
};
use fratily_router::{MethodSet, RouteCollector, RouteData};
use fratily_server::{
    ErrorController, HttpErrorController, Kernel, KernelHooks, ResponseSender, Server,
    ServerConfig,
};
use fratily_telemetry::LogConfig;
use http::StatusCode;

use crate::error::{Error, Result};

/// What a route runs: a callable, or a `"controller:method"` string
/// resolved against the registered controllers.
#[derive(Debug, Clone)]
pub enum ActionTarget {
    /// A ready callable.
    Callable(Action),
    /// A controller method.
    Controller(String),
}

impl From<Action> for ActionTarget {
    fn from(action: Action) -> Self {
        Self::Callable(action)
    }
}

impl From<&str> for ActionTarget {
    fn from(action: &str) -> Self {
        Self::Controller(action.to_string())
    }
}

impl From<String> for ActionTarget {
    fn from(action: String) -> Self {
        Self::Controller(action)
    }
}

/// Builds a Fratily application.
///
/// # Example
///
/// ```
/// use fratily::prelude::*;
///
/// # tokio_test::block_on(async {
/// let mut app = Application::new();
/// app.get("/hello/{name}", Action::new("hello", [ParamSpec::new("name")], |args| async move {
///     FaultResult::Ok(format!("hello {}", args.str("name").unwrap_or("you")))
/// }))
/// .unwrap();
///
/// let kernel = app.build().unwrap();
/// let request = http::Request::get("/hello/ada").body(Body::empty()).unwrap();
/// let response = kernel.handle(request).await.unwrap();
///
/// assert_eq!(&response.body().contents().unwrap()[..], b"hello ada");
/// # });
/// ```
pub struct Application {
    config: FratilyConfig,
    routes: RouteCollector,
    container: Container,
    registry: MiddlewareRegistry,
    outer: Vec<BoxedMiddleware>,
    before_action: Vec<BoxedMiddleware>,
    after_action: Vec<BoxedMiddleware>,
    hooks: KernelHooks,
    error_controller: Option<Arc<dyn ErrorController>>,
    trust_request_ids: bool,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// Creates an application with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FratilyConfig::default())
    }

    /// Creates an application with `config`.
    #[must_use]
    pub fn with_config(config: FratilyConfig) -> Self {
        Self {
            config,
            routes: RouteCollector::new(),
            container: Container::new(),
            registry: MiddlewareRegistry::new(),
            outer: Vec::new(),
            before_action: Vec::new(),
            after_action: Vec::new(),
            hooks: KernelHooks::new(),
            error_controller: None,
            trust_request_ids: false,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &FratilyConfig {
        &self.config
    }

    /// Replaces the configuration.
    pub fn set_config(&mut self, config: FratilyConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Returns the service container.
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Returns the service container for registration.
    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    /// Registers a controller for `"name:method"` actions.
    ///
    /// Controllers must be registered before the routes that name them.
    pub fn controller<C: Controller>(&mut self, name: impl Into<String>, controller: C) -> &mut Self {
        self.container.register_controller(name, Arc::new(controller));
        self
    }

    /// Registers a route.
    ///
    /// Returns the name the route was registered under.
    ///
    /// # Errors
    ///
    /// - [`Fault::InvalidRoute`] for a bad pattern, a duplicate or empty
    ///   name, or an empty method set
    /// - [`Fault::ActionNotCallable`] and
    ///   [`Fault::ActionMethodNotPublicOrIsStatic`] for controller actions
    ///   that do not resolve
    pub fn route(
        &mut self,
        name: Option<&str>,
        pattern: &str,
        methods: MethodSet,
        action: impl Into<ActionTarget>,
        data: RouteData,
    ) -> FaultResult<String> {
        let action = match action.into() {
            ActionTarget::Callable(action) => action,
            ActionTarget::Controller(action) => Action::from_controller(&self.container, &action)?,
        };
        self.routes.add_route(name, pattern, methods, action, data)
    }

    /// Registers a GET route.
    pub fn get(&mut self, pattern: &str, action: impl Into<ActionTarget>) -> FaultResult<String> {
        self.route(None, pattern, MethodSet::GET, action, RouteData::new())
    }

    /// Registers a POST route.
    pub fn post(&mut self, pattern: &str, action: impl Into<ActionTarget>) -> FaultResult<String> {
        self.route(None, pattern, MethodSet::POST, action, RouteData::new())
    }

    /// Registers a PUT route.
    pub fn put(&mut self, pattern: &str, action: impl Into<ActionTarget>) -> FaultResult<String> {
        self.route(None, pattern, MethodSet::PUT, action, RouteData::new())
    }

    /// Registers a PATCH route.
    pub fn patch(&mut self, pattern: &str, action: impl Into<ActionTarget>) -> FaultResult<String> {
        self.route(None, pattern, MethodSet::PATCH, action, RouteData::new())
    }

    /// Registers a DELETE route.
    pub fn delete(&mut self, pattern: &str, action: impl Into<ActionTarget>) -> FaultResult<String> {
        self.route(None, pattern, MethodSet::DELETE, action, RouteData::new())
    }

    /// Registers a named middleware that routes can reference from their
    /// `before`/`after` lists.
    pub fn register_middleware(
        &mut self,
        name: impl Into<String>,
        middleware: impl Middleware,
    ) -> &mut Self {
        self.registry.register(name, Arc::new(middleware));
        self
    }

    /// Adds an outer middleware ahead of the ones already added.
    pub fn prepend(&mut self, middleware: impl Middleware) -> &mut Self {
        self.outer.insert(0, Arc::new(middleware));
        self
    }

    /// Adds an outer middleware after the ones already added.
    pub fn append(&mut self, middleware: impl Middleware) -> &mut Self {
        self.outer.push(Arc::new(middleware));
        self
    }

    /// Adds a middleware that runs ahead of every action.
    pub fn before_action(&mut self, middleware: impl Middleware) -> &mut Self {
        self.before_action.push(Arc::new(middleware));
        self
    }

    /// Adds a middleware that runs behind every action.
    pub fn after_action(&mut self, middleware: impl Middleware) -> &mut Self {
        self.after_action.push(Arc::new(middleware));
        self
    }

    /// Replaces the kernel hooks.
    pub fn hooks(&mut self, hooks: KernelHooks) -> &mut Self {
        self.hooks = hooks;
        self
    }

    /// Replaces the error controller chosen from `app.debug`.
    pub fn error_controller(&mut self, controller: impl ErrorController) -> &mut Self {
        self.error_controller = Some(Arc::new(controller));
        self
    }

    /// Trusts `X-Request-ID` headers on incoming requests.
    pub fn trust_request_ids(&mut self, trust: bool) -> &mut Self {
        self.trust_request_ids = trust;
        self
    }

    /// Logging settings derived from the `logging` section.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let logging = &self.config.logging;
        let base = match logging.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        base.level(logging.level.clone())
    }

    /// Installs the global log subscriber from the `logging` section.
    pub fn init_logging(&self) -> Result<()> {
        fratily_telemetry::init_logging(&self.log_config())?;
        Ok(())
    }

    /// Builds the kernel.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid or a route references a
    /// middleware name that was never registered.
    pub fn build(self) -> Result<Kernel> {
        self.config.validate()?;

        for route in self.routes.routes() {
            self.registry
                .resolve(route.data().middleware_names())
                .map_err(|fault| match fault {
                    Fault::InvalidRoute { reason } => {
                        Fault::invalid_route(format!("route `{}`: {reason}", route.name()))
                    }
                    other => other,
                })?;
        }

        let Self {
            config,
            routes,
            container,
            registry,
            outer,
            before_action,
            after_action,
            hooks,
            error_controller,
            trust_request_ids,
        } = self;

        let request_id = if trust_request_ids {
            RequestIdMiddleware::trust_incoming()
        } else {
            RequestIdMiddleware::new()
        };
        let not_found = match config.routing.not_found_mode {
            NotFoundPolicy::Fault => NotFoundMode::Fault,
            NotFoundPolicy::Continue => NotFoundMode::Continue,
        };
        let routing = RoutingMiddleware::new(Arc::new(routes.build())).not_found_mode(not_found);
        let dispatch = DispatchMiddleware::new(Arc::new(container), Arc::new(registry))
            .before_action(before_action)
            .after_action(after_action);

        let mut chain = MiddlewareChain::new().with(Arc::new(request_id));
        chain.extend(outer);
        let chain = chain
            .with(Arc::new(routing))
            .with(Arc::new(dispatch))
            .with_fallback(Arc::new(DefaultResponder));

        let timeout_status =
            StatusCode::from_u16(config.server.timeout_status).map_err(Error::other)?;
        let sender = config
            .sender
            .chunk_size
            .map_or_else(ResponseSender::new, ResponseSender::with_chunk_size);
        let error_controller = error_controller
            .unwrap_or_else(|| Arc::new(HttpErrorController::for_mode(config.app.debug)));

        tracing::info!(
            app = %config.app.name,
            debug = config.app.debug,
            middleware = ?chain.names(),
            "kernel built"
        );

        Ok(Kernel::builder(chain)
            .shared_error_controller(error_controller)
            .hooks(hooks)
            .sender(sender)
            .request_ids(request_id)
            .deadline(Duration::from_secs(config.server.request_timeout_secs))
            .timeout_status(timeout_status)
            .build())
    }

    /// Builds the kernel and wraps it in an HTTP server configured from the
    /// `server` section.
    pub fn into_server(self) -> Result<Server> {
        let server = &self.config.server;
        let server_config = ServerConfig::builder()
            .http_addr(server.http_addr.clone())
            .shutdown_timeout(Duration::from_secs(server.shutdown_timeout_secs))
            .max_body_bytes(server.max_body_bytes)
            .build();
        Ok(Server::new(self.build()?, server_config))
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("app", &self.config.app.name)
            .field("routes", &self.routes.len())
            .field("middleware", &self.registry.len())
            .field("outer", &self.outer.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Action {
        Action::new("noop", [], |_| async { FaultResult::Ok(()) })
    }

    #[test]
    fn test_log_config_follows_logging_section() {
        let app = Application::with_config(FratilyConfig::development());
        let log = app.log_config();
        assert!(!log.json_format);
        assert_eq!(log.level, "debug");

        let log = Application::new().log_config();
        assert!(log.json_format);
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = FratilyConfig::default();
        config.server.timeout_status = 500;
        let err = Application::with_config(config).build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_build_rejects_unknown_route_middleware() {
        let mut app = Application::new();
        app.route(
            Some("guarded"),
            "/guarded",
            MethodSet::GET,
            noop(),
            RouteData::new().before("auth"),
        )
        .unwrap();

        let err = app.build().unwrap_err();
        assert!(err.to_string().contains("guarded"));
        assert!(err.to_string().contains("auth"));
    }

    #[test]
    fn test_unknown_controller_fails_at_registration() {
        let mut app = Application::new();
        let err = app.get("/users", "users:index").unwrap_err();
        assert!(matches!(err, Fault::ActionNotCallable { .. }));
    }

    #[test]
    fn test_chain_order() {
        let mut app = Application::new();
        app.get("/", noop()).unwrap();
        let kernel = app.build().unwrap();
        assert_eq!(
            kernel.chain().names(),
            ["request_id", "routing", "dispatch"]
        );
        assert_eq!(kernel.chain().fallback_name(), Some("default_responder"));
        assert_eq!(kernel.deadline(), Some(Duration::from_secs(30)));
    }
}
