//! Actions, argument binding and return value coercion.
//!
//! An [`Action`] is the callable that produces the substantive response for
//! a route. It declares its parameters up front as a list of
//! [`ParamSpec`]s; when the route is registered the list is compiled into a
//! [`BindingPlan`], and on every request the plan binds each parameter from
//! the first source that can satisfy it:
//!
//! 1. the parameter named [`REQUEST_PARAM`] receives the request, body included
//! 2. the parameter named [`PARAMS_PARAM`] receives the whole parameter map
//! 3. a parameter whose name is a key in the parameter map receives its value
//! 4. a value stored in the container under `action.params.{name}`
//! 5. a container service matching the parameter's declared type
//! 6. the declared default value
//! 7. `Arg::Null` when the parameter is nullable
//!
//! Anything else fails with [`Fault::MissingArgument`].
//!
//! The value an action returns is an [`ActionValue`]; [`ActionValue::coerce`]
//! folds it into the in-flight response.

use std::any::{Any, TypeId};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::di::{Container, SharedService};
use crate::error::{Fault, FaultResult};
use crate::params::Params;
use crate::types::{Request, Response};

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The future an action returns.
pub type ActionFuture = BoxFuture<'static, FaultResult<ActionValue>>;

type ActionHandler = Arc<dyn Fn(ActionArgs) -> ActionFuture + Send + Sync>;

/// Parameter name bound to the current request.
pub const REQUEST_PARAM: &str = "_request";

/// Parameter name bound to the whole parameter map.
pub const PARAMS_PARAM: &str = "_params";

/// A bound argument value.
#[derive(Clone)]
pub enum Arg {
    /// The current request, body and extensions included.
    Request(Arc<Request>),
    /// The full parameter map.
    Params(Params),
    /// A string value from the parameter map.
    Str(String),
    /// A declared default value.
    Value(serde_json::Value),
    /// A value or service from the container.
    Service(SharedService),
    /// No value.
    Null,
}

impl Arg {
    /// Returns the argument as a string slice, if it holds one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) | Self::Value(serde_json::Value::String(value)) => {
                Some(value.as_str())
            }
            Self::Service(service) => service
                .downcast_ref::<String>()
                .map(String::as_str)
                .or_else(|| service.downcast_ref::<&'static str>().copied()),
            _ => None,
        }
    }

    /// Returns `true` for [`Arg::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(request) => f.debug_tuple("Request").field(request.uri()).finish(),
            Self::Params(params) => f.debug_tuple("Params").field(params).finish(),
            Self::Str(value) => f.debug_tuple("Str").field(value).finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Service(_) => f.write_str("Service(..)"),
            Self::Null => f.write_str("Null"),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<serde_json::Value> for Arg {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

#[derive(Clone, Copy)]
struct ServiceType {
    id: TypeId,
    name: &'static str,
}

/// A declared action parameter.
///
/// # Example
///
/// ```
/// use fratily_core::ParamSpec;
///
/// struct Mailer;
///
/// let params = [
///     ParamSpec::new("id"),
///     ParamSpec::new("mailer").typed::<Mailer>(),
///     ParamSpec::new("page").default_value("1"),
///     ParamSpec::new("filter").nullable(),
///     ParamSpec::request(),
/// ];
/// assert_eq!(params[4].name(), "_request");
/// ```
#[derive(Clone)]
pub struct ParamSpec {
    name: String,
    service_type: Option<ServiceType>,
    default: Option<Arg>,
    nullable: bool,
}

impl ParamSpec {
    /// Declares a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service_type: None,
            default: None,
            nullable: false,
        }
    }

    /// Declares the parameter bound to the current request.
    #[must_use]
    pub fn request() -> Self {
        Self::new(REQUEST_PARAM)
    }

    /// Declares the parameter bound to the whole parameter map.
    #[must_use]
    pub fn params() -> Self {
        Self::new(PARAMS_PARAM)
    }

    /// Declares the parameter's type as a service type.
    #[must_use]
    pub fn typed<T: Any + Send + Sync>(mut self) -> Self {
        self.service_type = Some(ServiceType {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        });
        self
    }

    /// Declares a default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Arg>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Declares that the parameter accepts no value.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("name", &self.name)
            .field("service_type", &self.service_type.map(|t| t.name))
            .field("default", &self.default)
            .field("nullable", &self.nullable)
            .finish()
    }
}

#[derive(Debug, Clone)]
enum Binding {
    Request,
    Params,
    Resolve {
        name: String,
        service_type: Option<TypeId>,
        default: Option<Arg>,
        nullable: bool,
    },
}

/// A compiled argument binding plan.
///
/// The plan is built once, when the route is registered. Binding only looks
/// values up; it never re-inspects the parameter declarations.
#[derive(Debug, Clone)]
pub struct BindingPlan {
    action: Arc<str>,
    bindings: Vec<(String, Binding)>,
}

impl BindingPlan {
    /// Compiles the parameter declarations of an action.
    #[must_use]
    pub fn compile(action: &str, params: &[ParamSpec]) -> Self {
        let bindings = params
            .iter()
            .map(|spec| {
                let binding = match spec.name.as_str() {
                    REQUEST_PARAM => Binding::Request,
                    PARAMS_PARAM => Binding::Params,
                    _ => Binding::Resolve {
                        name: spec.name.clone(),
                        service_type: spec.service_type.map(|t| t.id),
                        default: spec.default.clone(),
                        nullable: spec.nullable,
                    },
                };
                (spec.name.clone(), binding)
            })
            .collect();

        Self {
            action: Arc::from(action),
            bindings,
        }
    }

    /// Returns the number of declared parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if the action declares no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Binds every declared parameter for one request.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MissingArgument`] naming the first parameter no
    /// source satisfies.
    pub fn bind(
        &self,
        request: &Request,
        params: &Params,
        container: &Container,
    ) -> FaultResult<ActionArgs> {
        let mut values = Vec::with_capacity(self.bindings.len());

        for (name, binding) in &self.bindings {
            let arg = match binding {
                Binding::Request => Arg::Request(Arc::new(request.clone())),
                Binding::Params => Arg::Params(params.clone()),
                Binding::Resolve {
                    name,
                    service_type,
                    default,
                    nullable,
                } => params
                    .get(name)
                    .map(|value| Arg::Str(value.to_string()))
                    .or_else(|| container.action_param(name).map(Arg::Service))
                    .or_else(|| {
                        service_type
                            .and_then(|id| container.resolve_by_id(id))
                            .map(Arg::Service)
                    })
                    .or_else(|| default.clone())
                    .or_else(|| nullable.then_some(Arg::Null))
                    .ok_or_else(|| Fault::missing_argument(self.action.as_ref(), name.as_str()))?,
            };
            values.push((name.clone(), arg));
        }

        Ok(ActionArgs {
            action: Arc::clone(&self.action),
            values,
        })
    }
}

/// Arguments bound for one action call, in declaration order.
#[derive(Debug, Clone)]
pub struct ActionArgs {
    action: Arc<str>,
    values: Vec<(String, Arg)>,
}

impl ActionArgs {
    /// Returns the identity of the action being called.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns the argument bound to a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, arg)| arg)
    }

    /// Returns a string argument.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Arg::as_str)
    }

    /// Returns a string argument, failing when it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::MissingArgument`] when the argument is null or not a
    /// string.
    pub fn require_str(&self, name: &str) -> FaultResult<&str> {
        self.str(name)
            .ok_or_else(|| Fault::missing_argument(self.action(), name))
    }

    /// Returns a service or container value argument of type `T`.
    #[must_use]
    pub fn service<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        match self.get(name)? {
            Arg::Service(service) => service.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Returns the bound request.
    #[must_use]
    pub fn request(&self) -> Option<&Request> {
        self.values.iter().find_map(|(_, arg)| match arg {
            Arg::Request(request) => Some(request.as_ref()),
            _ => None,
        })
    }

    /// Returns the bound parameter map.
    #[must_use]
    pub fn params(&self) -> Option<&Params> {
        self.values.iter().find_map(|(_, arg)| match arg {
            Arg::Params(params) => Some(params),
            _ => None,
        })
    }

    /// Returns `true` if the parameter was bound to null.
    #[must_use]
    pub fn is_null(&self, name: &str) -> bool {
        self.get(name).is_some_and(Arg::is_null)
    }

    /// Returns the number of bound arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no arguments were bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The raw value an action returns.
#[derive(Debug)]
pub enum ActionValue {
    /// Nothing; the in-flight response is kept as is.
    Null,
    /// Text written to the response body.
    Text(String),
    /// Integer written to the response body.
    Int(i64),
    /// Float written to the response body.
    Float(f64),
    /// Boolean written to the response body.
    Bool(bool),
    /// A complete response that replaces the in-flight one.
    Response(Response),
    /// A value with no response semantics, named by its type.
    Unsupported(String),
}

impl ActionValue {
    /// Creates an unsupported value named after `T`.
    #[must_use]
    pub fn unsupported<T: ?Sized>() -> Self {
        Self::Unsupported(std::any::type_name::<T>().to_string())
    }

    /// Returns the name of the value's type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "string",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Response(_) => "response",
            Self::Unsupported(name) => name,
        }
    }

    /// Folds the value into the in-flight response.
    ///
    /// - `Null` and empty text leave the response untouched
    /// - other scalars are written to the response body as text
    /// - a response replaces the in-flight response
    ///
    /// # Errors
    ///
    /// Returns [`Fault::InvalidActionResult`] for unsupported values and
    /// [`Fault::BodyNotWritable`] when a scalar meets a read-only body.
    pub fn coerce(self, action: &str, mut response: Response) -> FaultResult<Response> {
        let text = match self {
            Self::Null => return Ok(response),
            Self::Response(replacement) => return Ok(replacement),
            Self::Unsupported(actual) => return Err(Fault::invalid_action_result(action, actual)),
            Self::Text(text) => text,
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Bool(value) => value.to_string(),
        };

        if !text.is_empty() {
            response.body_mut().write(text.as_bytes())?;
        }
        Ok(response)
    }
}

impl From<()> for ActionValue {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl From<String> for ActionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ActionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for ActionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ActionValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for ActionValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ActionValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ActionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Response> for ActionValue {
    fn from(value: Response) -> Self {
        Self::Response(value)
    }
}

impl<T: Into<ActionValue>> From<Option<T>> for ActionValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for ActionValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::String(s) => Self::Text(s),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or_else(|| Self::Text(n.to_string())),
            Value::Array(_) => Self::Unsupported("array".to_string()),
            Value::Object(_) => Self::Unsupported("object".to_string()),
        }
    }
}

impl<T> From<Vec<T>> for ActionValue {
    fn from(_: Vec<T>) -> Self {
        Self::Unsupported("array".to_string())
    }
}

/// A callable action with declared parameters.
///
/// # Example
///
/// ```
/// use fratily_core::{Action, ParamSpec};
///
/// let action = Action::new("greet", [ParamSpec::new("name")], |args| async move {
///     Ok(format!("hello {}", args.str("name").unwrap_or("stranger")))
/// });
/// assert_eq!(action.name(), "greet");
/// assert_eq!(action.plan().len(), 1);
/// ```
#[derive(Clone)]
pub struct Action {
    name: Arc<str>,
    params: Vec<ParamSpec>,
    plan: BindingPlan,
    handler: ActionHandler,
}

impl Action {
    /// Creates an action from an async function.
    pub fn new<F, Fut, R>(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamSpec>,
        func: F,
    ) -> Self
    where
        F: Fn(ActionArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FaultResult<R>> + Send + 'static,
        R: Into<ActionValue>,
    {
        let handler: ActionHandler = Arc::new(move |args| -> ActionFuture {
            let fut = func(args);
            Box::pin(async move { fut.await.map(Into::into) })
        });
        Self::from_handler(name, params, handler)
    }

    pub(crate) fn from_handler(
        name: impl Into<String>,
        params: impl IntoIterator<Item = ParamSpec>,
        handler: ActionHandler,
    ) -> Self {
        let name: String = name.into();
        let params: Vec<ParamSpec> = params.into_iter().collect();
        let plan = BindingPlan::compile(&name, &params);
        Self {
            name: Arc::from(name),
            params,
            plan,
            handler,
        }
    }

    /// Returns the action identity.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared parameters.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Returns the compiled binding plan.
    #[must_use]
    pub fn plan(&self) -> &BindingPlan {
        &self.plan
    }

    /// Calls the action with already bound arguments.
    pub fn call(&self, args: ActionArgs) -> ActionFuture {
        (self.handler)(args)
    }

    /// Binds arguments and calls the action.
    ///
    /// # Errors
    ///
    /// Returns binding faults and whatever the action itself returns.
    pub async fn invoke(
        &self,
        request: &Request,
        params: &Params,
        container: &Container,
    ) -> FaultResult<ActionValue> {
        let args = self.plan.bind(request, params, container)?;
        self.call(args).await
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
