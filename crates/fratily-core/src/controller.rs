//! The controller capability.
//!
//! A controller is any type whose public, non-static methods may serve as
//! actions. Controllers describe their methods through [`MethodInfo`] and
//! dispatch calls by method name. Routes reference controller actions with
//! a `"controller:method"` string, which is checked when the route is
//! registered so broken references fail at boot.

use std::fmt;
use std::sync::Arc;

use crate::action::{Action, ActionArgs, ActionFuture, ParamSpec};
use crate::di::Container;
use crate::error::{Fault, FaultResult};

/// Separator between the controller and method names of an action string.
pub const ACTION_SEPARATOR: char = ':';

/// Method visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Callable as an action.
    Public,
    /// Helper visible to subtypes only.
    Protected,
    /// Internal helper.
    Private,
}

/// Description of one controller method.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    name: &'static str,
    params: Vec<ParamSpec>,
    visibility: Visibility,
    is_static: bool,
}

impl MethodInfo {
    /// Describes a public instance method.
    #[must_use]
    pub fn public(name: &'static str) -> Self {
        Self {
            name,
            params: Vec::new(),
            visibility: Visibility::Public,
            is_static: false,
        }
    }

    /// Describes a method with a given visibility.
    #[must_use]
    pub fn with_visibility(name: &'static str, visibility: Visibility) -> Self {
        Self {
            visibility,
            ..Self::public(name)
        }
    }

    /// Marks the method as static (no receiver).
    #[must_use]
    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Declares a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Returns the method name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if the method may serve as an action.
    #[must_use]
    pub fn is_action(&self) -> bool {
        self.visibility == Visibility::Public && !self.is_static
    }
}

/// A type whose methods may serve as actions.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use fratily_core::{ActionArgs, ActionFuture, ActionValue, Controller, Fault, MethodInfo, ParamSpec};
///
/// struct Users;
///
/// impl Controller for Users {
///     fn methods(&self) -> Vec<MethodInfo> {
///         vec![MethodInfo::public("show").param(ParamSpec::new("id"))]
///     }
///
///     fn call(self: Arc<Self>, method: &str, args: ActionArgs) -> ActionFuture {
///         let method = method.to_string();
///         Box::pin(async move {
///             match method.as_str() {
///                 "show" => Ok(ActionValue::from(format!("user {}", args.require_str("id")?))),
///                 other => Err(Fault::not_callable(other, "unknown method")),
///             }
///         })
///     }
/// }
/// ```
pub trait Controller: Send + Sync + 'static {
    /// Describes every method of the controller.
    fn methods(&self) -> Vec<MethodInfo>;

    /// Calls a method with bound arguments.
    fn call(self: Arc<Self>, method: &str, args: ActionArgs) -> ActionFuture;
}

/// A parsed `"controller:method"` action string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRef {
    /// Controller name.
    pub controller: String,
    /// Method name.
    pub method: String,
}

impl ActionRef {
    /// Parses an action string.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::ActionNotCallable`] unless the string is two
    /// non-empty names joined by [`ACTION_SEPARATOR`].
    pub fn parse(action: &str) -> FaultResult<Self> {
        match action.split_once(ACTION_SEPARATOR) {
            Some((controller, method))
                if !controller.is_empty()
                    && !method.is_empty()
                    && !method.contains(ACTION_SEPARATOR) =>
            {
                Ok(Self {
                    controller: controller.to_string(),
                    method: method.to_string(),
                })
            }
            _ => Err(Fault::not_callable(
                action,
                "expected an action string of the form `controller:method`",
            )),
        }
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{ACTION_SEPARATOR}{}", self.controller, self.method)
    }
}

impl Action {
    /// Resolves a `"controller:method"` string against the controllers
    /// registered in the container.
    ///
    /// # Errors
    ///
    /// - [`Fault::ActionNotCallable`] for malformed strings, unknown
    ///   controllers and unknown methods
    /// - [`Fault::ActionMethodNotPublicOrIsStatic`] for methods that cannot
    ///   serve as actions
    pub fn from_controller(container: &Container, action: &str) -> FaultResult<Self> {
        let action_ref = ActionRef::parse(action)?;
        let controller = container.controller(&action_ref.controller).ok_or_else(|| {
            Fault::not_callable(
                action,
                format!("controller `{}` is not registered", action_ref.controller),
            )
        })?;

        let info = controller
            .methods()
            .into_iter()
            .find(|info| info.name == action_ref.method)
            .ok_or_else(|| {
                Fault::not_callable(
                    action,
                    format!(
                        "controller `{}` has no method `{}`",
                        action_ref.controller, action_ref.method
                    ),
                )
            })?;

        if !info.is_action() {
            return Err(Fault::ActionMethodNotPublicOrIsStatic {
                controller: action_ref.controller,
                method: action_ref.method,
            });
        }

        let method = info.name;
        Ok(Self::from_handler(
            action_ref.to_string(),
            info.params,
            Arc::new(move |args: ActionArgs| Arc::clone(&controller).call(method, args)),
        ))
    }
}
