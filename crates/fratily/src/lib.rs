//! # Fratily
//!
//! A request-handling kernel: a request goes through an onion of
//! middleware to a routed action, and whatever goes wrong on the way comes
//! back as a well-formed HTTP response.
//!
//! ```text
//! Request → RequestId → (your middleware) → Routing → Dispatch ─┐
//!                                                               ↓
//!                        before-action → route before → Action
//!                                                               ↓
//! Response ← ErrorController ← ResponseEvent ← after-action ← route after
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use fratily::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> fratily::Result<()> {
//!     let config = ConfigLoader::new().with_optional_file("fratily.toml")?.load()?;
//!
//!     let mut app = Application::with_config(config);
//!     app.init_logging()?;
//!     app.get("/health", Action::new("health", [], |_| async { FaultResult::Ok("ok") }))?;
//!
//!     app.into_server()?.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! The member crates are re-exported for code that needs more than the
//! prelude.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;

pub use app::{ActionTarget, Application};
pub use error::{Error, Result};

pub use fratily_config as config;
pub use fratily_core as core;
pub use fratily_middleware as middleware;
pub use fratily_router as router;
pub use fratily_server as server;
pub use fratily_telemetry as telemetry;

/// Common imports.
pub mod prelude {
    pub use crate::{ActionTarget, Application};

    pub use fratily_config::{ConfigLoader, ConfigView, FratilyConfig, NotFoundPolicy};
    pub use fratily_core::{
        Action, ActionArgs, ActionValue, Body, Container, Controller, Fault, FaultResult,
        MethodInfo, ParamSpec, Request, RequestHead, RequestId, Response, ResponseExt,
    };
    pub use fratily_middleware::{
        BoxFuture, FnMiddleware, Middleware, MiddlewareContext, Next, NotFoundMode,
    };
    pub use fratily_router::{MethodSet, RouteData};
    pub use fratily_server::{
        BufferedTransport, HttpErrorController, Kernel, KernelHooks, Server, ShutdownSignal,
    };
}
