//! # Fratily Server
//!
//! The request kernel and its HTTP front end.
//!
//! - [`Kernel`] - handles one request end to end: hooks, chain dispatch,
//!   error translation, sending
//! - [`ErrorController`] - turns recoverable faults into responses
//! - [`ResponseSender`] - writes a response to a [`Transport`]
//! - [`Server`] - hyper HTTP/1 server with graceful shutdown
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fratily_core::{Body, FaultResult, Response, ResponseExt};
//! use fratily_middleware::{FnMiddleware, MiddlewareChain};
//! use fratily_server::{BufferedTransport, Kernel};
//! use http::StatusCode;
//!
//! # tokio_test::block_on(async {
//! let hello = FnMiddleware::new("hello", |_ctx, _request, _next| {
//!     Box::pin(async { FaultResult::Ok(Response::text(StatusCode::OK, "hello")) })
//! });
//! let kernel = Kernel::new(MiddlewareChain::new().with_fallback(Arc::new(hello)));
//!
//! let request = http::Request::builder().uri("/").body(Body::empty()).unwrap();
//! let mut transport = BufferedTransport::new();
//! kernel.run(request, &mut transport).await.unwrap();
//!
//! assert_eq!(transport.status_line().as_deref(), Some("HTTP/1.1 200 OK"));
//! assert_eq!(&transport.body()[..], b"hello");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/fratily-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod error_controller;
pub mod hooks;
pub mod kernel;
pub mod sender;
pub mod server;
pub mod shutdown;
pub mod transport;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::{ServerError, ServerResult};
pub use error_controller::{
    DebugRenderer, ErrorController, ErrorRenderer, HttpErrorController, JsonRenderer,
    PlainRenderer, StatusHandler,
};
pub use hooks::{KernelHooks, RequestEvent, ResponseEvent, TerminateEvent};
pub use kernel::{Kernel, KernelBuilder};
pub use sender::ResponseSender;
pub use server::{HttpResponse, Server};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
pub use transport::{status_line, BufferedTransport, Transport, WireTransport};
