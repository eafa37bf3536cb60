//! HTTP server.
//!
//! [`Server`] accepts TCP connections, serves them with hyper's HTTP/1
//! connection builder and hands every request to the [`Kernel`]. The
//! kernel sends into a [`BufferedTransport`], whose recording becomes the
//! hyper response.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use fratily_middleware::{DefaultResponder, MiddlewareChain};
//! use fratily_server::{Kernel, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let chain = MiddlewareChain::new().with_fallback(Arc::new(DefaultResponder));
//!     let config = ServerConfig::builder().http_addr("0.0.0.0:8080").build();
//!
//!     Server::new(Kernel::new(chain), config).run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use fratily_core::status::reason_phrase_or_unknown;
use fratily_core::Body;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::kernel::Kernel;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use crate::transport::BufferedTransport;

/// Response type handed to hyper.
pub type HttpResponse = http::Response<Full<Bytes>>;

/// HTTP front end for a [`Kernel`].
#[derive(Debug)]
pub struct Server {
    kernel: Arc<Kernel>,
    config: ServerConfig,
}

impl Server {
    /// Creates a server.
    #[must_use]
    pub fn new(kernel: Kernel, config: ServerConfig) -> Self {
        Self {
            kernel: Arc::new(kernel),
            config,
        }
    }

    /// Returns the kernel.
    #[must_use]
    pub fn kernel(&self) -> &Arc<Kernel> {
        &self.kernel
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run(self) -> ServerResult<()> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals())
            .await
    }

    /// Runs until `shutdown` is triggered, then waits up to the shutdown
    /// timeout for open connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                source,
            })?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        tracing::info!(addr = %listener.local_addr()?, "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let server = Arc::clone(&server);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = server.serve(stream, remote, shutdown).await {
                                tracing::warn!(remote = %remote, error = %e, "connection error");
                            }
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                () = shutdown.recv() => {
                    tracing::info!("shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        let timeout = server.config.shutdown_timeout();
        tracing::info!(
            open = tracker.active_connections(),
            timeout = ?timeout,
            "waiting for connections to close"
        );
        if tokio::time::timeout(timeout, tracker.wait_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                open = tracker.active_connections(),
                "shutdown timeout reached"
            );
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn serve(
        self: &Arc<Self>,
        stream: TcpStream,
        remote: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(self);
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.handle(request).await) }
        });

        let mut builder = http1::Builder::new();
        builder.keep_alive(self.config.keep_alive());
        let conn = builder.serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result,
            () = shutdown.recv() => {
                tracing::debug!(remote = %remote, "closing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        }
    }

    /// Handles one HTTP request.
    ///
    /// Bodies over the configured limit get `413`; fatal kernel faults are
    /// logged and answered with a bare `500`.
    pub async fn handle<B>(&self, request: http::Request<B>) -> HttpResponse
    where
        B: hyper::body::Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = request.into_parts();
        tracing::debug!(method = %parts.method, path = parts.uri.path(), "request received");

        let bytes = match Limited::new(body, self.config.max_body_bytes())
            .collect()
            .await
        {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                tracing::warn!(limit = self.config.max_body_bytes(), "request body too large");
                return bare(http::StatusCode::PAYLOAD_TOO_LARGE);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read request body");
                return bare(http::StatusCode::BAD_REQUEST);
            }
        };

        let request = http::Request::from_parts(parts, Body::from(bytes));
        let mut transport = BufferedTransport::new();
        match self.kernel.run(request, &mut transport).await {
            Ok(()) => transport.into_response().map(Full::new),
            Err(fault) => {
                tracing::error!(error = %fault, "request failed");
                bare(http::StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

fn bare(status: http::StatusCode) -> HttpResponse {
    let text = format!("{} {}", status.as_u16(), reason_phrase_or_unknown(status.as_u16()));
    let mut response = http::Response::new(Full::new(Bytes::from(text)));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use fratily_core::{FaultResult, Response, ResponseExt};
    use fratily_middleware::{FnMiddleware, MiddlewareChain};
    use http::StatusCode;
    use std::time::Duration;

    fn echo_server(max_body_bytes: usize) -> Server {
        let echo = FnMiddleware::new("echo", |_ctx, request, _next| {
            Box::pin(async move {
                let body = request.body().contents()?;
                FaultResult::Ok(Response::text(
                    StatusCode::OK,
                    format!("{} bytes", body.len()),
                ))
            })
        });
        let chain = MiddlewareChain::new().with_fallback(Arc::new(echo));
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .max_body_bytes(max_body_bytes)
            .shutdown_timeout(Duration::from_millis(100))
            .build();
        Server::new(Kernel::new(chain), config)
    }

    fn post(body: &'static str) -> http::Request<Full<Bytes>> {
        http::Request::builder()
            .method("POST")
            .uri("/upload")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    async fn text(response: HttpResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_handle_passes_body_to_kernel() {
        let response = echo_server(1024).handle(post("hello")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "5 bytes");
    }

    #[tokio::test]
    async fn test_handle_rejects_large_body() {
        let response = echo_server(4).handle(post("hello")).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_fatal_fault_becomes_bare_500() {
        let server = Server::new(Kernel::new(MiddlewareChain::new()), ServerConfig::default());
        let response = server.handle(post("")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text(response).await, "500 Internal Server Error");
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let config = ServerConfig::builder().http_addr("not-an-address").build();
        let server = Server::new(Kernel::new(MiddlewareChain::new()), config);

        let err = server
            .run_with_shutdown(ShutdownSignal::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress { .. }));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result =
            tokio::time::timeout(Duration::from_secs(5), echo_server(1024).run_with_shutdown(shutdown))
                .await;
        assert!(matches!(result, Ok(Ok(()))));
    }
}
