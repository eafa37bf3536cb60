//! The request kernel.
//!
//! [`Kernel`] handles one request end to end:
//!
//! 1. assign the request ID, then fire [`RequestEvent`]; a listener may
//!    answer and skip dispatch
//! 2. run the middleware chain, bounded by the deadline when one is set
//! 3. translate a recoverable fault into an error response through the
//!    [`ErrorController`]; a fault raised there is escalated, never
//!    translated again
//! 4. echo the request ID on whichever response came out, fire
//!    [`ResponseEvent`], send the response, fire [`TerminateEvent`]
//!
//! Fatal faults (chain wiring, transport, configuration, escalated) are
//! logged and returned to the caller untranslated.

use std::sync::Arc;
use std::time::Duration;

use fratily_core::{Fault, FaultResult, Request, RequestHead, RequestId, Response};
use fratily_middleware::{
    MiddlewareChain, MiddlewareContext, RequestIdMiddleware, REQUEST_ID_HEADER,
};
use http::{HeaderValue, StatusCode};

use crate::error_controller::{ErrorController, HttpErrorController};
use crate::hooks::{KernelHooks, RequestEvent, ResponseEvent, TerminateEvent};
use crate::sender::ResponseSender;
use crate::transport::Transport;

/// Entry point for handling requests.
///
/// A kernel holds no per-request state and is shared across connections
/// behind an [`Arc`].
pub struct Kernel {
    chain: MiddlewareChain,
    error_controller: Arc<dyn ErrorController>,
    hooks: KernelHooks,
    sender: ResponseSender,
    request_ids: RequestIdMiddleware,
    deadline: Option<Duration>,
    timeout_status: StatusCode,
}

impl Kernel {
    /// Creates a kernel around `chain` with default settings.
    #[must_use]
    pub fn new(chain: MiddlewareChain) -> Self {
        Self::builder(chain).build()
    }

    /// Creates a kernel builder.
    #[must_use]
    pub fn builder(chain: MiddlewareChain) -> KernelBuilder {
        KernelBuilder::new(chain)
    }

    /// Returns the middleware chain.
    #[must_use]
    pub fn chain(&self) -> &MiddlewareChain {
        &self.chain
    }

    /// Returns the dispatch deadline.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Handles a request and returns the response without sending it.
    ///
    /// Terminate listeners do not run.
    ///
    /// # Errors
    ///
    /// Returns fatal faults, and [`Fault::ErrorHandling`] when the error
    /// controller fails.
    pub async fn handle(&self, request: Request) -> FaultResult<Response> {
        let head = RequestHead::of(&request);
        let mut ctx = self.context_for(&request);
        self.respond(&head, &mut ctx, request).await
    }

    /// Handles a request and sends the response to `transport`.
    ///
    /// # Errors
    ///
    /// Same as [`Kernel::handle`], plus body and transport faults raised
    /// while sending.
    pub async fn run<T>(&self, request: Request, transport: &mut T) -> FaultResult<()>
    where
        T: Transport + Send + ?Sized,
    {
        let head = RequestHead::of(&request);
        let mut ctx = self.context_for(&request);
        let response = self.respond(&head, &mut ctx, request).await?;

        if let Err(fault) = self.sender.send(&response, transport) {
            tracing::error!(
                request_id = %ctx.request_id(),
                error = %fault,
                "failed to send response"
            );
            return Err(fault);
        }

        let event = TerminateEvent {
            request: &head,
            response: &response,
            request_id: ctx.request_id(),
            elapsed: ctx.elapsed(),
        };
        self.hooks.fire_terminate(&event);
        tracing::debug!(
            request_id = %ctx.request_id(),
            status = response.status().as_u16(),
            duration_ms = ctx.elapsed().as_millis() as u64,
            "request complete"
        );
        Ok(())
    }

    fn context_for(&self, request: &Request) -> MiddlewareContext {
        let request_id = self.request_ids.incoming(request).unwrap_or_else(RequestId::new);
        MiddlewareContext::with_request_id(request_id)
    }

    async fn respond(
        &self,
        head: &RequestHead,
        ctx: &mut MiddlewareContext,
        request: Request,
    ) -> FaultResult<Response> {
        let mut event = RequestEvent::new(head, ctx.request_id());
        self.hooks.fire_request(&mut event);

        let mut response = match event.into_response() {
            Some(response) => {
                tracing::debug!(path = head.path(), "request answered before dispatch");
                response
            }
            None => {
                let outcome = self.dispatch(ctx, request).await;
                self.recover(head, ctx, outcome).await?
            }
        };
        if let Ok(value) = HeaderValue::try_from(ctx.request_id().to_string()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        let mut event = ResponseEvent::new(head, response);
        self.hooks.fire_response(&mut event);
        Ok(event.into_response())
    }

    async fn dispatch(
        &self,
        ctx: &mut MiddlewareContext,
        request: Request,
    ) -> FaultResult<Response> {
        let Some(deadline) = self.deadline else {
            return self.chain.handle(ctx, request).await;
        };
        match tokio::time::timeout(deadline, self.chain.handle(ctx, request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(Fault::Timeout {
                deadline,
                status: self.timeout_status,
            }),
        }
    }

    async fn recover(
        &self,
        head: &RequestHead,
        ctx: &MiddlewareContext,
        outcome: FaultResult<Response>,
    ) -> FaultResult<Response> {
        let fault = match outcome {
            Ok(response) => return Ok(response),
            Err(fault) => fault,
        };

        if !fault.is_recoverable() {
            tracing::error!(
                request_id = %ctx.request_id(),
                method = %head.method,
                path = head.path(),
                kind = ?fault.kind(),
                error = %fault,
                "fatal fault"
            );
            return Err(fault);
        }

        tracing::warn!(
            request_id = %ctx.request_id(),
            method = %head.method,
            path = head.path(),
            status = fault.status_code().as_u16(),
            error = %fault,
            "translating fault into error response"
        );

        match self
            .error_controller
            .handle(head, &fault, ctx.request_id())
            .await
        {
            Ok(response) => Ok(response),
            Err(secondary) => {
                tracing::error!(
                    request_id = %ctx.request_id(),
                    original = %fault,
                    error = %secondary,
                    "error controller failed"
                );
                Err(Fault::escalate(fault, secondary))
            }
        }
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("chain", &self.chain)
            .field("hooks", &self.hooks)
            .field("sender", &self.sender)
            .field("deadline", &self.deadline)
            .field("timeout_status", &self.timeout_status)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Kernel`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use fratily_middleware::{DefaultResponder, MiddlewareChain};
/// use fratily_server::{HttpErrorController, Kernel, ResponseSender};
/// use std::sync::Arc;
///
/// let chain = MiddlewareChain::new().with_fallback(Arc::new(DefaultResponder));
/// let kernel = Kernel::builder(chain)
///     .error_controller(HttpErrorController::for_mode(true))
///     .sender(ResponseSender::with_chunk_size(8192))
///     .deadline(Duration::from_secs(30))
///     .build();
///
/// assert_eq!(kernel.deadline(), Some(Duration::from_secs(30)));
/// ```
pub struct KernelBuilder {
    chain: MiddlewareChain,
    error_controller: Arc<dyn ErrorController>,
    hooks: KernelHooks,
    sender: ResponseSender,
    request_ids: RequestIdMiddleware,
    deadline: Option<Duration>,
    timeout_status: StatusCode,
}

impl KernelBuilder {
    fn new(chain: MiddlewareChain) -> Self {
        Self {
            chain,
            error_controller: Arc::new(HttpErrorController::default()),
            hooks: KernelHooks::default(),
            sender: ResponseSender::default(),
            request_ids: RequestIdMiddleware::new(),
            deadline: None,
            timeout_status: StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Sets the error controller.
    #[must_use]
    pub fn error_controller(mut self, controller: impl ErrorController) -> Self {
        self.error_controller = Arc::new(controller);
        self
    }

    /// Sets an error controller that is already shared.
    #[must_use]
    pub fn shared_error_controller(mut self, controller: Arc<dyn ErrorController>) -> Self {
        self.error_controller = controller;
        self
    }

    /// Sets the kernel hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: KernelHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sets the response sender.
    #[must_use]
    pub fn sender(mut self, sender: ResponseSender) -> Self {
        self.sender = sender;
        self
    }

    /// Sets how request IDs are assigned before request listeners run.
    ///
    /// Pass the same policy as the chain's request ID middleware so
    /// listeners and the response agree on the ID.
    #[must_use]
    pub fn request_ids(mut self, policy: RequestIdMiddleware) -> Self {
        self.request_ids = policy;
        self
    }

    /// Bounds dispatch to `deadline`.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the status of responses to expired requests (503 or 504).
    #[must_use]
    pub fn timeout_status(mut self, status: StatusCode) -> Self {
        self.timeout_status = status;
        self
    }

    /// Builds the kernel.
    #[must_use]
    pub fn build(self) -> Kernel {
        Kernel {
            chain: self.chain,
            error_controller: self.error_controller,
            hooks: self.hooks,
            sender: self.sender,
            request_ids: self.request_ids,
            deadline: self.deadline,
            timeout_status: self.timeout_status,
        }
    }
}

impl std::fmt::Debug for KernelBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelBuilder")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
