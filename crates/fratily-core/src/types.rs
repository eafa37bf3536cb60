//! HTTP message types used throughout the kernel.

use std::borrow::Cow;

use http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, Version};

use crate::body::Body;

/// The HTTP request type handled by the kernel.
pub type Request = http::Request<Body>;

/// The HTTP response type produced by the kernel.
pub type Response = http::Response<Body>;

/// Custom reason phrase stored in a response's extensions.
///
/// When absent, the response sender falls back to the standard phrase for
/// the status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonPhrase(pub Cow<'static, str>);

/// Extension trait for building and inspecting responses.
pub trait ResponseExt {
    /// Creates an empty response with the given status.
    fn with_status(status: StatusCode) -> Response;

    /// Creates a plain text response.
    fn text(status: StatusCode, body: impl Into<String>) -> Response;

    /// Creates an HTML response.
    fn html(status: StatusCode, body: impl Into<String>) -> Response;

    /// Creates a JSON response from a serializable value.
    fn json<T: serde::Serialize>(status: StatusCode, value: &T) -> Response;

    /// Returns the custom reason phrase, if one was set.
    fn reason_phrase(&self) -> Option<&str>;

    /// Sets a custom reason phrase.
    fn set_reason_phrase(&mut self, phrase: impl Into<Cow<'static, str>>);
}

fn build(status: StatusCode, content_type: &'static str, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(http::header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

impl ResponseExt for Response {
    fn with_status(status: StatusCode) -> Response {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = status;
        response
    }

    fn text(status: StatusCode, body: impl Into<String>) -> Response {
        build(status, "text/plain; charset=utf-8", Body::from(body.into()))
    }

    fn html(status: StatusCode, body: impl Into<String>) -> Response {
        build(status, "text/html; charset=utf-8", Body::from(body.into()))
    }

    fn json<T: serde::Serialize>(status: StatusCode, value: &T) -> Response {
        match serde_json::to_vec(value) {
            Ok(bytes) => build(status, "application/json", Body::from(bytes)),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize JSON response body");
                Self::with_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn reason_phrase(&self) -> Option<&str> {
        self.extensions()
            .get::<ReasonPhrase>()
            .map(|phrase| phrase.0.as_ref())
    }

    fn set_reason_phrase(&mut self, phrase: impl Into<Cow<'static, str>>) {
        self.extensions_mut().insert(ReasonPhrase(phrase.into()));
    }
}

/// An owned copy of a request's head.
///
/// Hooks and error renderers receive a `RequestHead` rather than the
/// request itself, since the request value travels on through the chain.
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// Request method.
    pub method: Method,
    /// Request URI.
    pub uri: Uri,
    /// Protocol version.
    pub version: Version,
    /// Request headers.
    pub headers: HeaderMap,
}

impl RequestHead {
    /// Copies the head of a request.
    #[must_use]
    pub fn of(request: &Request) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            version: request.version(),
            headers: request.headers().clone(),
        }
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }
}
