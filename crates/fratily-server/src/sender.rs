//! Response emission.
//!
//! [`ResponseSender`] writes a response to a [`Transport`] in two steps:
//!
//! 1. **Headers**: the status line (`HTTP/1.1 404 Not Found`), using the
//!    standard phrase when the response carries no reason phrase of its own,
//!    then one line per header name. Values of a repeated header are joined
//!    with `", "`, except `Set-Cookie`, which gets one line per value.
//!    Nothing is written when the transport already sent headers.
//! 2. **Body**: the whole body at once, or fixed-size chunks from the start
//!    when the body is seekable and a chunk size is configured. Statuses that
//!    forbid a body (1xx, 204, 304) send none.

use fratily_core::status::{forbids_body, reason_phrase_or_unknown};
use fratily_core::{Fault, FaultResult, Response, ResponseExt};
use http::header::SET_COOKIE;

use crate::transport::Transport;

/// Writes responses to transports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseSender {
    chunk_size: Option<usize>,
}

impl ResponseSender {
    /// Creates a sender that writes bodies in one piece.
    #[must_use]
    pub const fn new() -> Self {
        Self { chunk_size: None }
    }

    /// Creates a sender that writes seekable bodies in chunks of `size`
    /// bytes. A zero size disables chunking.
    #[must_use]
    pub const fn with_chunk_size(size: usize) -> Self {
        Self {
            chunk_size: if size == 0 { None } else { Some(size) },
        }
    }

    /// Returns the configured chunk size.
    #[must_use]
    pub const fn chunk_size(&self) -> Option<usize> {
        self.chunk_size
    }

    /// Sends headers, then the body.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::BodyNotReadable`] for unreadable bodies and
    /// [`Fault::Transport`] when writing fails.
    pub fn send<T: Transport + ?Sized>(
        &self,
        response: &Response,
        transport: &mut T,
    ) -> FaultResult<()> {
        self.send_headers(response, transport)?;
        self.send_body(response, transport)
    }

    /// Sends the status line and headers.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Transport`] when writing fails.
    pub fn send_headers<T: Transport + ?Sized>(
        &self,
        response: &Response,
        transport: &mut T,
    ) -> FaultResult<()> {
        if transport.headers_sent() {
            tracing::debug!("headers already sent, skipping");
            return Ok(());
        }

        let status = response.status();
        let reason = response
            .reason_phrase()
            .filter(|phrase| !phrase.is_empty())
            .unwrap_or_else(|| reason_phrase_or_unknown(status.as_u16()));
        transport.write_status_line(response.version(), status, reason)?;

        let headers = response.headers();
        for name in headers.keys() {
            let display = canonical_name(name.as_str());
            if *name == SET_COOKIE {
                for value in headers.get_all(name) {
                    transport.write_header(&display, value.as_bytes())?;
                }
                continue;
            }

            let mut line = Vec::new();
            for (i, value) in headers.get_all(name).iter().enumerate() {
                if i > 0 {
                    line.extend_from_slice(b", ");
                }
                line.extend_from_slice(value.as_bytes());
            }
            transport.write_header(&display, &line)?;
        }

        transport.finish_headers()?;
        Ok(())
    }

    /// Sends the body.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::BodyNotReadable`] for unreadable bodies and
    /// [`Fault::Transport`] when writing fails.
    pub fn send_body<T: Transport + ?Sized>(
        &self,
        response: &Response,
        transport: &mut T,
    ) -> FaultResult<()> {
        let body = response.body();
        if !body.is_readable() {
            return Err(Fault::BodyNotReadable);
        }
        if forbids_body(response.status().as_u16()) {
            return Ok(());
        }

        match self.chunk_size.and_then(|size| body.chunks(size)) {
            Some(chunks) => {
                for chunk in chunks {
                    transport.write_body(&chunk)?;
                }
            }
            None => transport.write_body(&body.contents()?)?,
        }
        Ok(())
    }
}

/// Renders a lower-case header name in its conventional capitalization
/// (`x-test` becomes `X-Test`).
fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        upper = c == '-';
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::BufferedTransport;
    use fratily_core::Body;
    use http::{HeaderValue, StatusCode};
    use proptest::prelude::*;

    fn response(status: StatusCode, body: Body) -> Response {
        let mut response = Response::new(body);
        *response.status_mut() = status;
        response
    }

    #[test]
    fn test_header_emission() {
        let mut response = response(StatusCode::NOT_FOUND, Body::empty());
        let headers = response.headers_mut();
        headers.append("x-test", HeaderValue::from_static("a"));
        headers.append("x-test", HeaderValue::from_static("b"));
        headers.append("set-cookie", HeaderValue::from_static("k=v"));
        headers.append("set-cookie", HeaderValue::from_static("s=1"));

        let mut transport = BufferedTransport::new();
        ResponseSender::new().send_headers(&response, &mut transport).unwrap();

        assert_eq!(
            transport.status_line().as_deref(),
            Some("HTTP/1.1 404 Not Found")
        );
        assert_eq!(
            transport.header_lines(),
            ["X-Test: a, b", "Set-Cookie: k=v", "Set-Cookie: s=1"]
        );
    }

    #[test]
    fn test_custom_reason_phrase() {
        let mut response = response(StatusCode::OK, Body::empty());
        response.set_reason_phrase("Fine");

        let mut transport = BufferedTransport::new();
        ResponseSender::new().send(&response, &mut transport).unwrap();
        assert_eq!(transport.status_line().as_deref(), Some("HTTP/1.1 200 Fine"));
    }

    #[test]
    fn test_unknown_status_phrase() {
        let response = response(StatusCode::from_u16(599).unwrap(), Body::empty());

        let mut transport = BufferedTransport::new();
        ResponseSender::new().send(&response, &mut transport).unwrap();
        assert_eq!(
            transport.status_line().as_deref(),
            Some("HTTP/1.1 599 unknown status code")
        );
    }

    #[test]
    fn test_headers_sent_once() {
        let first = response(StatusCode::OK, Body::empty());
        let second = response(StatusCode::IM_A_TEAPOT, Body::empty());

        let mut transport = BufferedTransport::new();
        let sender = ResponseSender::new();
        sender.send_headers(&first, &mut transport).unwrap();
        sender.send_headers(&second, &mut transport).unwrap();

        assert_eq!(transport.status(), Some(StatusCode::OK));
    }

    #[test]
    fn test_chunked_body() {
        let response = response(StatusCode::OK, Body::from("abcdefg"));

        let mut transport = BufferedTransport::new();
        ResponseSender::with_chunk_size(3)
            .send_body(&response, &mut transport)
            .unwrap();

        assert_eq!(&transport.body()[..], b"abcdefg");
        assert_eq!(transport.body_writes(), 3);
    }

    #[test]
    fn test_streamed_body_sent_whole() {
        let body = Body::streamed(["ab".into(), "cd".into()]);
        let response = response(StatusCode::OK, body);

        let mut transport = BufferedTransport::new();
        ResponseSender::with_chunk_size(1)
            .send_body(&response, &mut transport)
            .unwrap();

        assert_eq!(&transport.body()[..], b"abcd");
        assert_eq!(transport.body_writes(), 1);
    }

    #[test]
    fn test_unreadable_body() {
        let response = response(StatusCode::OK, Body::detached());

        let mut transport = BufferedTransport::new();
        let err = ResponseSender::new()
            .send_body(&response, &mut transport)
            .unwrap_err();
        assert!(matches!(err, Fault::BodyNotReadable));
    }

    #[test]
    fn test_no_content_skips_body() {
        let response = response(StatusCode::NO_CONTENT, Body::from("ignored"));

        let mut transport = BufferedTransport::new();
        ResponseSender::new().send(&response, &mut transport).unwrap();
        assert!(transport.body().is_empty());
        assert_eq!(ResponseSender::with_chunk_size(0).chunk_size(), None);
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("content-type"), "Content-Type");
        assert_eq!(canonical_name("x-request-id"), "X-Request-Id");
        assert_eq!(canonical_name("etag"), "Etag");
    }

    proptest! {
        #[test]
        fn prop_status_line_uses_standard_phrase(
            code in 100u16..600,
            chunk in 0usize..8,
            text in "[a-z]{0,16}",
        ) {
            let status = StatusCode::from_u16(code).unwrap();
            let response = response(status, Body::from(text.as_str()));

            let mut transport = BufferedTransport::new();
            ResponseSender::with_chunk_size(chunk)
                .send(&response, &mut transport)
                .unwrap();

            let expected = format!("HTTP/1.1 {code} {}", reason_phrase_or_unknown(code));
            prop_assert_eq!(transport.status_line(), Some(expected));
            if forbids_body(code) {
                prop_assert!(transport.body().is_empty());
            } else {
                prop_assert_eq!(&transport.body()[..], text.as_bytes());
            }
        }
    }
}
