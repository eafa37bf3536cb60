//! Response transports.
//!
//! A [`Transport`] is where the [`ResponseSender`](crate::ResponseSender)
//! writes a response: one status line, header lines, then body chunks.
//!
//! - [`BufferedTransport`] records everything in memory; the HTTP server
//!   turns the recording into a hyper response, and tests inspect it
//! - [`WireTransport`] writes raw HTTP/1.x text to any [`std::io::Write`]

use std::io::{self, Write};

use bytes::{Bytes, BytesMut};
use http::{HeaderName, HeaderValue, StatusCode, Version};

/// Destination for one response.
pub trait Transport {
    /// Returns `true` once the status line and headers have been written.
    fn headers_sent(&self) -> bool;

    /// Writes the status line.
    fn write_status_line(&mut self, version: Version, status: StatusCode, reason: &str)
        -> io::Result<()>;

    /// Writes one header line.
    fn write_header(&mut self, name: &str, value: &[u8]) -> io::Result<()>;

    /// Ends the header section.
    fn finish_headers(&mut self) -> io::Result<()>;

    /// Writes a body chunk.
    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()>;
}

/// Formats a status line without the trailing line break.
#[must_use]
pub fn status_line(version: Version, status: StatusCode, reason: &str) -> String {
    format!("{version:?} {} {reason}", status.as_u16())
}

/// Transport recording the response in memory.
///
/// # Example
///
/// ```
/// use fratily_server::{BufferedTransport, Transport};
/// use http::{StatusCode, Version};
///
/// let mut transport = BufferedTransport::new();
/// transport.write_status_line(Version::HTTP_11, StatusCode::OK, "OK").unwrap();
/// transport.write_header("Content-Type", b"text/plain").unwrap();
/// transport.finish_headers().unwrap();
/// transport.write_body(b"hi").unwrap();
///
/// assert_eq!(transport.status_line().as_deref(), Some("HTTP/1.1 200 OK"));
/// assert_eq!(transport.header_lines(), ["Content-Type: text/plain"]);
/// assert_eq!(&transport.body()[..], b"hi");
/// ```
#[derive(Debug, Default)]
pub struct BufferedTransport {
    status: Option<(Version, StatusCode, String)>,
    headers: Vec<(String, Vec<u8>)>,
    body: BytesMut,
    body_writes: usize,
    headers_sent: bool,
}

impl BufferedTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded status code.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status.as_ref().map(|(_, status, _)| *status)
    }

    /// Returns the recorded status line.
    #[must_use]
    pub fn status_line(&self) -> Option<String> {
        self.status
            .as_ref()
            .map(|(version, status, reason)| status_line(*version, *status, reason))
    }

    /// Returns the recorded header lines in write order.
    #[must_use]
    pub fn header_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|(name, value)| format!("{name}: {}", String::from_utf8_lossy(value)))
            .collect()
    }

    /// Returns the recorded body.
    #[must_use]
    pub fn body(&self) -> Bytes {
        self.body.clone().freeze()
    }

    /// Returns how many body chunks were written.
    #[must_use]
    pub fn body_writes(&self) -> usize {
        self.body_writes
    }

    /// Converts the recording into an `http` response.
    ///
    /// Header lines that are not valid HTTP are dropped with a warning.
    #[must_use]
    pub fn into_response(self) -> http::Response<Bytes> {
        let mut response = http::Response::new(self.body.freeze());
        if let Some((version, status, _)) = self.status {
            *response.version_mut() = version;
            *response.status_mut() = status;
        }

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_bytes(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::warn!(header = %name, "dropping invalid header line"),
            }
        }
        response
    }
}

impl Transport for BufferedTransport {
    fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    fn write_status_line(
        &mut self,
        version: Version,
        status: StatusCode,
        reason: &str,
    ) -> io::Result<()> {
        self.status = Some((version, status, reason.to_string()));
        Ok(())
    }

    fn write_header(&mut self, name: &str, value: &[u8]) -> io::Result<()> {
        self.headers.push((name.to_string(), value.to_vec()));
        Ok(())
    }

    fn finish_headers(&mut self) -> io::Result<()> {
        self.headers_sent = true;
        Ok(())
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.body.extend_from_slice(chunk);
        self.body_writes += 1;
        Ok(())
    }
}

/// Transport writing HTTP/1.x text to a writer.
#[derive(Debug)]
pub struct WireTransport<W> {
    writer: W,
    headers_sent: bool,
}

impl<W: Write> WireTransport<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            headers_sent: false,
        }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for WireTransport<W> {
    fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    fn write_status_line(
        &mut self,
        version: Version,
        status: StatusCode,
        reason: &str,
    ) -> io::Result<()> {
        write!(self.writer, "{}\r\n", status_line(version, status, reason))
    }

    fn write_header(&mut self, name: &str, value: &[u8]) -> io::Result<()> {
        self.writer.write_all(name.as_bytes())?;
        self.writer.write_all(b": ")?;
        self.writer.write_all(value)?;
        self.writer.write_all(b"\r\n")
    }

    fn finish_headers(&mut self) -> io::Result<()> {
        self.writer.write_all(b"\r\n")?;
        self.headers_sent = true;
        Ok(())
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.writer.write_all(chunk)?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_transport_format() {
        let mut transport = WireTransport::new(Vec::new());
        transport
            .write_status_line(Version::HTTP_11, StatusCode::NOT_FOUND, "Not Found")
            .unwrap();
        transport.write_header("X-Test", b"a, b").unwrap();
        assert!(!transport.headers_sent());
        transport.finish_headers().unwrap();
        transport.write_body(b"gone").unwrap();

        assert!(transport.headers_sent());
        assert_eq!(
            String::from_utf8(transport.into_inner()).unwrap(),
            "HTTP/1.1 404 Not Found\r\nX-Test: a, b\r\n\r\ngone"
        );
    }

    #[test]
    fn test_buffered_into_response_keeps_repeated_headers() {
        let mut transport = BufferedTransport::new();
        transport
            .write_status_line(Version::HTTP_11, StatusCode::CREATED, "Created")
            .unwrap();
        transport.write_header("Set-Cookie", b"a=1").unwrap();
        transport.write_header("Set-Cookie", b"b=2").unwrap();
        transport.write_header("Bad Header", b"x").unwrap();
        transport.finish_headers().unwrap();

        let response = transport.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get_all("set-cookie").iter().count(), 2);
        assert_eq!(response.headers().len(), 2);
    }

    #[test]
    fn test_status_line_versions() {
        assert_eq!(
            status_line(Version::HTTP_10, StatusCode::OK, "OK"),
            "HTTP/1.0 200 OK"
        );
        assert_eq!(
            status_line(Version::HTTP_2, StatusCode::NO_CONTENT, "No Content"),
            "HTTP/2.0 204 No Content"
        );
    }
}
