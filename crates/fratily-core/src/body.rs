//! Request and response bodies.
//!
//! A [`Body`] is one of three shapes:
//!
//! - **buffered**: readable, writable and seekable; what actions and most
//!   middleware produce
//! - **streamed**: a sequence of pre-produced chunks; readable but neither
//!   writable nor seekable
//! - **detached**: the contents were taken away; neither readable nor
//!   writable
//!
//! The response sender relies on these capabilities to pick between chunked
//! and single-shot emission.

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::error::{Fault, FaultResult};

/// An HTTP message body.
#[derive(Clone, Default)]
pub struct Body {
    inner: Inner,
}

#[derive(Clone)]
enum Inner {
    Buffered(BytesMut),
    Streamed(Vec<Bytes>),
    Detached,
}

impl Default for Inner {
    fn default() -> Self {
        Self::Buffered(BytesMut::new())
    }
}

impl Body {
    /// Creates an empty, writable body.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a streamed body from chunks.
    #[must_use]
    pub fn streamed(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            inner: Inner::Streamed(chunks.into_iter().collect()),
        }
    }

    /// Creates a body whose contents are gone.
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            inner: Inner::Detached,
        }
    }

    /// Returns `true` if the contents can be read.
    #[must_use]
    pub const fn is_readable(&self) -> bool {
        !matches!(self.inner, Inner::Detached)
    }

    /// Returns `true` if data can be appended.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        matches!(self.inner, Inner::Buffered(_))
    }

    /// Returns `true` if the contents can be read from an arbitrary offset.
    #[must_use]
    pub const fn is_seekable(&self) -> bool {
        matches!(self.inner, Inner::Buffered(_))
    }

    /// Returns the body length, if known.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match &self.inner {
            Inner::Buffered(buf) => Some(buf.len()),
            Inner::Streamed(chunks) => Some(chunks.iter().map(Bytes::len).sum()),
            Inner::Detached => None,
        }
    }

    /// Returns `true` if the body is known to hold no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Appends data to the body.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::BodyNotWritable`] for streamed and detached bodies.
    pub fn write(&mut self, data: &[u8]) -> FaultResult<usize> {
        match &mut self.inner {
            Inner::Buffered(buf) => {
                buf.extend_from_slice(data);
                Ok(data.len())
            }
            _ => Err(Fault::BodyNotWritable),
        }
    }

    /// Reads the whole body.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::BodyNotReadable`] for detached bodies.
    pub fn contents(&self) -> FaultResult<Bytes> {
        match &self.inner {
            Inner::Buffered(buf) => Ok(Bytes::copy_from_slice(buf)),
            Inner::Streamed(chunks) if chunks.len() == 1 => Ok(chunks[0].clone()),
            Inner::Streamed(chunks) => {
                let mut joined = BytesMut::with_capacity(chunks.iter().map(Bytes::len).sum());
                for chunk in chunks {
                    joined.extend_from_slice(chunk);
                }
                Ok(joined.freeze())
            }
            Inner::Detached => Err(Fault::BodyNotReadable),
        }
    }

    /// Reads a seekable body from the start in chunks of `size` bytes.
    ///
    /// Returns `None` when the body is not seekable.
    #[must_use]
    pub fn chunks(&self, size: usize) -> Option<impl Iterator<Item = Bytes> + '_> {
        match &self.inner {
            Inner::Buffered(buf) => Some(buf.chunks(size.max(1)).map(Bytes::copy_from_slice)),
            _ => None,
        }
    }

    /// Takes the contents out, leaving a detached body behind.
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Self::detached())
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self {
            inner: Inner::Buffered(BytesMut::from(&bytes[..])),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            inner: Inner::Buffered(BytesMut::from(&bytes[..])),
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::from(text.into_bytes())
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self {
            inner: Inner::Buffered(BytesMut::from(text)),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match &self.inner {
            Inner::Buffered(_) => "buffered",
            Inner::Streamed(_) => "streamed",
            Inner::Detached => "detached",
        };
        f.debug_struct("Body")
            .field("shape", &shape)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_body_capabilities() {
        let mut body = Body::from("hello");
        assert!(body.is_readable());
        assert!(body.is_writable());
        assert!(body.is_seekable());

        body.write(b", world").unwrap();
        assert_eq!(body.contents().unwrap(), Bytes::from("hello, world"));
        assert_eq!(body.len(), Some(12));
    }

    #[test]
    fn test_streamed_body_is_read_only() {
        let mut body = Body::streamed([Bytes::from("ab"), Bytes::from("cd")]);
        assert!(body.is_readable());
        assert!(!body.is_seekable());
        assert!(matches!(body.write(b"x"), Err(Fault::BodyNotWritable)));
        assert_eq!(body.contents().unwrap(), Bytes::from("abcd"));
        assert!(body.chunks(1).is_none());
    }

    #[test]
    fn test_detached_body_is_unreadable() {
        let mut body = Body::from("gone");
        let taken = body.take();
        assert_eq!(taken.contents().unwrap(), Bytes::from("gone"));
        assert!(!body.is_readable());
        assert!(matches!(body.contents(), Err(Fault::BodyNotReadable)));
    }

    #[test]
    fn test_chunks_from_start() {
        let body = Body::from("abcdefg");
        let chunks: Vec<Bytes> = body.chunks(3).unwrap().collect();
        assert_eq!(
            chunks,
            vec![Bytes::from("abc"), Bytes::from("def"), Bytes::from("g")]
        );
    }

    #[test]
    fn test_empty_body() {
        assert!(Body::empty().is_empty());
        assert!(!Body::detached().is_empty());
    }
}
