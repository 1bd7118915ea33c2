use crate::ids::RequestId;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::fmt;
use std::io::{self, Cursor, Read};

/// Readable request body.
///
/// The body is a one-pass stream. Anything that consumes it and wants later
/// readers to see the same bytes must put a replacement back with
/// [`Request::replace_body`].
pub struct Body(Box<dyn Read + Send>);

impl Body {
    #[must_use]
    pub fn empty() -> Self {
        Self::from_bytes(Vec::new())
    }

    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Body(Box::new(Cursor::new(bytes.into())))
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Body(Box::new(reader))
    }

    /// Drain the remaining bytes.
    pub fn read_all(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.0.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self {
        Body(Box::new(bytes))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Body(..)")
    }
}

/// An inbound protocol message as seen by handlers.
#[derive(Debug)]
pub struct Request {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    /// Transport headers, if the transport has any
    pub headers: HeaderMap,
    /// Message body
    pub body: Body,
}

impl Request {
    #[must_use]
    pub fn new(body: impl Into<Body>) -> Self {
        Self {
            request_id: RequestId::new(),
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Add a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Get a header by name (case-insensitive).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Swap in a new body, returning the old one.
    pub fn replace_body(&mut self, body: impl Into<Body>) -> Body {
        std::mem::replace(&mut self.body, body.into())
    }
}
