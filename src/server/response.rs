use http::HeaderMap;
use std::io::{self, Write};

/// Writable response sink handed to a handler together with its request.
///
/// The dispatcher itself never writes to it.
pub trait ResponseWriter: Write + Send {
    fn headers_mut(&mut self) -> &mut HeaderMap;
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for Box<W> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }
}

/// In-memory response sink.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    writes: usize,
}

impl ResponseBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `write` calls received.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// True when nobody has written headers or bytes.
    #[must_use]
    pub fn is_untouched(&self) -> bool {
        self.writes == 0 && self.headers.is_empty()
    }
}

impl Write for ResponseBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ResponseWriter for ResponseBuffer {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    #[test]
    fn test_fresh_buffer_is_untouched() {
        let buf = ResponseBuffer::new();
        assert!(buf.is_untouched());
        assert_eq!(buf.write_count(), 0);
    }

    #[test]
    fn test_writes_and_headers_are_recorded() {
        let mut buf = ResponseBuffer::new();
        buf.headers_mut()
            .insert(CONTENT_TYPE, "application/octet-stream".parse().unwrap());
        buf.write_all(b"pong").unwrap();
        assert!(!buf.is_untouched());
        assert_eq!(buf.body, b"pong");
        assert_eq!(buf.write_count(), 1);
    }
}
