//! # Decoder Module
//!
//! Extracting a cookie from a raw message body.
//!
//! The dispatcher does not understand any wire format. It is constructed
//! with a [`CookieReader`] that turns body bytes into a [`CookieJar`] and
//! reports anything it cannot parse as an error. Decoding errors are never
//! surfaced to the peer; the dispatcher drops the message.
//!
//! Two implementations ship with the crate:
//!
//! - [`CookieReaderFn`] adapts a closure, for protocol crates that already
//!   have a message parser
//! - [`OffsetCookieReader`] reads a big-endian `u64` at a fixed offset, which
//!   covers the fixed-layout replies of OpenFlow-style protocols

use crate::cookie::{CookieCell, CookieJar};
use crate::ids::Cookie;
use anyhow::{Context, Result};
use std::io::{self, Read};

/// OpenFlow messages start with an 8-byte header (version, type, length, xid).
pub const OPENFLOW_HEADER_LEN: usize = 8;

/// Parses a message body and returns the cookie it carries.
pub trait CookieReader: Send + Sync {
    fn read_cookie(&self, body: &mut dyn Read) -> Result<Box<dyn CookieJar>>;
}

impl<R: CookieReader + ?Sized> CookieReader for std::sync::Arc<R> {
    fn read_cookie(&self, body: &mut dyn Read) -> Result<Box<dyn CookieJar>> {
        (**self).read_cookie(body)
    }
}

/// Adapter that lets an ordinary function act as a [`CookieReader`].
#[derive(Clone)]
pub struct CookieReaderFn<F>(pub F);

impl<F> CookieReader for CookieReaderFn<F>
where
    F: Fn(&mut dyn Read) -> Result<Box<dyn CookieJar>> + Send + Sync,
{
    fn read_cookie(&self, body: &mut dyn Read) -> Result<Box<dyn CookieJar>> {
        (self.0)(body)
    }
}

/// Reads a big-endian cookie at a fixed byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetCookieReader {
    pub offset: usize,
}

impl OffsetCookieReader {
    #[must_use]
    pub const fn new(offset: usize) -> Self {
        Self { offset }
    }

    /// Cookie immediately after an OpenFlow header, as in flow-removed and
    /// flow-stats replies.
    #[must_use]
    pub const fn after_openflow_header() -> Self {
        Self::new(OPENFLOW_HEADER_LEN)
    }
}

impl CookieReader for OffsetCookieReader {
    fn read_cookie(&self, body: &mut dyn Read) -> Result<Box<dyn CookieJar>> {
        let mut prefix = Read::take(&mut *body, self.offset as u64);
        let skipped =
            io::copy(&mut prefix, &mut io::sink()).context("failed to skip message prefix")?;
        if skipped < self.offset as u64 {
            anyhow::bail!(
                "message too short: need {} bytes before cookie, got {}",
                self.offset,
                skipped
            );
        }

        let mut raw = [0u8; 8];
        body.read_exact(&mut raw)
            .context("message too short to hold a cookie")?;
        Ok(Box::new(CookieCell(Cookie(u64::from_be_bytes(raw)))))
    }
}
