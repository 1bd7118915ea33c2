//! # Cookie Module
//!
//! Correlation tokens ("cookies") and the objects that carry them.
//!
//! ## Overview
//!
//! A stateful protocol controller stamps an outgoing request with an opaque
//! 64-bit cookie and waits for a reply that echoes it back. This module
//! provides the two halves needed for that:
//!
//! - [`CookieSource`] - a seeded pseudo-random generator of fresh cookies
//! - [`CookieJar`] - the capability of a protocol message to hold a cookie
//!
//! The wire encoding of a cookie is owned by the protocol message type that
//! implements [`CookieJar`]; this crate never serialises it.
//!
//! ## Example
//!
//! ```rust
//! use cookie_dispatch::cookie::{CookieCell, CookieJar, CookieSource};
//!
//! let mut source = CookieSource::with_seed(7);
//! let mut jar = CookieCell::default();
//! jar.set_cookies(source.next());
//! assert!(!jar.cookies().is_none());
//! ```

mod core;

pub use core::{CookieCell, CookieJar, CookieSource};
