//! # Dispatcher Module
//!
//! Cookie-based reply dispatch. A protocol controller registers a handler,
//! receives a fresh cookie to stamp on its outgoing request, and later gets
//! the matching reply routed back to that handler.
//!
//! ## Overview
//!
//! The dispatcher:
//! - Keeps a concurrency-safe table of cookie → handler entries
//! - Draws fresh cookies from a private, seeded generator
//! - Decodes the cookie from each inbound body with an injected [`CookieReader`](crate::decoder::CookieReader)
//! - Forwards matched requests with the body rewound, drops everything else
//!
//! ## Handler Registration
//!
//! ```rust
//! use cookie_dispatch::cookie::{CookieCell, CookieJar};
//! use cookie_dispatch::decoder::OffsetCookieReader;
//! use cookie_dispatch::dispatcher::CookieDispatcher;
//! use cookie_dispatch::server::{Request, ResponseBuffer};
//! use std::io::Write;
//!
//! let dispatcher = CookieDispatcher::new(OffsetCookieReader::new(0));
//!
//! // One-shot: removed after the first matching reply
//! let mut flow_mod = CookieCell::default();
//! dispatcher.handle_func_once(&mut flow_mod, |rw, _req| {
//!     let _ = rw.write_all(b"flow installed");
//! });
//!
//! let reply = flow_mod.cookies().as_u64().to_be_bytes().to_vec();
//! let mut rw = ResponseBuffer::new();
//! dispatcher.serve(&mut rw, &mut Request::new(reply.clone()));
//! assert_eq!(rw.body, b"flow installed");
//!
//! // The entry is gone; a duplicate reply is dropped.
//! let mut rw = ResponseBuffer::new();
//! dispatcher.serve(&mut rw, &mut Request::new(reply));
//! assert!(rw.is_untouched());
//! ```
//!
//! ## Request Flow
//!
//! 1. The whole body is read into memory
//! 2. The reader decodes a cookie jar from the bytes
//! 3. The table is consulted; one-shot entries are evicted in the same critical section
//! 4. The body is restored and the handler is invoked
//!
//! ## Error Handling
//!
//! Nothing is reported to the peer:
//! - Body read errors, oversized bodies and decode errors drop the request
//! - Unknown cookies drop the request; this is the normal path for unsolicited messages
//! - Handler panics propagate to the caller of `serve`
//!
//! Every drop is counted in [`DispatchMetrics`] and passed to registered
//! [`DropObserver`]s.
//!
//! ## Concurrency
//!
//! The table sits behind a single `parking_lot::RwLock` that also guards the
//! cookie generator. No I/O happens under the lock and the lock is released
//! before the handler runs, so handlers may register or unregister cookies.

mod core;
mod observer;
mod table;

pub use core::CookieDispatcher;
pub use observer::{
    DispatchMetrics, DropObserver, DropReason, DroppedCounts, LoggingObserver, MetricsSnapshot,
};
pub use table::DispatchTable;
