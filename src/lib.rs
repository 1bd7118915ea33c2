//! # cookie-dispatch
//!
//! **cookie-dispatch** routes protocol replies to the handler that is waiting
//! for them, using an opaque 64-bit correlation token ("cookie") that the
//! request carried out and the reply carries back.
//!
//! ## Overview
//!
//! A controller speaking a request/reply protocol (OpenFlow is the motivating
//! case) often needs to react to the reply of one specific request: "this
//! flow-removed message belongs to the flow-mod I sent earlier". Instead of
//! tracking full conversation state, the controller asks the dispatcher for a
//! fresh cookie, stamps it on the outgoing request, and registers a handler
//! under it. Replies echo the cookie; the dispatcher decodes it, looks up the
//! handler, and forwards the reply. Messages nobody is waiting for are dropped.
//!
//! ## Architecture
//!
//! - **[`ids`]** - [`Cookie`] and per-request [`RequestId`]
//! - **[`cookie`]** - cookie carriers ([`CookieJar`]) and the seeded generator
//! - **[`decoder`]** - extracting a cookie from a raw body ([`CookieReader`])
//! - **[`dispatcher`]** - the cookie table and the serve algorithm ([`CookieDispatcher`])
//! - **[`server`]** - request, response sink and [`Handler`] capabilities
//! - **[`worker_pool`]** - a coroutine pool that drives any handler concurrently
//! - **[`runtime_config`]** / **[`otel`]** - environment configuration and logging setup
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Ctl as Controller
//!     participant D as CookieDispatcher
//!     participant Peer
//!     Ctl->>D: handle_once(&mut flow_mod, handler)
//!     D-->>Ctl: cookie written into flow_mod
//!     Ctl->>Peer: flow_mod (cookie)
//!     Peer-->>D: reply (cookie)
//!     D->>D: decode, lookup, evict
//!     D->>Ctl: handler.serve(rw, reply)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use cookie_dispatch::{CookieCell, CookieDispatcher, CookieJar, OffsetCookieReader};
//! use cookie_dispatch::server::{Request, ResponseBuffer};
//! use std::io::Write;
//!
//! let dispatcher = CookieDispatcher::new(OffsetCookieReader::after_openflow_header());
//!
//! let mut stats_request = CookieCell::default();
//! dispatcher.handle_func(&mut stats_request, |rw, req| {
//!     let body = req.body.read_all().unwrap_or_default();
//!     let _ = write!(rw, "{} bytes of stats", body.len());
//! });
//!
//! // An 8-byte header followed by the echoed cookie.
//! let mut reply = vec![4, 19, 0, 16, 0, 0, 0, 7];
//! reply.extend_from_slice(&stats_request.cookies().as_u64().to_be_bytes());
//!
//! let mut rw = ResponseBuffer::new();
//! dispatcher.serve(&mut rw, &mut Request::new(reply));
//! assert_eq!(rw.body, b"16 bytes of stats");
//! ```
//!
//! ## Guarantees
//!
//! - A one-shot handler runs at most once, even when duplicate replies race
//! - A persistent handler runs for every matching reply until unregistered
//! - The matched handler reads the full original body
//! - The dispatcher never writes a response itself
//!
//! There is no expiry: a one-shot handler whose reply never arrives stays
//! registered until the caller unregisters it.

pub mod cookie;
pub mod decoder;
pub mod dispatcher;
pub mod ids;
pub mod otel;
pub mod runtime_config;
pub mod server;
pub mod worker_pool;

pub use cookie::{CookieCell, CookieJar, CookieSource};
pub use decoder::{CookieReader, CookieReaderFn, OffsetCookieReader};
pub use dispatcher::{CookieDispatcher, DispatchMetrics, DispatchTable, DropObserver, DropReason};
pub use ids::{Cookie, RequestId};
pub use runtime_config::DispatchConfig;
pub use server::{handler_fn, Handler, HandlerFn, HandlerRef, Request, ResponseBuffer, ResponseWriter};
