//! # Server Module
//!
//! The transport capabilities the dispatcher is built against: a request with
//! a readable, replaceable body, a writable response sink, and the
//! [`Handler`] trait tying them together.
//!
//! The embedding protocol server owns the actual connections and message
//! framing. It constructs a [`Request`] per inbound message and calls
//! [`Handler::serve`] on whatever sits at the top of its handler chain,
//! typically a [`CookieDispatcher`](crate::dispatcher::CookieDispatcher).

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{handler_fn, Handler, HandlerFn, HandlerRef};
pub use request::{Body, Request};
pub use response::{ResponseBuffer, ResponseWriter};
