use super::{Request, ResponseWriter};
use std::sync::Arc;

/// Anything that can consume a request and produce a response.
///
/// Handlers are shared between the dispatch table and whichever worker is
/// serving a request, so they take `&self` and must be `Send + Sync`.
pub trait Handler: Send + Sync {
    fn serve(&self, rw: &mut dyn ResponseWriter, req: &mut Request);
}

/// Shared handle to a registered handler.
pub type HandlerRef = Arc<dyn Handler>;

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn serve(&self, rw: &mut dyn ResponseWriter, req: &mut Request) {
        (**self).serve(rw, req)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn serve(&self, rw: &mut dyn ResponseWriter, req: &mut Request) {
        (**self).serve(rw, req)
    }
}

/// Adapter that lets an ordinary closure act as a [`Handler`].
#[derive(Clone)]
pub struct HandlerFn<F>(pub F);

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut dyn ResponseWriter, &mut Request) + Send + Sync,
{
    fn serve(&self, rw: &mut dyn ResponseWriter, req: &mut Request) {
        (self.0)(rw, req)
    }
}

/// Wrap a closure as a [`Handler`].
///
/// ```rust
/// use cookie_dispatch::server::{handler_fn, Handler, Request, ResponseBuffer};
/// use std::io::Write;
///
/// let echo = handler_fn(|rw, req| {
///     let body = req.body.read_all().unwrap_or_default();
///     let _ = rw.write_all(&body);
/// });
///
/// let mut rw = ResponseBuffer::new();
/// echo.serve(&mut rw, &mut Request::new(b"ping".to_vec()));
/// assert_eq!(rw.body, b"ping");
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut dyn ResponseWriter, &mut Request) + Send + Sync,
{
    HandlerFn(f)
}
