use super::observer::{DispatchMetrics, DropObserver, DropReason};
use super::table::DispatchTable;
use crate::cookie::{CookieJar, CookieSource};
use crate::decoder::CookieReader;
use crate::ids::Cookie;
use crate::runtime_config::DispatchConfig;
use crate::server::{Body, Handler, HandlerFn, HandlerRef, Request, ResponseWriter};
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Routes replies to the handler registered for the cookie they carry.
///
/// Register a handler with [`handle`](Self::handle) (persistent) or
/// [`handle_once`](Self::handle_once) (removed after its first match). The
/// dispatcher writes a fresh cookie into the supplied jar; the caller puts
/// the jar on the wire. When a message comes back, [`serve`](Self::serve)
/// decodes its cookie and forwards it to the matching handler, or drops it.
///
/// Safe to share between workers: wrap it in an `Arc` and call `serve`
/// concurrently.
pub struct CookieDispatcher {
    reader: Arc<dyn CookieReader>,
    table: DispatchTable,
    metrics: Arc<DispatchMetrics>,
    observers: Vec<Arc<dyn DropObserver>>,
    max_body_bytes: Option<usize>,
}

impl CookieDispatcher {
    /// Dispatcher with a wall-clock seeded cookie source and no body limit.
    pub fn new<R: CookieReader + 'static>(reader: R) -> Self {
        Self::with_config(reader, &DispatchConfig::default())
    }

    pub fn with_config<R: CookieReader + 'static>(reader: R, config: &DispatchConfig) -> Self {
        let source = match config.seed {
            Some(seed) => CookieSource::with_seed(seed),
            None => CookieSource::new(),
        };
        debug!(
            seed = source.seed(),
            max_body_bytes = ?config.max_body_bytes,
            "Cookie dispatcher created"
        );
        Self {
            reader: Arc::new(reader),
            table: DispatchTable::with_source(source),
            metrics: Arc::new(DispatchMetrics::new()),
            observers: Vec::new(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Add an observer notified of every dropped request.
    ///
    /// Observers run in the order they were added.
    pub fn add_observer(&mut self, observer: Arc<dyn DropObserver>) {
        self.observers.push(observer);
    }

    /// Register a persistent handler under a fresh cookie written into `jar`.
    ///
    /// The entry stays until [`unhandle`](Self::unhandle) is called.
    pub fn handle<J, H>(&self, jar: &mut J, handler: H) -> Cookie
    where
        J: CookieJar + ?Sized,
        H: Handler + 'static,
    {
        self.register(jar, Arc::new(handler), false)
    }

    /// [`handle`](Self::handle) for a plain closure.
    pub fn handle_func<J, F>(&self, jar: &mut J, f: F) -> Cookie
    where
        J: CookieJar + ?Sized,
        F: Fn(&mut dyn ResponseWriter, &mut Request) + Send + Sync + 'static,
    {
        self.handle(jar, HandlerFn(f))
    }

    /// Register a handler that is removed the first time it matches.
    ///
    /// A reply that never arrives leaves the entry in place; pair this with
    /// a timeout that calls [`unhandle`](Self::unhandle).
    pub fn handle_once<J, H>(&self, jar: &mut J, handler: H) -> Cookie
    where
        J: CookieJar + ?Sized,
        H: Handler + 'static,
    {
        self.register(jar, Arc::new(handler), true)
    }

    /// [`handle_once`](Self::handle_once) for a plain closure.
    pub fn handle_func_once<J, F>(&self, jar: &mut J, f: F) -> Cookie
    where
        J: CookieJar + ?Sized,
        F: Fn(&mut dyn ResponseWriter, &mut Request) + Send + Sync + 'static,
    {
        self.handle_once(jar, HandlerFn(f))
    }

    fn register<J: CookieJar + ?Sized>(
        &self,
        jar: &mut J,
        handler: HandlerRef,
        one_shot: bool,
    ) -> Cookie {
        let (cookie, displaced) = self.table.register_fresh(handler, one_shot);
        jar.set_cookies(cookie);
        self.record_registration(cookie, one_shot, displaced.is_some());
        cookie
    }

    /// Register under a caller-chosen cookie, replacing any existing entry.
    ///
    /// Used when the cookie is dictated by the peer or restored from
    /// elsewhere. Returns the handler that was displaced.
    pub fn handle_cookie<H: Handler + 'static>(
        &self,
        cookie: Cookie,
        handler: H,
        one_shot: bool,
    ) -> Option<HandlerRef> {
        let displaced = self.table.register(cookie, Arc::new(handler), one_shot);
        self.record_registration(cookie, one_shot, displaced.is_some());
        displaced
    }

    fn record_registration(&self, cookie: Cookie, one_shot: bool, replaced: bool) {
        self.metrics.record_registered(replaced);
        if replaced {
            warn!(
                cookie = %cookie,
                one_shot,
                total_handlers = self.table.len(),
                "Replaced existing cookie handler"
            );
        } else {
            info!(
                cookie = %cookie,
                one_shot,
                total_handlers = self.table.len(),
                "Cookie handler registered"
            );
        }
    }

    /// Remove the handler registered under the jar's current cookie.
    ///
    /// Returns false when nothing was registered; calling it again is a no-op.
    pub fn unhandle<J: CookieJar + ?Sized>(&self, jar: &J) -> bool {
        let cookie = jar.cookies();
        let removed = self.table.unregister(cookie);
        if removed {
            self.metrics.record_unregistered();
            debug!(cookie = %cookie, "Cookie handler unregistered");
        }
        removed
    }

    /// Route `req` to the handler registered for its cookie.
    ///
    /// Returns nothing: unreadable, undecodable and unmatched requests are
    /// dropped without writing a response. The matched handler reads the
    /// body from the start. A panic in the handler is not caught here.
    pub fn serve(&self, rw: &mut dyn ResponseWriter, req: &mut Request) {
        let body = match self.read_body(req) {
            Ok(body) => body,
            Err(reason) => {
                self.drop_request(req, None, reason);
                return;
            }
        };

        let jar = match self.reader.read_cookie(&mut body.as_slice()) {
            Ok(jar) => jar,
            Err(err) => {
                debug!(
                    request_id = %req.request_id,
                    body_len = body.len(),
                    error = %err,
                    "Cookie decode failed"
                );
                req.replace_body(body);
                self.drop_request(req, None, DropReason::Decode);
                return;
            }
        };
        let cookie = jar.cookies();

        let (handler, evicted) = match self.table.lookup_and_maybe_evict(cookie) {
            Some(found) => found,
            None => {
                req.replace_body(body);
                self.drop_request(req, Some(cookie), DropReason::NoMatch);
                return;
            }
        };

        self.metrics.record_dispatched(evicted);
        debug!(
            request_id = %req.request_id,
            cookie = %cookie,
            evicted,
            "Request dispatched to cookie handler"
        );

        req.replace_body(body);
        handler.serve(rw, req);
    }

    fn read_body(&self, req: &mut Request) -> Result<Vec<u8>, DropReason> {
        let mut body = Vec::new();
        let result = match self.max_body_bytes {
            // One byte past the limit is enough to tell an oversized body.
            Some(limit) => {
                Read::take(&mut req.body, (limit as u64).saturating_add(1)).read_to_end(&mut body)
            }
            None => req.body.read_to_end(&mut body),
        };

        if let Err(err) = result {
            debug!(
                request_id = %req.request_id,
                error = %err,
                "Request body read failed"
            );
            return Err(DropReason::BodyRead);
        }

        if let Some(limit) = self.max_body_bytes {
            if body.len() > limit {
                debug!(
                    request_id = %req.request_id,
                    limit,
                    "Request body exceeds limit"
                );
                // Put the consumed prefix back in front of the unread rest.
                let rest = req.replace_body(Body::empty());
                req.replace_body(Body::from_reader(Cursor::new(body).chain(rest)));
                return Err(DropReason::BodyTooLarge);
            }
        }

        Ok(body)
    }

    fn drop_request(&self, req: &mut Request, cookie: Option<Cookie>, reason: DropReason) {
        self.metrics.record_drop(reason);
        for observer in &self.observers {
            observer.dropped(req, cookie, reason);
        }
    }

    /// Counters for this dispatcher.
    #[must_use]
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// The underlying table, for inspection.
    #[must_use]
    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Handler for CookieDispatcher {
    fn serve(&self, rw: &mut dyn ResponseWriter, req: &mut Request) {
        CookieDispatcher::serve(self, rw, req)
    }
}

impl std::fmt::Debug for CookieDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieDispatcher")
            .field("table", &self.table)
            .field("observers", &self.observers.len())
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}
