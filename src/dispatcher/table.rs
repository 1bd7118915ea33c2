//! Cookie → handler registry.
//!
//! One lock guards both the handler map and the cookie source, so drawing a
//! fresh cookie and registering under it is a single critical section.
//! Lookups that may evict a one-shot entry take the write lock: two requests
//! racing on the same one-shot cookie must not both see the handler.

use crate::cookie::CookieSource;
use crate::ids::Cookie;
use crate::server::HandlerRef;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

struct FilterEntry {
    handler: HandlerRef,
    evictable: bool,
}

struct TableState {
    source: CookieSource,
    entries: HashMap<Cookie, FilterEntry>,
}

/// Concurrency-safe registry of cookie handlers.
pub struct DispatchTable {
    state: RwLock<TableState>,
}

impl DispatchTable {
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(CookieSource::new())
    }

    #[must_use]
    pub fn with_source(source: CookieSource) -> Self {
        Self {
            state: RwLock::new(TableState {
                source,
                entries: HashMap::new(),
            }),
        }
    }

    /// Insert or overwrite the entry for `cookie`.
    ///
    /// Last registration wins; the displaced handler is returned.
    pub fn register(
        &self,
        cookie: Cookie,
        handler: HandlerRef,
        one_shot: bool,
    ) -> Option<HandlerRef> {
        let mut state = self.state.write();
        state
            .entries
            .insert(
                cookie,
                FilterEntry {
                    handler,
                    evictable: one_shot,
                },
            )
            .map(|old| old.handler)
    }

    /// Draw a fresh cookie and register `handler` under it.
    ///
    /// Also returns the handler displaced by a cookie collision, if any.
    pub fn register_fresh(
        &self,
        handler: HandlerRef,
        one_shot: bool,
    ) -> (Cookie, Option<HandlerRef>) {
        let mut state = self.state.write();
        let cookie = state.source.next();
        let displaced = state
            .entries
            .insert(
                cookie,
                FilterEntry {
                    handler,
                    evictable: one_shot,
                },
            )
            .map(|old| old.handler);
        (cookie, displaced)
    }

    /// Remove the entry for `cookie`. Returns false if there was none.
    pub fn unregister(&self, cookie: Cookie) -> bool {
        self.state.write().entries.remove(&cookie).is_some()
    }

    /// Find the handler for `cookie`, removing the entry if it is one-shot.
    ///
    /// The second element is true when the entry was evicted.
    pub fn lookup_and_maybe_evict(&self, cookie: Cookie) -> Option<(HandlerRef, bool)> {
        let mut state = self.state.write();
        let entry = state.entries.get(&cookie)?;
        if !entry.evictable {
            return Some((Arc::clone(&entry.handler), false));
        }
        state
            .entries
            .remove(&cookie)
            .map(|entry| (entry.handler, true))
    }

    #[must_use]
    pub fn contains(&self, cookie: Cookie) -> bool {
        self.state.read().entries.contains_key(&cookie)
    }

    /// `Some(true)` for a one-shot entry, `None` when unregistered.
    #[must_use]
    pub fn is_one_shot(&self, cookie: Cookie) -> Option<bool> {
        self.state.read().entries.get(&cookie).map(|e| e.evictable)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("DispatchTable")
            .field("entries", &state.entries.len())
            .field("seed", &state.source.seed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{handler_fn, Request, ResponseWriter};

    fn noop() -> HandlerRef {
        Arc::new(handler_fn(|_rw: &mut dyn ResponseWriter, _req: &mut Request| {}))
    }

    #[test]
    fn test_register_then_lookup() {
        let table = DispatchTable::with_source(CookieSource::with_seed(1));
        assert!(table.register(Cookie(5), noop(), false).is_none());
        assert!(table.contains(Cookie(5)));
        assert_eq!(table.is_one_shot(Cookie(5)), Some(false));

        let (_, evicted) = table.lookup_and_maybe_evict(Cookie(5)).unwrap();
        assert!(!evicted);
        assert!(table.contains(Cookie(5)));
    }

    #[test]
    fn test_one_shot_is_evicted_on_lookup() {
        let table = DispatchTable::new();
        table.register(Cookie(5), noop(), true);

        let (_, evicted) = table.lookup_and_maybe_evict(Cookie(5)).unwrap();
        assert!(evicted);
        assert!(table.lookup_and_maybe_evict(Cookie(5)).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_register_overwrites_and_returns_previous() {
        let table = DispatchTable::new();
        let first = noop();
        table.register(Cookie(9), Arc::clone(&first), true);
        let displaced = table.register(Cookie(9), noop(), false).unwrap();
        assert!(Arc::ptr_eq(&displaced, &first));
        assert_eq!(table.len(), 1);
        assert_eq!(table.is_one_shot(Cookie(9)), Some(false));
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let table = DispatchTable::new();
        table.register(Cookie(1), noop(), false);
        assert!(table.unregister(Cookie(1)));
        assert!(!table.unregister(Cookie(1)));
        assert!(!table.unregister(Cookie(2)));
        assert!(table.is_empty());
    }

    #[test]
    fn test_register_fresh_uses_seeded_source() {
        let table = DispatchTable::with_source(CookieSource::with_seed(77));
        let mut expected = CookieSource::with_seed(77);
        for _ in 0..16 {
            let (cookie, displaced) = table.register_fresh(noop(), false);
            assert_eq!(cookie, expected.next());
            assert!(displaced.is_none());
        }
        assert_eq!(table.len(), 16);
    }

    #[test]
    fn test_lookup_missing() {
        let table = DispatchTable::new();
        assert!(table.lookup_and_maybe_evict(Cookie(3)).is_none());
        assert_eq!(table.is_one_shot(Cookie(3)), None);
    }
}
