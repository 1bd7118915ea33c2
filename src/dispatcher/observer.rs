use crate::ids::Cookie;
use crate::server::Request;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, trace, warn, Level};

/// Why the dispatcher dropped a request without invoking a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Reading the body failed
    BodyRead,
    /// Body exceeded the configured limit
    BodyTooLarge,
    /// The decoder could not extract a cookie
    Decode,
    /// No handler is registered for the cookie
    NoMatch,
}

impl DropReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::BodyRead => "body_read",
            DropReason::BodyTooLarge => "body_too_large",
            DropReason::Decode => "decode",
            DropReason::NoMatch => "no_match",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notified every time the dispatcher drops a request.
///
/// Observers see the request after the dispatcher is done with it. Every
/// byte the dispatcher consumed has been put back, including for oversized
/// bodies, so an observer reads the message from the start. After a
/// `BodyRead` failure the body is whatever the failing reader left. Observers must not treat the drop as a failure to respond:
/// dropping is the normal outcome for unsolicited messages.
pub trait DropObserver: Send + Sync {
    fn dropped(&self, req: &mut Request, cookie: Option<Cookie>, reason: DropReason);
}

/// Logs each drop through `tracing`.
#[derive(Debug, Clone, Copy)]
pub struct LoggingObserver {
    level: Level,
}

impl LoggingObserver {
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new(Level::DEBUG)
    }
}

impl DropObserver for LoggingObserver {
    fn dropped(&self, req: &mut Request, cookie: Option<Cookie>, reason: DropReason) {
        let cookie = cookie.map(|c| c.to_string());
        let request_id = req.request_id;
        match self.level {
            Level::TRACE => trace!(%request_id, ?cookie, %reason, "Request dropped"),
            Level::DEBUG => debug!(%request_id, ?cookie, %reason, "Request dropped"),
            Level::INFO => info!(%request_id, ?cookie, %reason, "Request dropped"),
            _ => warn!(%request_id, ?cookie, %reason, "Request dropped"),
        }
    }
}

/// Counters kept by every dispatcher.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    registered: AtomicU64,
    replaced: AtomicU64,
    unregistered: AtomicU64,
    dispatched: AtomicU64,
    evicted: AtomicU64,
    dropped_body_read: AtomicU64,
    dropped_body_too_large: AtomicU64,
    dropped_decode: AtomicU64,
    dropped_no_match: AtomicU64,
}

impl DispatchMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_registered(&self, replaced: bool) {
        self.registered.fetch_add(1, Ordering::Relaxed);
        if replaced {
            self.replaced.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_unregistered(&self) {
        self.unregistered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatched(&self, evicted: bool) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
        if evicted {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_drop(&self, reason: DropReason) {
        let counter = match reason {
            DropReason::BodyRead => &self.dropped_body_read,
            DropReason::BodyTooLarge => &self.dropped_body_too_large,
            DropReason::Decode => &self.dropped_decode,
            DropReason::NoMatch => &self.dropped_no_match,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Total requests handed to a handler.
    #[must_use]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Drops for a single reason.
    #[must_use]
    pub fn dropped(&self, reason: DropReason) -> u64 {
        match reason {
            DropReason::BodyRead => self.dropped_body_read.load(Ordering::Relaxed),
            DropReason::BodyTooLarge => self.dropped_body_too_large.load(Ordering::Relaxed),
            DropReason::Decode => self.dropped_decode.load(Ordering::Relaxed),
            DropReason::NoMatch => self.dropped_no_match.load(Ordering::Relaxed),
        }
    }

    /// Point-in-time copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            registered: self.registered.load(Ordering::Relaxed),
            replaced: self.replaced.load(Ordering::Relaxed),
            unregistered: self.unregistered.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            dropped: DroppedCounts {
                body_read: self.dropped(DropReason::BodyRead),
                body_too_large: self.dropped(DropReason::BodyTooLarge),
                decode: self.dropped(DropReason::Decode),
                no_match: self.dropped(DropReason::NoMatch),
            },
        }
    }
}

/// Serializable view of [`DispatchMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub registered: u64,
    pub replaced: u64,
    pub unregistered: u64,
    pub dispatched: u64,
    pub evicted: u64,
    pub dropped: DroppedCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DroppedCounts {
    pub body_read: u64,
    pub body_too_large: u64,
    pub decode: u64,
    pub no_match: u64,
}

impl MetricsSnapshot {
    #[must_use]
    pub fn total_dropped(&self) -> u64 {
        self.dropped.body_read
            + self.dropped.body_too_large
            + self.dropped.decode
            + self.dropped.no_match
    }

    /// JSON rendering for status endpoints.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_drop_counters_are_per_reason() {
        let metrics = DispatchMetrics::new();
        metrics.record_drop(DropReason::NoMatch);
        metrics.record_drop(DropReason::NoMatch);
        metrics.record_drop(DropReason::Decode);

        assert_eq!(metrics.dropped(DropReason::NoMatch), 2);
        assert_eq!(metrics.dropped(DropReason::Decode), 1);
        assert_eq!(metrics.dropped(DropReason::BodyRead), 0);
        assert_eq!(metrics.snapshot().total_dropped(), 3);
    }

    #[test]
    fn test_eviction_counts_as_dispatch() {
        let metrics = DispatchMetrics::new();
        metrics.record_dispatched(true);
        metrics.record_dispatched(false);
        let snap = metrics.snapshot();
        assert_eq!(snap.dispatched, 2);
        assert_eq!(snap.evicted, 1);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let metrics = DispatchMetrics::new();
        metrics.record_registered(false);
        metrics.record_registered(true);
        metrics.record_unregistered();
        metrics.record_drop(DropReason::BodyTooLarge);

        assert_eq!(
            metrics.snapshot().to_json(),
            json!({
                "registered": 2,
                "replaced": 1,
                "unregistered": 1,
                "dispatched": 0,
                "evicted": 0,
                "dropped": {
                    "body_read": 0,
                    "body_too_large": 1,
                    "decode": 0,
                    "no_match": 0
                }
            })
        );
    }

    #[test]
    fn test_drop_reason_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(DropReason::BodyTooLarge).unwrap(),
            json!("body_too_large")
        );
        assert_eq!(DropReason::NoMatch.to_string(), "no_match");
    }
}
