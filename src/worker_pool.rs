//! # Worker Pool Module
//!
//! A minimal serving loop for embedding a [`Handler`] (usually a
//! [`CookieDispatcher`](crate::dispatcher::CookieDispatcher)) in a protocol
//! server: N `may` coroutines share one queue of inbound exchanges and call
//! [`Handler::serve`] on each.
//!
//! ## Features
//!
//! - **Worker Pools**: N coroutines serve requests concurrently, in no particular order
//! - **Unbounded Queue**: `may` MPSC channel shared by all workers
//! - **Panic Isolation**: a panicking handler is caught and counted; the worker keeps going
//! - **Metrics**: submitted, completed and panicked counts plus approximate queue depth
//!
//! ## Configuration
//!
//! - `COOKIE_DISPATCH_WORKERS`: Number of worker coroutines (default: 4)
//! - `COOKIE_DISPATCH_STACK_SIZE`: Coroutine stack size, decimal or hex (default: 0x10000)

use crate::runtime_config::parse_number;
use crate::server::{Handler, Request, ResponseWriter};
use may::coroutine::JoinHandle;
use may::sync::mpsc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

pub const ENV_WORKERS: &str = "COOKIE_DISPATCH_WORKERS";
pub const ENV_STACK_SIZE: &str = "COOKIE_DISPATCH_STACK_SIZE";

/// One inbound message and the sink its response goes to.
pub struct Exchange {
    pub request: Request,
    pub writer: Box<dyn ResponseWriter>,
}

impl Exchange {
    pub fn new<W: ResponseWriter + 'static>(request: Request, writer: W) -> Self {
        Self {
            request,
            writer: Box::new(writer),
        }
    }
}

/// Configuration for a serve pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServePoolConfig {
    /// Number of worker coroutines
    pub num_workers: usize,
    /// Stack size for worker coroutines
    pub stack_size: usize,
}

impl ServePoolConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let num_workers = std::env::var(ENV_WORKERS)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(defaults.num_workers);

        let stack_size = std::env::var(ENV_STACK_SIZE)
            .ok()
            .and_then(|s| parse_number(&s))
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(defaults.stack_size);

        Self {
            num_workers,
            stack_size,
        }
    }

    pub fn new(num_workers: usize, stack_size: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
            stack_size,
        }
    }
}

impl Default for ServePoolConfig {
    fn default() -> Self {
        Self {
            num_workers: 4,
            stack_size: 0x10000, // 64KB
        }
    }
}

/// Metrics for a serve pool
#[derive(Debug, Default)]
pub struct ServePoolMetrics {
    submitted: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
    queue_depth: AtomicUsize,
}

impl ServePoolMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_submit(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_add(1, Ordering::Relaxed);
    }

    fn record_rejected(&self) {
        self.submitted.fetch_sub(1, Ordering::Relaxed);
        self.queue_depth.fetch_sub(1, Ordering::Relaxed);
    }

    fn record_completion(&self, panicked: bool) {
        if panicked {
            self.panicked.fetch_add(1, Ordering::Relaxed);
        }
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_sub(1, Ordering::Relaxed);
    }

    /// Exchanges accepted by `submit`
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Exchanges fully served, including those whose handler panicked
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Exchanges whose handler panicked
    pub fn panicked(&self) -> u64 {
        self.panicked.load(Ordering::Relaxed)
    }

    /// Submitted but not yet completed (approximate)
    pub fn queue_depth(&self) -> usize {
        self.queue_depth.load(Ordering::Relaxed)
    }
}

/// A pool of coroutines serving exchanges through one shared handler
pub struct ServePool {
    config: ServePoolConfig,
    sender: mpsc::Sender<Exchange>,
    metrics: Arc<ServePoolMetrics>,
    workers: Vec<JoinHandle<()>>,
    name: String,
}

impl ServePool {
    /// Spawn the worker coroutines.
    ///
    /// # Safety
    ///
    /// This function is marked unsafe because it spawns coroutines using `may::coroutine::Builder::spawn()`,
    /// which is unsafe in the `may` runtime. The caller must ensure the May coroutine runtime is properly
    /// initialized and that the handler does not block the worker on thread-local state.
    pub unsafe fn new(name: &str, config: ServePoolConfig, handler: Arc<dyn Handler>) -> Self {
        let (tx, rx) = mpsc::channel::<Exchange>();
        let rx = Arc::new(rx);
        let metrics = Arc::new(ServePoolMetrics::new());
        let name = name.to_string();

        info!(
            pool_name = %name,
            num_workers = config.num_workers,
            stack_size = config.stack_size,
            "Creating serve pool"
        );

        let mut workers = Vec::with_capacity(config.num_workers);
        for worker_id in 0..config.num_workers {
            let rx = Arc::clone(&rx);
            let handler = Arc::clone(&handler);
            let metrics = Arc::clone(&metrics);
            let pool_name = name.clone();

            let spawn_result = may::coroutine::Builder::new()
                .name(format!("{name}-{worker_id}"))
                .stack_size(config.stack_size)
                .spawn(move || {
                    debug!(pool_name = %pool_name, worker_id, "Worker coroutine started");

                    while let Ok(mut exchange) = rx.recv() {
                        let request_id = exchange.request.request_id;
                        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                            handler.serve(exchange.writer.as_mut(), &mut exchange.request);
                        }));

                        if let Err(panic) = &outcome {
                            error!(
                                pool_name = %pool_name,
                                worker_id,
                                request_id = %request_id,
                                panic_message = ?panic,
                                "Handler panicked - CRITICAL"
                            );
                        }
                        metrics.record_completion(outcome.is_err());
                    }

                    debug!(pool_name = %pool_name, worker_id, "Worker coroutine exiting");
                });

            match spawn_result {
                Ok(handle) => workers.push(handle),
                Err(e) => error!(
                    pool_name = %name,
                    worker_id,
                    error = %e,
                    "Failed to spawn worker coroutine"
                ),
            }
        }

        Self {
            config,
            sender: tx,
            metrics,
            workers,
            name,
        }
    }

    /// Queue an exchange for serving.
    ///
    /// Gives the exchange back if every worker has exited.
    pub fn submit(&self, exchange: Exchange) -> Result<(), Exchange> {
        let request_id = exchange.request.request_id;
        self.metrics.record_submit();

        if let Err(err) = self.sender.send(exchange) {
            self.metrics.record_rejected();
            error!(
                pool_name = %self.name,
                request_id = %request_id,
                "Serve pool channel disconnected"
            );
            return Err(err.0);
        }
        Ok(())
    }

    /// Close the queue and wait for every queued exchange to be served.
    pub fn shutdown(self) {
        let ServePool {
            sender,
            workers,
            name,
            ..
        } = self;
        drop(sender);
        for handle in workers {
            if handle.join().is_err() {
                error!(pool_name = %name, "Worker coroutine terminated abnormally");
            }
        }
        debug!(pool_name = %name, "Serve pool shut down");
    }

    /// Number of workers that were spawned successfully
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn metrics(&self) -> &Arc<ServePoolMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &ServePoolConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // These tests are affected by global env vars. Use a mutex to serialize access.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clean_env() {
        std::env::remove_var(ENV_WORKERS);
        std::env::remove_var(ENV_STACK_SIZE);
    }

    #[test]
    fn test_config_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clean_env();
        assert_eq!(ServePoolConfig::from_env(), ServePoolConfig::default());
    }

    #[test]
    fn test_config_from_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clean_env();
        std::env::set_var(ENV_WORKERS, "8");
        std::env::set_var(ENV_STACK_SIZE, "0x8000");
        let config = ServePoolConfig::from_env();
        clean_env();
        assert_eq!(config.num_workers, 8);
        assert_eq!(config.stack_size, 0x8000);
    }

    #[test]
    fn test_config_rejects_zero_workers() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clean_env();
        std::env::set_var(ENV_WORKERS, "0");
        let config = ServePoolConfig::from_env();
        clean_env();
        assert_eq!(config.num_workers, 4);
        assert_eq!(ServePoolConfig::new(0, 4096).num_workers, 1);
    }

    #[test]
    fn test_metrics_bookkeeping() {
        let metrics = ServePoolMetrics::new();
        metrics.record_submit();
        metrics.record_submit();
        metrics.record_completion(false);
        metrics.record_completion(true);
        assert_eq!(metrics.submitted(), 2);
        assert_eq!(metrics.completed(), 2);
        assert_eq!(metrics.panicked(), 1);
        assert_eq!(metrics.queue_depth(), 0);
    }
}
