//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for a [`CookieDispatcher`](crate::dispatcher::CookieDispatcher).
//!
//! ## Environment Variables
//!
//! ### `COOKIE_DISPATCH_SEED`
//!
//! Fixed seed for the cookie generator. Accepts decimal (`1234`) or
//! hexadecimal (`0x4d2`). Unset means a wall-clock seed.
//!
//! A fixed seed makes cookie sequences reproducible across runs, which is
//! useful when replaying captured traffic. Two processes sharing a seed
//! produce the same cookies, so never set it in production deployments that
//! talk to the same peer.
//!
//! ### `COOKIE_DISPATCH_MAX_BODY_BYTES`
//!
//! Upper bound on the body size the dispatcher reads before decoding.
//! Larger bodies are dropped. Decimal or hexadecimal; `0` or unset means
//! no limit.
//!
//! ## Usage
//!
//! ```rust
//! use cookie_dispatch::runtime_config::DispatchConfig;
//!
//! let config = DispatchConfig::from_env();
//! println!("Seed: {:?}", config.seed);
//! ```
//!
//! Invalid values fall back to the defaults.

use std::env;

pub const ENV_SEED: &str = "COOKIE_DISPATCH_SEED";
pub const ENV_MAX_BODY_BYTES: &str = "COOKIE_DISPATCH_MAX_BODY_BYTES";

/// Dispatcher configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Cookie generator seed (default: wall clock)
    pub seed: Option<u64>,
    /// Maximum body size in bytes (default: unlimited)
    pub max_body_bytes: Option<usize>,
}

impl DispatchConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let seed = env::var(ENV_SEED).ok().and_then(|v| parse_number(&v));
        let max_body_bytes = env::var(ENV_MAX_BODY_BYTES)
            .ok()
            .and_then(|v| parse_number(&v))
            .filter(|&n| n > 0)
            .and_then(|n| usize::try_from(n).ok());
        DispatchConfig {
            seed,
            max_body_bytes,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Cap the body size; `0` means no limit, as with the environment variable.
    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = (limit > 0).then_some(limit);
        self
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal number.
pub(crate) fn parse_number(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}
