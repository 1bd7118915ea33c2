use crate::ids::Cookie;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Cookies are drawn from the low 63 bits so peers that store the field as a
/// signed integer still see a non-negative value.
const COOKIE_MASK: u64 = u64::MAX >> 1;

/// Mixed into time-derived seeds so two sources built in the same
/// nanosecond diverge.
static SEED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A protocol object that can hold a correlation cookie.
///
/// The dispatcher assigns the cookie value; the caller owns the object and
/// decides when it goes on the wire.
pub trait CookieJar {
    /// Store `cookie` in the object.
    fn set_cookies(&mut self, cookie: Cookie);

    /// The cookie currently held.
    fn cookies(&self) -> Cookie;
}

impl<J: CookieJar + ?Sized> CookieJar for Box<J> {
    fn set_cookies(&mut self, cookie: Cookie) {
        (**self).set_cookies(cookie)
    }

    fn cookies(&self) -> Cookie {
        (**self).cookies()
    }
}

/// The simplest possible cookie carrier: just the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CookieCell(pub Cookie);

impl CookieCell {
    #[must_use]
    pub fn new(cookie: impl Into<Cookie>) -> Self {
        Self(cookie.into())
    }
}

impl CookieJar for CookieCell {
    fn set_cookies(&mut self, cookie: Cookie) {
        self.0 = cookie;
    }

    fn cookies(&self) -> Cookie {
        self.0
    }
}

/// Pseudo-random cookie generator.
///
/// Not cryptographic: cookies only need to be unique among the handlers
/// registered at any one time. Callers serialise access; the dispatch table
/// keeps its source behind the same lock as the handler map.
#[derive(Debug, Clone)]
pub struct CookieSource {
    rng: ChaCha8Rng,
    seed: u64,
}

impl CookieSource {
    /// Seed from the wall clock.
    #[must_use]
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        let salt = SEED_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::with_seed(nanos ^ salt.rotate_left(32))
    }

    /// Deterministic source, for reproducible tests and replays.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed this source was built from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw the next cookie. Never returns [`Cookie::NONE`].
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Cookie {
        loop {
            let value = self.rng.next_u64() & COOKIE_MASK;
            if value != 0 {
                return Cookie(value);
            }
        }
    }
}

impl Default for CookieSource {
    fn default() -> Self {
        Self::new()
    }
}
