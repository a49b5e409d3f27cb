//! Rate limiter: fixed-window counter.
//!
//! The read-increment-write is not atomic; under contention the counter may
//! under-count and let slightly more than `limit` requests through in a
//! window. This is accepted as intentional (a soft control), per
//! `DESIGN.md`'s Open Question #2 — not something to "fix" with a CAS loop.

use crate::cache::TtlCache;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use topup_core::error::{Error, Result};

/// Fixed-window rate limiter over arbitrary string keys.
#[derive(Default)]
pub struct RateLimiter {
    cache: TtlCache<u64>,
}

impl RateLimiter {
    /// Creates an empty limiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks and increments the counter for `key` in the current
    /// `window`-second bucket. Returns `(allowed, new_count)`.
    ///
    /// # Errors
    /// Returns [`Error::RateLimited`] if the window's counter is already at
    /// or above `limit`.
    pub fn check_and_increment(&self, key: &str, limit: u64, window: Duration) -> Result<u64> {
        let window_secs = window.as_secs().max(1);
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let bucket = now / window_secs;
        let window_key = format!("rate:{key}:{bucket}");

        let current = self.cache.get(&window_key).unwrap_or(0);
        if current >= limit {
            return Err(Error::rate_limited(key));
        }
        let new_count = current + 1;
        self.cache.insert(window_key, new_count, window * 2);
        Ok(new_count)
    }

    /// Clears the current window's counter for `key`, as if no requests had
    /// been made in it yet.
    pub fn reset(&self, key: &str, window: Duration) {
        let window_secs = window.as_secs().max(1);
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let bucket = now / window_secs;
        self.cache.remove(&format!("rate:{key}:{bucket}"));
    }
}
