//! Distributed lock: cross-process serialization for otherwise-concurrent
//! money mutations.
//!
//! The lock is a performance tool, not a correctness tool — correctness
//! comes from the vendor row's `version` guard. This lock only reduces
//! contention by serializing same-vendor attempts before they reach the
//! row lock.

use crate::cache::TtlCache;
use rand::Rng;
use std::thread;
use std::time::{Duration, Instant};
use topup_core::error::{Error, Result};

/// Default lock lease and the default acquisition timeout (30s).
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(30);

/// Spin-wait poll interval while acquiring a lock.
const SPIN_INTERVAL: Duration = Duration::from_millis(1);

/// A guard identifier returned by [`DistributedLock::acquire`], required to
/// release the same lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockIdentifier(String);

/// A cross-process mutual-exclusion primitive over string keys, backed by a
/// shared TTL cache.
#[derive(Default)]
pub struct DistributedLock {
    cache: TtlCache<String>,
}

impl DistributedLock {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to acquire `key`, spinning at 1ms granularity until it
    /// succeeds or `timeout` elapses.
    ///
    /// # Errors
    /// Returns [`Error::SystemBusy`] if `timeout` elapses before the lock
    /// becomes available.
    pub fn acquire(&self, key: &str, timeout: Duration) -> Result<LockIdentifier> {
        let identifier = generate_identifier();
        let lock_key = format!("lock:{key}");
        let deadline = Instant::now() + timeout;
        loop {
            if self
                .cache
                .insert_if_absent(lock_key.clone(), identifier.clone(), DEFAULT_LOCK_TTL)
            {
                return Ok(LockIdentifier(identifier));
            }
            if Instant::now() >= deadline {
                return Err(Error::system_busy(key, timeout.as_millis() as u64));
            }
            thread::sleep(SPIN_INTERVAL);
        }
    }

    /// Releases `key` if and only if `identifier` matches the identifier
    /// currently stored for it.
    ///
    /// This is a read followed by a conditional remove, not a single atomic
    /// primitive: a production deployment on an external cache should use
    /// an atomic compare-and-delete, e.g. Lua-scripted on Redis. This
    /// in-process realization does not need one for safety since a single
    /// process serializes its own `DashMap` operations, but the
    /// get-then-delete shape is kept so the contract matches what a
    /// multi-process deployment actually requires.
    pub fn release(&self, key: &str, identifier: &LockIdentifier) {
        let lock_key = format!("lock:{key}");
        if self.cache.get(&lock_key).as_deref() == Some(identifier.0.as_str()) {
            self.cache.remove(&lock_key);
        }
    }

    /// True if `key` is currently held by anyone.
    pub fn is_locked(&self, key: &str) -> bool {
        self.cache.contains(&format!("lock:{key}"))
    }

    /// Acquires `key` and returns an RAII guard that releases it on drop —
    /// the Rust idiom for a try/finally release guarantee: the lock is
    /// always released once the guard goes out of scope, success or error.
    pub fn acquire_guard<'a>(&'a self, key: &str, timeout: Duration) -> Result<LockGuard<'a>> {
        let identifier = self.acquire(key, timeout)?;
        Ok(LockGuard {
            lock: self,
            key: key.to_string(),
            identifier: Some(identifier),
        })
    }
}

/// Releases its lock key when dropped, including on an early return via `?`.
pub struct LockGuard<'a> {
    lock: &'a DistributedLock,
    key: String,
    identifier: Option<LockIdentifier>,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Some(identifier) = self.identifier.take() {
            self.lock.release(&self.key, &identifier);
        }
    }
}

fn generate_identifier() -> String {
    let thread_id = format!("{:?}", thread::current().id());
    let mut rng = rand::thread_rng();
    let suffix: String = (0..8)
        .map(|_| std::char::from_digit(rng.gen_range(0..16), 16).unwrap())
        .collect();
    format!("{thread_id}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_release_roundtrip() {
        let lock = DistributedLock::new();
        let id = lock.acquire("vendor_1", Duration::from_millis(100)).unwrap();
        assert!(lock.is_locked("vendor_1"));
        lock.release("vendor_1", &id);
        assert!(!lock.is_locked("vendor_1"));
    }

    #[test]
    fn second_acquire_times_out_while_held() {
        let lock = DistributedLock::new();
        let _id = lock.acquire("vendor_1", Duration::from_millis(100)).unwrap();
        let err = lock.acquire("vendor_1", Duration::from_millis(20)).unwrap_err();
        assert_eq!(err.kind(), topup_core::error::ErrorKind::SystemBusy);
    }

    #[test]
    fn release_with_wrong_identifier_is_a_no_op() {
        let lock = DistributedLock::new();
        let id = lock.acquire("vendor_1", Duration::from_millis(100)).unwrap();
        let bogus = LockIdentifier("not-the-owner".to_string());
        lock.release("vendor_1", &bogus);
        assert!(lock.is_locked("vendor_1"));
        lock.release("vendor_1", &id);
        assert!(!lock.is_locked("vendor_1"));
    }

    #[test]
    fn concurrent_acquirers_serialize() {
        use std::sync::Arc;
        let lock = Arc::new(DistributedLock::new());
        let counter = Arc::new(std::sync::atomic::AtomicU64::new(0));
        std::thread::scope(|s| {
            for _ in 0..8 {
                let lock = Arc::clone(&lock);
                let counter = Arc::clone(&counter);
                s.spawn(move || {
                    let id = lock.acquire("shared", Duration::from_secs(2)).unwrap();
                    let before = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    assert_eq!(before, 0, "no two holders should be inside the critical section");
                    thread::sleep(Duration::from_millis(5));
                    counter.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
                    lock.release("shared", &id);
                });
            }
        });
    }
}
