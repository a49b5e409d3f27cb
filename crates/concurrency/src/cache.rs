//! A minimal in-process TTL cache backing the Safety Kernel.
//!
//! The kernel is a thin façade over a shared key/value cache with TTL — in
//! a real deployment that cache would be external (Redis or similar) so the
//! kernel's guarantees hold across processes; here it is realized as a
//! single `DashMap` shared within one process, the same pattern a
//! per-branch commit-lock manager would use internally. Swapping in a real
//! external cache is a deployment concern, not a change to the kernel's
//! API.

use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A string-keyed cache where every entry carries its own expiry.
pub struct TtlCache<V> {
    map: DashMap<String, Entry<V>>,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        TtlCache { map: DashMap::new() }
    }
}

impl<V: Clone> TtlCache<V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the value stored at `key`, if present and not yet
    /// expired. An expired entry is treated as absent but is not eagerly
    /// removed (removal happens on the next write to that key, or via
    /// [`TtlCache::sweep`]).
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.map.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Inserts `value` at `key` with the given time-to-live, overwriting any
    /// existing entry unconditionally.
    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.map.insert(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Inserts `value` at `key` only if no live (non-expired) entry is
    /// currently present. Returns `true` if the insert happened.
    pub fn insert_if_absent(&self, key: impl Into<String>, value: V, ttl: Duration) -> bool {
        let key = key.into();
        let now = Instant::now();
        match self.map.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(occ) if occ.get().expires_at > now => false,
            dashmap::mapref::entry::Entry::Occupied(mut occ) => {
                occ.insert(Entry {
                    value,
                    expires_at: now + ttl,
                });
                true
            }
            dashmap::mapref::entry::Entry::Vacant(vac) => {
                vac.insert(Entry {
                    value,
                    expires_at: now + ttl,
                });
                true
            }
        }
    }

    /// Removes `key` unconditionally, returning the previous value if it was
    /// still live.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.map.remove(key).and_then(|(_, entry)| {
            if entry.expires_at > Instant::now() {
                Some(entry.value)
            } else {
                None
            }
        })
    }

    /// True if `key` holds a live entry.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Drops all expired entries. Not required for correctness (expired
    /// entries are transparently ignored by `get`/`contains`) but keeps
    /// long-running processes from accumulating dead rows.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of entries currently stored, including any not-yet-swept
    /// expired ones.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True if the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
