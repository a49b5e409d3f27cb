//! In-memory `Vendor` repository.
//!
//! A `DashMap` gives concurrent, independent access per key, with a
//! per-row guard providing the serialization a single key needs. Here the
//! per-row guard is a `parking_lot::Mutex<Vendor>` rather than a version
//! chain, since a vendor has exactly one current row (no branch/snapshot
//! history in this domain) and its own `version` field already does the
//! optimistic-concurrency job a version chain would otherwise provide.

use dashmap::DashMap;
use parking_lot::Mutex;
use topup_core::error::{Error, Result};
use topup_core::ids::VendorId;
use topup_core::traits::VendorRepository;
use topup_core::Vendor;

/// Concurrent in-memory table of vendor rows, one lock per vendor.
#[derive(Default)]
pub struct VendorStore {
    rows: DashMap<VendorId, Mutex<Vendor>>,
}

impl VendorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new vendor row. Intended for account creation (external
    /// to this spec) and test fixtures.
    ///
    /// # Errors
    /// Returns [`Error::Internal`] if `vendor.id` is already registered.
    pub fn insert(&self, vendor: Vendor) -> Result<()> {
        if self.rows.contains_key(&vendor.id) {
            return Err(Error::internal(format!("vendor {} already exists", vendor.id)));
        }
        self.rows.insert(vendor.id, Mutex::new(vendor));
        Ok(())
    }

    /// Snapshots every vendor row. Used by reconciliation, which needs to
    /// walk the whole book; ordinary money paths never need this.
    pub fn all(&self) -> Vec<Vendor> {
        self.rows.iter().map(|entry| entry.value().lock().clone()).collect()
    }
}

impl VendorRepository for VendorStore {
    fn get(&self, id: VendorId) -> Result<Vendor> {
        self.rows
            .get(&id)
            .map(|entry| entry.lock().clone())
            .ok_or_else(|| Error::vendor_not_found(id))
    }

    fn with_lock<R>(&self, id: VendorId, f: impl FnOnce(&mut Vendor) -> Result<R>) -> Result<R> {
        let entry = self.rows.get(&id).ok_or_else(|| Error::vendor_not_found(id))?;
        let mut guard = entry.lock();
        let mut scratch = guard.clone();
        let result = f(&mut scratch)?;
        *guard = scratch;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use topup_core::money::Money;
    use std::sync::Arc;

    fn sample(id: u64) -> Vendor {
        Vendor::new(VendorId::new(id), "acme", Money::from_major_minor(1_000_000, 0), Utc::now())
    }

    #[test]
    fn insert_and_get() {
        let store = VendorStore::new();
        store.insert(sample(1)).unwrap();
        let v = store.get(VendorId::new(1)).unwrap();
        assert_eq!(v.version, 1);
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = VendorStore::new();
        let err = store.get(VendorId::new(99)).unwrap_err();
        assert_eq!(err.kind(), topup_core::error::ErrorKind::NotFound);
    }

    #[test]
    fn with_lock_mutation_is_visible_afterwards() {
        let store = VendorStore::new();
        store.insert(sample(1)).unwrap();
        store
            .with_lock(VendorId::new(1), |v| {
                v.balance = Money::from_major_minor(50, 0);
                v.version += 1;
                Ok(())
            })
            .unwrap();
        let v = store.get(VendorId::new(1)).unwrap();
        assert_eq!(v.balance.to_string(), "50.00");
        assert_eq!(v.version, 2);
    }

    #[test]
    fn errored_closure_leaves_row_untouched() {
        let store = VendorStore::new();
        store.insert(sample(1)).unwrap();
        let result: Result<()> = store.with_lock(VendorId::new(1), |v| {
            v.balance = Money::from_major_minor(999, 0);
            Err(Error::internal("abort"))
        });
        assert!(result.is_err());
        let v = store.get(VendorId::new(1)).unwrap();
        assert_eq!(v.balance.to_string(), "0.00", "the mutation must not be persisted on error");
    }

    #[test]
    fn concurrent_with_lock_calls_serialize_per_vendor() {
        let store = Arc::new(VendorStore::new());
        store.insert(sample(1)).unwrap();
        let counter = Arc::new(std::sync::atomic::AtomicU64::new(0));
        std::thread::scope(|s| {
            for _ in 0..16 {
                let store = Arc::clone(&store);
                let counter = Arc::clone(&counter);
                s.spawn(move || {
                    store
                        .with_lock(VendorId::new(1), |v| {
                            let before = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                            assert_eq!(before, 0);
                            v.version += 1;
                            counter.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
                            Ok(())
                        })
                        .unwrap();
                });
            }
        });
        assert_eq!(store.get(VendorId::new(1)).unwrap().version, 17);
    }
}
