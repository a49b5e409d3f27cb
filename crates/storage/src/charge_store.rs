//! In-memory `Charge` repository: the denormalized sale record kept for fast
//! per-phone history.

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use topup_core::domain::Charge;
use topup_core::error::{Error, Result};
use topup_core::ids::{ChargeId, VendorId};
use topup_core::phone::PhoneNumber;
use topup_core::traits::ChargeRepository;

/// Concurrent in-memory table of charge rows, indexed by vendor and by
/// phone number.
#[derive(Default)]
pub struct ChargeStore {
    rows: DashMap<ChargeId, RwLock<Charge>>,
    by_vendor: DashMap<VendorId, Mutex<Vec<ChargeId>>>,
    by_phone: DashMap<String, Mutex<Vec<ChargeId>>>,
}

impl ChargeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChargeRepository for ChargeStore {
    fn insert(&self, charge: Charge) -> Result<()> {
        if self.rows.contains_key(&charge.id) {
            return Err(Error::internal(format!("charge {} already exists", charge.id)));
        }
        self.by_vendor.entry(charge.vendor_id).or_default().lock().push(charge.id);
        self.by_phone
            .entry(charge.phone_number.as_str().to_string())
            .or_default()
            .lock()
            .push(charge.id);
        self.rows.insert(charge.id, RwLock::new(charge));
        Ok(())
    }

    fn get(&self, id: ChargeId) -> Result<Charge> {
        self.rows
            .get(&id)
            .map(|r| r.read().clone())
            .ok_or_else(|| Error::charge_not_found(id))
    }

    fn list_for_vendor(&self, vendor_id: VendorId, page: usize, page_size: usize) -> Result<(Vec<Charge>, u64)> {
        let ids = match self.by_vendor.get(&vendor_id) {
            Some(list) => list.lock().clone(),
            None => Vec::new(),
        };
        let total = ids.len() as u64;
        let newest_first: Vec<ChargeId> = ids.into_iter().rev().collect();
        let start = page.saturating_sub(1).saturating_mul(page_size);
        let page_rows = newest_first
            .into_iter()
            .skip(start)
            .take(page_size)
            .filter_map(|id| self.rows.get(&id).map(|r| r.read().clone()))
            .collect();
        Ok((page_rows, total))
    }

    fn list_for_phone(&self, phone_number: &PhoneNumber) -> Result<Vec<Charge>> {
        let ids = match self.by_phone.get(phone_number.as_str()) {
            Some(list) => list.lock().clone(),
            None => Vec::new(),
        };
        Ok(ids
            .into_iter()
            .rev()
            .filter_map(|id| self.rows.get(&id).map(|r| r.read().clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use topup_core::ids::TransactionId;
    use topup_core::money::Money;

    fn sample(vendor_id: VendorId, phone: &str) -> Charge {
        Charge {
            id: ChargeId::new(),
            vendor_id,
            transaction_id: TransactionId::new(),
            phone_number: PhoneNumber::parse(phone).unwrap(),
            amount: Money::from_major_minor(100, 0),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_list_for_vendor_paginated() {
        let store = ChargeStore::new();
        let vendor_id = VendorId::new(1);
        for _ in 0..5 {
            store.insert(sample(vendor_id, "+989121234567")).unwrap();
        }
        let (page1, total) = store.list_for_vendor(vendor_id, 1, 2).unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(total, 5);
        let (page3, _) = store.list_for_vendor(vendor_id, 3, 2).unwrap();
        assert_eq!(page3.len(), 1);
    }

    #[test]
    fn list_for_phone_spans_vendors() {
        let store = ChargeStore::new();
        let phone = PhoneNumber::parse("+989121234567").unwrap();
        store.insert(sample(VendorId::new(1), phone.as_str())).unwrap();
        store.insert(sample(VendorId::new(2), phone.as_str())).unwrap();
        let rows = store.list_for_phone(&phone).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
