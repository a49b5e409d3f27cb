//! In-memory append-only `Transaction` journal.
//!
//! Secondary indices (`by_vendor`, `by_idempotency_key`, `by_credit_request`)
//! are maintained alongside the primary `DashMap<TransactionId, ...>` table,
//! a typed repository exposing exactly the queries its callers need rather
//! than a generic scan-and-filter surface.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use topup_core::domain::{Transaction, TransactionStatus, TransactionType};
use topup_core::error::{Error, Result};
use topup_core::ids::{CreditRequestId, TransactionId, VendorId};
use topup_core::money::Money;
use topup_core::phone::PhoneNumber;
use topup_core::traits::{TransactionFilter, TransactionRepository, TransactionStatusUpdate, TransactionSummary};

/// Concurrent in-memory journal.
#[derive(Default)]
pub struct TransactionStore {
    rows: DashMap<TransactionId, RwLock<Transaction>>,
    by_vendor: DashMap<VendorId, Mutex<Vec<TransactionId>>>,
    by_idempotency_key: DashMap<String, TransactionId>,
    by_credit_request: DashMap<CreditRequestId, Mutex<Vec<TransactionId>>>,
}

impl TransactionStore {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    fn index_insertion_order(&self, tx: &Transaction) {
        self.by_vendor
            .entry(tx.vendor_id)
            .or_default()
            .lock()
            .push(tx.id);
        if let Some(key) = &tx.idempotency_key {
            self.by_idempotency_key.insert(key.clone(), tx.id);
        }
        if let Some(request_id) = tx.credit_request_id {
            self.by_credit_request
                .entry(request_id)
                .or_default()
                .lock()
                .push(tx.id);
        }
    }

    fn vendor_rows_newest_first(&self, vendor_id: VendorId) -> Vec<Transaction> {
        let ids = match self.by_vendor.get(&vendor_id) {
            Some(list) => list.lock().clone(),
            None => Vec::new(),
        };
        ids.into_iter()
            .rev()
            .filter_map(|id| self.rows.get(&id).map(|r| r.read().clone()))
            .collect()
    }
}

impl TransactionRepository for TransactionStore {
    fn insert(&self, transaction: Transaction) -> Result<()> {
        if self.rows.contains_key(&transaction.id) {
            return Err(Error::internal(format!("transaction {} already exists", transaction.id)));
        }
        self.index_insertion_order(&transaction);
        self.rows.insert(transaction.id, RwLock::new(transaction));
        Ok(())
    }

    fn update_status(&self, id: TransactionId, update: TransactionStatusUpdate) -> Result<Transaction> {
        let entry = self.rows.get(&id).ok_or_else(|| Error::transaction_not_found(id))?;
        let mut tx = entry.write();
        if let Some(status) = update.status {
            tx.status = status;
        }
        if let Some(balance_after) = update.balance_after {
            tx.balance_after = balance_after;
        }
        if let Some(is_successful) = update.is_successful {
            tx.is_successful = is_successful;
        }
        if let Some(description) = update.description {
            tx.description = description;
        }
        tx.updated_at = Utc::now();
        Ok(tx.clone())
    }

    fn get(&self, id: TransactionId) -> Result<Transaction> {
        self.rows
            .get(&id)
            .map(|r| r.read().clone())
            .ok_or_else(|| Error::transaction_not_found(id))
    }

    fn pending_for_credit_request(&self, request_id: CreditRequestId) -> Result<Vec<Transaction>> {
        let ids = match self.by_credit_request.get(&request_id) {
            Some(list) => list.lock().clone(),
            None => Vec::new(),
        };
        Ok(ids
            .into_iter()
            .filter_map(|id| self.rows.get(&id).map(|r| r.read().clone()))
            .filter(|tx| tx.status == TransactionStatus::Pending)
            .collect())
    }

    fn list_for_vendor(&self, vendor_id: VendorId, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut rows = self.vendor_rows_newest_first(vendor_id);
        rows.retain(|tx| {
            filter.transaction_type.map(|t| t == tx.transaction_type).unwrap_or(true)
                && filter.start.map(|s| tx.created_at >= s).unwrap_or(true)
                && filter.end.map(|e| tx.created_at <= e).unwrap_or(true)
        });
        if let Some(limit) = filter.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    fn sum_successful(
        &self,
        vendor_id: VendorId,
        transaction_type: TransactionType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(Money, u64)> {
        let mut total = Money::zero();
        let mut count = 0u64;
        for tx in self.vendor_rows_newest_first(vendor_id) {
            if tx.is_successful
                && tx.transaction_type == transaction_type
                && tx.created_at >= start
                && tx.created_at < end
            {
                total = total
                    .checked_add(tx.amount)
                    .ok_or_else(|| Error::internal("money overflow summing transactions"))?;
                count += 1;
            }
        }
        Ok((total, count))
    }

    fn count_matching_sales(
        &self,
        vendor_id: VendorId,
        phone_number: &PhoneNumber,
        amount: Money,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64> {
        let count = self
            .vendor_rows_newest_first(vendor_id)
            .into_iter()
            .filter(|tx| {
                tx.is_successful
                    && tx.transaction_type == TransactionType::Sale
                    && tx.amount == amount
                    && tx.phone_number.as_ref() == Some(phone_number)
                    && tx.created_at >= start
                    && tx.created_at < end
            })
            .count();
        Ok(count as u64)
    }

    fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Transaction>> {
        match self.by_idempotency_key.get(key) {
            Some(id) => Ok(Some(self.get(*id)?)),
            None => Ok(None),
        }
    }

    fn summary(&self, vendor_id: VendorId, window: Option<(DateTime<Utc>, DateTime<Utc>)>) -> Result<TransactionSummary> {
        let mut summary = TransactionSummary::default();
        for tx in self.vendor_rows_newest_first(vendor_id) {
            if !tx.is_successful {
                continue;
            }
            if let Some((start, end)) = window {
                if tx.created_at < start || tx.created_at >= end {
                    continue;
                }
            }
            match tx.transaction_type {
                TransactionType::Credit => {
                    summary.total_credits = summary
                        .total_credits
                        .checked_add(tx.amount)
                        .ok_or_else(|| Error::internal("money overflow in summary"))?;
                    summary.credit_count += 1;
                }
                TransactionType::Sale => {
                    summary.total_sales = summary
                        .total_sales
                        .checked_add(tx.amount)
                        .ok_or_else(|| Error::internal("money overflow in summary"))?;
                    summary.sale_count += 1;
                }
            }
        }
        Ok(summary)
    }

    fn all_successful(&self) -> Result<Vec<Transaction>> {
        Ok(self
            .rows
            .iter()
            .map(|r| r.read().clone())
            .filter(|tx| tx.is_successful && tx.status == TransactionStatus::Approved)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topup_core::ids::TransactionId;

    fn sample_sale(vendor_id: VendorId, amount: Money, phone: &str) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            vendor_id,
            transaction_type: TransactionType::Sale,
            amount,
            phone_number: Some(PhoneNumber::parse(phone).unwrap()),
            credit_request_id: None,
            balance_before: Money::zero(),
            balance_after: Money::zero(),
            status: TransactionStatus::Approved,
            idempotency_key: None,
            description: "test".into(),
            is_successful: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_list_newest_first() {
        let store = TransactionStore::new();
        let vendor_id = VendorId::new(1);
        let a = sample_sale(vendor_id, Money::from_major_minor(10, 0), "+989121234567");
        let b = sample_sale(vendor_id, Money::from_major_minor(20, 0), "+989121234567");
        store.insert(a.clone()).unwrap();
        store.insert(b.clone()).unwrap();
        let rows = store.list_for_vendor(vendor_id, &TransactionFilter::default()).unwrap();
        assert_eq!(rows[0].id, b.id);
        assert_eq!(rows[1].id, a.id);
    }

    #[test]
    fn sum_successful_sales() {
        let store = TransactionStore::new();
        let vendor_id = VendorId::new(1);
        store.insert(sample_sale(vendor_id, Money::from_major_minor(150, 0), "+989121234567")).unwrap();
        store.insert(sample_sale(vendor_id, Money::from_major_minor(150, 0), "+989121234567")).unwrap();
        let (total, count) = store
            .sum_successful(vendor_id, TransactionType::Sale, Utc::now() - chrono::Duration::hours(1), Utc::now() + chrono::Duration::hours(1))
            .unwrap();
        assert_eq!(total.to_string(), "300.00");
        assert_eq!(count, 2);
    }

    #[test]
    fn count_matching_fingerprint() {
        let store = TransactionStore::new();
        let vendor_id = VendorId::new(1);
        let amount = Money::from_major_minor(50, 0);
        let phone = PhoneNumber::parse("+989121234567").unwrap();
        for _ in 0..3 {
            store.insert(sample_sale(vendor_id, amount, phone.as_str())).unwrap();
        }
        let count = store
            .count_matching_sales(vendor_id, &phone, amount, Utc::now() - chrono::Duration::seconds(10), Utc::now() + chrono::Duration::seconds(1))
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn find_by_idempotency_key() {
        let store = TransactionStore::new();
        let mut tx = sample_sale(VendorId::new(1), Money::from_major_minor(10, 0), "+989121234567");
        tx.idempotency_key = Some("key-1".to_string());
        store.insert(tx.clone()).unwrap();
        let found = store.find_by_idempotency_key("key-1").unwrap().unwrap();
        assert_eq!(found.id, tx.id);
        assert!(store.find_by_idempotency_key("missing").unwrap().is_none());
    }

    #[test]
    fn update_status_mutates_in_place() {
        let store = TransactionStore::new();
        let mut tx = sample_sale(VendorId::new(1), Money::from_major_minor(10, 0), "+989121234567");
        tx.status = TransactionStatus::Pending;
        tx.is_successful = false;
        store.insert(tx.clone()).unwrap();
        let updated = store
            .update_status(
                tx.id,
                TransactionStatusUpdate {
                    status: Some(TransactionStatus::Approved),
                    is_successful: Some(true),
                    balance_after: Some(Money::from_major_minor(90, 0)),
                    description: None,
                },
            )
            .unwrap();
        assert_eq!(updated.status, TransactionStatus::Approved);
        assert!(updated.is_successful);
        assert_eq!(updated.balance_after.to_string(), "90.00");
    }
}
