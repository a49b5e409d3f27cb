//! Transaction Journal Service: the sole writer of `Transaction` rows.

use chrono::Utc;
use std::sync::Arc;
use topup_core::domain::{Transaction, TransactionStatus, TransactionType};
use topup_core::error::Result;
use topup_core::ids::{CreditRequestId, TransactionId, VendorId};
use topup_core::money::Money;
use topup_core::phone::PhoneNumber;
use topup_core::traits::{TransactionFilter, TransactionRepository, TransactionStatusUpdate, TransactionSummary};
use topup_storage::TransactionStore;

/// Parameters shared by [`TransactionJournalService::create_transaction_record`]
/// and [`TransactionJournalService::create_pending_transaction`].
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// The affected vendor.
    pub vendor_id: VendorId,
    /// Direction of the effect.
    pub transaction_type: TransactionType,
    /// The amount, must be strictly positive.
    pub amount: Money,
    /// Required for `Sale`, must be `None` for `Credit`.
    pub phone_number: Option<PhoneNumber>,
    /// Present when tying a `Credit` transaction to a `CreditRequest`.
    pub credit_request_id: Option<CreditRequestId>,
    /// Client-supplied or server-synthesized idempotency key.
    pub idempotency_key: Option<String>,
    /// Free-text description; defaults to `"Transaction: {amount}"` if not
    /// given.
    pub description: Option<String>,
}

/// Creates and mutates ledger entries. The only component permitted to
/// write `Transaction` rows — every money-moving service goes through this
/// one.
pub struct TransactionJournalService {
    transactions: Arc<TransactionStore>,
}

impl TransactionJournalService {
    /// Builds a journal service over the given transaction store.
    pub fn new(transactions: Arc<TransactionStore>) -> Self {
        TransactionJournalService { transactions }
    }

    /// Inserts a finalized, successful row. Pure persistence — no business
    /// validation; callers must have already validated and applied the
    /// balance mutation this row records.
    pub fn create_transaction_record(
        &self,
        new: NewTransaction,
        balance_before: Money,
        balance_after: Money,
    ) -> Result<Transaction> {
        let now = Utc::now();
        let tx = Transaction {
            id: TransactionId::new(),
            vendor_id: new.vendor_id,
            transaction_type: new.transaction_type,
            amount: new.amount,
            phone_number: new.phone_number,
            credit_request_id: new.credit_request_id,
            balance_before,
            balance_after,
            status: TransactionStatus::Approved,
            idempotency_key: new.idempotency_key,
            description: new.description.unwrap_or_else(|| format!("Transaction: {}", new.amount)),
            is_successful: true,
            created_at: now,
            updated_at: now,
        };
        self.transactions.insert(tx.clone())?;
        Ok(tx)
    }

    /// Inserts a `Pending` row with `balance_before = balance_after =
    /// current_balance` as a placeholder; `balance_after` is corrected at
    /// approval time via [`update_status`](Self::update_status).
    pub fn create_pending_transaction(&self, new: NewTransaction, current_balance: Money) -> Result<Transaction> {
        let now = Utc::now();
        let tx = Transaction {
            id: TransactionId::new(),
            vendor_id: new.vendor_id,
            transaction_type: new.transaction_type,
            amount: new.amount,
            phone_number: new.phone_number,
            credit_request_id: new.credit_request_id,
            balance_before: current_balance,
            balance_after: current_balance,
            status: TransactionStatus::Pending,
            idempotency_key: new.idempotency_key,
            description: new.description.unwrap_or_else(|| format!("Transaction: {}", new.amount)),
            is_successful: false,
            created_at: now,
            updated_at: now,
        };
        self.transactions.insert(tx.clone())?;
        Ok(tx)
    }

    /// Applies a partial update to an existing row's status-track fields.
    /// Must be called inside the same logical "DB transaction" as the
    /// balance change it records.
    pub fn update_status(&self, id: TransactionId, update: TransactionStatusUpdate) -> Result<Transaction> {
        self.transactions.update_status(id, update)
    }

    /// Fetches a transaction by id.
    pub fn get(&self, id: TransactionId) -> Result<Transaction> {
        self.transactions.get(id)
    }

    /// Filtered, newest-first iteration over a vendor's transactions.
    pub fn get_vendor_transactions(&self, vendor_id: VendorId, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.transactions.list_for_vendor(vendor_id, filter)
    }

    /// Returns `{credits:{total,count}, sales:{total,count}, net_balance}`
    /// for a vendor, optionally restricted to a date range.
    pub fn get_summary(
        &self,
        vendor_id: VendorId,
        window: Option<(chrono::DateTime<Utc>, chrono::DateTime<Utc>)>,
    ) -> Result<TransactionSummary> {
        self.transactions.summary(vendor_id, window)
    }

    /// Sums today's successful transactions of `transaction_type`, backing
    /// the charge and credit services' daily-cap checks.
    pub fn today_total(
        &self,
        vendor_id: VendorId,
        transaction_type: TransactionType,
        day_start: chrono::DateTime<Utc>,
        day_end: chrono::DateTime<Utc>,
    ) -> Result<(Money, u64)> {
        self.transactions.sum_successful(vendor_id, transaction_type, day_start, day_end)
    }

    /// Counts identical-fingerprint successful sales, backing the charge
    /// service's burst check.
    pub fn count_matching_sales(
        &self,
        vendor_id: VendorId,
        phone_number: &PhoneNumber,
        amount: Money,
        start: chrono::DateTime<Utc>,
        end: chrono::DateTime<Utc>,
    ) -> Result<u64> {
        self.transactions.count_matching_sales(vendor_id, phone_number, amount, start, end)
    }

    /// Finds a transaction previously recorded under `idempotency_key`, if
    /// any.
    pub fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Transaction>> {
        self.transactions.find_by_idempotency_key(key)
    }

    /// Finds the pending transaction(s) tied to a credit request.
    pub fn pending_for_credit_request(&self, request_id: CreditRequestId) -> Result<Vec<Transaction>> {
        self.transactions.pending_for_credit_request(request_id)
    }

    /// Resolves an idempotency record's stored result, if it recorded a
    /// success, to the original transaction it produced. Used by callers
    /// replaying a duplicate request instead of re-executing it.
    pub fn resolve_idempotent_replay(&self, prior_result: &Option<serde_json::Value>) -> Option<Transaction> {
        let result = prior_result.as_ref()?;
        if !result.get("success").and_then(|v| v.as_bool()).unwrap_or(false) {
            return None;
        }
        let tx_id = result.get("transaction_id")?.as_str()?;
        let uuid = uuid::Uuid::parse_str(tx_id).ok()?;
        self.get(TransactionId::from_uuid(uuid)).ok()
    }
}
