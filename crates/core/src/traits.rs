//! Repository traits: typed query surfaces over the four persisted entities.
//!
//! Each trait exposes exactly the queries the service layer (`topup-engine`)
//! needs, rather than a generic get/put surface a caller could misuse into
//! N+1 query patterns.

use crate::domain::{Charge, CreditRequest, CreditRequestStatus, Transaction, TransactionType, Vendor};
use crate::error::Result;
use crate::ids::{ChargeId, CreditRequestId, TransactionId, VendorId};
use chrono::{DateTime, Utc};

/// Repository over `Vendor` rows, the single contention point per account.
///
/// Implementations must be `Send + Sync`: the core is designed for
/// multi-worker, multi-process parallelism, so every repository is shared
/// across threads. [`with_lock`](VendorRepository::with_lock) is the local
/// realization of `SELECT ... FOR UPDATE`: `f` runs while the vendor's row
/// lock is held, so validation and the balance mutation it guards observe a
/// consistent snapshot and cannot interleave with a concurrent mutation of
/// the same vendor.
pub trait VendorRepository: Send + Sync {
    /// Fetches a vendor by id without taking the row lock — safe for reads
    /// outside money paths.
    ///
    /// # Errors
    /// Returns [`crate::error::Error::NotFound`] if no such vendor exists.
    fn get(&self, id: VendorId) -> Result<Vendor>;

    /// Runs `f` with exclusive access to `id`'s row. `f` receives the
    /// current, freshly-read vendor and returns either a mutated vendor to
    /// persist (bumping nothing extra — callers are responsible for their
    /// own `version` increment as part of the mutation) or an error, which
    /// aborts the "transaction" and leaves the stored row untouched.
    ///
    /// # Errors
    /// Propagates whatever `f` returns, plus [`crate::error::Error::NotFound`]
    /// if `id` does not exist.
    fn with_lock<R>(&self, id: VendorId, f: impl FnOnce(&mut Vendor) -> Result<R>) -> Result<R>;
}

/// A filter for [`TransactionRepository::list_for_vendor`].
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Restrict to one transaction type.
    pub transaction_type: Option<TransactionType>,
    /// Inclusive start of the creation-time range.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive end of the creation-time range.
    pub end: Option<DateTime<Utc>>,
    /// Cap on the number of rows returned (newest first).
    pub limit: Option<usize>,
}

/// Aggregated totals over a vendor's successful transactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionSummary {
    /// Sum of successful CREDIT amounts.
    pub total_credits: crate::money::Money,
    /// Count of successful CREDIT rows.
    pub credit_count: u64,
    /// Sum of successful SALE amounts.
    pub total_sales: crate::money::Money,
    /// Count of successful SALE rows.
    pub sale_count: u64,
}

/// Repository over the append-only `Transaction` journal.
pub trait TransactionRepository: Send + Sync {
    /// Inserts a new transaction row.
    ///
    /// # Errors
    /// Returns [`crate::error::Error::Internal`] on an id collision (should
    /// never happen with UUID ids).
    fn insert(&self, transaction: Transaction) -> Result<()>;

    /// Applies a partial update to an existing row's status-track fields
    /// (`status`, `balance_after`, `is_successful`, `description`). Callers
    /// must not otherwise mutate a transaction after creation.
    ///
    /// # Errors
    /// Returns [`crate::error::Error::NotFound`] if no such transaction
    /// exists.
    fn update_status(&self, id: TransactionId, update: TransactionStatusUpdate) -> Result<Transaction>;

    /// Fetches a single transaction by id.
    fn get(&self, id: TransactionId) -> Result<Transaction>;

    /// Finds the pending transaction(s) tied to a credit request.
    fn pending_for_credit_request(&self, request_id: CreditRequestId) -> Result<Vec<Transaction>>;

    /// Lists a vendor's transactions, newest first, per `filter`.
    fn list_for_vendor(&self, vendor_id: VendorId, filter: &TransactionFilter) -> Result<Vec<Transaction>>;

    /// Sums successful transactions of `transaction_type` for `vendor_id`
    /// within `[start, end)`. Used for daily-cap checks and reconciliation.
    fn sum_successful(
        &self,
        vendor_id: VendorId,
        transaction_type: TransactionType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(crate::money::Money, u64)>;

    /// Counts successful SALE transactions matching an exact
    /// `(vendor, phone, amount)` fingerprint within `[start, end)` — the
    /// burst-protection query.
    fn count_matching_sales(
        &self,
        vendor_id: VendorId,
        phone_number: &crate::phone::PhoneNumber,
        amount: crate::money::Money,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64>;

    /// Finds a transaction previously recorded under `idempotency_key`, if
    /// any.
    fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Transaction>>;

    /// Returns aggregated totals for `vendor_id`, optionally restricted to a
    /// `[start, end)` window.
    fn summary(
        &self,
        vendor_id: VendorId,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<TransactionSummary>;

    /// Iterates every successful transaction in the journal, across all
    /// vendors — used by `reconcile_all_balances`' system-stats pass.
    fn all_successful(&self) -> Result<Vec<Transaction>>;
}

/// A partial update applied to a [`Transaction`] row by
/// [`TransactionRepository::update_status`].
#[derive(Debug, Clone, Default)]
pub struct TransactionStatusUpdate {
    /// New status, if changing.
    pub status: Option<crate::domain::TransactionStatus>,
    /// New `balance_after`, if changing.
    pub balance_after: Option<crate::money::Money>,
    /// New `is_successful`, if changing.
    pub is_successful: Option<bool>,
    /// New description, if changing.
    pub description: Option<String>,
}

/// Repository over `CreditRequest` rows.
pub trait CreditRequestRepository: Send + Sync {
    /// Inserts a new request.
    fn insert(&self, request: CreditRequest) -> Result<()>;

    /// Fetches a request by id.
    fn get(&self, id: CreditRequestId) -> Result<CreditRequest>;

    /// Transitions a request's status, storing `reason` when transitioning
    /// to `Rejected`. Returns the updated row.
    ///
    /// # Errors
    /// Returns [`crate::error::Error::AlreadyProcessed`] if the stored
    /// status is no longer `Pending`.
    fn transition(
        &self,
        id: CreditRequestId,
        to: CreditRequestStatus,
        reason: Option<String>,
    ) -> Result<CreditRequest>;

    /// Lists a vendor's requests, newest first.
    fn list_for_vendor(&self, vendor_id: VendorId) -> Result<Vec<CreditRequest>>;
}

/// Repository over the denormalized `Charge` records.
pub trait ChargeRepository: Send + Sync {
    /// Inserts a new charge row.
    fn insert(&self, charge: Charge) -> Result<()>;

    /// Fetches a charge by id.
    fn get(&self, id: ChargeId) -> Result<Charge>;

    /// Lists a vendor's charges, newest first, paginated.
    fn list_for_vendor(&self, vendor_id: VendorId, page: usize, page_size: usize) -> Result<(Vec<Charge>, u64)>;

    /// Lists a phone number's charge history across vendors, newest first.
    fn list_for_phone(&self, phone_number: &crate::phone::PhoneNumber) -> Result<Vec<Charge>>;
}
