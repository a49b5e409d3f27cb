//! `Ledger`: the process-wide handle wiring every store and service
//! together.
//!
//! Grounded on [`topup_concurrency::SafetyKernel`]'s own bundling pattern —
//! one value, constructed once at process start, held behind `Arc` and
//! passed by reference wherever a service is needed. `Ledger` does the same
//! one level up, bundling the four repositories, the kernel, and the
//! services built on top of them.

use std::sync::Arc;
use topup_concurrency::{SafetyKernel, SafetyKernelConfig};
use topup_storage::{ChargeStore, CreditRequestStore, TransactionStore, VendorStore};

use crate::charge_service::ChargeService;
use crate::credit_service::CreditService;
use crate::journal::TransactionJournalService;
use crate::reconciliation::ReconciliationService;

/// Everything a process needs to run the top-up system: the four
/// repositories, the safety kernel, and the services built over them.
///
/// Cloning a `Ledger` is cheap — every field is an `Arc` over shared state,
/// so clones are handles, not copies.
#[derive(Clone)]
pub struct Ledger {
    /// Vendor account repository.
    pub vendors: Arc<VendorStore>,
    /// Transaction journal repository.
    pub transactions: Arc<TransactionStore>,
    /// Credit request repository.
    pub credit_requests: Arc<CreditRequestStore>,
    /// Charge read-model repository.
    pub charges: Arc<ChargeStore>,
    /// The concurrency-safety machinery shared by every money-moving
    /// service.
    pub kernel: Arc<SafetyKernel>,
    /// The sole writer of `Transaction` rows.
    pub journal: Arc<TransactionJournalService>,
    /// Mobile top-up charges.
    pub charge_service: Arc<ChargeService>,
    /// Credit requests, approvals, and direct balance increases.
    pub credit_service: Arc<CreditService>,
    /// Independent stored-vs-calculated balance auditing.
    pub reconciliation: Arc<ReconciliationService>,
}

impl Ledger {
    /// Builds a fresh, empty `Ledger` with the given safety-kernel
    /// configuration. Vendors must still be registered via
    /// [`VendorStore::insert`] before any service can act on them.
    pub fn new(config: SafetyKernelConfig) -> Self {
        let vendors = Arc::new(VendorStore::new());
        let transactions = Arc::new(TransactionStore::new());
        let credit_requests = Arc::new(CreditRequestStore::new());
        let charges = Arc::new(ChargeStore::new());
        let kernel = Arc::new(SafetyKernel::new(config));
        let journal = Arc::new(TransactionJournalService::new(transactions.clone()));

        let charge_service = Arc::new(ChargeService::new(
            vendors.clone(),
            charges.clone(),
            journal.clone(),
            kernel.clone(),
        ));
        let credit_service = Arc::new(CreditService::new(
            vendors.clone(),
            credit_requests.clone(),
            journal.clone(),
            kernel.clone(),
        ));
        let reconciliation = Arc::new(ReconciliationService::new(vendors.clone(), transactions.clone(), kernel.audit));

        Ledger {
            vendors,
            transactions,
            credit_requests,
            charges,
            kernel,
            journal,
            charge_service,
            credit_service,
            reconciliation,
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(SafetyKernelConfig::default())
    }
}
