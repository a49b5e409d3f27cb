//! Business-logic services: the charge, credit, journal, and reconciliation
//! pipelines built on top of `topup-storage` and `topup-concurrency`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod charge_service;
pub mod credit_service;
pub mod journal;
pub mod ledger;
pub mod reconciliation;

pub use charge_service::{ChargeOutcome, ChargeService};
pub use credit_service::CreditService;
pub use journal::{NewTransaction, TransactionJournalService};
pub use ledger::Ledger;
pub use reconciliation::{ReconciliationReport, ReconciliationService, VendorReconciliation, generate_reconciliation_report};
