//! In-memory repositories for the four persisted entities.
//!
//! Each store is a concurrent, `DashMap`-backed, per-row-locked table
//! implementing the corresponding `topup_core::traits` repository trait,
//! with the secondary indices each repository's query surface needs.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod charge_store;
pub mod credit_request_store;
pub mod transaction_store;
pub mod vendor_store;

pub use charge_store::ChargeStore;
pub use credit_request_store::CreditRequestStore;
pub use transaction_store::TransactionStore;
pub use vendor_store::VendorStore;
