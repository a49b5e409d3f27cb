//! # topup-ledger
//!
//! A B2B mobile phone top-up and charge ledger: vendors hold a prepaid
//! balance, charge it down by topping up phone numbers, and top it back up
//! through an approval-gated credit workflow. Every money-moving operation
//! runs through a safety kernel (rate limiting, idempotency, double-spend
//! detection, burst detection) before it touches a balance, and an
//! independent reconciliation pass can always recompute a vendor's balance
//! from the transaction journal and compare it to what's stored.
//!
//! # Quick start
//!
//! ```no_run
//! use topup_core::{Money, PhoneNumber, Vendor, VendorId};
//! use topup_core::traits::VendorRepository;
//! use topup_concurrency::SafetyKernelConfig;
//! use topup_engine::Ledger;
//! use chrono::Utc;
//!
//! fn main() -> topup_core::Result<()> {
//!     let ledger = Ledger::new(SafetyKernelConfig::default());
//!
//!     let vendor_id = VendorId::new(1);
//!     let vendor = Vendor::new(vendor_id, "Acme Mobile", Money::from_major_minor(1_000_000, 0), Utc::now());
//!     ledger.vendors.insert(vendor.clone())?;
//!
//!     let phone = PhoneNumber::parse("+989121234567")?;
//!     let outcome = ledger.charge_service.charge_phone(
//!         &vendor,
//!         &phone,
//!         Money::from_major_minor(50, 0),
//!         Some("order-123".to_string()),
//!     )?;
//!     println!("{}", outcome.message);
//!
//!     let check = ledger.reconciliation.balance_reconciliation(&ledger.vendors.get(vendor_id)?)?;
//!     assert!(check.is_consistent);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Crates
//!
//! | Crate | Purpose |
//! |-------|---------|
//! | [`topup_core`] | Domain types (`Vendor`, `Transaction`, `CreditRequest`, `Charge`), `Money`, `PhoneNumber`, the unified error type, and the repository traits everything else implements. |
//! | [`topup_concurrency`] | The safety kernel: distributed locking, idempotency, double-spend detection, rate limiting, burst detection, audit logging. |
//! | [`topup_storage`] | In-memory repository implementations over the `topup-core` traits. |
//! | [`topup_engine`] | The charge, credit, journal, and reconciliation service pipelines, bundled behind [`topup_engine::Ledger`]. |
//! | [`topup_api`] | Request/response DTOs and validation rules for a transport layer to sit on top of. |
//!
//! This crate re-exports [`topup_engine::Ledger`] as the single entry point
//! most callers need; the individual crates above remain directly usable
//! for callers who only need a slice of the stack (e.g. `topup-core` alone
//! for the domain types).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use topup_api as api;
pub use topup_concurrency as concurrency;
pub use topup_core as core;
pub use topup_engine as engine;
pub use topup_storage as storage;

pub use topup_core::{Error, ErrorKind, Result};
pub use topup_engine::Ledger;
