//! Core types and traits for the topup ledger.
//!
//! This crate defines the foundational types used throughout the workspace:
//! - [`domain`]: the four persisted entities, `Vendor`, `CreditRequest`,
//!   `Transaction`, `Charge`.
//! - [`ids`]: identifier newtypes.
//! - [`money`]: fixed-point monetary amounts.
//! - [`phone`]: E.164 phone number validation.
//! - [`error`]: the unified `Error`/`ErrorKind` type.
//! - [`traits`]: repository traits implemented by `topup-storage`.
//! - [`limits`]: validation constants for amounts and idempotency keys.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod error;
pub mod ids;
pub mod limits;
pub mod money;
pub mod phone;
pub mod traits;

pub use domain::{Charge, CreditRequest, CreditRequestStatus, Transaction, TransactionStatus, TransactionType, Vendor};
pub use error::{Error, ErrorKind, Result};
pub use ids::{ChargeId, CreditRequestId, TransactionId, VendorId};
pub use limits::Limits;
pub use money::Money;
pub use phone::PhoneNumber;
pub use traits::{
    ChargeRepository, CreditRequestRepository, TransactionFilter, TransactionRepository,
    TransactionStatusUpdate, TransactionSummary, VendorRepository,
};
