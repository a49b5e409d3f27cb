//! Error types for the topup ledger.
//!
//! `Error` is the single error type returned by every fallible operation in
//! every crate of this workspace. It carries the structured context needed to
//! render a message, and a cheap unit-only [`ErrorKind`] projection for
//! matching and logging without cloning that context.

use crate::ids::{ChargeId, CreditRequestId, TransactionId, VendorId};
use crate::money::Money;
use thiserror::Error;

/// Unified error type for the topup ledger core.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Amount was non-positive, out of range, or not the required increment.
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount {
        /// The offending amount.
        amount: Money,
        /// Why it was rejected.
        reason: String,
    },

    /// A phone number did not validate as E.164.
    #[error("invalid phone number {raw:?}: {reason}")]
    InvalidPhoneNumber {
        /// The rejected input.
        raw: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The vendor is flagged inactive.
    #[error("vendor {vendor_id} is inactive")]
    InactiveVendor {
        /// The vendor.
        vendor_id: VendorId,
    },

    /// Vendor balance is lower than the requested amount.
    #[error("vendor {vendor_id} has insufficient funds: balance {balance}, requested {amount}")]
    InsufficientFunds {
        /// The vendor.
        vendor_id: VendorId,
        /// Current balance.
        balance: Money,
        /// Requested amount.
        amount: Money,
    },

    /// Today's total for this operation type plus `amount` would exceed the
    /// vendor's daily limit.
    #[error(
        "vendor {vendor_id} daily limit exceeded: today {today_total} + {amount} > limit {daily_limit}"
    )]
    DailyLimitExceeded {
        /// The vendor.
        vendor_id: VendorId,
        /// Sum already recorded today.
        today_total: Money,
        /// The amount that would be added.
        amount: Money,
        /// The vendor's configured daily limit.
        daily_limit: Money,
    },

    /// The rate-limit window for this key is saturated.
    #[error("rate limit exceeded for {key}")]
    RateLimited {
        /// The rate limit key.
        key: String,
    },

    /// The double-spend guard rejected a concurrent in-flight operation.
    #[error("duplicate in-flight operation for vendor {vendor_id}")]
    DuplicateInFlight {
        /// The vendor.
        vendor_id: VendorId,
    },

    /// An idempotency key was reused without a prior success to replay.
    #[error("duplicate request for idempotency key {key}")]
    Duplicate {
        /// The idempotency key.
        key: String,
    },

    /// A distributed lock could not be acquired before its timeout elapsed.
    #[error("system busy: could not acquire lock {key} within {timeout_ms}ms")]
    SystemBusy {
        /// The lock key.
        key: String,
        /// The timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// An optimistic version check, or a version-guarded row update, lost the
    /// race. Not retried internally; the caller must retry with a fresh
    /// snapshot.
    #[error("concurrency conflict on vendor {vendor_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The vendor.
        vendor_id: VendorId,
        /// The version the caller expected.
        expected: u64,
        /// The version actually stored.
        actual: u64,
    },

    /// Three or more identical-fingerprint charges were observed within the
    /// burst window.
    #[error("suspicious burst: {count} identical charges for vendor {vendor_id} within the burst window")]
    SuspiciousBurst {
        /// The vendor.
        vendor_id: VendorId,
        /// How many identical charges were observed.
        count: u64,
    },

    /// A `CreditRequest` was no longer `PENDING` when a transition was
    /// attempted.
    #[error("credit request {request_id} already processed")]
    AlreadyProcessed {
        /// The credit request.
        request_id: CreditRequestId,
    },

    /// A caller-supplied idempotency key exceeded the maximum length.
    #[error("idempotency key too long: {len} bytes, maximum is {max}")]
    InvalidIdempotencyKey {
        /// The length of the rejected key.
        len: usize,
        /// The configured maximum.
        max: usize,
    },

    /// The named entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Human-readable entity name (`"vendor"`, `"credit request"`, ...).
        entity: &'static str,
        /// String form of the missing id.
        id: String,
    },

    /// Catch-all for invariant violations and infrastructure failures.
    #[error("internal error: {message}")]
    Internal {
        /// Redacted-for-client message; full detail belongs in the log line
        /// that accompanies this error, not in the error itself.
        message: String,
    },
}

impl Error {
    /// Cheap unit-only projection for matching and logging.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            Error::InvalidPhoneNumber { .. } => ErrorKind::InvalidPhoneNumber,
            Error::InactiveVendor { .. } => ErrorKind::InactiveVendor,
            Error::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Error::DailyLimitExceeded { .. } => ErrorKind::DailyLimitExceeded,
            Error::RateLimited { .. } => ErrorKind::RateLimited,
            Error::DuplicateInFlight { .. } => ErrorKind::DuplicateInFlight,
            Error::Duplicate { .. } => ErrorKind::Duplicate,
            Error::SystemBusy { .. } => ErrorKind::SystemBusy,
            Error::ConcurrencyConflict { .. } => ErrorKind::ConcurrencyConflict,
            Error::SuspiciousBurst { .. } => ErrorKind::SuspiciousBurst,
            Error::AlreadyProcessed { .. } => ErrorKind::AlreadyProcessed,
            Error::InvalidIdempotencyKey { .. } => ErrorKind::InvalidIdempotencyKey,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// True if a caller could plausibly retry the same logical request (with
    /// a fresh snapshot where relevant) and expect a different outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RateLimited
                | ErrorKind::SystemBusy
                | ErrorKind::ConcurrencyConflict
                | ErrorKind::DuplicateInFlight
        )
    }

    /// True for errors that should be escalated (audited at `ERROR`, not just
    /// `WARNING`) rather than treated as routine rejections.
    pub fn is_serious(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::SuspiciousBurst | ErrorKind::Internal | ErrorKind::ConcurrencyConflict
        )
    }

    /// True for errors arising from the request itself rather than from
    /// system state.
    pub fn is_validation_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidAmount)
    }

    /// Constructs [`Error::InvalidAmount`].
    pub fn invalid_amount(amount: Money, reason: impl Into<String>) -> Self {
        Error::InvalidAmount {
            amount,
            reason: reason.into(),
        }
    }

    /// Constructs [`Error::InvalidPhoneNumber`].
    pub fn invalid_phone_number(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPhoneNumber {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Constructs [`Error::InactiveVendor`].
    pub fn inactive_vendor(vendor_id: VendorId) -> Self {
        Error::InactiveVendor { vendor_id }
    }

    /// Constructs [`Error::InsufficientFunds`].
    pub fn insufficient_funds(vendor_id: VendorId, balance: Money, amount: Money) -> Self {
        Error::InsufficientFunds {
            vendor_id,
            balance,
            amount,
        }
    }

    /// Constructs [`Error::DailyLimitExceeded`].
    pub fn daily_limit_exceeded(
        vendor_id: VendorId,
        today_total: Money,
        amount: Money,
        daily_limit: Money,
    ) -> Self {
        Error::DailyLimitExceeded {
            vendor_id,
            today_total,
            amount,
            daily_limit,
        }
    }

    /// Constructs [`Error::RateLimited`].
    pub fn rate_limited(key: impl Into<String>) -> Self {
        Error::RateLimited { key: key.into() }
    }

    /// Constructs [`Error::DuplicateInFlight`].
    pub fn duplicate_in_flight(vendor_id: VendorId) -> Self {
        Error::DuplicateInFlight { vendor_id }
    }

    /// Constructs [`Error::Duplicate`].
    pub fn duplicate(key: impl Into<String>) -> Self {
        Error::Duplicate { key: key.into() }
    }

    /// Constructs [`Error::SystemBusy`].
    pub fn system_busy(key: impl Into<String>, timeout_ms: u64) -> Self {
        Error::SystemBusy {
            key: key.into(),
            timeout_ms,
        }
    }

    /// Constructs [`Error::ConcurrencyConflict`].
    pub fn concurrency_conflict(vendor_id: VendorId, expected: u64, actual: u64) -> Self {
        Error::ConcurrencyConflict {
            vendor_id,
            expected,
            actual,
        }
    }

    /// Constructs [`Error::SuspiciousBurst`].
    pub fn suspicious_burst(vendor_id: VendorId, count: u64) -> Self {
        Error::SuspiciousBurst { vendor_id, count }
    }

    /// Constructs [`Error::AlreadyProcessed`].
    pub fn already_processed(request_id: CreditRequestId) -> Self {
        Error::AlreadyProcessed { request_id }
    }

    /// Constructs [`Error::InvalidIdempotencyKey`].
    pub fn invalid_idempotency_key(len: usize, max: usize) -> Self {
        Error::InvalidIdempotencyKey { len, max }
    }

    /// Constructs [`Error::NotFound`] for a vendor.
    pub fn vendor_not_found(vendor_id: VendorId) -> Self {
        Error::NotFound {
            entity: "vendor",
            id: vendor_id.to_string(),
        }
    }

    /// Constructs [`Error::NotFound`] for a credit request.
    pub fn credit_request_not_found(id: CreditRequestId) -> Self {
        Error::NotFound {
            entity: "credit request",
            id: id.to_string(),
        }
    }

    /// Constructs [`Error::NotFound`] for a transaction.
    pub fn transaction_not_found(id: TransactionId) -> Self {
        Error::NotFound {
            entity: "transaction",
            id: id.to_string(),
        }
    }

    /// Constructs [`Error::NotFound`] for a charge.
    pub fn charge_not_found(id: ChargeId) -> Self {
        Error::NotFound {
            entity: "charge",
            id: id.to_string(),
        }
    }

    /// Constructs [`Error::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(e: rust_decimal::Error) -> Self {
        Error::internal(format!("decimal error: {e}"))
    }
}

/// Cheap, `Copy`, unit-only projection of [`Error`] for matching and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::InvalidAmount`].
    InvalidAmount,
    /// See [`Error::InvalidPhoneNumber`].
    InvalidPhoneNumber,
    /// See [`Error::InactiveVendor`].
    InactiveVendor,
    /// See [`Error::InsufficientFunds`].
    InsufficientFunds,
    /// See [`Error::DailyLimitExceeded`].
    DailyLimitExceeded,
    /// See [`Error::RateLimited`].
    RateLimited,
    /// See [`Error::DuplicateInFlight`].
    DuplicateInFlight,
    /// See [`Error::Duplicate`].
    Duplicate,
    /// See [`Error::SystemBusy`].
    SystemBusy,
    /// See [`Error::ConcurrencyConflict`].
    ConcurrencyConflict,
    /// See [`Error::SuspiciousBurst`].
    SuspiciousBurst,
    /// See [`Error::AlreadyProcessed`].
    AlreadyProcessed,
    /// See [`Error::InvalidIdempotencyKey`].
    InvalidIdempotencyKey,
    /// See [`Error::NotFound`].
    NotFound,
    /// See [`Error::Internal`].
    Internal,
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;
