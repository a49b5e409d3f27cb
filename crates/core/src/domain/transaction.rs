//! The `Transaction` entity: the immutable audit record of a financial effect.

use crate::ids::{CreditRequestId, TransactionId, VendorId};
use crate::money::Money;
use crate::phone::PhoneNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a financial effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Increases the vendor's balance.
    Credit,
    /// Decreases the vendor's balance.
    Sale,
}

impl TransactionType {
    /// `+1` for `Credit`, `-1` for `Sale` — the sign applied to `amount` when
    /// folding a transaction into a running balance.
    pub fn sign(self) -> i64 {
        match self {
            TransactionType::Credit => 1,
            TransactionType::Sale => -1,
        }
    }
}

/// Status of a [`Transaction`] row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// Recorded but not yet finalized.
    Pending,
    /// Finalized as successful.
    Approved,
    /// Finalized as unsuccessful (credit requests only).
    Rejected,
}

/// An immutable journal entry recording a single financial effect.
///
/// Once `status = Approved` and `is_successful = true`, none of the
/// financial fields (`amount`, `balance_before`, `balance_after`,
/// `transaction_type`) change again. A `Pending` row may transition to
/// `Approved` or `Rejected` exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique id.
    pub id: TransactionId,
    /// The affected vendor.
    pub vendor_id: VendorId,
    /// Direction of the effect.
    pub transaction_type: TransactionType,
    /// The amount, always strictly positive.
    pub amount: Money,
    /// Required for `Sale`, absent for `Credit`.
    pub phone_number: Option<PhoneNumber>,
    /// Present when this `Credit` transaction is tied to a `CreditRequest`.
    pub credit_request_id: Option<CreditRequestId>,
    /// Vendor balance immediately before this effect.
    pub balance_before: Money,
    /// Vendor balance immediately after this effect (equal to
    /// `balance_before` for a still-`Pending` row; corrected on approval).
    pub balance_after: Money,
    /// Lifecycle status.
    pub status: TransactionStatus,
    /// Client-supplied or server-synthesized idempotency key, if any.
    pub idempotency_key: Option<String>,
    /// Free-text description.
    pub description: String,
    /// True only once this row represents a finalized, successful effect.
    pub is_successful: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}
