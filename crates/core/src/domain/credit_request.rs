//! The `CreditRequest` entity: a pending or finalized top-up request.

use crate::ids::{CreditRequestId, VendorId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a [`CreditRequest`]. Transitions form a one-shot tree:
/// `Pending -> Approved` or `Pending -> Rejected`, never reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CreditRequestStatus {
    /// Awaiting administrator action.
    Pending,
    /// Approved; the vendor's balance has been credited.
    Approved,
    /// Rejected; no balance change occurred.
    Rejected,
}

/// A request, made by a vendor, to top up its balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRequest {
    /// Unique id.
    pub id: CreditRequestId,
    /// The requesting vendor.
    pub vendor_id: VendorId,
    /// Requested amount. Always strictly positive.
    pub amount: Money,
    /// Current lifecycle status.
    pub status: CreditRequestStatus,
    /// Free-text reason, set only on rejection.
    pub rejection_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl CreditRequest {
    /// Constructs a new request in `Pending` status.
    pub fn new(id: CreditRequestId, vendor_id: VendorId, amount: Money, now: DateTime<Utc>) -> Self {
        CreditRequest {
            id,
            vendor_id,
            amount,
            status: CreditRequestStatus::Pending,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}
