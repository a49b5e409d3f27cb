//! The `Vendor` entity: a business account holding a prepaid balance.

use crate::ids::VendorId;
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A business account.
///
/// `balance` never goes negative and `version` strictly increases on every
/// balance mutation; both invariants are enforced by the storage layer, not
/// by this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    /// Stable integer id.
    pub id: VendorId,
    /// Display name.
    pub name: String,
    /// Current prepaid balance. Non-negative.
    pub balance: Money,
    /// Monotonically increasing counter, starts at 1, bumped on every
    /// balance mutation.
    pub version: u64,
    /// Whether the vendor may currently transact.
    pub is_active: bool,
    /// Non-negative per-day cap applied independently to SALE and CREDIT
    /// totals.
    pub daily_limit: Money,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Vendor {
    /// Constructs a freshly registered vendor with version 1 and zero
    /// balance.
    pub fn new(id: VendorId, name: impl Into<String>, daily_limit: Money, now: DateTime<Utc>) -> Self {
        Vendor {
            id,
            name: name.into(),
            balance: Money::zero(),
            version: 1,
            is_active: true,
            daily_limit,
            created_at: now,
            updated_at: now,
        }
    }
}
