//! The `Charge` entity: a denormalized sale record for fast per-phone history.

use crate::ids::{ChargeId, TransactionId, VendorId};
use crate::money::Money;
use crate::phone::PhoneNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A denormalized record of one successful SALE, kept alongside the
/// authoritative [`Transaction`](crate::domain::transaction::Transaction) row
/// for fast `charge(phone_number, created_at)` lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    /// Unique id.
    pub id: ChargeId,
    /// The vendor that issued the charge.
    pub vendor_id: VendorId,
    /// The transaction this charge corresponds to.
    pub transaction_id: TransactionId,
    /// The charged phone number.
    pub phone_number: PhoneNumber,
    /// The charged amount, always strictly positive.
    pub amount: Money,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
