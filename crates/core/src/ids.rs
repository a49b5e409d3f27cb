//! Identifier newtypes for the four persisted entities.
//!
//! `VendorId` is a dense integer (vendors are registered externally and are
//! few relative to transaction volume); `CreditRequestId`, `TransactionId`,
//! and `ChargeId` are UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable integer id of a vendor account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VendorId(u64);

impl VendorId {
    /// Wraps a raw integer id.
    pub fn new(id: u64) -> Self {
        VendorId(id)
    }

    /// Returns the raw integer id.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! uuid_id {
    ($name:ident) => {
        #[doc = concat!("UUID identifier for a `", stringify!($name), "`.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random (v4) identifier.
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }

            /// Wraps an existing UUID value.
            pub fn from_uuid(id: Uuid) -> Self {
                $name(id)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(CreditRequestId);
uuid_id!(TransactionId);
uuid_id!(ChargeId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_id_display() {
        assert_eq!(VendorId::new(42).to_string(), "42");
    }

    #[test]
    fn uuid_ids_are_unique() {
        assert_ne!(TransactionId::new(), TransactionId::new());
    }
}
