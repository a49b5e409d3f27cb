//! Validation constants for amounts and idempotency keys.
//!
//! Charge and credit-request amounts each have a named valid range (and,
//! for charges, a required increment), and idempotency keys have a maximum
//! length.

use crate::money::Money;

/// Named validation limits enforced at the API boundary (`topup-api`) before
/// an amount or key ever reaches a service.
#[derive(Debug, Clone)]
pub struct Limits {
    /// Minimum charge amount (inclusive). Default 100.00.
    pub charge_amount_min: Money,
    /// Maximum charge amount (inclusive). Default 1,000,000.00.
    pub charge_amount_max: Money,
    /// Charge amounts must be an exact multiple of this. Default 100.00.
    pub charge_amount_step: Money,
    /// Minimum credit request amount (inclusive). Default 1,000.00.
    pub credit_amount_min: Money,
    /// Maximum credit request amount (inclusive). Default 50,000,000.00.
    pub credit_amount_max: Money,
    /// Maximum idempotency key length in bytes. Default 255.
    pub max_idempotency_key_len: usize,
    /// Idempotency keys shorter than this trigger a `WeakIdempotencyKey`
    /// warning (not a rejection). Default 10.
    pub weak_idempotency_key_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            charge_amount_min: Money::from_major_minor(100, 0),
            charge_amount_max: Money::from_major_minor(1_000_000, 0),
            charge_amount_step: Money::from_major_minor(100, 0),
            credit_amount_min: Money::from_major_minor(1_000, 0),
            credit_amount_max: Money::from_major_minor(50_000_000, 0),
            max_idempotency_key_len: 255,
            weak_idempotency_key_len: 10,
        }
    }
}
