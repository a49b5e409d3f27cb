//! Request validation: the checks a caller must pass before an amount,
//! phone number, or idempotency key is allowed to reach a service.

use topup_core::error::Error;
use topup_core::limits::Limits;
use topup_core::money::Money;
use topup_core::phone::PhoneNumber;

/// Validates a charge amount against [`Limits::charge_amount_min`],
/// `charge_amount_max`, and `charge_amount_step`.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] if `amount` is out of range or not a
/// multiple of the step.
pub fn validate_charge_amount(amount: Money, limits: &Limits) -> Result<(), Error> {
    if amount < limits.charge_amount_min || amount > limits.charge_amount_max {
        return Err(Error::invalid_amount(
            amount,
            format!("must be between {} and {}", limits.charge_amount_min, limits.charge_amount_max),
        ));
    }
    if !amount.is_multiple_of(limits.charge_amount_step) {
        return Err(Error::invalid_amount(amount, format!("must be a multiple of {}", limits.charge_amount_step)));
    }
    Ok(())
}

/// Validates a credit request amount against [`Limits::credit_amount_min`]
/// and `credit_amount_max`.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] if `amount` is out of range.
pub fn validate_credit_amount(amount: Money, limits: &Limits) -> Result<(), Error> {
    if amount < limits.credit_amount_min || amount > limits.credit_amount_max {
        return Err(Error::invalid_amount(
            amount,
            format!("must be between {} and {}", limits.credit_amount_min, limits.credit_amount_max),
        ));
    }
    Ok(())
}

/// Parses and validates an E.164 phone number.
///
/// # Errors
/// Returns [`Error::InvalidPhoneNumber`] if `raw` is not a valid E.164
/// mobile number.
pub fn validate_phone_number(raw: &str) -> Result<PhoneNumber, Error> {
    PhoneNumber::parse(raw)
}

/// Validates an optional caller-supplied idempotency key's length. A `None`
/// key (server-synthesized) always passes.
///
/// # Errors
/// Returns [`Error::InvalidIdempotencyKey`] if `key` exceeds
/// `limits.max_idempotency_key_len`.
pub fn validate_idempotency_key(key: Option<&str>, limits: &Limits) -> Result<(), Error> {
    match key {
        Some(k) if k.len() > limits.max_idempotency_key_len => {
            Err(Error::invalid_idempotency_key(k.len(), limits.max_idempotency_key_len))
        }
        _ => Ok(()),
    }
}
