//! Phone number validation.
//!
//! No phone-number crate appears anywhere in the reference pack, so this is a
//! small hand-written E.164 shape check rather than a dependency: a leading
//! `+`, 8 to 15 digits total, first digit non-zero.

use crate::error::Error;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static E164_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+[1-9][0-9]{7,14}$").unwrap());

/// A validated E.164 phone number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validates and wraps a phone number string.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        if E164_PATTERN.is_match(raw) {
            Ok(PhoneNumber(raw.to_string()))
        } else {
            Err(Error::invalid_phone_number(raw, "not a valid E.164 number"))
        }
    }

    /// The validated number as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_e164() {
        assert!(PhoneNumber::parse("+989121234567").is_ok());
    }

    #[test]
    fn rejects_missing_plus() {
        assert!(PhoneNumber::parse("989121234567").is_err());
    }

    #[test]
    fn rejects_leading_zero_after_plus() {
        assert!(PhoneNumber::parse("+0123456789").is_err());
    }

    #[test]
    fn rejects_too_short() {
        assert!(PhoneNumber::parse("+1234").is_err());
    }

    #[test]
    fn rejects_non_digits() {
        assert!(PhoneNumber::parse("+98912abc4567").is_err());
    }
}
