//! Idempotency store: makes a mutating request replay-safe.

use crate::cache::TtlCache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Default time-to-live for an idempotency record (86400s).
pub const DEFAULT_TTL: Duration = Duration::from_secs(86_400);

/// Processing status of an idempotency record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Stored, not yet finalized.
    Processing,
    /// Finalized successfully.
    Completed,
    /// Finalized unsuccessfully.
    Failed,
}

/// A stored idempotency record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Caller-supplied operation payload, stored for audit/debugging.
    pub op_data: serde_json::Value,
    /// Current status.
    pub status: OperationStatus,
    /// Final result, set once by [`IdempotencyStore::update_result`].
    pub result: Option<serde_json::Value>,
}

/// Makes a `(vendor, operation)` pair replay-safe: a retried request with the
/// same key observes the original outcome instead of executing twice.
#[derive(Default)]
pub struct IdempotencyStore {
    cache: TtlCache<OperationRecord>,
}

impl IdempotencyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces a deterministic key from sorted `field=value` pairs, hashed
    /// with SHA-256 and prefixed `idempotency:`.
    pub fn generate_key(fields: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);
        let joined = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        format!("idempotency:{:x}", hasher.finalize())
    }

    /// Atomically checks for an existing record and, if absent, stores a
    /// fresh `Processing` one.
    ///
    /// Returns `(is_duplicate, prior_result)`: `is_duplicate` is `true` if a
    /// record already existed (whatever its status); `prior_result` carries
    /// its stored result, if the prior record had reached a terminal status
    /// with one recorded.
    pub fn check_and_store(&self, key: &str, op_data: serde_json::Value) -> (bool, Option<serde_json::Value>) {
        let fresh = OperationRecord {
            op_data,
            status: OperationStatus::Processing,
            result: None,
        };
        if self.cache.insert_if_absent(key.to_string(), fresh, DEFAULT_TTL) {
            (false, None)
        } else {
            let existing = self.cache.get(key);
            let prior_result = existing.and_then(|r| r.result);
            (true, prior_result)
        }
    }

    /// Overwrites the stored result and marks the record `Completed` or
    /// `Failed` based on a `"success"` boolean field in `result` (defaulting
    /// to `Failed` if absent or not a bool).
    pub fn update_result(&self, key: &str, result: serde_json::Value) {
        let success = result.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
        if let Some(mut record) = self.cache.get(key) {
            record.status = if success {
                OperationStatus::Completed
            } else {
                OperationStatus::Failed
            };
            record.result = Some(result);
            self.cache.insert(key.to_string(), record, DEFAULT_TTL);
        }
    }

    /// Returns the status of a stored record, if any (live or expired-out).
    pub fn get_status(&self, key: &str) -> Option<OperationStatus> {
        self.cache.get(key).map(|r| r.status)
    }

    /// Removes a record outright.
    pub fn clear(&self, key: &str) {
        self.cache.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generate_key_is_order_independent() {
        let a = IdempotencyStore::generate_key(&[("vendor_id", "1".into()), ("amount", "100".into())]);
        let b = IdempotencyStore::generate_key(&[("amount", "100".into()), ("vendor_id", "1".into())]);
        assert_eq!(a, b);
        assert!(a.starts_with("idempotency:"));
    }

    #[test]
    fn first_call_is_not_a_duplicate() {
        let store = IdempotencyStore::new();
        let (dup, result) = store.check_and_store("k1", json!({"amount": 100}));
        assert!(!dup);
        assert!(result.is_none());
    }

    #[test]
    fn second_call_is_a_duplicate_and_returns_prior_result() {
        let store = IdempotencyStore::new();
        let (dup, _) = store.check_and_store("k1", json!({"amount": 100}));
        assert!(!dup);
        store.update_result("k1", json!({"success": true, "transaction_id": "abc"}));

        let (dup2, result2) = store.check_and_store("k1", json!({"amount": 100}));
        assert!(dup2);
        assert_eq!(result2.unwrap()["transaction_id"], "abc");
    }

    #[test]
    fn clear_removes_the_record() {
        let store = IdempotencyStore::new();
        store.check_and_store("k1", json!({}));
        store.clear("k1");
        let (dup, _) = store.check_and_store("k1", json!({}));
        assert!(!dup);
    }
}
