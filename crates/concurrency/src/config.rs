//! Configuration for the Safety Kernel.
//!
//! Plain struct with a `Default` impl matching the documented production
//! defaults; reading these from process environment variables is left to
//! whatever thin wrapper embeds this crate (out of scope, same as the HTTP
//! layer).

use std::time::Duration;

/// A named rate-limit rule: an operation may occur `limit` times per
/// `window`.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitRule {
    /// Maximum occurrences per window.
    pub limit: u64,
    /// Window length.
    pub window: Duration,
}

/// Tunables for every Safety Kernel component, named after the environment
/// variables a deployment would set them from.
#[derive(Debug, Clone)]
pub struct SafetyKernelConfig {
    /// `DISTRIBUTED_LOCK_TIMEOUT`, default 30s.
    pub distributed_lock_timeout: Duration,
    /// `IDEMPOTENCY_TIMEOUT`, default 86400s (24h).
    pub idempotency_ttl: Duration,
    /// `DOUBLE_SPENDING_TIMEOUT`, default 300s.
    pub double_spend_ttl: Duration,
    /// `charge_vendor_<id>` rate limit: 100/60s.
    pub charge_rate_limit: RateLimitRule,
    /// `credit_request_vendor_<id>` rate limit: 10/60s.
    pub credit_request_rate_limit: RateLimitRule,
    /// Burst-protection threshold: 3 identical charges.
    pub burst_threshold: u64,
    /// Burst-protection window: 10s.
    pub burst_window: Duration,
    /// Weak-idempotency-key warning threshold: below 10 chars.
    pub weak_idempotency_key_len: usize,
}

impl Default for SafetyKernelConfig {
    fn default() -> Self {
        SafetyKernelConfig {
            distributed_lock_timeout: Duration::from_secs(30),
            idempotency_ttl: crate::idempotency::DEFAULT_TTL,
            double_spend_ttl: crate::double_spend::DEFAULT_TTL,
            charge_rate_limit: RateLimitRule {
                limit: 100,
                window: Duration::from_secs(60),
            },
            credit_request_rate_limit: RateLimitRule {
                limit: 10,
                window: Duration::from_secs(60),
            },
            burst_threshold: 3,
            burst_window: Duration::from_secs(10),
            weak_idempotency_key_len: 10,
        }
    }
}
