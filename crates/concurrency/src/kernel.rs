//! `SafetyKernel`: the typed bundle of all five safety components.
//!
//! A single `SafetyKernel` value is constructed at process start and passed
//! by reference into every service constructor — no ambient globals, no
//! module-level singletons.

use crate::audit::AuditLogger;
use crate::config::SafetyKernelConfig;
use crate::double_spend::DoubleSpendGuard;
use crate::idempotency::IdempotencyStore;
use crate::lock::DistributedLock;
use crate::rate_limiter::RateLimiter;

/// Bundles the Distributed Lock, Idempotency Store, Double-Spend Guard, Rate
/// Limiter, and Audit Logger behind one value.
///
/// Constructed once at process start and held behind a shared reference
/// (typically `Arc<SafetyKernel>`) by every service; there is no teardown
/// step beyond dropping it.
pub struct SafetyKernel {
    /// Cross-process serialization for otherwise-concurrent mutations.
    pub lock: DistributedLock,
    /// Replay-safety for mutating requests.
    pub idempotency: IdempotencyStore,
    /// Short-lived in-flight-operation guard.
    pub double_spend: DoubleSpendGuard,
    /// Per-key fixed-window throttling.
    pub rate_limiter: RateLimiter,
    /// Structured security/audit event sink.
    pub audit: AuditLogger,
    /// Tunables shared by the components above.
    pub config: SafetyKernelConfig,
}

impl SafetyKernel {
    /// Builds a kernel with the given configuration.
    pub fn new(config: SafetyKernelConfig) -> Self {
        SafetyKernel {
            lock: DistributedLock::new(),
            idempotency: IdempotencyStore::new(),
            double_spend: DoubleSpendGuard::new(),
            rate_limiter: RateLimiter::new(),
            audit: AuditLogger::new(),
            config,
        }
    }
}

impl Default for SafetyKernel {
    fn default() -> Self {
        Self::new(SafetyKernelConfig::default())
    }
}
