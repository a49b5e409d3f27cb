//! The Safety Kernel: the transactional core's concurrency-safety machinery.
//!
//! Five components, all stateless except for the cache they front:
//! - [`lock`]: Distributed Lock
//! - [`idempotency`]: Idempotency Store
//! - [`double_spend`]: Double-Spend Guard
//! - [`rate_limiter`]: Rate Limiter
//! - [`audit`]: Audit Logger
//!
//! [`kernel::SafetyKernel`] bundles all five behind one value, constructed
//! once at process start and passed by reference into service constructors.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audit;
pub mod cache;
pub mod config;
pub mod double_spend;
pub mod idempotency;
pub mod kernel;
pub mod lock;
pub mod rate_limiter;

pub use audit::{AuditLogger, Severity};
pub use cache::TtlCache;
pub use config::{RateLimitRule, SafetyKernelConfig};
pub use double_spend::DoubleSpendGuard;
pub use idempotency::{IdempotencyStore, OperationRecord, OperationStatus};
pub use kernel::SafetyKernel;
pub use lock::{DistributedLock, LockGuard, LockIdentifier};
pub use rate_limiter::RateLimiter;
