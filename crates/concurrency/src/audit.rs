//! Audit logger: structured security events.
//!
//! Events are emitted through `tracing` rather than a bespoke sink, so they
//! flow through whatever subscriber the host process installs, tagged with
//! `target = "audit"` so they can be filtered or routed independently of
//! ordinary debug/info logging.

use serde::Serialize;
use topup_core::ids::VendorId;

/// Severity of an audited event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Routine, expected outcome.
    Info,
    /// Rejected request; not itself a sign of compromise.
    Warning,
    /// Invariant violation or otherwise serious condition.
    Error,
}

/// Stateless structured-logging façade for security and transaction events.
#[derive(Default, Clone, Copy)]
pub struct AuditLogger;

impl AuditLogger {
    /// Creates a logger. Stateless; cheap to construct freely.
    pub fn new() -> Self {
        AuditLogger
    }

    /// Logs a named security event with arbitrary structured `details`.
    pub fn log_event(
        &self,
        event_type: &str,
        vendor_id: Option<VendorId>,
        details: impl Serialize,
        severity: Severity,
    ) {
        let details = serde_json::to_string(&details).unwrap_or_else(|_| "<unserializable>".to_string());
        let vendor_id = vendor_id.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string());
        match severity {
            Severity::Info => {
                tracing::info!(target: "audit", event_type, vendor_id = %vendor_id, details = %details, "security event")
            }
            Severity::Warning => {
                tracing::warn!(target: "audit", event_type, vendor_id = %vendor_id, details = %details, "security event")
            }
            Severity::Error => {
                tracing::error!(target: "audit", event_type, vendor_id = %vendor_id, details = %details, "security event")
            }
        }
    }

    /// Convenience wrapper for logging the outcome of a money-moving
    /// operation.
    pub fn log_transaction_attempt(
        &self,
        vendor_id: VendorId,
        operation: &str,
        amount: topup_core::money::Money,
        success: bool,
        error: Option<&str>,
    ) {
        let severity = if success { Severity::Info } else { Severity::Warning };
        self.log_event(
            "TRANSACTION_ATTEMPT",
            Some(vendor_id),
            serde_json::json!({
                "operation": operation,
                "amount": amount.to_string(),
                "success": success,
                "error": error,
            }),
            severity,
        );
    }
}
