//! Request/response DTOs: plain serde-derived shapes for the bodies the
//! external HTTP contract carries. No HTTP routing lives here —
//! only the typed values a transport layer would serialize and a caller
//! would construct.

use serde::{Deserialize, Serialize};
use topup_core::domain::{Charge, CreditRequest, Transaction};
use topup_core::ids::{ChargeId, CreditRequestId, TransactionId, VendorId};
use topup_core::money::Money;
use topup_core::phone::PhoneNumber;

/// `POST /charges` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// The phone number to charge.
    pub phone_number: String,
    /// The charge amount.
    pub amount: Money,
    /// Caller-supplied idempotency key; synthesized server-side if absent.
    pub idempotency_key: Option<String>,
}

/// `POST /charges` 201 response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeResponse {
    /// The transaction this charge produced.
    pub transaction_id: TransactionId,
    /// The charged phone number.
    pub phone_number: PhoneNumber,
    /// The charged amount.
    pub amount: Money,
    /// The vendor's balance after the charge.
    pub remaining_balance: Money,
}

impl ChargeResponse {
    /// Builds a response from the underlying charge and its transaction.
    pub fn from_charge(charge: &Charge, remaining_balance: Money) -> Self {
        ChargeResponse {
            transaction_id: charge.transaction_id,
            phone_number: charge.phone_number.clone(),
            amount: charge.amount,
            remaining_balance,
        }
    }
}

/// `POST /credits` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditRequestDto {
    /// The requested credit amount.
    pub amount: Money,
}

/// `GET /credits` / `POST /credits` 201 response body: a single credit
/// request's current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditRequestResponse {
    /// The request id.
    pub id: CreditRequestId,
    /// The vendor it belongs to.
    pub vendor_id: VendorId,
    /// The requested amount.
    pub amount: Money,
    /// Current status, lowercased (`"pending"`, `"approved"`, `"rejected"`).
    pub status: String,
    /// Set only when `status == "rejected"`.
    pub rejection_reason: Option<String>,
}

impl From<&CreditRequest> for CreditRequestResponse {
    fn from(r: &CreditRequest) -> Self {
        CreditRequestResponse {
            id: r.id,
            vendor_id: r.vendor_id,
            amount: r.amount,
            status: format!("{:?}", r.status).to_lowercase(),
            rejection_reason: r.rejection_reason.clone(),
        }
    }
}

/// A single row in a `GET /transactions` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDto {
    /// The transaction id.
    pub id: TransactionId,
    /// Direction, lowercased (`"credit"` or `"sale"`).
    pub transaction_type: String,
    /// The amount.
    pub amount: Money,
    /// Present for sales.
    pub phone_number: Option<PhoneNumber>,
    /// Balance immediately before this transaction.
    pub balance_before: Money,
    /// Balance immediately after this transaction.
    pub balance_after: Money,
    /// Status, lowercased.
    pub status: String,
    /// Whether this row reflects a finalized success.
    pub is_successful: bool,
}

impl From<&Transaction> for TransactionDto {
    fn from(tx: &Transaction) -> Self {
        TransactionDto {
            id: tx.id,
            transaction_type: format!("{:?}", tx.transaction_type).to_lowercase(),
            amount: tx.amount,
            phone_number: tx.phone_number.clone(),
            balance_before: tx.balance_before,
            balance_after: tx.balance_after,
            status: format!("{:?}", tx.status).to_lowercase(),
            is_successful: tx.is_successful,
        }
    }
}

/// `GET /transactions` response body: rows plus the vendor's running
/// balance summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSummaryDto {
    /// Matching transactions, newest first.
    pub data: Vec<TransactionDto>,
    /// Sum of matching successful credits.
    pub total_credits: Money,
    /// Sum of matching successful sales.
    pub total_sales: Money,
}

/// One vendor's reconciliation result, as served by
/// `GET /transactions/reconcile/{vendor_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationResponse {
    /// The vendor checked.
    pub vendor_id: VendorId,
    /// Display name.
    pub vendor_name: String,
    /// `Vendor::balance` as currently stored.
    pub stored_balance: Money,
    /// The balance the journal implies.
    pub calculated_balance: Money,
    /// `stored_balance - calculated_balance`.
    pub difference: Money,
    /// Whether the two agree within tolerance.
    pub is_consistent: bool,
}

impl From<&topup_engine::reconciliation::VendorReconciliation> for ReconciliationResponse {
    fn from(r: &topup_engine::reconciliation::VendorReconciliation) -> Self {
        ReconciliationResponse {
            vendor_id: r.vendor_id,
            vendor_name: r.vendor_name.clone(),
            stored_balance: r.stored_balance,
            calculated_balance: r.calculated_balance,
            difference: r.difference,
            is_consistent: r.is_consistent,
        }
    }
}

/// `GET /transactions/reconcile-all` response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileAllResponse {
    /// Total vendors checked.
    pub total_vendors: u64,
    /// Vendors whose balances are consistent.
    pub consistent_vendors: u64,
    /// Vendors whose balances are not consistent.
    pub inconsistent_vendors: u64,
    /// Per-vendor detail.
    pub vendors: Vec<ReconciliationResponse>,
}

impl From<&topup_engine::reconciliation::ReconciliationReport> for ReconcileAllResponse {
    fn from(report: &topup_engine::reconciliation::ReconciliationReport) -> Self {
        ReconcileAllResponse {
            total_vendors: report.total_vendors,
            consistent_vendors: report.consistent_vendors,
            inconsistent_vendors: report.inconsistent_vendors,
            vendors: report.vendor_results.iter().map(ReconciliationResponse::from).collect(),
        }
    }
}
