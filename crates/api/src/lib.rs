//! External interface layer for the topup ledger.
//!
//! HTTP routing itself is out of scope — this crate provides the typed
//! request/response DTOs and the server-side validation rules a transport
//! layer would sit on top of, so the engine crate never has to know about
//! wire formats.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dto;
pub mod validate;

pub use dto::{
    ChargeRequest, ChargeResponse, CreditRequestDto, CreditRequestResponse, ReconcileAllResponse,
    ReconciliationResponse, TransactionDto, TransactionSummaryDto,
};
pub use validate::{validate_charge_amount, validate_credit_amount, validate_idempotency_key, validate_phone_number};
