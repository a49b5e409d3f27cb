//! Charge Service: the eight-level `charge_phone` pipeline.

use crate::journal::{NewTransaction, TransactionJournalService};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use topup_core::domain::{Charge, Transaction, TransactionType, Vendor};
use topup_core::error::{Error, Result};
use topup_core::ids::{ChargeId, VendorId};
use topup_core::money::Money;
use topup_core::phone::PhoneNumber;
use topup_core::traits::{ChargeRepository, VendorRepository};
use topup_concurrency::{IdempotencyStore, SafetyKernel, Severity};
use topup_storage::{ChargeStore, VendorStore};

/// The result of a successful [`ChargeService::charge_phone`] call.
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    /// The recorded SALE transaction (the original one, on an idempotent
    /// replay).
    pub transaction: Transaction,
    /// Human-readable outcome message (`"charged successfully"` or
    /// `"already charged"` on replay).
    pub message: String,
}

/// Debits a vendor's balance and records a sale, end to end, under the full
/// safety pipeline.
pub struct ChargeService {
    vendors: Arc<VendorStore>,
    charges: Arc<ChargeStore>,
    journal: Arc<TransactionJournalService>,
    kernel: Arc<SafetyKernel>,
}

impl ChargeService {
    /// Builds a charge service over the given stores and kernel.
    pub fn new(
        vendors: Arc<VendorStore>,
        charges: Arc<ChargeStore>,
        journal: Arc<TransactionJournalService>,
        kernel: Arc<SafetyKernel>,
    ) -> Self {
        ChargeService {
            vendors,
            charges,
            journal,
            kernel,
        }
    }

    /// Debits `vendor`'s balance by `amount` and records a SALE to
    /// `phone_number`. `vendor` is the caller's snapshot — its `version`
    /// anchors the optimistic concurrency check at L4.
    pub fn charge_phone(
        &self,
        vendor: &Vendor,
        phone_number: &PhoneNumber,
        amount: Money,
        idempotency_key: Option<String>,
    ) -> Result<ChargeOutcome> {
        let vendor_id = vendor.id;
        let cfg = self.kernel.config.clone();

        // L1: rate limit.
        if let Err(err) = self.kernel.rate_limiter.check_and_increment(
            &format!("charge_vendor_{vendor_id}"),
            cfg.charge_rate_limit.limit,
            cfg.charge_rate_limit.window,
        ) {
            self.kernel
                .audit
                .log_transaction_attempt(vendor_id, "charge_phone", amount, false, Some("RateLimited"));
            return Err(err);
        }

        // L1.5: double-spend guard.
        let (accepted, guard_key) =
            self.kernel
                .double_spend
                .create_record(vendor_id, amount, "mobile_charge", Some(phone_number.as_str()));
        if !accepted {
            let err = Error::duplicate_in_flight(vendor_id);
            self.kernel
                .audit
                .log_transaction_attempt(vendor_id, "charge_phone", amount, false, Some("DuplicateInFlight"));
            return Err(err);
        }

        let outcome = self.charge_after_guard(vendor, phone_number, amount, idempotency_key, &cfg);

        let (tx_id_for_finalize, success) = match &outcome {
            Ok(o) => (Some(o.transaction.id), true),
            Err(_) => (None, false),
        };
        self.kernel.double_spend.finalize_record(&guard_key, tx_id_for_finalize, success);
        self.kernel.audit.log_transaction_attempt(
            vendor_id,
            "charge_phone",
            amount,
            success,
            outcome.as_ref().err().map(|e| format!("{:?}", e.kind())).as_deref(),
        );

        outcome
    }

    fn charge_after_guard(
        &self,
        vendor: &Vendor,
        phone_number: &PhoneNumber,
        amount: Money,
        idempotency_key: Option<String>,
        cfg: &topup_concurrency::SafetyKernelConfig,
    ) -> Result<ChargeOutcome> {
        let vendor_id = vendor.id;

        // L2: idempotency.
        let weak_key = match &idempotency_key {
            Some(k) => k.len() < cfg.weak_idempotency_key_len,
            None => true,
        };
        if weak_key {
            self.kernel.audit.log_event(
                "WEAK_IDEMPOTENCY_KEY",
                Some(vendor_id),
                serde_json::json!({ "provided": idempotency_key.is_some() }),
                Severity::Warning,
            );
        }
        let key = idempotency_key.clone().unwrap_or_else(|| {
            IdempotencyStore::generate_key(&[
                ("vendor_id", vendor_id.to_string()),
                ("op", "charge".to_string()),
                ("phone", phone_number.to_string()),
                ("amount", amount.to_string()),
            ])
        });

        let (is_duplicate, prior_result) = self.kernel.idempotency.check_and_store(
            &key,
            serde_json::json!({
                "vendor_id": vendor_id.to_string(),
                "phone": phone_number.to_string(),
                "amount": amount.to_string(),
            }),
        );
        if is_duplicate {
            if let Some(tx) = self.journal.resolve_idempotent_replay(&prior_result) {
                return Ok(ChargeOutcome {
                    transaction: tx,
                    message: "already charged".to_string(),
                });
            }
            return Err(Error::duplicate(key));
        }

        let result = self.charge_locked(vendor_id, phone_number, amount, vendor.version, &key, cfg);
        match &result {
            Ok(outcome) => {
                self.kernel.idempotency.update_result(
                    &key,
                    serde_json::json!({ "success": true, "transaction_id": outcome.transaction.id.to_string() }),
                );
            }
            Err(e) => {
                self.kernel
                    .idempotency
                    .update_result(&key, serde_json::json!({ "success": false, "error": format!("{:?}", e.kind()) }));
            }
        }
        result
    }

    fn charge_locked(
        &self,
        vendor_id: VendorId,
        phone_number: &PhoneNumber,
        amount: Money,
        expected_version: u64,
        idempotency_key: &str,
        cfg: &topup_concurrency::SafetyKernelConfig,
    ) -> Result<ChargeOutcome> {
        // L3: distributed lock, released automatically when this guard
        // drops (including via an early `?` return).
        let _guard = self
            .kernel
            .lock
            .acquire_guard(&format!("vendor_charge_{vendor_id}"), cfg.distributed_lock_timeout)?;

        let (day_start, day_end) = today_range();
        let burst_start = Utc::now() - ChronoDuration::from_std(cfg.burst_window).unwrap_or(ChronoDuration::seconds(10));
        let burst_end = Utc::now() + ChronoDuration::seconds(1);

        // L4 (re-read + optimistic version check), L5 (business
        // validation), L6 (burst protection), and L7 (atomic decrement) all
        // run while the vendor's row lock is held, matching `SELECT ... FOR
        // UPDATE` holding the row across validation and mutation.
        let (balance_before, updated) = self.vendors.with_lock(vendor_id, |v| {
            if v.version != expected_version {
                return Err(Error::concurrency_conflict(vendor_id, expected_version, v.version));
            }
            if !v.is_active {
                return Err(Error::inactive_vendor(vendor_id));
            }
            if v.balance < amount {
                return Err(Error::insufficient_funds(vendor_id, v.balance, amount));
            }
            let (today_sales, _) = self.journal.today_total(vendor_id, TransactionType::Sale, day_start, day_end)?;
            let projected = today_sales
                .checked_add(amount)
                .ok_or_else(|| Error::internal("daily total overflow"))?;
            if projected > v.daily_limit {
                return Err(Error::daily_limit_exceeded(vendor_id, today_sales, amount, v.daily_limit));
            }
            let matching = self
                .journal
                .count_matching_sales(vendor_id, phone_number, amount, burst_start, burst_end)?;
            if matching >= cfg.burst_threshold {
                return Err(Error::suspicious_burst(vendor_id, matching));
            }

            let balance_before = v.balance;
            v.balance = v
                .balance
                .checked_sub(amount)
                .ok_or_else(|| Error::internal("balance underflow"))?;
            v.version += 1;
            v.updated_at = Utc::now();
            Ok((balance_before, v.clone()))
        })?;

        if updated.balance.is_negative() {
            return Err(Error::internal("balance went negative after charge"));
        }

        // L8: journal entry + denormalized charge row.
        let tx = self.journal.create_transaction_record(
            NewTransaction {
                vendor_id,
                transaction_type: TransactionType::Sale,
                amount,
                phone_number: Some(phone_number.clone()),
                credit_request_id: None,
                idempotency_key: Some(idempotency_key.to_string()),
                description: None,
            },
            balance_before,
            updated.balance,
        )?;

        self.charges.insert(Charge {
            id: ChargeId::new(),
            vendor_id,
            transaction_id: tx.id,
            phone_number: phone_number.clone(),
            amount,
            created_at: Utc::now(),
        })?;

        Ok(ChargeOutcome {
            transaction: tx,
            message: "charged successfully".to_string(),
        })
    }
}

pub(crate) fn today_range() -> (DateTime<Utc>, DateTime<Utc>) {
    let now = Utc::now();
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_local_timezone(Utc)
        .unwrap();
    let end = start + ChronoDuration::days(1);
    (start, end)
}
