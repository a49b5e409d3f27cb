//! Credit Service: credit request submission, admin approval/rejection,
//! and direct administrative balance increases.

use crate::charge_service::today_range;
use crate::journal::{NewTransaction, TransactionJournalService};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use topup_core::domain::{CreditRequest, CreditRequestStatus, Transaction, TransactionStatus, TransactionType, Vendor};
use topup_core::error::{Error, Result};
use topup_core::ids::{CreditRequestId, VendorId};
use topup_core::money::Money;
use topup_core::traits::{CreditRequestRepository, TransactionStatusUpdate, VendorRepository};
use topup_concurrency::{IdempotencyStore, SafetyKernel, SafetyKernelConfig};
use topup_storage::{CreditRequestStore, VendorStore};

/// Fixed timeout for the per-request rejection lock.
const REJECTION_LOCK_TIMEOUT: Duration = Duration::from_secs(15);

/// Submits, approves, and rejects vendor credit requests, and performs
/// direct administrative balance increases.
pub struct CreditService {
    vendors: Arc<VendorStore>,
    credit_requests: Arc<CreditRequestStore>,
    journal: Arc<TransactionJournalService>,
    kernel: Arc<SafetyKernel>,
}

impl CreditService {
    /// Builds a credit service over the given stores and kernel.
    pub fn new(
        vendors: Arc<VendorStore>,
        credit_requests: Arc<CreditRequestStore>,
        journal: Arc<TransactionJournalService>,
        kernel: Arc<SafetyKernel>,
    ) -> Self {
        CreditService {
            vendors,
            credit_requests,
            journal,
            kernel,
        }
    }

    /// Submits a new credit request for `vendor`, pending admin action.
    pub fn create_credit_request(&self, vendor: &Vendor, amount: Money) -> Result<(CreditRequest, String)> {
        let vendor_id = vendor.id;
        if !amount.is_positive() {
            return Err(Error::invalid_amount(amount, "must be strictly positive"));
        }

        let cfg = self.kernel.config.clone();
        self.kernel.rate_limiter.check_and_increment(
            &format!("credit_request_vendor_{vendor_id}"),
            cfg.credit_request_rate_limit.limit,
            cfg.credit_request_rate_limit.window,
        )?;

        let (accepted, guard_key) = self.kernel.double_spend.create_record(vendor_id, amount, "credit_request", None);
        if !accepted {
            return Err(Error::duplicate_in_flight(vendor_id));
        }

        match self.create_credit_request_after_guard(vendor, amount) {
            Ok(outcome) => {
                self.kernel.double_spend.finalize_record(&guard_key, None, true);
                self.kernel
                    .audit
                    .log_transaction_attempt(vendor_id, "create_credit_request", amount, true, None);
                Ok(outcome)
            }
            Err(e) => {
                self.kernel.double_spend.finalize_record(&guard_key, None, false);
                self.kernel
                    .audit
                    .log_transaction_attempt(vendor_id, "create_credit_request", amount, false, Some(&format!("{:?}", e.kind())));
                Err(e)
            }
        }
    }

    fn create_credit_request_after_guard(&self, vendor: &Vendor, amount: Money) -> Result<(CreditRequest, String)> {
        let vendor_id = vendor.id;
        let (day_start, day_end) = today_range();
        let (today_credits, _) = self.journal.today_total(vendor_id, TransactionType::Credit, day_start, day_end)?;
        let projected = today_credits
            .checked_add(amount)
            .ok_or_else(|| Error::internal("daily total overflow"))?;
        if projected > vendor.daily_limit {
            return Err(Error::daily_limit_exceeded(vendor_id, today_credits, amount, vendor.daily_limit));
        }

        // Keys today's request by minute, so two submissions of the same
        // amount within the same minute are treated as one duplicate
        // request rather than two independent ones.
        let bucket = Utc::now().timestamp() / 60;
        let key = IdempotencyStore::generate_key(&[
            ("vendor_id", vendor_id.to_string()),
            ("op", "create_credit_request".to_string()),
            ("amount", amount.to_string()),
            ("bucket", bucket.to_string()),
        ]);
        let (is_duplicate, _) = self.kernel.idempotency.check_and_store(
            &key,
            serde_json::json!({ "vendor_id": vendor_id.to_string(), "amount": amount.to_string() }),
        );
        if is_duplicate {
            return Err(Error::duplicate(key));
        }

        let request = CreditRequest::new(CreditRequestId::new(), vendor_id, amount, Utc::now());
        self.credit_requests.insert(request.clone())?;
        self.journal.create_pending_transaction(
            NewTransaction {
                vendor_id,
                transaction_type: TransactionType::Credit,
                amount,
                phone_number: None,
                credit_request_id: Some(request.id),
                idempotency_key: Some(key.clone()),
                description: None,
            },
            vendor.balance,
        )?;

        self.kernel.idempotency.update_result(&key, serde_json::json!({ "success": true }));
        Ok((request, "credit request submitted".to_string()))
    }

    /// Approves a pending credit request, crediting the vendor's balance.
    pub fn approve_credit_request(&self, request_id: CreditRequestId) -> Result<CreditRequest> {
        let _guard = self
            .kernel
            .lock
            .acquire_guard(&format!("credit_approval_{request_id}"), self.kernel.config.distributed_lock_timeout)?;

        let request = self.credit_requests.get(request_id)?;
        if request.status != CreditRequestStatus::Pending {
            return Err(Error::already_processed(request_id));
        }

        let pending_tx = self
            .journal
            .pending_for_credit_request(request_id)?
            .into_iter()
            .find(|tx| !tx.is_successful)
            .ok_or_else(|| Error::already_processed(request_id))?;

        let vendor_id = request.vendor_id;
        let amount = request.amount;
        let (day_start, day_end) = today_range();

        let (_, updated_vendor) = self.vendors.with_lock(vendor_id, |v| {
            let (today_credits, _) = self.journal.today_total(vendor_id, TransactionType::Credit, day_start, day_end)?;
            let projected = today_credits
                .checked_add(amount)
                .ok_or_else(|| Error::internal("daily total overflow"))?;
            if projected > v.daily_limit {
                return Err(Error::daily_limit_exceeded(vendor_id, today_credits, amount, v.daily_limit));
            }
            let balance_before = v.balance;
            v.balance = v.balance.checked_add(amount).ok_or_else(|| Error::internal("balance overflow"))?;
            v.version += 1;
            v.updated_at = Utc::now();
            Ok((balance_before, v.clone()))
        })?;

        self.journal.update_status(
            pending_tx.id,
            TransactionStatusUpdate {
                status: Some(TransactionStatus::Approved),
                is_successful: Some(true),
                balance_after: Some(updated_vendor.balance),
                description: None,
            },
        )?;

        let approved = self.credit_requests.transition(request_id, CreditRequestStatus::Approved, None)?;
        self.kernel
            .audit
            .log_transaction_attempt(vendor_id, "approve_credit_request", amount, true, None);
        Ok(approved)
    }

    /// Rejects a pending credit request; no balance change.
    pub fn reject_credit_request(&self, request_id: CreditRequestId, reason: String) -> Result<CreditRequest> {
        let _guard = self
            .kernel
            .lock
            .acquire_guard(&format!("credit_rejection_{request_id}"), REJECTION_LOCK_TIMEOUT)?;

        let request = self.credit_requests.get(request_id)?;
        if request.status != CreditRequestStatus::Pending {
            return Err(Error::already_processed(request_id));
        }

        for tx in self.journal.pending_for_credit_request(request_id)? {
            self.journal.update_status(
                tx.id,
                TransactionStatusUpdate {
                    status: Some(TransactionStatus::Rejected),
                    is_successful: Some(false),
                    balance_after: None,
                    description: None,
                },
            )?;
        }

        let rejected = self.credit_requests.transition(request_id, CreditRequestStatus::Rejected, Some(reason))?;
        self.kernel
            .audit
            .log_transaction_attempt(request.vendor_id, "reject_credit_request", request.amount, true, None);
        Ok(rejected)
    }

    /// Directly increases a vendor's balance, bypassing the request/approval
    /// flow (administrative top-ups). Same safety pipeline as
    /// [`crate::charge_service::ChargeService::charge_phone`], but the sign
    /// is `+`, there is no phone number, and the cap checked is the daily
    /// credit cap rather than the daily sale cap.
    pub fn increase_balance(
        &self,
        vendor: &Vendor,
        amount: Money,
        credit_request_id: Option<CreditRequestId>,
        idempotency_key: Option<String>,
    ) -> Result<Transaction> {
        let vendor_id = vendor.id;
        if !amount.is_positive() {
            return Err(Error::invalid_amount(amount, "must be strictly positive"));
        }
        let cfg = self.kernel.config.clone();

        self.kernel.rate_limiter.check_and_increment(
            &format!("credit_increase_vendor_{vendor_id}"),
            cfg.credit_request_rate_limit.limit,
            cfg.credit_request_rate_limit.window,
        )?;

        let (accepted, guard_key) = self.kernel.double_spend.create_record(vendor_id, amount, "increase_balance", None);
        if !accepted {
            return Err(Error::duplicate_in_flight(vendor_id));
        }

        let outcome = self.increase_balance_after_guard(vendor, amount, credit_request_id, idempotency_key, &cfg);

        match &outcome {
            Ok(tx) => {
                self.kernel.double_spend.finalize_record(&guard_key, Some(tx.id), true);
                self.kernel
                    .audit
                    .log_transaction_attempt(vendor_id, "increase_balance", amount, true, None);
            }
            Err(e) => {
                self.kernel.double_spend.finalize_record(&guard_key, None, false);
                self.kernel
                    .audit
                    .log_transaction_attempt(vendor_id, "increase_balance", amount, false, Some(&format!("{:?}", e.kind())));
            }
        }
        outcome
    }

    fn increase_balance_after_guard(
        &self,
        vendor: &Vendor,
        amount: Money,
        credit_request_id: Option<CreditRequestId>,
        idempotency_key: Option<String>,
        cfg: &SafetyKernelConfig,
    ) -> Result<Transaction> {
        let vendor_id = vendor.id;
        let key = idempotency_key.unwrap_or_else(|| {
            IdempotencyStore::generate_key(&[
                ("vendor_id", vendor_id.to_string()),
                ("op", "increase_balance".to_string()),
                ("amount", amount.to_string()),
            ])
        });

        let (is_duplicate, prior_result) = self.kernel.idempotency.check_and_store(
            &key,
            serde_json::json!({ "vendor_id": vendor_id.to_string(), "amount": amount.to_string() }),
        );
        if is_duplicate {
            if let Some(tx) = self.journal.resolve_idempotent_replay(&prior_result) {
                return Ok(tx);
            }
            return Err(Error::duplicate(key));
        }

        let _guard = self
            .kernel
            .lock
            .acquire_guard(&format!("vendor_balance_{vendor_id}"), cfg.distributed_lock_timeout)?;

        let (day_start, day_end) = today_range();
        let expected_version = vendor.version;
        let (balance_before, updated) = self.vendors.with_lock(vendor_id, |v| {
            if v.version != expected_version {
                return Err(Error::concurrency_conflict(vendor_id, expected_version, v.version));
            }
            let (today_credits, _) = self.journal.today_total(vendor_id, TransactionType::Credit, day_start, day_end)?;
            let projected = today_credits
                .checked_add(amount)
                .ok_or_else(|| Error::internal("daily total overflow"))?;
            if projected > v.daily_limit {
                return Err(Error::daily_limit_exceeded(vendor_id, today_credits, amount, v.daily_limit));
            }
            let balance_before = v.balance;
            v.balance = v.balance.checked_add(amount).ok_or_else(|| Error::internal("balance overflow"))?;
            v.version += 1;
            v.updated_at = Utc::now();
            Ok((balance_before, v.clone()))
        })?;

        self.journal.create_transaction_record(
            NewTransaction {
                vendor_id,
                transaction_type: TransactionType::Credit,
                amount,
                phone_number: None,
                credit_request_id,
                idempotency_key: Some(key.clone()),
                description: None,
            },
            balance_before,
            updated.balance,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topup_storage::TransactionStore;

    struct Fixture {
        service: CreditService,
        vendors: Arc<VendorStore>,
    }

    fn setup(daily_limit: Money) -> Fixture {
        let vendors = Arc::new(VendorStore::new());
        let transactions = Arc::new(TransactionStore::new());
        let credit_requests = Arc::new(CreditRequestStore::new());
        let journal = Arc::new(TransactionJournalService::new(transactions));
        let kernel = Arc::new(SafetyKernel::default());

        let vendor = Vendor::new(VendorId::new(1), "acme", daily_limit, Utc::now());
        vendors.insert(vendor).unwrap();

        let service = CreditService::new(vendors.clone(), credit_requests, journal, kernel);
        Fixture { service, vendors }
    }

    #[test]
    fn create_then_approve_credits_the_vendor() {
        let fx = setup(Money::from_major_minor(1_000_000, 0));
        let vendor = fx.vendors.get(VendorId::new(1)).unwrap();
        let (request, message) = fx
            .service
            .create_credit_request(&vendor, Money::from_major_minor(500, 0))
            .unwrap();
        assert_eq!(message, "credit request submitted");
        assert_eq!(request.status, CreditRequestStatus::Pending);

        let approved = fx.service.approve_credit_request(request.id).unwrap();
        assert_eq!(approved.status, CreditRequestStatus::Approved);

        let updated = fx.vendors.get(VendorId::new(1)).unwrap();
        assert_eq!(updated.balance.to_string(), "500.00");
        assert_eq!(updated.version, 2);
    }

    #[test]
    fn approving_twice_fails_already_processed() {
        let fx = setup(Money::from_major_minor(1_000_000, 0));
        let vendor = fx.vendors.get(VendorId::new(1)).unwrap();
        let (request, _) = fx
            .service
            .create_credit_request(&vendor, Money::from_major_minor(500, 0))
            .unwrap();
        fx.service.approve_credit_request(request.id).unwrap();
        let err = fx.service.approve_credit_request(request.id).unwrap_err();
        assert_eq!(err.kind(), topup_core::error::ErrorKind::AlreadyProcessed);
    }

    #[test]
    fn reject_leaves_balance_unchanged() {
        let fx = setup(Money::from_major_minor(1_000_000, 0));
        let vendor = fx.vendors.get(VendorId::new(1)).unwrap();
        let (request, _) = fx
            .service
            .create_credit_request(&vendor, Money::from_major_minor(500, 0))
            .unwrap();
        let rejected = fx
            .service
            .reject_credit_request(request.id, "not authorized".to_string())
            .unwrap();
        assert_eq!(rejected.status, CreditRequestStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("not authorized"));

        let updated = fx.vendors.get(VendorId::new(1)).unwrap();
        assert_eq!(updated.balance.to_string(), "0.00", "a rejected request must not move money");
    }

    #[test]
    fn credit_request_respects_daily_limit() {
        // The cap is checked against today's *successful* CREDIT total, so
        // the first request must be approved before it counts toward it.
        let fx = setup(Money::from_major_minor(1000, 0));
        let vendor = fx.vendors.get(VendorId::new(1)).unwrap();
        let (request, _) = fx
            .service
            .create_credit_request(&vendor, Money::from_major_minor(900, 0))
            .unwrap();
        fx.service.approve_credit_request(request.id).unwrap();

        let vendor = fx.vendors.get(VendorId::new(1)).unwrap();
        let err = fx
            .service
            .create_credit_request(&vendor, Money::from_major_minor(200, 0))
            .unwrap_err();
        assert_eq!(err.kind(), topup_core::error::ErrorKind::DailyLimitExceeded);
    }

    #[test]
    fn increase_balance_bumps_balance_directly() {
        let fx = setup(Money::from_major_minor(1_000_000, 0));
        let vendor = fx.vendors.get(VendorId::new(1)).unwrap();
        let tx = fx
            .service
            .increase_balance(&vendor, Money::from_major_minor(250, 0), None, Some("admin-topup-1".to_string()))
            .unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Credit);
        let updated = fx.vendors.get(VendorId::new(1)).unwrap();
        assert_eq!(updated.balance.to_string(), "250.00");
    }
}
