//! In-memory `CreditRequest` repository.

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use topup_core::domain::{CreditRequest, CreditRequestStatus};
use topup_core::error::{Error, Result};
use topup_core::ids::{CreditRequestId, VendorId};
use topup_core::traits::CreditRequestRepository;

/// Concurrent in-memory table of credit requests.
#[derive(Default)]
pub struct CreditRequestStore {
    rows: DashMap<CreditRequestId, RwLock<CreditRequest>>,
    by_vendor: DashMap<VendorId, Mutex<Vec<CreditRequestId>>>,
}

impl CreditRequestStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CreditRequestRepository for CreditRequestStore {
    fn insert(&self, request: CreditRequest) -> Result<()> {
        if self.rows.contains_key(&request.id) {
            return Err(Error::internal(format!("credit request {} already exists", request.id)));
        }
        self.by_vendor
            .entry(request.vendor_id)
            .or_default()
            .lock()
            .push(request.id);
        self.rows.insert(request.id, RwLock::new(request));
        Ok(())
    }

    fn get(&self, id: CreditRequestId) -> Result<CreditRequest> {
        self.rows
            .get(&id)
            .map(|r| r.read().clone())
            .ok_or_else(|| Error::credit_request_not_found(id))
    }

    fn transition(
        &self,
        id: CreditRequestId,
        to: CreditRequestStatus,
        reason: Option<String>,
    ) -> Result<CreditRequest> {
        let entry = self.rows.get(&id).ok_or_else(|| Error::credit_request_not_found(id))?;
        let mut request = entry.write();
        if request.status != CreditRequestStatus::Pending {
            return Err(Error::already_processed(id));
        }
        request.status = to;
        request.rejection_reason = reason;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    fn list_for_vendor(&self, vendor_id: VendorId) -> Result<Vec<CreditRequest>> {
        let ids = match self.by_vendor.get(&vendor_id) {
            Some(list) => list.lock().clone(),
            None => Vec::new(),
        };
        Ok(ids
            .into_iter()
            .rev()
            .filter_map(|id| self.rows.get(&id).map(|r| r.read().clone()))
            .collect())
    }
}
