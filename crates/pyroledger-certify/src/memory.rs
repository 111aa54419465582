//! In-memory stores for certificates and batch records.
//!
//! `InMemoryCertificateStore` performs the set-if-null on `verified_at`
//! under a single `Mutex`, which gives the single-row atomicity the
//! verifier relies on. `InMemoryBatchRepository` stands in for the
//! relational store the dashboard writes batches and lab results to.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};

use pyroledger_contracts::{
    batch::{Batch, LabResult},
    certificate::Certificate,
    error::{LedgerError, LedgerResult},
};
use pyroledger_core::traits::{BatchRepository, CertificateStore};

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> LedgerResult<MutexGuard<'a, T>> {
    mutex.lock().map_err(|e| LedgerError::Store {
        reason: format!("{} lock poisoned: {}", what, e),
    })
}

// ── Certificates ──────────────────────────────────────────────────────────────

/// Certificates keyed by code. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct InMemoryCertificateStore {
    pub(crate) by_code: Arc<Mutex<HashMap<String, Certificate>>>,
}

impl InMemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored certificates. Reads 0 if the lock is poisoned; every
    /// trait method reports that case as `LedgerError::Store`.
    pub fn len(&self) -> usize {
        self.by_code.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CertificateStore for InMemoryCertificateStore {
    fn code_exists(&self, code: &str) -> LedgerResult<bool> {
        Ok(lock(&self.by_code, "certificate store")?.contains_key(code))
    }

    fn insert(&self, certificate: Certificate) -> LedgerResult<()> {
        let mut map = lock(&self.by_code, "certificate store")?;
        if map.contains_key(&certificate.code) {
            return Err(LedgerError::Contention {
                reason: format!("code '{}' already in use", certificate.code),
            });
        }
        map.insert(certificate.code.clone(), certificate);
        Ok(())
    }

    fn find_by_code(&self, code: &str) -> LedgerResult<Option<Certificate>> {
        Ok(lock(&self.by_code, "certificate store")?.get(code).cloned())
    }

    fn mark_verified_if_unset(&self, code: &str, at: DateTime<Utc>) -> LedgerResult<Certificate> {
        let mut map = lock(&self.by_code, "certificate store")?;
        let certificate = map
            .get_mut(code)
            .ok_or_else(|| LedgerError::not_found("certificate", code))?;
        if certificate.verified_at.is_none() {
            certificate.verified_at = Some(at);
        }
        Ok(certificate.clone())
    }

    fn list_for_batch(&self, batch_id: &str) -> LedgerResult<Vec<Certificate>> {
        let map = lock(&self.by_code, "certificate store")?;
        let mut certificates: Vec<Certificate> = map
            .values()
            .filter(|c| c.batch_id == batch_id)
            .cloned()
            .collect();
        certificates.sort_by(|a, b| a.issued_at.cmp(&b.issued_at).then_with(|| a.code.cmp(&b.code)));
        Ok(certificates)
    }
}

// ── Batches ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct BatchTables {
    batches: HashMap<String, Batch>,
    lab_results: HashMap<String, LabResult>,
}

/// Batches and lab results keyed by id. Cloning shares the tables.
#[derive(Clone, Default)]
pub struct InMemoryBatchRepository {
    tables: Arc<Mutex<BatchTables>>,
}

impl InMemoryBatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a batch.
    pub fn put_batch(&self, batch: Batch) -> LedgerResult<()> {
        lock(&self.tables, "batch repository")?
            .batches
            .insert(batch.id.clone(), batch);
        Ok(())
    }

    /// Insert or replace a lab result.
    pub fn put_lab_result(&self, lab: LabResult) -> LedgerResult<()> {
        lock(&self.tables, "batch repository")?
            .lab_results
            .insert(lab.id.clone(), lab);
        Ok(())
    }

    /// Remove a lab result, returning it if it existed.
    pub fn remove_lab_result(&self, lab_id: &str) -> LedgerResult<Option<LabResult>> {
        Ok(lock(&self.tables, "batch repository")?.lab_results.remove(lab_id))
    }
}

impl BatchRepository for InMemoryBatchRepository {
    fn find_batch(&self, batch_id: &str) -> LedgerResult<Option<Batch>> {
        Ok(lock(&self.tables, "batch repository")?.batches.get(batch_id).cloned())
    }

    /// Lab results in no particular order; the issuer sorts them.
    fn lab_results_for(&self, batch_id: &str) -> LedgerResult<Vec<LabResult>> {
        Ok(lock(&self.tables, "batch repository")?
            .lab_results
            .values()
            .filter(|lab| lab.batch_id == batch_id)
            .cloned()
            .collect())
    }
}
