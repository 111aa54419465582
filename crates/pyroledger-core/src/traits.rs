//! Store interfaces at the injection seams of the integrity core.
//!
//! The core never owns persistence. Each component receives the store it
//! needs as an `Arc<dyn Trait>`:
//!
//! - `AuditLogStore`: append-only sink and read-only query surface for audit entries
//! - `CertificateStore`: keyed certificate storage with an atomic set-if-null on `verified_at`
//! - `BatchRepository`: read-only access to batches and their lab results
//!
//! Implementations must be `Send + Sync`; requests may run concurrently.

use chrono::{DateTime, Utc};

use pyroledger_contracts::{
    audit::{AuditEntry, AuditPage, AuditQuery},
    batch::{Batch, LabResult},
    certificate::Certificate,
    error::LedgerResult,
};

/// The append-only audit log.
///
/// There is no update or delete operation: entries written
/// here are permanent.
pub trait AuditLogStore: Send + Sync {
    /// Append one entry. Entries are independent; no ordering across
    /// concurrent appends is implied beyond their own timestamps.
    fn append(&self, entry: AuditEntry) -> LedgerResult<()>;

    /// Return one page of matching entries, newest first.
    fn query(&self, query: &AuditQuery) -> LedgerResult<AuditPage>;
}

/// Keyed storage for issued certificates.
pub trait CertificateStore: Send + Sync {
    /// True if any certificate already uses `code`.
    fn code_exists(&self, code: &str) -> LedgerResult<bool>;

    /// Persist a new certificate.
    ///
    /// Must fail with `LedgerError::Contention` if the code was taken
    /// between `code_exists` and this call.
    fn insert(&self, certificate: Certificate) -> LedgerResult<()>;

    fn find_by_code(&self, code: &str) -> LedgerResult<Option<Certificate>>;

    /// Atomically set `verified_at = at` if and only if it is still `None`,
    /// then return the stored certificate.
    ///
    /// Concurrent callers must all observe the same resulting `verified_at`.
    /// May fail with `LedgerError::Contention` when the backend detects a
    /// conflicting write; callers retry. Fails with `NotFound` for an
    /// unknown code.
    fn mark_verified_if_unset(&self, code: &str, at: DateTime<Utc>) -> LedgerResult<Certificate>;

    /// Every certificate issued for `batch_id`, oldest first.
    fn list_for_batch(&self, batch_id: &str) -> LedgerResult<Vec<Certificate>>;
}

/// Read access to the batch records the issuer certifies.
pub trait BatchRepository: Send + Sync {
    fn find_batch(&self, batch_id: &str) -> LedgerResult<Option<Batch>>;

    fn lab_results_for(&self, batch_id: &str) -> LedgerResult<Vec<LabResult>>;
}
