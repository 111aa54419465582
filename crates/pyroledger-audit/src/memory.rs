//! In-memory implementation of `AuditLogStore`.
//!
//! `InMemoryAuditLog` is the reference implementation of the
//! `AuditLogStore` trait. It keeps all entries in a `Vec` protected by a
//! `Mutex`, making it safe to share across threads while concurrent
//! requests append.
//!
//! There is no API that edits or removes a stored entry.

use std::sync::{Arc, Mutex};

use pyroledger_contracts::{
    audit::{AuditEntry, AuditPage, AuditQuery},
    error::{LedgerError, LedgerResult},
};
use pyroledger_core::traits::AuditLogStore;

/// An in-memory, append-only audit log.
///
/// Cloning shares the underlying log.
#[derive(Clone, Default)]
pub struct InMemoryAuditLog {
    pub(crate) entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries written so far.
    ///
    /// Reads 0 if the lock is poisoned; `export` and `query` report that
    /// case as `LedgerError::Store`.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every entry, in append order.
    pub fn export(&self) -> LedgerResult<Vec<AuditEntry>> {
        let entries = self.entries.lock().map_err(|e| LedgerError::Store {
            reason: format!("audit log lock poisoned: {}", e),
        })?;
        Ok(entries.clone())
    }
}

impl AuditLogStore for InMemoryAuditLog {
    fn append(&self, entry: AuditEntry) -> LedgerResult<()> {
        let mut entries = self.entries.lock().map_err(|e| LedgerError::Store {
            reason: format!("audit log lock poisoned: {}", e),
        })?;
        entries.push(entry);
        Ok(())
    }

    /// Filter, order newest first, then page.
    ///
    /// Entries with equal timestamps keep reverse append order, so the
    /// ordering is stable across calls.
    fn query(&self, query: &AuditQuery) -> LedgerResult<AuditPage> {
        let entries = self.entries.lock().map_err(|e| LedgerError::Store {
            reason: format!("audit log lock poisoned: {}", e),
        })?;

        let mut matching: Vec<(usize, &AuditEntry)> = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| query.matches(entry))
            .collect();
        matching.sort_by(|(ia, a), (ib, b)| b.recorded_at.cmp(&a.recorded_at).then(ib.cmp(ia)));

        let limit = query.effective_limit();
        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(query.offset)
            .take(limit)
            .map(|(_, entry)| entry.clone())
            .collect();

        Ok(AuditPage {
            entries: page,
            total,
            offset: query.offset,
            limit,
        })
    }
}
