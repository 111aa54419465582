//! The audit trail: validates mutation requests and appends audit entries.
//!
//! Recording rules:
//!
//! 1. The actor id, entity type and entity id must be non-blank; otherwise
//!    the change is not entitled to be recorded (`Validation`).
//! 2. UPDATE carries a change-set. An absent or empty change-set is a no-op
//!    and is skipped silently, without touching the store.
//! 3. CREATE and DELETE always write an entry carrying the full snapshot;
//!    a request without one is rejected (`Validation`).
//!
//! The trail never edits or removes entries; `query` is read-only.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use pyroledger_contracts::{
    audit::{Actor, AuditAction, AuditEntry, AuditPage, AuditPayload, AuditQuery, AuditRequest},
    error::{LedgerError, LedgerResult},
};
use pyroledger_core::{traits::AuditLogStore, Auditable};

use crate::differ::diff_records;

/// What happened to a `record` call that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// An entry with this id was appended.
    Written(Uuid),
    /// The update changed nothing; no entry was written.
    Skipped,
}

/// Appends audit entries to an injected `AuditLogStore`.
pub struct AuditTrail {
    store: Arc<dyn AuditLogStore>,
}

fn require_non_blank(field: &str, value: &str) -> LedgerResult<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::validation(field, "must not be blank"));
    }
    Ok(())
}

impl AuditTrail {
    pub fn new(store: Arc<dyn AuditLogStore>) -> Self {
        Self { store }
    }

    /// Record one mutation.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank actor/entity or a payload of the wrong kind
    /// for the action; any error the store returns from `append`.
    pub fn record(&self, request: AuditRequest) -> LedgerResult<RecordOutcome> {
        require_non_blank("actor_id", &request.actor.id)?;
        require_non_blank("entity_type", &request.entity_type)?;
        require_non_blank("entity_id", &request.entity_id)?;

        let payload = match (request.action, request.payload) {
            (AuditAction::Update, None) => return Ok(self.skip(&request.entity_type, &request.entity_id)),
            (AuditAction::Update, Some(AuditPayload::Changes(changes))) => {
                if changes.is_empty() {
                    return Ok(self.skip(&request.entity_type, &request.entity_id));
                }
                AuditPayload::Changes(changes)
            }
            (AuditAction::Update, Some(AuditPayload::Snapshot(_))) => {
                return Err(LedgerError::validation(
                    "payload",
                    "UPDATE entries must carry a change-set, not a snapshot",
                ));
            }
            (action, None) => {
                return Err(LedgerError::validation(
                    "payload",
                    format!("{} entries must carry the full snapshot of the record", action),
                ));
            }
            (_, Some(AuditPayload::Snapshot(snapshot))) => AuditPayload::Snapshot(snapshot),
            (action, Some(AuditPayload::Changes(_))) => {
                return Err(LedgerError::validation(
                    "payload",
                    format!("{} entries must carry a full snapshot, not a change-set", action),
                ));
            }
        };

        let entry = AuditEntry {
            id: Uuid::new_v4(),
            actor: request.actor,
            action: request.action,
            entity_type: request.entity_type,
            entity_id: request.entity_id,
            related_batch_id: request.related_batch_id,
            payload,
            recorded_at: Utc::now(),
        };
        let id = entry.id;
        self.store.append(entry.clone())?;

        info!(
            entry_id = %id,
            action = %entry.action,
            entity_type = %entry.entity_type,
            entity_id = %entry.entity_id,
            actor_id = %entry.actor.id,
            "audit entry recorded"
        );

        Ok(RecordOutcome::Written(id))
    }

    /// Record the creation of `record` with its full snapshot.
    pub fn record_create<T: Auditable>(&self, actor: &Actor, record: &T) -> LedgerResult<RecordOutcome> {
        self.record(Self::request(actor, AuditAction::Create, record, Some(AuditPayload::Snapshot(record.snapshot()))))
    }

    /// Diff `old` against `new` and record the change-set, if any.
    pub fn record_update<T: Auditable>(&self, actor: &Actor, old: &T, new: &T) -> LedgerResult<RecordOutcome> {
        let changes = diff_records(old, new).map(AuditPayload::Changes);
        self.record(Self::request(actor, AuditAction::Update, new, changes))
    }

    /// Record the deletion of `record` with its last snapshot.
    pub fn record_delete<T: Auditable>(&self, actor: &Actor, record: &T) -> LedgerResult<RecordOutcome> {
        self.record(Self::request(actor, AuditAction::Delete, record, Some(AuditPayload::Snapshot(record.snapshot()))))
    }

    /// Read one page of the history.
    pub fn query(&self, query: &AuditQuery) -> LedgerResult<AuditPage> {
        self.store.query(query)
    }

    fn request<T: Auditable>(
        actor: &Actor,
        action: AuditAction,
        record: &T,
        payload: Option<AuditPayload>,
    ) -> AuditRequest {
        AuditRequest {
            actor: actor.clone(),
            action,
            entity_type: T::ENTITY_TYPE.to_string(),
            entity_id: record.entity_id().to_string(),
            related_batch_id: record.related_batch_id().map(str::to_string),
            payload,
        }
    }

    fn skip(&self, entity_type: &str, entity_id: &str) -> RecordOutcome {
        debug!(entity_type = %entity_type, entity_id = %entity_id, "no-op update, audit skipped");
        RecordOutcome::Skipped
    }
}
