//! Audit entry, request, and query types.
//!
//! `AuditEntry` is the immutable unit of the change history. Entries are
//! appended by the audit trail and never edited or removed afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    batch::BATCH_ENTITY_TYPE,
    record::{ChangeSet, Snapshot},
};

/// The kind of mutation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who performed a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// Stable user identifier.
    pub id: String,
    /// Display label captured at the time of the action.
    pub label: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// What an entry carries: a full snapshot for CREATE/DELETE, a change-set
/// for UPDATE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AuditPayload {
    Snapshot(Snapshot),
    Changes(ChangeSet),
}

/// One immutable entry in the change history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor: Actor,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    /// Batch the entity belongs to, when it is batch-scoped (lab results, ...).
    pub related_batch_id: Option<String>,
    pub payload: AuditPayload,
    pub recorded_at: DateTime<Utc>,
}

/// The caller-supplied description of a mutation to record.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRequest {
    pub actor: Actor,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub related_batch_id: Option<String>,
    /// `Changes` for UPDATE; `Snapshot` for CREATE and DELETE.
    pub payload: Option<AuditPayload>,
}

/// Filters and pagination for reading the audit log.
///
/// Every `Some` filter must match; `None` filters match everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub actor_id: Option<String>,
    pub related_batch_id: Option<String>,
    pub action: Option<AuditAction>,
    pub offset: usize,
    pub limit: usize,
}

impl AuditQuery {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 500;

    pub fn for_entity(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            entity_id: Some(entity_id.into()),
            ..Self::default()
        }
    }

    pub fn for_actor(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            ..Self::default()
        }
    }

    pub fn for_batch(batch_id: impl Into<String>) -> Self {
        Self {
            related_batch_id: Some(batch_id.into()),
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    /// The limit actually applied: zero means default, capped at `MAX_LIMIT`.
    pub fn effective_limit(&self) -> usize {
        match self.limit {
            0 => Self::DEFAULT_LIMIT,
            n => n.min(Self::MAX_LIMIT),
        }
    }

    /// True when `entry` satisfies every filter in this query.
    ///
    /// An entry matches `related_batch_id` either through its own
    /// `related_batch_id` or by being the batch itself.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        fn field_ok(filter: &Option<String>, value: &str) -> bool {
            filter.as_deref().map_or(true, |f| f == value)
        }

        let batch_ok = match &self.related_batch_id {
            None => true,
            Some(batch) => {
                entry.related_batch_id.as_deref() == Some(batch.as_str())
                    || (entry.entity_type == BATCH_ENTITY_TYPE && entry.entity_id == *batch)
            }
        };

        field_ok(&self.entity_type, &entry.entity_type)
            && field_ok(&self.entity_id, &entry.entity_id)
            && field_ok(&self.actor_id, &entry.actor.id)
            && self.action.map_or(true, |a| a == entry.action)
            && batch_ok
    }
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            entity_type: None,
            entity_id: None,
            actor_id: None,
            related_batch_id: None,
            action: None,
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// One page of query results, newest entry first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditPage {
    pub entries: Vec<AuditEntry>,
    /// Number of matching entries across all pages.
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}
