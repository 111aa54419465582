//! # pyroledger-audit
//!
//! Field-level, append-only change history for PyroLedger records.
//!
//! ## Overview
//!
//! Every accepted mutation of a batch or lab result becomes one
//! `AuditEntry`. Updates are reduced to the minimal change-set by the
//! record differ; an update that changes nothing writes nothing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pyroledger_audit::{AuditTrail, InMemoryAuditLog};
//!
//! let log = InMemoryAuditLog::new();
//! let trail = AuditTrail::new(Arc::new(log.clone()));
//! trail.record_update(&actor, &before, &after)?;
//! ```

pub mod differ;
pub mod memory;
pub mod trail;

pub use differ::{diff_records, diff_snapshots};
pub use memory::InMemoryAuditLog;
pub use trail::{AuditTrail, RecordOutcome};

// ── Tests ─────────────────────────────────────────────────────────────────────
