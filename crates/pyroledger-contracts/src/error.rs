//! Error types for the PyroLedger integrity core.
//!
//! All fallible operations return `LedgerResult<T>`. Every failure is scoped
//! to the single request that triggered it; nothing here is fatal to the
//! hosting process.

use thiserror::Error;

/// The unified error type for the PyroLedger crates.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    /// A physical input was negative, non-finite, or out of range.
    ///
    /// Raised before any calculation runs. Never retried.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The operation is not permitted in the entity's current state
    /// (e.g. certifying a batch that is not completed).
    #[error("precondition failed: {reason}")]
    Precondition { reason: String },

    /// A lookup by key found nothing.
    #[error("{entity} '{key}' not found")]
    NotFound { entity: String, key: String },

    /// A conditional write lost a race at the storage boundary.
    ///
    /// Callers retry these internally; they are never surfaced to end users.
    #[error("store contention: {reason}")]
    Contention { reason: String },

    /// A configuration value is missing, malformed, or out of range.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The backing store failed for a reason unrelated to the request.
    #[error("store failure: {reason}")]
    Store { reason: String },
}

impl LedgerError {
    /// Shorthand for a `Validation` error on `field`.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            key: key.into(),
        }
    }
}

/// Convenience alias used throughout the PyroLedger crates.
pub type LedgerResult<T> = Result<T, LedgerError>;
