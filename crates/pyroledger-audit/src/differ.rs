//! Record differ: the minimal field-level change-set between two snapshots.
//!
//! Fields are compared by canonical value (see `pyroledger_contracts::record`),
//! so a timestamp stored with a different offset or a date held as text
//! never shows up as a change. A field present in only one snapshot is
//! compared against `Null`.

use std::collections::BTreeSet;

use pyroledger_contracts::record::{ChangeSet, FieldValue, Snapshot};
use pyroledger_core::Auditable;

static NULL: FieldValue = FieldValue::Null;

/// Diff two versions of the same typed record, skipping its volatile fields.
///
/// Returns `None` when no semantic field changed.
pub fn diff_records<T: Auditable>(old: &T, new: &T) -> Option<ChangeSet> {
    diff_snapshots(&old.snapshot(), &new.snapshot(), T::VOLATILE_FIELDS)
}

/// Diff two raw snapshots, skipping every field named in `ignored`.
///
/// Returns `None` when no remaining field differs; a returned `ChangeSet`
/// is never empty.
pub fn diff_snapshots(old: &Snapshot, new: &Snapshot, ignored: &[&str]) -> Option<ChangeSet> {
    let fields: BTreeSet<&String> = old.iter().chain(new.iter()).map(|(k, _)| k).collect();

    let mut changes = ChangeSet::new();
    for field in fields {
        if ignored.contains(&field.as_str()) {
            continue;
        }
        let before = old.get(field).unwrap_or(&NULL);
        let after = new.get(field).unwrap_or(&NULL);
        if !before.canonical_eq(after) {
            changes.insert(field.clone(), before.clone(), after.clone());
        }
    }

    if changes.is_empty() {
        None
    } else {
        Some(changes)
    }
}
