//! The `Auditable` trait and its implementations for the ledger's records.
//!
//! Each entity kind lists its fields explicitly in `snapshot()` and names
//! its non-semantic fields in `VOLATILE_FIELDS`, so the diff surface of a
//! record is fixed at compile time rather than discovered at runtime.

use std::collections::BTreeMap;

use pyroledger_contracts::{
    batch::{Batch, LabResult, BATCH_ENTITY_TYPE, LAB_RESULT_ENTITY_TYPE},
    ghg::GhgResult,
    record::{FieldValue, Snapshot},
};

/// A record whose mutations are written to the audit trail.
pub trait Auditable {
    /// Entity type name stored on every audit entry for this kind.
    const ENTITY_TYPE: &'static str;

    /// Fields excluded from change detection (timestamps and the like).
    ///
    /// They still appear in CREATE and DELETE snapshots.
    const VOLATILE_FIELDS: &'static [&'static str];

    fn entity_id(&self) -> &str;

    /// The batch this record belongs to, if it is batch-scoped.
    fn related_batch_id(&self) -> Option<&str>;

    /// The full typed attribute view of this record.
    fn snapshot(&self) -> Snapshot;
}

fn ghg_value(ghg: &Option<GhgResult>) -> FieldValue {
    match ghg {
        None => FieldValue::Null,
        Some(r) => FieldValue::Map(BTreeMap::from([
            ("avoided".to_string(), FieldValue::Decimal(r.avoided)),
            ("baseline_total".to_string(), FieldValue::Decimal(r.baseline_total)),
            (
                "char_sequestration_credit".to_string(),
                FieldValue::Decimal(r.char_sequestration_credit),
            ),
            ("effective_carbon_kg".to_string(), FieldValue::Decimal(r.effective_carbon_kg)),
            (
                "oil_combustion_emissions".to_string(),
                FieldValue::Decimal(r.oil_combustion_emissions),
            ),
            ("process_emissions".to_string(), FieldValue::Decimal(r.process_emissions)),
            ("project_total".to_string(), FieldValue::Decimal(r.project_total)),
        ])),
    }
}

impl Auditable for Batch {
    const ENTITY_TYPE: &'static str = BATCH_ENTITY_TYPE;
    const VOLATILE_FIELDS: &'static [&'static str] = &["updated_at"];

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn related_batch_id(&self) -> Option<&str> {
        None
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new()
            .with("id", self.id.as_str())
            .with("code", self.code.as_str())
            .with("production_date", self.production_date)
            .with("status", self.status.as_str())
            .with("feedstock_type", self.feedstock_type.as_str())
            .with("feedstock_mass_kg", self.feedstock_mass_kg)
            .with("contamination_pct", self.contamination_pct)
            .with("oil_output_l", self.oil_output_l)
            .with("diesel_l", self.diesel_l)
            .with("duration_h", self.duration_h)
            .with("notes", self.notes.as_str())
            .with("ghg", ghg_value(&self.ghg))
            .with("created_at", self.created_at)
            .with("updated_at", self.updated_at)
    }
}

impl Auditable for LabResult {
    const ENTITY_TYPE: &'static str = LAB_RESULT_ENTITY_TYPE;
    const VOLATILE_FIELDS: &'static [&'static str] = &["updated_at"];

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn related_batch_id(&self) -> Option<&str> {
        Some(&self.batch_id)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new()
            .with("id", self.id.as_str())
            .with("batch_id", self.batch_id.as_str())
            .with("sample_code", self.sample_code.as_str())
            .with("test_name", self.test_name.as_str())
            .with("verdict", self.verdict.as_str())
            .with("measured_value", self.measured_value.clone())
            .with("tested_on", self.tested_on)
            .with("created_at", self.created_at)
            .with("updated_at", self.updated_at)
    }
}
