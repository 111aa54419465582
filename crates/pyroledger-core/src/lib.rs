//! # pyroledger-core
//!
//! The trust seams of the PyroLedger integrity core.
//!
//! This crate provides:
//! - The store traits (`AuditLogStore`, `CertificateStore`, `BatchRepository`)
//!   that the audit trail, issuer and verifier receive by injection
//! - The `Auditable` trait, with typed field lists for `Batch` and `LabResult`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pyroledger_core::{Auditable, traits::{AuditLogStore, CertificateStore}};
//! ```

pub mod auditable;
pub mod traits;

pub use auditable::Auditable;

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use pyroledger_contracts::{
        batch::{Batch, BatchStatus, LabResult, LabVerdict},
        record::FieldValue,
    };

    use crate::Auditable;

    fn batch() -> Batch {
        let ts = Utc.with_ymd_and_hms(2026, 5, 4, 8, 30, 0).unwrap();
        Batch {
            id: "b-1".to_string(),
            code: "B-2026-001".to_string(),
            production_date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            status: BatchStatus::InProgress,
            feedstock_type: "LDPE film".to_string(),
            feedstock_mass_kg: 450.0,
            contamination_pct: None,
            oil_output_l: 0.0,
            diesel_l: None,
            duration_h: None,
            notes: String::new(),
            ghg: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn batch_snapshot_lists_every_field() {
        let snap = batch().snapshot();
        for field in [
            "id", "code", "production_date", "status", "feedstock_type", "feedstock_mass_kg",
            "contamination_pct", "oil_output_l", "diesel_l", "duration_h", "notes", "ghg",
            "created_at", "updated_at",
        ] {
            assert!(snap.get(field).is_some(), "batch snapshot missing '{field}'");
        }
        assert_eq!(snap.get("status"), Some(&FieldValue::from("in_progress")));
        assert_eq!(snap.get("contamination_pct"), Some(&FieldValue::Null));
    }

    #[test]
    fn volatile_fields_are_part_of_the_snapshot() {
        let snap = batch().snapshot();
        for field in <Batch as Auditable>::VOLATILE_FIELDS {
            assert!(snap.get(field).is_some());
        }
    }

    #[test]
    fn lab_result_is_batch_scoped() {
        let ts = Utc::now();
        let lab = LabResult {
            id: "l-1".to_string(),
            batch_id: "b-1".to_string(),
            sample_code: "S-01".to_string(),
            test_name: "flash point".to_string(),
            verdict: LabVerdict::Pass,
            measured_value: Some("62 °C".to_string()),
            tested_on: NaiveDate::from_ymd_opt(2026, 5, 6).unwrap(),
            created_at: ts,
            updated_at: ts,
        };
        assert_eq!(lab.related_batch_id(), Some("b-1"));
        assert_eq!(<LabResult as Auditable>::ENTITY_TYPE, "lab_result");
        assert_eq!(lab.snapshot().get("verdict"), Some(&FieldValue::from("pass")));
    }
}
