//! # pyroledger-contracts
//!
//! Shared types, canonical value formats, and error contracts for the
//! PyroLedger integrity core.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate beyond the canonical formatting rules that every hash and
//! every diff depends on.

pub mod audit;
pub mod batch;
pub mod certificate;
pub mod error;
pub mod ghg;
pub mod record;

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::{
        audit::{Actor, AuditAction, AuditEntry, AuditPayload, AuditQuery},
        error::LedgerError,
        record::{canonical_decimal, FieldValue, Snapshot},
    };

    fn entry(entity_type: &str, entity_id: &str, batch: Option<&str>, action: AuditAction) -> AuditEntry {
        AuditEntry {
            id: uuid::Uuid::new_v4(),
            actor: Actor::new("u-1", "Operator One"),
            action,
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            related_batch_id: batch.map(str::to_string),
            payload: AuditPayload::Snapshot(Snapshot::new()),
            recorded_at: Utc::now(),
        }
    }

    // ── Canonical values ─────────────────────────────────────────────────────

    #[test]
    fn canonical_decimal_uses_fixed_places() {
        assert_eq!(canonical_decimal(1.5, 3), "1.500");
        assert_eq!(canonical_decimal(2.0, 6), "2.000000");
    }

    #[test]
    fn canonical_decimal_folds_negative_zero() {
        assert_eq!(canonical_decimal(-0.0, 3), "0.000");
        assert_eq!(canonical_decimal(-0.0000001, 3), "0.000");
        assert_eq!(canonical_decimal(-1.25, 2), "-1.25");
    }

    #[test]
    fn timestamps_with_different_offsets_are_canonically_equal() {
        let utc = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let offset = chrono::FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .unwrap();

        let a = FieldValue::Timestamp(utc);
        let b = FieldValue::Timestamp(offset.with_timezone(&Utc));
        assert!(a.canonical_eq(&b));
        assert_eq!(a.canonical(), serde_json::json!("2026-03-01T10:00:00.000Z"));
    }

    #[test]
    fn date_and_equivalent_text_are_canonically_equal() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
        assert!(FieldValue::Date(date).canonical_eq(&FieldValue::from("2026-01-09")));
    }

    #[test]
    fn snapshot_canonical_is_independent_of_insertion_order() {
        let a = Snapshot::new().with("b", 2_i64).with("a", "x");
        let b = Snapshot::new().with("a", "x").with("b", 2_i64);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a.canonical()).unwrap(),
            r#"{"a":"x","b":2}"#
        );
    }

    #[test]
    fn option_none_becomes_null() {
        let v: FieldValue = Option::<f64>::None.into();
        assert_eq!(v, FieldValue::Null);
    }

    // ── AuditQuery ───────────────────────────────────────────────────────────

    #[test]
    fn query_for_batch_matches_batch_itself_and_children() {
        let q = AuditQuery::for_batch("b-1");
        assert!(q.matches(&entry("batch", "b-1", None, AuditAction::Update)));
        assert!(q.matches(&entry("lab_result", "l-9", Some("b-1"), AuditAction::Create)));
        assert!(!q.matches(&entry("batch", "b-2", None, AuditAction::Update)));
        assert!(!q.matches(&entry("lab_result", "l-9", Some("b-2"), AuditAction::Create)));
    }

    #[test]
    fn query_action_filter() {
        let q = AuditQuery::for_entity("batch", "b-1").with_action(AuditAction::Delete);
        assert!(!q.matches(&entry("batch", "b-1", None, AuditAction::Update)));
        assert!(q.matches(&entry("batch", "b-1", None, AuditAction::Delete)));
    }

    #[test]
    fn query_effective_limit_defaults_and_caps() {
        assert_eq!(AuditQuery::default().page(0, 0).effective_limit(), AuditQuery::DEFAULT_LIMIT);
        assert_eq!(AuditQuery::default().page(0, 10_000).effective_limit(), AuditQuery::MAX_LIMIT);
        assert_eq!(AuditQuery::default().page(0, 7).effective_limit(), 7);
    }

    #[test]
    fn audit_action_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&AuditAction::Update).unwrap(), r#""UPDATE""#);
    }

    // ── LedgerError display messages ─────────────────────────────────────────

    #[test]
    fn error_validation_display() {
        let err = LedgerError::validation("feedstock_mass_kg", "must be greater than zero");
        let msg = err.to_string();
        assert!(msg.contains("feedstock_mass_kg"));
        assert!(msg.contains("greater than zero"));
    }

    #[test]
    fn error_not_found_display() {
        let msg = LedgerError::not_found("certificate", "PYR-0000-0000").to_string();
        assert_eq!(msg, "certificate 'PYR-0000-0000' not found");
    }
}
