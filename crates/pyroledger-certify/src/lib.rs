//! # pyroledger-certify
//!
//! Tamper-evident certificates for completed pyrolysis batches.
//!
//! ## Overview
//!
//! [`CertificateIssuer`] snapshots the certifiable facts of a completed
//! batch (identity, feedstock, output, lab verdicts, GHG figures), hashes
//! their canonical document with SHA-256, and stores the certificate under
//! a short verification code. [`CertificateVerifier`] serves the redacted
//! public view behind that code and stamps the first verification exactly
//! once.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pyroledger_certify::{CertificateConfig, CertificateIssuer, CertificateVerifier};
//!
//! let issuer = CertificateIssuer::new(batches.clone(), certs.clone(), CertificateConfig::default())?;
//! let issued = issuer.issue("b-17")?;
//! let public = CertificateVerifier::new(certs).verify(&issued.code)?;
//! ```

pub mod canonical;
pub mod code;
pub mod config;
pub mod issuer;
pub mod memory;
pub mod verifier;

pub use canonical::{canonical_document, collect_facts, content_hash};
pub use config::CertificateConfig;
pub use issuer::CertificateIssuer;
pub use memory::{InMemoryBatchRepository, InMemoryCertificateStore};
pub use verifier::CertificateVerifier;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        collections::{HashSet, VecDeque},
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Barrier, Mutex,
        },
        thread,
    };

    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    use pyroledger_carbon::{EmissionFactors, GhgCalculator};
    use pyroledger_contracts::{
        batch::{Batch, BatchStatus, LabResult, LabVerdict},
        certificate::Certificate,
        error::{LedgerError, LedgerResult},
    };
    use pyroledger_core::traits::{BatchRepository, CertificateStore};

    use crate::{
        canonical::{canonical_document, collect_facts, content_hash},
        code::{random_code, CodeSource},
        CertificateConfig, CertificateIssuer, CertificateVerifier, InMemoryBatchRepository,
        InMemoryCertificateStore,
    };

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 14, 16, 0, 0).unwrap()
    }

    fn calc() -> GhgCalculator {
        GhgCalculator::new(EmissionFactors::default()).unwrap()
    }

    /// A completed 450 kg batch with its GHG result already derived.
    fn completed_batch(id: &str) -> Batch {
        let batch = Batch {
            id: id.to_string(),
            code: "B-2026-044".to_string(),
            production_date: NaiveDate::from_ymd_opt(2026, 7, 14).unwrap(),
            status: BatchStatus::Completed,
            feedstock_type: "post-consumer LDPE film".to_string(),
            feedstock_mass_kg: 450.0,
            contamination_pct: Some(15.0),
            oil_output_l: 360.0,
            diesel_l: Some(40.0),
            duration_h: Some(6.0),
            notes: "internal note, never certified".to_string(),
            ghg: None,
            created_at: ts(),
            updated_at: ts(),
        };
        calc().recompute_for(&batch).unwrap()
    }

    fn lab(id: &str, batch_id: &str, sample: &str, test: &str, verdict: LabVerdict) -> LabResult {
        LabResult {
            id: id.to_string(),
            batch_id: batch_id.to_string(),
            sample_code: sample.to_string(),
            test_name: test.to_string(),
            verdict,
            measured_value: Some("n/a".to_string()),
            tested_on: NaiveDate::from_ymd_opt(2026, 7, 16).unwrap(),
            created_at: ts(),
            updated_at: ts(),
        }
    }

    struct Fixture {
        batches: InMemoryBatchRepository,
        certs: InMemoryCertificateStore,
        issuer: CertificateIssuer,
        verifier: CertificateVerifier,
    }

    fn fixture() -> Fixture {
        let batches = InMemoryBatchRepository::new();
        let certs = InMemoryCertificateStore::new();
        batches.put_batch(completed_batch("b-44")).unwrap();
        batches
            .put_lab_result(lab("l-2", "b-44", "S-044-B", "sulfur content", LabVerdict::Pass))
            .unwrap();
        batches
            .put_lab_result(lab("l-1", "b-44", "S-044-A", "flash point", LabVerdict::Fail))
            .unwrap();

        let issuer = CertificateIssuer::new(
            Arc::new(batches.clone()),
            Arc::new(certs.clone()),
            CertificateConfig::default(),
        )
        .unwrap();
        let verifier = CertificateVerifier::new(Arc::new(certs.clone()));
        Fixture {
            batches,
            certs,
            issuer,
            verifier,
        }
    }

    fn scripted(codes: &[&str]) -> CodeSource {
        let queue = Mutex::new(codes.iter().map(|c| c.to_string()).collect::<VecDeque<_>>());
        Box::new(move |_prefix: &str| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| "PYR-LAST-CODE".to_string())
        })
    }

    // ── Canonical document ────────────────────────────────────────────────────

    #[test]
    fn test_canonical_document_layout_is_fixed() {
        let mut batch = completed_batch("b-1");
        batch.ghg = Some(pyroledger_contracts::ghg::GhgResult {
            effective_carbon_kg: 327.8,
            process_emissions: 100.0,
            oil_combustion_emissions: 900.0,
            char_sequestration_credit: 50.0,
            project_total: 950.0,
            baseline_total: 1200.5,
            avoided: 250.5,
        });
        let labs = vec![lab("l-1", "b-1", "S-1", "flash point", LabVerdict::Pass)];
        let facts = collect_facts(&batch, batch.ghg.as_ref().unwrap(), &labs);

        let expected = concat!(
            r#"{"batch":{"code":"B-2026-044","date":"2026-07-14"},"#,
            r#""feedstock":{"contamination_pct":"15.000","mass_kg":"450.000","type":"post-consumer LDPE film"},"#,
            r#""ghg":{"avoided":"250.500","baseline_total":"1200.500","project_total":"950.000"},"#,
            r#""lab_results":[{"measured_value":"n/a","sample_code":"S-1","test_name":"flash point","tested_on":"2026-07-16","verdict":"pass"}],"#,
            r#""output":{"oil_l":"360.000","yield_l_per_kg":"0.800"},"#,
            r#""version":1}"#
        );
        assert_eq!(canonical_document(&facts), expected);
    }

    #[test]
    fn test_lab_order_does_not_change_hash() {
        let batch = completed_batch("b-1");
        let ghg = batch.ghg.unwrap();
        let a = lab("l-1", "b-1", "S-1", "flash point", LabVerdict::Pass);
        let b = lab("l-2", "b-1", "S-2", "viscosity", LabVerdict::Fail);

        let forward = collect_facts(&batch, &ghg, &[a.clone(), b.clone()]);
        let reverse = collect_facts(&batch, &ghg, &[b, a]);
        assert_eq!(content_hash(&forward), content_hash(&reverse));
    }

    #[test]
    fn test_same_day_retests_do_not_change_hash() {
        let batch = completed_batch("b-1");
        let ghg = batch.ghg.unwrap();
        // Same sample, test and date; only verdict and reading differ.
        let failed = lab("l-1", "b-1", "S-1", "flash point", LabVerdict::Fail);
        let mut retest = lab("l-2", "b-1", "S-1", "flash point", LabVerdict::Pass);
        retest.measured_value = Some("61 °C".to_string());
        let mut second_retest = lab("l-3", "b-1", "S-1", "flash point", LabVerdict::Pass);
        second_retest.measured_value = Some("63 °C".to_string());

        let expected = content_hash(&collect_facts(
            &batch,
            &ghg,
            &[failed.clone(), retest.clone(), second_retest.clone()],
        ));
        for labs in [
            [second_retest.clone(), retest.clone(), failed.clone()],
            [retest.clone(), failed.clone(), second_retest.clone()],
            [retest, second_retest, failed],
        ] {
            assert_eq!(
                content_hash(&collect_facts(&batch, &ghg, &labs)),
                expected,
                "the same lab set must hash identically in any order"
            );
        }
    }

    #[test]
    fn test_hash_is_lowercase_sha256_hex() {
        let batch = completed_batch("b-1");
        let hash = content_hash(&collect_facts(&batch, batch.ghg.as_ref().unwrap(), &[]));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_non_certified_fields_do_not_affect_hash() {
        let batch = completed_batch("b-1");
        let mut edited = batch.clone();
        edited.notes = "changed".to_string();
        edited.updated_at = ts() + chrono::Duration::days(1);
        let ghg = batch.ghg.unwrap();
        assert_eq!(
            content_hash(&collect_facts(&batch, &ghg, &[])),
            content_hash(&collect_facts(&edited, &ghg, &[]))
        );
    }

    // ── Issuance ──────────────────────────────────────────────────────────────

    #[test]
    fn test_issue_twice_same_hash_distinct_codes() {
        let f = fixture();
        let first = f.issuer.issue("b-44").unwrap();
        let second = f.issuer.issue("b-44").unwrap();

        assert_eq!(first.hash, second.hash);
        assert_ne!(first.code, second.code);
        assert_eq!(f.certs.list_for_batch("b-44").unwrap().len(), 2);
    }

    #[test]
    fn test_issue_returns_snapshot_figures() {
        let f = fixture();
        let issued = f.issuer.issue("b-44").unwrap();
        let batch = f.batches.find_batch("b-44").unwrap().unwrap();

        assert_eq!(issued.avoided, batch.ghg.unwrap().avoided);
        assert_eq!(issued.diverted, 450.0);
        assert!(issued.code.starts_with("PYR-"));
        assert_eq!(issued.code.len(), "PYR-XXXX-XXXX".len());

        let stored = f.certs.find_by_code(&issued.code).unwrap().unwrap();
        assert_eq!(stored.content_hash, issued.hash);
        assert!(stored.verified_at.is_none());
        assert!(stored.payload_ref.ends_with(&issued.code));
    }

    #[test]
    fn test_batch_edit_after_issue_leaves_certificate_hash() {
        let f = fixture();
        let issued = f.issuer.issue("b-44").unwrap();

        let mut batch = f.batches.find_batch("b-44").unwrap().unwrap();
        batch.oil_output_l = 400.0;
        let batch = calc().recompute_for(&batch).unwrap();
        f.batches.put_batch(batch).unwrap();

        let stored = f.certs.find_by_code(&issued.code).unwrap().unwrap();
        assert_eq!(stored.content_hash, issued.hash, "issued certificate is a snapshot");
        assert_eq!(stored.facts.oil_output_l, 360.0);

        let reissued = f.issuer.issue("b-44").unwrap();
        assert_ne!(reissued.hash, issued.hash, "changed facts must hash differently");
    }

    #[test]
    fn test_issue_unknown_batch_not_found() {
        let f = fixture();
        assert!(matches!(f.issuer.issue("b-404"), Err(LedgerError::NotFound { .. })));
    }

    #[test]
    fn test_issue_requires_completed_batch() {
        let f = fixture();
        let mut batch = completed_batch("b-45");
        batch.status = BatchStatus::InProgress;
        f.batches.put_batch(batch).unwrap();

        assert!(matches!(f.issuer.issue("b-45"), Err(LedgerError::Precondition { .. })));
        assert!(f.certs.list_for_batch("b-45").unwrap().is_empty());
    }

    #[test]
    fn test_issue_requires_ghg_result() {
        let f = fixture();
        let mut batch = completed_batch("b-46");
        batch.ghg = None;
        f.batches.put_batch(batch).unwrap();

        match f.issuer.issue("b-46") {
            Err(LedgerError::Precondition { reason }) => assert!(reason.contains("no GHG result")),
            other => panic!("expected Precondition, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_feedstock_mass_blocks_certification() {
        let f = fixture();
        let mut batch = completed_batch("b-47");
        batch.feedstock_mass_kg = 0.0;
        batch.ghg = None;

        // The calculator refuses, so the batch never gains a result...
        assert!(matches!(calc().recompute_for(&batch), Err(LedgerError::Validation { .. })));
        f.batches.put_batch(batch).unwrap();

        // ...and without one no certificate can be issued.
        assert!(matches!(f.issuer.issue("b-47"), Err(LedgerError::Precondition { .. })));
    }

    #[test]
    fn test_issue_skips_taken_codes() {
        let f = fixture();
        let issuer = CertificateIssuer::new(
            Arc::new(f.batches.clone()),
            Arc::new(f.certs.clone()),
            CertificateConfig::default(),
        )
        .unwrap()
        .with_code_source(scripted(&["PYR-AAAA-0001", "PYR-AAAA-0001", "PYR-AAAA-0002"]));

        assert_eq!(issuer.issue("b-44").unwrap().code, "PYR-AAAA-0001");
        assert_eq!(issuer.issue("b-44").unwrap().code, "PYR-AAAA-0002");
    }

    #[test]
    fn test_minted_codes_are_stored_normalized() {
        let f = fixture();
        let issuer = CertificateIssuer::new(
            Arc::new(f.batches.clone()),
            Arc::new(f.certs.clone()),
            CertificateConfig::default(),
        )
        .unwrap()
        .with_code_source(scripted(&[" pyr-abcd-0001 "]));

        let issued = issuer.issue("b-44").unwrap();
        assert_eq!(issued.code, "PYR-ABCD-0001");
        let stored = f.certs.find_by_code("PYR-ABCD-0001").unwrap().expect("stored under normalized code");
        assert!(stored.payload_ref.ends_with("/PYR-ABCD-0001"));
        assert_eq!(f.verifier.verify("pyr-abcd-0001").unwrap().code, "PYR-ABCD-0001");
    }

    #[test]
    fn test_issue_gives_up_after_max_attempts() {
        let f = fixture();
        let config = CertificateConfig {
            max_code_attempts: 3,
            ..CertificateConfig::default()
        };
        let issuer = CertificateIssuer::new(Arc::new(f.batches.clone()), Arc::new(f.certs.clone()), config)
            .unwrap()
            .with_code_source(Box::new(|_prefix: &str| "PYR-SAME-CODE".to_string()));

        issuer.issue("b-44").unwrap();
        match issuer.issue("b-44") {
            Err(LedgerError::Store { reason }) => assert!(reason.contains("3 attempts")),
            other => panic!("expected Store error, got {:?}", other),
        }
        assert_eq!(f.certs.len(), 1);
    }

    #[test]
    fn test_random_codes_use_prefix_and_differ() {
        let codes: HashSet<String> = (0..200).map(|_| random_code("PYR")).collect();
        assert_eq!(codes.len(), 200);
        for code in &codes {
            let parts: Vec<&str> = code.split('-').collect();
            assert_eq!(parts.len(), 3);
            assert_eq!(parts[0], "PYR");
            assert!(parts[1..].iter().all(|p| p.len() == 4 && p.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase())));
        }
    }

    // ── Verification ──────────────────────────────────────────────────────────

    #[test]
    fn test_verify_unknown_code_not_found() {
        let f = fixture();
        match f.verifier.verify("PYR-0000-0000") {
            Err(LedgerError::NotFound { entity, .. }) => assert_eq!(entity, "certificate"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_first_verify_stamps_and_second_keeps_stamp() {
        let f = fixture();
        let issued = f.issuer.issue("b-44").unwrap();

        let first = f.verifier.verify(&issued.code).unwrap();
        let stamp = first.verified_at.expect("first verification sets verified_at");

        let second = f.verifier.verify(&issued.code).unwrap();
        assert_eq!(second.verified_at, Some(stamp));
        assert_eq!(
            f.certs.find_by_code(&issued.code).unwrap().unwrap().verified_at,
            Some(stamp)
        );
    }

    #[test]
    fn test_verify_accepts_loosely_typed_code() {
        let f = fixture();
        let issued = f.issuer.issue("b-44").unwrap();
        let typed = format!("  {}  ", issued.code.to_lowercase());
        assert_eq!(f.verifier.verify(&typed).unwrap().code, issued.code);
    }

    #[test]
    fn test_concurrent_first_verifications_agree() {
        let f = fixture();
        let issued = f.issuer.issue("b-44").unwrap();
        let verifier = Arc::new(f.verifier);
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let verifier = Arc::clone(&verifier);
                let barrier = Arc::clone(&barrier);
                let code = issued.code.clone();
                thread::spawn(move || {
                    barrier.wait();
                    verifier.verify(&code).unwrap().verified_at
                })
            })
            .collect();

        let stamps: HashSet<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(stamps.len(), 1, "all callers must observe one timestamp: {:?}", stamps);
        assert!(stamps.iter().all(Option::is_some));
    }

    #[test]
    fn test_public_projection_is_redacted() {
        let f = fixture();
        let issued = f.issuer.issue("b-44").unwrap();
        let public = f.verifier.verify(&issued.code).unwrap();
        let stored = f.certs.find_by_code(&issued.code).unwrap().unwrap();

        assert_eq!(public.batch_code, "B-2026-044");
        assert_eq!(public.lab_verdicts.len(), 2);
        assert_eq!(public.lab_verdicts[0].sample_code, "S-044-A", "lab verdicts sorted by sample code");
        assert_eq!(public.lab_verdicts[0].verdict, LabVerdict::Fail);
        assert_eq!(public.impact.avoided_kg_co2e, issued.avoided);

        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("b-44"), "internal batch id leaked: {json}");
        assert!(!json.contains(&stored.id.to_string()), "internal certificate id leaked");
        assert!(!json.contains("l-1") && !json.contains("l-2"), "lab ids leaked");
        assert!(!json.contains("internal note"), "non-certified batch fields leaked");
    }

    // ── Contention handling ───────────────────────────────────────────────────

    /// Wraps the in-memory store and fails the first `failures` stamp writes.
    struct ContendedStore {
        inner: InMemoryCertificateStore,
        failures: AtomicUsize,
    }

    impl CertificateStore for ContendedStore {
        fn code_exists(&self, code: &str) -> LedgerResult<bool> {
            self.inner.code_exists(code)
        }

        fn insert(&self, certificate: Certificate) -> LedgerResult<()> {
            self.inner.insert(certificate)
        }

        fn find_by_code(&self, code: &str) -> LedgerResult<Option<Certificate>> {
            self.inner.find_by_code(code)
        }

        fn mark_verified_if_unset(&self, code: &str, at: DateTime<Utc>) -> LedgerResult<Certificate> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(LedgerError::Contention {
                    reason: "row locked".to_string(),
                });
            }
            self.inner.mark_verified_if_unset(code, at)
        }

        fn list_for_batch(&self, batch_id: &str) -> LedgerResult<Vec<Certificate>> {
            self.inner.list_for_batch(batch_id)
        }
    }

    #[test]
    fn test_transient_contention_is_retried() {
        let f = fixture();
        let issued = f.issuer.issue("b-44").unwrap();
        let store = ContendedStore {
            inner: f.certs.clone(),
            failures: AtomicUsize::new(2),
        };
        let verifier = CertificateVerifier::new(Arc::new(store));

        let public = verifier.verify(&issued.code).unwrap();
        assert!(public.verified_at.is_some());
    }

    #[test]
    fn test_persistent_contention_never_surfaces() {
        let f = fixture();
        let issued = f.issuer.issue("b-44").unwrap();
        let store = ContendedStore {
            inner: f.certs.clone(),
            failures: AtomicUsize::new(usize::MAX),
        };
        let verifier = CertificateVerifier::new(Arc::new(store));

        let public = verifier.verify(&issued.code).expect("contention must not reach the caller");
        assert_eq!(public.code, issued.code);
    }

    #[test]
    fn test_poisoned_certificate_store_reports_store_error() {
        let f = fixture();
        let issued = f.issuer.issue("b-44").unwrap();

        let shared = f.certs.clone();
        let _ = thread::spawn(move || {
            let _guard = shared.by_code.lock().unwrap();
            panic!("writer died holding the certificate lock");
        })
        .join();

        assert_eq!(f.certs.len(), 0, "len reads 0 once the lock is poisoned");
        assert!(matches!(f.certs.find_by_code(&issued.code), Err(LedgerError::Store { .. })));
        assert!(matches!(f.verifier.verify(&issued.code), Err(LedgerError::Store { .. })));
    }

    // ── Integrity ─────────────────────────────────────────────────────────────

    #[test]
    fn test_integrity_check_passes_for_issued_certificate() {
        let f = fixture();
        let issued = f.issuer.issue("b-44").unwrap();
        let report = f.verifier.check_integrity(&issued.code).unwrap();
        assert!(report.intact);
        assert_eq!(report.recomputed_hash, issued.hash);

        // The integrity check is read-only.
        assert!(f.certs.find_by_code(&issued.code).unwrap().unwrap().verified_at.is_none());
    }

    #[test]
    fn test_integrity_check_detects_altered_facts() {
        let f = fixture();
        let issued = f.issuer.issue("b-44").unwrap();
        let mut forged = f.certs.find_by_code(&issued.code).unwrap().unwrap();
        forged.code = "PYR-FAKE-0001".to_string();
        forged.facts.ghg.avoided *= 2.0;
        f.certs.insert(forged).unwrap();

        let report = f.verifier.check_integrity("PYR-FAKE-0001").unwrap();
        assert!(!report.intact);
        assert_eq!(report.stored_hash, issued.hash);
    }

    // ── Configuration ─────────────────────────────────────────────────────────

    #[test]
    fn test_certificate_config_from_toml() {
        let cfg = CertificateConfig::from_toml_str(
            r#"
            [factors]
            open_burning_factor = 3.9

            [certificate]
            code_prefix = "GRN"
            verify_base_url = "https://example.org/v/"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.code_prefix, "GRN");
        assert_eq!(cfg.max_code_attempts, CertificateConfig::default().max_code_attempts);
        assert_eq!(cfg.payload_ref("GRN-0001-0002"), "https://example.org/v/GRN-0001-0002");
    }

    #[test]
    fn test_certificate_config_rejects_bad_values() {
        for toml in [
            "[certificate]\ncode_prefix = \"\"\n",
            "[certificate]\ncode_prefix = \"py-r\"\n",
            "[certificate]\nmax_code_attempts = 0\n",
            "[certificate]\nunknown = 1\n",
        ] {
            assert!(
                matches!(CertificateConfig::from_toml_str(toml), Err(LedgerError::Config { .. })),
                "expected Config error for {toml:?}"
            );
        }
    }
}
