//! End-to-end lifecycle of one batch against in-memory stores.
//!
//! Mirrors what the operations dashboard does: each save goes through the
//! audit trail, completion recomputes the GHG balance, and the issued
//! certificate is verified the way an anonymous buyer would.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use pyroledger_audit::{AuditTrail, InMemoryAuditLog, RecordOutcome};
use pyroledger_carbon::{EmissionFactors, GhgCalculator};
use pyroledger_certify::{
    CertificateConfig, CertificateIssuer, CertificateVerifier, InMemoryBatchRepository,
    InMemoryCertificateStore,
};
use pyroledger_contracts::{
    audit::{Actor, AuditPayload, AuditQuery},
    batch::{Batch, BatchStatus, LabResult, LabVerdict},
    error::{LedgerError, LedgerResult},
};

const BATCH_ID: &str = "b-0044";

pub fn run(factors: EmissionFactors, certificate: CertificateConfig) -> LedgerResult<()> {
    let calc = GhgCalculator::new(factors)?;
    let audit_log = InMemoryAuditLog::new();
    let trail = AuditTrail::new(Arc::new(audit_log.clone()));
    let batches = InMemoryBatchRepository::new();
    let certs = InMemoryCertificateStore::new();
    let issuer = CertificateIssuer::new(
        Arc::new(batches.clone()),
        Arc::new(certs.clone()),
        certificate,
    )?;
    let verifier = CertificateVerifier::new(Arc::new(certs.clone()));

    let operator = Actor::new("u-17", "Plant operator");
    let lab_tech = Actor::new("u-23", "Lab technician");

    // ── 1. Plan the batch ─────────────────────────────────────────────────────
    println!("── Step 1: plan batch ──");
    let now = Utc::now();
    let planned = Batch {
        id: BATCH_ID.to_string(),
        code: "B-2026-044".to_string(),
        production_date: date(2026, 7, 14)?,
        status: BatchStatus::Planned,
        feedstock_type: "post-consumer LDPE film".to_string(),
        feedstock_mass_kg: 450.0,
        contamination_pct: None,
        oil_output_l: 0.0,
        diesel_l: None,
        duration_h: None,
        notes: String::new(),
        ghg: None,
        created_at: now,
        updated_at: now,
    };
    report(trail.record_create(&operator, &planned)?, "batch created");
    batches.put_batch(planned.clone())?;

    // ── 2. Run it ─────────────────────────────────────────────────────────────
    println!("── Step 2: start run ──");
    let mut running = planned.clone();
    running.status = BatchStatus::InProgress;
    running.contamination_pct = Some(15.0);
    running.updated_at = Utc::now();
    report(trail.record_update(&operator, &planned, &running)?, "run started");

    // Saving the form again without edits leaves no trace.
    let mut resaved = running.clone();
    resaved.updated_at = Utc::now();
    report(trail.record_update(&operator, &running, &resaved)?, "unchanged re-save");
    batches.put_batch(resaved.clone())?;

    // ── 3. Complete it ────────────────────────────────────────────────────────
    println!("── Step 3: complete batch ──");
    let mut finished = resaved.clone();
    finished.status = BatchStatus::Completed;
    finished.oil_output_l = 360.0;
    finished.diesel_l = Some(40.0);
    finished.duration_h = Some(6.0);
    finished.updated_at = Utc::now();
    let completed = calc.recompute_for(&finished)?;
    report(trail.record_update(&operator, &resaved, &completed)?, "batch completed");
    batches.put_batch(completed.clone())?;

    let ghg = completed.ghg.ok_or_else(|| LedgerError::Precondition {
        reason: "completed batch carries no GHG result".to_string(),
    })?;
    println!(
        "  baseline {:.1} kg CO2e, project {:.1} kg CO2e, avoided {:.1} kg CO2e",
        ghg.baseline_total, ghg.project_total, ghg.avoided
    );

    // ── 4. Lab results ────────────────────────────────────────────────────────
    println!("── Step 4: lab results ──");
    let tested_on = date(2026, 7, 16)?;
    let labs = [
        lab_result("l-0101", "S-044-A", "flash point", LabVerdict::Pass, Some("62 °C"), tested_on),
        lab_result("l-0102", "S-044-A", "sulfur content", LabVerdict::Pass, Some("0.08 %"), tested_on),
        lab_result("l-0103", "S-044-B", "water content", LabVerdict::Pending, None, tested_on),
    ];
    for lab in &labs {
        report(trail.record_create(&lab_tech, lab)?, &format!("lab result {}", lab.test_name));
        batches.put_lab_result(lab.clone())?;
    }

    // A pending sample is withdrawn before certification.
    let withdrawn = &labs[2];
    report(trail.record_delete(&lab_tech, withdrawn)?, "pending lab result withdrawn");
    batches.remove_lab_result(&withdrawn.id)?;

    // ── 5. Certify ────────────────────────────────────────────────────────────
    println!("── Step 5: issue certificate ──");
    let issued = issuer.issue(BATCH_ID)?;
    println!("  code     {}", issued.code);
    println!("  hash     {}", issued.hash);
    println!("  avoided  {:.1} kg CO2e", issued.avoided);
    println!("  diverted {:.1} kg", issued.diverted);

    // ── 6. Public verification ────────────────────────────────────────────────
    println!("── Step 6: verify by code ──");
    let first = verifier.verify(&issued.code.to_lowercase())?;
    let second = verifier.verify(&issued.code)?;
    println!("  first verification  verified_at = {}", stamp(&first.verified_at));
    println!("  second verification verified_at = {}", stamp(&second.verified_at));
    if first.verified_at != second.verified_at {
        return Err(LedgerError::Store {
            reason: "verified_at changed between verifications".to_string(),
        });
    }
    let public = serde_json::to_string_pretty(&second).map_err(|e| LedgerError::Store {
        reason: format!("failed to render public certificate: {}", e),
    })?;
    println!("{}", public);

    // ── 7. Integrity ──────────────────────────────────────────────────────────
    println!("── Step 7: integrity check ──");
    let integrity = verifier.check_integrity(&issued.code)?;
    println!(
        "  stored {}…  recomputed {}…  {}",
        &integrity.stored_hash[..12],
        &integrity.recomputed_hash[..12],
        if integrity.intact { "INTACT" } else { "TAMPERED" }
    );

    // ── 8. History ────────────────────────────────────────────────────────────
    println!("── Step 8: audit history for {} ──", completed.code);
    let page = trail.query(&AuditQuery::for_batch(BATCH_ID))?;
    for entry in page.entries.iter().rev() {
        let detail = match &entry.payload {
            AuditPayload::Snapshot(snapshot) => format!("{} fields", snapshot.len()),
            AuditPayload::Changes(changes) => changes.fields().collect::<Vec<_>>().join(", "),
        };
        println!(
            "  {}  {:<6} {:<10} {:<7} by {:<16} [{}]",
            entry.recorded_at.format("%H:%M:%S%.3f"),
            entry.action.as_str(),
            entry.entity_type,
            entry.entity_id,
            entry.actor.label,
            detail
        );
    }
    println!("  {} of {} entries in the log", page.entries.len(), audit_log.len());
    println!();

    Ok(())
}

fn lab_result(
    id: &str,
    sample_code: &str,
    test_name: &str,
    verdict: LabVerdict,
    measured_value: Option<&str>,
    tested_on: NaiveDate,
) -> LabResult {
    let now = Utc::now();
    LabResult {
        id: id.to_string(),
        batch_id: BATCH_ID.to_string(),
        sample_code: sample_code.to_string(),
        test_name: test_name.to_string(),
        verdict,
        measured_value: measured_value.map(str::to_string),
        tested_on,
        created_at: now,
        updated_at: now,
    }
}

fn date(y: i32, m: u32, d: u32) -> LedgerResult<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| LedgerError::validation("date", format!("{y}-{m}-{d} is not a date")))
}

fn stamp(at: &Option<chrono::DateTime<Utc>>) -> String {
    at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string())
}

fn report(outcome: RecordOutcome, what: &str) {
    match outcome {
        RecordOutcome::Written(id) => println!("  {:<30} audit entry {}", what, id),
        RecordOutcome::Skipped => println!("  {:<30} nothing changed, no audit entry", what),
    }
}
