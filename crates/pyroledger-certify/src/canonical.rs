//! Canonical fact documents and content hashing.
//!
//! The hash input is a compact JSON document with a fixed shape:
//!
//! ```text
//! {"batch":{"code":..,"date":"YYYY-MM-DD"},
//!  "feedstock":{"contamination_pct":"15.000"|null,"mass_kg":"450.000","type":..},
//!  "ghg":{"avoided":..,"baseline_total":..,"project_total":..},
//!  "lab_results":[{"measured_value":..|null,"sample_code":..,"test_name":..,"tested_on":..,"verdict":..}, ..],
//!  "output":{"oil_l":..,"yield_l_per_kg":..},
//!  "version":1}
//! ```
//!
//! Keys are written in ascending order at every level, every quantity is a
//! string with `FACT_DECIMAL_PLACES` fractional digits, and lab results are
//! sorted on every certified field (sample code, test name, test date,
//! verdict, measured value). The same logical facts therefore
//! always serialize to the same bytes.
//!
//! Hash input layout (bytes, in order):
//!   1. `HASH_DOMAIN` as UTF-8 bytes
//!   2. the canonical document as UTF-8 bytes

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use pyroledger_contracts::{
    batch::{Batch, LabResult},
    certificate::{CertifiedFacts, CertifiedLabResult},
    ghg::{GhgResult, GhgTotals},
    record::{canonical_date, canonical_decimal},
};

/// Fractional digits for every quantity in the canonical document.
pub const FACT_DECIMAL_PLACES: usize = 3;

/// Version of the canonical document layout. Bump on any shape change.
pub const DOCUMENT_VERSION: u32 = 1;

/// Domain-separation prefix fed to SHA-256 ahead of the document.
pub const HASH_DOMAIN: &str = "pyroledger/certificate/v1\n";

/// Collect the certifiable facts of a batch and its lab results.
///
/// Lab results are sorted so that the order the store returns them in has
/// no effect on the document.
pub fn collect_facts(batch: &Batch, ghg: &GhgResult, labs: &[LabResult]) -> CertifiedFacts {
    let mut lab_results: Vec<CertifiedLabResult> = labs
        .iter()
        .map(|lab| CertifiedLabResult {
            sample_code: lab.sample_code.clone(),
            test_name: lab.test_name.clone(),
            verdict: lab.verdict,
            measured_value: lab.measured_value.clone(),
            tested_on: lab.tested_on,
        })
        .collect();
    lab_results.sort_by(|a, b| {
        a.sample_code
            .cmp(&b.sample_code)
            .then_with(|| a.test_name.cmp(&b.test_name))
            .then_with(|| a.tested_on.cmp(&b.tested_on))
            .then_with(|| a.verdict.as_str().cmp(b.verdict.as_str()))
            .then_with(|| a.measured_value.cmp(&b.measured_value))
    });

    CertifiedFacts {
        batch_code: batch.code.clone(),
        batch_date: batch.production_date,
        feedstock_type: batch.feedstock_type.clone(),
        feedstock_mass_kg: batch.feedstock_mass_kg,
        contamination_pct: batch.contamination_pct,
        oil_output_l: batch.oil_output_l,
        oil_yield_l_per_kg: batch.oil_yield_l_per_kg(),
        lab_results,
        ghg: GhgTotals::from(ghg),
    }
}

fn qty(value: f64) -> Value {
    Value::String(canonical_decimal(value, FACT_DECIMAL_PLACES))
}

/// The canonical JSON value of `facts`.
pub fn canonical_value(facts: &CertifiedFacts) -> Value {
    let labs: Vec<Value> = facts
        .lab_results
        .iter()
        .map(|lab| {
            json!({
                "measured_value": lab.measured_value,
                "sample_code": lab.sample_code,
                "test_name": lab.test_name,
                "tested_on": canonical_date(&lab.tested_on),
                "verdict": lab.verdict.as_str(),
            })
        })
        .collect();

    json!({
        "batch": {
            "code": facts.batch_code,
            "date": canonical_date(&facts.batch_date),
        },
        "feedstock": {
            "contamination_pct": facts.contamination_pct.map(qty),
            "mass_kg": qty(facts.feedstock_mass_kg),
            "type": facts.feedstock_type,
        },
        "ghg": {
            "avoided": qty(facts.ghg.avoided),
            "baseline_total": qty(facts.ghg.baseline_total),
            "project_total": qty(facts.ghg.project_total),
        },
        "lab_results": labs,
        "output": {
            "oil_l": qty(facts.oil_output_l),
            "yield_l_per_kg": qty(facts.oil_yield_l_per_kg),
        },
        "version": DOCUMENT_VERSION,
    })
}

/// The canonical document as a compact string.
pub fn canonical_document(facts: &CertifiedFacts) -> String {
    // A `Value` built from strings, numbers and nested objects always
    // serializes; `to_string` on it is infallible.
    canonical_value(facts).to_string()
}

/// Lowercase hex SHA-256 of the domain-separated canonical document.
pub fn content_hash(facts: &CertifiedFacts) -> String {
    let mut hasher = Sha256::new();
    hasher.update(HASH_DOMAIN.as_bytes());
    hasher.update(canonical_document(facts).as_bytes());
    hex::encode(hasher.finalize())
}
