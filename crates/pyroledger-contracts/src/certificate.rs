//! Certificate types: the stored record, the issuance receipt, and the
//! redacted public projection.
//!
//! A `Certificate` is a snapshot, not a live view. `facts` and
//! `content_hash` are fixed at issuance; only `verified_at` ever changes,
//! exactly once, from `None` to a timestamp.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{batch::LabVerdict, ghg::GhgTotals};

/// Identifying and verdict fields of one lab result, as certified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertifiedLabResult {
    pub sample_code: String,
    pub test_name: String,
    pub verdict: LabVerdict,
    pub measured_value: Option<String>,
    pub tested_on: NaiveDate,
}

/// Every fact a certificate attests to. The content hash is computed over
/// the canonical document built from this value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertifiedFacts {
    pub batch_code: String,
    pub batch_date: NaiveDate,
    pub feedstock_type: String,
    pub feedstock_mass_kg: f64,
    pub contamination_pct: Option<f64>,
    pub oil_output_l: f64,
    pub oil_yield_l_per_kg: f64,
    /// Sorted by sample code, test name, test date, verdict, then measured value.
    pub lab_results: Vec<CertifiedLabResult>,
    pub ghg: GhgTotals,
}

/// A persisted certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: Uuid,
    /// Internal batch identifier. Never exposed publicly.
    pub batch_id: String,
    /// Human-facing verification code, unique across all certificates.
    pub code: String,
    /// Lowercase hex SHA-256 of the canonical fact document.
    pub content_hash: String,
    /// Public URL at which the certificate can be verified.
    pub payload_ref: String,
    pub issued_at: DateTime<Utc>,
    /// Set once, on the first public verification.
    pub verified_at: Option<DateTime<Utc>>,
    /// Avoided emissions (kg CO₂e) at issuance.
    pub avoided_kg_co2e: f64,
    /// Feedstock mass (kg) diverted from open burning.
    pub diverted_kg: f64,
    pub facts: CertifiedFacts,
}

/// What `CertificateIssuer::issue` hands back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedCertificate {
    pub code: String,
    pub hash: String,
    pub issued_at: DateTime<Utc>,
    pub avoided: f64,
    pub diverted: f64,
}

impl From<&Certificate> for IssuedCertificate {
    fn from(cert: &Certificate) -> Self {
        Self {
            code: cert.code.clone(),
            hash: cert.content_hash.clone(),
            issued_at: cert.issued_at,
            avoided: cert.avoided_kg_co2e,
            diverted: cert.diverted_kg,
        }
    }
}

/// Lab verdict as shown on the public verification page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicLabVerdict {
    pub sample_code: String,
    pub test_name: String,
    pub verdict: LabVerdict,
    pub tested_on: NaiveDate,
}

/// Impact figures as shown on the public verification page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PublicImpact {
    pub baseline_kg_co2e: f64,
    pub project_kg_co2e: f64,
    pub avoided_kg_co2e: f64,
    pub diverted_kg: f64,
}

/// The redacted projection returned to anonymous verifiers.
///
/// Carries no internal identifiers, no actor information, and no batch
/// fields outside the certified fact set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicCertificate {
    pub code: String,
    pub content_hash: String,
    pub batch_code: String,
    pub batch_date: NaiveDate,
    pub feedstock_type: String,
    pub feedstock_mass_kg: f64,
    pub oil_output_l: f64,
    pub oil_yield_l_per_kg: f64,
    pub impact: PublicImpact,
    pub lab_verdicts: Vec<PublicLabVerdict>,
    pub issued_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl From<&Certificate> for PublicCertificate {
    fn from(cert: &Certificate) -> Self {
        let facts = &cert.facts;
        Self {
            code: cert.code.clone(),
            content_hash: cert.content_hash.clone(),
            batch_code: facts.batch_code.clone(),
            batch_date: facts.batch_date,
            feedstock_type: facts.feedstock_type.clone(),
            feedstock_mass_kg: facts.feedstock_mass_kg,
            oil_output_l: facts.oil_output_l,
            oil_yield_l_per_kg: facts.oil_yield_l_per_kg,
            impact: PublicImpact {
                baseline_kg_co2e: facts.ghg.baseline_total,
                project_kg_co2e: facts.ghg.project_total,
                avoided_kg_co2e: cert.avoided_kg_co2e,
                diverted_kg: cert.diverted_kg,
            },
            lab_verdicts: facts
                .lab_results
                .iter()
                .map(|lab| PublicLabVerdict {
                    sample_code: lab.sample_code.clone(),
                    test_name: lab.test_name.clone(),
                    verdict: lab.verdict,
                    tested_on: lab.tested_on,
                })
                .collect(),
            issued_at: cert.issued_at,
            verified_at: cert.verified_at,
        }
    }
}

/// Result of recomputing a certificate's hash from its stored facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub code: String,
    pub stored_hash: String,
    pub recomputed_hash: String,
    pub intact: bool,
}
