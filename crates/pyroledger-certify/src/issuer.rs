//! The certificate issuer.
//!
//! Issuance pipeline:
//!
//!   load batch → check completed + GHG result → collect facts → hash →
//!   mint collision-free code → persist
//!
//! Nothing is written unless every precondition holds. Issuing twice over
//! unchanged facts yields two certificates with the same hash and distinct
//! codes; both stay valid.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use pyroledger_contracts::{
    certificate::{Certificate, IssuedCertificate},
    error::{LedgerError, LedgerResult},
};
use pyroledger_core::traits::{BatchRepository, CertificateStore};

use crate::{
    canonical::{collect_facts, content_hash},
    code::{normalize_code, random_code, CodeSource},
    config::CertificateConfig,
};

pub struct CertificateIssuer {
    batches: Arc<dyn BatchRepository>,
    certificates: Arc<dyn CertificateStore>,
    config: CertificateConfig,
    code_source: CodeSource,
}

impl CertificateIssuer {
    /// Create an issuer that mints random codes.
    pub fn new(
        batches: Arc<dyn BatchRepository>,
        certificates: Arc<dyn CertificateStore>,
        config: CertificateConfig,
    ) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self {
            batches,
            certificates,
            config,
            code_source: Box::new(random_code),
        })
    }

    /// Replace the code generator.
    pub fn with_code_source(mut self, source: CodeSource) -> Self {
        self.code_source = source;
        self
    }

    /// Issue a certificate for `batch_id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the batch does not exist
    /// - `Precondition` if it is not completed or carries no GHG result
    /// - `Store` if no unused code could be minted within
    ///   `max_code_attempts`
    pub fn issue(&self, batch_id: &str) -> LedgerResult<IssuedCertificate> {
        let batch = self
            .batches
            .find_batch(batch_id)?
            .ok_or_else(|| LedgerError::not_found("batch", batch_id))?;

        if !batch.is_completed() {
            warn!(batch_id = %batch_id, status = %batch.status, "certificate refused: batch not completed");
            return Err(LedgerError::Precondition {
                reason: format!("batch '{}' is {}, not completed", batch.code, batch.status),
            });
        }
        let ghg = batch.ghg.as_ref().ok_or_else(|| {
            warn!(batch_id = %batch_id, "certificate refused: no GHG result");
            LedgerError::Precondition {
                reason: format!("batch '{}' has no GHG result", batch.code),
            }
        })?;

        let labs = self.batches.lab_results_for(batch_id)?;
        let facts = collect_facts(&batch, ghg, &labs);
        let hash = content_hash(&facts);

        for attempt in 1..=self.config.max_code_attempts {
            // Stored in the same form `verify` looks codes up by.
            let code = normalize_code(&(self.code_source)(&self.config.code_prefix));
            if self.certificates.code_exists(&code)? {
                debug!(code = %code, attempt, "verification code already taken");
                continue;
            }

            let certificate = Certificate {
                id: Uuid::new_v4(),
                batch_id: batch.id.clone(),
                payload_ref: self.config.payload_ref(&code),
                code: code.clone(),
                content_hash: hash.clone(),
                issued_at: Utc::now(),
                verified_at: None,
                avoided_kg_co2e: ghg.avoided,
                diverted_kg: batch.feedstock_mass_kg,
                facts: facts.clone(),
            };
            let issued = IssuedCertificate::from(&certificate);

            match self.certificates.insert(certificate) {
                Ok(()) => {
                    info!(
                        batch_id = %batch_id,
                        code = %issued.code,
                        hash = %issued.hash,
                        lab_results = facts.lab_results.len(),
                        "certificate issued"
                    );
                    return Ok(issued);
                }
                Err(LedgerError::Contention { reason }) => {
                    debug!(code = %code, attempt, reason = %reason, "code claimed concurrently, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(LedgerError::Store {
            reason: format!(
                "could not allocate a unique verification code after {} attempts",
                self.config.max_code_attempts
            ),
        })
    }
}
