//! The public certificate verifier.
//!
//! `verify` is the anonymous lookup behind the verification link. The first
//! successful lookup stamps `verified_at` through the store's set-if-null
//! primitive; every later lookup, concurrent or not, sees that same value.
//! Store contention on the stamp is retried here and never reaches the
//! caller.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use pyroledger_contracts::{
    certificate::{Certificate, IntegrityReport, PublicCertificate},
    error::{LedgerError, LedgerResult},
};
use pyroledger_core::traits::CertificateStore;

use crate::{canonical::content_hash, code::normalize_code};

/// Attempts at the `verified_at` write before falling back to a plain read.
pub const MAX_STAMP_ATTEMPTS: usize = 5;

pub struct CertificateVerifier {
    certificates: Arc<dyn CertificateStore>,
}

impl CertificateVerifier {
    pub fn new(certificates: Arc<dyn CertificateStore>) -> Self {
        Self { certificates }
    }

    /// Look up `code`, stamp the first verification, and return the public
    /// projection.
    ///
    /// Codes are matched case-insensitively and ignoring surrounding
    /// whitespace. Returns `NotFound` for an unknown code.
    pub fn verify(&self, code: &str) -> LedgerResult<PublicCertificate> {
        let code = normalize_code(code);
        let certificate = self.load(&code)?;

        if certificate.verified_at.is_some() {
            debug!(code = %code, "certificate already verified");
            return Ok(PublicCertificate::from(&certificate));
        }

        let stamped = self.stamp_first_verification(&code)?;
        Ok(PublicCertificate::from(&stamped))
    }

    /// Recompute the content hash from the stored fact snapshot and compare
    /// it with the stored hash. Does not stamp `verified_at`.
    pub fn check_integrity(&self, code: &str) -> LedgerResult<IntegrityReport> {
        let code = normalize_code(code);
        let certificate = self.load(&code)?;
        let recomputed_hash = content_hash(&certificate.facts);
        let intact = recomputed_hash == certificate.content_hash;
        if !intact {
            warn!(
                code = %code,
                stored = %certificate.content_hash,
                recomputed = %recomputed_hash,
                "certificate hash mismatch"
            );
        }
        Ok(IntegrityReport {
            code,
            stored_hash: certificate.content_hash,
            recomputed_hash,
            intact,
        })
    }

    fn load(&self, code: &str) -> LedgerResult<Certificate> {
        self.certificates
            .find_by_code(code)?
            .ok_or_else(|| LedgerError::not_found("certificate", code))
    }

    fn stamp_first_verification(&self, code: &str) -> LedgerResult<Certificate> {
        for attempt in 1..=MAX_STAMP_ATTEMPTS {
            let now = Utc::now();
            match self.certificates.mark_verified_if_unset(code, now) {
                Ok(certificate) => {
                    if certificate.verified_at == Some(now) {
                        info!(code = %code, verified_at = %now, "certificate verified for the first time");
                    }
                    return Ok(certificate);
                }
                Err(LedgerError::Contention { reason }) => {
                    debug!(code = %code, attempt, reason = %reason, "verification stamp contended, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        // Whoever won the race has stamped the row by now; report its value.
        warn!(code = %code, attempts = MAX_STAMP_ATTEMPTS, "verification stamp still contended, serving stored state");
        self.load(code)
    }
}
