//! Certificate issuance configuration, read from the `[certificate]` table.
//!
//! ```toml
//! [certificate]
//! code_prefix = "PYR"
//! verify_base_url = "https://verify.example.org/certificates"
//! max_code_attempts = 8
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use pyroledger_contracts::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CertificateConfig {
    /// Leading segment of every verification code, e.g. `PYR` in `PYR-4F1C-09AB`.
    pub code_prefix: String,
    /// The code is appended to this URL to form the public verification link.
    pub verify_base_url: String,
    /// How many fresh codes the issuer tries before giving up.
    pub max_code_attempts: usize,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            code_prefix: "PYR".to_string(),
            verify_base_url: "https://verify.pyroledger.local/certificates".to_string(),
            max_code_attempts: 8,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CertificateDocument {
    #[serde(default)]
    certificate: CertificateConfig,
}

impl CertificateConfig {
    /// Parse the `[certificate]` table of a TOML document. Other tables are
    /// ignored.
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        let doc: CertificateDocument = toml::from_str(s).map_err(|e| LedgerError::Config {
            reason: format!("failed to parse certificate TOML: {}", e),
        })?;
        doc.certificate.validate()?;
        Ok(doc.certificate)
    }

    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::Config {
            reason: format!("failed to read certificate config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.code_prefix.is_empty()
            || !self
                .code_prefix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(LedgerError::Config {
                reason: format!(
                    "code_prefix must be non-empty uppercase ASCII letters or digits, got '{}'",
                    self.code_prefix
                ),
            });
        }
        if self.max_code_attempts == 0 {
            return Err(LedgerError::Config {
                reason: "max_code_attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Public verification link for `code`.
    pub fn payload_ref(&self, code: &str) -> String {
        format!("{}/{}", self.verify_base_url.trim_end_matches('/'), code)
    }
}
