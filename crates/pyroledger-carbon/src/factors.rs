//! Emission-factor configuration.
//!
//! The factors encode an external accounting methodology that varies by
//! jurisdiction and standard revision, so none of them are literals in the
//! model. They are read from the `[factors]` table of a TOML document:
//!
//! ```toml
//! [factors]
//! polymer_carbon_fraction = 0.857
//! open_burning_factor = 3.67
//! diesel_combustion_factor = 2.68
//! oil_combustion_factor = 2.75
//! char_sequestration_fraction = 0.05
//! diesel_burn_rate_l_per_hour = 6.5
//! default_contamination_pct = 15.0
//! ```
//!
//! Keys left out fall back to `EmissionFactors::default()`. Unknown keys are
//! rejected so a typo cannot silently leave a default in force.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use pyroledger_contracts::error::{LedgerError, LedgerResult};

/// The configured constants of the carbon model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmissionFactors {
    /// Carbon share of the polymer by mass (kg C per kg polymer).
    pub polymer_carbon_fraction: f64,
    /// kg CO₂e released per kg carbon under uncontrolled open burning.
    pub open_burning_factor: f64,
    /// kg CO₂e per liter of diesel burned.
    pub diesel_combustion_factor: f64,
    /// kg CO₂e per liter of product oil eventually combusted.
    pub oil_combustion_factor: f64,
    /// Share of effective carbon retained in solid char.
    pub char_sequestration_fraction: f64,
    /// Liters of diesel per process hour, used when diesel was not metered.
    pub diesel_burn_rate_l_per_hour: f64,
    /// Contamination percentage assumed when a batch does not record one.
    pub default_contamination_pct: f64,
}

impl Default for EmissionFactors {
    /// Illustrative reference values. Deployments are expected to supply
    /// the factors of the methodology they report under.
    fn default() -> Self {
        Self {
            polymer_carbon_fraction: 0.857,
            open_burning_factor: 3.67,
            diesel_combustion_factor: 2.68,
            oil_combustion_factor: 2.75,
            char_sequestration_fraction: 0.05,
            diesel_burn_rate_l_per_hour: 6.5,
            default_contamination_pct: 15.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FactorsDocument {
    #[serde(default)]
    factors: EmissionFactors,
}

impl EmissionFactors {
    /// Parse the `[factors]` table out of a TOML document and validate it.
    ///
    /// Other top-level tables are ignored, so the same file can carry
    /// configuration for other components. Returns `LedgerError::Config`
    /// when the TOML is malformed or a factor is out of range.
    pub fn from_toml_str(s: &str) -> LedgerResult<Self> {
        let doc: FactorsDocument = toml::from_str(s).map_err(|e| LedgerError::Config {
            reason: format!("failed to parse emission factors TOML: {}", e),
        })?;
        doc.factors.validate()?;
        Ok(doc.factors)
    }

    /// Read and parse the TOML file at `path`.
    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| LedgerError::Config {
            reason: format!("failed to read factors file '{}': {}", path.display(), e),
        })?;
        let factors = Self::from_toml_str(&contents)?;
        info!(path = %path.display(), "emission factors loaded");
        Ok(factors)
    }

    /// Check every factor is finite and in range.
    ///
    /// The polymer carbon fraction and open-burning factor must be strictly
    /// positive: with either at zero the baseline collapses and contamination
    /// no longer has any effect on it.
    pub fn validate(&self) -> LedgerResult<()> {
        let named = [
            ("polymer_carbon_fraction", self.polymer_carbon_fraction),
            ("open_burning_factor", self.open_burning_factor),
            ("diesel_combustion_factor", self.diesel_combustion_factor),
            ("oil_combustion_factor", self.oil_combustion_factor),
            ("char_sequestration_fraction", self.char_sequestration_fraction),
            ("diesel_burn_rate_l_per_hour", self.diesel_burn_rate_l_per_hour),
            ("default_contamination_pct", self.default_contamination_pct),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(LedgerError::Config {
                    reason: format!("factor '{}' must be a finite non-negative number, got {}", name, value),
                });
            }
        }

        if self.polymer_carbon_fraction <= 0.0 || self.polymer_carbon_fraction > 1.0 {
            return Err(LedgerError::Config {
                reason: format!(
                    "polymer_carbon_fraction must be in (0, 1], got {}",
                    self.polymer_carbon_fraction
                ),
            });
        }
        if self.open_burning_factor <= 0.0 {
            return Err(LedgerError::Config {
                reason: "open_burning_factor must be greater than zero".to_string(),
            });
        }
        if self.char_sequestration_fraction > 1.0 {
            return Err(LedgerError::Config {
                reason: format!(
                    "char_sequestration_fraction must be in [0, 1], got {}",
                    self.char_sequestration_fraction
                ),
            });
        }
        if self.default_contamination_pct > 100.0 {
            return Err(LedgerError::Config {
                reason: format!(
                    "default_contamination_pct must be in [0, 100], got {}",
                    self.default_contamination_pct
                ),
            });
        }
        Ok(())
    }
}
