//! Greenhouse-gas accounting results.

use serde::{Deserialize, Serialize};

/// The derived emissions profile of one batch, in kg CO₂-equivalent.
///
/// Invariants, held exactly by construction in the calculator:
/// - `project_total == process_emissions + oil_combustion_emissions - char_sequestration_credit`
/// - `avoided == baseline_total - project_total`
///
/// `avoided` may be negative when the process is net-worse than the
/// open-burning counterfactual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GhgResult {
    /// Carbon mass (kg C) the baseline and credit are derived from.
    pub effective_carbon_kg: f64,
    pub process_emissions: f64,
    pub oil_combustion_emissions: f64,
    pub char_sequestration_credit: f64,
    pub project_total: f64,
    pub baseline_total: f64,
    pub avoided: f64,
}

/// The three headline figures a certificate attests to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GhgTotals {
    pub baseline_total: f64,
    pub project_total: f64,
    pub avoided: f64,
}

impl From<&GhgResult> for GhgTotals {
    fn from(result: &GhgResult) -> Self {
        Self {
            baseline_total: result.baseline_total,
            project_total: result.project_total,
            avoided: result.avoided,
        }
    }
}
