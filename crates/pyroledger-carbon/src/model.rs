//! The carbon model: pure functions from physical batch parameters to
//! carbon masses and emission figures.
//!
//! Methodology (all masses in kg, emissions in kg CO₂e):
//!
//! ```text
//! effective_carbon = feedstock_mass × (1 − contamination/100) × polymer_carbon_fraction
//! baseline         = effective_carbon × open_burning_factor
//! process          = diesel × diesel_factor
//!                  | duration × burn_rate × diesel_factor   (diesel not metered)
//!                  | 0                                      (neither recorded)
//! oil_combustion   = oil_output × oil_factor
//! char_credit      = min(char_fraction × effective_carbon × 44/12, baseline)
//! ```

use pyroledger_contracts::{
    batch::BatchInputs,
    error::{LedgerError, LedgerResult},
};

use crate::factors::EmissionFactors;

/// Mass of CO₂ per unit mass of carbon (molar mass ratio 44/12).
pub const CO2_PER_CARBON: f64 = 44.0 / 12.0;

/// Batch inputs after validation, with the contamination default applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedInputs {
    pub feedstock_mass_kg: f64,
    pub contamination_pct: f64,
    pub oil_output_l: f64,
    pub diesel_l: Option<f64>,
    pub duration_h: Option<f64>,
}

/// The carbon model bound to one set of emission factors.
#[derive(Debug, Clone)]
pub struct CarbonModel {
    factors: EmissionFactors,
}

fn check_non_negative(field: &str, value: f64) -> LedgerResult<()> {
    if !value.is_finite() {
        return Err(LedgerError::validation(field, format!("must be a finite number, got {}", value)));
    }
    if value < 0.0 {
        return Err(LedgerError::validation(field, format!("must not be negative, got {}", value)));
    }
    Ok(())
}

impl CarbonModel {
    /// Build a model after validating `factors`.
    pub fn new(factors: EmissionFactors) -> LedgerResult<Self> {
        factors.validate()?;
        Ok(Self { factors })
    }

    pub fn factors(&self) -> &EmissionFactors {
        &self.factors
    }

    /// Reject invalid inputs and apply the contamination default.
    ///
    /// Fails fast with `LedgerError::Validation` on a non-positive feedstock
    /// mass, any negative or non-finite volume, or contamination outside
    /// 0–100.
    pub fn resolve(&self, inputs: &BatchInputs) -> LedgerResult<ResolvedInputs> {
        check_non_negative("feedstock_mass_kg", inputs.feedstock_mass_kg)?;
        if inputs.feedstock_mass_kg == 0.0 {
            return Err(LedgerError::validation("feedstock_mass_kg", "must be greater than zero"));
        }
        check_non_negative("oil_output_l", inputs.oil_output_l)?;
        if let Some(diesel) = inputs.diesel_l {
            check_non_negative("diesel_l", diesel)?;
        }
        if let Some(hours) = inputs.duration_h {
            check_non_negative("duration_h", hours)?;
        }

        let contamination_pct = match inputs.contamination_pct {
            Some(pct) => {
                check_non_negative("contamination_pct", pct)?;
                if pct > 100.0 {
                    return Err(LedgerError::validation(
                        "contamination_pct",
                        format!("must not exceed 100, got {}", pct),
                    ));
                }
                pct
            }
            None => self.factors.default_contamination_pct,
        };

        Ok(ResolvedInputs {
            feedstock_mass_kg: inputs.feedstock_mass_kg,
            contamination_pct,
            oil_output_l: inputs.oil_output_l,
            diesel_l: inputs.diesel_l,
            duration_h: inputs.duration_h,
        })
    }

    /// Carbon mass of the clean polymer fraction of the feedstock.
    pub fn effective_carbon_kg(&self, feedstock_mass_kg: f64, contamination_pct: f64) -> f64 {
        feedstock_mass_kg * (1.0 - contamination_pct / 100.0) * self.factors.polymer_carbon_fraction
    }

    /// Counterfactual emissions had the feedstock been burned in the open.
    pub fn baseline_emissions(&self, effective_carbon_kg: f64) -> f64 {
        effective_carbon_kg * self.factors.open_burning_factor
    }

    /// Emissions from fuel burned to run the reactor.
    ///
    /// Metered diesel wins over the duration proxy; with neither recorded
    /// the process contributes nothing.
    pub fn process_emissions(&self, diesel_l: Option<f64>, duration_h: Option<f64>) -> f64 {
        match (diesel_l, duration_h) {
            (Some(diesel), _) => diesel * self.factors.diesel_combustion_factor,
            (None, Some(hours)) => {
                hours * self.factors.diesel_burn_rate_l_per_hour * self.factors.diesel_combustion_factor
            }
            (None, None) => 0.0,
        }
    }

    /// Emissions from the eventual combustion of the produced oil.
    pub fn oil_combustion_emissions(&self, oil_output_l: f64) -> f64 {
        oil_output_l * self.factors.oil_combustion_factor
    }

    /// Credit for carbon retained in char, capped at the baseline.
    pub fn char_sequestration_credit(&self, effective_carbon_kg: f64) -> f64 {
        let credit = self.factors.char_sequestration_fraction * effective_carbon_kg * CO2_PER_CARBON;
        credit.min(self.baseline_emissions(effective_carbon_kg))
    }
}
