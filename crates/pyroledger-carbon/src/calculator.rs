//! The GHG calculator: the single entry point that turns `BatchInputs`
//! into a `GhgResult`.
//!
//! Calculation is deterministic and side-effect free. Identical inputs give
//! bit-identical outputs, which certificate hashes depend on. Callers own
//! persistence of the result.

use tracing::{debug, warn};

use pyroledger_contracts::{
    batch::{Batch, BatchInputs},
    error::LedgerResult,
    ghg::GhgResult,
};

use crate::{factors::EmissionFactors, model::CarbonModel};

/// Orchestrates the `CarbonModel` over one batch's inputs.
#[derive(Debug, Clone)]
pub struct GhgCalculator {
    model: CarbonModel,
}

impl GhgCalculator {
    /// Build a calculator over validated `factors`.
    pub fn new(factors: EmissionFactors) -> LedgerResult<Self> {
        Ok(Self {
            model: CarbonModel::new(factors)?,
        })
    }

    pub fn model(&self) -> &CarbonModel {
        &self.model
    }

    /// Compute the full emissions profile for `inputs`.
    ///
    /// Returns `LedgerError::Validation` without computing anything if an
    /// input is out of range.
    pub fn calculate(&self, inputs: &BatchInputs) -> LedgerResult<GhgResult> {
        let resolved = self.model.resolve(inputs).map_err(|e| {
            warn!(error = %e, "rejected GHG calculation inputs");
            e
        })?;

        let effective_carbon_kg = self
            .model
            .effective_carbon_kg(resolved.feedstock_mass_kg, resolved.contamination_pct);
        let baseline_total = self.model.baseline_emissions(effective_carbon_kg);
        let process_emissions = self.model.process_emissions(resolved.diesel_l, resolved.duration_h);
        let oil_combustion_emissions = self.model.oil_combustion_emissions(resolved.oil_output_l);
        let char_sequestration_credit = self.model.char_sequestration_credit(effective_carbon_kg);

        let project_total = process_emissions + oil_combustion_emissions - char_sequestration_credit;
        let avoided = baseline_total - project_total;

        debug!(
            feedstock_mass_kg = resolved.feedstock_mass_kg,
            contamination_pct = resolved.contamination_pct,
            baseline_total,
            project_total,
            avoided,
            "GHG calculation complete"
        );

        Ok(GhgResult {
            effective_carbon_kg,
            process_emissions,
            oil_combustion_emissions,
            char_sequestration_credit,
            project_total,
            baseline_total,
            avoided,
        })
    }

    /// Return a copy of `batch` with its derived result brought up to date.
    ///
    /// A completed batch gets a freshly computed result; any other batch
    /// carries none. The input batch is never modified.
    pub fn recompute_for(&self, batch: &Batch) -> LedgerResult<Batch> {
        let ghg = if batch.is_completed() {
            Some(self.calculate(&batch.inputs())?)
        } else {
            None
        };
        Ok(Batch {
            ghg,
            ..batch.clone()
        })
    }
}
