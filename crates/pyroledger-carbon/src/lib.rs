//! # pyroledger-carbon
//!
//! Lifecycle greenhouse-gas accounting for pyrolysis batches.
//!
//! ## Overview
//!
//! [`GhgCalculator`] compares a batch's project scenario (process fuel,
//! downstream oil combustion, minus the char sequestration credit) against
//! the counterfactual of burning the same feedstock in the open. Every
//! constant of the methodology lives in [`EmissionFactors`], loaded from
//! TOML at process start.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use pyroledger_carbon::{EmissionFactors, GhgCalculator};
//! use pyroledger_contracts::batch::BatchInputs;
//!
//! let factors = EmissionFactors::from_file(Path::new("config/pyroledger.toml"))?;
//! let calc = GhgCalculator::new(factors)?;
//! let result = calc.calculate(&BatchInputs::new(450.0, 360.0).with_diesel(40.0))?;
//! ```

pub mod calculator;
pub mod factors;
pub mod model;

pub use calculator::GhgCalculator;
pub use factors::EmissionFactors;
pub use model::{CarbonModel, CO2_PER_CARBON};

// ── Tests ─────────────────────────────────────────────────────────────────────
