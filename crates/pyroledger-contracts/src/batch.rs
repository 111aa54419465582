//! Batch, lab result, and calculation input types.
//!
//! `Batch` and `LabResult` are the mutable records the dashboard edits.
//! `BatchInputs` is the immutable physical-parameter set a single GHG
//! calculation consumes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ghg::GhgResult;

/// Entity type name under which batches are audited.
pub const BATCH_ENTITY_TYPE: &str = "batch";

/// Entity type name under which lab results are audited.
pub const LAB_RESULT_ENTITY_TYPE: &str = "lab_result";

/// Lifecycle state of a pyrolysis batch.
///
/// Only `Completed` batches carry a GHG result and may be certified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl BatchStatus {
    /// Stable lowercase name, used in snapshots and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Planned => "planned",
            BatchStatus::InProgress => "in_progress",
            BatchStatus::Completed => "completed",
            BatchStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The physical parameters of one batch, as consumed by the GHG calculator.
///
/// Validation happens inside the calculator, not here, so that a rejected
/// input set can still be constructed and reported verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchInputs {
    /// Feedstock mass in kilograms. Must be > 0.
    pub feedstock_mass_kg: f64,
    /// Contamination as a percentage (0–100). Defaulted when absent.
    pub contamination_pct: Option<f64>,
    /// Oil produced, in liters. Must be >= 0.
    pub oil_output_l: f64,
    /// Diesel burned to run the reactor, in liters.
    pub diesel_l: Option<f64>,
    /// Process duration in hours.
    pub duration_h: Option<f64>,
}

impl BatchInputs {
    /// Inputs with only the mandatory fields set.
    pub fn new(feedstock_mass_kg: f64, oil_output_l: f64) -> Self {
        Self {
            feedstock_mass_kg,
            contamination_pct: None,
            oil_output_l,
            diesel_l: None,
            duration_h: None,
        }
    }

    pub fn with_contamination(mut self, pct: f64) -> Self {
        self.contamination_pct = Some(pct);
        self
    }

    pub fn with_diesel(mut self, liters: f64) -> Self {
        self.diesel_l = Some(liters);
        self
    }

    pub fn with_duration(mut self, hours: f64) -> Self {
        self.duration_h = Some(hours);
        self
    }
}

/// A single pyrolysis run as recorded by the operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    /// Human-facing batch code, e.g. "B-2026-014".
    pub code: String,
    pub production_date: NaiveDate,
    pub status: BatchStatus,
    /// Free-text feedstock description, e.g. "HDPE film, post-consumer".
    pub feedstock_type: String,
    pub feedstock_mass_kg: f64,
    pub contamination_pct: Option<f64>,
    pub oil_output_l: f64,
    pub diesel_l: Option<f64>,
    pub duration_h: Option<f64>,
    pub notes: String,
    /// Derived figures; present only once the batch is completed.
    pub ghg: Option<GhgResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// Extract the calculator's input set from this batch.
    pub fn inputs(&self) -> BatchInputs {
        BatchInputs {
            feedstock_mass_kg: self.feedstock_mass_kg,
            contamination_pct: self.contamination_pct,
            oil_output_l: self.oil_output_l,
            diesel_l: self.diesel_l,
            duration_h: self.duration_h,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == BatchStatus::Completed
    }

    /// Oil yield in liters per kilogram of feedstock.
    ///
    /// Zero when the feedstock mass is not positive.
    pub fn oil_yield_l_per_kg(&self) -> f64 {
        if self.feedstock_mass_kg > 0.0 {
            self.oil_output_l / self.feedstock_mass_kg
        } else {
            0.0
        }
    }
}

/// Outcome of a laboratory test on a batch sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabVerdict {
    Pass,
    Fail,
    Pending,
}

impl LabVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabVerdict::Pass => "pass",
            LabVerdict::Fail => "fail",
            LabVerdict::Pending => "pending",
        }
    }
}

impl std::fmt::Display for LabVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lab analysis attached to a batch (oil quality, char composition, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    pub id: String,
    pub batch_id: String,
    pub sample_code: String,
    /// What was measured, e.g. "flash point" or "sulfur content".
    pub test_name: String,
    pub verdict: LabVerdict,
    /// Measured value as reported by the lab, including its unit.
    pub measured_value: Option<String>,
    pub tested_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
