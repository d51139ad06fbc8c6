//! Run parameters.

use chrono::NaiveDate;
use hp_core::{ensure_finite, Real, StepKind};
use serde::{Deserialize, Serialize};

use crate::error::{RunError, RunResult};

/// Planning vs optimization run. The distinction labels the output; both
/// modes drive the same pipeline and solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    #[default]
    Planning,
    Optimization,
}

/// Percentage multipliers per water-source class.
///
/// Accepted, validated, and echoed in the run manifest; not yet wired into
/// any capacity bound.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SourceAvailability {
    pub surface: Real,
    pub ground: Real,
    pub reused: Real,
    pub transfer: Real,
    pub desalinated: Real,
}

impl Default for SourceAvailability {
    fn default() -> Self {
        Self {
            surface: 1.0,
            ground: 1.0,
            reused: 1.0,
            transfer: 1.0,
            desalinated: 1.0,
        }
    }
}

impl SourceAvailability {
    fn validate(&self) -> RunResult<()> {
        for (name, v) in [
            ("surface", self.surface),
            ("ground", self.ground),
            ("reused", self.reused),
            ("transfer", self.transfer),
            ("desalinated", self.desalinated),
        ] {
            ensure_finite(v, name)?;
            if v < 0.0 {
                return Err(RunError::Config {
                    what: format!("{name} availability must be non-negative, got {v}"),
                });
            }
        }
        Ok(())
    }
}

/// How entity bounds are initialized during assembly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InitSelection {
    /// Match each node to its survey physical row.
    #[default]
    SurveyDerived,
    /// Draw bounds from fixed candidate sets, for synthetic test runs.
    Sampled { seed: u64 },
}

/// Everything one pipeline invocation needs beyond the survey itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    pub mode: RunMode,
    pub step: StepKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub availability: SourceAvailability,
    #[serde(default)]
    pub init: InitSelection,
    /// Junction label designated as the basin's overflow sink.
    #[serde(default)]
    pub overflow_label: Option<String>,
}

impl RunConfig {
    pub fn new(start: NaiveDate, end: NaiveDate, step: StepKind) -> Self {
        Self {
            mode: RunMode::default(),
            step,
            start,
            end,
            availability: SourceAvailability::default(),
            init: InitSelection::default(),
            overflow_label: None,
        }
    }

    pub fn validate(&self) -> RunResult<()> {
        if self.end < self.start {
            return Err(RunError::Config {
                what: "run end date precedes start date".to_string(),
            });
        }
        self.availability.validate()
    }
}
