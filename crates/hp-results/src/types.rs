//! Report data types.

use chrono::NaiveDate;
use hp_core::Real;
use serde::{Deserialize, Serialize};

/// Statistics over one entity's actual series against its planned bound.
///
/// `planned_total` carries the substitution policy: when the entity has no
/// planned bound (infinite capacity), the actual total stands in for it, so
/// totals never propagate infinities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesStats {
    pub mean: Real,
    pub total: Real,
    pub planned_total: Real,
    pub deficit: Real,
    pub deficit_pct: Real,
    pub failure_frequency: Real,
}

/// One row of a category table: an entity's series plus its statistics and
/// whatever category-specific extras apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRecord {
    pub id: String,
    pub name: String,
    pub flow: Vec<Real>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned: Option<Vec<Real>>,
    #[serde(flatten)]
    pub stats: SeriesStats,
    #[serde(flatten)]
    pub extras: Extras,
}

/// Category-specific report columns. Absent columns are skipped on output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extras {
    /// Inflows and aquifers: actual / planned per timestep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplied_rate: Option<Vec<Real>>,
    /// Intakes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply_share: Option<Real>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_share: Option<Real>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply_flow: Option<Vec<Real>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_flow: Option<Vec<Real>>,
    /// Conduits: loss fraction and post-loss throughput.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<Real>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_flow: Option<Vec<Real>>,
    /// Reservoirs: end-of-step storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Vec<Real>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_volume: Option<Real>,
    /// Pumps: unit cost carried through for the report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Real>,
}

/// Per-category planned/actual/deficit triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub planned: Real,
    pub actual: Real,
    pub deficit_pct: Real,
}

/// Source-side vs sink-side balance over the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrandTotals {
    pub input_total: Real,
    pub output_total: Real,
    pub categories: Vec<CategoryTotal>,
}

/// One table per entity category plus the grand totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsReport {
    pub timestamps: Vec<NaiveDate>,
    pub reservoirs: Vec<FlowRecord>,
    pub inflows: Vec<FlowRecord>,
    pub demands: Vec<FlowRecord>,
    pub intakes: Vec<FlowRecord>,
    pub conduits: Vec<FlowRecord>,
    pub pumps: Vec<FlowRecord>,
    pub returns: Vec<FlowRecord>,
    pub aquifers: Vec<FlowRecord>,
    pub totals: GrandTotals,
}
