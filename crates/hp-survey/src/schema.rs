//! Survey schema definitions.

use serde::{Deserialize, Serialize};

/// A full hydrological survey: topology plus per-category physical tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Survey {
    #[serde(default)]
    pub topology: Vec<TopologyRow>,
    #[serde(default)]
    pub reservoirs: Vec<ReservoirRow>,
    #[serde(default)]
    pub inflows: Vec<InflowRow>,
    #[serde(default)]
    pub demands: Vec<DemandRow>,
    #[serde(default)]
    pub intakes: Vec<IntakeRow>,
    #[serde(default)]
    pub conduits_a: Vec<ConduitRow>,
    #[serde(default)]
    pub conduits_b: Vec<ConduitRow>,
    #[serde(default)]
    pub pumps: Vec<PumpRow>,
    #[serde(default)]
    pub returns: Vec<ReturnRow>,
    #[serde(default)]
    pub aquifers: Vec<AquiferRow>,
}

/// Element category tag for a topology row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Junction,
    Reservoir,
    Inflow,
    Demand,
    Intake,
    ConduitA,
    ConduitB,
    Pump,
    Return,
    Aquifer,
}

/// One element of the network topology. `origin`/`destination` reference the
/// numeric ids of other rows; which of them are required depends on the kind
/// (see `validate`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopologyRow {
    pub kind: ElementKind,
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<u32>,
    /// Intakes only: the return element receiving the non-consumed split.
    /// Zero routes the split to the synthetic global sink.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<u32>,
}

/// Reservoir physical data, keyed by (possibly quoted) display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservoirRow {
    pub name: String,
    /// Allocation priority rank; the provisional node cost is its negation.
    pub priority: f64,
    pub initial_volume: f64,
    /// Release capacity per monthly step; absent means unconstrained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_release: Option<f64>,
    /// 12 monthly values each.
    pub min_volume: Vec<f64>,
    pub max_volume: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective_volume: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaporation: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InflowRow {
    pub name: String,
    /// 12 monthly contribution values.
    pub contribution: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemandRow {
    pub name: String,
    /// 12 monthly demand values.
    pub demand: Vec<f64>,
    #[serde(default)]
    pub priority: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guarantee: Option<GuaranteeDef>,
}

/// Supply-guarantee criteria carried through from the survey.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuaranteeDef {
    pub one_year: f64,
    pub two_year: f64,
    pub ten_year: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntakeRow {
    pub name: String,
    /// Fraction of throughput delivered to the demand destination.
    pub supply_factor: f64,
    /// Fraction routed back through the return element. Must complement
    /// `supply_factor` to 1.0.
    pub return_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConduitRow {
    pub name: String,
    /// Fraction of gross flow lost in transit, in [0, 1).
    pub loss: f64,
    /// 12 monthly values.
    pub max_flow: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_flow: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PumpRow {
    pub name: String,
    pub capacity: f64,
    /// Per-unit operating cost (positive: repels flow).
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnRow {
    pub name: String,
    /// 12 monthly values bounding the asserted return flow.
    pub max_flow: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AquiferRow {
    pub name: String,
    /// 12 monthly recharge values; blank means no recharge series surveyed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recharge: Option<Vec<f64>>,
}

/// Declarative remediation table for isolated nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExceptionTable {
    #[serde(default)]
    pub rules: Vec<ExceptionRule>,
}

/// One remediation: the node it covers, what to do, and why. The rationale is
/// data, not commentary; it travels into the resolution report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExceptionRule {
    /// Registry key of the isolated node this rule covers.
    pub node: String,
    pub action: ExceptionAction,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ExceptionAction {
    /// Add an edge discovered by domain inspection.
    Connect { from: String, to: String },
    /// Delete the node and every profile attached to it.
    Remove,
}

impl ExceptionTable {
    pub fn rule_for(&self, node_key: &str) -> Option<&ExceptionRule> {
        self.rules.iter().find(|r| r.node == node_key)
    }
}
