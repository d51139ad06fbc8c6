//! Sink-cost derivation.
//!
//! The optimizer only routes flow along paths whose cumulative cost is
//! negative, so every legitimate sink must be priced below the dirtiest path
//! that can reach it. For each sink category we walk all predecessor chains,
//! take the maximum accumulated path cost M, and overwrite the category's
//! cost with the corrected value. Runs exactly once per network: re-running
//! would read corrected sink costs as path costs and compound the correction.

use std::collections::HashSet;

use hp_core::{NodeId, Real};
use serde::Serialize;

use crate::error::{NetworkError, NetworkResult};
use crate::graph::Network;
use crate::node::NodeKind;

/// Extra separation applied to the Demand category's corrected cost.
pub const DEMAND_SEPARATION_GAIN: Real = 10.0;

/// Sink groups that receive independent cost treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SinkCategory {
    Demand,
    Overflow,
    GlobalSink,
    ReturnOutput,
}

impl SinkCategory {
    pub const ALL: [SinkCategory; 4] = [
        SinkCategory::Demand,
        SinkCategory::Overflow,
        SinkCategory::GlobalSink,
        SinkCategory::ReturnOutput,
    ];

    fn matches(self, kind: NodeKind) -> bool {
        match self {
            SinkCategory::Demand => kind == NodeKind::Demand,
            SinkCategory::Overflow => kind == NodeKind::Overflow,
            SinkCategory::GlobalSink => kind == NodeKind::GlobalSink,
            SinkCategory::ReturnOutput => kind == NodeKind::ReturnOutput,
        }
    }
}

/// Per-category outcome of one assignment run.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryCost {
    pub category: SinkCategory,
    pub members: usize,
    /// Maximum accumulated predecessor-path cost M across members.
    pub max_path_cost: Option<Real>,
    /// `None` when the category is empty or its surveyed costs already
    /// order correctly.
    pub assigned_cost: Option<Real>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CostReport {
    pub categories: Vec<CategoryCost>,
}

/// Corrected sink cost for an observed maximum path cost `m`, or `None` when
/// the current cost already orders correctly.
///
/// Legitimate sinks (demands, return outputs) are repriced below the dirtiest
/// path when that path is costly; when every path is already beneficial their
/// surveyed cost stands. Leak sinks (overflow, global sink) get the opposite
/// correction: when their paths trend beneficial they are repriced just above
/// zero benefit so they never outcompete a genuine demand.
///
/// `m` is deliberately not floored at zero. Flooring it would reprice every
/// demand to `-1 * gain` even when its paths already attract flow; here a
/// negative `m` leaves the category untouched, which preserves surveyed
/// priority spreads between demands.
fn corrected_cost(m: Real, category: SinkCategory) -> Option<Real> {
    match category {
        SinkCategory::Demand => (m >= 0.0).then(|| (-m - 1.0) * DEMAND_SEPARATION_GAIN),
        SinkCategory::ReturnOutput => (m >= 0.0).then(|| -m - 1.0),
        SinkCategory::Overflow | SinkCategory::GlobalSink => (m <= 0.0).then(|| -m + 1.0),
    }
}

/// Maximum accumulated cost over every predecessor path ending at `start`.
///
/// Explicit DFS with an on-path set; revisiting a node already on the current
/// path means the predecessor graph has a cycle, which is a fatal
/// configuration error.
fn max_path_cost(network: &Network, start: NodeId) -> NetworkResult<Real> {
    struct Frame {
        node: NodeId,
        preds: Vec<NodeId>,
        next: usize,
    }

    let cost_of = |id: NodeId| -> Real {
        network.node(id).map(|n| n.cost).unwrap_or(0.0)
    };

    let mut on_path: HashSet<NodeId> = HashSet::new();
    let mut path_cost = cost_of(start);
    let mut best = path_cost;
    on_path.insert(start);
    let mut stack = vec![Frame {
        node: start,
        preds: network.predecessors(start),
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        if frame.next < frame.preds.len() {
            let pred = frame.preds[frame.next];
            frame.next += 1;
            if on_path.contains(&pred) {
                let key = network
                    .node(pred)
                    .map(|n| n.key.clone())
                    .unwrap_or_else(|| format!("#{pred}"));
                return Err(NetworkError::CycleDetected { at: key });
            }
            on_path.insert(pred);
            path_cost += cost_of(pred);
            best = best.max(path_cost);
            stack.push(Frame {
                node: pred,
                preds: network.predecessors(pred),
                next: 0,
            });
        } else {
            let done = stack.pop().map(|f| f.node);
            if let Some(node) = done {
                on_path.remove(&node);
                path_cost -= cost_of(node);
            }
        }
    }

    Ok(best)
}

/// Derive and apply corrected costs for every sink category, then mirror each
/// return pair's cost and flow bound from the output half onto the input half.
pub fn assign_costs(network: &mut Network) -> NetworkResult<CostReport> {
    if network.costs_assigned() {
        return Err(NetworkError::CostsAlreadyAssigned);
    }

    let mut categories = Vec::with_capacity(SinkCategory::ALL.len());
    for category in SinkCategory::ALL {
        let members: Vec<NodeId> = network
            .iter()
            .filter(|n| category.matches(n.kind))
            .map(|n| n.id)
            .collect();
        if members.is_empty() {
            categories.push(CategoryCost {
                category,
                members: 0,
                max_path_cost: None,
                assigned_cost: None,
            });
            continue;
        }

        let mut m = Real::NEG_INFINITY;
        for &member in &members {
            m = m.max(max_path_cost(network, member)?);
        }
        let assigned = corrected_cost(m, category);
        if let Some(cost) = assigned {
            for &member in &members {
                if let Some(node) = network.node_mut(member) {
                    node.cost = cost;
                }
            }
        }
        tracing::debug!(
            ?category,
            members = members.len(),
            max_path_cost = m,
            ?assigned,
            "category cost derived"
        );
        categories.push(CategoryCost {
            category,
            members: members.len(),
            max_path_cost: Some(m),
            assigned_cost: assigned,
        });
    }

    mirror_return_pairs(network);
    network.mark_costs_assigned()?;

    Ok(CostReport { categories })
}

/// The output half is optimization-driven; the input half mirrors its cost
/// and flow bound so downstream consumers see one consistent return element.
fn mirror_return_pairs(network: &mut Network) {
    let outputs: Vec<(String, Real, crate::node::Bound)> = network
        .iter()
        .filter(|n| n.kind == NodeKind::ReturnOutput)
        .map(|n| (n.key.clone(), n.cost, n.bounds.max_flow.clone()))
        .collect();
    for (output_key, cost, max_flow) in outputs {
        let Some(input_key) = output_key.strip_suffix("_output").map(|b| format!("{b}_input"))
        else {
            continue;
        };
        if let Some(id) = network.lookup(&input_key) {
            if let Some(input) = network.node_mut(id) {
                input.cost = cost;
                input.bounds.max_flow = max_flow;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Bound, NodeKind};

    fn set_cost(net: &mut Network, key: &str, cost: Real) {
        let id = net.lookup(key).unwrap();
        net.node_mut(id).unwrap().cost = cost;
    }

    /// inflow -> pump(+3) -> junction -> demand
    fn pump_chain() -> Network {
        let mut net = Network::new();
        let src = net.add_node("1", "inflow", NodeKind::Inflow).unwrap();
        let pump = net.add_node("2", "pump", NodeKind::Pump).unwrap();
        let j = net.add_node("3", "junction", NodeKind::Junction).unwrap();
        let d = net.add_node("4", "demand", NodeKind::Demand).unwrap();
        net.connect(src, pump).unwrap();
        net.connect(pump, j).unwrap();
        net.connect(j, d).unwrap();
        net
    }

    #[test]
    fn demand_cost_undercuts_dirtiest_path() {
        let mut net = pump_chain();
        set_cost(&mut net, "2", 3.0);
        set_cost(&mut net, "4", 0.0);

        let report = assign_costs(&mut net).unwrap();
        let demand = report
            .categories
            .iter()
            .find(|c| c.category == SinkCategory::Demand)
            .unwrap();
        let m = demand.max_path_cost.unwrap();
        assert_eq!(m, 3.0);
        // (-(M) - 1) scaled by the demand separation gain
        assert_eq!(demand.assigned_cost, Some(-40.0));

        let d = net.lookup("4").unwrap();
        let cost = net.node(d).unwrap().cost;
        assert!(cost <= -m);
    }

    #[test]
    fn beneficial_demand_paths_keep_surveyed_cost() {
        let mut net = pump_chain();
        set_cost(&mut net, "2", -5.0);
        set_cost(&mut net, "4", -10.0);

        let report = assign_costs(&mut net).unwrap();
        let demand = report
            .categories
            .iter()
            .find(|c| c.category == SinkCategory::Demand)
            .unwrap();
        // Every prefix is net-beneficial, so M < 0 and the surveyed
        // demand cost stands.
        assert_eq!(demand.max_path_cost, Some(-10.0));
        assert_eq!(demand.assigned_cost, None);
        let d = net.lookup("4").unwrap();
        assert_eq!(net.node(d).unwrap().cost, -10.0);
    }

    #[test]
    fn beneficial_leak_paths_are_repelled() {
        let mut net = Network::new();
        let src = net.add_node("1", "inflow", NodeKind::Inflow).unwrap();
        let j = net.add_node("2", "junction", NodeKind::Junction).unwrap();
        let over = net.add_node("3", "final", NodeKind::Overflow).unwrap();
        net.connect(src, j).unwrap();
        net.connect(j, over).unwrap();
        net.node_mut(j).unwrap().cost = -4.0;

        let report = assign_costs(&mut net).unwrap();
        let leak = report
            .categories
            .iter()
            .find(|c| c.category == SinkCategory::Overflow)
            .unwrap();
        assert_eq!(leak.max_path_cost, Some(0.0));
        assert_eq!(leak.assigned_cost, Some(1.0));
        assert_eq!(net.node(over).unwrap().cost, 1.0);
    }

    #[test]
    fn second_run_is_rejected() {
        let mut net = pump_chain();
        assign_costs(&mut net).unwrap();
        assert!(matches!(
            assign_costs(&mut net),
            Err(NetworkError::CostsAlreadyAssigned)
        ));
    }

    #[test]
    fn cycle_is_fatal() {
        let mut net = Network::new();
        let a = net.add_node("a", "a", NodeKind::Junction).unwrap();
        let b = net.add_node("b", "b", NodeKind::Junction).unwrap();
        let d = net.add_node("d", "demand", NodeKind::Demand).unwrap();
        net.connect(a, b).unwrap();
        net.connect(b, a).unwrap();
        net.connect(b, d).unwrap();
        assert!(matches!(
            assign_costs(&mut net),
            Err(NetworkError::CycleDetected { .. })
        ));
    }

    #[test]
    fn return_halves_mirror_after_assignment() {
        let mut net = Network::new();
        let src = net.add_node("1", "inflow", NodeKind::Inflow).unwrap();
        let intake = net.add_node("2", "toma", NodeKind::Intake).unwrap();
        let demand = net.add_node("3", "uda", NodeKind::Demand).unwrap();
        let r_in = net.add_node("9_input", "retorno", NodeKind::ReturnInput).unwrap();
        let r_out = net.add_node("9_output", "retorno", NodeKind::ReturnOutput).unwrap();
        let j = net.add_node("4", "nudo", NodeKind::Junction).unwrap();

        net.connect(src, intake).unwrap();
        let supply = net.port_with_role(intake, crate::node::PortRole::Supply).unwrap();
        net.connect_from_port(supply, demand).unwrap();
        let split = net.port_with_role(intake, crate::node::PortRole::ReturnSplit).unwrap();
        net.connect_from_port(split, r_out).unwrap();
        net.connect(r_in, j).unwrap();

        {
            let out = net.node_mut(r_out).unwrap();
            out.bounds.max_flow = Bound::Scalar(4.0);
        }

        assign_costs(&mut net).unwrap();

        let out = net.node(r_out).unwrap().clone();
        let inp = net.node(r_in).unwrap();
        assert_eq!(inp.cost, out.cost);
        assert_eq!(inp.bounds.max_flow, out.bounds.max_flow);
    }
}
