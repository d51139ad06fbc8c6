//! Typed nodes, ports and bounds.

use hp_core::{NodeId, PortId, Real};

/// The two lossy conduit categories surveyed separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConduitClass {
    A,
    B,
}

/// Node taxonomy. Flow semantics and port layout are fixed per variant;
/// traversal never inspects names or downcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Pass-through vertex.
    Junction,
    /// The designated overflow junction, turned into a catch-all sink.
    Overflow,
    /// Storage with a bounded volume envelope.
    Reservoir,
    /// Source bounded by its contribution series.
    Inflow,
    /// Consumption sink bounded by its demand series.
    Demand,
    /// Two-way split between consumption and return.
    Intake,
    /// Lossy pass-through (gross in, net out).
    Conduit(ConduitClass),
    /// Pass-through with an operating cost.
    Pump,
    /// Source half of a return pair; asserts the returned flow upstream.
    ReturnInput,
    /// Sink half of a return pair; records the realized return flow.
    ReturnOutput,
    /// Source bounded by its recharge series.
    Aquifer,
    /// Synthetic catch-all for return splits with no return element.
    GlobalSink,
}

/// Boundary role of a port on its owning node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortRole {
    /// Predecessor-side boundary of most node kinds.
    Inflow,
    /// Successor-side boundary of most node kinds.
    Outflow,
    /// Intake branch feeding the demand destination.
    Supply,
    /// Intake branch feeding the return element (or the global sink).
    ReturnSplit,
    /// Conduit predecessor-side boundary (before losses).
    Gross,
    /// Conduit successor-side boundary (after losses).
    Net,
}

impl PortRole {
    /// Whether edges into this port count as the owner's predecessors.
    pub fn is_predecessor_side(self) -> bool {
        matches!(self, PortRole::Inflow | PortRole::Gross)
    }

    /// Whether edges out of this port count as the owner's successors.
    pub fn is_successor_side(self) -> bool {
        matches!(
            self,
            PortRole::Outflow | PortRole::Supply | PortRole::ReturnSplit | PortRole::Net
        )
    }
}

impl NodeKind {
    /// Boundary port layout, resolved once at construction time.
    pub fn port_roles(self) -> &'static [PortRole] {
        match self {
            NodeKind::Junction | NodeKind::Pump | NodeKind::Reservoir => {
                &[PortRole::Inflow, PortRole::Outflow]
            }
            NodeKind::Overflow | NodeKind::Demand | NodeKind::ReturnOutput | NodeKind::GlobalSink => {
                &[PortRole::Inflow]
            }
            NodeKind::Inflow | NodeKind::ReturnInput | NodeKind::Aquifer => &[PortRole::Outflow],
            NodeKind::Intake => &[PortRole::Inflow, PortRole::Supply, PortRole::ReturnSplit],
            NodeKind::Conduit(_) => &[PortRole::Gross, PortRole::Net],
        }
    }

    /// True for kinds that inject water into the network.
    pub fn is_source(self) -> bool {
        matches!(
            self,
            NodeKind::Inflow | NodeKind::ReturnInput | NodeKind::Aquifer
        )
    }

    /// True for kinds that terminate flow.
    pub fn is_sink(self) -> bool {
        matches!(
            self,
            NodeKind::Demand | NodeKind::Overflow | NodeKind::ReturnOutput | NodeKind::GlobalSink
        )
    }

    /// Provisional per-type cost, in force until cost assignment overwrites
    /// the sink categories.
    pub fn provisional_cost(self) -> Real {
        match self {
            NodeKind::Demand => -1.0,
            _ => 0.0,
        }
    }
}

/// A boundary connection point. Edges attach to ports, never to node
/// identities, so composite kinds traverse correctly by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port {
    pub id: PortId,
    /// Owning node (the parent resolved during traversal).
    pub owner: NodeId,
    pub role: PortRole,
}

/// A capacity bound, resolved against the profile store per timestep.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Bound {
    /// No bound surveyed; consumers treat this as unconstrained.
    #[default]
    Unset,
    Scalar(Real),
    /// Key of a profile in the store.
    Profile(String),
}

impl Bound {
    pub fn is_set(&self) -> bool {
        !matches!(self, Bound::Unset)
    }
}

/// The bound set of a node. Volume fields only apply to reservoirs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bounds {
    pub max_flow: Bound,
    pub min_flow: Bound,
    pub min_volume: Bound,
    pub max_volume: Bound,
    pub initial_volume: Option<Real>,
}

/// Intake split coefficients; must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitFactors {
    pub supply_share: Real,
    pub return_share: Real,
}

/// A typed vertex of the allocation network.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    /// Registry key: the survey element id as a string; return halves use
    /// `<id>_input` / `<id>_output`.
    pub key: String,
    /// Display name from the survey (quote-normalized).
    pub label: String,
    pub kind: NodeKind,
    /// Per-unit-flow penalty (negative attracts flow).
    pub cost: Real,
    pub bounds: Bounds,
    pub split: Option<SplitFactors>,
    pub loss: Option<Real>,
    /// Ports in `port_roles()` order.
    pub ports: Vec<PortId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_boundary() {
        let kinds = [
            NodeKind::Junction,
            NodeKind::Overflow,
            NodeKind::Reservoir,
            NodeKind::Inflow,
            NodeKind::Demand,
            NodeKind::Intake,
            NodeKind::Conduit(ConduitClass::A),
            NodeKind::Conduit(ConduitClass::B),
            NodeKind::Pump,
            NodeKind::ReturnInput,
            NodeKind::ReturnOutput,
            NodeKind::Aquifer,
            NodeKind::GlobalSink,
        ];
        for kind in kinds {
            let roles = kind.port_roles();
            assert!(!roles.is_empty());
            let has_pred = roles.iter().any(|r| r.is_predecessor_side());
            let has_succ = roles.iter().any(|r| r.is_successor_side());
            if kind.is_source() {
                assert!(has_succ && !has_pred);
            } else if kind.is_sink() {
                assert!(has_pred && !has_succ);
            } else {
                assert!(has_pred && has_succ);
            }
        }
    }

    #[test]
    fn intake_exposes_both_branches() {
        let roles = NodeKind::Intake.port_roles();
        assert!(roles.contains(&PortRole::Supply));
        assert!(roles.contains(&PortRole::ReturnSplit));
    }
}
