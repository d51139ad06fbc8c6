//! hp-network: typed allocation network, assembler, exception resolver and
//! cost assignment.
//!
//! The network is rebuilt from survey tables for every run: assembly wires
//! typed nodes per category-specific rules, the exception resolver applies
//! the declarative remediation table to isolated nodes, and cost assignment
//! derives the sink costs that make the optimizer's priority ordering hold.

pub mod assemble;
pub mod cost;
pub mod error;
pub mod exceptions;
pub mod graph;
pub mod init;
pub mod node;

pub use assemble::{assemble, AssemblyOutput, MatchMiss};
pub use cost::{assign_costs, CostReport, SinkCategory, DEMAND_SEPARATION_GAIN};
pub use error::{NetworkError, NetworkResult};
pub use exceptions::{resolve_isolated, ResolutionReport, ResolvedException};
pub use graph::Network;
pub use init::{InitOutcome, InitPolicy, SampledInit, SurveyInit};
pub use node::{Bound, Bounds, ConduitClass, Node, NodeKind, Port, PortRole, SplitFactors};
