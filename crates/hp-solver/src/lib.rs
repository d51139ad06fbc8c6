//! hp-solver: the allocation-engine seam and a reference implementation.
//!
//! The pipeline hands a finished network (bounds resolved per timestep,
//! sink costs assigned) to a [`FlowSolver`] and consumes per-timestep flow
//! and storage series back. Production deployments plug an LP-backed engine
//! in here; [`PathSolver`] is a self-contained successive-shortest-path
//! min-cost-flow solver good enough for demonstration runs and tests.

pub mod error;
pub mod mincost;

pub use error::{SolverError, SolverResult};
pub use mincost::PathSolver;

use std::collections::HashMap;

use hp_core::{Real, Schedule};
use hp_network::Network;
use hp_profiles::ProfileStore;

/// Per-timestep series produced by a solver run.
#[derive(Debug, Clone, Default)]
pub struct SolverOutput {
    /// Node registry key -> flow per timestep.
    pub flows: HashMap<String, Vec<Real>>,
    /// Reservoir registry key -> end-of-step volume per timestep.
    pub volumes: HashMap<String, Vec<Real>>,
}

impl SolverOutput {
    pub fn flow(&self, key: &str) -> Option<&[Real]> {
        self.flows.get(key).map(|v| v.as_slice())
    }

    pub fn volume(&self, key: &str) -> Option<&[Real]> {
        self.volumes.get(key).map(|v| v.as_slice())
    }
}

/// The external allocation engine contract.
pub trait FlowSolver {
    fn solve(
        &self,
        network: &Network,
        profiles: &ProfileStore,
        schedule: &Schedule,
    ) -> SolverResult<SolverOutput>;
}
