//! Reference successive-shortest-path min-cost-flow solver.
//!
//! Each timestep is solved independently on an expanded arc graph: every node
//! becomes one internal arc carrying its resolved capacity and cost, sources
//! hang off a super-source, sinks feed a super-sink, and reservoirs expose a
//! release arc (bounded by volume above the floor) plus a refill arc (bounded
//! by headroom), with volume carried across steps. Flow is routed only while
//! an augmenting path with strictly negative cost exists, which is exactly
//! the attract/repel reading of node costs.
//!
//! Intake split factors and conduit losses are not enforced during routing;
//! they are applied at extraction, which is where their report columns live.

use std::collections::HashMap;

use hp_core::{NodeId, Real, Schedule};
use hp_network::{Bound, Network, Node, NodeKind};
use hp_profiles::ProfileStore;

use crate::error::{SolverError, SolverResult};
use crate::{FlowSolver, SolverOutput};

const MAX_AUGMENTATIONS: usize = 10_000;
const CAP_EPS: Real = 1e-9;
const COST_EPS: Real = 1e-12;

/// Resolve a bound at a profile slot. `None` means unconstrained.
fn bound_value(
    bound: &Bound,
    profiles: &ProfileStore,
    slot: usize,
) -> SolverResult<Option<Real>> {
    match bound {
        Bound::Unset => Ok(None),
        Bound::Scalar(v) => Ok(Some(*v)),
        Bound::Profile(name) => {
            let profile = profiles
                .get(name)
                .ok_or_else(|| SolverError::ProblemSetup {
                    what: format!("bound references missing profile {name}"),
                })?;
            profile
                .value(slot)
                .map(Some)
                .ok_or_else(|| SolverError::ProblemSetup {
                    what: format!("profile {name} has no slot {slot}"),
                })
        }
    }
}

struct Arc {
    to: usize,
    /// Remaining residual capacity.
    cap: Real,
    cost: Real,
    /// Index of the paired reverse arc in `adj[to]`.
    rev: usize,
}

struct ArcGraph {
    adj: Vec<Vec<Arc>>,
}

/// Handle to a forward arc, for reading its pushed flow afterwards.
#[derive(Clone, Copy)]
struct ArcRef {
    from: usize,
    idx: usize,
}

impl ArcGraph {
    fn new(vertices: usize) -> Self {
        Self {
            adj: (0..vertices).map(|_| Vec::new()).collect(),
        }
    }

    fn add(&mut self, from: usize, to: usize, cap: Real, cost: Real) -> ArcRef {
        let idx = self.adj[from].len();
        let rev = self.adj[to].len();
        self.adj[from].push(Arc { to, cap, cost, rev });
        self.adj[to].push(Arc {
            to: from,
            cap: 0.0,
            cost: -cost,
            rev: idx,
        });
        ArcRef { from, idx }
    }

    /// Flow pushed through a forward arc (the reverse arc's residual).
    fn flow(&self, arc: ArcRef) -> Real {
        let fwd = &self.adj[arc.from][arc.idx];
        self.adj[fwd.to][fwd.rev].cap
    }

    /// Bellman-Ford shortest path by cost over residual arcs.
    /// Returns the arc chain source -> target, or None if unreachable or the
    /// path is not net-negative.
    fn negative_path(
        &self,
        source: usize,
        target: usize,
    ) -> SolverResult<Option<Vec<ArcRef>>> {
        let n = self.adj.len();
        let mut dist = vec![Real::INFINITY; n];
        let mut prev: Vec<Option<ArcRef>> = vec![None; n];
        dist[source] = 0.0;

        for round in 0..n {
            let mut changed = false;
            for u in 0..n {
                if !dist[u].is_finite() {
                    continue;
                }
                for (idx, arc) in self.adj[u].iter().enumerate() {
                    if arc.cap <= CAP_EPS {
                        continue;
                    }
                    let cand = dist[u] + arc.cost;
                    if cand < dist[arc.to] - COST_EPS {
                        dist[arc.to] = cand;
                        prev[arc.to] = Some(ArcRef { from: u, idx });
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
            if round == n - 1 {
                return Err(SolverError::ConvergenceFailed {
                    what: "negative-cost cycle in residual graph".to_string(),
                });
            }
        }

        if !dist[target].is_finite() || dist[target] >= -COST_EPS {
            return Ok(None);
        }

        let mut chain = Vec::new();
        let mut v = target;
        while v != source {
            let arc = prev[v].ok_or_else(|| SolverError::ConvergenceFailed {
                what: "broken predecessor chain".to_string(),
            })?;
            v = arc.from;
            chain.push(arc);
        }
        chain.reverse();
        Ok(Some(chain))
    }

    fn augment(&mut self, chain: &[ArcRef]) -> SolverResult<Real> {
        let mut bottleneck = Real::INFINITY;
        for arc in chain {
            bottleneck = bottleneck.min(self.adj[arc.from][arc.idx].cap);
        }
        if !bottleneck.is_finite() {
            return Err(SolverError::ProblemSetup {
                what: "unbounded beneficial path (no finite capacity on route)".to_string(),
            });
        }
        for arc in chain {
            let (to, rev) = {
                let fwd = &mut self.adj[arc.from][arc.idx];
                fwd.cap -= bottleneck;
                (fwd.to, fwd.rev)
            };
            self.adj[to][rev].cap += bottleneck;
        }
        Ok(bottleneck)
    }
}

/// Self-contained reference allocation engine.
#[derive(Debug, Default)]
pub struct PathSolver;

impl PathSolver {
    pub fn new() -> Self {
        Self
    }
}

impl FlowSolver for PathSolver {
    fn solve(
        &self,
        network: &Network,
        profiles: &ProfileStore,
        schedule: &Schedule,
    ) -> SolverResult<SolverOutput> {
        if !network.costs_assigned() {
            return Err(SolverError::ProblemSetup {
                what: "network handed to solver before cost assignment".to_string(),
            });
        }

        let nodes: Vec<&Node> = network.iter().collect();
        let index: HashMap<NodeId, usize> =
            nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        let n = nodes.len();
        let slots = schedule.profile_indices();
        let steps = slots.len();

        let mut flows = vec![vec![0.0; steps]; n];
        let mut volume_series: HashMap<usize, Vec<Real>> = HashMap::new();
        let mut volume: HashMap<usize, Real> = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            if node.kind == NodeKind::Reservoir {
                volume.insert(i, node.bounds.initial_volume.unwrap_or(0.0));
                volume_series.insert(i, Vec::with_capacity(steps));
            }
        }

        for (t, &slot) in slots.iter().enumerate() {
            let source = 2 * n;
            let target = 2 * n + 1;
            let mut graph = ArcGraph::new(2 * n + 2);
            let mut internal = Vec::with_capacity(n);
            let mut release: HashMap<usize, ArcRef> = HashMap::new();
            let mut refill: HashMap<usize, ArcRef> = HashMap::new();

            for (i, node) in nodes.iter().enumerate() {
                let cap = bound_value(&node.bounds.max_flow, profiles, slot)?
                    .unwrap_or(Real::INFINITY);
                internal.push(graph.add(2 * i, 2 * i + 1, cap, node.cost));

                if node.kind.is_source() {
                    graph.add(source, 2 * i, Real::INFINITY, 0.0);
                }
                if node.kind.is_sink() {
                    graph.add(2 * i + 1, target, Real::INFINITY, 0.0);
                }
                if node.kind == NodeKind::Reservoir {
                    let vol = volume[&i];
                    let floor = bound_value(&node.bounds.min_volume, profiles, slot)?
                        .unwrap_or(0.0);
                    let ceil = bound_value(&node.bounds.max_volume, profiles, slot)?
                        .unwrap_or(Real::INFINITY);
                    release.insert(
                        i,
                        graph.add(source, 2 * i, (vol - floor).max(0.0), 0.0),
                    );
                    refill.insert(
                        i,
                        graph.add(2 * i, target, (ceil - vol).max(0.0), node.cost),
                    );
                }
            }

            for edge in network.edges() {
                let from_owner = network.port(edge.from).map(|p| p.owner);
                let to_owner = network.port(edge.to).map(|p| p.owner);
                if let (Some(a), Some(b)) = (from_owner, to_owner) {
                    if let (Some(&ia), Some(&ib)) = (index.get(&a), index.get(&b)) {
                        graph.add(2 * ia + 1, 2 * ib, Real::INFINITY, 0.0);
                    }
                }
            }

            let mut rounds = 0;
            while let Some(chain) = graph.negative_path(source, target)? {
                graph.augment(&chain)?;
                rounds += 1;
                if rounds > MAX_AUGMENTATIONS {
                    return Err(SolverError::ConvergenceFailed {
                        what: format!("augmentation limit reached at step {t}"),
                    });
                }
            }

            for i in 0..n {
                flows[i][t] = graph.flow(internal[i]);
            }
            for (i, node) in nodes.iter().enumerate() {
                if node.kind != NodeKind::Reservoir {
                    continue;
                }
                let released = release.get(&i).map(|&a| graph.flow(a)).unwrap_or(0.0);
                let stored = refill.get(&i).map(|&a| graph.flow(a)).unwrap_or(0.0);
                let vol = volume
                    .get_mut(&i)
                    .ok_or_else(|| SolverError::ProblemSetup {
                        what: format!("missing volume state for {}", node.key),
                    })?;
                *vol = *vol - released + stored;
                if let Some(series) = volume_series.get_mut(&i) {
                    series.push(*vol);
                }
            }
        }

        tracing::info!(nodes = n, steps, "allocation complete");

        let mut out = SolverOutput::default();
        for (i, node) in nodes.iter().enumerate() {
            out.flows.insert(node.key.clone(), std::mem::take(&mut flows[i]));
        }
        for (i, series) in volume_series {
            out.volumes.insert(nodes[i].key.clone(), series);
        }
        Ok(out)
    }
}
