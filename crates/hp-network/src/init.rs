//! Per-type initialization policies.
//!
//! The assembler creates nodes; a policy fills in bounds, costs and split
//! factors. `SurveyInit` is the production path (matched physical rows);
//! `SampledInit` draws from small fixed candidate sets for demonstration and
//! test runs. Both sit behind [`InitPolicy`] so assembly is policy-agnostic.

use hp_core::{Real, StepKind};
use hp_profiles::{Granularity, ProfileRole, ProfileStore};
use hp_survey::normalize::find_by_name;
use hp_survey::Survey;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::NetworkResult;
use crate::node::{Bound, ConduitClass, Node, SplitFactors};

/// Scalar monthly capacities are divided by this on daily runs.
const DAILY_CAPACITY_DIVISOR: Real = 30.0;

/// Whether the policy found data for the entity. `NoMatch` is non-fatal:
/// the node proceeds with unset bounds and the assembler records a
/// diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Ready,
    NoMatch,
}

/// Per-type initializer. One call per node, in assembly stage order.
pub trait InitPolicy {
    fn init_reservoir(&mut self, node: &mut Node, profiles: &mut ProfileStore)
        -> NetworkResult<InitOutcome>;
    fn init_inflow(&mut self, node: &mut Node, profiles: &mut ProfileStore)
        -> NetworkResult<InitOutcome>;
    fn init_demand(&mut self, node: &mut Node, profiles: &mut ProfileStore)
        -> NetworkResult<InitOutcome>;
    fn init_intake(&mut self, node: &mut Node, profiles: &mut ProfileStore)
        -> NetworkResult<InitOutcome>;
    fn init_conduit(&mut self, node: &mut Node, class: ConduitClass, profiles: &mut ProfileStore)
        -> NetworkResult<InitOutcome>;
    fn init_pump(&mut self, node: &mut Node, profiles: &mut ProfileStore)
        -> NetworkResult<InitOutcome>;
    /// Called once per return half; both halves share the node label.
    fn init_return_half(&mut self, node: &mut Node, profiles: &mut ProfileStore)
        -> NetworkResult<InitOutcome>;
    fn init_aquifer(&mut self, node: &mut Node, profiles: &mut ProfileStore)
        -> NetworkResult<InitOutcome>;
}

/// Production policy: bounds from the matched physical-data row.
pub struct SurveyInit<'a> {
    survey: &'a Survey,
    step: StepKind,
}

impl<'a> SurveyInit<'a> {
    pub fn new(survey: &'a Survey, step: StepKind) -> Self {
        Self { survey, step }
    }

    /// Register a monthly series (expanding to daily on daily runs) and
    /// return the bound referencing it.
    fn series_bound(
        &self,
        profiles: &mut ProfileStore,
        role: ProfileRole,
        entity: &str,
        series: Option<&[Real]>,
    ) -> NetworkResult<Bound> {
        profiles.insert_monthly(role, entity, series)?;
        let name = match self.step {
            StepKind::Monthly => {
                hp_profiles::profile_name(role, Granularity::Monthly, entity)
            }
            StepKind::Daily => {
                profiles.expand_to_daily(role, entity)?
            }
        };
        Ok(Bound::Profile(name))
    }

    fn scalar_capacity(&self, monthly: Real) -> Real {
        match self.step {
            StepKind::Monthly => monthly,
            StepKind::Daily => monthly / DAILY_CAPACITY_DIVISOR,
        }
    }
}

fn no_match(node: &Node, category: &'static str) -> InitOutcome {
    tracing::warn!(
        key = %node.key,
        label = %node.label,
        category,
        "no physical-data row matched, leaving bounds unset"
    );
    InitOutcome::NoMatch
}

impl InitPolicy for SurveyInit<'_> {
    fn init_reservoir(
        &mut self,
        node: &mut Node,
        profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        let Some(row) = find_by_name(&self.survey.reservoirs, &node.label, |r| &r.name) else {
            return Ok(no_match(node, "reservoirs"));
        };
        node.cost = -row.priority;
        node.bounds.initial_volume = Some(row.initial_volume);
        if let Some(max_release) = row.max_release {
            node.bounds.max_flow = Bound::Scalar(self.scalar_capacity(max_release));
        }
        node.bounds.min_volume =
            self.series_bound(profiles, ProfileRole::MinVolume, &node.label, Some(&row.min_volume))?;
        node.bounds.max_volume =
            self.series_bound(profiles, ProfileRole::MaxVolume, &node.label, Some(&row.max_volume))?;
        Ok(InitOutcome::Ready)
    }

    fn init_inflow(
        &mut self,
        node: &mut Node,
        profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        let Some(row) = find_by_name(&self.survey.inflows, &node.label, |r| &r.name) else {
            return Ok(no_match(node, "inflows"));
        };
        node.bounds.max_flow =
            self.series_bound(profiles, ProfileRole::Inflow, &node.label, Some(&row.contribution))?;
        Ok(InitOutcome::Ready)
    }

    fn init_demand(
        &mut self,
        node: &mut Node,
        profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        let Some(row) = find_by_name(&self.survey.demands, &node.label, |r| &r.name) else {
            return Ok(no_match(node, "demands"));
        };
        node.bounds.max_flow =
            self.series_bound(profiles, ProfileRole::Demand, &node.label, Some(&row.demand))?;
        Ok(InitOutcome::Ready)
    }

    fn init_intake(
        &mut self,
        node: &mut Node,
        _profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        let Some(row) = find_by_name(&self.survey.intakes, &node.label, |r| &r.name) else {
            // Unmatched intakes pass everything through to the demand branch.
            node.split = Some(SplitFactors {
                supply_share: 1.0,
                return_share: 0.0,
            });
            return Ok(no_match(node, "intakes"));
        };
        node.split = Some(SplitFactors {
            supply_share: row.supply_factor,
            return_share: row.return_factor,
        });
        Ok(InitOutcome::Ready)
    }

    fn init_conduit(
        &mut self,
        node: &mut Node,
        class: ConduitClass,
        profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        let table = match class {
            ConduitClass::A => &self.survey.conduits_a,
            ConduitClass::B => &self.survey.conduits_b,
        };
        let Some(row) = find_by_name(table, &node.label, |r| &r.name) else {
            return Ok(no_match(node, "conduits"));
        };
        node.loss = Some(row.loss);
        node.bounds.max_flow =
            self.series_bound(profiles, ProfileRole::MaxFlow, &node.label, Some(&row.max_flow))?;
        if let Some(min_flow) = &row.min_flow {
            node.bounds.min_flow =
                self.series_bound(profiles, ProfileRole::MinFlow, &node.label, Some(min_flow))?;
        }
        Ok(InitOutcome::Ready)
    }

    fn init_pump(
        &mut self,
        node: &mut Node,
        _profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        let Some(row) = find_by_name(&self.survey.pumps, &node.label, |r| &r.name) else {
            return Ok(no_match(node, "pumps"));
        };
        node.bounds.max_flow = Bound::Scalar(self.scalar_capacity(row.capacity));
        node.cost = row.cost;
        Ok(InitOutcome::Ready)
    }

    fn init_return_half(
        &mut self,
        node: &mut Node,
        profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        let Some(row) = find_by_name(&self.survey.returns, &node.label, |r| &r.name) else {
            return Ok(no_match(node, "returns"));
        };
        node.bounds.max_flow =
            self.series_bound(profiles, ProfileRole::ReturnFlow, &node.label, Some(&row.max_flow))?;
        Ok(InitOutcome::Ready)
    }

    fn init_aquifer(
        &mut self,
        node: &mut Node,
        profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        let Some(row) = find_by_name(&self.survey.aquifers, &node.label, |r| &r.name) else {
            return Ok(no_match(node, "aquifers"));
        };
        // A blank recharge series is legal and becomes zeros in the store.
        node.bounds.max_flow = self.series_bound(
            profiles,
            ProfileRole::Recharge,
            &node.label,
            row.recharge.as_deref(),
        )?;
        Ok(InitOutcome::Ready)
    }
}

/// Demonstration policy: every bound drawn from a small fixed candidate set
/// with a seeded generator, so runs are reproducible.
pub struct SampledInit {
    rng: StdRng,
    step: StepKind,
}

const RESERVOIR_INITIAL_VOLUMES: [Real; 3] = [5.0, 15.0, 25.0];
const RESERVOIR_MAX_VOLUMES: [Real; 3] = [30.0, 60.0, 90.0];
const INFLOW_MAX_FLOWS: [Real; 3] = [5.0, 10.0, 20.0];
const DEMAND_MAX_FLOWS: [Real; 4] = [1.0, 2.0, 5.0, 10.0];
const DEMAND_COSTS: [Real; 5] = [-10.0, -20.0, -30.0, -40.0, -50.0];
const INTAKE_RETURN_SHARES: [Real; 3] = [0.1, 0.2, 0.3];
const CONDUIT_LOSSES: [Real; 3] = [0.0, 0.05, 0.1];
const CONDUIT_MAX_FLOWS: [Real; 2] = [10.0, 20.0];
const PUMP_CAPACITIES: [Real; 2] = [5.0, 10.0];
const PUMP_COSTS: [Real; 2] = [0.5, 1.0];
const RETURN_MAX_FLOWS: [Real; 4] = [0.0, 1.0, 2.0, 4.0];
const AQUIFER_RECHARGES: [Real; 3] = [0.0, 1.0, 2.0];

impl SampledInit {
    pub fn new(seed: u64, step: StepKind) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            step,
        }
    }

    fn pick(&mut self, candidates: &[Real]) -> Real {
        candidates[self.rng.gen_range(0..candidates.len())]
    }

    fn capacity(&mut self, candidates: &[Real]) -> Bound {
        let monthly = self.pick(candidates);
        Bound::Scalar(match self.step {
            StepKind::Monthly => monthly,
            StepKind::Daily => monthly / DAILY_CAPACITY_DIVISOR,
        })
    }
}

impl InitPolicy for SampledInit {
    fn init_reservoir(
        &mut self,
        node: &mut Node,
        _profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        node.bounds.initial_volume = Some(self.pick(&RESERVOIR_INITIAL_VOLUMES));
        node.bounds.min_volume = Bound::Scalar(0.0);
        node.bounds.max_volume = Bound::Scalar(self.pick(&RESERVOIR_MAX_VOLUMES));
        Ok(InitOutcome::Ready)
    }

    fn init_inflow(
        &mut self,
        node: &mut Node,
        _profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        node.bounds.max_flow = self.capacity(&INFLOW_MAX_FLOWS);
        Ok(InitOutcome::Ready)
    }

    fn init_demand(
        &mut self,
        node: &mut Node,
        _profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        node.bounds.max_flow = self.capacity(&DEMAND_MAX_FLOWS);
        node.cost = self.pick(&DEMAND_COSTS);
        Ok(InitOutcome::Ready)
    }

    fn init_intake(
        &mut self,
        node: &mut Node,
        _profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        let return_share = self.pick(&INTAKE_RETURN_SHARES);
        node.split = Some(SplitFactors {
            supply_share: 1.0 - return_share,
            return_share,
        });
        Ok(InitOutcome::Ready)
    }

    fn init_conduit(
        &mut self,
        node: &mut Node,
        _class: ConduitClass,
        _profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        node.loss = Some(self.pick(&CONDUIT_LOSSES));
        node.bounds.max_flow = self.capacity(&CONDUIT_MAX_FLOWS);
        Ok(InitOutcome::Ready)
    }

    fn init_pump(
        &mut self,
        node: &mut Node,
        _profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        node.bounds.max_flow = self.capacity(&PUMP_CAPACITIES);
        node.cost = self.pick(&PUMP_COSTS);
        Ok(InitOutcome::Ready)
    }

    fn init_return_half(
        &mut self,
        node: &mut Node,
        _profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        node.bounds.max_flow = self.capacity(&RETURN_MAX_FLOWS);
        Ok(InitOutcome::Ready)
    }

    fn init_aquifer(
        &mut self,
        node: &mut Node,
        _profiles: &mut ProfileStore,
    ) -> NetworkResult<InitOutcome> {
        node.bounds.max_flow = self.capacity(&AQUIFER_RECHARGES);
        Ok(InitOutcome::Ready)
    }
}
