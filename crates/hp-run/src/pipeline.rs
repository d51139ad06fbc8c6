//! The five-stage run pipeline.
//!
//! `BUILD -> RESOLVE_EXCEPTIONS -> ASSIGN_COSTS -> SOLVE -> EXTRACT`, in that
//! order, no stage skipped. Each run assembles a fresh network; nothing is
//! shared across invocations.

use hp_core::timing::Timer;
use hp_core::Schedule;
use hp_network::{
    assemble, assign_costs, resolve_isolated, CostReport, MatchMiss, ResolutionReport, SampledInit,
    SurveyInit,
};
use hp_results::{extract, ResultsReport};
use hp_solver::FlowSolver;
use hp_survey::{ExceptionTable, Survey};
use serde::Serialize;

use crate::config::{InitSelection, RunConfig};
use crate::error::RunResult;

/// Echo of the run inputs, for traceability of the report.
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub config: RunConfig,
    /// Entities whose physical rows could not be matched during assembly.
    pub misses: Vec<MatchMiss>,
    pub exceptions: ResolutionReport,
    pub costs: CostReport,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub manifest: RunManifest,
    pub results: ResultsReport,
}

/// Drive one full run over a validated survey.
pub fn run(
    survey: &Survey,
    exceptions: &ExceptionTable,
    config: &RunConfig,
    solver: &dyn FlowSolver,
) -> RunResult<RunReport> {
    config.validate()?;
    let schedule = Schedule::new(config.start, config.end, config.step)?;

    let assembled = {
        let span = tracing::info_span!("build");
        let _guard = span.enter();
        let timer = Timer::start("build");
        let overflow = config.overflow_label.as_deref();
        let out = match config.init {
            InitSelection::SurveyDerived => {
                let mut policy = SurveyInit::new(survey, config.step);
                assemble(survey, &mut policy, overflow)?
            }
            InitSelection::Sampled { seed } => {
                let mut policy = SampledInit::new(seed, config.step);
                assemble(survey, &mut policy, overflow)?
            }
        };
        timer.stop_and_log();
        out
    };
    let mut network = assembled.network;
    let mut profiles = assembled.profiles;

    let resolution = {
        let span = tracing::info_span!("resolve_exceptions");
        let _guard = span.enter();
        let timer = Timer::start("resolve_exceptions");
        let report = resolve_isolated(&mut network, &mut profiles, exceptions)?;
        timer.stop_and_log();
        report
    };

    let costs = {
        let span = tracing::info_span!("assign_costs");
        let _guard = span.enter();
        let timer = Timer::start("assign_costs");
        let report = assign_costs(&mut network)?;
        timer.stop_and_log();
        report
    };

    let solution = {
        let span = tracing::info_span!("solve");
        let _guard = span.enter();
        let timer = Timer::start("solve");
        let solution = solver.solve(&network, &profiles, &schedule)?;
        timer.stop_and_log();
        solution
    };

    let results = {
        let span = tracing::info_span!("extract");
        let _guard = span.enter();
        let timer = Timer::start("extract");
        let report = extract(&network, &profiles, &schedule, &solution)?;
        timer.stop_and_log();
        report
    };

    Ok(RunReport {
        manifest: RunManifest {
            config: config.clone(),
            misses: assembled.misses,
            exceptions: resolution,
            costs,
        },
        results,
    })
}
