//! End-to-end pipeline runs over small synthetic surveys.

use chrono::NaiveDate;
use hp_core::StepKind;
use hp_run::{run, InitSelection, RunConfig, RunError};
use hp_solver::PathSolver;
use hp_survey::{validate_survey, ExceptionTable, Survey};

fn survey(yaml: &str) -> Survey {
    let survey: Survey = serde_yaml::from_str(yaml).expect("parseable survey");
    validate_survey(&survey).expect("valid survey");
    survey
}

fn two_month_config() -> RunConfig {
    RunConfig::new(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        StepKind::Monthly,
    )
}

const SUPPLY_MEETS_DEMAND: &str = r#"
topology:
  - { kind: inflow, id: 1, name: Rio Grande, destination: 2 }
  - { kind: demand, id: 2, name: Riego Norte }
inflows:
  - { name: Rio Grande, contribution: [10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10] }
demands:
  - { name: Riego Norte, demand: [5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5] }
"#;

#[test]
fn satisfied_demand_reports_zero_deficit() {
    let report = run(
        &survey(SUPPLY_MEETS_DEMAND),
        &ExceptionTable::default(),
        &two_month_config(),
        &PathSolver::new(),
    )
    .unwrap();

    let demand = &report.results.demands[0];
    assert_eq!(demand.stats.total, 10.0);
    assert_eq!(demand.stats.deficit, 0.0);
    assert_eq!(demand.stats.deficit_pct, 0.0);
    assert_eq!(demand.stats.failure_frequency, 0.0);
    assert!(report.manifest.misses.is_empty());
    assert!(report.manifest.exceptions.detected.is_empty());
}

#[test]
fn oversized_demand_reports_half_deficit() {
    let yaml = r#"
topology:
  - { kind: inflow, id: 1, name: Rio Grande, destination: 2 }
  - { kind: demand, id: 2, name: Riego Norte }
inflows:
  - { name: Rio Grande, contribution: [10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10] }
demands:
  - { name: Riego Norte, demand: [20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20, 20] }
"#;
    let report = run(
        &survey(yaml),
        &ExceptionTable::default(),
        &two_month_config(),
        &PathSolver::new(),
    )
    .unwrap();

    let demand = &report.results.demands[0];
    assert_eq!(demand.stats.total, 20.0);
    assert_eq!(demand.stats.planned_total, 40.0);
    assert_eq!(demand.stats.deficit_pct, 50.0);
    assert_eq!(demand.stats.failure_frequency, 1.0);
}

#[test]
fn zero_planned_demand_reports_full_deficit_not_nan() {
    let yaml = r#"
topology:
  - { kind: inflow, id: 1, name: Rio Grande, destination: 2 }
  - { kind: demand, id: 2, name: Riego Norte }
inflows:
  - { name: Rio Grande, contribution: [10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10] }
demands:
  - { name: Riego Norte, demand: [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0] }
"#;
    let report = run(
        &survey(yaml),
        &ExceptionTable::default(),
        &two_month_config(),
        &PathSolver::new(),
    )
    .unwrap();

    let demand = &report.results.demands[0];
    assert_eq!(demand.stats.total, 0.0);
    assert_eq!(demand.stats.deficit_pct, 100.0);
    assert!(!demand.stats.deficit_pct.is_nan());
}

const WITH_STRAY_JUNCTION: &str = r#"
topology:
  - { kind: inflow, id: 1, name: Rio Grande, destination: 2 }
  - { kind: demand, id: 2, name: Riego Norte }
  - { kind: junction, id: 3, name: Nudo Perdido }
inflows:
  - { name: Rio Grande, contribution: [10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10] }
demands:
  - { name: Riego Norte, demand: [5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5] }
"#;

#[test]
fn uncovered_isolation_aborts_the_run() {
    let err = run(
        &survey(WITH_STRAY_JUNCTION),
        &ExceptionTable::default(),
        &two_month_config(),
        &PathSolver::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        RunError::Network(hp_network::NetworkError::UnresolvedIsolation { .. })
    ));
}

#[test]
fn covered_isolation_is_remediated_and_reported() {
    let table: ExceptionTable = serde_yaml::from_str(
        r#"
rules:
  - node: "3"
    action: { type: Remove }
    reason: decommissioned gauging junction, absent from the 2023 basin plan
"#,
    )
    .unwrap();

    let report = run(
        &survey(WITH_STRAY_JUNCTION),
        &table,
        &two_month_config(),
        &PathSolver::new(),
    )
    .unwrap();

    assert_eq!(report.manifest.exceptions.detected, vec!["3".to_string()]);
    assert_eq!(report.manifest.exceptions.resolved.len(), 1);
    assert!(report.manifest.exceptions.unresolved.is_empty());
    assert_eq!(report.results.demands[0].stats.deficit, 0.0);
}

#[test]
fn sampled_runs_are_reproducible_by_seed() {
    let mut config = two_month_config();
    config.init = InitSelection::Sampled { seed: 7 };

    let a = run(
        &survey(SUPPLY_MEETS_DEMAND),
        &ExceptionTable::default(),
        &config,
        &PathSolver::new(),
    )
    .unwrap();
    let b = run(
        &survey(SUPPLY_MEETS_DEMAND),
        &ExceptionTable::default(),
        &config,
        &PathSolver::new(),
    )
    .unwrap();

    assert_eq!(
        a.results.demands[0].stats.total,
        b.results.demands[0].stats.total
    );
    assert_eq!(
        a.results.inflows[0].stats.total,
        b.results.inflows[0].stats.total
    );
}
