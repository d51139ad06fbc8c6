//! Solver-series to report-table extraction.

use hp_core::{Real, Schedule};
use hp_network::{Bound, Network, Node, NodeKind};
use hp_profiles::ProfileStore;
use hp_solver::SolverOutput;

use crate::types::*;
use crate::{ResultsError, ResultsResult};

const FLOW_EPS: Real = 1e-9;

/// Resolve a planned bound into a per-step series. `None` means the entity
/// has no planned bound (unconstrained capacity).
fn planned_series(
    bound: &Bound,
    profiles: &ProfileStore,
    slots: &[usize],
) -> ResultsResult<Option<Vec<Real>>> {
    match bound {
        Bound::Unset => Ok(None),
        Bound::Scalar(v) => Ok(Some(vec![*v; slots.len()])),
        Bound::Profile(name) => {
            let profile = profiles
                .get(name)
                .ok_or_else(|| ResultsError::MissingProfile { name: name.clone() })?;
            slots
                .iter()
                .map(|&slot| {
                    profile
                        .value(slot)
                        .ok_or_else(|| ResultsError::MissingProfile { name: name.clone() })
                })
                .collect::<ResultsResult<Vec<_>>>()
                .map(Some)
        }
    }
}

/// Deficit percentage with the divide-by-zero substitution: a zero planned
/// bound reports 100%, never NaN.
fn deficit_pct(planned: Real, actual: Real) -> Real {
    if planned == 0.0 {
        100.0
    } else {
        (planned - actual).max(0.0) / planned * 100.0
    }
}

fn stats(actual: &[Real], planned: Option<&[Real]>) -> SeriesStats {
    let n = actual.len();
    let total: Real = actual.iter().sum();
    let mean = if n == 0 { 0.0 } else { total / n as Real };

    let raw_planned: Real = match planned {
        Some(p) => p.iter().sum(),
        None => Real::INFINITY,
    };
    // Unset bounds would make totals infinite; the actual total stands in.
    let planned_total = if raw_planned.is_finite() {
        raw_planned
    } else {
        total
    };
    let deficit = (planned_total - total).max(0.0);
    let failure_frequency = match planned {
        Some(p) if n > 0 => {
            let failures = actual
                .iter()
                .zip(p)
                .filter(|(a, p)| **a + FLOW_EPS < **p)
                .count();
            failures as Real / n as Real
        }
        _ => 0.0,
    };

    SeriesStats {
        mean,
        total,
        planned_total,
        deficit,
        deficit_pct: deficit_pct(planned_total, total),
        failure_frequency,
    }
}

fn flow_series<'a>(output: &'a SolverOutput, key: &str) -> ResultsResult<&'a [Real]> {
    output.flow(key).ok_or_else(|| ResultsError::MissingSeries {
        key: key.to_string(),
    })
}

fn record(node: &Node, flow: Vec<Real>, planned: Option<Vec<Real>>, extras: Extras) -> FlowRecord {
    FlowRecord {
        id: node.key.clone(),
        name: node.label.clone(),
        stats: stats(&flow, planned.as_deref()),
        flow,
        planned,
        extras,
    }
}

/// Inflows and aquifers report how much of their planned contribution was
/// actually taken; a zero planned step counts as fully supplied.
fn supplied_rate(actual: &[Real], planned: &[Real]) -> Vec<Real> {
    actual
        .iter()
        .zip(planned)
        .map(|(a, p)| if p.abs() < FLOW_EPS { 1.0 } else { a / p })
        .collect()
}

fn category_total(category: &str, records: &[FlowRecord]) -> CategoryTotal {
    let planned: Real = records.iter().map(|r| r.stats.planned_total).sum();
    let actual: Real = records.iter().map(|r| r.stats.total).sum();
    CategoryTotal {
        category: category.to_string(),
        planned,
        actual,
        deficit_pct: deficit_pct(planned, actual),
    }
}

/// Build the full report from a finished solve.
pub fn extract(
    network: &Network,
    profiles: &ProfileStore,
    schedule: &Schedule,
    output: &SolverOutput,
) -> ResultsResult<ResultsReport> {
    let slots = schedule.profile_indices();

    let mut reservoirs = Vec::new();
    let mut inflows = Vec::new();
    let mut demands = Vec::new();
    let mut intakes = Vec::new();
    let mut conduits = Vec::new();
    let mut pumps = Vec::new();
    let mut returns = Vec::new();
    let mut aquifers = Vec::new();
    let mut return_input_total = 0.0;
    let mut return_output_total = 0.0;

    for node in network.iter() {
        match node.kind {
            NodeKind::Junction | NodeKind::Overflow | NodeKind::GlobalSink => continue,
            NodeKind::Reservoir => {
                let flow = flow_series(output, &node.key)?.to_vec();
                let volume = output
                    .volume(&node.key)
                    .ok_or_else(|| ResultsError::MissingSeries {
                        key: node.key.clone(),
                    })?
                    .to_vec();
                reservoirs.push(record(
                    node,
                    flow,
                    None,
                    Extras {
                        volume: Some(volume),
                        initial_volume: node.bounds.initial_volume,
                        ..Default::default()
                    },
                ));
            }
            NodeKind::Inflow | NodeKind::Aquifer => {
                let flow = flow_series(output, &node.key)?.to_vec();
                let planned = planned_series(&node.bounds.max_flow, profiles, &slots)?;
                let rate = planned.as_deref().map(|p| supplied_rate(&flow, p));
                let rec = record(
                    node,
                    flow,
                    planned,
                    Extras {
                        supplied_rate: rate,
                        ..Default::default()
                    },
                );
                if node.kind == NodeKind::Inflow {
                    inflows.push(rec);
                } else {
                    aquifers.push(rec);
                }
            }
            NodeKind::Demand => {
                let flow = flow_series(output, &node.key)?.to_vec();
                let planned = planned_series(&node.bounds.max_flow, profiles, &slots)?;
                demands.push(record(node, flow, planned, Extras::default()));
            }
            NodeKind::Intake => {
                let flow = flow_series(output, &node.key)?.to_vec();
                let (supply_share, return_share) = match node.split {
                    Some(s) => (s.supply_share, s.return_share),
                    None => (1.0, 0.0),
                };
                let supply_flow = flow.iter().map(|f| f * supply_share).collect();
                let return_flow = flow.iter().map(|f| f * return_share).collect();
                intakes.push(record(
                    node,
                    flow,
                    None,
                    Extras {
                        supply_share: Some(supply_share),
                        return_share: Some(return_share),
                        supply_flow: Some(supply_flow),
                        return_flow: Some(return_flow),
                        ..Default::default()
                    },
                ));
            }
            NodeKind::Conduit(_) => {
                let flow = flow_series(output, &node.key)?.to_vec();
                let planned = planned_series(&node.bounds.max_flow, profiles, &slots)?;
                let loss = node.loss.unwrap_or(0.0);
                let net_flow = flow.iter().map(|f| f * (1.0 - loss)).collect();
                conduits.push(record(
                    node,
                    flow,
                    planned,
                    Extras {
                        loss: Some(loss),
                        net_flow: Some(net_flow),
                        ..Default::default()
                    },
                ));
            }
            NodeKind::Pump => {
                let flow = flow_series(output, &node.key)?.to_vec();
                let planned = planned_series(&node.bounds.max_flow, profiles, &slots)?;
                pumps.push(record(
                    node,
                    flow,
                    planned,
                    Extras {
                        cost: Some(node.cost),
                        ..Default::default()
                    },
                ));
            }
            NodeKind::ReturnInput | NodeKind::ReturnOutput => {
                let flow = flow_series(output, &node.key)?.to_vec();
                let planned = planned_series(&node.bounds.max_flow, profiles, &slots)?;
                let rec = record(node, flow, planned, Extras::default());
                if node.kind == NodeKind::ReturnInput {
                    return_input_total += rec.stats.total;
                } else {
                    return_output_total += rec.stats.total;
                }
                returns.push(rec);
            }
        }
    }

    let mut categories = Vec::new();
    for (name, records) in [
        ("reservoirs", &reservoirs),
        ("inflows", &inflows),
        ("demands", &demands),
        ("intakes", &intakes),
        ("conduits", &conduits),
        ("pumps", &pumps),
        ("returns", &returns),
        ("aquifers", &aquifers),
    ] {
        if !records.is_empty() {
            categories.push(category_total(name, records));
        }
    }

    let input_total = inflows.iter().map(|r| r.stats.total).sum::<Real>()
        + aquifers.iter().map(|r| r.stats.total).sum::<Real>()
        + return_input_total;
    let output_total =
        demands.iter().map(|r| r.stats.total).sum::<Real>() + return_output_total;

    tracing::info!(input_total, output_total, "report extracted");

    Ok(ResultsReport {
        timestamps: schedule.timestamps(),
        reservoirs,
        inflows,
        demands,
        intakes,
        conduits,
        pumps,
        returns,
        aquifers,
        totals: GrandTotals {
            input_total,
            output_total,
            categories,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use hp_core::StepKind;

    fn schedule(steps: u32) -> Schedule {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = start + chrono::Duration::days(i64::from(steps - 1) * 31);
        Schedule::new(start, end, StepKind::Monthly).unwrap()
    }

    #[test]
    fn satisfied_demand_has_zero_deficit() {
        let s = stats(&[5.0, 5.0], Some(&[5.0, 5.0]));
        assert_eq!(s.total, 10.0);
        assert_eq!(s.deficit, 0.0);
        assert_eq!(s.deficit_pct, 0.0);
        assert_eq!(s.failure_frequency, 0.0);
    }

    #[test]
    fn shortfall_reports_percentage_and_frequency() {
        let s = stats(&[10.0, 10.0], Some(&[20.0, 20.0]));
        assert_eq!(s.deficit, 20.0);
        assert_eq!(s.deficit_pct, 50.0);
        assert_eq!(s.failure_frequency, 1.0);
    }

    #[test]
    fn zero_planned_bound_substitutes_full_deficit() {
        let s = stats(&[0.0, 0.0], Some(&[0.0, 0.0]));
        assert!(s.deficit_pct == 100.0);
        assert!(!s.deficit_pct.is_nan());
    }

    #[test]
    fn unset_bound_substitutes_actual_for_planned() {
        let s = stats(&[3.0, 4.0], None);
        assert_eq!(s.planned_total, 7.0);
        assert_eq!(s.deficit, 0.0);
        assert_eq!(s.deficit_pct, 0.0);
    }

    #[test]
    fn report_covers_every_category_present() {
        let mut net = Network::new();
        let src = net.add_node("1", "rio", NodeKind::Inflow).unwrap();
        let tk = net.add_node("2", "toma", NodeKind::Intake).unwrap();
        let d = net.add_node("3", "uda", NodeKind::Demand).unwrap();
        net.connect(src, tk).unwrap();
        net.connect(tk, d).unwrap();
        net.node_mut(src).unwrap().bounds.max_flow = Bound::Scalar(10.0);
        net.node_mut(d).unwrap().bounds.max_flow = Bound::Scalar(5.0);
        net.node_mut(tk).unwrap().split = Some(hp_network::SplitFactors {
            supply_share: 0.8,
            return_share: 0.2,
        });

        let mut output = SolverOutput::default();
        output.flows.insert("1".into(), vec![5.0, 5.0]);
        output.flows.insert("2".into(), vec![5.0, 5.0]);
        output.flows.insert("3".into(), vec![5.0, 5.0]);

        let report = extract(&net, &ProfileStore::new(), &schedule(2), &output).unwrap();
        assert_eq!(report.demands.len(), 1);
        assert_eq!(report.demands[0].stats.total, 10.0);
        assert_eq!(report.demands[0].stats.deficit, 0.0);
        assert_eq!(report.inflows[0].extras.supplied_rate, Some(vec![0.5, 0.5]));
        assert_eq!(report.intakes[0].extras.supply_flow, Some(vec![4.0, 4.0]));
        assert_eq!(report.intakes[0].extras.return_flow, Some(vec![1.0, 1.0]));
        assert_eq!(report.totals.input_total, 10.0);
        assert_eq!(report.totals.output_total, 10.0);
        // inflows, demands, intakes
        assert_eq!(report.totals.categories.len(), 3);
    }

    #[test]
    fn missing_series_is_an_error() {
        let mut net = Network::new();
        net.add_node("1", "rio", NodeKind::Inflow).unwrap();
        let err = extract(
            &net,
            &ProfileStore::new(),
            &schedule(1),
            &SolverOutput::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ResultsError::MissingSeries { .. }));
    }
}
