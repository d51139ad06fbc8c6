//! End-to-end assembly tests over a small but representative survey.

use hp_core::StepKind;
use hp_network::{assemble, assign_costs, NodeKind, PortRole, SurveyInit};
use hp_survey::{
    DemandRow, ElementKind, InflowRow, IntakeRow, ReturnRow, Survey, TopologyRow,
};

fn row(kind: ElementKind, id: u32, name: &str) -> TopologyRow {
    TopologyRow {
        kind,
        id,
        name: name.to_string(),
        origin: None,
        destination: None,
        return_id: None,
        demand_type: None,
        platform: None,
    }
}

/// inflow(10) -> junction -> intake -> demand, intake return split to a
/// return element whose input feeds the overflow junction.
fn sample_survey() -> Survey {
    let mut inflow = row(ElementKind::Inflow, 1, "aporte");
    inflow.destination = Some(2);
    let junction = row(ElementKind::Junction, 2, "nudo medio");
    let overflow = row(ElementKind::Junction, 6, "final");
    let mut intake = row(ElementKind::Intake, 3, "toma");
    intake.origin = Some(2);
    intake.destination = Some(4);
    intake.return_id = Some(5);
    let demand = row(ElementKind::Demand, 4, "uda");
    let mut ret = row(ElementKind::Return, 5, "retorno");
    ret.destination = Some(6);

    Survey {
        topology: vec![inflow, junction, overflow, intake, demand, ret],
        inflows: vec![InflowRow {
            name: "aporte".to_string(),
            contribution: vec![10.0; 12],
        }],
        demands: vec![DemandRow {
            name: "uda".to_string(),
            demand: vec![5.0; 12],
            priority: 1.0,
            guarantee: None,
        }],
        intakes: vec![IntakeRow {
            name: "toma".to_string(),
            supply_factor: 0.8,
            return_factor: 0.2,
        }],
        returns: vec![ReturnRow {
            name: "retorno".to_string(),
            max_flow: vec![2.0; 12],
        }],
        ..Default::default()
    }
}

#[test]
fn assembles_and_wires_every_stage() {
    let survey = sample_survey();
    let mut policy = SurveyInit::new(&survey, StepKind::Monthly);
    let out = assemble(&survey, &mut policy, Some("final")).unwrap();
    let net = &out.network;

    // junctions, inflow, demand, intake, two return halves, global sink
    assert_eq!(net.len(), 8);
    assert!(out.misses.is_empty());

    let overflow = net.overflow().expect("overflow designated");
    assert_eq!(net.node(overflow).unwrap().kind, NodeKind::Overflow);

    // inflow -> junction -> intake
    let intake = net.lookup("3").unwrap();
    let junction = net.lookup("2").unwrap();
    assert_eq!(net.predecessors(intake), vec![junction]);

    // intake supply branch -> demand, return branch -> output half
    let demand = net.lookup("4").unwrap();
    let r_out = net.lookup("5_output").unwrap();
    let succs = net.successors(intake);
    assert!(succs.contains(&demand));
    assert!(succs.contains(&r_out));

    // return input half feeds the overflow junction
    let r_in = net.lookup("5_input").unwrap();
    assert_eq!(net.successors(r_in), vec![overflow]);

    // split factors surveyed onto the intake
    let split = net.node(intake).unwrap().split.unwrap();
    assert!((split.supply_share + split.return_share - 1.0).abs() < 1e-12);

    // demand bound resolves through the profile store
    let d = net.node(demand).unwrap();
    match &d.bounds.max_flow {
        hp_network::Bound::Profile(name) => {
            assert_eq!(out.profiles.get(name).unwrap().value(0), Some(5.0));
        }
        other => panic!("expected profile bound, got {other:?}"),
    }

    // nothing isolated in a fully-wired survey
    assert!(net.isolated_nodes().is_empty());
}

#[test]
fn unmatched_rows_become_diagnostics_not_errors() {
    let mut survey = sample_survey();
    survey.demands.clear();
    let mut policy = SurveyInit::new(&survey, StepKind::Monthly);
    let out = assemble(&survey, &mut policy, None).unwrap();
    assert_eq!(out.misses.len(), 1);
    assert_eq!(out.misses[0].category, "demands");

    let demand = out.network.lookup("4").unwrap();
    assert!(!out.network.node(demand).unwrap().bounds.max_flow.is_set());
}

#[test]
fn return_output_only_exists_when_referenced() {
    let mut survey = sample_survey();
    // Point the intake's return split at the global sink instead.
    for r in &mut survey.topology {
        if r.kind == ElementKind::Intake {
            r.return_id = Some(0);
        }
    }
    let mut policy = SurveyInit::new(&survey, StepKind::Monthly);
    let out = assemble(&survey, &mut policy, None).unwrap();
    assert!(out.network.lookup("5_output").is_none());
    assert!(out.network.lookup("5_input").is_some());

    let intake = out.network.lookup("3").unwrap();
    let sink = out.network.global_sink().unwrap();
    assert!(out.network.successors(intake).contains(&sink));
}

#[test]
fn costs_assign_over_assembled_network() {
    let survey = sample_survey();
    let mut policy = SurveyInit::new(&survey, StepKind::Monthly);
    let mut out = assemble(&survey, &mut policy, Some("final")).unwrap();

    let report = assign_costs(&mut out.network).unwrap();
    let demand_cat = report
        .categories
        .iter()
        .find(|c| matches!(c.category, hp_network::SinkCategory::Demand))
        .unwrap();
    assert_eq!(demand_cat.members, 1);
    // Every path into the demand is already beneficial, so its cost stands.
    assert_eq!(demand_cat.max_path_cost, Some(-1.0));
    assert_eq!(demand_cat.assigned_cost, None);

    // The overflow junction gets repelled above zero benefit.
    let overflow = out.network.overflow().unwrap();
    assert_eq!(out.network.node(overflow).unwrap().cost, 1.0);

    // Return halves mirror the corrected output cost.
    let r_out = out.network.lookup("5_output").unwrap();
    let r_in = out.network.lookup("5_input").unwrap();
    assert_eq!(out.network.node(r_out).unwrap().cost, -1.0);
    assert_eq!(
        out.network.node(r_in).unwrap().cost,
        out.network.node(r_out).unwrap().cost
    );

    // intake supply port is where the demand edge leaves
    let intake = out.network.lookup("3").unwrap();
    out.network.port_with_role(intake, PortRole::Supply).unwrap();
}
