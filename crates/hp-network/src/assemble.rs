//! Staged network assembly from survey tables.
//!
//! Node creation runs in a fixed stage order (junctions through the synthetic
//! global sink), then wiring runs in the same order once every node exists.
//! Initialization is delegated to the run's [`InitPolicy`]; a failed
//! physical-row match is a diagnostic, not an error.

use hp_profiles::ProfileStore;
use hp_survey::normalize::normalized_name;
use hp_survey::{ElementKind, Survey, TopologyRow};
use serde::Serialize;

use crate::error::{NetworkError, NetworkResult};
use crate::graph::Network;
use crate::init::{InitOutcome, InitPolicy};
use crate::node::{ConduitClass, NodeKind, PortRole};

/// Registry key of the synthetic global sink.
pub const GLOBAL_SINK_KEY: &str = "global_sink";

/// An entity whose physical-data row could not be matched.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MatchMiss {
    pub key: String,
    pub label: String,
    pub category: &'static str,
}

/// Everything assembly produces for the rest of the pipeline.
#[derive(Debug)]
pub struct AssemblyOutput {
    pub network: Network,
    pub profiles: ProfileStore,
    pub misses: Vec<MatchMiss>,
}

fn rows<'a>(
    survey: &'a Survey,
    kind: ElementKind,
) -> impl Iterator<Item = &'a TopologyRow> + 'a {
    survey.topology.iter().filter(move |r| r.kind == kind)
}

fn dest_key(row: &TopologyRow) -> NetworkResult<String> {
    row.destination
        .map(|d| d.to_string())
        .ok_or_else(|| NetworkError::Configuration {
            what: format!("element {} has no destination", row.id),
        })
}

fn origin_key(row: &TopologyRow) -> NetworkResult<String> {
    row.origin
        .map(|o| o.to_string())
        .ok_or_else(|| NetworkError::Configuration {
            what: format!("element {} has no origin", row.id),
        })
}

/// Build the typed network, its profiles, and the match diagnostics.
pub fn assemble(
    survey: &Survey,
    policy: &mut dyn InitPolicy,
    overflow_label: Option<&str>,
) -> NetworkResult<AssemblyOutput> {
    let mut network = Network::new();
    let mut profiles = ProfileStore::new();
    let mut misses = Vec::new();

    let mut init = |network: &mut Network,
                    profiles: &mut ProfileStore,
                    misses: &mut Vec<MatchMiss>,
                    id,
                    category: &'static str,
                    f: &mut dyn FnMut(
        &mut dyn InitPolicy,
        &mut crate::node::Node,
        &mut ProfileStore,
    ) -> NetworkResult<InitOutcome>|
     -> NetworkResult<()> {
        let node = network
            .node_mut(id)
            .ok_or_else(|| NetworkError::UnknownNode {
                key: format!("#{id}"),
            })?;
        if f(policy, node, profiles)? == InitOutcome::NoMatch {
            misses.push(MatchMiss {
                key: node.key.clone(),
                label: node.label.clone(),
                category,
            });
        }
        Ok(())
    };

    // Stage 1: junctions (the overflow junction becomes a sink).
    let overflow = overflow_label.map(normalized_name);
    for row in rows(survey, ElementKind::Junction) {
        let label = normalized_name(&row.name);
        let kind = if overflow == Some(label) {
            NodeKind::Overflow
        } else {
            NodeKind::Junction
        };
        network.add_node(&row.id.to_string(), label, kind)?;
    }
    if overflow.is_some() && network.overflow().is_none() {
        tracing::warn!(label = ?overflow, "no junction matched the overflow label");
    }

    // Stage 2: reservoirs.
    for row in rows(survey, ElementKind::Reservoir) {
        let id = network.add_node(&row.id.to_string(), normalized_name(&row.name), NodeKind::Reservoir)?;
        init(&mut network, &mut profiles, &mut misses, id, "reservoirs", &mut |p, n, s| {
            p.init_reservoir(n, s)
        })?;
    }

    // Stage 3: inflows.
    for row in rows(survey, ElementKind::Inflow) {
        let id = network.add_node(&row.id.to_string(), normalized_name(&row.name), NodeKind::Inflow)?;
        init(&mut network, &mut profiles, &mut misses, id, "inflows", &mut |p, n, s| {
            p.init_inflow(n, s)
        })?;
    }

    // Stage 4: demands.
    for row in rows(survey, ElementKind::Demand) {
        let id = network.add_node(&row.id.to_string(), normalized_name(&row.name), NodeKind::Demand)?;
        init(&mut network, &mut profiles, &mut misses, id, "demands", &mut |p, n, s| {
            p.init_demand(n, s)
        })?;
    }

    // Stage 5: intakes.
    for row in rows(survey, ElementKind::Intake) {
        let id = network.add_node(&row.id.to_string(), normalized_name(&row.name), NodeKind::Intake)?;
        init(&mut network, &mut profiles, &mut misses, id, "intakes", &mut |p, n, s| {
            p.init_intake(n, s)
        })?;
    }

    // Stages 6-7: conduits.
    for (kind, class) in [
        (ElementKind::ConduitA, ConduitClass::A),
        (ElementKind::ConduitB, ConduitClass::B),
    ] {
        for row in rows(survey, kind) {
            let id = network.add_node(
                &row.id.to_string(),
                normalized_name(&row.name),
                NodeKind::Conduit(class),
            )?;
            init(&mut network, &mut profiles, &mut misses, id, "conduits", &mut |p, n, s| {
                p.init_conduit(n, class, s)
            })?;
        }
    }

    // Stage 8: pumps.
    for row in rows(survey, ElementKind::Pump) {
        let id = network.add_node(&row.id.to_string(), normalized_name(&row.name), NodeKind::Pump)?;
        init(&mut network, &mut profiles, &mut misses, id, "pumps", &mut |p, n, s| {
            p.init_pump(n, s)
        })?;
    }

    // Stage 9: returns. The output half only exists when some intake routes
    // its return split to this element.
    for row in rows(survey, ElementKind::Return) {
        let referenced = survey
            .topology
            .iter()
            .any(|r| r.kind == ElementKind::Intake && r.return_id == Some(row.id));
        let label = normalized_name(&row.name);
        let input = network.add_node(&format!("{}_input", row.id), label, NodeKind::ReturnInput)?;
        init(&mut network, &mut profiles, &mut misses, input, "returns", &mut |p, n, s| {
            p.init_return_half(n, s)
        })?;
        if referenced {
            let output =
                network.add_node(&format!("{}_output", row.id), label, NodeKind::ReturnOutput)?;
            init(&mut network, &mut profiles, &mut misses, output, "returns", &mut |p, n, s| {
                p.init_return_half(n, s)
            })?;
        }
    }

    // Stage 10: aquifers.
    for row in rows(survey, ElementKind::Aquifer) {
        let id = network.add_node(&row.id.to_string(), normalized_name(&row.name), NodeKind::Aquifer)?;
        init(&mut network, &mut profiles, &mut misses, id, "aquifers", &mut |p, n, s| {
            p.init_aquifer(n, s)
        })?;
    }

    // Stage 11: synthetic global sink.
    network.add_node(GLOBAL_SINK_KEY, "global sink", NodeKind::GlobalSink)?;

    wire(&mut network, survey)?;

    tracing::info!(
        nodes = network.len(),
        edges = network.edges().len(),
        misses = misses.len(),
        "network assembled"
    );

    Ok(AssemblyOutput {
        network,
        profiles,
        misses,
    })
}

/// Wiring pass, in stage order. Every referenced node already exists.
fn wire(network: &mut Network, survey: &Survey) -> NetworkResult<()> {
    for row in rows(survey, ElementKind::Inflow) {
        network.connect_keys(&row.id.to_string(), &dest_key(row)?)?;
    }

    for row in rows(survey, ElementKind::Intake) {
        let intake = network.require(&row.id.to_string())?;
        let origin = network.require(&origin_key(row)?)?;
        network.connect(origin, intake)?;

        let supply = network.port_with_role(intake, PortRole::Supply)?;
        let dest = network.require(&dest_key(row)?)?;
        network.connect_from_port(supply, dest)?;

        let split = network.port_with_role(intake, PortRole::ReturnSplit)?;
        let return_id = row.return_id.unwrap_or(0);
        let target = if return_id == 0 {
            network.require(GLOBAL_SINK_KEY)?
        } else {
            network.require(&format!("{return_id}_output"))?
        };
        network.connect_from_port(split, target)?;
    }

    for kind in [ElementKind::ConduitA, ElementKind::ConduitB] {
        for row in rows(survey, kind) {
            let conduit = row.id.to_string();
            network.connect_keys(&origin_key(row)?, &conduit)?;
            network.connect_keys(&conduit, &dest_key(row)?)?;
        }
    }

    for row in rows(survey, ElementKind::Pump) {
        let pump = row.id.to_string();
        network.connect_keys(&origin_key(row)?, &pump)?;
        network.connect_keys(&pump, &dest_key(row)?)?;
    }

    for row in rows(survey, ElementKind::Return) {
        network.connect_keys(&format!("{}_input", row.id), &dest_key(row)?)?;
    }

    Ok(())
}
