//! Declarative resolution of isolated nodes.
//!
//! Assembly guarantees nothing about survey quality: elements do turn up with
//! no surveyed connection at all. Each such node must be covered by a rule in
//! the run's exception table; anything left over is a fatal configuration
//! error, never silently tolerated.

use hp_profiles::ProfileStore;
use hp_survey::{ExceptionAction, ExceptionTable};
use serde::Serialize;

use crate::error::{NetworkError, NetworkResult};
use crate::graph::Network;

/// One applied remediation, with the table's rationale carried along.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolvedException {
    pub node: String,
    pub action: String,
    pub reason: String,
}

/// Diagnostics artifact of one resolution pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionReport {
    /// Keys of every isolated node detected before remediation.
    pub detected: Vec<String>,
    pub resolved: Vec<ResolvedException>,
    /// Isolated nodes with no covering rule. Non-empty means the pass failed.
    pub unresolved: Vec<String>,
}

/// Scan for degree-zero nodes and apply the exception table. Unresolved
/// isolations abort the run; the report is logged first so operators can see
/// exactly what was found.
pub fn resolve_isolated(
    network: &mut Network,
    profiles: &mut ProfileStore,
    table: &ExceptionTable,
) -> NetworkResult<ResolutionReport> {
    let mut report = ResolutionReport::default();

    let isolated = network.isolated_nodes();
    for id in isolated {
        let (key, label) = match network.node(id) {
            Some(n) => (n.key.clone(), n.label.clone()),
            None => continue,
        };
        report.detected.push(key.clone());

        match table.rule_for(&key) {
            None => report.unresolved.push(key),
            Some(rule) => {
                match &rule.action {
                    ExceptionAction::Connect { from, to } => {
                        network.connect_keys(from, to)?;
                        report.resolved.push(ResolvedException {
                            node: key,
                            action: format!("connect {from} -> {to}"),
                            reason: rule.reason.clone(),
                        });
                    }
                    ExceptionAction::Remove => {
                        network.remove_node(id)?;
                        let dropped = profiles.remove_entity(&label);
                        report.resolved.push(ResolvedException {
                            node: key,
                            action: format!("remove (dropped {dropped} profiles)"),
                            reason: rule.reason.clone(),
                        });
                    }
                }
            }
        }
    }

    if !report.unresolved.is_empty() {
        tracing::error!(
            detected = report.detected.len(),
            unresolved = ?report.unresolved,
            "isolated nodes not covered by the exception table"
        );
        return Err(NetworkError::UnresolvedIsolation {
            keys: report.unresolved,
        });
    }

    tracing::info!(
        detected = report.detected.len(),
        resolved = report.resolved.len(),
        "isolation pass complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use hp_survey::ExceptionRule;

    fn net_with_isolated_aquifer() -> Network {
        let mut net = Network::new();
        let src = net.add_node("1", "inflow", NodeKind::Inflow).unwrap();
        let d = net.add_node("2", "demand", NodeKind::Demand).unwrap();
        net.connect(src, d).unwrap();
        net.add_node("9", "acuifero", NodeKind::Aquifer).unwrap();
        net
    }

    #[test]
    fn covered_isolation_resolves() {
        let mut net = net_with_isolated_aquifer();
        let mut profiles = ProfileStore::new();
        let table = ExceptionTable {
            rules: vec![ExceptionRule {
                node: "9".to_string(),
                action: ExceptionAction::Connect {
                    from: "9".to_string(),
                    to: "2".to_string(),
                },
                reason: "field survey confirms the aquifer feeds this demand".to_string(),
            }],
        };
        let report = resolve_isolated(&mut net, &mut profiles, &table).unwrap();
        assert_eq!(report.detected, vec!["9"]);
        assert_eq!(report.resolved.len(), 1);
        assert!(net.isolated_nodes().is_empty());
    }

    #[test]
    fn remove_rule_drops_node_and_profiles() {
        let mut net = net_with_isolated_aquifer();
        let mut profiles = ProfileStore::new();
        profiles
            .insert_monthly(hp_profiles::ProfileRole::Recharge, "acuifero", Some(&[1.0; 12]))
            .unwrap();
        let table = ExceptionTable {
            rules: vec![ExceptionRule {
                node: "9".to_string(),
                action: ExceptionAction::Remove,
                reason: "decommissioned wellfield, retained in the survey by mistake".to_string(),
            }],
        };
        resolve_isolated(&mut net, &mut profiles, &table).unwrap();
        assert!(net.lookup("9").is_none());
        assert!(profiles.is_empty());
    }

    #[test]
    fn uncovered_isolation_is_fatal() {
        let mut net = net_with_isolated_aquifer();
        let mut profiles = ProfileStore::new();
        let err = resolve_isolated(&mut net, &mut profiles, &ExceptionTable::default()).unwrap_err();
        match err {
            NetworkError::UnresolvedIsolation { keys } => assert_eq!(keys, vec!["9"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn connected_network_needs_no_rules() {
        let mut net = Network::new();
        let src = net.add_node("1", "inflow", NodeKind::Inflow).unwrap();
        let d = net.add_node("2", "demand", NodeKind::Demand).unwrap();
        net.connect(src, d).unwrap();
        let mut profiles = ProfileStore::new();
        let report =
            resolve_isolated(&mut net, &mut profiles, &ExceptionTable::default()).unwrap();
        assert!(report.detected.is_empty());
    }
}
