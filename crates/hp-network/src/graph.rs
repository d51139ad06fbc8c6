//! The mutable allocation network.
//!
//! Unlike a frozen solver graph, this structure supports the exception
//! resolver's edits (adding edges, removing nodes) between assembly and cost
//! assignment. Edges connect ports; predecessor/successor queries resolve a
//! port back to its owning node.

use std::collections::HashMap;

use hp_core::{NodeId, PortId};

use crate::error::{NetworkError, NetworkResult};
use crate::node::{Node, NodeKind, Port, PortRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: PortId,
    pub to: PortId,
}

/// Nodes, ports, edges and the name registry for one run.
#[derive(Debug, Clone, Default)]
pub struct Network {
    /// Tombstoned on removal so ids stay stable.
    nodes: Vec<Option<Node>>,
    ports: Vec<Port>,
    edges: Vec<Edge>,
    registry: HashMap<String, NodeId>,
    overflow: Option<NodeId>,
    global_sink: Option<NodeId>,
    costs_assigned: bool,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with the port layout of its kind and the provisional
    /// per-type cost, and register it under `key`.
    pub fn add_node(&mut self, key: &str, label: &str, kind: NodeKind) -> NetworkResult<NodeId> {
        if self.registry.contains_key(key) {
            return Err(NetworkError::DuplicateNode {
                key: key.to_string(),
            });
        }
        let id = NodeId::from_index(self.nodes.len() as u32);
        let mut ports = Vec::with_capacity(kind.port_roles().len());
        for &role in kind.port_roles() {
            let pid = PortId::from_index(self.ports.len() as u32);
            self.ports.push(Port {
                id: pid,
                owner: id,
                role,
            });
            ports.push(pid);
        }
        self.nodes.push(Some(Node {
            id,
            key: key.to_string(),
            label: label.to_string(),
            kind,
            cost: kind.provisional_cost(),
            bounds: Default::default(),
            split: None,
            loss: None,
            ports,
        }));
        self.registry.insert(key.to_string(), id);
        match kind {
            NodeKind::Overflow => self.overflow = Some(id),
            NodeKind::GlobalSink => self.global_sink = Some(id),
            _ => {}
        }
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index() as usize)?.as_ref()
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index() as usize)?.as_mut()
    }

    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.registry.get(key).copied()
    }

    /// Resolve a key or fail with `UnknownNode`.
    pub fn require(&self, key: &str) -> NetworkResult<NodeId> {
        self.lookup(key).ok_or_else(|| NetworkError::UnknownNode {
            key: key.to_string(),
        })
    }

    /// All live nodes.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter_map(|n| n.as_ref())
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.index() as usize)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn overflow(&self) -> Option<NodeId> {
        self.overflow
    }

    pub fn global_sink(&self) -> Option<NodeId> {
        self.global_sink
    }

    /// The node's port with the given role.
    pub fn port_with_role(&self, node: NodeId, role: PortRole) -> NetworkResult<PortId> {
        let n = self.node(node).ok_or_else(|| NetworkError::UnknownNode {
            key: format!("#{node}"),
        })?;
        n.ports
            .iter()
            .copied()
            .find(|&p| self.ports[p.index() as usize].role == role)
            .ok_or_else(|| NetworkError::MissingPort {
                key: n.key.clone(),
                role,
            })
    }

    fn default_successor_port(&self, node: NodeId) -> NetworkResult<PortId> {
        let n = self.node(node).ok_or_else(|| NetworkError::UnknownNode {
            key: format!("#{node}"),
        })?;
        n.ports
            .iter()
            .copied()
            .find(|&p| self.ports[p.index() as usize].role.is_successor_side())
            .ok_or_else(|| NetworkError::MissingPort {
                key: n.key.clone(),
                role: PortRole::Outflow,
            })
    }

    fn default_predecessor_port(&self, node: NodeId) -> NetworkResult<PortId> {
        let n = self.node(node).ok_or_else(|| NetworkError::UnknownNode {
            key: format!("#{node}"),
        })?;
        n.ports
            .iter()
            .copied()
            .find(|&p| self.ports[p.index() as usize].role.is_predecessor_side())
            .ok_or_else(|| NetworkError::MissingPort {
                key: n.key.clone(),
                role: PortRole::Inflow,
            })
    }

    /// Connect two nodes through their default boundary ports.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> NetworkResult<()> {
        let from_port = self.default_successor_port(from)?;
        let to_port = self.default_predecessor_port(to)?;
        self.connect_ports(from_port, to_port);
        Ok(())
    }

    /// Connect from a specific successor-side port of `from` to the default
    /// predecessor port of `to`. Used for intake branch wiring.
    pub fn connect_from_port(&mut self, from_port: PortId, to: NodeId) -> NetworkResult<()> {
        let to_port = self.default_predecessor_port(to)?;
        self.connect_ports(from_port, to_port);
        Ok(())
    }

    pub fn connect_ports(&mut self, from: PortId, to: PortId) {
        self.edges.push(Edge { from, to });
    }

    /// Connect two registry keys through default boundary ports.
    pub fn connect_keys(&mut self, from: &str, to: &str) -> NetworkResult<()> {
        let from = self.require(from)?;
        let to = self.require(to)?;
        self.connect(from, to)
    }

    /// Owners of edges into any predecessor-side port of `node`.
    pub fn predecessors(&self, node: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| self.ports[e.to.index() as usize].owner == node)
            .map(|e| self.ports[e.from.index() as usize].owner)
            .collect()
    }

    /// Owners of edges out of any successor-side port of `node`.
    pub fn successors(&self, node: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| self.ports[e.from.index() as usize].owner == node)
            .map(|e| self.ports[e.to.index() as usize].owner)
            .collect()
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.edges
            .iter()
            .filter(|e| {
                self.ports[e.from.index() as usize].owner == node
                    || self.ports[e.to.index() as usize].owner == node
            })
            .count()
    }

    /// Live nodes with zero total degree. The synthetic global sink is
    /// excluded: it is legitimately unconnected in surveys without
    /// unassigned return splits.
    pub fn isolated_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|n| n.kind != NodeKind::GlobalSink)
            .filter(|n| self.degree(n.id) == 0)
            .map(|n| n.id)
            .collect()
    }

    /// Delete a node, its registry entry, and every incident edge.
    pub fn remove_node(&mut self, id: NodeId) -> NetworkResult<Node> {
        let slot = self
            .nodes
            .get_mut(id.index() as usize)
            .ok_or_else(|| NetworkError::UnknownNode {
                key: format!("#{id}"),
            })?;
        let node = slot.take().ok_or_else(|| NetworkError::UnknownNode {
            key: format!("#{id}"),
        })?;
        self.registry.remove(&node.key);
        let ports = &self.ports;
        self.edges.retain(|e| {
            ports[e.from.index() as usize].owner != id && ports[e.to.index() as usize].owner != id
        });
        if self.overflow == Some(id) {
            self.overflow = None;
        }
        if self.global_sink == Some(id) {
            self.global_sink = None;
        }
        Ok(node)
    }

    pub fn costs_assigned(&self) -> bool {
        self.costs_assigned
    }

    /// Flip the once-only cost-assignment latch.
    pub fn mark_costs_assigned(&mut self) -> NetworkResult<()> {
        if self.costs_assigned {
            return Err(NetworkError::CostsAlreadyAssigned);
        }
        self.costs_assigned = true;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}
