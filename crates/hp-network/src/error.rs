//! Network-specific error types.

use hp_profiles::ProfilesError;
use thiserror::Error;

use crate::node::PortRole;

pub type NetworkResult<T> = Result<T, NetworkError>;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Duplicate node key: {key}")]
    DuplicateNode { key: String },

    #[error("Unknown node: {key}")]
    UnknownNode { key: String },

    #[error("Node {key} has no {role:?} port")]
    MissingPort { key: String, role: PortRole },

    #[error("Cycle detected in predecessor graph at node {at}")]
    CycleDetected { at: String },

    #[error("Cost assignment already applied to this network")]
    CostsAlreadyAssigned,

    #[error("Unresolved isolated nodes: {}", keys.join(", "))]
    UnresolvedIsolation { keys: Vec<String> },

    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error("Profile error: {0}")]
    Profiles(#[from] ProfilesError),
}
