//! Error types for solver operations.

use thiserror::Error;

/// Errors surfaced by a [`crate::FlowSolver`]. All of them abort the run;
/// the horizon is deterministic, so retrying the same input cannot help.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Allocation failed to converge: {what}")]
    ConvergenceFailed { what: String },

    #[error("Profile error: {0}")]
    Profiles(#[from] hp_profiles::ProfilesError),
}

pub type SolverResult<T> = Result<T, SolverError>;
