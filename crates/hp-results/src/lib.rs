//! hp-results: result extraction and report types.
//!
//! Turns a solver's per-timestep series into per-category tables with
//! mean/total/deficit statistics, plus category and input/output grand
//! totals. Arithmetic guards (zero planned bounds, unset bounds yielding
//! infinite planned totals) are handled by substitution here, never by
//! propagating an error.

pub mod extract;
pub mod types;

pub use extract::extract;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("Solver output has no series for node {key}")]
    MissingSeries { key: String },

    #[error("Planned bound references missing profile {name}")]
    MissingProfile { name: String },
}
