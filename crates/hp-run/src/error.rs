//! Pipeline-level error aggregation.

use thiserror::Error;

/// Any stage failure aborts the whole run; there is no partial-result mode.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Invalid run configuration: {what}")]
    Config { what: String },

    #[error(transparent)]
    Core(#[from] hp_core::CoreError),

    #[error(transparent)]
    Survey(#[from] hp_survey::SurveyError),

    #[error(transparent)]
    Network(#[from] hp_network::NetworkError),

    #[error(transparent)]
    Solver(#[from] hp_solver::SolverError),

    #[error(transparent)]
    Results(#[from] hp_results::ResultsError),
}

pub type RunResult<T> = Result<T, RunError>;
