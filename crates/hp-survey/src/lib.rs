//! hp-survey: typed hydrological survey tables and the exception table.
//!
//! This is the input side of the pipeline: a topology table, one physical-data
//! table per entity category, and the declarative remediation table for
//! isolated nodes. Loaders are format-thin (YAML/JSON via serde); everything
//! downstream works on the typed rows.

pub mod normalize;
pub mod schema;
pub mod validate;

pub use normalize::normalized_name;
pub use schema::*;
pub use validate::{validate_survey, ValidationError};

pub type SurveyResult<T> = Result<T, SurveyError>;

#[derive(thiserror::Error, Debug)]
pub enum SurveyError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> SurveyResult<Survey> {
    let content = std::fs::read_to_string(path)?;
    let survey: Survey = serde_yaml::from_str(&content)?;
    validate_survey(&survey)?;
    Ok(survey)
}

pub fn load_json(path: &std::path::Path) -> SurveyResult<Survey> {
    let content = std::fs::read_to_string(path)?;
    let survey: Survey = serde_json::from_str(&content)?;
    validate_survey(&survey)?;
    Ok(survey)
}

pub fn load_exceptions_yaml(path: &std::path::Path) -> SurveyResult<ExceptionTable> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}
