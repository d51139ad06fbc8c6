//! Survey validation logic.

use std::collections::HashSet;

use hp_core::{nearly_equal, Tolerances};

use crate::schema::{ElementKind, Survey, TopologyRow};

const MONTHS: usize = 12;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: u32, context: String },

    #[error("Duplicate name: {name} in {context}")]
    DuplicateName { name: String, context: String },

    #[error("Missing field: {field} on {context}")]
    MissingField { field: String, context: String },

    #[error("Monthly series {field} on {name} has {got} values (expected {expected})")]
    BadSeriesLength {
        field: String,
        name: String,
        got: usize,
        expected: usize,
    },

    #[error("Invalid value: {field} = {value} on {name} ({reason})")]
    InvalidValue {
        field: String,
        value: f64,
        name: String,
        reason: String,
    },
}

pub fn validate_survey(survey: &Survey) -> Result<(), ValidationError> {
    let mut ids = HashSet::new();
    for row in &survey.topology {
        if !ids.insert(row.id) {
            return Err(ValidationError::DuplicateId {
                id: row.id,
                context: "topology".to_string(),
            });
        }
        validate_wiring(row)?;
    }

    check_names(survey.reservoirs.iter().map(|r| r.name.as_str()), "reservoirs")?;
    check_names(survey.inflows.iter().map(|r| r.name.as_str()), "inflows")?;
    check_names(survey.demands.iter().map(|r| r.name.as_str()), "demands")?;
    check_names(survey.intakes.iter().map(|r| r.name.as_str()), "intakes")?;
    check_names(survey.pumps.iter().map(|r| r.name.as_str()), "pumps")?;
    check_names(survey.returns.iter().map(|r| r.name.as_str()), "returns")?;
    check_names(survey.aquifers.iter().map(|r| r.name.as_str()), "aquifers")?;

    for row in &survey.reservoirs {
        check_series("min_volume", &row.name, &row.min_volume)?;
        check_series("max_volume", &row.name, &row.max_volume)?;
        if let Some(s) = &row.objective_volume {
            check_series("objective_volume", &row.name, s)?;
        }
        if let Some(s) = &row.evaporation {
            check_series("evaporation", &row.name, s)?;
        }
    }
    for row in &survey.inflows {
        check_series("contribution", &row.name, &row.contribution)?;
    }
    for row in &survey.demands {
        check_series("demand", &row.name, &row.demand)?;
    }
    for row in &survey.returns {
        check_series("max_flow", &row.name, &row.max_flow)?;
    }
    for row in &survey.aquifers {
        if let Some(s) = &row.recharge {
            check_series("recharge", &row.name, s)?;
        }
    }
    for row in survey.conduits_a.iter().chain(&survey.conduits_b) {
        check_series("max_flow", &row.name, &row.max_flow)?;
        if let Some(s) = &row.min_flow {
            check_series("min_flow", &row.name, s)?;
        }
        if !(0.0..1.0).contains(&row.loss) {
            return Err(ValidationError::InvalidValue {
                field: "loss".to_string(),
                value: row.loss,
                name: row.name.clone(),
                reason: "loss factor must lie in [0, 1)".to_string(),
            });
        }
    }
    for row in &survey.intakes {
        let sum = row.supply_factor + row.return_factor;
        if !nearly_equal(sum, 1.0, Tolerances::default()) {
            return Err(ValidationError::InvalidValue {
                field: "supply_factor + return_factor".to_string(),
                value: sum,
                name: row.name.clone(),
                reason: "split factors must sum to 1.0".to_string(),
            });
        }
    }

    Ok(())
}

fn validate_wiring(row: &TopologyRow) -> Result<(), ValidationError> {
    let need = |field: &str, present: bool| {
        if present {
            Ok(())
        } else {
            Err(ValidationError::MissingField {
                field: field.to_string(),
                context: format!("{:?} {} ({})", row.kind, row.id, row.name),
            })
        }
    };
    match row.kind {
        // Demands are sinks: upstream elements name them as destination.
        ElementKind::Junction
        | ElementKind::Reservoir
        | ElementKind::Aquifer
        | ElementKind::Demand => Ok(()),
        ElementKind::Inflow | ElementKind::Return => need("destination", row.destination.is_some()),
        ElementKind::ConduitA | ElementKind::ConduitB | ElementKind::Pump => {
            need("origin", row.origin.is_some())?;
            need("destination", row.destination.is_some())
        }
        ElementKind::Intake => {
            need("origin", row.origin.is_some())?;
            need("destination", row.destination.is_some())?;
            need("return_id", row.return_id.is_some())
        }
    }
}

fn check_names<'a>(
    names: impl Iterator<Item = &'a str>,
    context: &str,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for name in names {
        let normalized = crate::normalize::normalized_name(name).to_string();
        if !seen.insert(normalized.clone()) {
            return Err(ValidationError::DuplicateName {
                name: normalized,
                context: context.to_string(),
            });
        }
    }
    Ok(())
}

fn check_series(field: &str, name: &str, series: &[f64]) -> Result<(), ValidationError> {
    if series.len() != MONTHS {
        return Err(ValidationError::BadSeriesLength {
            field: field.to_string(),
            name: name.to_string(),
            got: series.len(),
            expected: MONTHS,
        });
    }
    Ok(())
}
