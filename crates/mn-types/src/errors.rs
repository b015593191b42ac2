use std::path::PathBuf;
use thiserror::Error;

use crate::tags::SearchSpace;

/// Main error type for the moenas workspace
#[derive(Error, Debug)]
pub enum NasError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Precondition and cross-field validation failures at resolution time
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "epoch {epoch} is not strictly below the {search_space} budget of {budget} epochs"
    )]
    EpochBudgetExceeded {
        search_space: SearchSpace,
        epoch: u32,
        budget: u32,
    },

    #[error("at least one dataset must be selected")]
    NoDatasets,
}

/// Configuration-authoring defects in string templates
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template {template:?} is missing the {key:?} placeholder")]
    MissingPlaceholder { template: String, key: String },

    #[error("template {template:?} has an unfilled {key:?} placeholder")]
    UnfilledPlaceholder { template: String, key: String },
}

/// Trial-time failures inside the search agent and its observers
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("reference Pareto front not available at {path}")]
    ReferenceFrontUnavailable { path: PathBuf },

    #[error("population went empty before the evaluation budget was reached")]
    EmptyPopulation,
}

/// Result type alias for moenas operations
pub type NasResult<T> = Result<T, NasError>;

/// Failure to parse a closed tag set member (CLI or YAML spelling).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} tag: {value:?}")]
pub struct TagParseError {
    kind: &'static str,
    value: String,
}

impl TagParseError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_budget_error_display() {
        let err = ConfigError::EpochBudgetExceeded {
            search_space: SearchSpace::Sss,
            epoch: 90,
            budget: 90,
        };
        let msg = err.to_string();
        assert!(msg.contains("sss"));
        assert!(msg.contains("90"));
    }

    #[test]
    fn error_conversion() {
        let template_err = TemplateError::MissingPlaceholder {
            template: "moenas".into(),
            key: "{}".into(),
        };
        let nas_err: NasError = template_err.into();
        match nas_err {
            NasError::Template(_) => (),
            _ => panic!("Expected Template error"),
        }
    }

    #[test]
    fn tag_parse_error_display() {
        let err = TagParseError::new("dataset", "mnist");
        assert!(err.to_string().contains("mnist"));
        assert!(err.to_string().contains("dataset"));
    }
}
