//! # mn-config
//!
//! Experiment configuration for moenas trials: the typed configuration tree,
//! YAML template loading with a resolver-callback injection point, explicit
//! string-template substitution, and the config resolver that turns validated
//! CLI parameters into a fully-consistent configuration.

mod load;
mod resolve;
mod schema;
mod template;

pub use load::load_cfg;
pub use resolve::{format_exp_name, resolve, RawParameters};
pub use schema::{
    AlgorithmConfig, DuplicateEliminationConfig, ExperimentConfig, OutputConfig, PfReference,
    ProblemConfig, TerminationConfig,
};
pub use template::{fill_marker, fill_named};
