//! Typed configuration tree mirroring the experiment's configurable
//! subsystems.
//!
//! The tree is deserialized from the YAML authoring template, mutated by the
//! resolver, then handed to the agent factory. `Clone` is the deep copy taken
//! before each trial so no state aliases across seeds.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use mn_types::{
    DatasetSelection, EfficiencyMetric, EvalDataset, NasResult, SearchSpace,
};

/// Top-level experiment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Experiment name; a `{}` template until the resolver substitutes the
    /// derived experiment identity.
    pub exp_name: String,

    /// Trial seed, assigned by the loader.
    #[serde(default)]
    pub seed: u64,

    pub algorithm: AlgorithmConfig,
    pub problem: ProblemConfig,
    pub termination: TerminationConfig,
    pub eliminate_duplicates: DuplicateEliminationConfig,
    pub output: OutputConfig,
}

impl ExperimentConfig {
    pub fn from_yaml_str(raw: &str) -> NasResult<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_path(path: &Path) -> NasResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }
}

/// Evolutionary algorithm settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmConfig {
    pub name: String,
    pub pop_size: u32,
    pub n_offsprings: u32,
    pub crossover_prob: f64,
    pub mutation_prob: f64,
}

/// NAS problem definition handed to the search agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemConfig {
    /// Problem implementation name; carries a `{}` marker slot until the
    /// resolver fills in the multi-dataset variant identifier (or nothing).
    pub name: String,

    pub search_space: SearchSpace,
    pub dataset: DatasetSelection,
    pub epoch: u32,
    pub efficiency: EfficiencyMetric,

    /// Reference Pareto-front path; `{key}` placeholders until resolved.
    pub pf_path: String,

    pub pf_dict: PfReference,
}

/// Secondary reference-front lookup fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PfReference {
    pub dataset: EvalDataset,
}

/// Search termination settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationConfig {
    pub n_max_evals: u64,
}

/// Duplicate-elimination strategy, a closed two-member choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum DuplicateEliminationConfig {
    /// Raw-encoding equality, no extra parameters.
    Default,
    /// Search-space-aware structural comparison.
    Structural { isomorphic: bool },
}

/// Output locations. `root` comes from the template; the per-seed
/// directories are derived by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub root: PathBuf,

    #[serde(default)]
    pub exp_dir: PathBuf,
    #[serde(default)]
    pub summary_dir: PathBuf,
    #[serde(default)]
    pub checkpoint_dir: PathBuf,
}
