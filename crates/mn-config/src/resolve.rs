//! The config resolver: validated CLI parameters + loaded template →
//! fully-consistent configuration.
//!
//! Total: either every cross-field rule holds on the returned tree or the
//! whole resolution fails before any trial is constructed.

use tracing::debug;

use mn_types::{
    ConfigError, Dataset, DatasetSelection, EfficiencyMetric, EvalDataset, NasResult,
    SearchSpace,
};

use crate::schema::{DuplicateEliminationConfig, ExperimentConfig};
use crate::template::{fill_marker, fill_named};

/// Validated user-supplied options. Immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawParameters {
    pub search_space: SearchSpace,
    pub datasets: Vec<Dataset>,
    pub efficiency: EfficiencyMetric,
    pub epoch: u32,
    pub pop_size: u32,
    pub n_evals: u64,
    pub eval_dataset: EvalDataset,
    pub summary_writer: bool,
    pub use_archive: bool,
    pub eval_igd: bool,
}

/// Derived experiment identity: `{search_space}-{datasets}-{efficiency}_error`.
pub fn format_exp_name(
    search_space: SearchSpace,
    datasets: &DatasetSelection,
    efficiency: EfficiencyMetric,
) -> String {
    format!("{search_space}-{datasets}-{efficiency}_error")
}

/// Resolve `template` against `params`, applying the cross-field rules in
/// order. Fails fast on the epoch/budget precondition and on any template
/// defect.
pub fn resolve(
    mut cfg: ExperimentConfig,
    params: &RawParameters,
) -> NasResult<ExperimentConfig> {
    if params.datasets.is_empty() {
        return Err(ConfigError::NoDatasets.into());
    }

    // 1. Duplicate-elimination strategy: a discrete choice over exactly two
    //    named strategies.
    cfg.eliminate_duplicates = match params.search_space {
        SearchSpace::Sss => DuplicateEliminationConfig::Default,
        SearchSpace::Tss => DuplicateEliminationConfig::Structural { isomorphic: true },
    };

    // 2. Search budget fields. Population size and offspring count are
    //    synchronized, not independent.
    cfg.algorithm.pop_size = params.pop_size;
    cfg.algorithm.n_offsprings = params.pop_size;
    cfg.termination.n_max_evals = params.n_evals;
    cfg.problem.search_space = params.search_space;

    // 3. Epoch/search-space cross-validation: strictly below the budget.
    let budget = params.search_space.epoch_budget();
    if params.epoch >= budget {
        return Err(ConfigError::EpochBudgetExceeded {
            search_space: params.search_space,
            epoch: params.epoch,
            budget,
        }
        .into());
    }

    // 4. Multi-dataset naming selects the problem variant; a sole dataset is
    //    unwrapped to its scalar form.
    let selection = if params.datasets.len() > 1 {
        cfg.problem.name = fill_marker(&cfg.problem.name, "MD")?;
        DatasetSelection::Multi(params.datasets.clone())
    } else {
        cfg.problem.name = fill_marker(&cfg.problem.name, "")?;
        DatasetSelection::Single(params.datasets[0])
    };

    // 5. Experiment identity.
    let exp_name = format_exp_name(params.search_space, &selection, params.efficiency);
    cfg.exp_name = fill_marker(&cfg.exp_name, &exp_name)?;

    // 6. Problem parameter injection.
    cfg.problem.dataset = selection;
    cfg.problem.epoch = params.epoch;
    cfg.problem.efficiency = params.efficiency;

    // 7. Pareto-front reference path, always built with the budget-table
    //    epoch value, never the requested one.
    cfg.problem.pf_path = fill_named(
        &cfg.problem.pf_path,
        &[
            ("dataset", params.eval_dataset.to_string()),
            ("search_space", params.search_space.to_string()),
            ("efficiency", params.efficiency.to_string()),
            ("hp", budget.to_string()),
        ],
    )?;
    cfg.problem.pf_dict.dataset = params.eval_dataset;

    debug!(exp_name = %cfg.exp_name, problem = %cfg.problem.name, "configuration resolved");
    Ok(cfg)
}
