//! Template loading with the resolver-callback injection point.
//!
//! One call per trial: the template is parsed fresh each time, so batch mode
//! never aliases configuration state between seeds.

use std::path::Path;

use tracing::debug;

use mn_types::NasResult;

use crate::resolve::RawParameters;
use crate::schema::ExperimentConfig;

/// Load the YAML template at `path`, hand it to `resolver` together with the
/// raw parameters, then stamp the trial seed and derive the per-seed output
/// directories from the resolved experiment name.
pub fn load_cfg<F>(
    path: &Path,
    seed: u64,
    params: &RawParameters,
    resolver: F,
) -> NasResult<ExperimentConfig>
where
    F: FnOnce(ExperimentConfig, &RawParameters) -> NasResult<ExperimentConfig>,
{
    let template = ExperimentConfig::from_path(path)?;
    let mut cfg = resolver(template, params)?;

    cfg.seed = seed;
    let exp_dir = cfg
        .output
        .root
        .join(&cfg.exp_name)
        .join(format!("seed_{seed}"));
    cfg.output.summary_dir = exp_dir.join("summary");
    cfg.output.checkpoint_dir = exp_dir.join("checkpoints");
    cfg.output.exp_dir = exp_dir;

    debug!(seed, exp_dir = %cfg.output.exp_dir.display(), "configuration loaded");
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve;
    use mn_types::{
        Dataset, EfficiencyMetric, EvalDataset, NasError, SearchSpace,
    };
    use std::io::Write;

    const TEMPLATE_YAML: &str = r#"
exp_name: "moenas-{}"
algorithm:
  name: nsga2
  pop_size: 50
  n_offsprings: 50
  crossover_prob: 0.9
  mutation_prob: 0.1
problem:
  name: "natsbench{}"
  search_space: tss
  dataset: cifar10
  epoch: 12
  efficiency: flops
  pf_path: "pf/{dataset}-{search_space}-{efficiency}-{hp}.json"
  pf_dict:
    dataset: ImageNet16-120
termination:
  n_max_evals: 3000
eliminate_duplicates:
  strategy: default
output:
  root: experiments
"#;

    fn params() -> RawParameters {
        RawParameters {
            search_space: SearchSpace::Tss,
            datasets: vec![Dataset::Cifar10],
            efficiency: EfficiencyMetric::Flops,
            epoch: 24,
            pop_size: 20,
            n_evals: 600,
            eval_dataset: EvalDataset::ImageNet16_120,
            summary_writer: false,
            use_archive: false,
            eval_igd: false,
        }
    }

    fn write_template(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("moenas.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(TEMPLATE_YAML.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_and_derives_seeded_output_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(&dir);

        let cfg = load_cfg(&path, 3, &params(), resolve).unwrap();
        assert_eq!(cfg.seed, 3);
        assert_eq!(cfg.exp_name, "moenas-tss-cifar10-flops_error");
        assert_eq!(
            cfg.output.exp_dir,
            std::path::Path::new("experiments/moenas-tss-cifar10-flops_error/seed_3")
        );
        assert_eq!(
            cfg.output.summary_dir,
            cfg.output.exp_dir.join("summary")
        );
        assert_eq!(
            cfg.output.checkpoint_dir,
            cfg.output.exp_dir.join("checkpoints")
        );
    }

    #[test]
    fn distinct_seeds_get_distinct_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(&dir);

        let a = load_cfg(&path, 0, &params(), resolve).unwrap();
        let b = load_cfg(&path, 1, &params(), resolve).unwrap();
        assert_ne!(a.output.exp_dir, b.output.exp_dir);
        assert_eq!(a.exp_name, b.exp_name); // identity ignores the seed
    }

    #[test]
    fn resolver_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(&dir);

        let mut p = params();
        p.epoch = SearchSpace::Tss.epoch_budget(); // precondition violation
        let err = load_cfg(&path, 0, &p, resolve).unwrap_err();
        assert!(matches!(err, NasError::Config(_)));
    }

    #[test]
    fn missing_template_file_is_an_io_error() {
        let err = load_cfg(Path::new("does/not/exist.yml"), 0, &params(), resolve).unwrap_err();
        assert!(matches!(err, NasError::Io(_)));
    }
}
