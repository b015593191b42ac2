//! Command-line entry point for launching moenas trials.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mn_config::RawParameters;
use mn_search::launch::{run_batch, BatchOutcome, LaunchMode};
use mn_search::setup::{run_trial, TrialEntry};
use mn_types::{Dataset, EfficiencyMetric, EvalDataset, SearchSpace};

#[derive(Debug, Parser)]
#[command(name = "mn-search", version, about = "Multi-objective NAS trial launcher")]
struct Cli {
    /// Search space to perform NAS in: tss or sss.
    #[arg(long)]
    search_space: SearchSpace,

    /// Dataset to optimize on; repeat the flag for multi-dataset search.
    #[arg(long = "datasets", short = 'd', required = true)]
    datasets: Vec<Dataset>,

    /// Efficiency objective optimized alongside the error rate.
    #[arg(long, default_value = "flops")]
    efficiency: EfficiencyMetric,

    /// Training epochs per candidate architecture.
    #[arg(long, default_value_t = 24)]
    epoch: u32,

    /// Population size; the offspring count follows it.
    #[arg(long, short = 'p', default_value_t = 50)]
    pop_size: u32,

    /// Evaluation budget per trial.
    #[arg(long, default_value_t = 3000)]
    n_evals: u64,

    /// Dataset of the reference Pareto front.
    #[arg(long, default_value = "ImageNet16-120")]
    eval_dataset: EvalDataset,

    /// Random seed; a negative value selects randomized batch mode.
    #[arg(long, short = 's', default_value_t = -1, allow_hyphen_values = true)]
    seed: i64,

    /// Total randomized-seed runs when no explicit seed is given.
    #[arg(long, default_value_t = 10)]
    loops_if_rand: u32,

    /// Write scalar metrics under the summary directory.
    #[arg(long)]
    summary_writer: bool,

    /// Log progress to the console.
    #[arg(long)]
    console_log: bool,

    /// Compute IGD against the reference front each generation.
    #[arg(long)]
    eval_igd: bool,

    /// Measure IGD on the elitist archive instead of the population.
    #[arg(long)]
    use_archive: bool,

    /// Experiment template path.
    #[arg(long, default_value = "config/moenas.yml")]
    config: PathBuf,
}

impl Cli {
    fn raw_parameters(&self) -> RawParameters {
        RawParameters {
            search_space: self.search_space,
            datasets: self.datasets.clone(),
            efficiency: self.efficiency,
            epoch: self.epoch,
            pop_size: self.pop_size,
            n_evals: self.n_evals,
            eval_dataset: self.eval_dataset,
            summary_writer: self.summary_writer,
            use_archive: self.use_archive,
            eval_igd: self.eval_igd,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.console_log);
    if let Err(err) = run(cli) {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn init_tracing(console_log: bool) {
    let default = if console_log { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let params = cli.raw_parameters();

    match LaunchMode::select(cli.seed, cli.loops_if_rand) {
        LaunchMode::Batch { loops } => {
            let interrupted = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&interrupted);
            ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
                .context("install interrupt handler")?;

            let outcome = run_batch(loops, &interrupted, |seed| {
                run_trial(&cli.config, seed, &params, TrialEntry::Run)?;
                Ok(())
            });
            if let BatchOutcome::Failed { index, .. } = outcome {
                tracing::warn!(index, "batch terminated at the failing trial");
            }
            Ok(())
        }
        LaunchMode::Single { seed } => {
            run_trial(&cli.config, seed, &params, TrialEntry::Solve)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_minimal_invocation() {
        let cli = Cli::parse_from([
            "mn-search",
            "--search-space",
            "tss",
            "--datasets",
            "cifar10",
        ]);
        assert_eq!(cli.search_space, SearchSpace::Tss);
        assert_eq!(cli.datasets, vec![Dataset::Cifar10]);
        assert_eq!(cli.efficiency, EfficiencyMetric::Flops);
        assert_eq!(cli.epoch, 24);
        assert_eq!(cli.pop_size, 50);
        assert_eq!(cli.n_evals, 3000);
        assert_eq!(cli.eval_dataset, EvalDataset::ImageNet16_120);
        assert_eq!(cli.seed, -1);
        assert_eq!(cli.loops_if_rand, 10);
        assert!(!cli.summary_writer);
        assert!(!cli.eval_igd);
        assert_eq!(cli.config, PathBuf::from("config/moenas.yml"));
    }

    #[test]
    fn repeated_datasets_accumulate_in_order() {
        let cli = Cli::parse_from([
            "mn-search",
            "--search-space",
            "sss",
            "-d",
            "cifar10",
            "-d",
            "cifar100",
        ]);
        assert_eq!(cli.datasets, vec![Dataset::Cifar10, Dataset::Cifar100]);
    }

    #[test]
    fn explicit_negative_seed_parses() {
        let cli = Cli::parse_from([
            "mn-search",
            "--search-space",
            "tss",
            "-d",
            "cifar10",
            "--seed",
            "-1",
        ]);
        assert_eq!(cli.seed, -1);
    }

    #[test]
    fn datasets_are_required() {
        assert!(Cli::try_parse_from(["mn-search", "--search-space", "tss"]).is_err());
    }

    #[test]
    fn unknown_tags_are_rejected() {
        assert!(Cli::try_parse_from([
            "mn-search",
            "--search-space",
            "mss",
            "-d",
            "cifar10"
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "mn-search",
            "--search-space",
            "tss",
            "-d",
            "mnist"
        ])
        .is_err());
    }
}
