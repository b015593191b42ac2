//! Observer assembly and agent construction for one trial.

use std::path::Path;

use mn_agent::{
    Callback, CheckpointSaver, EvoAgent, IgdMonitor, IgdMonitorOptions, NonDominatedProgress,
    SearchReport, SummaryWriter, TimeLogger,
};
use mn_config::{load_cfg, resolve, ExperimentConfig, RawParameters};
use mn_types::NasResult;

/// Which agent entry point a trial uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialEntry {
    /// Batch execution.
    Run,
    /// Single deterministic execution.
    Solve,
}

/// Build the ordered observer list.
///
/// The three fixed observers always appear in the same order; the IGD
/// monitor, when enabled, is prepended so it observes first. Constructing
/// the checkpoint saver creates its output directory.
pub fn assemble_callbacks(
    cfg: &ExperimentConfig,
    params: &RawParameters,
) -> NasResult<Vec<Box<dyn Callback>>> {
    let mut callbacks: Vec<Box<dyn Callback>> = vec![
        Box::new(NonDominatedProgress::new([
            params.efficiency.axis_label().to_string(),
            "Error rate (%)".to_string(),
        ])),
        Box::new(CheckpointSaver::new(&cfg.output.checkpoint_dir)?),
        Box::new(TimeLogger::new()),
    ];

    if params.eval_igd {
        let monitor = IgdMonitor::new(IgdMonitorOptions {
            normalize: true,
            from_archive: params.use_archive,
            convert_to_pf_space: true,
            topk: 5,
        });
        callbacks.insert(0, Box::new(monitor));
    }

    Ok(callbacks)
}

/// A summary writer bound to the trial's summary directory, or `None` when
/// metrics writing is disabled.
pub fn make_writer(
    cfg: &ExperimentConfig,
    params: &RawParameters,
) -> NasResult<Option<SummaryWriter>> {
    if params.summary_writer {
        Ok(Some(SummaryWriter::new(&cfg.output.summary_dir)?))
    } else {
        Ok(None)
    }
}

/// Construct the search agent from a defensive copy of the resolved
/// configuration; the caller's tree is never mutated by the agent.
pub fn build_agent(
    cfg: &ExperimentConfig,
    seed: u64,
    callbacks: Vec<Box<dyn Callback>>,
    writer: Option<SummaryWriter>,
) -> NasResult<EvoAgent> {
    EvoAgent::new(cfg.clone(), seed, callbacks, writer)
}

/// One full trial: load and resolve the template, assemble observers, build
/// the agent, and drive the requested entry point.
pub fn run_trial(
    template: &Path,
    seed: u64,
    params: &RawParameters,
    entry: TrialEntry,
) -> NasResult<SearchReport> {
    let cfg = load_cfg(template, seed, params, resolve)?;
    let callbacks = assemble_callbacks(&cfg, params)?;
    let writer = make_writer(&cfg, params)?;
    let mut agent = build_agent(&cfg, seed, callbacks, writer)?;
    match entry {
        TrialEntry::Run => agent.run(),
        TrialEntry::Solve => agent.solve(),
    }
}
