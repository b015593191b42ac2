//! Run callbacks: observers invoked once per generation.
//!
//! Callbacks own their state and never share it; the agent drives them in
//! list order through [`GenerationContext`] snapshots.

use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info};

use mn_config::ExperimentConfig;
use mn_types::{
    igd, non_dominated_indices, AxisBounds, NasResult, ObjectivePoint, SearchError,
};

use crate::agent::Individual;
use crate::writer::SummaryWriter;

/// Immutable view of the search state after one generation, plus the
/// trial's metrics writer when one is attached.
pub struct GenerationContext<'a> {
    pub generation: u32,
    pub evaluations: u64,
    pub population: &'a [Individual],
    pub archive: &'a [Individual],
    pub config: &'a ExperimentConfig,
    pub writer: Option<&'a mut SummaryWriter>,
}

impl GenerationContext<'_> {
    /// Record a scalar for this generation if a writer is attached.
    pub fn write_scalar(&mut self, tag: &str, value: f64) -> NasResult<()> {
        if let Some(writer) = self.writer.as_deref_mut() {
            writer.add_scalar(tag, u64::from(self.generation), value)?;
        }
        Ok(())
    }
}

/// A run observer. All hooks default to no-ops.
pub trait Callback {
    /// Stable name, used for logging and order assertions.
    fn name(&self) -> &'static str;

    fn on_start(&mut self, _config: &ExperimentConfig) -> NasResult<()> {
        Ok(())
    }

    fn on_generation(&mut self, _ctx: &mut GenerationContext<'_>) -> NasResult<()> {
        Ok(())
    }

    fn on_finish(&mut self, _ctx: &mut GenerationContext<'_>) -> NasResult<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixed observers
// ---------------------------------------------------------------------------

/// Logs the size of the population's non-dominated set each generation.
pub struct NonDominatedProgress {
    labels: [String; 2],
}

impl NonDominatedProgress {
    pub fn new(labels: [String; 2]) -> Self {
        Self { labels }
    }
}

impl Callback for NonDominatedProgress {
    fn name(&self) -> &'static str {
        "non_dominated_progress"
    }

    fn on_start(&mut self, _config: &ExperimentConfig) -> NasResult<()> {
        info!(x = %self.labels[0], y = %self.labels[1], "tracking non-dominated progress");
        Ok(())
    }

    fn on_generation(&mut self, ctx: &mut GenerationContext<'_>) -> NasResult<()> {
        let objectives: Vec<ObjectivePoint> =
            ctx.population.iter().map(|ind| ind.objectives).collect();
        let front_size = non_dominated_indices(&objectives).len();
        info!(
            generation = ctx.generation,
            evaluations = ctx.evaluations,
            front_size,
            archive = ctx.archive.len(),
            "non-dominated progress"
        );
        ctx.write_scalar("pareto/front_size", front_size as f64)?;
        Ok(())
    }

    fn on_finish(&mut self, ctx: &mut GenerationContext<'_>) -> NasResult<()> {
        info!(archive = ctx.archive.len(), "final non-dominated set");
        Ok(())
    }
}

/// Persists the elitist archive as JSON after every generation.
pub struct CheckpointSaver {
    dir: PathBuf,
}

impl CheckpointSaver {
    /// Creates the checkpoint directory up front.
    pub fn new(dir: impl Into<PathBuf>) -> NasResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn save(&self, filename: &str, archive: &[Individual]) -> NasResult<()> {
        let file = File::create(self.dir.join(filename))?;
        serde_json::to_writer_pretty(file, archive)?;
        Ok(())
    }
}

impl Callback for CheckpointSaver {
    fn name(&self) -> &'static str {
        "checkpoint_saver"
    }

    fn on_generation(&mut self, ctx: &mut GenerationContext<'_>) -> NasResult<()> {
        self.save("latest.json", ctx.archive)?;
        debug!(generation = ctx.generation, dir = %self.dir.display(), "checkpoint saved");
        Ok(())
    }

    fn on_finish(&mut self, ctx: &mut GenerationContext<'_>) -> NasResult<()> {
        self.save("final.json", ctx.archive)
    }
}

/// Logs wall time per generation and for the whole run.
pub struct TimeLogger {
    run_started: Option<Instant>,
    generation_started: Option<Instant>,
}

impl TimeLogger {
    pub fn new() -> Self {
        Self {
            run_started: None,
            generation_started: None,
        }
    }
}

impl Default for TimeLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Callback for TimeLogger {
    fn name(&self) -> &'static str {
        "time_logger"
    }

    fn on_start(&mut self, _config: &ExperimentConfig) -> NasResult<()> {
        let now = Instant::now();
        self.run_started = Some(now);
        self.generation_started = Some(now);
        Ok(())
    }

    fn on_generation(&mut self, ctx: &mut GenerationContext<'_>) -> NasResult<()> {
        if let Some(started) = self.generation_started {
            let seconds = started.elapsed().as_secs_f64();
            info!(generation = ctx.generation, seconds, "generation finished");
            ctx.write_scalar("time/generation_seconds", seconds)?;
        }
        self.generation_started = Some(Instant::now());
        Ok(())
    }

    fn on_finish(&mut self, _ctx: &mut GenerationContext<'_>) -> NasResult<()> {
        if let Some(started) = self.run_started {
            info!(seconds = started.elapsed().as_secs_f64(), "search finished");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Convergence monitor
// ---------------------------------------------------------------------------

/// Options for [`IgdMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IgdMonitorOptions {
    /// Normalize both sets by the reference front's axis bounds.
    pub normalize: bool,
    /// Measure the elitist archive instead of the population's rank-0 set.
    pub from_archive: bool,
    /// Reduce the measured set to its non-dominated subset first.
    pub convert_to_pf_space: bool,
    /// How many best generations to report at the end.
    pub topk: usize,
}

impl Default for IgdMonitorOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            from_archive: false,
            convert_to_pf_space: true,
            topk: 5,
        }
    }
}

/// Tracks inverted generational distance against the reference Pareto front
/// configured in the problem definition.
///
/// The reference file is loaded lazily on the first generation so that
/// observer assembly stays cheap; a missing file is a fatal trial error.
pub struct IgdMonitor {
    options: IgdMonitorOptions,
    pf_path: PathBuf,
    reference: Option<Vec<ObjectivePoint>>,
    history: Vec<(u32, f64)>,
}

impl IgdMonitor {
    pub fn new(options: IgdMonitorOptions) -> Self {
        Self {
            options,
            pf_path: PathBuf::new(),
            reference: None,
            history: Vec::new(),
        }
    }

    fn reference(&mut self) -> NasResult<&[ObjectivePoint]> {
        if self.reference.is_none() {
            let raw = std::fs::read_to_string(&self.pf_path).map_err(|_| {
                SearchError::ReferenceFrontUnavailable {
                    path: self.pf_path.clone(),
                }
            })?;
            let front: Vec<ObjectivePoint> = serde_json::from_str(&raw)?;
            debug!(points = front.len(), path = %self.pf_path.display(), "reference front loaded");
            self.reference = Some(front);
        }
        Ok(self.reference.as_deref().unwrap_or_default())
    }
}

impl Callback for IgdMonitor {
    fn name(&self) -> &'static str {
        "igd_monitor"
    }

    fn on_start(&mut self, config: &ExperimentConfig) -> NasResult<()> {
        self.pf_path = PathBuf::from(&config.problem.pf_path);
        Ok(())
    }

    fn on_generation(&mut self, ctx: &mut GenerationContext<'_>) -> NasResult<()> {
        let source = if self.options.from_archive {
            ctx.archive
        } else {
            ctx.population
        };
        let mut obtained: Vec<ObjectivePoint> =
            source.iter().map(|ind| ind.objectives).collect();
        if self.options.convert_to_pf_space {
            let front = non_dominated_indices(&obtained);
            obtained = front.into_iter().map(|i| obtained[i]).collect();
        }

        let options = self.options;
        let reference = self.reference()?.to_vec();
        let value = if options.normalize {
            let bounds = AxisBounds::of(&reference);
            let reference: Vec<ObjectivePoint> =
                reference.iter().map(|p| bounds.normalize(p)).collect();
            let obtained: Vec<ObjectivePoint> =
                obtained.iter().map(|p| bounds.normalize(p)).collect();
            igd(&reference, &obtained)
        } else {
            igd(&reference, &obtained)
        };

        self.history.push((ctx.generation, value));
        info!(generation = ctx.generation, igd = value, "convergence");
        ctx.write_scalar("igd", value)?;
        Ok(())
    }

    fn on_finish(&mut self, _ctx: &mut GenerationContext<'_>) -> NasResult<()> {
        let mut best = self.history.clone();
        best.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        best.truncate(self.options.topk);
        for (generation, value) in best {
            info!(generation, igd = value, "best-igd generation");
        }
        Ok(())
    }
}
