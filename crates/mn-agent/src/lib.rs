//! # mn-agent
//!
//! The evolutionary search agent consumed by the trial launcher: genotype
//! encodings for the two NATS-Bench search spaces, a deterministic surrogate
//! evaluator, duplicate elimination, run callbacks, a summary-metrics writer,
//! and the agent's sequential generational loop.

mod agent;
mod callback;
mod duplicates;
mod evaluate;
mod genotype;
mod writer;

pub use agent::{EvoAgent, Individual, SearchReport};
pub use callback::{
    Callback, CheckpointSaver, GenerationContext, IgdMonitor, IgdMonitorOptions,
    NonDominatedProgress, TimeLogger,
};
pub use duplicates::DuplicateEliminator;
pub use evaluate::{Evaluator, SurrogateEvaluator};
pub use genotype::{space_dims, Genotype, SpaceDims};
pub use writer::SummaryWriter;
