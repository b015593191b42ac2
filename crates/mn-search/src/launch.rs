//! Launch modes and the batch trial loop.
//!
//! The mode is selected once at startup. Batch mode contains trial failures:
//! the first error ends the whole batch, later-indexed trials never start,
//! and an interrupt is honored between (not within) trials.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::error;

/// How the orchestrator drives trials, decided once from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// One deterministic trial via the agent's `solve` entry point.
    Single { seed: u64 },
    /// `loops` trials with seeds `0..loops` via the agent's `run` entry point.
    Batch { loops: u32 },
}

impl LaunchMode {
    /// An explicit non-negative seed, or a zero trial count, forces single
    /// mode; a negative seed defaults to 0 there.
    pub fn select(seed: i64, loops_if_rand: u32) -> Self {
        if seed < 0 && loops_if_rand > 0 {
            Self::Batch {
                loops: loops_if_rand,
            }
        } else {
            Self::Single {
                seed: seed.max(0) as u64,
            }
        }
    }
}

/// How a batch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed { trials: u32 },
    /// Interrupt observed between trials; the rest were skipped.
    Interrupted { completed: u32 },
    /// Trial `index` failed; trials after it never started.
    Failed { index: u32, completed: u32 },
}

/// Run `trial` for each seed in `0..loops`, strictly sequentially.
///
/// The interrupt flag is checked between trials only; a trial that has
/// started always runs to completion or error. The first error terminates
/// the batch after its full chain is logged.
pub fn run_batch<F>(loops: u32, interrupted: &AtomicBool, mut trial: F) -> BatchOutcome
where
    F: FnMut(u64) -> anyhow::Result<()>,
{
    for index in 0..loops {
        if interrupted.load(Ordering::SeqCst) {
            println!("Interrupted. You have entered CTRL+C...");
            return BatchOutcome::Interrupted { completed: index };
        }
        if let Err(err) = trial(u64::from(index)) {
            error!(trial = index, error = ?err, "trial failed, terminating batch");
            return BatchOutcome::Failed {
                index,
                completed: index,
            };
        }
    }
    BatchOutcome::Completed { trials: loops }
}
