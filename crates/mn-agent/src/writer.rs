//! Summary-metrics writer.
//!
//! Scalar metrics stream into an append-only `metrics.jsonl` under the
//! experiment's summary directory, one timestamped row per value.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use mn_types::NasResult;

#[derive(Debug, Serialize)]
struct ScalarRow<'a> {
    ts: DateTime<Utc>,
    tag: &'a str,
    step: u64,
    value: f64,
}

/// Writes scalar metric rows for one trial. Owned by a single agent.
#[derive(Debug)]
pub struct SummaryWriter {
    dir: PathBuf,
    file: File,
}

impl SummaryWriter {
    /// Create the summary directory and open the metrics stream.
    pub fn new(dir: impl Into<PathBuf>) -> NasResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("metrics.jsonl"))?;
        Ok(Self { dir, file })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn add_scalar(&mut self, tag: &str, step: u64, value: f64) -> NasResult<()> {
        let row = ScalarRow {
            ts: Utc::now(),
            tag,
            step,
            value,
        };
        serde_json::to_writer(&mut self.file, &row)?;
        self.file.write_all(b"\n")?;
        Ok(())
    }
}
