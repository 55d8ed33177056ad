//! Replaying recorded increment logs into a [`Metrics`] aggregator.
//!
//! A log is JSON Lines. Each non-blank line is either a stage increment,
//! `{"table": "person", "increment": {...}}`, or a single mapstream event,
//! `{"key": "demographics.csv~age~person", "counter": "input_count"}`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use tracing::{debug, info, info_span};

use cdm_metrics::{IncrementRecord, Metrics};

/// One decoded log line.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    Increment {
        table: String,
        increment: IncrementRecord,
    },
    Counter {
        key: String,
        counter: String,
    },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    table: Option<String>,
    increment: Option<serde_json::Value>,
    key: Option<String>,
    counter: Option<String>,
}

impl LogEntry {
    pub fn parse(line: &str) -> Result<Self> {
        let raw: RawEntry = serde_json::from_str(line)?;
        match raw {
            RawEntry {
                table: Some(table),
                increment: Some(increment),
                key: None,
                counter: None,
            } => Ok(Self::Increment {
                table,
                increment: IncrementRecord::from_json(increment)?,
            }),
            RawEntry {
                table: None,
                increment: None,
                key: Some(key),
                counter: Some(counter),
            } => Ok(Self::Counter { key, counter }),
            _ => bail!("expected either table+increment or key+counter"),
        }
    }

    pub fn apply(&self, metrics: &mut Metrics) -> Result<()> {
        match self {
            Self::Increment { table, increment } => metrics.ingest(table, increment)?,
            Self::Counter { key, counter } => metrics.increment(key, counter)?,
        }
        Ok(())
    }
}

/// Apply every entry from `reader`. Returns the number of entries applied.
pub fn replay_reader<R: BufRead>(metrics: &mut Metrics, reader: R, origin: &str) -> Result<usize> {
    let mut applied = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.with_context(|| format!("read {origin} line {line_number}"))?;
        if line.trim().is_empty() {
            continue;
        }
        LogEntry::parse(&line)
            .and_then(|entry| entry.apply(metrics))
            .with_context(|| format!("{origin} line {line_number}"))?;
        applied += 1;
    }
    Ok(applied)
}

/// Replay one log file into a fresh aggregator.
pub fn replay_file(path: &Path) -> Result<Metrics> {
    let span = info_span!("replay", path = %path.display());
    let _guard = span.enter();
    let start = Instant::now();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut metrics = Metrics::new();
    let entries = replay_reader(&mut metrics, BufReader::new(file), &path.display().to_string())?;
    debug!(
        entries,
        keys = metrics.len(),
        duration_ms = start.elapsed().as_millis(),
        "replayed log"
    );
    Ok(metrics)
}

/// Replay several logs, one worker per file, and combine the partial summaries.
pub fn replay_files(paths: &[PathBuf]) -> Result<Metrics> {
    let start = Instant::now();
    let partials = thread::scope(|scope| {
        let handles: Vec<_> = paths
            .iter()
            .map(|path| scope.spawn(move || replay_file(path)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(anyhow!("replay worker panicked")))
            })
            .collect::<Result<Vec<Metrics>>>()
    })?;
    let metrics = Metrics::combine(partials).context("combine partial summaries")?;
    info!(
        files = paths.len(),
        keys = metrics.len(),
        duration_ms = start.elapsed().as_millis(),
        "replay complete"
    );
    Ok(metrics)
}
