//! Summary projections of the data summary.
//!
//! The stage summary reads four-part dotted keys and reports the validation
//! funnel of each destination field. The mapstream summary reads three-part
//! `~` keys and reports per-source-field record counts. Both render as
//! tab-separated text with a single header line.

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;
use tracing::debug;

use crate::counter::{CounterBlock, labels};
use crate::error::{MetricsError, Result};
use crate::key::{MapstreamKey, StageKey, source_prefix};
use crate::metrics::Metrics;

/// Placeholder for values the stage summary cannot compute.
pub const NOT_AVAILABLE: &str = "NA";

pub const STAGE_HEADER: [&str; 9] = [
    "source",
    "tablename",
    "name",
    "column name",
    "before",
    "after content check",
    "pct reject content check",
    "after date format check",
    "pct reject date format",
];

/// Column order matches the row body: source checks before date checks.
pub const MAPSTREAM_HEADER: [&str; 8] = [
    "source",
    "source field",
    "tablename",
    "incount",
    "invalid persid",
    "invalid source",
    "invalid date",
    "outcount",
];

/// One destination field's validation funnel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummaryRow {
    pub source: String,
    pub table: String,
    pub name: String,
    pub column: String,
    pub before: u64,
    pub after: u64,
    /// Share of `before` rejected by the content check; `None` when `before` is zero.
    pub reject_pct: Option<f64>,
    pub after_formatting: Option<u64>,
    /// Share of `after` rejected by the date-format check.
    pub format_pct: Option<f64>,
}

impl StageSummaryRow {
    fn from_entry(key: &str, block: &CounterBlock) -> Result<Self> {
        let StageKey {
            source,
            table,
            name,
            column,
        } = key.parse()?;
        let before = required(key, block, labels::BEFORE)?;
        let after = required(key, block, labels::AFTER)?;
        let after_formatting = block.get(labels::AFTER_FORMATTING);
        Ok(Self {
            source,
            table,
            name,
            column,
            before,
            after,
            reject_pct: percent_dropped(before, after),
            after_formatting,
            format_pct: after_formatting.and_then(|formatted| percent_dropped(after, formatted)),
        })
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.source.clone(),
            self.table.clone(),
            self.name.clone(),
            self.column.clone(),
            self.before.to_string(),
            self.after.to_string(),
            format_pct(self.reject_pct),
            self.after_formatting
                .map_or_else(|| NOT_AVAILABLE.to_string(), |count| count.to_string()),
            format_pct(self.format_pct),
        ]
    }
}

/// One source field's record counts on its way into a destination table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapstreamSummaryRow {
    /// Source prefix (qualified name up to the first `.`).
    pub source: String,
    pub field: String,
    pub table: String,
    pub input_count: Option<u64>,
    pub invalid_person_ids: Option<u64>,
    pub invalid_source_fields: Option<u64>,
    pub invalid_date_fields: Option<u64>,
    pub output_count: Option<u64>,
}

impl MapstreamSummaryRow {
    fn from_entry(key: &str, block: &CounterBlock) -> Result<Self> {
        let MapstreamKey {
            source,
            field,
            table,
        } = key.parse()?;
        Ok(Self {
            source: source_prefix(&source).to_string(),
            field,
            table,
            input_count: block.get(labels::INPUT_COUNT),
            invalid_person_ids: block.get(labels::INVALID_PERSON_IDS),
            invalid_source_fields: block.get(labels::INVALID_SOURCE_FIELDS),
            invalid_date_fields: block.get(labels::INVALID_DATE_FIELDS),
            output_count: block.get(labels::OUTPUT_COUNT),
        })
    }

    fn cells(&self) -> Vec<String> {
        let optional = |value: Option<u64>| value.map(|count| count.to_string()).unwrap_or_default();
        vec![
            self.source.clone(),
            self.field.clone(),
            self.table.clone(),
            optional(self.input_count),
            optional(self.invalid_person_ids),
            optional(self.invalid_source_fields),
            optional(self.invalid_date_fields),
            optional(self.output_count),
        ]
    }
}

impl Metrics {
    /// Stage rows for every entry. Every key must be a stage key carrying
    /// both `before` and `after`.
    pub fn stage_rows(&self) -> Result<Vec<StageSummaryRow>> {
        self.data_summary()
            .iter()
            .map(|(key, block)| StageSummaryRow::from_entry(key, block))
            .collect()
    }

    /// Mapstream rows for every entry. Absent counters stay `None`.
    pub fn mapstream_rows(&self) -> Result<Vec<MapstreamSummaryRow>> {
        self.data_summary()
            .iter()
            .map(|(key, block)| MapstreamSummaryRow::from_entry(key, block))
            .collect()
    }

    /// Tab-separated per-field validation stage summary.
    pub fn render_stage_summary(&self) -> Result<String> {
        let rows = self.stage_rows()?;
        debug!(rows = rows.len(), "rendering stage summary");
        write_tsv(&STAGE_HEADER, rows.iter().map(StageSummaryRow::cells))
    }

    /// Tab-separated per-source-field mapstream summary.
    pub fn render_mapstream_summary(&self) -> Result<String> {
        let rows = self.mapstream_rows()?;
        debug!(rows = rows.len(), "rendering mapstream summary");
        write_tsv(&MAPSTREAM_HEADER, rows.iter().map(MapstreamSummaryRow::cells))
    }
}

fn required(key: &str, block: &CounterBlock, counter: &'static str) -> Result<u64> {
    block.get(counter).ok_or_else(|| MetricsError::MissingCounter {
        key: key.to_string(),
        counter,
    })
}

/// Percentage of `from` that did not make it to `to`.
fn percent_dropped(from: u64, to: u64) -> Option<f64> {
    if from == 0 {
        return None;
    }
    Some((from as f64 - to as f64) * 100.0 / from as f64)
}

fn format_pct(pct: Option<f64>) -> String {
    pct.map_or_else(|| NOT_AVAILABLE.to_string(), |value| format!("{value:.3}"))
}

fn write_tsv(header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| MetricsError::Io(err.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}
