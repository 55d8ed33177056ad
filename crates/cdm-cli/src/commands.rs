use anyhow::{Context, Result};
use tracing::{info, info_span};

use cdm_cli::replay::replay_files;
use cdm_metrics::Metrics;

use crate::cli::{ReportArgs, ReportFormatArg};
use crate::summary::{mapstream_table, stage_table};

pub fn run_stage(args: &ReportArgs) -> Result<String> {
    let span = info_span!("stage_summary", logs = args.logs.len());
    let _guard = span.enter();
    let metrics = replay_files(&args.logs)?;
    let output = render_stage(&metrics, args.format)?;
    info!(keys = metrics.len(), "stage summary ready");
    Ok(output)
}

pub fn run_mapstream(args: &ReportArgs) -> Result<String> {
    let span = info_span!("mapstream_summary", logs = args.logs.len());
    let _guard = span.enter();
    let metrics = replay_files(&args.logs)?;
    let output = render_mapstream(&metrics, args.format)?;
    info!(keys = metrics.len(), "mapstream summary ready");
    Ok(output)
}

fn render_stage(metrics: &Metrics, format: ReportFormatArg) -> Result<String> {
    let output = match format {
        ReportFormatArg::Tsv => metrics.render_stage_summary()?,
        ReportFormatArg::Table => stage_table(&metrics.stage_rows()?).to_string(),
        ReportFormatArg::Json => serde_json::to_string_pretty(&metrics.stage_rows()?)
            .context("serialize stage rows")?,
    };
    Ok(output)
}

fn render_mapstream(metrics: &Metrics, format: ReportFormatArg) -> Result<String> {
    let output = match format {
        ReportFormatArg::Tsv => metrics.render_mapstream_summary()?,
        ReportFormatArg::Table => mapstream_table(&metrics.mapstream_rows()?).to_string(),
        ReportFormatArg::Json => serde_json::to_string_pretty(&metrics.mapstream_rows()?)
            .context("serialize mapstream rows")?,
    };
    Ok(output)
}
