//! The measure, compare, report, publish pipeline.

use perfwatch_core::{compare, CiContext, Configuration, Measurement, Publication, Publisher};
use perfwatch_core::{ReportRow, Result};
use perfwatch_report::{render_markdown, render_table, TableOptions};
use perfwatch_runner::{write_report_json, RunReport};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Local output settings of a run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Interactive table rendering.
    pub table: TableOptions,
    /// Where to export the report as JSON, if anywhere.
    pub json_output: Option<PathBuf>,
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Measurements in configuration order.
    pub measurements: Vec<Measurement>,
    /// Compared rows in configuration order.
    pub rows: Vec<ReportRow>,
    /// Remote side effect of the run.
    pub publication: Publication,
}

/// Run one pipeline pass.
///
/// The interactive report is written to `out` before any remote write is
/// attempted, so persistence and comment failures still leave the local
/// report behind. Measurement and baseline failures abort before anything is
/// written.
pub async fn execute<W: Write>(
    configuration: &Configuration,
    context: &CiContext,
    publisher: &Publisher,
    options: &RunOptions,
    out: &mut W,
) -> Result<RunOutcome> {
    info!(commands = configuration.len(), context = %context, "Starting run");

    let measurements = perfwatch_runner::run_all(configuration).await?;
    let baseline = publisher.resolve_baseline(context).await?;
    let rows = compare(&measurements, &baseline);

    let table = render_table(&rows, options.table);
    if table.is_empty() {
        writeln!(out, "No measurements configured.")?;
    } else {
        writeln!(out, "{}", table)?;
    }
    out.flush()?;

    if let Some(path) = &options.json_output {
        write_report_json(&RunReport::new(measurements.clone(), rows.clone()), path)?;
        info!(path = %path.display(), "Exported report");
    }

    let markdown = render_markdown(&rows);
    let publication = publisher.publish(context, &measurements, &markdown).await?;

    Ok(RunOutcome {
        measurements,
        rows,
        publication,
    })
}
