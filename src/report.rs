// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Markdown report rendering for collected repository metrics.
///
/// Produces a title, a generation timestamp, a padded GitHub-flavoured table
/// with one row per record and a summary section. Rendering is pure; only
/// [`write_report`] and [`write_json`] touch the filesystem.
use std::{fmt::Write as _, fs, path::Path};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

use crate::{
    activity::WEEK_DAYS,
    error::{self, Error},
    record::{Fetched, RepositoryMetrics, ScanProvider, ScanStatus, TIMESTAMP_FORMAT},
};

/// Default report location.
pub const DEFAULT_REPORT_PATH: &str = "metrics_report.md";

const TITLE: &str = "# Repository Metrics Report";
const NO_COMMITS: &str = "No commits";
const NO_RELEASES: &str = "No releases";
const ERROR_CELL: &str = "Error";

/// Aggregated figures shown below the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct ReportSummary
{
    /// Number of records in the report.
    pub total_repositories:     usize,
    /// Records whose last commit falls inside the last 7 days.
    pub active_repositories:    usize,
    /// Sum of weekly commit counts.
    pub weekly_commits:         u64,
    /// Sum of monthly commit counts.
    pub monthly_commits:        u64,
    /// Enabled count per provider, in [`ScanProvider::ALL`] order.
    pub scans_enabled:          Vec<(ScanProvider, usize,),>,
    /// Records with at least one provider still pending.
    pub pending_implementation: usize,
}

/// Computes the summary figures for `records` relative to `now`.
pub fn summarize(records: &[RepositoryMetrics], now: DateTime<Utc,>,) -> ReportSummary
{
    let week_ago = now - Duration::days(WEEK_DAYS,);

    let active_repositories = records
        .iter()
        .filter(|record| {
            matches!(&record.last_commit, Fetched::Value(Some(commit)) if commit.at >= week_ago)
        },)
        .count();

    let scans_enabled = ScanProvider::ALL
        .iter()
        .map(|provider| {
            let enabled = records
                .iter()
                .filter(|record| record.scans.get(*provider,) == ScanStatus::Enabled,)
                .count();
            (*provider, enabled,)
        },)
        .collect();

    ReportSummary {
        total_repositories: records.len(),
        active_repositories,
        weekly_commits: records.iter().map(|record| record.weekly_commits,).sum(),
        monthly_commits: records.iter().map(|record| record.monthly_commits,).sum(),
        scans_enabled,
        pending_implementation: records.iter().filter(|record| record.scans.any_pending(),).count(),
    }
}

/// Renders the complete markdown report.
///
/// Output depends only on `records` and `generated_at`, so identical inputs
/// produce byte-identical documents.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use repo_metrics::{RepositoryMetrics, render_report};
///
/// let generated_at = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0,).unwrap();
/// let report = render_report(&[RepositoryMetrics::failed("beta", "not found",)], generated_at,);
/// assert!(report.starts_with("# Repository Metrics Report"));
/// assert!(report.contains("Total repositories: 1"));
/// ```
pub fn render_report(records: &[RepositoryMetrics], generated_at: DateTime<Utc,>,) -> String
{
    let summary = summarize(records, generated_at,);

    let mut output = String::with_capacity(256 + records.len() * 160,);
    let _ = writeln!(output, "{TITLE}\n");
    let _ = writeln!(output, "Generated on: {} UTC\n", generated_at.format(TIMESTAMP_FORMAT));
    output.push_str(&render_table(records,),);
    output.push_str("\n\n",);
    output.push_str(&render_summary(&summary,),);
    output
}

/// Renders the metrics table with padded columns.
pub fn render_table(records: &[RepositoryMetrics],) -> String
{
    let mut headers = vec![
        "Repository".to_owned(),
        "Owner".to_owned(),
        "Last Commit".to_owned(),
        "Open Issues".to_owned(),
        "Last Release".to_owned(),
        "Commits (7d)".to_owned(),
        "Commits (30d)".to_owned(),
        "Contributors".to_owned(),
    ];
    headers.extend(ScanProvider::ALL.iter().map(|provider| provider.label().to_owned(),),);

    let rows: Vec<Vec<String,>,> = records.iter().map(table_row,).collect();

    let mut widths: Vec<usize,> = headers.iter().map(|header| cell_width(header,),).collect();
    for row in &rows {
        for (width, cell,) in widths.iter_mut().zip(row,) {
            *width = (*width).max(cell_width(cell,),);
        }
    }

    let mut table = String::new();
    push_row(&mut table, &headers, &widths,);
    let separators: Vec<String,> = widths.iter().map(|width| "-".repeat(*width,),).collect();
    push_row(&mut table, &separators, &widths,);
    for row in &rows {
        push_row(&mut table, row, &widths,);
    }

    table.trim_end().to_owned()
}

fn render_summary(summary: &ReportSummary,) -> String
{
    let mut output = String::from("## Summary\n\n",);
    let total = summary.total_repositories;

    let _ = writeln!(output, "Total repositories: {total}");
    let _ = writeln!(
        output,
        "Repositories with commits in the last week: {}",
        summary.active_repositories
    );
    let _ = writeln!(output, "Total commits in the last 7 days: {}", summary.weekly_commits);
    let _ = writeln!(output, "Total commits in the last 30 days: {}", summary.monthly_commits);
    for (provider, enabled,) in &summary.scans_enabled {
        let _ = writeln!(output, "{} enabled: {enabled}/{total}", provider.label());
    }
    let _ = writeln!(
        output,
        "Repositories with scans pending implementation: {}",
        summary.pending_implementation
    );
    output
}

fn table_row(record: &RepositoryMetrics,) -> Vec<String,>
{
    let mut row = vec![
        escape_cell(&record.name,),
        verbose_cell(&record.owner, |owner| owner.clone(),),
        verbose_cell(&record.last_commit, |commit| match commit {
            Some(commit,) => commit.to_string(),
            None => NO_COMMITS.to_owned(),
        },),
        short_cell(&record.open_issues, u64::to_string,),
        short_cell(&record.last_release, |release| match release {
            Some(at,) => at.format(TIMESTAMP_FORMAT,).to_string(),
            None => NO_RELEASES.to_owned(),
        },),
        record.weekly_commits.to_string(),
        record.monthly_commits.to_string(),
        short_cell(&record.contributors, u64::to_string,),
    ];
    row.extend(ScanProvider::ALL.iter().map(|provider| record.scans.get(*provider,).to_string(),),);
    row
}

/// Cell that shows the error text on failure.
fn verbose_cell<T, F,>(field: &Fetched<T,>, render: F,) -> String
where
    F: FnOnce(&T,) -> String,
{
    match field {
        Fetched::Value(value,) => escape_cell(&render(value,),),
        Fetched::Failed(message,) => escape_cell(&format!("{ERROR_CELL}: {message}"),),
    }
}

/// Cell that collapses failures to a bare marker.
fn short_cell<T, F,>(field: &Fetched<T,>, render: F,) -> String
where
    F: FnOnce(&T,) -> String,
{
    match field {
        Fetched::Value(value,) => escape_cell(&render(value,),),
        Fetched::Failed(_,) => ERROR_CELL.to_owned(),
    }
}

fn escape_cell(value: &str,) -> String
{
    value.replace('|', "\\|",).replace(['\r', '\n',], " ",)
}

fn cell_width(value: &str,) -> usize
{
    value.chars().count()
}

fn push_row(table: &mut String, cells: &[String], widths: &[usize],)
{
    table.push('|',);
    for (cell, width,) in cells.iter().zip(widths,) {
        let padding = width.saturating_sub(cell_width(cell,),);
        table.push(' ',);
        table.push_str(cell,);
        table.push_str(&" ".repeat(padding,),);
        table.push_str(" |",);
    }
    table.push('\n',);
}

/// Writes `contents` to `path`, creating missing parent directories.
///
/// # Errors
///
/// Returns [`Error::ReportIo`] when the directory or file cannot be written.
pub fn write_report(path: &Path, contents: &str,) -> Result<(), Error,>
{
    if let Some(parent,) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent,).map_err(|source| error::report_io_error(parent, source,),)?;
    }

    fs::write(path, contents,).map_err(|source| error::report_io_error(path, source,),)?;
    info!("Report generated: {}", path.display());
    Ok((),)
}

/// Writes the records as pretty-printed JSON next to the markdown report.
///
/// # Errors
///
/// Returns [`Error::Service`] when serialization fails and
/// [`Error::ReportIo`] when the file cannot be written.
pub fn write_json(path: &Path, records: &[RepositoryMetrics],) -> Result<(), Error,>
{
    let json = serde_json::to_string_pretty(records,)
        .map_err(|e| Error::service(format!("failed to serialize metrics: {e}"),),)?;
    write_report(path, &json,)
}
