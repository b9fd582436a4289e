//! Repository activity metrics collected from GitHub and rendered as a
//! markdown report.
//!
//! The library loads the repository list and organization from YAML
//! configuration, queries the hosting API one repository at a time through
//! the [`RepositoryHost`] seam, and renders the resulting
//! [`RepositoryMetrics`] records into a table with summary statistics.
//! Failures are embedded in the records as [`Fetched::Failed`] values rather
//! than aborting the batch.

mod activity;
mod collector;
mod config;
mod error;
mod github;
mod host;
mod record;
mod report;
mod scan;

pub use activity::{CommitActivity, MONTH_DAYS, WEEK_DAYS, parse_timestamp, tally_activity};
pub use collector::{CollectOptions, DEFAULT_DELAY, collect_metrics};
pub use config::{
    DEFAULT_ORGANIZATION, DEFAULT_ORGANIZATION_CONFIG, DEFAULT_REPOS_CONFIG, ORGANIZATION_ENV,
    OrganizationSource, REPOSITORY_ENV, RepositoryList, ResolvedOrganization, load_repositories,
    parse_repositories, resolve_organization,
};
pub use error::{Error, io_error, report_io_error};
pub use github::GitHubHost;
pub use host::{CommitRecord, ReleaseRecord, RepositoryHost, RepositoryInfo};
pub use record::{
    Fetched, LastCommit, RepositoryMetrics, ScanFlags, ScanProvider, ScanStatus, TIMESTAMP_FORMAT,
};
pub use report::{
    DEFAULT_REPORT_PATH, ReportSummary, render_report, render_table, summarize, write_json,
    write_report,
};
pub use scan::{DEFAULT_SCAN_CONFIG_PATH, parse_scan_config};
