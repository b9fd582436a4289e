// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Sequential metrics collection across configured repositories.
///
/// Repositories are processed one at a time with a fixed pause between
/// them. Every configured name yields exactly one record, in input order.
/// Failures are scoped to the smallest affected field; only an unresolvable
/// repository degrades its whole record, and only an unresolvable
/// organization degrades the whole batch.
use std::time::Duration;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    activity::{CommitActivity, parse_timestamp, tally_activity},
    error::Error,
    host::{CommitRecord, RepositoryHost},
    record::{Fetched, LastCommit, RepositoryMetrics, ScanFlags},
    scan::{DEFAULT_SCAN_CONFIG_PATH, parse_scan_config},
};

/// Pause between repositories used when no override is supplied.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1,);

/// Author shown when a commit carries no author name.
const UNKNOWN_AUTHOR: &str = "unknown";

/// Tuning knobs for a collection run.
#[derive(Debug, Clone,)]
pub struct CollectOptions
{
    /// Fixed pause between consecutive repositories.
    pub delay:            Duration,
    /// Location of the scan configuration inside each repository.
    pub scan_config_path: String,
    /// Instant the rolling activity windows end at.
    pub now:              DateTime<Utc,>,
    /// Draw a progress bar on stderr.
    pub show_progress:    bool,
}

impl CollectOptions
{
    /// Options with default delay and scan path, windows ending at `now`.
    pub fn new(now: DateTime<Utc,>,) -> Self
    {
        Self {
            delay: DEFAULT_DELAY,
            scan_config_path: DEFAULT_SCAN_CONFIG_PATH.to_owned(),
            now,
            show_progress: false,
        }
    }
}

/// Collects metrics for `repositories` owned by `organization`.
///
/// The organization is resolved once; when that fails every record carries
/// the same organization error and no repository is queried.
///
/// # Example
///
/// ```no_run
/// use chrono::Utc;
/// use repo_metrics::{CollectOptions, GitHubHost, collect_metrics};
///
/// # async fn example() -> Result<(), repo_metrics::Error> {
/// let host = GitHubHost::new("ghp_token",)?;
/// let repositories = vec!["alpha".to_string(), "beta".to_string()];
/// let records =
///     collect_metrics(&host, "acme", &repositories, &CollectOptions::new(Utc::now(),),).await;
/// assert_eq!(records.len(), repositories.len());
/// # Ok(())
/// # }
/// ```
pub async fn collect_metrics<H,>(
    host: &H,
    organization: &str,
    repositories: &[String],
    options: &CollectOptions,
) -> Vec<RepositoryMetrics,>
where
    H: RepositoryHost,
{
    info!("Collecting metrics for {} repositories in {}", repositories.len(), organization);

    if let Err(error,) = host.organization(organization,).await {
        let message = format!("organization {organization} unavailable: {error}");
        warn!("Error accessing organization {organization}: {error}");
        return repositories
            .iter()
            .map(|name| RepositoryMetrics::failed(name.as_str(), message.as_str(),),)
            .collect();
    }

    let progress = progress_bar(repositories.len(), options.show_progress,);
    let mut metrics = Vec::with_capacity(repositories.len(),);

    for (index, name,) in repositories.iter().enumerate() {
        if index > 0 && !options.delay.is_zero() {
            debug!("Sleeping {:?} before the next repository", options.delay);
            sleep(options.delay,).await;
        }

        progress.set_message(name.clone(),);
        info!("Processing repository: {name}");
        metrics.push(collect_repository(host, organization, name, options,).await,);
        progress.inc(1,);
    }

    progress.finish_and_clear();
    metrics
}

fn progress_bar(len: usize, visible: bool,) -> ProgressBar
{
    if !visible {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new(len as u64,);
    if let Ok(style,) =
        ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] {pos}/{len} {msg}",)
    {
        progress.set_style(style,);
    }
    progress
}

async fn collect_repository<H,>(
    host: &H,
    owner: &str,
    name: &str,
    options: &CollectOptions,
) -> RepositoryMetrics
where
    H: RepositoryHost,
{
    let info = match host.repository(owner, name,).await {
        Ok(info,) => info,
        Err(error,) => {
            warn!("Error processing repository {name}: {error}");
            return RepositoryMetrics::failed(name, error.to_display_string(),);
        }
    };

    let last_commit = match host.latest_commit(owner, name,).await {
        Ok(commit,) => Fetched::from_result(last_commit_from(commit,),),
        Err(error,) => failed_field(name, "latest commit", &error,),
    };

    let last_release = match host.latest_release(owner, name,).await {
        Ok(release,) => Fetched::Value(release.and_then(|release| release.timestamp(),),),
        Err(error,) => failed_field(name, "latest release", &error,),
    };

    let contributors = match host.contributor_count(owner, name,).await {
        Ok(count,) => Fetched::Value(count,),
        Err(error,) => failed_field(name, "contributors", &error,),
    };

    let activity = match host.commit_history(owner, name,).await {
        Ok(commits,) => {
            let activity = tally_activity(&commits, options.now,);
            if activity.skipped > 0 {
                debug!("Skipped {} unusable commits in {name}", activity.skipped);
            }
            activity
        }
        Err(error,) => {
            warn!("Failed to fetch commit history for {name}: {error}");
            CommitActivity::default()
        }
    };

    let scans = scan_flags(host, owner, name, &info.default_branch, &options.scan_config_path,).await;

    RepositoryMetrics {
        name: name.to_owned(),
        owner: Fetched::Value(info.owner,),
        last_commit,
        open_issues: Fetched::Value(info.open_issues,),
        last_release,
        weekly_commits: activity.weekly,
        monthly_commits: activity.monthly,
        contributors,
        scans,
    }
}

fn failed_field<T,>(repository: &str, field: &str, error: &Error,) -> Fetched<T,>
{
    warn!("Failed to fetch {field} for {repository}: {error}");
    Fetched::Failed(error.to_display_string(),)
}

fn last_commit_from(commit: Option<CommitRecord,>,) -> Result<Option<LastCommit,>, String,>
{
    let Some(commit,) = commit else {
        return Ok(None,);
    };

    let at = commit
        .authored_at
        .as_deref()
        .and_then(parse_timestamp,)
        .ok_or_else(|| "latest commit has no usable author timestamp".to_owned(),)?;
    let author = commit
        .author_name
        .filter(|author| !author.trim().is_empty(),)
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_owned(),);

    Ok(Some(LastCommit {
        at,
        author,
    },),)
}

async fn scan_flags<H,>(
    host: &H,
    owner: &str,
    name: &str,
    branch: &str,
    path: &str,
) -> ScanFlags
where
    H: RepositoryHost,
{
    match host.file_contents(owner, name, path, branch,).await {
        Ok(Some(contents,),) => parse_scan_config(&contents,).unwrap_or_else(|error| {
            warn!("Ignoring malformed scan config {path} in {name}: {error}");
            ScanFlags::default()
        },),
        Ok(None,) => {
            debug!("No scan config at {path} in {name}");
            ScanFlags::default()
        }
        Err(error,) => {
            warn!("Failed to read scan config {path} in {name}: {error}");
            ScanFlags::default()
        }
    }
}
