//! Typed representation of the metrics collected for one repository.
//!
//! Every field that may fail independently is a [`Fetched`] value, so a
//! record never overloads a number with an error string. Records are built
//! fresh on every run and discarded once the report is written.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Timestamp format used for commit and release cells.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of fetching a single field from the hosting API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Fetched<T,>
{
    /// The value was retrieved successfully.
    Value(T,),
    /// Retrieval failed; carries the error text shown in the report.
    Failed(String,),
}

impl<T,> Fetched<T,>
{
    /// Converts a fallible lookup into a field value, keeping the error
    /// text for the report.
    pub fn from_result<E: fmt::Display,>(result: Result<T, E,>,) -> Self
    {
        match result {
            Ok(value,) => Self::Value(value,),
            Err(error,) => Self::Failed(error.to_string(),),
        }
    }

    /// Returns the value when present.
    pub fn value(&self,) -> Option<&T,>
    {
        match self {
            Self::Value(value,) => Some(value,),
            Self::Failed(_,) => None,
        }
    }

    /// Returns the error text when retrieval failed.
    pub fn error(&self,) -> Option<&str,>
    {
        match self {
            Self::Value(_,) => None,
            Self::Failed(message,) => Some(message.as_str(),),
        }
    }

    /// Returns `true` when retrieval failed.
    pub fn is_failed(&self,) -> bool
    {
        matches!(self, Self::Failed(_))
    }
}

/// Most recent commit on the default branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct LastCommit
{
    /// Author timestamp of the commit.
    pub at:     DateTime<Utc,>,
    /// Author name recorded in the commit.
    pub author: String,
}

impl fmt::Display for LastCommit
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        write!(f, "{} by {}", self.at.format(TIMESTAMP_FORMAT), self.author)
    }
}

/// Third-party security scanners tracked per repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize,)]
#[serde(rename_all = "snake_case")]
pub enum ScanProvider
{
    /// GitHub CodeQL code scanning.
    CodeQl,
    /// Snyk dependency scanning.
    Snyk,
    /// SonarCloud static analysis.
    SonarCloud,
}

impl ScanProvider
{
    /// All providers in report column order.
    pub const ALL: [ScanProvider; 3] = [Self::CodeQl, Self::Snyk, Self::SonarCloud,];

    /// Key used for the provider inside the scan configuration document.
    pub fn config_key(self,) -> &'static str
    {
        match self {
            Self::CodeQl => "codeql",
            Self::Snyk => "snyk",
            Self::SonarCloud => "sonarcloud",
        }
    }

    /// Human readable provider name used as a column header.
    pub fn label(self,) -> &'static str
    {
        match self {
            Self::CodeQl => "CodeQL",
            Self::Snyk => "Snyk",
            Self::SonarCloud => "SonarCloud",
        }
    }
}

/// Adoption state of a scan provider for one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize,)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus
{
    /// The repository opted in to the provider.
    Enabled,
    /// The repository explicitly opted out.
    Disabled,
    /// No decision recorded yet.
    #[default]
    PendingImplementation,
}

impl fmt::Display for ScanStatus
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        let label = match self {
            Self::Enabled => "Enabled",
            Self::Disabled => "Disabled",
            Self::PendingImplementation => "Pending Implementation",
        };
        f.write_str(label,)
    }
}

/// Scan status for every tracked provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize,)]
pub struct ScanFlags
{
    /// CodeQL code scanning.
    pub codeql:     ScanStatus,
    /// Snyk dependency scanning.
    pub snyk:       ScanStatus,
    /// SonarCloud static analysis.
    pub sonarcloud: ScanStatus,
}

impl ScanFlags
{
    /// Returns the status recorded for `provider`.
    pub fn get(&self, provider: ScanProvider,) -> ScanStatus
    {
        match provider {
            ScanProvider::CodeQl => self.codeql,
            ScanProvider::Snyk => self.snyk,
            ScanProvider::SonarCloud => self.sonarcloud,
        }
    }

    /// Updates the status recorded for `provider`.
    pub fn set(&mut self, provider: ScanProvider, status: ScanStatus,)
    {
        match provider {
            ScanProvider::CodeQl => self.codeql = status,
            ScanProvider::Snyk => self.snyk = status,
            ScanProvider::SonarCloud => self.sonarcloud = status,
        }
    }

    /// Returns `true` when at least one provider is still pending.
    pub fn any_pending(&self,) -> bool
    {
        ScanProvider::ALL
            .iter()
            .any(|provider| self.get(*provider,) == ScanStatus::PendingImplementation,)
    }
}

/// Metrics collected for a single configured repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct RepositoryMetrics
{
    /// Repository name as listed in the configuration.
    pub name:            String,
    /// Login of the account owning the repository.
    pub owner:           Fetched<String,>,
    /// Most recent commit, `None` when the repository has no commits.
    pub last_commit:     Fetched<Option<LastCommit,>,>,
    /// Number of open issues reported by the repository object.
    pub open_issues:     Fetched<u64,>,
    /// Publication time of the latest release, `None` without releases.
    pub last_release:    Fetched<Option<DateTime<Utc,>,>,>,
    /// Commits authored in the last 7 days.
    pub weekly_commits:  u64,
    /// Commits authored in the last 30 days.
    pub monthly_commits: u64,
    /// Number of contributors listed for the repository.
    pub contributors:    Fetched<u64,>,
    /// Security scan adoption flags.
    pub scans:           ScanFlags,
}

impl RepositoryMetrics
{
    /// Builds a record whose every fetchable field carries `message`.
    ///
    /// Used when the repository (or its organization) cannot be resolved, so
    /// the report still lists one row per configured repository.
    pub fn failed(name: impl Into<String,>, message: impl Into<String,>,) -> Self
    {
        let message = message.into();
        Self {
            name:            name.into(),
            owner:           Fetched::Failed(message.clone(),),
            last_commit:     Fetched::Failed(message.clone(),),
            open_issues:     Fetched::Failed(message.clone(),),
            last_release:    Fetched::Failed(message.clone(),),
            weekly_commits:  0,
            monthly_commits: 0,
            contributors:    Fetched::Failed(message,),
            scans:           ScanFlags::default(),
        }
    }

    /// Returns `true` when every fetchable field failed.
    pub fn is_failed(&self,) -> bool
    {
        self.owner.is_failed()
            && self.last_commit.is_failed()
            && self.open_issues.is_failed()
            && self.last_release.is_failed()
            && self.contributors.is_failed()
    }
}
