// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Read-only view of the hosting API used by the metrics collector.
//!
//! The collector only depends on [`RepositoryHost`], which keeps the query
//! sequence testable against an in-memory host. The production
//! implementation lives in [`crate::github`].

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::Error;

/// Repository attributes read directly from the repository object.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct RepositoryInfo
{
    /// Login of the owning account.
    pub owner:          String,
    /// Open issue count (GitHub includes pull requests in this figure).
    pub open_issues:    u64,
    /// Default branch used when reading in-repository documents.
    pub default_branch: String,
}

/// Author details of one commit as returned by the API.
///
/// The timestamp is kept in its raw form; interpretation, including the UTC
/// assumption for values without an offset, happens in
/// [`crate::activity`].
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct CommitRecord
{
    pub author_name: Option<String,>,
    pub authored_at: Option<String,>,
}

/// Latest release summary.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ReleaseRecord
{
    pub published_at: Option<DateTime<Utc,>,>,
    pub created_at:   Option<DateTime<Utc,>,>,
}

impl ReleaseRecord
{
    /// Publication time, falling back to creation time for unpublished
    /// releases.
    pub fn timestamp(&self,) -> Option<DateTime<Utc,>,>
    {
        self.published_at.or(self.created_at,)
    }
}

/// Queries the metrics collector issues against the hosting platform.
///
/// Every method is a single logical read. Implementations map "not found"
/// responses to [`Error::NotFound`] unless the method documents an `Option`
/// result for that case.
pub trait RepositoryHost
{
    /// Resolves the organization, returning its login.
    fn organization(&self, name: &str,) -> impl Future<Output = Result<String, Error,>,>;

    /// Resolves a repository owned by `owner`.
    fn repository(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<RepositoryInfo, Error,>,>;

    /// Returns the most recent commit, `None` for repositories without
    /// commits.
    fn latest_commit(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<Option<CommitRecord,>, Error,>,>;

    /// Returns the most recent release, `None` when nothing was released.
    fn latest_release(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<Option<ReleaseRecord,>, Error,>,>;

    /// Counts contributors across every page of the listing.
    fn contributor_count(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<u64, Error,>,>;

    /// Returns the full commit history of the default branch.
    ///
    /// Entries that cannot be decoded are reported as records without
    /// author data rather than failing the listing.
    fn commit_history(
        &self,
        owner: &str,
        repo: &str,
    ) -> impl Future<Output = Result<Vec<CommitRecord,>, Error,>,>;

    /// Reads a text file at `reference`, `None` when the file is absent.
    fn file_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: &str,
    ) -> impl Future<Output = Result<Option<String,>, Error,>,>;
}

#[cfg(test)]
mod tests
{
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn release_timestamp_prefers_publication_time()
    {
        let published = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0,).unwrap();
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0,).unwrap();
        let release = ReleaseRecord {
            published_at: Some(published,),
            created_at:   Some(created,),
        };
        assert_eq!(release.timestamp(), Some(published));
    }

    #[test]
    fn release_timestamp_falls_back_to_creation_time()
    {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0,).unwrap();
        let release = ReleaseRecord {
            published_at: None,
            created_at:   Some(created,),
        };
        assert_eq!(release.timestamp(), Some(created));
    }
}
