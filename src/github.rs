// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// GitHub REST implementation of [`RepositoryHost`].
///
/// Issues plain authenticated requests through Octocrab and decodes only the
/// fields the collector needs. Paginated listings are followed to the last
/// page without a cap.
use chrono::{DateTime, Utc};
use octocrab::{FromResponse, Octocrab, Page};
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::Error,
    host::{CommitRecord, ReleaseRecord, RepositoryHost, RepositoryInfo},
};

/// Page size used for full listings.
const LISTING_PAGE_SIZE: u8 = 100;
/// Status returned by GitHub when listing commits of an empty repository.
const EMPTY_REPOSITORY_STATUS: u16 = 409;
/// Status returned by listings with nothing to list, such as the
/// contributors of an empty repository.
const NO_CONTENT_STATUS: u16 = 204;
const NOT_FOUND_STATUS: u16 = 404;

#[derive(Debug, Deserialize,)]
struct CommitEntry
{
    commit: CommitDetail,
}

#[derive(Debug, Deserialize,)]
struct CommitDetail
{
    #[serde(default)]
    author: Option<GitAuthor,>,
}

#[derive(Debug, Deserialize,)]
struct GitAuthor
{
    #[serde(default)]
    name: Option<String,>,
    #[serde(default)]
    date: Option<String,>,
}

#[derive(Debug, Deserialize,)]
struct ReleaseEntry
{
    #[serde(default)]
    published_at: Option<DateTime<Utc,>,>,
    #[serde(default)]
    created_at:   Option<DateTime<Utc,>,>,
}

impl From<CommitEntry,> for CommitRecord
{
    fn from(entry: CommitEntry,) -> Self
    {
        let author = entry.commit.author;
        Self {
            author_name: author.as_ref().and_then(|a| a.name.clone(),),
            authored_at: author.and_then(|a| a.date,),
        }
    }
}

impl From<ReleaseEntry,> for ReleaseRecord
{
    fn from(entry: ReleaseEntry,) -> Self
    {
        Self {
            published_at: entry.published_at,
            created_at:   entry.created_at,
        }
    }
}

/// Hosting client backed by the GitHub REST API.
#[derive(Clone,)]
pub struct GitHubHost
{
    client: Octocrab,
}

impl GitHubHost
{
    /// Builds a client authenticated with a personal access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] when the HTTP client cannot be initialized.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use repo_metrics::GitHubHost;
    ///
    /// # fn example() -> Result<(), repo_metrics::Error> {
    /// let host = GitHubHost::new("ghp_token",)?;
    /// # let _ = host;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(token: &str,) -> Result<Self, Error,>
    {
        let client = Octocrab::builder()
            .personal_token(token,)
            .build()
            .map_err(|e| Error::service(format!("failed to initialize GitHub client: {e}"),),)?;

        Ok(Self {
            client,
        },)
    }

    /// Fetches the first page of `route`, `None` when GitHub answers with an
    /// empty body.
    async fn first_page<T,>(
        &self,
        route: &str,
        per_page: u8,
    ) -> Result<Option<Page<T,>,>, octocrab::Error,>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.client._get(format!("{route}?per_page={per_page}"),).await?;
        let response = octocrab::map_github_error(response,).await?;
        if response.status().as_u16() == NO_CONTENT_STATUS {
            return Ok(None,);
        }
        <Page<T,> as FromResponse>::from_response(response,).await.map(Some,)
    }

    async fn all_pages<T,>(&self, route: &str,) -> Result<Vec<T,>, octocrab::Error,>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.first_page::<T,>(route, LISTING_PAGE_SIZE,).await? {
            Some(page,) => self.client.all_pages(page,).await,
            None => Ok(Vec::new(),),
        }
    }
}

fn status_of(error: &octocrab::Error,) -> Option<u16,>
{
    match error {
        octocrab::Error::GitHub {
            source, ..
        } => Some(source.status_code.as_u16(),),
        _ => None,
    }
}

/// One-line description of an Octocrab error.
///
/// GitHub answers keep their message and status. Other variants drop the
/// captured backtrace that follows the first line.
fn describe(error: &octocrab::Error,) -> String
{
    match error {
        octocrab::Error::GitHub {
            source, ..
        } => format!("{} ({})", source.message, source.status_code),
        other => other.to_string().lines().next().unwrap_or_default().to_owned(),
    }
}

fn map_error(error: octocrab::Error, resource: &str,) -> Error
{
    if status_of(&error,) == Some(NOT_FOUND_STATUS,) {
        return Error::not_found(resource,);
    }
    Error::service(format!("{resource}: {}", describe(&error)),)
}

impl RepositoryHost for GitHubHost
{
    async fn organization(&self, name: &str,) -> Result<String, Error,>
    {
        let organization = self
            .client
            .orgs(name,)
            .get()
            .await
            .map_err(|e| map_error(e, &format!("organization {name}"),),)?;
        Ok(organization.login,)
    }

    async fn repository(&self, owner: &str, repo: &str,) -> Result<RepositoryInfo, Error,>
    {
        let repository = self
            .client
            .repos(owner, repo,)
            .get()
            .await
            .map_err(|e| map_error(e, &format!("{owner}/{repo}"),),)?;

        Ok(RepositoryInfo {
            owner:          repository
                .owner
                .map(|author| author.login,)
                .unwrap_or_else(|| owner.to_owned(),),
            open_issues:    u64::from(repository.open_issues_count.unwrap_or_default(),),
            default_branch: repository.default_branch.unwrap_or_else(|| "main".to_owned(),),
        },)
    }

    async fn latest_commit(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Option<CommitRecord,>, Error,>
    {
        let route = format!("/repos/{owner}/{repo}/commits");
        match self.first_page::<CommitEntry,>(&route, 1,).await {
            Ok(page,) => {
                Ok(page.and_then(|page| page.items.into_iter().next(),).map(CommitRecord::from,),)
            }
            Err(error,) if status_of(&error,) == Some(EMPTY_REPOSITORY_STATUS,) => {
                debug!("{owner}/{repo} is an empty repository");
                Ok(None,)
            }
            Err(error,) => Err(map_error(error, &format!("commits of {owner}/{repo}"),),),
        }
    }

    async fn latest_release(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Option<ReleaseRecord,>, Error,>
    {
        let route = format!("/repos/{owner}/{repo}/releases");
        let page = self
            .first_page::<ReleaseEntry,>(&route, 1,)
            .await
            .map_err(|e| map_error(e, &format!("releases of {owner}/{repo}"),),)?;
        Ok(page.and_then(|page| page.items.into_iter().next(),).map(ReleaseRecord::from,),)
    }

    async fn contributor_count(&self, owner: &str, repo: &str,) -> Result<u64, Error,>
    {
        let route = format!("/repos/{owner}/{repo}/contributors");
        let contributors = self
            .all_pages::<serde_json::Value,>(&route,)
            .await
            .map_err(|e| map_error(e, &format!("contributors of {owner}/{repo}"),),)?;
        Ok(contributors.len() as u64,)
    }

    async fn commit_history(&self, owner: &str, repo: &str,) -> Result<Vec<CommitRecord,>, Error,>
    {
        let route = format!("/repos/{owner}/{repo}/commits");
        let entries = match self.all_pages::<serde_json::Value,>(&route,).await {
            Ok(entries,) => entries,
            Err(error,) if status_of(&error,) == Some(EMPTY_REPOSITORY_STATUS,) => Vec::new(),
            Err(error,) => {
                return Err(map_error(error, &format!("commit history of {owner}/{repo}"),),);
            }
        };

        let commits = entries
            .into_iter()
            .map(|value| match serde_json::from_value::<CommitEntry,>(value,) {
                Ok(entry,) => CommitRecord::from(entry,),
                Err(error,) => {
                    debug!("Undecodable commit in {owner}/{repo}: {error}");
                    CommitRecord::default()
                }
            },)
            .collect();

        Ok(commits,)
    }

    async fn file_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: &str,
    ) -> Result<Option<String,>, Error,>
    {
        let result = self
            .client
            .repos(owner, repo,)
            .get_content()
            .path(path,)
            .r#ref(reference,)
            .send()
            .await;

        match result {
            Ok(contents,) => {
                Ok(contents.items.into_iter().next().and_then(|item| item.decoded_content(),),)
            }
            Err(error,) if status_of(&error,) == Some(NOT_FOUND_STATUS,) => Ok(None,),
            Err(error,) => Err(map_error(error, &format!("{path} in {owner}/{repo}"),),),
        }
    }
}

#[cfg(test)]
mod tests
{
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    /// Serves the same canned HTTP response to every connection and returns
    /// the base URI of the listener.
    async fn canned_server(status_line: &'static str, body: &'static str,) -> String
    {
        let listener = TcpListener::bind("127.0.0.1:0",).await.expect("failed to bind listener",);
        let address = listener.local_addr().expect("listener has no address",);

        tokio::spawn(async move {
            while let Ok((mut socket, _,),) = listener.accept().await {
                let mut request = vec![0_u8; 8192];
                let _ = socket.read(&mut request,).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes(),).await;
                let _ = socket.shutdown().await;
            }
        },);

        format!("http://{address}")
    }

    async fn host_for(status_line: &'static str, body: &'static str,) -> GitHubHost
    {
        let base = canned_server(status_line, body,).await;
        let client = Octocrab::builder()
            .base_uri(base,)
            .expect("valid base uri",)
            .build()
            .expect("failed to build client",);
        GitHubHost {
            client,
        }
    }

    #[test]
    fn commit_entry_conversion_keeps_author_data()
    {
        let json = r#"{"sha":"abc","commit":{"author":{"name":"Octo","email":"o@example.com","date":"2024-05-01T10:00:00Z"}}}"#;
        let entry: CommitEntry = serde_json::from_str(json,).expect("valid commit",);
        let record = CommitRecord::from(entry,);

        assert_eq!(record.author_name.as_deref(), Some("Octo"));
        assert_eq!(record.authored_at.as_deref(), Some("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn commit_entry_without_author_converts_to_empty_record()
    {
        let json = r#"{"sha":"abc","commit":{"author":null}}"#;
        let entry: CommitEntry = serde_json::from_str(json,).expect("valid commit",);
        assert_eq!(CommitRecord::from(entry,), CommitRecord::default());
    }

    #[test]
    fn release_entry_conversion()
    {
        let json = r#"{"tag_name":"v1.2.0","published_at":null,"created_at":"2024-04-01T00:00:00Z"}"#;
        let entry: ReleaseEntry = serde_json::from_str(json,).expect("valid release",);
        let record = ReleaseRecord::from(entry,);

        assert!(record.published_at.is_none());
        assert!(record.timestamp().is_some());
    }

    #[tokio::test]
    async fn host_builds_from_token()
    {
        assert!(GitHubHost::new("invalid_token").is_ok());
    }

    #[tokio::test]
    async fn no_content_listing_counts_zero_contributors()
    {
        let host = host_for("204 No Content", "",).await;
        let count = host.contributor_count("acme", "empty",).await.expect("empty listing",);
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn no_content_listing_yields_empty_history()
    {
        let host = host_for("204 No Content", "",).await;
        let history = host.commit_history("acme", "empty",).await.expect("empty listing",);
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn empty_repository_has_no_commits()
    {
        let host =
            host_for("409 Conflict", r#"{"message":"Git Repository is empty."}"#,).await;

        let latest = host.latest_commit("acme", "empty",).await.expect("empty repository",);
        assert!(latest.is_none());
        let history = host.commit_history("acme", "empty",).await.expect("empty repository",);
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn missing_repository_maps_to_not_found()
    {
        let host = host_for("404 Not Found", r#"{"message":"Not Found"}"#,).await;

        let error = host.contributor_count("acme", "missing",).await.unwrap_err();
        match error {
            Error::NotFound {
                resource,
            } => assert_eq!(resource, "contributors of acme/missing"),
            other => panic!("expected not found error, got {other:?}"),
        }

        let contents = host
            .file_contents("acme", "missing", ".github/security-scans.yaml", "main",)
            .await
            .expect("absent file",);
        assert!(contents.is_none());
    }

    #[tokio::test]
    async fn service_errors_carry_a_single_line_message()
    {
        let host = host_for("403 Forbidden", r#"{"message":"Resource not accessible"}"#,).await;

        let error = host.contributor_count("acme", "locked",).await.unwrap_err();
        match error {
            Error::Service {
                message,
            } => {
                assert!(message.starts_with("contributors of acme/locked: Resource not accessible"));
                assert!(message.contains("403"));
                assert!(!message.contains('\n'));
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn decoding_failures_drop_the_backtrace()
    {
        let host = host_for("200 OK", "not json",).await;

        let error = host.contributor_count("acme", "garbled",).await.unwrap_err();
        let message = error.to_display_string();
        assert!(message.starts_with("service error: contributors of acme/garbled: "));
        assert!(!message.contains('\n'));
        assert!(!message.contains("Found at"));
    }

    #[tokio::test]
    async fn listing_items_are_decoded()
    {
        let host = host_for(
            "200 OK",
            r#"[{"sha":"a","commit":{"author":{"name":"Octo","date":"2024-05-01T10:00:00Z"}}},{"sha":"b","commit":{}}]"#,
        )
        .await;

        let history = host.commit_history("acme", "tools",).await.expect("valid listing",);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].author_name.as_deref(), Some("Octo"));
        assert_eq!(history[1], CommitRecord::default());
    }
}
