//! Configuration documents and organization resolution.
//!
//! The repository list and the optional organization document are YAML
//! files. The organization name may also come from the command line or the
//! environment; [`resolve_organization`] applies the lookup order and reports
//! which source supplied the final value.

use std::{fmt, fs, path::Path, sync::OnceLock};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{self, Error};

/// Default location of the repository list document.
pub const DEFAULT_REPOS_CONFIG: &str = "config/repos.yaml";
/// Default location of the organization document.
pub const DEFAULT_ORGANIZATION_CONFIG: &str = "config/organization.yaml";
/// Organization used when no other source provides one.
pub const DEFAULT_ORGANIZATION: &str = "defaultOrgName";

/// Environment variable holding `owner/repo` for the running workflow.
pub const REPOSITORY_ENV: &str = "GITHUB_REPOSITORY";
/// Environment variable overriding the organization name.
pub const ORGANIZATION_ENV: &str = "GITHUB_ORG";

/// Repository list document.
///
/// # Examples
///
/// ```
/// use repo_metrics::RepositoryList;
///
/// let yaml = r#"
/// repos:
///   - alpha
///   - beta
/// "#;
/// let config: RepositoryList = serde_yaml::from_str(yaml,).expect("valid configuration",);
/// assert_eq!(config.repos, vec!["alpha", "beta"]);
/// ```
#[derive(Debug, Default, Deserialize,)]
pub struct RepositoryList
{
    /// Ordered repository names.
    #[serde(default)]
    pub repos: Vec<String,>,
}

#[derive(Debug, Default, Deserialize,)]
struct OrganizationDocument
{
    #[serde(default)]
    organization: Option<String,>,
}

/// Source that supplied the resolved organization name.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum OrganizationSource
{
    /// Explicit `--org` flag.
    Flag,
    /// Owner segment of `GITHUB_REPOSITORY`.
    RepositoryEnv,
    /// The organization configuration document.
    ConfigFile,
    /// `GITHUB_ORG` environment variable.
    OrganizationEnv,
    /// Hardcoded fallback.
    Default,
}

impl fmt::Display for OrganizationSource
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        let label = match self {
            Self::Flag => "command-line flag",
            Self::RepositoryEnv => REPOSITORY_ENV,
            Self::ConfigFile => "organization config file",
            Self::OrganizationEnv => ORGANIZATION_ENV,
            Self::Default => "built-in default",
        };
        f.write_str(label,)
    }
}

/// Organization name together with its source.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ResolvedOrganization
{
    pub name:   String,
    pub source: OrganizationSource,
}

/// Loads the ordered repository list from the provided YAML file path.
///
/// A document without a `repos` key yields an empty list; callers treat an
/// empty list as fatal.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read and [`Error::Parse`]
/// when the YAML is malformed or an entry is not a string.
pub fn load_repositories(path: &Path,) -> Result<Vec<String,>, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
    parse_repositories(&contents,)
}

/// Parses a repository list document.
///
/// Names are trimmed and blank entries are dropped. Names that GitHub would
/// not accept are kept with a warning so they still get a report row.
///
/// # Errors
///
/// Propagates [`Error::Parse`] for malformed YAML.
pub fn parse_repositories(contents: &str,) -> Result<Vec<String,>, Error,>
{
    let document: Option<RepositoryList,> = serde_yaml::from_str(contents,)?;
    let repos = document.unwrap_or_default().repos;

    let normalized: Vec<String,> =
        repos.iter().filter_map(|name| normalize_repository_name(name,),).collect();

    debug!("Loaded {} repositories from configuration", normalized.len());
    Ok(normalized,)
}

fn repository_name_pattern() -> &'static Regex
{
    static PATTERN: OnceLock<Regex,> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$",).expect("valid regex",),)
}

fn normalize_repository_name(input: &str,) -> Option<String,>
{
    let trimmed = input.trim();
    if trimmed.is_empty() {
        warn!("Skipping blank repository entry");
        return None;
    }
    if !repository_name_pattern().is_match(trimmed,) {
        warn!("Repository name '{trimmed}' contains characters GitHub does not allow");
    }
    Some(trimmed.to_owned(),)
}

/// Resolves the organization name.
///
/// Lookup order: explicit flag, owner segment of `GITHUB_REPOSITORY`, the
/// organization document at `org_config`, `GITHUB_ORG`, then
/// [`DEFAULT_ORGANIZATION`]. Blank values are skipped at every step.
/// Environment access goes through `lookup` so callers control it.
///
/// # Examples
///
/// ```
/// use std::path::Path;
///
/// use repo_metrics::{OrganizationSource, resolve_organization};
///
/// let resolved = resolve_organization(None, Path::new("missing.yaml",), |key| {
///     (key == "GITHUB_REPOSITORY").then(|| "acme/reporting".to_string(),)
/// },);
/// assert_eq!(resolved.name, "acme");
/// assert_eq!(resolved.source, OrganizationSource::RepositoryEnv);
/// ```
pub fn resolve_organization<F,>(
    flag: Option<&str,>,
    org_config: &Path,
    lookup: F,
) -> ResolvedOrganization
where
    F: Fn(&str,) -> Option<String,>,
{
    let resolved = resolve_with(flag, org_config, &lookup,);
    match resolved.source {
        OrganizationSource::Default => warn!(
            "Could not determine organization name from flags, environment or config; using '{}'",
            resolved.name
        ),
        source => info!("Using organization '{}' from {}", resolved.name, source),
    }
    resolved
}

fn resolve_with<F,>(flag: Option<&str,>, org_config: &Path, lookup: &F,) -> ResolvedOrganization
where
    F: Fn(&str,) -> Option<String,>,
{
    let found = |name: String, source| ResolvedOrganization {
        name,
        source,
    };

    if let Some(name,) = non_blank(flag,) {
        return found(name, OrganizationSource::Flag,);
    }

    if let Some(owner,) = lookup(REPOSITORY_ENV,).as_deref().and_then(owner_from_repository,) {
        return found(owner, OrganizationSource::RepositoryEnv,);
    }

    if let Some(name,) = read_organization_document(org_config,) {
        return found(name, OrganizationSource::ConfigFile,);
    }

    if let Some(name,) = non_blank(lookup(ORGANIZATION_ENV,).as_deref(),) {
        return found(name, OrganizationSource::OrganizationEnv,);
    }

    found(DEFAULT_ORGANIZATION.to_owned(), OrganizationSource::Default,)
}

/// Extracts the owner segment from an `owner/repo` string.
fn owner_from_repository(value: &str,) -> Option<String,>
{
    let (owner, _,) = value.trim().split_once('/',)?;
    non_blank(Some(owner,),)
}

fn read_organization_document(path: &Path,) -> Option<String,>
{
    let contents = match fs::read_to_string(path,) {
        Ok(contents,) => contents,
        Err(error,) => {
            debug!("Organization config {} not used: {error}", path.display());
            return None;
        }
    };

    match serde_yaml::from_str::<Option<OrganizationDocument,>,>(&contents,) {
        Ok(document,) => non_blank(document.and_then(|doc| doc.organization,).as_deref(),),
        Err(error,) => {
            warn!("Ignoring malformed organization config {}: {error}", path.display());
            None
        }
    }
}

fn non_blank(value: Option<&str,>,) -> Option<String,>
{
    value.map(str::trim,).filter(|value| !value.is_empty(),).map(str::to_owned,)
}

#[cfg(test)]
mod tests
{
    use std::{collections::HashMap, fs, path::PathBuf};

    use tempfile::tempdir;

    use super::*;

    fn env(pairs: &[(&str, &str,)],) -> impl Fn(&str,) -> Option<String,>
    {
        let map: HashMap<String, String,> =
            pairs.iter().map(|(k, v,)| ((*k).to_string(), (*v).to_string(),),).collect();
        move |key| map.get(key,).cloned()
    }

    fn missing_path() -> PathBuf
    {
        PathBuf::from("/nonexistent/organization.yaml",)
    }

    #[test]
    fn parse_repositories_preserves_order_and_trims()
    {
        let repos = parse_repositories("repos:\n  - ' beta '\n  - alpha\n  - gamma.rs\n",)
            .expect("valid configuration",);
        assert_eq!(repos, vec!["beta", "alpha", "gamma.rs"]);
    }

    #[test]
    fn parse_repositories_without_key_is_empty()
    {
        assert!(parse_repositories("other: true\n").expect("valid yaml").is_empty());
        assert!(parse_repositories("").expect("empty document").is_empty());
    }

    #[test]
    fn parse_repositories_keeps_unusual_names()
    {
        let repos = parse_repositories("repos:\n  - alpha\n  - 'my repo'\n  - beta\n",)
            .expect("unusual names are not fatal",);
        assert_eq!(repos, vec!["alpha", "my repo", "beta"]);
    }

    #[test]
    fn parse_repositories_drops_blank_entries()
    {
        let repos =
            parse_repositories("repos:\n  - '   '\n  - alpha\n  - ''\n",).expect("valid yaml",);
        assert_eq!(repos, vec!["alpha"]);
    }

    #[test]
    fn parse_repositories_rejects_non_string_entries()
    {
        let error = parse_repositories("repos:\n  - alpha\n  - {name: beta}\n",).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
    }

    #[test]
    fn parse_repositories_reports_malformed_yaml()
    {
        let error = parse_repositories("repos: [unterminated\n",).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
    }

    #[test]
    fn load_repositories_reports_missing_file()
    {
        let error = load_repositories(Path::new("/nonexistent/repos.yaml",),).unwrap_err();
        assert!(matches!(error, Error::Io { .. }));
    }

    #[test]
    fn load_repositories_reads_file()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let path = temp.path().join("repos.yaml",);
        fs::write(&path, "repos:\n  - alpha\n  - beta\n",).expect("failed to write config",);

        let repos = load_repositories(&path,).expect("valid configuration",);
        assert_eq!(repos, vec!["alpha", "beta"]);
    }

    #[test]
    fn flag_takes_precedence()
    {
        let lookup = env(&[(REPOSITORY_ENV, "acme/tools",), (ORGANIZATION_ENV, "other",),],);
        let resolved = resolve_organization(Some("flagged",), &missing_path(), lookup,);
        assert_eq!(resolved.name, "flagged");
        assert_eq!(resolved.source, OrganizationSource::Flag);
    }

    #[test]
    fn blank_flag_falls_through_to_repository_env()
    {
        let lookup = env(&[(REPOSITORY_ENV, "acme/tools",),],);
        let resolved = resolve_organization(Some("  ",), &missing_path(), lookup,);
        assert_eq!(resolved.name, "acme");
        assert_eq!(resolved.source, OrganizationSource::RepositoryEnv);
    }

    #[test]
    fn repository_env_without_slash_is_ignored()
    {
        let lookup = env(&[(REPOSITORY_ENV, "acme",), (ORGANIZATION_ENV, "fallback",),],);
        let resolved = resolve_organization(None, &missing_path(), lookup,);
        assert_eq!(resolved.name, "fallback");
        assert_eq!(resolved.source, OrganizationSource::OrganizationEnv);
    }

    #[test]
    fn config_file_precedes_organization_env()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let path = temp.path().join("organization.yaml",);
        fs::write(&path, "organization: from-file\n",).expect("failed to write config",);

        let lookup = env(&[(ORGANIZATION_ENV, "from-env",),],);
        let resolved = resolve_organization(None, &path, lookup,);
        assert_eq!(resolved.name, "from-file");
        assert_eq!(resolved.source, OrganizationSource::ConfigFile);
    }

    #[test]
    fn malformed_config_file_is_skipped()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let path = temp.path().join("organization.yaml",);
        fs::write(&path, "organization: [oops\n",).expect("failed to write config",);

        let lookup = env(&[(ORGANIZATION_ENV, "from-env",),],);
        let resolved = resolve_organization(None, &path, lookup,);
        assert_eq!(resolved.name, "from-env");
    }

    #[test]
    fn falls_back_to_default()
    {
        let resolved = resolve_organization(None, &missing_path(), env(&[],),);
        assert_eq!(resolved.name, DEFAULT_ORGANIZATION);
        assert_eq!(resolved.source, OrganizationSource::Default);
    }

    #[test]
    fn owner_segment_extraction()
    {
        assert_eq!(owner_from_repository("acme/tools"), Some("acme".to_string()));
        assert_eq!(owner_from_repository("/tools"), None);
        assert_eq!(owner_from_repository("acme"), None);
    }
}
