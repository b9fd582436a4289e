//! Command-line entry point for the repository metrics reporter.
//!
//! Validates the access token, resolves the organization and repository
//! list, collects metrics sequentially and writes the markdown report.

use std::{
    env, io,
    path::{Path, PathBuf},
    process,
    time::Duration,
};

use chrono::Utc;
use clap::{ArgAction, Parser};
use repo_metrics::{
    CollectOptions, DEFAULT_ORGANIZATION_CONFIG, DEFAULT_REPORT_PATH, DEFAULT_REPOS_CONFIG,
    DEFAULT_SCAN_CONFIG_PATH, Error, GitHubHost, collect_metrics, load_repositories,
    render_report, resolve_organization, write_json, write_report,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line interface for collecting repository metrics.
#[derive(Debug, Parser,)]
#[command(
    name = "repo-metrics",
    version,
    about = "Collect GitHub repository activity metrics into a markdown report"
)]
struct Cli
{
    /// GitHub organization owning the repositories.
    #[arg(long = "org", value_name = "NAME")]
    org: Option<String,>,

    /// Path to the YAML document listing repositories.
    #[arg(long = "config", value_name = "PATH", default_value = DEFAULT_REPOS_CONFIG)]
    config: PathBuf,

    /// Path to the YAML document naming the organization.
    #[arg(long = "org-config", value_name = "PATH", default_value = DEFAULT_ORGANIZATION_CONFIG)]
    org_config: PathBuf,

    /// Destination of the markdown report.
    #[arg(long = "output", value_name = "PATH", default_value = DEFAULT_REPORT_PATH)]
    output: PathBuf,

    /// Optional destination for the raw records as JSON.
    #[arg(long = "json-output", value_name = "PATH")]
    json_output: Option<PathBuf,>,

    /// Location of the scan configuration inside each repository.
    #[arg(long = "scan-config", value_name = "PATH", default_value = DEFAULT_SCAN_CONFIG_PATH)]
    scan_config: String,

    /// Pause between repositories in milliseconds.
    #[arg(long = "delay-ms", value_name = "MS", default_value_t = 1000)]
    delay_ms: u64,

    /// Show a progress bar while collecting.
    #[arg(long = "progress", action = ArgAction::SetTrue)]
    progress: bool,

    /// Enable debug logging.
    #[arg(long = "debug", action = ArgAction::SetTrue)]
    debug: bool,

    /// GitHub access token.
    #[arg(long = "token", env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String,>,
}

/// Entry point that reports errors and sets the appropriate exit status.
#[tokio::main(flavor = "current_thread")]
async fn main()
{
    let cli = Cli::parse();
    init_tracing(cli.debug,);

    if let Err(error,) = run(cli,).await {
        eprintln!("Error: {}", error.to_display_string());
        process::exit(1,);
    }
}

fn init_tracing(debug: bool,)
{
    let filter = if debug {
        EnvFilter::new("info,repo_metrics=debug",)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),)
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter,)
        .with_writer(io::stderr,)
        .with_target(false,)
        .try_init();
}

/// Executes a full collection run.
///
/// # Errors
///
/// Returns batch-fatal errors: missing token, unusable repository list,
/// client initialization failure and report write failures.
async fn run(cli: Cli,) -> Result<(), Error,>
{
    let token = require_token(cli.token.as_deref(),)?;

    let organization =
        resolve_organization(cli.org.as_deref(), &cli.org_config, |key| env::var(key,).ok(),);
    info!("Collecting metrics for organization: {}", organization.name);

    let repositories = load_repository_list(&cli.config,)?;
    info!("Found {} repositories to process.", repositories.len());

    let host = GitHubHost::new(&token,)?;
    let options = CollectOptions {
        delay:            Duration::from_millis(cli.delay_ms,),
        scan_config_path: cli.scan_config,
        now:              Utc::now(),
        show_progress:    cli.progress,
    };

    let records = collect_metrics(&host, &organization.name, &repositories, &options,).await;

    let report = render_report(&records, options.now,);
    write_report(&cli.output, &report,)?;
    if let Some(path,) = cli.json_output.as_deref() {
        write_json(path, &records,)?;
    }

    info!("Metrics collection completed successfully.");
    Ok((),)
}

fn require_token(token: Option<&str,>,) -> Result<String, Error,>
{
    token
        .map(str::trim,)
        .filter(|token| !token.is_empty(),)
        .map(str::to_owned,)
        .ok_or_else(|| {
            Error::validation(
                "GitHub token not found. Set the GITHUB_TOKEN environment variable.",
            )
        },)
}

fn load_repository_list(path: &Path,) -> Result<Vec<String,>, Error,>
{
    let repositories = load_repositories(path,)?;
    if repositories.is_empty() {
        return Err(Error::validation(format!(
            "no repositories found in configuration file {}",
            path.display()
        ),),);
    }
    Ok(repositories,)
}

#[cfg(test)]
mod tests
{
    use std::{fs, path::Path};

    use clap::Parser;
    use tempfile::tempdir;

    use super::{Cli, load_repository_list, require_token};

    #[test]
    fn cli_uses_defaults()
    {
        let cli = Cli::try_parse_from([env!("CARGO_PKG_NAME"), "--token", "abc",],)
            .expect("failed to parse CLI",);

        assert!(cli.org.is_none());
        assert_eq!(cli.config, Path::new("config/repos.yaml"));
        assert_eq!(cli.org_config, Path::new("config/organization.yaml"));
        assert_eq!(cli.output, Path::new("metrics_report.md"));
        assert_eq!(cli.scan_config, ".github/security-scans.yaml");
        assert_eq!(cli.delay_ms, 1000);
        assert!(!cli.debug);
        assert!(!cli.progress);
        assert!(cli.json_output.is_none());
    }

    #[test]
    fn cli_accepts_overrides()
    {
        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "--org",
            "acme",
            "--config",
            "custom/repos.yaml",
            "--output",
            "reports/out.md",
            "--delay-ms",
            "0",
            "--debug",
            "--token",
            "abc",
        ],)
        .expect("failed to parse CLI",);

        assert_eq!(cli.org.as_deref(), Some("acme"));
        assert_eq!(cli.config, Path::new("custom/repos.yaml"));
        assert_eq!(cli.output, Path::new("reports/out.md"));
        assert_eq!(cli.delay_ms, 0);
        assert!(cli.debug);
    }

    #[test]
    fn require_token_rejects_missing_and_blank()
    {
        for candidate in [None, Some(""), Some("   ")] {
            let error = require_token(candidate,).expect_err("expected validation error",);
            match error {
                repo_metrics::Error::Validation {
                    message,
                } => assert!(message.contains("GITHUB_TOKEN")),
                other => panic!("unexpected error variant: {other:?}"),
            }
        }
        assert_eq!(require_token(Some(" ghp_abc ")).expect("token"), "ghp_abc");
    }

    #[test]
    fn empty_repository_list_is_fatal()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let path = temp.path().join("repos.yaml",);
        fs::write(&path, "repos: []\n",).expect("failed to write config",);

        let error = load_repository_list(&path,).expect_err("expected validation error",);
        match error {
            repo_metrics::Error::Validation {
                message,
            } => assert!(message.starts_with("no repositories found")),
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn repository_list_is_loaded_in_order()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let path = temp.path().join("repos.yaml",);
        fs::write(&path, "repos:\n  - beta\n  - 'my repo'\n  - alpha\n",)
            .expect("failed to write config",);

        let repos = load_repository_list(&path,).expect("valid config",);
        assert_eq!(repos, vec!["beta", "my repo", "alpha"]);
    }
}
