//! ZigZag CLI
//!
//! Uploads a JUnit XML report to qTest Manager and exits with a code that
//! tells CI what went wrong:
//!
//! | Code | Meaning                                  |
//! |------|------------------------------------------|
//! | 0    | every result and link uploaded           |
//! | 1    | unexpected error                         |
//! | 2    | the report could not be read or parsed   |
//! | 3    | missing or invalid configuration         |
//! | 4    | upload finished with failed jobs or cases |

mod config;
mod summary;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zigzag_core::{ErrorKind, ZigZagError};
use zigzag_uploader::{Config, GitContext, Orchestrator, RunSummary};

use crate::config::Overrides;
use crate::summary::print_summary;

const EXIT_GENERAL: u8 = 1;
const EXIT_PARSE: u8 = 2;
const EXIT_CONFIG: u8 = 3;
const EXIT_PARTIAL: u8 = 4;

#[derive(Parser)]
#[command(name = "zigzag")]
#[command(about = "Upload JUnit XML test results to qTest Manager", long_about = None)]
struct Cli {
    /// JUnit XML report to upload
    input: PathBuf,

    /// Configuration file (defaults to ./zigzag.toml when present)
    #[arg(short, long, env = "ZIGZAG_CONFIG")]
    config: Option<PathBuf>,

    /// qTest base URL
    #[arg(long, env = "ZIGZAG_BASE_URL")]
    base_url: Option<String>,

    /// qTest API token
    #[arg(long, env = "ZIGZAG_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Target project ID
    #[arg(long, env = "ZIGZAG_PROJECT_ID")]
    project_id: Option<u64>,

    /// Module every uploaded case is filed under
    #[arg(long)]
    root_module: Option<String>,

    /// Base name of the created test run
    #[arg(long)]
    run_name: Option<String>,

    /// Max parallel upload requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// Git branch to tag the run with
    #[arg(long)]
    branch: Option<String>,

    /// Git commit to tag the run with
    #[arg(long)]
    commit: Option<String>,

    /// GitHub repository (owner/repo) for bare #N references
    #[arg(long)]
    repository: Option<String>,

    /// Debug logging and per-job detail in the summary
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            config_path: self.config.clone(),
            base_url: self.base_url.clone(),
            api_token: self.token.clone(),
            project_id: self.project_id,
            root_module: self.root_module.clone(),
            run_name: self.run_name.clone(),
            concurrency: self.concurrency,
            branch: self.branch.clone(),
            commit: self.commit.clone(),
            repository: self.repository.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match upload(&cli).await {
        Ok(summary) => {
            print_summary(&summary, cli.verbose);
            if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_PARTIAL)
            }
        }
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "zigzag=debug" } else { "zigzag=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Parses the report, validates configuration and runs the upload
///
/// The report is parsed before configuration is loaded so a broken report is
/// reported as such even when the configuration is also incomplete.
async fn upload(cli: &Cli) -> Result<RunSummary> {
    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    let source = cli.input.display().to_string();
    let log = zigzag_junit::parse_test_log(&bytes, &source).map_err(ZigZagError::from)?;
    info!(
        "Parsed {}: {} suite(s), {} case(s)",
        source,
        log.suites().len(),
        log.counts().total()
    );

    let overrides = cli.overrides();
    let mut config = Config::load(overrides.config_path.as_deref())?;
    overrides.apply(&mut config);

    let git = GitContext::discover(&config.git, &working_dir(&cli.input));
    let orchestrator = Orchestrator::connect(config)?.with_git(git);
    let run_name = orchestrator.run_name_for(&bytes);
    debug!("Run name: {}", run_name);

    let summary = orchestrator.with_run_name(run_name).run(&log).await?;
    Ok(summary)
}

/// Directory whose git checkout describes the report
fn working_dir(input: &Path) -> PathBuf {
    std::env::current_dir()
        .ok()
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Maps an error to its exit code class
fn exit_code(error: &anyhow::Error) -> u8 {
    if let Some(error) = error.downcast_ref::<ZigZagError>() {
        return match error.kind() {
            ErrorKind::Parsing => EXIT_PARSE,
            ErrorKind::Config => EXIT_CONFIG,
            ErrorKind::RequiredProperty | ErrorKind::General => EXIT_GENERAL,
        };
    }

    if error.downcast_ref::<std::io::Error>().is_some() {
        return EXIT_PARSE;
    }

    EXIT_GENERAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use zigzag_core::ParsingError;

    #[test]
    fn test_exit_code_classes() {
        let parse: anyhow::Error =
            ZigZagError::from(ParsingError::new("testcase", 3, "bad")).into();
        assert_eq!(exit_code(&parse), EXIT_PARSE);

        let config: anyhow::Error = ZigZagError::config("missing project_id").into();
        assert_eq!(exit_code(&config), EXIT_CONFIG);

        let general: anyhow::Error = ZigZagError::general("boom").into();
        assert_eq!(exit_code(&general), EXIT_GENERAL);

        let io = std::fs::read("/nonexistent/report.xml")
            .context("Failed to read /nonexistent/report.xml")
            .unwrap_err();
        assert_eq!(exit_code(&io), EXIT_PARSE);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "zigzag",
            "report.xml",
            "--project-id",
            "12",
            "--concurrency",
            "2",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.input, PathBuf::from("report.xml"));
        assert_eq!(cli.project_id, Some(12));
        assert_eq!(cli.overrides().concurrency, Some(2));
        assert!(cli.verbose);
    }

    #[tokio::test]
    async fn test_missing_project_id_is_config_failure() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.xml");
        std::fs::write(
            &report,
            r#"<testsuite name="s"><testcase classname="a" name="b"/></testsuite>"#,
        )
        .unwrap();
        let config = dir.path().join("zigzag.toml");
        std::fs::write(
            &config,
            "base_url = \"https://qtest.example.com\"\napi_token = \"t\"\n",
        )
        .unwrap();

        let cli = Cli {
            input: report,
            config: Some(config),
            base_url: None,
            token: None,
            project_id: None,
            root_module: None,
            run_name: None,
            concurrency: None,
            branch: None,
            commit: None,
            repository: None,
            verbose: false,
        };

        let err = upload(&cli).await.unwrap_err();
        assert_eq!(exit_code(&err), EXIT_CONFIG);
    }
}
