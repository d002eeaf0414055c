//! CLI for perfwatch.
//!
//! This crate provides the `perfwatch` command: `run` measures, compares and
//! publishes; `status` shows what a run would do without running anything.
//!
//! Every CI signal and credential is read once here, from flags or their
//! environment fallbacks, and handed to the pipeline as plain values.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod logging;
pub mod pipeline;

use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use perfwatch_adapters::upstream::{airtable, github};
use perfwatch_adapters::{AirtableStore, GithubCommentPoster};
use perfwatch_core::{CiContext, Configuration, EnvSignals, Publisher, DEFAULT_CONFIG_FILE};
use perfwatch_report::TableOptions;
use perfwatch_runner::read_report_json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use crate::logging::LogFormat;
use crate::pipeline::RunOptions;

/// perfwatch CLI.
#[derive(Parser, Debug)]
#[command(name = "perfwatch")]
#[command(author, version, about = "Report performance deltas of CI measurements", long_about = None)]
pub struct Cli {
    /// Subcommand to run (default: run).
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Measurement configuration file.
    #[arg(short, long, global = true, env = "PERFWATCH_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Branch whose runs define the new baseline.
    #[arg(long, global = true, env = "PERFWATCH_PRIMARY_BRANCH", default_value = "master")]
    pub primary_branch: String,

    /// CI environment signals.
    #[command(flatten)]
    pub signals: SignalArgs,

    /// Remote collaborator settings.
    #[command(flatten)]
    pub remote: RemoteArgs,

    /// Verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// JSON report path: written by `run`, summarised by `status`.
    #[arg(long, global = true, env = "PERFWATCH_JSON")]
    pub json: Option<PathBuf>,

    /// Disable colours in the terminal table.
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,
}

/// Available CLI commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run all measurements, print the report and publish it.
    Run,

    /// Show configuration, CI context and the action a run would take.
    Status,
}

/// CI environment signals.
#[derive(Args, Debug, Clone, Default)]
pub struct SignalArgs {
    /// Treat this as a CI run.
    #[arg(
        long,
        global = true,
        env = "TRAVIS",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value = "false"
    )]
    pub ci: bool,

    #[arg(
        long = "ci-generic",
        hide = true,
        env = "CI",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        default_value = "false"
    )]
    #[doc(hidden)]
    pub ci_generic: bool,

    /// Pull request number; empty or "false" for direct-branch runs.
    #[arg(long, global = true, env = "TRAVIS_PULL_REQUEST")]
    pub pull_request: Option<String>,

    /// Source branch of the pull request.
    #[arg(long, global = true, env = "TRAVIS_PULL_REQUEST_BRANCH")]
    pub pull_request_branch: Option<String>,

    /// Base or direct branch.
    #[arg(long, global = true, env = "TRAVIS_BRANCH")]
    pub branch: Option<String>,

    /// Repository identity (owner/name) of the pull request.
    #[arg(long, global = true, env = "TRAVIS_PULL_REQUEST_SLUG")]
    pub pull_request_slug: Option<String>,

    /// Repository identity (owner/name) of the build.
    #[arg(long, global = true, env = "TRAVIS_REPO_SLUG")]
    pub repository: Option<String>,
}

impl SignalArgs {
    /// Whether any CI signal is set.
    pub fn is_ci(&self) -> bool {
        self.ci || self.ci_generic
    }

    /// Signals for context resolution.
    pub fn env_signals(&self) -> EnvSignals {
        EnvSignals {
            pull_request: self.pull_request.clone(),
            pull_request_branch: self.pull_request_branch.clone(),
            branch: self.branch.clone(),
            pull_request_slug: self.pull_request_slug.clone(),
            repository: self.repository.clone(),
        }
    }
}

/// Remote collaborator settings and credentials.
#[derive(Args, Debug, Clone, Default)]
pub struct RemoteArgs {
    /// Airtable base holding the measurement history.
    #[arg(long, global = true, env = "AIRTABLE_SPACE")]
    pub airtable_space: Option<String>,

    /// Airtable API token.
    #[arg(long, global = true, env = "AIRTABLE_TOKEN", hide_env_values = true)]
    pub airtable_token: Option<String>,

    /// Airtable table name.
    #[arg(long, global = true, env = "AIRTABLE_TABLE", default_value = airtable::DEFAULT_TABLE)]
    pub airtable_table: String,

    /// Airtable API root.
    #[arg(long, global = true, env = "AIRTABLE_API_URL", default_value = airtable::DEFAULT_API_URL)]
    pub airtable_url: String,

    /// GitHub token used to comment on pull requests.
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// GitHub API root.
    #[arg(long, global = true, env = "GITHUB_API_URL", default_value = github::DEFAULT_API_URL)]
    pub github_url: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RemoteArgs {
    /// Airtable base and token, when both are set.
    pub fn airtable_credentials(&self) -> Option<(&str, &str)> {
        Some((non_empty(&self.airtable_space)?, non_empty(&self.airtable_token)?))
    }

    /// GitHub token, when set.
    pub fn github_token(&self) -> Option<&str> {
        non_empty(&self.github_token)
    }
}

impl Cli {
    /// The command to run, defaulting to `run`.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }

    /// Local output settings for `run`.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            table: TableOptions {
                color: !self.no_color,
            },
            json_output: self.json.clone(),
        }
    }

    /// Resolve the CI context from the parsed signals.
    pub fn context(&self) -> CiContext {
        CiContext::resolve(&self.signals.env_signals())
    }

    /// Build the publisher with every collaborator whose credentials are set.
    pub fn publisher(&self) -> anyhow::Result<Publisher> {
        let mut publisher = Publisher::new(self.primary_branch.clone()).ci(self.signals.is_ci());

        if let Some((space, token)) = self.remote.airtable_credentials() {
            let store = AirtableStore::new(space, token)
                .context("failed to build Airtable client")?
                .with_api_url(self.remote.airtable_url.clone())
                .with_table(self.remote.airtable_table.clone());
            publisher = publisher.with_store(Arc::new(store));
        }

        if let Some(token) = self.remote.github_token() {
            let poster = GithubCommentPoster::new(token)
                .context("failed to build GitHub client")?
                .with_api_url(self.remote.github_url.clone());
            publisher = publisher.with_comments(Arc::new(poster));
        }

        Ok(publisher)
    }
}

/// Load `.env` from the working directory. A missing file is fine; a
/// malformed one is an error.
pub fn load_env_file() -> anyhow::Result<()> {
    env_file_outcome(dotenvy::dotenv())
}

fn env_file_outcome<T>(result: dotenvy::Result<T>) -> anyhow::Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(anyhow::Error::new(e).context("failed to load .env")),
    }
}

/// Failures after the table was printed say so, since the local report is
/// still valid.
fn with_report_note(error: perfwatch_core::Error) -> anyhow::Error {
    if error.is_fatal_before_report() {
        anyhow::Error::new(error)
    } else {
        anyhow::Error::new(error).context("publishing failed after the local report was printed")
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "missing"
    }
}

/// Print what a run would do.
fn status(cli: &Cli) -> anyhow::Result<()> {
    let configuration = Configuration::load(&cli.config)?;
    let context = cli.context();
    let publisher = cli.publisher()?;

    println!("perfwatch {}", env!("CARGO_PKG_VERSION"));
    println!(
        "\nConfiguration: {} ({} commands)",
        cli.config.display(),
        configuration.len()
    );
    for spec in configuration.commands() {
        println!("  - {}: {}", spec.name, spec.command);
    }
    println!("\nContext: {}", context);
    println!("CI: {}", if cli.signals.is_ci() { "yes" } else { "no" });
    println!("Primary branch: {}", publisher.primary_branch());
    println!(
        "Credentials: baseline store {}, comment API {}",
        yes_no(cli.remote.airtable_credentials().is_some()),
        yes_no(cli.remote.github_token().is_some())
    );
    println!("Action: {}", publisher.plan(&context));

    if let Some(path) = cli.json.as_ref().filter(|p| p.exists()) {
        match read_report_json(path) {
            Ok(report) => println!(
                "\nLast report: {} ({} rows, generated {})",
                path.display(),
                report.rows.len(),
                report.generated_at.to_rfc3339()
            ),
            Err(e) => warn!(path = %path.display(), error = %e, "Unreadable JSON report"),
        }
    }
    Ok(())
}

/// Run the CLI with the given arguments.
///
/// # Returns
///
/// Returns `Ok(())` on success, or the first error of the run. For
/// persistence and comment failures the local report has already been
/// printed.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);

    match cli.command() {
        Commands::Run => {
            let configuration = Configuration::load(&cli.config)?;
            let context = cli.context();
            let publisher = cli.publisher()?;
            let options = cli.run_options();

            let mut stdout = std::io::stdout().lock();
            let outcome =
                pipeline::execute(&configuration, &context, &publisher, &options, &mut stdout)
                    .await
                    .map_err(with_report_note)?;
            eprintln!("{}", outcome.publication);
            Ok(())
        }
        Commands::Status => status(&cli),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfwatch_core::{Action, LocalReason};

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["perfwatch"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_default_command_is_run() {
        let cli = parse(&["--config", "custom.yml"]);
        assert!(matches!(cli.command(), Commands::Run));
        assert_eq!(cli.config, PathBuf::from("custom.yml"));
    }

    #[test]
    fn test_output_flags_apply_without_subcommand() {
        let cli = parse(&["--no-color", "--json", "out/report.json"]);
        let options = cli.run_options();
        assert!(!options.table.color);
        assert_eq!(options.json_output, Some(PathBuf::from("out/report.json")));

        let cli = parse(&["run", "--no-color"]);
        assert!(!cli.run_options().table.color);
    }

    #[test]
    fn test_env_file_missing_is_ignored_but_malformed_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(env_file_outcome(dotenvy::from_path(dir.path().join(".env"))).is_ok());

        let broken = dir.path().join("broken.env");
        std::fs::write(&broken, "PERFWATCH_TEST_BROKEN='unterminated\n").unwrap();
        let err = env_file_outcome(dotenvy::from_path(&broken)).unwrap_err();
        assert!(format!("{:#}", err).starts_with("failed to load .env"));
    }

    #[test]
    fn test_report_note_only_for_late_failures() {
        let late = with_report_note(perfwatch_core::Error::comment_post("403 Forbidden"));
        assert!(format!("{:#}", late).starts_with("publishing failed after the local report"));
        assert!(format!("{:#}", late).contains("403 Forbidden"));

        let early = with_report_note(perfwatch_core::Error::baseline_fetch("offline"));
        assert!(!format!("{:#}", early).contains("publishing failed"));
    }

    #[test]
    fn test_status_reads_last_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("metrics.yml");
        std::fs::write(&config, "commands:\n  first: \"echo 1\"\n").unwrap();
        let report = dir.path().join("report.json");
        perfwatch_runner::write_report_json(
            &perfwatch_runner::RunReport::new(Vec::new(), Vec::new()),
            &report,
        )
        .unwrap();

        let cli = parse(&[
            "status",
            "--config",
            config.to_str().unwrap(),
            "--json",
            report.to_str().unwrap(),
        ]);
        assert!(status(&cli).is_ok());
    }

    #[test]
    fn test_pull_request_flags_resolve_context() {
        let cli = parse(&[
            "run",
            "--pull-request",
            "42",
            "--pull-request-branch",
            "feat",
            "--branch",
            "main",
            "--pull-request-slug",
            "o/r",
        ]);

        let ctx = cli.context();
        assert!(ctx.is_pull_request());
        assert_eq!(ctx.branch(), "feat");
        assert_eq!(ctx.pull_request().unwrap().id, "42");
        assert_eq!(ctx.repository(), Some("o/r"));
    }

    #[test]
    fn test_ci_flag_without_value() {
        let cli = parse(&["--ci", "status"]);
        assert!(cli.signals.is_ci());
        assert!(matches!(cli.command(), Commands::Status));
    }

    #[test]
    fn test_credentials_require_non_empty_values() {
        let cli = parse(&["--airtable-space", "app1", "--airtable-token", " ", "--github-token", ""]);
        assert!(cli.remote.airtable_credentials().is_none());
        assert!(cli.remote.github_token().is_none());

        let cli = parse(&["--airtable-space", "app1", "--airtable-token", "key"]);
        assert_eq!(cli.remote.airtable_credentials(), Some(("app1", "key")));
    }

    #[test]
    fn test_publisher_without_credentials_stays_local() {
        let cli = parse(&[
            "--ci",
            "--airtable-space",
            "",
            "--airtable-token",
            "",
            "--github-token",
            "",
            "--pull-request",
            "",
            "--branch",
            "master",
            "--repository",
            "o/r",
        ]);
        let publisher = cli.publisher().unwrap();
        assert_eq!(
            publisher.plan(&cli.context()),
            Action::LocalOnly(LocalReason::MissingCredential(
                perfwatch_core::Credential::BaselineStore
            ))
        );
    }

    #[test]
    fn test_primary_branch_with_store_persists() {
        let cli = parse(&[
            "--ci",
            "--airtable-space",
            "app1",
            "--airtable-token",
            "key",
            "--pull-request",
            "false",
            "--branch",
            "trunk",
            "--primary-branch",
            "trunk",
            "--repository",
            "o/r",
        ]);
        let publisher = cli.publisher().unwrap();
        assert_eq!(
            publisher.plan(&cli.context()),
            Action::PersistBaseline {
                repository: "o/r".to_string()
            }
        );
    }
}
