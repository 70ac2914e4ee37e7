use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tidyscan_rs::analyzer::TidyScan;
use tidyscan_rs::config::Config;
use tidyscan_rs::github::{GithubContext, GithubReporter};
use tidyscan_rs::report;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Analyze a repository with clang-tidy.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the git repository to analyze.
    repository_path: PathBuf,

    /// Path to the JSON config file.
    #[arg(short, long)]
    config: PathBuf,

    /// Output raw JSON.
    /// Useful for integrating with other tools or CI pipelines.
    #[arg(long)]
    json: bool,

    /// Token used to publish a check run. Reporting is skipped without it.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Repository (`owner/name`) the check run belongs to.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    github_repository: Option<String>,

    /// Commit the check run is attached to.
    #[arg(long, env = "GITHUB_SHA")]
    github_sha: Option<String>,
}

impl Cli {
    fn github_context(&self) -> Option<GithubContext> {
        let token = self.github_token.clone()?;
        match (&self.github_repository, &self.github_sha) {
            (Some(repository), Some(sha)) => Some(GithubContext {
                repository: repository.clone(),
                sha: sha.clone(),
                token,
            }),
            _ => {
                warn!("GitHub token set but repository or sha missing, not reporting");
                None
            }
        }
    }
}

/// Main entry point of the application.
///
/// Parses arguments, runs the scan, prints the report and optionally
/// publishes it as a GitHub check run.
fn main() -> Result<()> {
    // Parse command line arguments; GitHub settings may also come from the environment.
    let cli = Cli::parse();

    // Logs go to stderr so the report on stdout stays machine readable.
    // RUST_LOG overrides the default level.
    let default_level = if cli.json { "warn" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // A broken config is fatal before anything runs.
    let config = Config::load(&cli.config)?;
    let scan = TidyScan::new(config)?;
    let result = scan.analyze(&cli.repository_path)?;

    // Print the report in the requested format.
    let mut stdout = io::stdout().lock();
    if cli.json {
        report::write_json(&mut stdout, &result)?;
    } else {
        report::write_human(&mut stdout, &result)?;
    }

    // Reporting failures are logged but do not change the exit status.
    if let Some(ctx) = cli.github_context() {
        if let Err(e) = GithubReporter::default().report(&ctx, &result.findings) {
            error!("Failed to report check run: {}", e);
        }
    }

    Ok(())
}
