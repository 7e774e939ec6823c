use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use common::CodeSubmission;
use executor::challenge_file::ChallengeFile;
use executor::{ExecutionBackend, ExecutionOrchestrator, ExecutorAppConfig, InMemoryStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "executor")]
#[command(about = "Run code submissions against challenge test cases", long_about = None)]
struct Cli {
    /// Config file, without extension
    #[arg(long, env = "EXECUTOR_CONFIG", default_value = executor::config::DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a source file against a challenge and print the result as JSON
    Run {
        /// Challenge definition (TOML)
        #[arg(short, long)]
        challenge: PathBuf,

        /// Source file to execute
        #[arg(short, long)]
        source: PathBuf,

        /// Language of the source file (e.g. python, javascript)
        #[arg(short, long)]
        language: String,

        /// Attempt id recorded on the submission
        #[arg(long, default_value = "local")]
        attempt_id: String,
    },

    /// Check the execution backend and print a health report
    Health,

    /// List languages the execution backend accepts
    Languages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ExecutorAppConfig::load_from(&cli.config).context("Failed to load config")?;

    match cli.command {
        Commands::Run {
            challenge,
            source,
            language,
            attempt_id,
        } => run(&config, &challenge, &source, &language, &attempt_id).await,
        Commands::Health => health(&config).await,
        Commands::Languages => languages(&config).await,
    }
}

async fn run(
    config: &ExecutorAppConfig,
    challenge_path: &Path,
    source_path: &Path,
    language: &str,
    attempt_id: &str,
) -> anyhow::Result<()> {
    let challenge = ChallengeFile::load(challenge_path).context("Failed to load challenge")?;
    let code = std::fs::read_to_string(source_path)
        .with_context(|| format!("Failed to read source file {}", source_path.display()))?;

    let store = Arc::new(InMemoryStore::new());
    challenge.seed(&store, attempt_id).await;

    let backend = config
        .build_backend()
        .context("Failed to initialize execution backend")?;
    let orchestrator = ExecutionOrchestrator::new(backend, store.clone(), store)
        .with_limits(config.judge.limits);

    info!(
        challenge_id = %challenge.id,
        mode = %orchestrator.service_info().mode,
        "Running submission"
    );

    let result = orchestrator
        .execute(CodeSubmission::new(attempt_id, code, language))
        .await
        .context("Execution rejected")?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn health(config: &ExecutorAppConfig) -> anyhow::Result<()> {
    let backend = config
        .build_backend()
        .context("Failed to initialize execution backend")?;
    let store = Arc::new(InMemoryStore::new());
    let orchestrator = ExecutionOrchestrator::new(backend, store.clone(), store);

    let report = orchestrator.health_report().await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.healthy {
        bail!("Execution backend is unhealthy");
    }
    Ok(())
}

async fn languages(config: &ExecutorAppConfig) -> anyhow::Result<()> {
    let backend = config
        .build_backend()
        .context("Failed to initialize execution backend")?;
    let languages = backend
        .languages()
        .await
        .context("Failed to list judge languages")?;

    println!("{}", serde_json::to_string_pretty(&languages)?);
    Ok(())
}
