//! Main entry point for the PaSe patch search client

// Internal modules
mod config;
mod format;
mod handlers;
mod input;
mod render;

// Internal imports (std, crate)
use crate::config::CliOverrides;
use crate::format::OutputFormat;
use crate::input::PatchInput;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

// External imports (alphabetized)
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pase_config::{ClientConfig, ResponseShape};
use pase_search::{
    HttpSearchClient, QueryMode, QueryPlan, SearchClient, SearchOrchestrator, SearchSession,
};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// PaSe patch search client
///
/// Asks a PaSe search service where a patch applies, where it is already
/// applied, and where its content was copied to.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the PaSe search service
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Backend protocol revision (multi-query or single-query)
    #[arg(long, global = true)]
    shape: Option<ResponseShape>,

    /// Run follow-up queries one after another instead of concurrently
    #[arg(long, global = true)]
    sequential: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Log directory path (defaults to OS-specific location)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Optional configuration file path (TOML format)
    #[arg(long, short = 'c', global = true)]
    config_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search once and print the outcome
    Search {
        /// Patch file; `-` or nothing reads standard input
        file: Option<PathBuf>,

        /// Patch text given directly on the command line
        #[arg(long, conflicts_with = "file")]
        patch: Option<String>,

        /// Run a single query (patch-target, applied-patch, by-content or combined)
        #[arg(long, conflicts_with_all = ["by_content", "applied_patch"])]
        only: Option<QueryMode>,

        /// Shorthand for `--only by-content`
        #[arg(long, conflicts_with = "applied_patch")]
        by_content: bool,

        /// Shorthand for `--only applied-patch`
        #[arg(long)]
        applied_patch: bool,
    },

    /// Search again every time the patch file changes
    Watch {
        /// Patch file to watch
        file: PathBuf,

        /// Quiet period in milliseconds before a burst of edits is resubmitted
        #[arg(long, default_value = "500")]
        debounce: u64,

        /// Abandon in-flight queries as soon as the file changes again
        #[arg(long)]
        cancel_superseded: bool,
    },
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        let cancel_superseded = match self.command {
            Command::Watch {
                cancel_superseded: true,
                ..
            } => Some(true),
            _ => None,
        };
        CliOverrides {
            api_url: self.api_url.clone(),
            timeout_seconds: self.timeout,
            shape: self.shape,
            concurrent_followups: self.sequential.then_some(false),
            cancel_superseded,
        }
    }
}

impl Command {
    /// The one query a single-mode search asks for; `None` runs the configured shape
    const fn single_mode(&self) -> Option<QueryMode> {
        match self {
            Self::Search { only: Some(mode), .. } => Some(*mode),
            Self::Search { by_content: true, .. } => Some(QueryMode::ByContent),
            Self::Search {
                applied_patch: true,
                ..
            } => Some(QueryMode::AppliedPatch),
            Self::Search { .. } | Self::Watch { .. } => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    pase_common::initialize_environment();
    let args = Args::parse();

    let config = config::load(args.config_file.as_deref(), &args.overrides())?;

    let log_dir = args.log_dir.clone().unwrap_or_else(get_default_log_dir);
    // Keep both guards alive until main() returns so buffered log lines are flushed
    let (_file_guard, _stderr_guard) = init_logging(&log_dir, &config)?;

    tracing::debug!(
        api_url = %config.api.url,
        shape = %config.search.shape,
        "Configuration loaded"
    );

    let client: Arc<dyn SearchClient> =
        Arc::new(HttpSearchClient::new(&config.api).context("Failed to create HTTP client")?);
    let orchestrator = match args.command.single_mode() {
        Some(mode) => SearchOrchestrator::new(client, QueryPlan::only(mode)),
        None => SearchOrchestrator::from_config(client, &config.search),
    };
    let session =
        SearchSession::new(orchestrator).with_cancel_superseded(config.search.cancel_superseded);

    let renderer = args.format.renderer();
    let mut stdout = std::io::stdout();

    match args.command {
        Command::Search { file, patch, .. } => {
            let input = PatchInput::from_args(file, patch);
            handlers::search::run(&session, &input, renderer.as_ref(), &mut stdout).await
        }
        Command::Watch { file, debounce, .. } => {
            let stop = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl+C: {e}");
                }
            };
            handlers::watch::run(
                &session,
                &file,
                Duration::from_millis(debounce),
                renderer.as_ref(),
                &mut stdout,
                stop,
            )
            .await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Dual logging: daily rolling JSON file plus stderr, both non-blocking
fn init_logging(log_dir: &Path, config: &ClientConfig) -> Result<(WorkerGuard, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory '{}'", log_dir.display()))?;

    // 1. File logger (daily rotation, async non-blocking)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "pase.log");
    let (file_writer, file_guard): (NonBlocking, WorkerGuard) =
        tracing_appender::non_blocking(file_appender);

    // 2. Stderr logger (async non-blocking)
    let (stderr_writer, stderr_guard): (NonBlocking, WorkerGuard) =
        tracing_appender::non_blocking(std::io::stderr());

    // 3. Combine writers using .and()
    let multi_writer = file_writer.and(stderr_writer);

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.tracing_level));

    tracing_subscriber::fmt()
        .json()
        .with_writer(multi_writer)
        .with_env_filter(filter)
        .init();

    Ok((file_guard, stderr_guard))
}

/// Get the default log directory based on the operating system
fn get_default_log_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        // Windows: %LOCALAPPDATA%\pase\logs
        if let Some(local_app_data) = std::env::var_os("LOCALAPPDATA") {
            PathBuf::from(local_app_data).join("pase").join("logs")
        } else {
            PathBuf::from("logs")
        }
    }

    #[cfg(target_os = "macos")]
    {
        // macOS: ~/Library/Logs/pase
        if let Some(home) = dirs::home_dir() {
            home.join("Library").join("Logs").join("pase")
        } else {
            PathBuf::from("logs")
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        // Try /var/log first (if we have permissions), otherwise use user directory
        let system_log_dir = Path::new("/var/log/pase");

        if system_log_dir.exists() && is_writable(system_log_dir) {
            system_log_dir.to_path_buf()
        } else if let Some(data_dir) = dirs::data_dir() {
            // ~/.local/share/pase/logs
            data_dir.join("pase").join("logs")
        } else if let Some(home) = dirs::home_dir() {
            home.join(".pase").join("logs")
        } else {
            PathBuf::from("logs")
        }
    }
}

/// Check if a directory is writable
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn is_writable(path: &Path) -> bool {
    tempfile::tempfile_in(path).is_ok()
}
