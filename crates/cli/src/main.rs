//! forgesync command-line synchronizer.
//!
//! Mirrors repositories between a self-hosted Gitea instance and GitHub
//! according to a JSON configuration: one-shot by default, an ad-hoc single
//! pair with `--repo`, or a fixed-interval loop with `--continuous`.

mod scheduler;
mod signals;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use forgesync_core::config::{RepoPair, SyncConfig};
use forgesync_core::engine::{never_stop, SyncEngine};
use forgesync_core::hosts::HttpResolver;
use forgesync_core::process::SystemRunner;

/// Bidirectional Gitea ↔ GitHub repository synchronizer.
#[derive(Parser, Debug)]
#[command(
    name = "forgesync",
    version,
    about = "Bidirectional Gitea \u{2194} GitHub repository synchronizer"
)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, env = "CONFIG_FILE", default_value = "sync_config.json")]
    config: PathBuf,

    /// Sync a single ad-hoc pair (`owner/name` or `source:target`),
    /// bypassing the configured pair list.
    #[arg(short, long, value_name = "SPEC")]
    repo: Option<String>,

    /// Log intended git operations without executing them.
    #[arg(short, long)]
    dry_run: bool,

    /// Repeat full sync cycles at the configured interval until interrupted.
    #[arg(short = 'C', long)]
    continuous: bool,

    /// Write a template configuration file and exit.
    #[arg(short, long)]
    init: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = std::env::var("LOG_FILE").unwrap_or_else(|_| "sync.log".to_string());
    let _log_guard = match init_logging(Path::new(&log_file)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging to {}: {:#}", log_file, e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    if cli.init {
        SyncConfig::write_template(&cli.config)
            .with_context(|| format!("failed to write template to {}", cli.config.display()))?;
        println!(
            "Wrote configuration template to {}. Edit it with your credentials and repositories.",
            cli.config.display()
        );
        return Ok(true);
    }

    let config = SyncConfig::load(&cli.config).context("failed to load configuration")?;

    let dry_run = cli.dry_run || parse_dry_run(std::env::var("DRY_RUN").ok().as_deref());
    if dry_run {
        info!("running in dry-run mode");
    }
    let workspace =
        std::env::var("SYNC_WORKSPACE").unwrap_or_else(|_| "./sync_workspace".to_string());

    let resolver = HttpResolver::new(&config);
    let engine = SyncEngine::new(config, SystemRunner, resolver, workspace, dry_run);

    // Ad-hoc single pair, bypassing the configured list.
    if let Some(spec) = &cli.repo {
        let pair = RepoPair::from_spec(spec);
        let outcome = engine.sync_pair(&pair).await;
        return Ok(outcome.is_success());
    }

    if cli.continuous {
        let stop = signals::setup_signal_handlers();
        let interval =
            Duration::from_secs(engine.config().sync_settings.sync_interval_seconds);
        scheduler::run_continuous(&engine, interval, &stop).await;
        return Ok(true);
    }

    let report = engine.sync_all(&never_stop()).await;
    Ok(report.succeeded())
}

/// Initialize the shared log sink: human-readable stdout plus an append-only
/// line log (`LOG_FILE`, default `sync.log`), both built once at startup.
/// The returned guard must stay alive for the duration of the run.
fn init_logging(log_file: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let dir = match log_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let file_name = log_file
        .file_name()
        .context("LOG_FILE has no file name component")?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}

/// `DRY_RUN="true"` (case-insensitive) forces dry-run; anything else does not.
fn parse_dry_run(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dry_run() {
        assert!(parse_dry_run(Some("true")));
        assert!(parse_dry_run(Some("TRUE")));
        assert!(!parse_dry_run(Some("false")));
        assert!(!parse_dry_run(Some("1")));
        assert!(!parse_dry_run(None));
    }

    #[test]
    fn test_cli_defaults() {
        std::env::remove_var("CONFIG_FILE");
        let cli = Cli::try_parse_from(["forgesync"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("sync_config.json"));
        assert!(!cli.dry_run);
        assert!(!cli.continuous);
        assert!(!cli.init);
        assert!(cli.repo.is_none());
    }

    #[test]
    fn test_cli_repo_spec_and_flags() {
        let cli =
            Cli::try_parse_from(["forgesync", "-r", "org/a:org/b", "-d", "-c", "other.json"])
                .unwrap();
        assert_eq!(cli.repo.as_deref(), Some("org/a:org/b"));
        assert!(cli.dry_run);
        assert_eq!(cli.config, PathBuf::from("other.json"));

        let pair = RepoPair::from_spec(cli.repo.as_deref().unwrap());
        assert_eq!(pair.source_repo, "org/a");
        assert_eq!(pair.target_repo, "org/b");
    }

    #[test]
    fn test_cli_continuous_short_flag() {
        let cli = Cli::try_parse_from(["forgesync", "-C"]).unwrap();
        assert!(cli.continuous);
    }
}
