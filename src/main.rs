/*============================================================
  Synavera Project: Syn-Pkg
  Module: synpkg_core::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for Syn-Pkg Core. Enumerates installed OpenBSD
    packages, reads the mirror's package index, resolves which
    packages have newer archives and fetches them into the
    local package cache.

  Security / Safety Notes:
    Operates within user privileges. Executes pkg_info/uname
    and performs HTTP(S) GET requests only. Nothing fetched is
    installed or extracted.

  Dependencies:
    clap for CLI parsing, tokio runtime, chrono for timestamps.

  Operational Scope:
    Run by operators ahead of `pkg_add -u` to warm the package
    cache, or in dry-run mode to inspect pending upgrades.

  Revision History:
    2026-03-02 COD  Authored Syn-Pkg Core runtime.
    2026-03-21 COD  Ctrl-C cancels in-flight downloads.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

mod config;
mod download;
mod error;
mod installed;
mod logger;
mod mirror;
mod package;
mod prompt;
mod report;
mod upgrade;
mod version;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{ArgAction, Parser};
use tokio::sync::watch;

use config::SynpkgConfig;
use download::{Scheduler, SchedulerConfig};
use error::Result;
use logger::Logger;
use mirror::IndexClient;
use package::{parse_identifiers, Package};
use report::{write_report, ReportDocument};
use upgrade::resolve_upgrades;

/// Command-line arguments for Syn-Pkg-Core.
#[derive(Debug, Parser)]
#[command(
    name = "Syn-Pkg-Core",
    version,
    author = "Synavera Systems",
    about = "Conscious package cache warmer for OpenBSD upgrades"
)]
struct Cli {
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override package cache directory.
    #[arg(long, value_name = "PATH")]
    cache_dir: Option<PathBuf>,
    /// Number of concurrent download workers.
    #[arg(long, value_name = "N")]
    workers: Option<usize>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Write a JSON download report to this path.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
    /// Download without asking for confirmation.
    #[arg(long, short = 'y', action = ArgAction::SetTrue)]
    yes: bool,
    /// Show the upgrade plan and stop.
    #[arg(long, action = ArgAction::SetTrue)]
    dry_run: bool,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[Syn-Pkg-Core] {}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = SynpkgConfig::load_from_optional_path(cli.config.as_deref())?;
    if let Some(cache_dir) = cli.cache_dir.clone() {
        config.download.cache_dir = cache_dir;
    }
    if let Some(workers) = cli.workers {
        config.download.workers = workers;
    }
    config.validate()?;

    let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli
        .log
        .clone()
        .unwrap_or_else(|| config.log_dir().join(format!("core_{session_stamp}.log")));
    let logger = Arc::new(Logger::new(Some(log_path), cli.verbose)?);
    logger.info("INIT", "Syn-Pkg Core awakening.");

    let fetch_path = mirror::discover_fetch_path(&config.mirror).await?;
    logger.info("MIRROR", format!("Package index {fetch_path}"));

    let index = IndexClient::new(&config.mirror, config.extension())?;
    let remote = load_packages(index.fetch_identifiers(&fetch_path).await?, "REMOTE", &logger);
    logger.info("REMOTE", format!("{} remote packages", remote.len()));

    let installed = load_packages(
        installed::enumerate_installed_identifiers().await?,
        "INSTALLED",
        &logger,
    );
    logger.info("INSTALLED", format!("{} installed packages", installed.len()));

    let upgrades = resolve_upgrades(&installed, &remote);
    if upgrades.is_empty() {
        logger.info("CURRENT", "All installed packages are up to date.");
        logger.finalize()?;
        return Ok(ExitCode::SUCCESS);
    }
    for upgrade in &upgrades {
        logger.debug(
            "UPGRADE",
            format!("{} -> {}", upgrade.installed, upgrade.candidate),
        );
    }

    print!("{}", prompt::render_plan(&upgrades));
    if cli.dry_run {
        logger.info("DRYRUN", format!("{} upgrades pending", upgrades.len()));
        logger.finalize()?;
        return Ok(ExitCode::SUCCESS);
    }
    if !cli.yes && !prompt::confirm().await? {
        logger.info("DECLINED", "Operator declined the upgrade plan.");
        logger.finalize()?;
        return Ok(ExitCode::SUCCESS);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let interrupt_logger = Arc::clone(&logger);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt_logger.warn("SIGINT", "Interrupt received; cancelling downloads.");
            let _ = shutdown_tx.send(true);
        }
    });

    let scheduler_config = SchedulerConfig::new(fetch_path.clone(), &config.download);
    logger.info(
        "DOWNLOAD",
        format!(
            "Fetching {} archives into {} with {} workers",
            upgrades.len(),
            scheduler_config.cache_dir.display(),
            scheduler_config.workers
        ),
    );
    let scheduler = Scheduler::new(scheduler_config, Arc::clone(&logger))?;
    let report = scheduler
        .run(upgrades.iter().map(|upgrade| upgrade.candidate), shutdown_rx)
        .await?;

    if let Some(path) = &cli.report {
        let document = ReportDocument::new(&report, &fetch_path, &config.download.cache_dir);
        write_report(&document, path)?;
        logger.info("REPORT", format!("Report written to {}", path.display()));
    }

    logger.info(
        "SUMMARY",
        format!(
            "fetched={} cached={} failed={} cancelled={}",
            report.fetched(),
            report.cached(),
            report.failed(),
            report.cancelled()
        ),
    );
    logger.info("COMPLETE", "Cache synchronised.");
    logger.finalize()?;

    Ok(ExitCode::SUCCESS)
}

/// Parse identifiers, logging and skipping any that are malformed.
fn load_packages(identifiers: Vec<String>, code: &str, logger: &Logger) -> Vec<Package> {
    let parsed = parse_identifiers(identifiers);
    for err in &parsed.rejected {
        logger.warn(code, format!("Skipping malformed identifier: {err}"));
    }
    parsed.packages
}
