/*============================================================
  Synavera Project: Syn-Pkg
  Module: synpkg_core::download
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Fetch upgrade archives into the local package cache with a
    fixed pool of workers draining a shared queue.

  Security / Safety Notes:
    Files are only ever created inside the configured cache
    directory (mode 0700). Archives are stored verbatim; no
    extraction or signature checking happens here.

  Dependencies:
    tokio for tasks, channels and file I/O; reqwest for HTTP;
    urlencoding for archive names in request paths.

  Operational Scope:
    Invoked after the operator confirms the upgrade plan. One
    failing archive never stops the rest of the pool.

  Revision History:
    2026-03-05 COD  Authored dispatcher/worker download pool.
    2026-03-21 COD  Added cancellation, retries and .part files.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Bounded concurrency with an explicit completion barrier
    - Per-item failure isolation and reporting
    - Configuration passed by value, never global
============================================================*/

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::sleep;
use urlencoding::encode;

use crate::config::DownloadConfig;
use crate::error::{Result, SynpkgError};
use crate::logger::Logger;
use crate::package::Package;

/// Everything the scheduler needs for one run.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// `<mirror>/<release>/packages/<arch>`
    pub fetch_path: String,
    pub cache_dir: PathBuf,
    pub workers: usize,
    pub extension: String,
    pub timeout: Duration,
    pub max_attempts: usize,
}

impl SchedulerConfig {
    pub fn new(fetch_path: impl Into<String>, download: &DownloadConfig) -> Self {
        Self {
            fetch_path: fetch_path.into(),
            cache_dir: download.cache_dir.clone(),
            workers: download.workers.max(1),
            extension: download.extension.trim_start_matches('.').to_string(),
            timeout: Duration::from_secs(download.timeout),
            max_attempts: download.max_attempts.max(1),
        }
    }
}

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DownloadStatus {
    Fetched { bytes: u64 },
    Cached,
    Failed { error: String },
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    pub identifier: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: DownloadStatus,
}

/// Per-candidate outcomes of a scheduler run, sorted by identifier.
#[derive(Debug, Default, Serialize)]
pub struct DownloadReport {
    pub outcomes: Vec<DownloadOutcome>,
}

impl DownloadReport {
    pub fn fetched(&self) -> usize {
        self.count(|status| matches!(status, DownloadStatus::Fetched { .. }))
    }

    pub fn cached(&self) -> usize {
        self.count(|status| matches!(status, DownloadStatus::Cached))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, DownloadStatus::Failed { .. }))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|status| matches!(status, DownloadStatus::Cancelled))
    }

    pub fn bytes_fetched(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|outcome| match outcome.status {
                DownloadStatus::Fetched { bytes } => bytes,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, predicate: impl Fn(&DownloadStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.status))
            .count()
    }
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(StatusCode),
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cancelled")]
    Cancelled,
}

impl FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Request(_) => true,
            FetchError::Status(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::Io(_) | FetchError::Cancelled => false,
        }
    }
}

/// Dispatcher plus a fixed worker pool over one shared queue.
pub struct Scheduler {
    shared: Arc<Shared>,
}

struct Shared {
    client: reqwest::Client,
    config: SchedulerConfig,
    logger: Arc<Logger>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, logger: Arc<Logger>) -> Result<Self> {
        // archives must land on disk byte for byte
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("Syn-Pkg-Core/", env!("CARGO_PKG_VERSION")))
            .no_gzip()
            .no_brotli()
            .build()
            .map_err(|err| SynpkgError::Network(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            shared: Arc::new(Shared {
                client,
                config,
                logger,
            }),
        })
    }

    /// Ensure every candidate's archive exists in the cache.
    ///
    /// Returns once the dispatcher and all workers have exited. Only cache
    /// directory creation and task failures are errors; per-archive failures
    /// are reported in the returned [`DownloadReport`].
    pub async fn run<'a, I>(
        &self,
        candidates: I,
        shutdown: watch::Receiver<bool>,
    ) -> Result<DownloadReport>
    where
        I: IntoIterator<Item = &'a Package>,
    {
        let config = &self.shared.config;
        prepare_cache_dir(&config.cache_dir).await?;

        let jobs: Vec<Package> = candidates.into_iter().cloned().collect();
        let (sender, receiver) = mpsc::unbounded_channel::<Package>();
        let queue = Arc::new(Mutex::new(receiver));

        let logger = Arc::clone(&self.shared.logger);
        let dispatcher = tokio::spawn(async move {
            for package in jobs {
                logger.debug("DISPATCH", format!("Queued {package}"));
                if sender.send(package).is_err() {
                    break;
                }
            }
            // sender dropped here: queue closed
        });

        let mut workers = Vec::with_capacity(config.workers);
        for worker in 0..config.workers {
            let shared = Arc::clone(&self.shared);
            let queue = Arc::clone(&queue);
            let shutdown = shutdown.clone();
            workers.push(tokio::spawn(async move {
                shared.work(worker, queue, shutdown).await
            }));
        }

        dispatcher
            .await
            .map_err(|err| SynpkgError::Runtime(format!("Dispatcher task failed: {err}")))?;

        let mut outcomes = Vec::new();
        for handle in workers {
            let finished = handle
                .await
                .map_err(|err| SynpkgError::Runtime(format!("Download worker failed: {err}")))?;
            outcomes.extend(finished);
        }
        outcomes.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        Ok(DownloadReport { outcomes })
    }
}

impl Shared {
    async fn work(
        &self,
        worker: usize,
        queue: Arc<Mutex<mpsc::UnboundedReceiver<Package>>>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Vec<DownloadOutcome> {
        self.logger.debug("WORKER", format!("Worker {worker} online"));
        let mut outcomes = Vec::new();
        loop {
            let next = queue.lock().await.recv().await;
            let Some(package) = next else {
                break;
            };
            outcomes.push(self.process(&package, &mut shutdown).await);
        }
        self.logger.debug("WORKER", format!("Worker {worker} drained"));
        outcomes
    }

    async fn process(
        &self,
        package: &Package,
        shutdown: &mut watch::Receiver<bool>,
    ) -> DownloadOutcome {
        let file_name = package.archive_name(&self.config.extension);
        let path = self.config.cache_dir.join(&file_name);

        let status = if *shutdown.borrow() {
            DownloadStatus::Cancelled
        } else {
            match fs::try_exists(&path).await {
                Ok(true) => DownloadStatus::Cached,
                Ok(false) => self.fetch_with_retries(&file_name, &path, shutdown).await,
                Err(err) => DownloadStatus::Failed {
                    error: format!("cannot inspect cache entry: {err}"),
                },
            }
        };

        match &status {
            DownloadStatus::Fetched { bytes } => self
                .logger
                .info("FETCHED", format!("{package} ({bytes} bytes)")),
            DownloadStatus::Cached => self
                .logger
                .info("CACHED", format!("{package} already downloaded, skipping")),
            DownloadStatus::Failed { error } => self
                .logger
                .error("FETCH", format!("Error downloading {package}: {error}")),
            DownloadStatus::Cancelled => self.logger.warn("CANCEL", format!("{package} cancelled")),
        }

        DownloadOutcome {
            identifier: package.raw.clone(),
            path,
            status,
        }
    }

    async fn fetch_with_retries(
        &self,
        file_name: &str,
        path: &Path,
        shutdown: &mut watch::Receiver<bool>,
    ) -> DownloadStatus {
        let url = archive_url(&self.config.fetch_path, file_name);
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.logger.debug("FETCH", format!("GET {url} (attempt {attempt})"));

            let result = tokio::select! {
                result = self.fetch(&url, path) => result,
                _ = cancelled(shutdown) => Err(FetchError::Cancelled),
            };

            match result {
                Ok(bytes) => return DownloadStatus::Fetched { bytes },
                Err(FetchError::Cancelled) => {
                    discard(&partial_path(path)).await;
                    return DownloadStatus::Cancelled;
                }
                Err(err) if err.is_retryable() && attempt < self.config.max_attempts => {
                    self.logger
                        .warn("RETRY", format!("{file_name}: {err}; retrying"));
                    let exponent = (attempt as u32).min(8);
                    let delay = Duration::from_millis(200_u64.saturating_mul(1_u64 << exponent));
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = cancelled(shutdown) => return DownloadStatus::Cancelled,
                    }
                }
                Err(err) => {
                    return DownloadStatus::Failed {
                        error: err.to_string(),
                    }
                }
            }
        }
    }

    /// Stream into `<path>.part`, then move it into place.
    async fn fetch(&self, url: &str, path: &Path) -> std::result::Result<u64, FetchError> {
        let partial = partial_path(path);
        let streamed = match self.stream_to(url, &partial).await {
            Ok(bytes) => fs::rename(&partial, path).await.map(|_| bytes).map_err(FetchError::from),
            Err(err) => Err(err),
        };
        if streamed.is_err() {
            discard(&partial).await;
        }
        streamed
    }

    async fn stream_to(&self, url: &str, target: &Path) -> std::result::Result<u64, FetchError> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let mut file = File::create(target).await?;
        let mut written = 0_u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

/// Resolves once shutdown is requested; never, if the sender is gone.
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn archive_url(fetch_path: &str, file_name: &str) -> String {
    format!("{}/{}", fetch_path.trim_end_matches('/'), encode(file_name))
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

async fn discard(path: &Path) {
    // absent is fine
    let _ = fs::remove_file(path).await;
}

async fn prepare_cache_dir(dir: &Path) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(dir).await.map_err(|err| {
        SynpkgError::Filesystem(format!(
            "Failed to create package cache {}: {err}",
            dir.display()
        ))
    })
}
