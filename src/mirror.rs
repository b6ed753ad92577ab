/*============================================================
  Synavera Project: Syn-Pkg
  Module: synpkg_core::mirror
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Discover the package fetch path (mirror, release, arch) and
    scrape the remote directory listing into identifiers.

  Security / Safety Notes:
    Executes `uname` with user privileges and performs read-only
    HTTP(S) GET requests against the configured mirror.

  Dependencies:
    tokio::process for `uname`, reqwest for HTTP, regex for the
    listing scrape.

  Operational Scope:
    Runs once per session before upgrade resolution; every
    failure here is fatal for the run.

  Revision History:
    2026-03-04 COD  Authored mirror discovery and index client.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic command invocation with explicit checks
    - Configuration overrides before probing the host
============================================================*/

use std::io;
use std::process::Stdio;
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;

use crate::config::MirrorConfig;
use crate::error::{Result, SynpkgError};

/// Compute `<mirror>/<release>/packages/<arch>`.
pub async fn discover_fetch_path(config: &MirrorConfig) -> Result<String> {
    let mirror = match &config.url {
        Some(url) => url.trim().to_string(),
        None => read_installurl(config).await?,
    };
    if mirror.is_empty() {
        return Err(SynpkgError::Config(format!(
            "No mirror configured in {}",
            config.installurl.display()
        )));
    }

    let release = match &config.release {
        Some(release) => release.clone(),
        None => uname("-r").await?,
    };
    let arch = match &config.arch {
        Some(arch) => arch.clone(),
        None => uname("-p").await?,
    };

    Ok(fetch_path(&mirror, &release, &arch))
}

fn fetch_path(mirror: &str, release: &str, arch: &str) -> String {
    format!("{}/{release}/packages/{arch}", mirror.trim_end_matches('/'))
}

async fn read_installurl(config: &MirrorConfig) -> Result<String> {
    let text = tokio::fs::read_to_string(&config.installurl)
        .await
        .map_err(|err| {
            SynpkgError::Config(format!(
                "Failed to read mirror from {}: {err}",
                config.installurl.display()
            ))
        })?;
    Ok(text.lines().next().unwrap_or_default().trim().to_string())
}

async fn uname(flag: &str) -> Result<String> {
    let output = Command::new("uname")
        .arg(flag)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| map_spawn_error(err, "uname"))?;

    if !output.status.success() {
        return Err(SynpkgError::CommandFailure {
            command: format!("uname {flag}"),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8(output.stdout).map_err(|err| {
        SynpkgError::Serialization(format!("uname {flag} emitted invalid UTF-8: {err}"))
    })?;
    Ok(stdout.trim().to_string())
}

pub(crate) fn map_spawn_error(err: io::Error, command: &str) -> SynpkgError {
    if err.kind() == io::ErrorKind::NotFound {
        SynpkgError::CommandMissing {
            command: command.into(),
        }
    } else {
        SynpkgError::Runtime(format!("Failed to spawn {command}: {err}"))
    }
}

/// Reads the mirror's package directory listing.
pub struct IndexClient {
    client: reqwest::Client,
    pattern: Regex,
}

impl IndexClient {
    pub fn new(config: &MirrorConfig, extension: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(concat!("Syn-Pkg-Core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| SynpkgError::Network(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            pattern: archive_pattern(extension)?,
        })
    }

    /// GET the listing at `url` and return every archive identifier in it.
    pub async fn fetch_identifiers(&self, url: &str) -> Result<Vec<String>> {
        let response = self.client.get(url).send().await.map_err(|err| {
            SynpkgError::Network(format!("Package index request to {url} failed: {err}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynpkgError::Network(format!(
                "Package index {url} returned status {status}"
            )));
        }

        let body = response.text().await.map_err(|err| {
            SynpkgError::Network(format!("Failed to read package index {url}: {err}"))
        })?;
        Ok(self.extract(&body))
    }

    /// Pull quoted `<identifier>.<ext>` names out of a listing document.
    pub fn extract(&self, body: &str) -> Vec<String> {
        self.pattern
            .captures_iter(body)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|identifier| !identifier.is_empty())
            .collect()
    }
}

fn archive_pattern(extension: &str) -> Result<Regex> {
    let pattern = format!(r#"['"]([^'"/<>\s]*?)\.{}['"]"#, regex::escape(extension));
    Regex::new(&pattern)
        .map_err(|err| SynpkgError::Config(format!("Invalid archive extension `{extension}`: {err}")))
}
