/*============================================================
  Synavera Project: Syn-Pkg
  Module: synpkg_core::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load operator configuration for Syn-Pkg-Core from TOML and
    provide defaults for mirror discovery, downloads and logs.

  Security / Safety Notes:
    Reads operator-owned files only. Paths are used verbatim;
    no shell expansion is performed.

  Dependencies:
    serde + toml for parsing, dirs for XDG locations.

  Operational Scope:
    Resolved once at start-up and passed by value into the
    discovery and download layers.

  Revision History:
    2026-03-02 COD  Authored configuration loader.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit defaults, no process-wide mutable state
    - Validation before any network activity
============================================================*/

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SynpkgError};

const CONFIG_RELATIVE: &str = "syn-pkg/config.toml";

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynpkgConfig {
    pub mirror: MirrorConfig,
    pub download: DownloadConfig,
    pub logging: LoggingConfig,
}

/// Where packages come from.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MirrorConfig {
    /// File holding the mirror URL, one line.
    pub installurl: PathBuf,
    /// Mirror URL; overrides `installurl` when set.
    pub url: Option<String>,
    /// Release directory, e.g. `7.6` or `snapshots`; defaults to `uname -r`.
    pub release: Option<String>,
    /// Architecture directory; defaults to `uname -p`.
    pub arch: Option<String>,
    /// Index request timeout in seconds.
    pub timeout: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            installurl: PathBuf::from("/etc/installurl"),
            url: None,
            release: None,
            arch: None,
            timeout: 30,
        }
    }
}

/// Download pool settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DownloadConfig {
    pub workers: usize,
    pub cache_dir: PathBuf,
    pub extension: String,
    /// Per-archive request timeout in seconds.
    pub timeout: u64,
    /// Attempts per archive, including the first.
    pub max_attempts: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            cache_dir: PathBuf::from("/tmp/pkg_zone"),
            extension: "tgz".into(),
            timeout: 300,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
}

impl SynpkgConfig {
    /// Load from `path` when given (it must exist), otherwise from the XDG
    /// default location, falling back to built-in defaults.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            SynpkgError::Config(format!("Failed to read {}: {err}", path.display()))
        })?;
        let config: Self = toml::from_str(&text).map_err(|err| {
            SynpkgError::Config(format!("Failed to parse {}: {err}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the download layer cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.download.workers == 0 {
            return Err(SynpkgError::Config(
                "download.workers must be at least 1".into(),
            ));
        }
        if self.download.max_attempts == 0 {
            return Err(SynpkgError::Config(
                "download.max_attempts must be at least 1".into(),
            ));
        }
        if self.download.extension.trim_start_matches('.').is_empty() {
            return Err(SynpkgError::Config(
                "download.extension must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Archive extension without a leading dot.
    pub fn extension(&self) -> &str {
        self.download.extension.trim_start_matches('.')
    }

    /// Directory for session logs.
    pub fn log_dir(&self) -> PathBuf {
        self.logging.dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("syn-pkg")
                .join("logs")
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_RELATIVE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_document_keeps_defaults() {
        let config: SynpkgConfig = toml::from_str(
            r#"
            [download]
            workers = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.download.workers, 8);
        assert_eq!(config.download.cache_dir, PathBuf::from("/tmp/pkg_zone"));
        assert_eq!(config.download.extension, "tgz");
        assert_eq!(config.mirror, MirrorConfig::default());
    }

    #[test]
    fn full_document_parses_every_section() {
        let config: SynpkgConfig = toml::from_str(
            r#"
            [mirror]
            installurl = "/etc/other_installurl"
            url = "https://cdn.openbsd.org/pub/OpenBSD"
            release = "snapshots"
            arch = "amd64"
            timeout = 10

            [download]
            workers = 2
            cache_dir = "/var/cache/syn-pkg"
            extension = ".tgz"
            timeout = 60
            max_attempts = 1

            [logging]
            dir = "/var/log/syn-pkg"
            "#,
        )
        .unwrap();

        assert_eq!(config.mirror.release.as_deref(), Some("snapshots"));
        assert_eq!(config.mirror.timeout, 10);
        assert_eq!(config.download.cache_dir, PathBuf::from("/var/cache/syn-pkg"));
        assert_eq!(config.extension(), "tgz");
        assert_eq!(config.download.max_attempts, 1);
        assert_eq!(config.log_dir(), PathBuf::from("/var/log/syn-pkg"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = SynpkgConfig::default();
        config.download.workers = 0;
        assert!(matches!(config.validate(), Err(SynpkgError::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut config = SynpkgConfig::default();
        config.download.max_attempts = 0;
        assert!(matches!(config.validate(), Err(SynpkgError::Config(_))));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = SynpkgConfig::load_from_optional_path(Some(Path::new(
            "/nonexistent/syn-pkg/config.toml",
        )))
        .unwrap_err();
        assert!(matches!(err, SynpkgError::Config(_)));
    }

    #[test]
    fn load_reads_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[download]\nworkers = 3\ncache_dir = \"/tmp/elsewhere\"").unwrap();

        let config = SynpkgConfig::load_from_optional_path(Some(file.path())).unwrap();

        assert_eq!(config.download.workers, 3);
        assert_eq!(config.download.cache_dir, PathBuf::from("/tmp/elsewhere"));
    }
}
