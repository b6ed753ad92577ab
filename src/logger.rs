/*============================================================
  Synavera Project: Syn-Pkg
  Module: synpkg_core::logger
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Provide structured, append-only logging for Syn-Pkg-Core,
    shared between the main task and download workers.

  Security / Safety Notes:
    Only package identifiers, URLs and local paths are logged.

  Dependencies:
    std::sync::Mutex, chrono for timestamps, sha2 for the
    session digest.

  Operational Scope:
    Emits RFC-3339 UTC stamped entries to stderr and an
    optional session file, sealed with a SHA-256 digest.

  Revision History:
    2026-03-02 COD  Adopted Synavera logger for Syn-Pkg-Core.
    2026-03-20 COD  Logger shared across download workers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Append-only logging with UTC timestamps
    - Deterministic formatting for auditability
    - Graceful error propagation on I/O failures
============================================================*/

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::error::{Result, SynpkgError};

/// Structured log level for Syn-Pkg-Core events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        })
    }
}

/// Shared logger; `Send + Sync`, hand it to workers behind an `Arc`.
pub struct Logger {
    sink: Option<Mutex<BufWriter<File>>>,
    path: Option<PathBuf>,
    verbose: bool,
}

impl Logger {
    /// Build a logger that writes to stderr and optionally to a file.
    pub fn new(path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let sink = match path.as_deref() {
            Some(file_path) => Some(Mutex::new(BufWriter::new(open_log(file_path)?))),
            None => None,
        };
        Ok(Self {
            sink,
            path,
            verbose,
        })
    }

    /// Emit a log entry with the given level, code, and message.
    pub fn log<S: AsRef<str>>(&self, level: LogLevel, code: &str, message: S) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let line = format!("{timestamp} [{level}] [{code}] {}", message.as_ref());

        if self.verbose || matches!(level, LogLevel::Error | LogLevel::Warn) {
            eprintln!("{line}");
        }

        let Some(sink) = &self.sink else {
            return;
        };
        // a poisoned sink means a worker panicked mid-write; keep stderr only
        let Ok(mut writer) = sink.lock() else {
            return;
        };
        if writeln!(writer, "{line}").and_then(|_| writer.flush()).is_err() {
            eprintln!("{timestamp} [{}] [LOGGER] Failed to write to log file", LogLevel::Error);
        }
    }

    pub fn info<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Info, code, message);
    }

    pub fn warn<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Warn, code, message);
    }

    pub fn error<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Error, code, message);
    }

    pub fn debug<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Debug, code, message);
    }

    /// Return the path backing this logger, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write `<log>.hash` holding the SHA-256 digest of the session log.
    pub fn finalize(&self) -> Result<Option<PathBuf>> {
        let Some(path) = self.path() else {
            return Ok(None);
        };
        if let Some(sink) = &self.sink {
            if let Ok(mut writer) = sink.lock() {
                writer.flush()?;
            }
        }

        let data = std::fs::read(path).map_err(|err| {
            SynpkgError::Filesystem(format!(
                "Failed to read log for hashing {}: {err}",
                path.display()
            ))
        })?;
        let digest = Sha256::digest(&data);

        let mut hash_os = path.as_os_str().to_os_string();
        hash_os.push(".hash");
        let hash_path = PathBuf::from(hash_os);
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        std::fs::write(&hash_path, format!("{digest:x}  {file_name}\n")).map_err(|err| {
            SynpkgError::Filesystem(format!(
                "Failed to write hash file {}: {err}",
                hash_path.display()
            ))
        })?;
        Ok(Some(hash_path))
    }
}

fn open_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| {
            SynpkgError::Filesystem(format!(
                "Failed to create log directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| {
            SynpkgError::Filesystem(format!(
                "Failed to open log file {}: {err}",
                path.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn entries_are_appended_with_level_and_code() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("session.log");
        let logger = Logger::new(Some(path.clone()), false).unwrap();

        logger.info("INIT", "starting");
        logger.debug("FETCH", "foo-1.0");

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] [INIT] starting"));
        assert!(lines[1].ends_with("[DEBUG] [FETCH] foo-1.0"));
    }

    #[test]
    fn finalize_writes_sha256_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.log");
        let logger = Logger::new(Some(path.clone()), false).unwrap();
        logger.info("COMPLETE", "done");

        let hash_path = logger.finalize().unwrap().unwrap();

        let expected = Sha256::digest(std::fs::read(&path).unwrap());
        let recorded = std::fs::read_to_string(hash_path).unwrap();
        assert_eq!(recorded, format!("{expected:x}  session.log\n"));
    }

    #[test]
    fn finalize_without_file_is_a_no_op() {
        let logger = Logger::new(None, false).unwrap();
        assert_eq!(logger.finalize().unwrap(), None);
    }
}
