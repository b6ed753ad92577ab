/*============================================================
  Synavera Project: Syn-Pkg
  Module: synpkg_core::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Syn-Pkg-Core error types: run-level failures with
    deterministic exit codes, and per-identifier parse failures
    that callers may skip.

  Security / Safety Notes:
    Error contexts expose package identifiers and local paths
    only; mirror credentials are never embedded in messages.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate recoverable failures and
    consolidate exit codes for the binary entry point.

  Revision History:
    2026-03-02 COD  Established shared error definitions.
    2026-03-19 COD  Split identifier parse errors from run errors.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::num::ParseIntError;
use std::process::ExitCode;

use thiserror::Error;

/// Result alias for Syn-Pkg-Core operations.
pub type Result<T> = std::result::Result<T, SynpkgError>;

/// Enumerates high-level error domains surfaced by Syn-Pkg-Core.
#[derive(Debug, Error)]
pub enum SynpkgError {
    #[error("Required command `{command}` not found in PATH")]
    CommandMissing { command: String },
    #[error("Command `{command}` failed with status {status}: {stderr}")]
    CommandFailure {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Network: {0}")]
    Network(String),
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SynpkgError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SynpkgError::CommandMissing { .. } => ExitCode::from(10),
            SynpkgError::CommandFailure { .. } => ExitCode::from(11),
            SynpkgError::Config(_) => ExitCode::from(20),
            SynpkgError::Network(_) => ExitCode::from(30),
            SynpkgError::Serialization(_) => ExitCode::from(31),
            SynpkgError::Filesystem(_) => ExitCode::from(40),
            SynpkgError::Runtime(_) => ExitCode::from(50),
            SynpkgError::Io(_) => ExitCode::from(41),
        }
    }
}

/// Failure to turn one package identifier into a [`crate::package::Package`].
///
/// These are scoped to a single identifier; the run decides whether to skip
/// the identifier or abort.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("`{identifier}` has no version field (no hyphen-separated field starts with a digit)")]
    MissingVersion { identifier: String },
    #[error("`{identifier}` has an empty package name")]
    EmptyName { identifier: String },
    #[error("`{version}`: {field} token `{token}` is not a valid number: {source}")]
    InvalidNumber {
        version: String,
        field: &'static str,
        token: String,
        #[source]
        source: ParseIntError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_stable_per_category() {
        assert_eq!(
            SynpkgError::Config("bad".into()).exit_code(),
            ExitCode::from(20)
        );
        assert_eq!(
            SynpkgError::Network("down".into()).exit_code(),
            ExitCode::from(30)
        );
        assert_eq!(
            SynpkgError::CommandMissing {
                command: "pkg_info".into()
            }
            .exit_code(),
            ExitCode::from(10)
        );
    }

    #[test]
    fn parse_error_names_the_identifier() {
        let err = ParseError::MissingVersion {
            identifier: "quirks".into(),
        };
        assert!(err.to_string().contains("`quirks`"));
    }
}
