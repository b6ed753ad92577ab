/*============================================================
  Synavera Project: Syn-Pkg
  Module: synpkg_core::report
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render the outcome of a download session as a JSON document
    for operators and wrapping tooling.

  Security / Safety Notes:
    Report data is written to operator-controlled paths; no
    privileged operations are performed.

  Dependencies:
    serde / serde_json for serialization, chrono for stamps.

  Operational Scope:
    Written when --report is given, after the pool drains.

  Revision History:
    2026-03-07 COD  Authored download report writer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic ordering for reproducible reports
    - Rich metadata for audit and observability
============================================================*/

use std::fs::File;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::download::{DownloadOutcome, DownloadReport};
use crate::error::{Result, SynpkgError};

/// Full report document.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    pub metadata: ReportMetadata<'a>,
    pub outcomes: &'a [DownloadOutcome],
}

#[derive(Debug, Serialize)]
pub struct ReportMetadata<'a> {
    pub generated_at: String,
    pub generated_by: &'static str,
    pub fetch_path: &'a str,
    pub cache_dir: &'a Path,
    pub candidates: usize,
    pub fetched: usize,
    pub cached: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub bytes_fetched: u64,
}

impl<'a> ReportDocument<'a> {
    pub fn new(report: &'a DownloadReport, fetch_path: &'a str, cache_dir: &'a Path) -> Self {
        Self {
            metadata: ReportMetadata {
                generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                generated_by: "synpkg_core",
                fetch_path,
                cache_dir,
                candidates: report.outcomes.len(),
                fetched: report.fetched(),
                cached: report.cached(),
                failed: report.failed(),
                cancelled: report.cancelled(),
                bytes_fetched: report.bytes_fetched(),
            },
            outcomes: &report.outcomes,
        }
    }
}

/// Persist the report to the given path.
pub fn write_report(document: &ReportDocument<'_>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| {
            SynpkgError::Filesystem(format!(
                "Failed to create report directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    let file = File::create(path).map_err(|err| {
        SynpkgError::Filesystem(format!(
            "Failed to create report file {}: {err}",
            path.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, document).map_err(|err| {
        SynpkgError::Serialization(format!("Failed to write report {}: {err}", path.display()))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DownloadStatus;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn report() -> DownloadReport {
        DownloadReport {
            outcomes: vec![
                DownloadOutcome {
                    identifier: "bar-2.1".into(),
                    path: PathBuf::from("/tmp/pkg_zone/bar-2.1.tgz"),
                    status: DownloadStatus::Failed {
                        error: "server returned 500 Internal Server Error".into(),
                    },
                },
                DownloadOutcome {
                    identifier: "foo-1.1".into(),
                    path: PathBuf::from("/tmp/pkg_zone/foo-1.1.tgz"),
                    status: DownloadStatus::Fetched { bytes: 42 },
                },
            ],
        }
    }

    #[test]
    fn document_serializes_outcomes_with_status_tags() {
        let report = report();
        let document = ReportDocument::new(&report, "https://m/7.6/packages/amd64", Path::new("/tmp/pkg_zone"));

        let value = serde_json::to_value(&document).unwrap();

        assert_eq!(value["metadata"]["candidates"], 2);
        assert_eq!(value["metadata"]["failed"], 1);
        assert_eq!(value["metadata"]["bytes_fetched"], 42);
        assert_eq!(value["outcomes"][0]["status"], "failed");
        assert_eq!(value["outcomes"][1]["status"], "fetched");
        assert_eq!(value["outcomes"][1]["bytes"], 42);
        assert_eq!(value["outcomes"][1]["identifier"], "foo-1.1");
    }

    #[test]
    fn write_report_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reports").join("session.json");
        let report = report();
        let document = ReportDocument::new(&report, "https://m", Path::new("/tmp/pkg_zone"));

        write_report(&document, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["metadata"]["generated_by"], "synpkg_core");
    }
}
