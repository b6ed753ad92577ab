/*============================================================
  Synavera Project: Syn-Pkg
  Module: synpkg_core::installed
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Enumerate locally installed packages through `pkg_info`.

  Security / Safety Notes:
    Executes `pkg_info` with user privileges only; no privilege
    escalation is attempted.

  Dependencies:
    tokio::process for async command execution.

  Operational Scope:
    Supplies the installed side of upgrade resolution.

  Revision History:
    2026-03-04 COD  Crafted pkg_info integration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic command invocation with explicit checks
    - Structured parsing with clear failure modes
============================================================*/

use std::process::Stdio;

use tokio::process::Command;

use crate::error::{Result, SynpkgError};
use crate::mirror::map_spawn_error;

/// Run `pkg_info` and return the identifier of every installed package.
pub async fn enumerate_installed_identifiers() -> Result<Vec<String>> {
    let output = Command::new("pkg_info")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| map_spawn_error(err, "pkg_info"))?;

    if !output.status.success() {
        return Err(SynpkgError::CommandFailure {
            command: "pkg_info".into(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8(output.stdout).map_err(|err| {
        SynpkgError::Serialization(format!("pkg_info emitted invalid UTF-8: {err}"))
    })?;

    Ok(parse_listing(&stdout))
}

/// Leading token of each `<identifier> <description>` line. Enumeration
/// stops at the first line that does not split into several fields.
pub fn parse_listing(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map_while(|line| {
            let mut fields = line.split_whitespace();
            let identifier = fields.next()?;
            fields.next()?;
            Some(identifier.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_listing_takes_leading_tokens() {
        let listing = "\
curl-8.6.0          transfer files with FTP, HTTP, HTTPS, etc.
quirks-7.14 signed  exceptions to pkg_add rules and cache
vim-9.0.2189-gtk3   vi clone, many additional features
";
        assert_eq!(
            parse_listing(listing),
            ["curl-8.6.0", "quirks-7.14", "vim-9.0.2189-gtk3"]
        );
    }

    #[test]
    fn parse_listing_stops_at_single_field_line() {
        let listing = "foo-1.0 a tool\n\nbar-2.0 another tool\n";
        assert_eq!(parse_listing(listing), ["foo-1.0"]);

        let listing = "foo-1.0 a tool\nterminator\nbar-2.0 another tool\n";
        assert_eq!(parse_listing(listing), ["foo-1.0"]);
    }

    #[test]
    fn parse_listing_of_empty_output_is_empty() {
        assert!(parse_listing("").is_empty());
    }
}
