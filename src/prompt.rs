/*============================================================
  Synavera Project: Syn-Pkg
  Module: synpkg_core::prompt
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Present the upgrade plan to the operator and ask for
    confirmation before any archive is downloaded.

  Security / Safety Notes:
    Reads a single line from stdin; nothing is executed.

  Dependencies:
    tokio::io for async stdin.

  Operational Scope:
    Skipped with --yes; --dry-run stops after the plan.

  Revision History:
    2026-03-06 COD  Authored upgrade plan prompt.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit operator consent before network writes
============================================================*/

use std::fmt::Write as _;
use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::Result;
use crate::upgrade::Upgrade;

const BOLD: &str = "\u{1b}[1m";
const RESET: &str = "\u{1b}[0m";

/// Aligned `name  installed -> candidate` table under a headline.
pub fn render_plan(upgrades: &[Upgrade<'_>]) -> String {
    let plural = if upgrades.len() == 1 { "" } else { "s" };
    let headline = format!(
        "{} package{plural} will be upgraded, proceed?",
        upgrades.len()
    );
    let width = upgrades
        .iter()
        .map(|upgrade| upgrade.installed.name.len())
        .max()
        .unwrap_or(0);

    let mut plan = String::new();
    let _ = writeln!(plan, "\n{headline}\n{}\n", "=".repeat(headline.len()));
    for upgrade in upgrades {
        let name = &upgrade.installed.name;
        let _ = writeln!(
            plan,
            "{BOLD}{name}{RESET}{}{} -> {}",
            " ".repeat(width - name.len() + 2),
            upgrade.installed.version,
            upgrade.candidate.version
        );
    }
    plan
}

/// Anything but an answer starting with `n`/`N` confirms.
pub fn is_confirmation(answer: &str) -> bool {
    !matches!(answer.trim_start().chars().next(), Some('n' | 'N'))
}

/// Print the question and wait for one line on stdin.
pub async fn confirm() -> Result<bool> {
    print!("\nContinue? [Y/n]: ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;
    Ok(is_confirmation(&answer))
}
