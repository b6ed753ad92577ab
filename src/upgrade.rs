/*============================================================
  Synavera Project: Syn-Pkg
  Module: synpkg_core::upgrade
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Reconcile installed packages against the remote index and
    select the remote archives that supersede them.

  Security / Safety Notes:
    Pure computation over in-memory collections.

  Dependencies:
    None beyond std.

  Operational Scope:
    Feeds the confirmation prompt and the download scheduler.

  Revision History:
    2026-03-03 COD  Authored upgrade resolver.
    2026-03-19 COD  Duplicate remote keys keep the newest entry.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic ordering (installed order is preserved)
    - Borrowed results; no duplicated version data
============================================================*/

use std::collections::HashMap;

use crate::package::Package;
use crate::version::is_newer;

/// An installed package paired with the remote archive that supersedes it.
#[derive(Debug, Clone, Copy)]
pub struct Upgrade<'a> {
    pub installed: &'a Package,
    pub candidate: &'a Package,
}

/// Select the remote packages strictly newer than their installed counterpart.
///
/// Installed packages without a remote counterpart (local builds, packages
/// dropped upstream) are skipped. When the remote set lists one identity key
/// more than once, the newest entry is kept.
pub fn resolve_upgrades<'a>(installed: &'a [Package], remote: &'a [Package]) -> Vec<Upgrade<'a>> {
    let index = index_remote(remote);

    installed
        .iter()
        .filter_map(|pkg| {
            let candidate = *index.get(&pkg.identity_key())?;
            is_newer(&pkg.version, &candidate.version).then_some(Upgrade {
                installed: pkg,
                candidate,
            })
        })
        .collect()
}

fn index_remote(remote: &[Package]) -> HashMap<(&str, &str), &Package> {
    let mut index: HashMap<(&str, &str), &Package> = HashMap::with_capacity(remote.len());
    for pkg in remote {
        index
            .entry(pkg.identity_key())
            .and_modify(|current| {
                if is_newer(&current.version, &pkg.version) {
                    *current = pkg;
                }
            })
            .or_insert(pkg);
    }
    index
}
