/*============================================================
  Synavera Project: Syn-Pkg
  Module: synpkg_core::package
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Shared package identity: split raw archive identifiers into
    name, version and flavour, and expose the identity key used
    to pair installed packages with remote counterparts.

  Security / Safety Notes:
    Pure data container; no I/O performed in this module.

  Dependencies:
    None beyond std.

  Operational Scope:
    Used for both the remote index and the local pkg_info
    listing, ahead of upgrade resolution and downloads.

  Revision History:
    2026-03-02 COD  Introduced shared Package type.
    2026-03-19 COD  Malformed identifiers reported, not fatal.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Clear data contracts between modules
    - Typed failures scoped to a single identifier
============================================================*/

use std::fmt;

use crate::error::ParseError;
use crate::version::VersionRecord;

/// One package archive, identified by its raw identifier (`foo-1.2p0-static`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub raw: String,
    pub name: String,
    pub version: VersionRecord,
    pub flavour: String,
}

impl Package {
    /// Parse `<name-parts>-<version>[-<flavour-parts>]`.
    ///
    /// The version field is the first hyphen-separated field starting with a
    /// digit; names may contain digits, but never at the start of a field.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = raw.split('-').collect();
        let version_idx = fields
            .iter()
            .position(|field| field.as_bytes().first().is_some_and(u8::is_ascii_digit))
            .ok_or_else(|| ParseError::MissingVersion {
                identifier: raw.to_string(),
            })?;

        if version_idx == 0 {
            return Err(ParseError::EmptyName {
                identifier: raw.to_string(),
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            name: fields[..version_idx].join("-"),
            version: VersionRecord::parse(fields[version_idx])?,
            flavour: fields[version_idx + 1..].join("-"),
        })
    }

    /// The (name, flavour) pair identifying "the same software".
    pub fn identity_key(&self) -> (&str, &str) {
        (&self.name, &self.flavour)
    }

    /// Archive filename for this package, e.g. `foo-1.0.tgz`.
    pub fn archive_name(&self, extension: &str) -> String {
        format!("{}.{}", self.raw, extension)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Outcome of parsing a batch of identifiers: the packages that parsed and
/// the identifiers that did not.
#[derive(Debug, Default)]
pub struct ParsedPackages {
    pub packages: Vec<Package>,
    pub rejected: Vec<ParseError>,
}

/// Parse every identifier, keeping going past malformed ones.
pub fn parse_identifiers<I, S>(identifiers: I) -> ParsedPackages
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = ParsedPackages::default();
    for identifier in identifiers {
        match Package::parse(identifier.as_ref()) {
            Ok(package) => parsed.packages.push(package),
            Err(err) => parsed.rejected.push(err),
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("foo-1.0", "foo", "1.0", "")]
    #[case("foo-1.2.3p1-static", "foo", "1.2.3p1", "static")]
    #[case("py3-cryptography-41.0.7", "py3-cryptography", "41.0.7", "")]
    #[case("gtk+3-3.24.41", "gtk+3", "3.24.41", "")]
    #[case("vim-9.0.2189-gtk3-perl-python3", "vim", "9.0.2189", "gtk3-perl-python3")]
    #[case("mozilla-dicts-en-GB-1.3p7", "mozilla-dicts-en-GB", "1.3p7", "")]
    fn parse_recovers_name_version_flavour(
        #[case] raw: &str,
        #[case] name: &str,
        #[case] version: &str,
        #[case] flavour: &str,
    ) {
        let package = Package::parse(raw).unwrap();
        assert_eq!(package.name, name);
        assert_eq!(package.version.as_str(), version);
        assert_eq!(package.flavour, flavour);
        assert_eq!(package.raw, raw);
    }

    #[test]
    fn parse_round_trips_synthesized_identifiers() {
        let names = ["a", "lib-foo", "x11-utils", "p5-Net-SSLeay"];
        let versions = ["0.1", "1.2.3p4", "2.0rc1v2", "9.9pl3"];
        let flavours = ["", "no_x11", "static-debug"];
        for name in names {
            for version in versions {
                for flavour in flavours {
                    let raw = if flavour.is_empty() {
                        format!("{name}-{version}")
                    } else {
                        format!("{name}-{version}-{flavour}")
                    };
                    let package = Package::parse(&raw).unwrap();
                    assert_eq!(package.identity_key(), (name, flavour), "{raw}");
                    assert_eq!(package.version.as_str(), version, "{raw}");
                }
            }
        }
    }

    #[test]
    fn parse_without_version_field_fails() {
        assert_eq!(
            Package::parse("quirks"),
            Err(ParseError::MissingVersion {
                identifier: "quirks".into()
            })
        );
        assert!(matches!(
            Package::parse("foo--bar"),
            Err(ParseError::MissingVersion { .. })
        ));
    }

    #[test]
    fn parse_with_leading_version_field_fails() {
        assert!(matches!(
            Package::parse("1.0-static"),
            Err(ParseError::EmptyName { .. })
        ));
    }

    #[test]
    fn archive_name_appends_extension() {
        let package = Package::parse("foo-1.0-static").unwrap();
        assert_eq!(package.archive_name("tgz"), "foo-1.0-static.tgz");
    }

    #[test]
    fn parse_identifiers_skips_malformed_entries() {
        let parsed = parse_identifiers(["foo-1.0", "index", "bar-2.0p1"]);
        let names: Vec<&str> = parsed.packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["foo", "bar"]);
        assert_eq!(parsed.rejected.len(), 1);
    }
}
