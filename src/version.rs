/*============================================================
  Synavera Project: Syn-Pkg
  Module: synpkg_core::version
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Parse OpenBSD package version fields into structured
    records and decide whether one version supersedes another,
    following the ranking rules of packages-specs(7).

  Security / Safety Notes:
    Pure computation; no I/O performed in this module. Numeric
    runs are compared as digit strings, so arbitrarily long
    version numbers cannot overflow.

  Dependencies:
    None beyond std.

  Operational Scope:
    Used by the identifier parser at load time and by the
    upgrade resolver when matching installed and remote sets.

  Revision History:
    2026-03-02 COD  Authored version record and comparator.
    2026-03-19 COD  Replaced regex tail stripping with tokenizer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Immutable records derived exactly once from source text
    - Explicit, ordered field precedence
    - Typed parse failures instead of aborts
============================================================*/

use std::cmp::Ordering;
use std::fmt;

use crate::error::ParseError;

/// Pre/post-release marker. Declaration order is rank order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suffix {
    Alpha,
    Beta,
    Rc,
    Pre,
    #[default]
    Stable,
    Pl,
}

impl Suffix {
    /// Tokens recognised in a version tail. `Stable` has no token.
    const TOKENS: [(&'static str, Suffix); 5] = [
        ("alpha", Suffix::Alpha),
        ("beta", Suffix::Beta),
        ("rc", Suffix::Rc),
        ("pre", Suffix::Pre),
        ("pl", Suffix::Pl),
    ];

    fn from_token(token: &str) -> Option<Self> {
        Self::TOKENS
            .iter()
            .find(|(text, _)| *text == token)
            .map(|(_, suffix)| *suffix)
    }

    fn match_len(input: &str) -> Option<usize> {
        Self::TOKENS
            .iter()
            .find(|(text, _)| input.starts_with(*text))
            .map(|(text, _)| text.len())
    }
}

/// Structured, comparable form of a package version field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    raw: String,
    components: Vec<String>,
    suffix: Suffix,
    suffix_version: u32,
    revision: Option<u32>,
    scheme: Option<u32>,
}

impl VersionRecord {
    /// Parse a version field such as `1.2.3p4` or `2.0rc1v1`.
    pub fn parse(version: &str) -> Result<Self, ParseError> {
        let mut components: Vec<String> = version.split('.').map(str::to_string).collect();
        // split always yields at least one element
        let tail = components.pop().unwrap_or_default();
        let mut tokens = TailTokenizer::new(version, tail);

        let (suffix, suffix_version) = match tokens.take(Suffix::match_len, false) {
            Some((marker, digits)) => {
                let suffix = Suffix::from_token(&marker).unwrap_or_default();
                let counter = if digits.is_empty() {
                    0
                } else {
                    tokens.number("suffix", &digits)?
                };
                (suffix, counter)
            }
            None => (Suffix::Stable, 0),
        };

        let revision = match tokens.take(|s| s.starts_with('p').then_some(1), true) {
            Some((_, digits)) => Some(tokens.number("revision", &digits)?),
            None => None,
        };

        let scheme = match tokens.take(
            |s| (s.starts_with('v') || s.starts_with('V')).then_some(1),
            true,
        ) {
            Some((_, digits)) => Some(tokens.number("scheme", &digits)?),
            None => None,
        };

        components.push(tokens.into_rest());

        Ok(Self {
            raw: version.to_string(),
            components,
            suffix,
            suffix_version,
            revision,
            scheme,
        })
    }

    /// The version field exactly as it was parsed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn suffix(&self) -> Suffix {
        self.suffix
    }

    pub fn suffix_version(&self) -> u32 {
        self.suffix_version
    }

    /// Packaging revision (`pN`); `None` ranks below `Some(0)`.
    pub fn revision(&self) -> Option<u32> {
        self.revision
    }

    /// Version scheme (`vN`); `None` ranks below `Some(0)`.
    pub fn scheme(&self) -> Option<u32> {
        self.scheme
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consumes recognised tokens from the last dot-component, one kind at a time.
struct TailTokenizer<'a> {
    version: &'a str,
    rest: String,
}

impl<'a> TailTokenizer<'a> {
    fn new(version: &'a str, tail: String) -> Self {
        Self {
            version,
            rest: tail,
        }
    }

    /// Remove the leftmost marker (as recognised by `marker`) together with the
    /// digit run that follows it. Returns the marker text and the digits.
    fn take<F>(&mut self, marker: F, digits_required: bool) -> Option<(String, String)>
    where
        F: Fn(&str) -> Option<usize>,
    {
        let (start, digits_start, end) = self.rest.char_indices().find_map(|(start, _)| {
            let marker_len = marker(&self.rest[start..])?;
            let digits_start = start + marker_len;
            let digits_len = self.rest[digits_start..]
                .bytes()
                .take_while(u8::is_ascii_digit)
                .count();
            if digits_required && digits_len == 0 {
                return None;
            }
            Some((start, digits_start, digits_start + digits_len))
        })?;

        let marker_text = self.rest[start..digits_start].to_string();
        let digits = self.rest[digits_start..end].to_string();
        self.rest.replace_range(start..end, "");
        Some((marker_text, digits))
    }

    fn number(&self, field: &'static str, digits: &str) -> Result<u32, ParseError> {
        digits.parse::<u32>().map_err(|source| ParseError::InvalidNumber {
            version: self.version.to_string(),
            field,
            token: digits.to_string(),
            source,
        })
    }

    fn into_rest(self) -> String {
        self.rest
    }
}

/// Return true iff `remote` is strictly newer than `installed`.
///
/// Both records must belong to packages sharing an identity key. Fields are
/// ranked scheme, dotted components, suffix, suffix counter, revision; the
/// first field that differs decides.
pub fn is_newer(installed: &VersionRecord, remote: &VersionRecord) -> bool {
    precedence(installed, remote) == Ordering::Less
}

fn precedence(installed: &VersionRecord, remote: &VersionRecord) -> Ordering {
    installed
        .scheme()
        .cmp(&remote.scheme())
        .then_with(|| compare_components(installed.components(), remote.components()))
        .then_with(|| installed.suffix().cmp(&remote.suffix()))
        .then_with(|| installed.suffix_version().cmp(&remote.suffix_version()))
        .then_with(|| installed.revision().cmp(&remote.revision()))
}

/// Lockstep walk; a missing trailing component compares as `0`.
fn compare_components(left: &[String], right: &[String]) -> Ordering {
    let len = left.len().max(right.len());
    for idx in 0..len {
        let (l_num, l_letters) = split_component(left.get(idx).map_or("0", String::as_str));
        let (r_num, r_letters) = split_component(right.get(idx).map_or("0", String::as_str));

        match compare_numeric(l_num, r_num).then_with(|| l_letters.cmp(r_letters)) {
            Ordering::Equal => {}
            ord => return ord,
        }
    }
    Ordering::Equal
}

/// Split `12a` into (`12`, `a`).
fn split_component(component: &str) -> (&str, &str) {
    let idx = component
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(component.len());
    component.split_at(idx)
}

fn compare_numeric(left: &str, right: &str) -> Ordering {
    let left = left.trim_start_matches('0');
    let right = right.trim_start_matches('0');
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn v(s: &str) -> VersionRecord {
        VersionRecord::parse(s).unwrap()
    }

    #[test]
    fn parse_extracts_revision() {
        let record = v("1.2.3p4");
        assert_eq!(record.components(), ["1", "2", "3"]);
        assert_eq!(record.revision(), Some(4));
        assert_eq!(record.suffix(), Suffix::Stable);
        assert_eq!(record.suffix_version(), 0);
        assert_eq!(record.scheme(), None);
    }

    #[test]
    fn parse_strips_suffix_from_tail() {
        let record = v("2.0rc1");
        assert_eq!(record.components(), ["2", "0"]);
        assert_eq!(record.suffix(), Suffix::Rc);
        assert_eq!(record.suffix_version(), 1);
        assert_eq!(record.revision(), None);
        assert_eq!(record.as_str(), "2.0rc1");
    }

    #[test]
    fn parse_strips_adjacent_tokens_in_order() {
        let record = v("1.0pl2p3v1");
        assert_eq!(record.components(), ["1", "0"]);
        assert_eq!(record.suffix(), Suffix::Pl);
        assert_eq!(record.suffix_version(), 2);
        assert_eq!(record.revision(), Some(3));
        assert_eq!(record.scheme(), Some(1));
    }

    #[rstest]
    #[case("0.9.8zh", &["0", "9", "8zh"], Suffix::Stable, None, None)]
    #[case("5.2pre", &["5", "2"], Suffix::Pre, None, None)]
    #[case("3.1beta4p0", &["3", "1"], Suffix::Beta, Some(0), None)]
    #[case("1.2.3V2", &["1", "2", "3"], Suffix::Stable, None, Some(2))]
    #[case("4.5p", &["4", "5p"], Suffix::Stable, None, None)]
    #[case("20230101", &["20230101"], Suffix::Stable, None, None)]
    #[case("1.0alphap1v0", &["1", "0"], Suffix::Alpha, Some(1), Some(0))]
    fn parse_cases(
        #[case] input: &str,
        #[case] components: &[&str],
        #[case] suffix: Suffix,
        #[case] revision: Option<u32>,
        #[case] scheme: Option<u32>,
    ) {
        let record = v(input);
        assert_eq!(record.components(), components);
        assert_eq!(record.suffix(), suffix);
        assert_eq!(record.revision(), revision);
        assert_eq!(record.scheme(), scheme);
    }

    #[test]
    fn parse_rejects_overflowing_counter() {
        let err = VersionRecord::parse("1.0p99999999999").unwrap_err();
        match err {
            ParseError::InvalidNumber { field, token, .. } => {
                assert_eq!(field, "revision");
                assert_eq!(token, "99999999999");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[rstest]
    #[case("1.0", "1.1", true)]
    #[case("1.1", "1.0", false)]
    #[case("1.9", "1.10", true)]
    #[case("1.10", "1.9", false)]
    #[case("1.01", "1.1", false)]
    #[case("1.2a", "1.2b", true)]
    #[case("1.2", "1.2a", true)]
    #[case("1.0", "1.0v0", true)]
    #[case("1.0v0", "1.0", false)]
    #[case("2.0", "1.5v1", true)]
    #[case("1.0v1", "2.0", false)]
    #[case("2.0rc1", "2.0", true)]
    #[case("2.0", "2.0pl1", true)]
    #[case("2.0alpha", "2.0beta", true)]
    #[case("2.0beta", "2.0alpha", false)]
    #[case("2.0rc1", "2.0rc2", true)]
    #[case("1.0pre1", "1.0", true)]
    #[case("1.0pl1", "1.0p5", false)]
    #[case("1.0", "1.0p0", true)]
    #[case("1.0p1", "1.0p2", true)]
    #[case("1.0p2", "1.0p1", false)]
    #[case("1.2", "1.2.1", true)]
    #[case("1.2.0", "1.2", false)]
    #[case("1.2.1", "1.2", false)]
    #[case("123456789012345678901234", "123456789012345678901235", true)]
    fn is_newer_cases(#[case] installed: &str, #[case] remote: &str, #[case] expected: bool) {
        assert_eq!(is_newer(&v(installed), &v(remote)), expected);
    }

    #[rstest]
    #[case("1.2.3")]
    #[case("2.0rc1p3v2")]
    #[case("0.9.8zh")]
    #[case("1.0pl4")]
    fn is_newer_is_irreflexive(#[case] input: &str) {
        let record = v(input);
        assert!(!is_newer(&record, &record));
    }

    #[test]
    fn suffix_rank_follows_release_maturity() {
        assert!(is_newer(&v("1.0rc1"), &v("1.0")));
        assert!(is_newer(&v("1.0"), &v("1.0pl1")));
        assert!(is_newer(&v("1.0alpha"), &v("1.0beta")));
        assert!(Suffix::Pre < Suffix::Stable);
        assert!(Suffix::Stable < Suffix::Pl);
    }

    #[test]
    fn raising_one_field_with_higher_fields_held_flips_result() {
        // each pair differs only in the named field; all higher fields equal
        let pairs = [
            ("1.2beta3p4v1", "1.2beta3p4v2"),
            ("1.2beta3p4v1", "1.3beta3p4v1"),
            ("1.2beta3p4v1", "1.2rc3p4v1"),
            ("1.2beta3p4v1", "1.2beta4p4v1"),
            ("1.2beta3p4v1", "1.2beta3p5v1"),
        ];
        for (low, high) in pairs {
            assert!(!is_newer(&v(high), &v(low)), "{high} should not beat {low}");
            assert!(is_newer(&v(low), &v(high)), "{high} should beat {low}");
        }
    }
}
