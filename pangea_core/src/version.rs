/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::version
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Parse Debian version strings into epoch, upstream and
    revision components and order them per Debian policy.

  Security / Safety Notes:
    Pure computation; no I/O performed in this module.

  Dependencies:
    serde for serializing versions into reports.

  Operational Scope:
    Foundation for filtering, enforcement, reconciliation and
    auditing. Replaces shelling out to `dpkg --compare-versions`.

  Revision History:
    2026-02-11 HS   Native Debian version ordering.
  ------------------------------------------------------------
  Principles Observed:
    - Total ordering consistent with equality
    - Arbitrary precision numeric runs
============================================================*/

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{PangeaError, Result};

/// A Debian package version, `[epoch:]upstream[-revision]`.
///
/// Equality follows the ordering, so `1-0`, `0:1` and `1` are all equal even
/// though they serialize differently. For that reason `Version` does not
/// implement `Hash`.
#[derive(Debug, Clone)]
pub struct Version {
    epoch: Option<u64>,
    upstream: String,
    revision: Option<String>,
}

impl Version {
    /// Parse a version string.
    ///
    /// The epoch is everything before the last `:`, the revision everything
    /// after the last `-`. Fails on empty input, whitespace, a non-numeric
    /// epoch or an empty upstream part.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(PangeaError::Format("empty version string".into()));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(PangeaError::Format(format!(
                "version `{s}` contains whitespace"
            )));
        }

        let (epoch, remainder) = match s.rsplit_once(':') {
            Some((epoch, remainder)) => (Some(parse_epoch(epoch, s)?), remainder),
            None => (None, s),
        };

        let (upstream, revision) = match remainder.rsplit_once('-') {
            Some((upstream, revision)) => (upstream, Some(revision.to_string())),
            None => (remainder, None),
        };

        if upstream.is_empty() {
            return Err(PangeaError::Format(format!(
                "version `{s}` has an empty upstream component"
            )));
        }

        Ok(Self {
            epoch,
            upstream: upstream.to_string(),
            revision,
        })
    }

    /// Explicit epoch, if the version string carried one.
    pub fn epoch(&self) -> Option<u64> {
        self.epoch
    }

    /// Epoch used for comparison; absent means `0`.
    pub fn epoch_assumed(&self) -> u64 {
        self.epoch.unwrap_or(0)
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// Replace the upstream part while keeping epoch and revision.
    pub fn set_upstream(&mut self, upstream: impl Into<String>) -> Result<()> {
        let upstream = upstream.into();
        if upstream.is_empty() || upstream.chars().any(char::is_whitespace) {
            return Err(PangeaError::Format(format!(
                "invalid upstream component `{upstream}`"
            )));
        }
        self.upstream = upstream;
        Ok(())
    }

    /// Serialized form, `[epoch:]upstream[-revision]`.
    pub fn full(&self) -> String {
        self.to_string()
    }

    /// Just the upstream part, without epoch or revision.
    pub fn upstream_only(&self) -> Version {
        Version {
            epoch: None,
            upstream: self.upstream.clone(),
            revision: None,
        }
    }
}

fn parse_epoch(epoch: &str, full: &str) -> Result<u64> {
    if epoch.is_empty() || !epoch.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PangeaError::Format(format!(
            "epoch of `{full}` has non-digit characters"
        )));
    }
    epoch
        .parse::<u64>()
        .map_err(|err| PangeaError::Format(format!("epoch of `{full}` out of range: {err}")))
}

impl FromStr for Version {
    type Err = PangeaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(epoch) = self.epoch {
            write!(f, "{epoch}:")?;
        }
        f.write_str(&self.upstream)?;
        if let Some(revision) = &self.revision {
            write!(f, "-{revision}")?;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch_assumed()
            .cmp(&other.epoch_assumed())
            .then_with(|| compare_fragment(&self.upstream, &other.upstream))
            .then_with(|| {
                compare_fragment(
                    self.revision.as_deref().unwrap_or(""),
                    other.revision.as_deref().unwrap_or(""),
                )
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

/// Relational operator between two versions, as accepted by
/// `dpkg --compare-versions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl Relation {
    pub fn holds(self, a: &Version, b: &Version) -> bool {
        let ordering = a.cmp(b);
        match self {
            Relation::Lt => ordering == Ordering::Less,
            Relation::Le => ordering != Ordering::Greater,
            Relation::Eq => ordering == Ordering::Equal,
            Relation::Ne => ordering != Ordering::Equal,
            Relation::Ge => ordering != Ordering::Less,
            Relation::Gt => ordering == Ordering::Greater,
        }
    }
}

impl FromStr for Relation {
    type Err = PangeaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lt" | "<<" => Ok(Relation::Lt),
            "le" | "<=" => Ok(Relation::Le),
            "eq" | "=" => Ok(Relation::Eq),
            "ne" => Ok(Relation::Ne),
            "ge" | ">=" => Ok(Relation::Ge),
            "gt" | ">>" => Ok(Relation::Gt),
            other => Err(PangeaError::Argument(format!(
                "unknown version relation `{other}`"
            ))),
        }
    }
}

/// Weight of a character inside a non-digit run. `None` is the end of the run.
fn char_order(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(b'~') => -1,
        Some(c) if c.is_ascii_alphabetic() => i32::from(c),
        Some(c) => i32::from(c) + 256,
    }
}

fn split_run(s: &[u8], digits: bool) -> (&[u8], &[u8]) {
    let end = s
        .iter()
        .position(|c| c.is_ascii_digit() != digits)
        .unwrap_or(s.len());
    s.split_at(end)
}

fn compare_lexical(a: &[u8], b: &[u8]) -> Ordering {
    for i in 0..a.len().max(b.len()) {
        let ordering = char_order(a.get(i).copied()).cmp(&char_order(b.get(i).copied()));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_numeric(a: &[u8], b: &[u8]) -> Ordering {
    let trim = |s: &[u8]| -> usize { s.iter().position(|&c| c != b'0').unwrap_or(s.len()) };
    let a = &a[trim(a)..];
    let b = &b[trim(b)..];
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Debian fragment comparison: alternate non-digit and digit runs until both
/// sides are exhausted.
fn compare_fragment(a: &str, b: &str) -> Ordering {
    let mut a = a.as_bytes();
    let mut b = b.as_bytes();

    while !a.is_empty() || !b.is_empty() {
        let (a_lexical, a_rest) = split_run(a, false);
        let (b_lexical, b_rest) = split_run(b, false);
        match compare_lexical(a_lexical, b_lexical) {
            Ordering::Equal => {}
            ordering => return ordering,
        }

        let (a_digits, a_rest) = split_run(a_rest, true);
        let (b_digits, b_rest) = split_run(b_rest, true);
        match compare_numeric(a_digits, b_digits) {
            Ordering::Equal => {}
            ordering => return ordering,
        }

        a = a_rest;
        b = b_rest;
    }

    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn parse_components() {
        let version = v("5:2.10+git20150717.1756+15.04-0");
        assert_eq!(version.epoch(), Some(5));
        assert_eq!(version.upstream(), "2.10+git20150717.1756+15.04");
        assert_eq!(version.revision(), Some("0"));

        let version = v("3.3.2.final~github");
        assert_eq!(version.epoch(), None);
        assert_eq!(version.upstream(), "3.3.2.final~github");
        assert_eq!(version.revision(), None);

        let version = v("0.18.0+dfsg-2+b1");
        assert_eq!(version.upstream(), "0.18.0+dfsg");
        assert_eq!(version.revision(), Some("2+b1"));

        let version = v("1.2-3-4");
        assert_eq!(version.upstream(), "1.2-3");
        assert_eq!(version.revision(), Some("4"));
    }

    #[test]
    fn full_round_trips() {
        for s in [
            "1:4.7.0+dfsg1-2",
            "3.3.2.final~github",
            "0.18.0+dfsg-2+b1",
            "5:2.10+git20150717.1756+15.04-0",
            "1.0~rc1",
        ] {
            let version = v(s);
            assert_eq!(version.full(), s);
            assert_eq!(v(&version.full()), version);
        }
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(matches!(Version::parse(""), Err(PangeaError::Format(_))));
        assert!(matches!(Version::parse("1.0 -1"), Err(PangeaError::Format(_))));
        assert!(matches!(Version::parse("a:1.0"), Err(PangeaError::Format(_))));
        assert!(matches!(Version::parse(":1.0"), Err(PangeaError::Format(_))));
        assert!(matches!(Version::parse("1:-1"), Err(PangeaError::Format(_))));
        assert!(matches!(Version::parse("1:2:3"), Err(PangeaError::Format(_))));
    }

    #[test]
    fn tilde_sorts_before_everything() {
        assert!(v("1~") < v("1"));
        assert!(v("1") < v("1a"));
        assert!(v("1.0~beta1~svn1245") < v("1.0~beta1"));
        assert!(v("1.0~beta1") < v("1.0"));
        assert!(v("1.0~~") < v("1.0~~a"));
        assert!(v("1.0~~a") < v("1.0~"));
    }

    #[test]
    fn letters_sort_before_other_characters() {
        assert!(v("1.0a") < v("1.0+"));
        assert!(v("1.0+") < v("1.0."));
        assert!(v("1.0") < v("1.0.1"));
    }

    #[test]
    fn epoch_dominates() {
        assert!(v("1:0") > v("1"));
        assert!(v("1:0.1") > v("99.9-9"));
        assert!(v("2:1.0") > v("1:5.0"));
    }

    #[test]
    fn absent_revision_equals_zero_revision() {
        assert_eq!(v("1-0"), v("1"));
        assert_eq!(v("0:1-0"), v("1"));
        assert!(v("1") < v("1-1"));
    }

    #[test]
    fn leading_zeros_are_ignored() {
        assert_eq!(v("1.002"), v("1.2"));
        assert!(v("1.010") > v("1.9"));
    }

    #[test]
    fn numeric_runs_do_not_overflow() {
        assert!(v("20150717175600") > v("20150717175599"));
        assert!(v("20150717175600000000000") > v("20150717175599999999999"));
        assert!(v("1.99999999999999999999999") < v("2"));
    }

    #[test]
    fn ordering_is_total_and_transitive() {
        let versions: Vec<Version> = [
            "1~", "1", "1-0", "1a", "1.0", "1.0-1", "1:0", "0:1", "1.0~rc1", "2.0+git1",
            "2.0", "1:1.0-2",
        ]
        .iter()
        .map(|s| v(s))
        .collect();

        for a in &versions {
            for b in &versions {
                let forward = a.cmp(b);
                assert_eq!(forward.reverse(), b.cmp(a), "{a} vs {b}");
                assert_eq!(forward == Ordering::Equal, a == b);
                for c in &versions {
                    if a < b && b < c {
                        assert!(a < c, "{a} < {b} < {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn set_upstream_keeps_epoch_and_revision() {
        let mut version = v("1:5.18.0+git20160312.0713+15.10-0");
        version.set_upstream("5.19.0").unwrap();
        assert_eq!(version.full(), "1:5.19.0-0");
        assert!(version.set_upstream("").is_err());
        assert_eq!(version.upstream(), "5.19.0");
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&v("1:2.0-1")).unwrap();
        assert_eq!(json, "\"1:2.0-1\"");
    }

    #[test]
    fn upstream_only_drops_epoch_and_revision() {
        assert_eq!(v("4:5.74.1-0neon").upstream_only().full(), "5.74.1");
    }

    #[test]
    fn relations_follow_dpkg_operators() {
        let (old, new) = (v("1.0-1"), v("1.0-2"));
        let cases = [
            ("lt", true),
            ("<<", true),
            ("le", true),
            ("eq", false),
            ("ne", true),
            (">=", false),
            ("gt", false),
        ];
        for (op, expected) in cases {
            let relation: Relation = op.parse().unwrap();
            assert_eq!(relation.holds(&old, &new), expected, "{op}");
        }
        assert!(Relation::Eq.holds(&v("1-0"), &v("1")));
        assert!(matches!("<>".parse::<Relation>(), Err(PangeaError::Argument(_))));
    }
}
