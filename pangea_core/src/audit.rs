/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::audit
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Compare the versions we ship against the versions of the
    latest upstream release tarballs and collect violations.

  Security / Safety Notes:
    Pure computation; no I/O performed in this module.

  Dependencies:
    indexmap for deterministic report order, serde for report
    output.

  Operational Scope:
    Invoked by `pangea-core audit` after reconciling a
    repository's sources.

  Revision History:
    2026-02-11 HS   Ported release version audit.
  ------------------------------------------------------------
  Principles Observed:
    - Violations are data, the audit always completes
    - Suggestions aid humans and never change the verdict
============================================================*/

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;
use serde::Serialize;

use crate::filter::LatestVersionFilter;
use crate::package_key::PackageKey;
use crate::spelling;
use crate::version::Version;

/// A discrepancy between upstream releases and the repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    MissingPackage {
        name: String,
        suggested_corrections: Vec<String>,
    },
    WrongVersion {
        name: String,
        expected_version: Version,
        actual_version: Version,
    },
}

impl Violation {
    pub fn name(&self) -> &str {
        match self {
            Violation::MissingPackage { name, .. } | Violation::WrongVersion { name, .. } => name,
        }
    }

    /// Short classifier for report sinks.
    pub fn kind(&self) -> &'static str {
        match self {
            Violation::MissingPackage { .. } => "MissingPackageViolation",
            Violation::WrongVersion { .. } => "WrongVersionViolation",
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingPackage {
                name,
                suggested_corrections,
            } => {
                write!(f, "{name} not found in repository.")?;
                if !suggested_corrections.is_empty() {
                    write!(f, " Did you mean: {}?", suggested_corrections.join(", "))?;
                }
                Ok(())
            }
            Violation::WrongVersion {
                name,
                expected_version,
                actual_version,
            } => write!(
                f,
                "{name} has version {actual_version} but upstream released {expected_version}."
            ),
        }
    }
}

/// Result of an audit run.
#[derive(Debug, Default)]
pub struct AuditOutcome {
    pub violations: Vec<Violation>,
    /// Local packages no upstream release accounted for.
    pub unmatched: IndexMap<String, Version>,
}

/// Checks local package versions against expected upstream versions.
pub struct VersionAudit<'a> {
    blacklist: &'a [String],
    name_aliases: &'a BTreeMap<String, String>,
}

impl<'a> VersionAudit<'a> {
    /// `name_aliases` maps remote product names to local names.
    pub fn new(blacklist: &'a [String], name_aliases: &'a BTreeMap<String, String>) -> Self {
        Self {
            blacklist,
            name_aliases,
        }
    }

    pub fn run(
        &self,
        mut local: IndexMap<String, Version>,
        expected: &IndexMap<String, Version>,
    ) -> AuditOutcome {
        let known_names: Vec<String> = local.keys().cloned().collect();
        let mut violations = Vec::new();

        for (remote_name, remote_version) in expected {
            let local_name = self
                .name_aliases
                .get(remote_name)
                .map(String::as_str)
                .unwrap_or(remote_name);
            if self.is_blacklisted(remote_name) || self.is_blacklisted(local_name) {
                continue;
            }

            let Some(local_version) = local.shift_remove(local_name) else {
                violations.push(Violation::MissingPackage {
                    name: remote_name.clone(),
                    suggested_corrections: spelling::corrections(remote_name, &known_names),
                });
                continue;
            };

            if local_version != *remote_version {
                violations.push(Violation::WrongVersion {
                    name: remote_name.clone(),
                    expected_version: remote_version.clone(),
                    actual_version: local_version,
                });
            }
        }

        AuditOutcome {
            violations,
            unmatched: local,
        }
    }

    fn is_blacklisted(&self, name: &str) -> bool {
        self.blacklist.iter().any(|entry| entry == name)
    }
}

/// Audit `local` against `expected`, returning every violation found.
pub fn audit(
    local: &IndexMap<String, Version>,
    expected: &IndexMap<String, Version>,
    blacklist: &[String],
    name_aliases: &BTreeMap<String, String>,
) -> Vec<Violation> {
    VersionAudit::new(blacklist, name_aliases)
        .run(local.clone(), expected)
        .violations
}

/// Latest upstream version per source, keyed by KDE product name.
pub fn local_versions(
    sources: &[PackageKey],
    debian_to_kde_names: &BTreeMap<String, String>,
) -> IndexMap<String, Version> {
    let mut by_name: IndexMap<&str, Vec<&PackageKey>> = IndexMap::new();
    for key in sources {
        let name = debian_to_kde_names
            .get(&key.name)
            .map(String::as_str)
            .unwrap_or(&key.name);
        by_name.entry(name).or_default().push(key);
    }

    by_name
        .into_iter()
        .filter_map(|(name, keys)| {
            let latest = LatestVersionFilter::latest(keys)?;
            Some((name.to_string(), latest.upstream_only()))
        })
        .collect()
}

/// Version of each release scope, taken from its key package.
pub fn scoped_versions(
    local: &IndexMap<String, Version>,
    scope_keys: &IndexMap<String, String>,
) -> IndexMap<String, Option<Version>> {
    scope_keys
        .iter()
        .map(|(key_package, scope)| (scope.clone(), local.get(key_package).cloned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_key::parse_keys;

    fn versions(entries: &[(&str, &str)]) -> IndexMap<String, Version> {
        entries
            .iter()
            .map(|(name, version)| (name.to_string(), Version::parse(version).unwrap()))
            .collect()
    }

    fn run(
        local: &[(&str, &str)],
        expected: &[(&str, &str)],
        blacklist: &[&str],
        aliases: &[(&str, &str)],
    ) -> Vec<Violation> {
        let blacklist: Vec<String> = blacklist.iter().map(|s| s.to_string()).collect();
        let aliases: BTreeMap<String, String> = aliases
            .iter()
            .map(|(remote, local)| (remote.to_string(), local.to_string()))
            .collect();
        audit(&versions(local), &versions(expected), &blacklist, &aliases)
    }

    #[test]
    fn missing_package_is_reported() {
        let violations = run(&[], &[("frobnicator", "2.0")], &[], &[]);
        assert_eq!(
            violations,
            vec![Violation::MissingPackage {
                name: "frobnicator".into(),
                suggested_corrections: vec![],
            }]
        );
    }

    #[test]
    fn missing_package_carries_suggestions() {
        let violations = run(&[("kactivities", "5.74.0")], &[("kactivitie", "5.74.0")], &[], &[]);
        assert_eq!(violations.len(), 1);
        let Violation::MissingPackage {
            suggested_corrections,
            ..
        } = &violations[0]
        else {
            panic!("expected missing package, got {:?}", violations[0]);
        };
        assert_eq!(suggested_corrections, &vec!["kactivities".to_string()]);
    }

    #[test]
    fn wrong_version_is_reported() {
        let violations = run(&[("kio", "5.74.0")], &[("kio", "5.74.1")], &[], &[]);
        assert_eq!(
            violations,
            vec![Violation::WrongVersion {
                name: "kio".into(),
                expected_version: Version::parse("5.74.1").unwrap(),
                actual_version: Version::parse("5.74.0").unwrap(),
            }]
        );
        assert_eq!(
            violations[0].to_string(),
            "kio has version 5.74.0 but upstream released 5.74.1."
        );
    }

    #[test]
    fn agreement_yields_no_violations() {
        let violations = run(
            &[("kio", "5.74.1"), ("okular", "20.08.3"), ("plasma-tests", "1")],
            &[("kio", "5.74.1"), ("okular", "20.08.3"), ("plasma-tests", "5.20.0")],
            &["plasma-tests"],
            &[],
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn blacklisted_products_are_skipped() {
        let violations = run(&[], &[("plasma-tests", "5.20.0")], &["plasma-tests"], &[]);
        assert!(violations.is_empty());
    }

    #[test]
    fn aliases_resolve_remote_names() {
        let violations = run(
            &[("kdeconnect-kde", "20.08.3")],
            &[("kdeconnect", "20.08.3")],
            &[],
            &[("kdeconnect", "kdeconnect-kde")],
        );
        assert!(violations.is_empty());

        let violations = run(
            &[],
            &[("tests", "1.0")],
            &["plasma-tests"],
            &[("tests", "plasma-tests")],
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn every_violation_is_collected() {
        let violations = run(
            &[("kio", "5.74.0"), ("kconfig", "5.74.0")],
            &[("kio", "5.74.1"), ("solid", "5.74.0"), ("kconfig", "5.73.0")],
            &[],
            &[],
        );
        let names: Vec<&str> = violations.iter().map(Violation::name).collect();
        assert_eq!(names, vec!["kio", "solid", "kconfig"]);
        assert_eq!(violations[1].kind(), "MissingPackageViolation");
    }

    #[test]
    fn unmatched_locals_are_kept_aside() {
        let blacklist = Vec::new();
        let aliases = BTreeMap::new();
        let outcome = VersionAudit::new(&blacklist, &aliases).run(
            versions(&[("kio", "5.74.1"), ("neon-settings", "0.1")]),
            &versions(&[("kio", "5.74.1")]),
        );
        assert!(outcome.violations.is_empty());
        assert_eq!(
            outcome.unmatched.keys().collect::<Vec<_>>(),
            vec!["neon-settings"]
        );
    }

    #[test]
    fn local_versions_use_latest_upstream_and_kde_names() {
        let sources = parse_keys(&[
            "Psource kactivities-kf5 5.73.0-0neon 1",
            "Psource kactivities-kf5 5.74.0-0neon 2",
            "Psource kio 4:5.74.1+p20.04+git20201020-0neon 3",
        ])
        .unwrap();
        let names: BTreeMap<String, String> =
            [("kactivities-kf5".to_string(), "kactivities".to_string())].into();

        let local = local_versions(&sources, &names);
        assert_eq!(
            local.get("kactivities").map(Version::full).as_deref(),
            Some("5.74.0")
        );
        assert_eq!(
            local.get("kio").map(Version::full).as_deref(),
            Some("5.74.1+p20.04+git20201020")
        );
    }

    #[test]
    fn scoped_versions_follow_key_packages() {
        let local = versions(&[("plasma-workspace", "5.20.2"), ("kconfig", "5.75.0")]);
        let keys: IndexMap<String, String> = [
            ("plasma-workspace".to_string(), "Plasma by KDE".to_string()),
            ("okular".to_string(), "KDE Gear".to_string()),
        ]
        .into_iter()
        .collect();

        let scoped = scoped_versions(&local, &keys);
        assert_eq!(
            scoped.get("Plasma by KDE").cloned().flatten(),
            Some(Version::parse("5.20.2").unwrap())
        );
        assert_eq!(scoped.get("KDE Gear").cloned().flatten(), None);
    }
}
