/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::filter
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Reduce package listings to the latest version(s) of each
    package name.

  Security / Safety Notes:
    Pure computation; no I/O performed in this module.

  Dependencies:
    indexmap for first-occurrence ordering of package groups.

  Operational Scope:
    Used by reconciliation, cleaning and auditing.

  Revision History:
    2026-02-11 HS   Ported latest-version filtering.
  ------------------------------------------------------------
  Principles Observed:
    - Deterministic output order
    - Equal versions are never split
============================================================*/

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::package_key::PackageKey;
use crate::version::Version;

/// Filters latest versions out of a list of package keys.
pub struct LatestVersionFilter;

impl LatestVersionFilter {
    /// Keep the `keep_amount` highest versions of every package name.
    ///
    /// All keys sharing a retained version are kept. Groups appear in order of
    /// first occurrence, keys within a group ascend by version.
    pub fn filter(keys: &[PackageKey], keep_amount: usize) -> Vec<PackageKey> {
        let keep_amount = keep_amount.max(1);

        let mut by_name: IndexMap<&str, Vec<&PackageKey>> = IndexMap::new();
        for key in keys {
            by_name.entry(key.name.as_str()).or_default().push(key);
        }

        by_name
            .into_values()
            .flat_map(|group| {
                let mut versions = Self::debian_versions(group);
                let drop = versions.len().saturating_sub(keep_amount);
                versions.drain(..drop);
                versions.into_iter().flat_map(|(_, keys)| keys)
            })
            .cloned()
            .collect()
    }

    /// Group keys by version, ascending. Keys with equal versions keep their
    /// input order.
    pub fn debian_versions<'a, I>(keys: I) -> Vec<(Version, Vec<&'a PackageKey>)>
    where
        I: IntoIterator<Item = &'a PackageKey>,
    {
        let mut versions: BTreeMap<Version, Vec<&'a PackageKey>> = BTreeMap::new();
        for key in keys {
            versions.entry(key.version.clone()).or_default().push(key);
        }
        versions.into_iter().collect()
    }

    /// Highest version among `keys`, if any.
    pub fn latest<'a, I>(keys: I) -> Option<Version>
    where
        I: IntoIterator<Item = &'a PackageKey>,
    {
        keys.into_iter().map(|key| &key.version).max().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_key::parse_keys;

    fn keys(lines: &[&str]) -> Vec<PackageKey> {
        parse_keys(lines).unwrap()
    }

    fn versions_of(filtered: &[PackageKey], name: &str) -> Vec<String> {
        filtered
            .iter()
            .filter(|key| key.name == name)
            .map(|key| key.version.full())
            .collect()
    }

    const PACKAGES: [&str; 6] = [
        "Pall kitteh 999 66f130f348dc4864",
        "Pall kitteh 997 66f130f348dc4864",
        "Pall kitteh 998 66f130f348dc4864",
        "Pamd64 doge 1 66f130f348dc4864",
        "Pamd64 doge 3 66f130f348dc4864",
        "Pamd64 doge 2 66f130f348dc4864",
    ];

    #[test]
    fn keeps_latest_version_per_name() {
        let filtered = LatestVersionFilter::filter(&keys(&PACKAGES), 1);
        assert_eq!(versions_of(&filtered, "kitteh"), vec!["999"]);
        assert_eq!(versions_of(&filtered, "doge"), vec!["3"]);
    }

    #[test]
    fn keeps_top_n_versions() {
        let filtered = LatestVersionFilter::filter(&keys(&PACKAGES), 2);
        assert_eq!(versions_of(&filtered, "kitteh"), vec!["998", "999"]);
        assert_eq!(versions_of(&filtered, "doge"), vec!["2", "3"]);
    }

    #[test]
    fn groups_follow_first_occurrence() {
        let filtered = LatestVersionFilter::filter(&keys(&PACKAGES), 1);
        let names: Vec<&str> = filtered.iter().map(|key| key.name.as_str()).collect();
        assert_eq!(names, vec!["kitteh", "doge"]);
    }

    #[test]
    fn equal_versions_are_all_retained() {
        let input = keys(&[
            "Pamd64 libfoo 2 aaa",
            "Pi386 libfoo 2 bbb",
            "Pamd64 libfoo 1 ccc",
            "Parmhf libfoo 2-0 ddd",
        ]);
        let filtered = LatestVersionFilter::filter(&input, 1);
        let uids: Vec<&str> = filtered.iter().map(|key| key.uid.as_str()).collect();
        assert_eq!(uids, vec!["aaa", "bbb", "ddd"]);
    }

    #[test]
    fn zero_keep_amount_is_treated_as_one() {
        let filtered = LatestVersionFilter::filter(&keys(&PACKAGES), 0);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn filter_is_idempotent() {
        let input = keys(&PACKAGES);
        for keep in 1..=3 {
            let once = LatestVersionFilter::filter(&input, keep);
            let twice = LatestVersionFilter::filter(&once, keep);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn latest_picks_maximum() {
        let input = keys(&PACKAGES);
        assert_eq!(
            LatestVersionFilter::latest(input.iter().filter(|k| k.name == "doge")),
            Some(Version::parse("3").unwrap())
        );
        assert_eq!(LatestVersionFilter::latest(std::iter::empty::<&PackageKey>()), None);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(LatestVersionFilter::filter(&[], 1).is_empty());
    }

    #[test]
    fn debian_versions_groups_equal_versions_in_input_order() {
        let keys = keys(&[
            "Pamd64 kio 5.74.0-1 a2",
            "Pi386 kio 5.73.0-1 a1",
            "Pi386 kio 5.74.0-1 a3",
            "Pamd64 kio 5.9.0-1 a0",
        ]);
        let grouped = LatestVersionFilter::debian_versions(&keys);

        let versions: Vec<String> = grouped.iter().map(|(v, _)| v.full()).collect();
        assert_eq!(versions, vec!["5.9.0-1", "5.73.0-1", "5.74.0-1"]);
        let newest: Vec<&str> = grouped[2].1.iter().map(|key| key.uid.as_str()).collect();
        assert_eq!(newest, vec!["a2", "a3"]);
    }
}
