/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::package_key
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Shared structure describing a repository package key as
    listed by Aptly, e.g.
    `Psource kactivities-kf5 5.18.0+git20160312.0713+15.10-0 8ebad520d672f51c`.

  Security / Safety Notes:
    Pure data container; no I/O performed in this module.

  Dependencies:
    serde for report serialization.

  Operational Scope:
    Produced from repository listings; consumed by filtering,
    reconciliation, cleaning and auditing.

  Revision History:
    2024-11-04 COD  Introduced shared package metadata type.
    2026-02-11 HS   Reworked into Aptly package keys.
  ------------------------------------------------------------
  Principles Observed:
    - Clear data contracts between modules
    - Malformed listings fail loudly
============================================================*/

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::Serialize;

use crate::error::{PangeaError, Result};
use crate::version::Version;

/// Architecture token of source package keys.
pub const SOURCE_ARCH: &str = "source";

/// A package key: architecture, name, version and the repository uid.
///
/// The uid only identifies the exact entry for deletion; it never takes part
/// in version comparisons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageKey {
    pub architecture: String,
    pub name: String,
    pub version: Version,
    pub uid: String,
}

impl PackageKey {
    /// Parse a `P<arch> <name> <version> <uid>` line.
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [arch, name, version, uid] = fields.as_slice() else {
            return Err(PangeaError::Argument(format!(
                "package key must have 4 fields, got {}: `{line}`",
                fields.len()
            )));
        };

        let architecture = match arch.strip_prefix('P') {
            Some(architecture) if !architecture.is_empty() => architecture,
            _ => {
                return Err(PangeaError::Argument(format!(
                    "package key does not start with P<arch>: `{line}`"
                )))
            }
        };

        Ok(Self {
            architecture: architecture.to_string(),
            name: name.to_string(),
            version: Version::parse(version)?,
            uid: uid.to_string(),
        })
    }

    pub fn is_source(&self) -> bool {
        self.architecture == SOURCE_ARCH
    }
}

impl FromStr for PackageKey {
    type Err = PangeaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for PackageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P{} {} {} {}",
            self.architecture, self.name, self.version, self.uid
        )
    }
}

/// Parse every line of a repository listing, stopping at the first bad one.
pub fn parse_keys<S: AsRef<str>>(lines: &[S]) -> Result<Vec<PackageKey>> {
    lines.iter().map(|line| PackageKey::parse(line.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_source_key() {
        let key = PackageKey::parse(
            "Psource kactivities-kf5 5.18.0+git20160312.0713+15.10-0 8ebad520d672f51c",
        )
        .unwrap();
        assert_eq!(key.architecture, "source");
        assert_eq!(key.name, "kactivities-kf5");
        assert_eq!(key.version.full(), "5.18.0+git20160312.0713+15.10-0");
        assert_eq!(key.uid, "8ebad520d672f51c");
        assert!(key.is_source());
        assert_eq!(
            key.to_string(),
            "Psource kactivities-kf5 5.18.0+git20160312.0713+15.10-0 8ebad520d672f51c"
        );
    }

    #[test]
    fn parse_binary_key() {
        let key: PackageKey = "Pamd64 libkactivites 4 abc".parse().unwrap();
        assert_eq!(key.architecture, "amd64");
        assert!(!key.is_source());
    }

    #[test]
    fn wrong_field_count_is_an_argument_error() {
        for line in [
            "Psource kactivities-kf5 3",
            "Psource kactivities-kf5 3 ghi extra",
            "",
        ] {
            assert!(
                matches!(PackageKey::parse(line), Err(PangeaError::Argument(_))),
                "{line}"
            );
        }
    }

    #[test]
    fn missing_architecture_prefix_is_an_argument_error() {
        assert!(matches!(
            PackageKey::parse("source kactivities-kf5 3 ghi"),
            Err(PangeaError::Argument(_))
        ));
        assert!(matches!(
            PackageKey::parse("P kactivities-kf5 3 ghi"),
            Err(PangeaError::Argument(_))
        ));
    }

    #[test]
    fn bad_version_is_a_format_error() {
        assert!(matches!(
            PackageKey::parse("Psource kactivities-kf5 x:3 ghi"),
            Err(PangeaError::Format(_))
        ));
    }

    #[test]
    fn parse_keys_fails_on_first_malformed_line() {
        let lines = ["Psource a 1 x", "garbage"];
        assert!(parse_keys(&lines).is_err());
        assert_eq!(parse_keys(&lines[..1]).unwrap().len(), 1);
    }
}
