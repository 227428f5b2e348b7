/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::enforcer
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Guard against Debian epoch changes between builds that
    were not approved by a human.

  Security / Safety Notes:
    Reads and overwrites a single record file in the build
    workspace; nothing else is touched.

  Dependencies:
    std::fs only.

  Operational Scope:
    Consulted once per source build. The record is written only
    after a successful, validated build.

  Revision History:
    2026-02-11 HS   Ported version enforcer.
  ------------------------------------------------------------
  Principles Observed:
    - Failed validation never mutates state
    - Removing the record file is the only override
============================================================*/

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{PangeaError, Result};
use crate::version::Version;

/// Default record file, relative to the build workspace.
pub const RECORD_FILE: &str = "last_version";

/// Loads the previously built version from a record file and validates new
/// versions against it.
///
/// Validation fails iff the epoch differs from the recorded one, be it added,
/// removed, lowered or bumped. Upstream and revision are not checked here.
#[derive(Debug)]
pub struct VersionEnforcer {
    record_path: PathBuf,
    old_version: Option<Version>,
}

impl VersionEnforcer {
    /// Load prior state from `record_path`. A missing file means no prior
    /// version.
    pub fn load(record_path: impl Into<PathBuf>) -> Result<Self> {
        let record_path = record_path.into();
        let old_version = match fs::read_to_string(&record_path) {
            Ok(content) => Some(Version::parse(content.trim())?),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                return Err(PangeaError::Filesystem(format!(
                    "Failed to read version record {}: {err}",
                    record_path.display()
                )))
            }
        };

        Ok(Self {
            record_path,
            old_version,
        })
    }

    pub fn old_version(&self) -> Option<&Version> {
        self.old_version.as_ref()
    }

    pub fn record_path(&self) -> &Path {
        &self.record_path
    }

    /// Validate `candidate` against the recorded version.
    pub fn validate(&self, candidate: &str) -> Result<()> {
        let Some(old_version) = &self.old_version else {
            return Ok(());
        };
        let new_version = Version::parse(candidate)?;
        validate_epochs(old_version.epoch(), new_version.epoch())
    }

    /// Persist `version` verbatim as the new record.
    pub fn record(&self, version: &str) -> Result<()> {
        fs::write(&self.record_path, version).map_err(|err| {
            PangeaError::Filesystem(format!(
                "Failed to write version record {}: {err}",
                self.record_path.display()
            ))
        })
    }
}

fn validate_epochs(old_epoch: Option<u64>, new_epoch: Option<u64>) -> Result<()> {
    if old_epoch == new_epoch {
        return Ok(());
    }
    let describe = |epoch: Option<u64>| epoch.map_or_else(|| "none".to_string(), |e| e.to_string());
    Err(PangeaError::UnauthorizedChange {
        old: describe(old_epoch),
        new: describe(new_epoch),
    })
}
