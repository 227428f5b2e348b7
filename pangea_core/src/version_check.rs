/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::version_check
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Assert that a freshly built package is strictly newer than
    whatever apt currently offers for the same name.

  Security / Safety Notes:
    Pure computation; no I/O performed in this module.

  Dependencies:
    None beyond crate modules.

  Operational Scope:
    Lint step after binary builds.

  Revision History:
    2026-02-11 HS   Ported package version check.
============================================================*/

use crate::error::{PangeaError, Result};
use crate::version::Version;

/// Compares our build of a package against the version available in apt.
#[derive(Debug, Clone)]
pub struct PackageVersionCheck {
    pub name: String,
    pub ours: Version,
    /// `None` when apt has no such package, or only a pure virtual one.
    pub theirs: Option<Version>,
}

impl PackageVersionCheck {
    pub fn new(name: impl Into<String>, ours: Version, theirs: Option<Version>) -> Self {
        Self {
            name: name.into(),
            ours,
            theirs,
        }
    }

    pub fn run(&self) -> Result<()> {
        let Some(theirs) = &self.theirs else {
            return Ok(());
        };
        if self.ours > *theirs {
            return Ok(());
        }
        Err(PangeaError::VersionNotGreater {
            name: self.name.clone(),
            ours: self.ours.full(),
            theirs: theirs.full(),
        })
    }
}
