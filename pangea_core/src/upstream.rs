/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::upstream
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Discover the latest released product versions from a local
    mirror of the upstream release tarball tree.

  Security / Safety Notes:
    Read-only directory traversal. Unpublished (not world
    readable) releases are never reported.

  Dependencies:
    regex for tarball names, walkdir for the release tree, libc
    for permission bits, indexmap for deterministic product order.

  Operational Scope:
    Supplies the expected versions of `pangea-core audit`.

  Revision History:
    2026-02-11 HS   Ported release tarball scan.
  ------------------------------------------------------------
  Principles Observed:
    - Of the two newest releases, only a published one counts
    - Hotfix tarballs supersede their siblings
============================================================*/

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{PangeaError, Result};
use crate::logger::Logger;
use crate::version::Version;

const SIGNATURE_SUFFIXES: [&str; 2] = [".sig", ".asc"];

/// Scanner over `<root>/<scope>/<version>/**/<product>-<version>.tar.*`.
pub struct UpstreamReleases {
    root: PathBuf,
    tarball: Regex,
}

impl UpstreamReleases {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let tarball = Regex::new(r"(?<product>[-\w]+)-(?<version>[\d.]+)\.tar.+")
            .map_err(|err| PangeaError::Runtime(format!("Invalid tarball pattern: {err}")))?;
        Ok(Self {
            root: root.into(),
            tarball,
        })
    }

    /// Product versions released in the latest published release of each
    /// scope. A product seen more than once keeps its greatest version.
    pub fn scan(&self, scopes: &[String], logger: &Logger) -> Result<IndexMap<String, Version>> {
        let mut products: IndexMap<String, Version> = IndexMap::new();
        for scope in scopes {
            let release = self.latest_release_dir(scope, logger)?;
            logger.info(
                "UPSTREAM",
                format!("Scanning {} for {scope}", release.display()),
            );

            for path in tarballs(&release)? {
                let (product, version) = self.parse_tarball(&path)?;
                match products.get_mut(&product) {
                    Some(known) if *known >= version => {}
                    Some(known) => *known = version,
                    None => {
                        products.insert(product, version);
                    }
                }
            }
        }
        Ok(products)
    }

    fn latest_release_dir(&self, scope: &str, logger: &Logger) -> Result<PathBuf> {
        let scope_dir = self.root.join(scope);
        let mut releases: Vec<(Version, PathBuf)> = Vec::new();
        let entries = WalkDir::new(&scope_dir).min_depth(1).max_depth(1);
        for entry in entries {
            let entry = entry.map_err(|err| walk_error(&scope_dir, err))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_str().ok_or_else(|| {
                PangeaError::Format(format!("Unreadable release name {}", entry.path().display()))
            })?;
            releases.push((Version::parse(name)?, entry.into_path()));
        }
        releases.sort_by(|a, b| a.0.cmp(&b.0));

        for (version, path) in releases.iter().rev().take(2) {
            if is_world_readable(path)? {
                return Ok(path.clone());
            }
            logger.warn(
                "UPSTREAM",
                format!("Version {version} of {scope} is not world readable; skipping it"),
            );
        }

        Err(PangeaError::Runtime(format!(
            "Neither of the two latest releases in {} is world readable",
            scope_dir.display()
        )))
    }

    fn parse_tarball(&self, path: &Path) -> Result<(String, Version)> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let captures = self
            .tarball
            .captures(name)
            .ok_or_else(|| PangeaError::Format(format!("Failed to parse tarball name {name}")))?;
        let version = Version::parse(&captures["version"])?;
        Ok((captures["product"].to_string(), version))
    }
}

fn is_world_readable(path: &Path) -> Result<bool> {
    let metadata = fs::metadata(path).map_err(|err| {
        PangeaError::Filesystem(format!("Failed to stat {}: {err}", path.display()))
    })?;
    Ok((metadata.permissions().mode() & libc::S_IROTH as u32) != 0)
}

/// Release tarballs below `dir`, signatures excluded. Symlinks are not
/// followed.
fn tarballs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| walk_error(dir, err))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if name.contains(".tar.") && !SIGNATURE_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

fn walk_error(dir: &Path, err: walkdir::Error) -> PangeaError {
    PangeaError::Filesystem(format!("Failed to walk {}: {err}", dir.display()))
}
