/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::config
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load Pangea-Core configuration from TOML, falling back to
    the defaults used on the neon build farm.

  Security / Safety Notes:
    Configuration is read-only. The Aptly endpoint is expected
    to be reached through an operator-managed tunnel.

  Dependencies:
    serde + toml for parsing, dirs for the default location.

  Operational Scope:
    Loaded once in `main` and handed to each component as an
    explicit context struct.

  Revision History:
    2024-11-04 COD  Established configuration loader.
    2026-02-11 HS   Repository and audit sections.
  ------------------------------------------------------------
  Principles Observed:
    - Missing file yields documented defaults
    - Explicitly requested files must exist
============================================================*/

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::enforcer::RECORD_FILE;
use crate::error::{PangeaError, Result};

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PangeaConfig {
    pub aptly: AptlyConfig,
    pub repository: RepositoryConfig,
    pub audit: AuditConfig,
    pub paths: PathsConfig,
}

/// Connection and retry settings for the Aptly REST API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AptlyConfig {
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Attempts for read requests.
    pub read_retries: usize,
    /// Attempts for mutating requests.
    pub write_retries: usize,
    pub retry_delay_secs: u64,
    pub max_parallel_queries: usize,
}

impl Default for AptlyConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9090".into(),
            timeout: 60,
            read_retries: 8,
            write_retries: 4,
            retry_delay_secs: 4,
            max_parallel_queries: 4,
        }
    }
}

/// Reconciliation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub host_arch: String,
    /// Never pulled into an install set.
    pub install_exclusion: Vec<String>,
    /// Never purged; removing them breaks the base system.
    pub purge_exclusion: Vec<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            host_arch: host_arch().to_string(),
            install_exclusion: strings(&["base-files", "libblkid1", "libblkid-dev"]),
            purge_exclusion: strings(&[
                "base-files",
                "python3-software-properties",
                "apt",
                "libapt-pkg5.0",
                "libblkid1",
                "libblkid-dev",
                "neon-settings",
                "neon-settings-2",
                "libseccomp2",
                "neon-adwaita",
                "libdrm2",
                "libdrm-dev",
                "libdrm-common",
                "libdrm-test",
                "libdrm2-udeb",
                "libdrm-intel",
                "libdrm-radeon1",
                "libdrm-intel1",
                "libdrm-amdgpu1",
                "libdrm-tests",
                "libdrm-nouveau2",
            ]),
        }
    }
}

/// Version audit settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Upstream products we do not package.
    pub blacklist: Vec<String>,
    /// Debian source name to KDE product name.
    pub debian_to_kde_names: BTreeMap<String, String>,
    /// Remote product name to local name, for products not covered above.
    pub name_aliases: BTreeMap<String, String>,
    /// Key package to release scope display name.
    pub scope_keys: IndexMap<String, String>,
    /// Directories scanned under the release mirror.
    pub scopes: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        let debian_to_kde_names = [
            ("libkf5incidenceeditor", "incidenceeditor"),
            ("libkf5pimcommon", "pimcommon"),
            ("libkf5mailcommon", "mailcommon"),
            ("libkf5mailimporter", "mailimporter"),
            ("libkf5calendarsupport", "calendarsupport"),
            ("libkf5kmahjongg", "libkmahjongg"),
            ("libkf5grantleetheme", "grantleetheme"),
            ("libkf5libkleo", "libkleo"),
            ("libkf5libkdepim", "libkdepim"),
            ("libkf5eventviews", "eventviews"),
            ("libkf5sane", "libksane"),
            ("libkf5kexiv2", "libkexiv2"),
            ("kf5-kdepim-apps-libs", "kdepim-apps-libs"),
            ("libkf5ksieve", "libksieve"),
            ("libkf5gravatar", "libgravatar"),
            ("kf5-messagelib", "messagelib"),
            ("libkf5kgeomap", "libkgeomap"),
            ("libkf5kdcraw", "libkdcraw"),
            ("kde-spectacle", "spectacle"),
            ("libkf5kipi", "libkipi"),
            ("kdeconnect", "kdeconnect-kde"),
            ("kactivities-kf5", "kactivities"),
            ("kdnssd-kf5", "kdnssd"),
            ("kwallet-kf5", "kwallet"),
            ("baloo-kf5", "baloo"),
            ("ksyntax-highlighting", "syntax-highlighting"),
            ("attica-kf5", "attica"),
            ("prison-kf5", "prison"),
            ("kfilemetadata-kf5", "kfilemetadata"),
            ("kcalcore", "kcalendarcore"),
            ("plasma-discover", "discover"),
            ("plasma-mobile", "plasma-phone-components"),
            ("kdevelop-php", "kdev-php"),
            ("kdevelop-python", "kdev-python"),
            ("ktp-kded-integration-module", "ktp-kded-module"),
        ]
        .into_iter()
        .map(|(debian, kde)| (debian.to_string(), kde.to_string()))
        .collect();

        let scope_keys = [
            ("plasma-workspace", "Plasma by KDE"),
            ("kconfig", "KDE Frameworks"),
            ("okular", "KDE Gear"),
        ]
        .into_iter()
        .map(|(key, scope)| (key.to_string(), scope.to_string()))
        .collect();

        Self {
            // Repository of tests only, not useful in production.
            blacklist: strings(&["plasma-tests"]),
            debian_to_kde_names,
            name_aliases: BTreeMap::new(),
            scope_keys,
            scopes: strings(&["release-service", "frameworks", "plasma"]),
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub record_file: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub report: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            record_file: PathBuf::from(RECORD_FILE),
            log_dir: None,
            report: PathBuf::from("versions.json"),
        }
    }
}

impl PangeaConfig {
    /// Load from `path` if given (it must exist), otherwise from the default
    /// location if present, otherwise defaults.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load_from_path(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            PangeaError::Config(format!(
                "Failed to read configuration {}: {err}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
            .map_err(|err| PangeaError::Config(format!("{}: {err}", path.display())))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Directory for session logs, if file logging is wanted.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.paths.log_dir.clone()
    }
}

/// `$XDG_CONFIG_HOME/pangea/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pangea").join("config.toml"))
}

/// dpkg architecture name of the running host.
pub fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "i386",
        "aarch64" => "arm64",
        "arm" => "armhf",
        "powerpc64" => "ppc64el",
        "s390x" => "s390x",
        other => other,
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = PangeaConfig::from_toml("").unwrap();
        assert_eq!(config.aptly.read_retries, 8);
        assert_eq!(config.aptly.write_retries, 4);
        assert_eq!(config.aptly.max_parallel_queries, 4);
        assert_eq!(config.paths.record_file, PathBuf::from("last_version"));
        assert!(config
            .repository
            .install_exclusion
            .contains(&"base-files".to_string()));
        assert_eq!(
            config.audit.debian_to_kde_names.get("kactivities-kf5").map(String::as_str),
            Some("kactivities")
        );
        assert_eq!(config.audit.blacklist, vec!["plasma-tests"]);
    }

    #[test]
    fn partial_document_overrides_selected_fields() {
        let config = PangeaConfig::from_toml(
            r#"
            [aptly]
            base_url = "http://archive-api.neon.kde.org"
            max_parallel_queries = 2

            [repository]
            host_arch = "arm64"
            purge_exclusion = ["apt"]

            [audit.scope_keys]
            kconfig = "KDE Frameworks"
            "#,
        )
        .unwrap();

        assert_eq!(config.aptly.base_url, "http://archive-api.neon.kde.org");
        assert_eq!(config.aptly.max_parallel_queries, 2);
        assert_eq!(config.aptly.timeout, 60);
        assert_eq!(config.repository.host_arch, "arm64");
        assert_eq!(config.repository.purge_exclusion, vec!["apt"]);
        assert_eq!(config.audit.scope_keys.len(), 1);
        assert_eq!(config.audit.scopes.len(), 3);
    }

    #[test]
    fn invalid_document_is_rejected() {
        assert!(PangeaConfig::from_toml("[aptly]\ntimeout = \"soon\"").is_err());
    }

    #[test]
    fn explicit_missing_path_is_a_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            PangeaConfig::load_from_optional_path(Some(&missing)),
            Err(PangeaError::Config(_))
        ));
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[paths]\nrecord_file = \"state/last_version\"\n").unwrap();
        let config = PangeaConfig::load_from_path(&path).unwrap();
        assert_eq!(config.paths.record_file, PathBuf::from("state/last_version"));
    }
}
