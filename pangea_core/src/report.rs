/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::report
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Assemble and persist the JSON document describing an audit
    run: release scope versions, other packaged versions, and
    violations.

  Security / Safety Notes:
    Reports are written to operator-controlled paths; no
    privileged operations are performed.

  Dependencies:
    serde and serde_json for serialization, chrono for the
    generation stamp.

  Operational Scope:
    Archived as a job artifact and rendered by dashboards.

  Revision History:
    2024-11-04 COD  Authored JSON document writer.
    2026-02-11 HS   Reshaped into the version audit report.
  ------------------------------------------------------------
  Principles Observed:
    - Deterministic ordering for reproducible reports
    - Rich metadata for audit and observability
============================================================*/

use std::fs::File;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::audit::{AuditOutcome, Violation};
use crate::error::{PangeaError, Result};
use crate::version::Version;

/// Full audit report document.
#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub metadata: ReportMetadata,
    pub violations: Vec<Violation>,
    pub scoped_versions: IndexMap<String, Option<Version>>,
    pub packaged_versions: IndexMap<String, Version>,
}

#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub generated_by: String,
    pub repository: String,
    pub violations: usize,
}

impl AuditReport {
    pub fn new(
        repository: &str,
        outcome: AuditOutcome,
        scoped_versions: IndexMap<String, Option<Version>>,
    ) -> Self {
        let metadata = ReportMetadata {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            generated_by: concat!("pangea_core ", env!("CARGO_PKG_VERSION")).to_string(),
            repository: repository.to_string(),
            violations: outcome.violations.len(),
        };

        Self {
            metadata,
            violations: outcome.violations,
            scoped_versions,
            packaged_versions: outcome.unmatched,
        }
    }

    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Persist the report to the given path.
pub fn write_report(report: &AuditReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| {
            PangeaError::Filesystem(format!(
                "Failed to create report directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    let file = File::create(path).map_err(|err| {
        PangeaError::Filesystem(format!(
            "Failed to create report file {}: {err}",
            path.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, report).map_err(|err| {
        PangeaError::Serialization(format!("Failed to write report {}: {err}", path.display()))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn version(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn report() -> AuditReport {
        let outcome = AuditOutcome {
            violations: vec![
                Violation::WrongVersion {
                    name: "kio".into(),
                    expected_version: version("5.74.1"),
                    actual_version: version("5.74.0"),
                },
                Violation::MissingPackage {
                    name: "kactivitie".into(),
                    suggested_corrections: vec!["kactivities".into()],
                },
            ],
            unmatched: [("neon-settings".to_string(), version("0.1"))]
                .into_iter()
                .collect(),
        };
        let scoped = [
            ("Plasma by KDE".to_string(), Some(version("5.20.2"))),
            ("KDE Gear".to_string(), None),
        ]
        .into_iter()
        .collect();
        AuditReport::new("user_focal", outcome, scoped)
    }

    #[test]
    fn report_document_shape() {
        let report = report();
        assert!(!report.passed());

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["metadata"]["repository"], "user_focal");
        assert_eq!(value["metadata"]["violations"], 2);
        assert_eq!(value["violations"][0]["kind"], "wrong_version");
        assert_eq!(value["violations"][0]["expected_version"], "5.74.1");
        assert_eq!(
            value["violations"][1]["suggested_corrections"][0],
            "kactivities"
        );
        assert_eq!(value["scoped_versions"]["Plasma by KDE"], "5.20.2");
        assert!(value["scoped_versions"]["KDE Gear"].is_null());
        assert_eq!(value["packaged_versions"]["neon-settings"], "0.1");
    }

    #[test]
    fn write_report_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("versions.json");
        write_report(&report(), &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["metadata"]["generated_by"], report().metadata.generated_by);
    }
}
