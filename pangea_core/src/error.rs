/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::error
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Pangea-Core error types to provide consistent
    diagnostics and exit semantics for CI jobs.

  Security / Safety Notes:
    Error contexts carry package names, versions and paths only;
    repository credentials never appear in messages.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate failures and consolidate
    exit codes for the binary entry point.

  Revision History:
    2024-11-04 COD  Established shared error definitions.
    2026-02-11 HS   Added version policy error domains.
  ------------------------------------------------------------
  Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for Jenkins jobs
============================================================*/

use std::io;
use std::process::ExitCode;

use thiserror::Error;

/// Result alias for Pangea-Core operations.
pub type Result<T> = std::result::Result<T, PangeaError>;

/// Enumerates high-level error domains surfaced by Pangea-Core.
#[derive(Debug, Error)]
pub enum PangeaError {
    #[error("Version format: {0}")]
    Format(String),
    #[error("Unauthorized epoch change: {old} -> {new}")]
    UnauthorizedChange { old: String, new: String },
    #[error("Argument: {0}")]
    Argument(String),
    #[error(
        "Our version of {name} {ours} is not greater than {theirs}, \
         which is currently available in apt. The package is out of date \
         or regressed in version compared to a previous build"
    )]
    VersionNotGreater {
        name: String,
        ours: String,
        theirs: String,
    },
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Network: {0}")]
    Network(String),
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PangeaError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            PangeaError::Format(_) => ExitCode::from(12),
            PangeaError::UnauthorizedChange { .. } => ExitCode::from(13),
            PangeaError::Argument(_) => ExitCode::from(14),
            PangeaError::VersionNotGreater { .. } => ExitCode::from(15),
            PangeaError::Config(_) => ExitCode::from(20),
            PangeaError::Network(_) => ExitCode::from(30),
            PangeaError::Serialization(_) => ExitCode::from(31),
            PangeaError::Filesystem(_) => ExitCode::from(40),
            PangeaError::Io(_) => ExitCode::from(41),
            PangeaError::Runtime(_) => ExitCode::from(50),
        }
    }
}
