/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::logger
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Provide structured, append-only logging for Pangea-Core
    runs inside CI jobs.

  Security / Safety Notes:
    Entries carry package names, versions and repository names
    only; endpoints with credentials are never logged.

  Dependencies:
    chrono for timestamps, sha2 for the archived log digest.

  Operational Scope:
    Passed by reference into every component that reports
    progress; emits RFC-3339 UTC stamped entries, closes each
    session with a tally and a digest for archived job logs.

  Revision History:
    2024-11-04 COD  Established logging module.
    2026-02-11 HS   Console output follows Jenkins log cadence.
    2026-03-02 HS   Session tally, digest on every exit path.
  ------------------------------------------------------------
  Principles Observed:
    - Append-only logging with UTC timestamps
    - A broken log file degrades to console output once
============================================================*/

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::error::{PangeaError, Result};

/// Severity, ordered from chatty to fatal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Warning and error tally of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub warnings: usize,
    pub errors: usize,
}

struct LogFile {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    broken: AtomicBool,
}

impl LogFile {
    fn append(&self, payload: &str) {
        if self.broken.load(Ordering::Relaxed) {
            return;
        }
        let written = match self.writer.lock() {
            Ok(mut writer) => writeln!(writer, "{payload}").and_then(|()| writer.flush()),
            Err(_) => Err(io::Error::new(io::ErrorKind::Other, "log writer poisoned")),
        };
        if let Err(err) = written {
            if !self.broken.swap(true, Ordering::Relaxed) {
                eprintln!(
                    "[Pangea-Core] Log file {} disabled: {err}",
                    self.path.display()
                );
            }
        }
    }
}

/// Logger emitting `<timestamp> [LEVEL] [CODE] message` entries to stderr
/// and optionally to a job log file.
pub struct Logger {
    file: Option<LogFile>,
    console_threshold: LogLevel,
    warnings: AtomicUsize,
    errors: AtomicUsize,
}

impl Logger {
    /// Warnings and errors always reach stderr; everything does with
    /// `verbose`.
    pub fn new(path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let file = path.map(open_log_file).transpose()?;
        Ok(Self {
            file,
            console_threshold: if verbose {
                LogLevel::Debug
            } else {
                LogLevel::Warn
            },
            warnings: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        })
    }

    pub fn log<S: AsRef<str>>(&self, level: LogLevel, code: &str, message: S) {
        match level {
            LogLevel::Warn => self.warnings.fetch_add(1, Ordering::Relaxed),
            LogLevel::Error => self.errors.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let payload = format!(
            "{timestamp} [{}] [{code}] {}",
            level.as_str(),
            message.as_ref()
        );
        if level >= self.console_threshold {
            eprintln!("{payload}");
        }
        if let Some(file) = &self.file {
            file.append(&payload);
        }
    }

    pub fn info<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Info, code, message);
    }

    pub fn warn<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Warn, code, message);
    }

    pub fn error<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Error, code, message);
    }

    pub fn debug<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Debug, code, message);
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|file| file.path.as_path())
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            warnings: self.warnings.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    /// Close the session with a tally entry and write `<log>.hash`
    /// (`sha256sum` format). Returns the digest path, if there is a log file.
    pub fn finalize(&self, outcome: &str) -> Result<Option<PathBuf>> {
        let summary = self.summary();
        self.info(
            "SESSION",
            format!(
                "{outcome}: {} warnings, {} errors",
                summary.warnings, summary.errors
            ),
        );

        let Some(file) = &self.file else {
            return Ok(None);
        };
        if file.broken.load(Ordering::Relaxed) {
            return Err(PangeaError::Filesystem(format!(
                "Log file {} is incomplete; no digest written",
                file.path.display()
            )));
        }

        let digest = sha256_file(&file.path)?;
        let hash_path = digest_path(&file.path);
        let name = file.path.file_name().unwrap_or_default().to_string_lossy();
        fs::write(&hash_path, format!("{digest}  {name}\n")).map_err(|err| {
            PangeaError::Filesystem(format!(
                "Failed to write hash file {}: {err}",
                hash_path.display()
            ))
        })?;
        Ok(Some(hash_path))
    }
}

fn open_log_file(path: PathBuf) -> Result<LogFile> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            PangeaError::Filesystem(format!(
                "Failed to create log directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|err| {
            PangeaError::Filesystem(format!("Failed to open log file {}: {err}", path.display()))
        })?;
    Ok(LogFile {
        path,
        writer: Mutex::new(BufWriter::new(file)),
        broken: AtomicBool::new(false),
    })
}

fn digest_path(path: &Path) -> PathBuf {
    let mut hash = path.as_os_str().to_os_string();
    hash.push(".hash");
    PathBuf::from(hash)
}

fn sha256_file(path: &Path) -> Result<String> {
    let read_error = |err: io::Error| {
        PangeaError::Filesystem(format!(
            "Failed to read log for hashing {}: {err}",
            path.display()
        ))
    };
    let mut file = File::open(path).map_err(read_error)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(read_error)?;
    Ok(format!("{:x}", hasher.finalize()))
}
