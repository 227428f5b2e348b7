/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::main
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for Pangea-Core. Exposes version comparison,
    epoch enforcement, repository reconciliation, cleanup and
    release audits to CI job scripts.

  Security / Safety Notes:
    Operates within user privileges. Talks HTTP to the
    configured Aptly endpoint only; `clean` is the sole
    destructive command and supports dry runs.

  Dependencies:
    clap for CLI parsing, chrono for session stamps, tokio as
    runtime.

  Operational Scope:
    Invoked from Jenkins pipelines and by operators for ad hoc
    repository maintenance.

  Revision History:
    2025-10-28 COD  Authored core runtime.
    2026-02-11 HS   Subcommands for the Pangea tooling.
    2026-03-02 HS   Log session closed on every exit path.
  ------------------------------------------------------------
  Principles Observed:
    - Result-first error handling with deterministic exits
    - Configurable execution via CLI and config file
============================================================*/

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use pangea_core::aptly::AptlyRepository;
use pangea_core::audit::{local_versions, scoped_versions, VersionAudit};
use pangea_core::cleaner::{RepositoryCleaner, DEFAULT_KEEP_AMOUNT};
use pangea_core::config::PangeaConfig;
use pangea_core::enforcer::VersionEnforcer;
use pangea_core::error::Result;
use pangea_core::logger::Logger;
use pangea_core::repository::RepositoryReconciler;
use pangea_core::report::{write_report, AuditReport};
use pangea_core::upstream::UpstreamReleases;
use pangea_core::version::{Relation, Version};
use pangea_core::version_check::PackageVersionCheck;

/// Command-line arguments for Pangea-Core.
#[derive(Debug, Parser)]
#[command(
    name = "pangea-core",
    version,
    author = "KDE neon",
    about = "Debian version and Aptly repository tooling for Pangea CI"
)]
struct Cli {
    /// Override configuration file path.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH", global = true)]
    log: Option<PathBuf>,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate `<a> <relation> <b>`; exits 0 when it holds, 1 otherwise.
    Compare {
        a: Version,
        /// lt, le, eq, ne, ge, gt (or <<, <=, =, >=, >>).
        relation: Relation,
        b: Version,
    },
    /// Guard against unauthorized epoch changes between builds.
    Enforce {
        /// Override the version record file.
        #[arg(long, value_name = "PATH")]
        record_file: Option<PathBuf>,
        #[command(subcommand)]
        action: EnforceAction,
    },
    /// Fail unless our build is newer than the version apt knows.
    CheckGreater {
        name: String,
        ours: Version,
        theirs: Option<Version>,
    },
    /// Print the packages derived from a repository, one per line.
    Reconcile {
        set: PackageSet,
        #[arg(long)]
        repo: String,
        /// Extra package never listed for purging; repeatable.
        #[arg(long = "keep-installed", value_name = "NAME")]
        keep_installed: Vec<String>,
    },
    /// Delete outdated sources and their binaries from a repository.
    Clean {
        #[arg(long)]
        repo: String,
        /// Versions kept per source.
        #[arg(long, default_value_t = DEFAULT_KEEP_AMOUNT)]
        keep: usize,
        /// List deletions without performing them.
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// Compare a repository against the latest upstream releases.
    Audit {
        #[arg(long)]
        repo: String,
        /// Root of the release tarball mirror.
        #[arg(long, value_name = "DIR")]
        releases: PathBuf,
        /// Override report output path.
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum EnforceAction {
    /// Check a new version against the recorded one.
    Validate { version: String },
    /// Store a version as the new record.
    Record { version: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PackageSet {
    Sources,
    Install,
    Purge,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[Pangea-Core] {err}");
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = PangeaConfig::load_from_optional_path(cli.config.as_deref())?;

    let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli.log.clone().or_else(|| {
        config
            .log_dir()
            .map(|dir| dir.join(format!("core_{session_stamp}.log")))
    });
    let logger = Logger::new(log_path, cli.verbose)?;
    logger.debug("INIT", format!("{:?}", cli.command));

    let result = execute(cli.command, &config, &logger).await;
    let outcome = match &result {
        Ok(true) => "passed",
        Ok(false) => "failed",
        Err(err) => {
            logger.error("EXIT", err.to_string());
            "aborted"
        }
    };

    match (result, logger.finalize(outcome)) {
        (Ok(passed), Ok(_)) => Ok(if passed {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }),
        (Ok(_), Err(finalize_err)) => Err(finalize_err),
        (Err(err), Ok(_)) => Err(err),
        (Err(err), Err(finalize_err)) => {
            eprintln!("[Pangea-Core] {finalize_err}");
            Err(err)
        }
    }
}

/// Run one subcommand. `Ok(false)` is a negative answer, not an error.
async fn execute(command: Command, config: &PangeaConfig, logger: &Logger) -> Result<bool> {
    match command {
        Command::Compare { a, relation, b } => Ok(relation.holds(&a, &b)),
        Command::Enforce {
            record_file,
            action,
        } => {
            let record_file = record_file.unwrap_or_else(|| config.paths.record_file.clone());
            let enforcer = VersionEnforcer::load(record_file)?;
            match action {
                EnforceAction::Validate { version } => {
                    enforcer.validate(&version)?;
                    logger.info(
                        "ENFORCE",
                        format!(
                            "{version} accepted (recorded: {})",
                            enforcer
                                .old_version()
                                .map_or_else(|| "none".to_string(), Version::full)
                        ),
                    );
                }
                EnforceAction::Record { version } => {
                    enforcer.record(&version)?;
                    logger.info(
                        "ENFORCE",
                        format!("Recorded {version} in {}", enforcer.record_path().display()),
                    );
                }
            }
            Ok(true)
        }
        Command::CheckGreater { name, ours, theirs } => {
            PackageVersionCheck::new(name, ours, theirs).run()?;
            Ok(true)
        }
        Command::Reconcile {
            set,
            repo,
            keep_installed,
        } => {
            reconcile(config, &repo, set, keep_installed, logger).await?;
            Ok(true)
        }
        Command::Clean {
            repo,
            keep,
            dry_run,
        } => {
            let repository = AptlyRepository::new(&config.aptly, &repo)?;
            let cleaner = RepositoryCleaner::new(&repository, keep).dry_run(dry_run);
            let sources = cleaner.clean_sources(logger).await?;
            let binaries = cleaner.clean_binaries(logger).await?;
            let verb = if dry_run { "Would delete" } else { "Deleted" };
            logger.info(
                "CLEAN",
                format!(
                    "{verb} {sources} source and {binaries} binary keys from {}",
                    repository.name()
                ),
            );
            Ok(true)
        }
        Command::Audit {
            repo,
            releases,
            report,
        } => {
            let report_path = report.unwrap_or_else(|| config.paths.report.clone());
            audit(config, &repo, releases, report_path, logger).await
        }
    }
}

async fn reconcile(
    config: &PangeaConfig,
    repo: &str,
    set: PackageSet,
    keep_installed: Vec<String>,
    logger: &Logger,
) -> Result<()> {
    let repository = AptlyRepository::new(&config.aptly, repo)?;
    let mut reconciler = RepositoryReconciler::new(
        Arc::new(repository),
        &config.repository,
        config.aptly.max_parallel_queries,
    );
    for name in keep_installed {
        reconciler.exclude_from_purge(name);
    }

    match set {
        PackageSet::Sources => {
            for key in reconciler.sources().await? {
                println!("{key}");
            }
        }
        PackageSet::Install => {
            for (name, version) in reconciler.install_set(logger).await? {
                println!("{name}={version}");
            }
        }
        PackageSet::Purge => {
            for name in reconciler.purge_set(logger).await? {
                println!("{name}");
            }
        }
    }
    Ok(())
}

async fn audit(
    config: &PangeaConfig,
    repo: &str,
    releases: PathBuf,
    report_path: PathBuf,
    logger: &Logger,
) -> Result<bool> {
    let expected = UpstreamReleases::new(releases)?.scan(&config.audit.scopes, logger)?;
    logger.info(
        "AUDIT",
        format!("{} products in the latest releases", expected.len()),
    );

    let repository = AptlyRepository::new(&config.aptly, repo)?;
    let reconciler = RepositoryReconciler::new(
        Arc::new(repository),
        &config.repository,
        config.aptly.max_parallel_queries,
    );
    let local = local_versions(reconciler.sources().await?, &config.audit.debian_to_kde_names);
    let scoped = scoped_versions(&local, &config.audit.scope_keys);

    let outcome = VersionAudit::new(&config.audit.blacklist, &config.audit.name_aliases)
        .run(local, &expected);
    for violation in &outcome.violations {
        println!("{violation}");
    }

    let report = AuditReport::new(repo, outcome, scoped);
    write_report(&report, &report_path)?;
    logger.info(
        "REPORT",
        format!(
            "Report written to {} ({} violations)",
            report_path.display(),
            report.metadata.violations
        ),
    );

    Ok(report.passed())
}
