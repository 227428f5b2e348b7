/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::repository
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Reconcile an Aptly repository listing into the concrete
    install and purge package sets used by install tests.

  Security / Safety Notes:
    Read-only against the repository. Exclusion lists protect
    base system packages from install and purge runs.

  Dependencies:
    tokio for the bounded query pool, indexmap for stable
    deduplication.

  Operational Scope:
    Invoked by `pangea-core reconcile` ahead of apt install and
    purge steps.

  Revision History:
    2026-02-11 HS   Ported repository abstraction.
  ------------------------------------------------------------
  Principles Observed:
    - Bounded concurrency towards the repository server
    - All queries settle before reconciliation proceeds
    - Per-query failures stay isolated
============================================================*/

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tokio::sync::{OnceCell, Semaphore};

use crate::config::RepositoryConfig;
use crate::error::{PangeaError, Result};
use crate::filter::LatestVersionFilter;
use crate::logger::Logger;
use crate::package_key::{parse_keys, PackageKey};
use crate::query::{binaries_of_source_query, source_query, PackageQuery};
use crate::version::Version;

/// Upper bound of concurrent listing queries against one server.
pub const MAX_PARALLEL_QUERIES: usize = 4;

/// Architecture of packages installable everywhere.
const ARCH_ALL: &str = "all";

/// Derives install and purge sets from the latest sources of a repository.
pub struct RepositoryReconciler<Q: PackageQuery + 'static> {
    repo: Arc<Q>,
    host_arch: String,
    install_exclusion: Vec<String>,
    purge_exclusion: Vec<String>,
    max_parallel_queries: usize,
    sources: OnceCell<Vec<PackageKey>>,
    binaries: OnceCell<Vec<PackageKey>>,
}

impl<Q: PackageQuery + 'static> RepositoryReconciler<Q> {
    pub fn new(repo: Arc<Q>, config: &RepositoryConfig, max_parallel_queries: usize) -> Self {
        Self {
            repo,
            host_arch: config.host_arch.clone(),
            install_exclusion: config.install_exclusion.clone(),
            purge_exclusion: config.purge_exclusion.clone(),
            max_parallel_queries: max_parallel_queries.clamp(1, MAX_PARALLEL_QUERIES),
            sources: OnceCell::new(),
            binaries: OnceCell::new(),
        }
    }

    /// Additional names to protect from purging.
    pub fn exclude_from_purge(&mut self, name: impl Into<String>) {
        self.purge_exclusion.push(name.into());
    }

    /// Latest version of every source package.
    pub async fn sources(&self) -> Result<&[PackageKey]> {
        self.sources
            .get_or_try_init(|| async {
                let listing = self.repo.packages(&source_query()).await?;
                let keys: Vec<PackageKey> = parse_keys(&listing)?
                    .into_iter()
                    .filter(PackageKey::is_source)
                    .collect();
                Ok::<_, PangeaError>(LatestVersionFilter::filter(&keys, 1))
            })
            .await
            .map(Vec::as_slice)
    }

    /// Binary packages built from the latest sources, restricted to the host
    /// architecture and `all`, without debug symbols.
    pub async fn binaries(&self, logger: &Logger) -> Result<&[PackageKey]> {
        self.binaries
            .get_or_try_init(|| self.query_binaries(logger))
            .await
            .map(Vec::as_slice)
    }

    /// `(name, version)` pairs to install; later duplicates of a name win.
    pub async fn install_set(&self, logger: &Logger) -> Result<Vec<(String, Version)>> {
        let mut packages: IndexMap<String, Version> = IndexMap::new();
        for key in self.binaries(logger).await? {
            if self.install_exclusion.contains(&key.name) {
                logger.debug("EXCLUDE", format!("Not installing {}", key.name));
                continue;
            }
            packages.insert(key.name.clone(), key.version.clone());
        }
        Ok(packages.into_iter().collect())
    }

    /// Names to purge.
    pub async fn purge_set(&self, logger: &Logger) -> Result<Vec<String>> {
        let mut names: IndexSet<String> = IndexSet::new();
        for key in self.binaries(logger).await? {
            if self.purge_exclusion.contains(&key.name) {
                logger.debug("EXCLUDE", format!("Not purging {}", key.name));
                continue;
            }
            names.insert(key.name.clone());
        }
        Ok(names.into_iter().collect())
    }

    async fn query_binaries(&self, logger: &Logger) -> Result<Vec<PackageKey>> {
        let sources = self.sources().await?;
        logger.info(
            "QUERY",
            format!(
                "Querying binaries of {} sources ({} parallel)",
                sources.len(),
                self.max_parallel_queries
            ),
        );

        let semaphore = Arc::new(Semaphore::new(self.max_parallel_queries));
        let mut tasks = Vec::with_capacity(sources.len());
        for source in sources {
            let repo = Arc::clone(&self.repo);
            let semaphore = Arc::clone(&semaphore);
            let query = binaries_of_source_query(&source.name, &source.version.full());
            tasks.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| PangeaError::Runtime("Query semaphore closed".into()))?;
                repo.packages(&query).await
            }));
        }

        // Every task settles before anything is evaluated.
        let mut listing = Vec::new();
        let mut failures = Vec::new();
        for (source, task) in sources.iter().zip(tasks) {
            match task.await {
                Ok(Ok(lines)) => listing.extend(lines),
                Ok(Err(err)) => failures.push((source, err)),
                Err(err) => failures.push((
                    source,
                    PangeaError::Runtime(format!("Query task failed: {err}")),
                )),
            }
        }

        for (source, err) in &failures {
            logger.error(
                "QUERY",
                format!("Binaries of {} {}: {err}", source.name, source.version),
            );
        }
        if let Some((_, err)) = failures.into_iter().next() {
            return Err(err);
        }

        let keys = parse_keys(&listing)?;
        let binaries: Vec<PackageKey> = LatestVersionFilter::filter(&keys, 1)
            .into_iter()
            .filter(|key| key.architecture == self.host_arch || key.architecture == ARCH_ALL)
            .filter(|key| !is_debug_package(&key.name))
            .filter(|key| !key.name.starts_with("oem-config"))
            .collect();

        logger.info(
            "QUERY",
            format!("{} binaries after filtering {} listed", binaries.len(), keys.len()),
        );
        Ok(binaries)
    }
}

fn is_debug_package(name: &str) -> bool {
    name.ends_with("-dbg") || name.ends_with("-dbgsym")
}
