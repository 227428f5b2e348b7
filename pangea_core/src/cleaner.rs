/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::cleaner
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Drop outdated source packages, together with everything
    built from them, and outdated binaries from a repository.

  Security / Safety Notes:
    Destructive against the repository. Dry runs only report
    the keys that would be removed.

  Dependencies:
    indexmap for order-preserving deduplication.

  Operational Scope:
    Invoked by `pangea-core clean` on repositories that
    accumulate old builds.

  Revision History:
    2026-02-11 HS   Ported source cleanup.
    2026-03-02 HS   Binary cleanup pass.
  ------------------------------------------------------------
  Principles Observed:
    - The newest versions of every name always survive
    - Deletions are issued one source or binary at a time
============================================================*/

use indexmap::IndexSet;

use crate::error::Result;
use crate::filter::LatestVersionFilter;
use crate::logger::Logger;
use crate::package_key::{parse_keys, PackageKey};
use crate::query::{binaries_query, built_from_source_query, source_query, PackageStore};

/// Default number of source versions kept per name.
pub const DEFAULT_KEEP_AMOUNT: usize = 2;

pub struct RepositoryCleaner<'a, S: PackageStore + ?Sized> {
    repo: &'a S,
    keep_amount: usize,
    dry_run: bool,
}

impl<'a, S: PackageStore + ?Sized> RepositoryCleaner<'a, S> {
    pub fn new(repo: &'a S, keep_amount: usize) -> Self {
        Self {
            repo,
            keep_amount: keep_amount.max(1),
            dry_run: false,
        }
    }

    /// Only log what would be deleted.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Delete every source older than the newest `keep_amount` versions of
    /// its name, plus the packages built from it. Returns the number of keys
    /// deleted (or, in a dry run, that would be).
    pub async fn clean_sources(&self, logger: &Logger) -> Result<usize> {
        let sources = self.sources().await?;
        let keep = LatestVersionFilter::filter(&sources, self.keep_amount);
        logger.info(
            "CLEAN",
            format!(
                "Keeping {} of {} sources (up to {} versions each)",
                keep.len(),
                sources.len(),
                self.keep_amount
            ),
        );

        let mut deleted = 0usize;
        for source in sources.iter().filter(|source| !keep.contains(*source)) {
            deleted += self.delete_source(source, logger).await?;
        }
        Ok(deleted)
    }

    /// Delete every binary older than the newest `keep_amount` versions of
    /// its name. Meant to run after [`Self::clean_sources`], so that only
    /// binaries whose source is gone or was never uploaded remain to prune.
    pub async fn clean_binaries(&self, logger: &Logger) -> Result<usize> {
        let binaries: Vec<PackageKey> = self
            .keys(&binaries_query())
            .await?
            .into_iter()
            .filter(|key| !key.is_source())
            .collect();
        let keep = LatestVersionFilter::filter(&binaries, self.keep_amount);
        logger.info(
            "CLEAN",
            format!("Keeping {} of {} binaries", keep.len(), binaries.len()),
        );

        let mut deleted = 0usize;
        for binary in binaries.iter().filter(|binary| !keep.contains(*binary)) {
            if self.dry_run {
                logger.info("CLEAN", format!("Would delete {binary}"));
            } else {
                logger.info("CLEAN", format!("Deleting {binary}"));
                self.repo.delete_packages(&[binary.to_string()]).await?;
            }
            deleted += 1;
        }
        Ok(deleted)
    }

    async fn sources(&self) -> Result<Vec<PackageKey>> {
        Ok(self
            .keys(&source_query())
            .await?
            .into_iter()
            .filter(PackageKey::is_source)
            .collect())
    }

    async fn keys(&self, query: &str) -> Result<Vec<PackageKey>> {
        let listing: IndexSet<String> = self.repo.packages(query).await?.into_iter().collect();
        let lines: Vec<String> = listing.into_iter().collect();
        parse_keys(&lines)
    }

    async fn delete_source(&self, source: &PackageKey, logger: &Logger) -> Result<usize> {
        let query = built_from_source_query(&source.name, &source.version.full());
        let mut keys: IndexSet<String> = IndexSet::new();
        keys.insert(source.to_string());
        keys.extend(self.repo.packages(&query).await?);
        let keys: Vec<String> = keys.into_iter().collect();

        if self.dry_run {
            logger.info(
                "CLEAN",
                format!("Would delete {} {}: {}", source.name, source.version, keys.join(" ")),
            );
        } else {
            logger.info(
                "CLEAN",
                format!("Deleting {} {} ({} keys)", source.name, source.version, keys.len()),
            );
            self.repo.delete_packages(&keys).await?;
        }
        Ok(keys.len())
    }
}
