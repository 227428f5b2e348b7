/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::query
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Seams between the reconciliation logic and the package
    repository: listing queries, deletions, and a small builder
    for Aptly query expressions.

  Security / Safety Notes:
    Query values are interpolated verbatim; package names and
    versions cannot contain the delimiters used here.

  Dependencies:
    async-trait for object-safe async collaborators.

  Operational Scope:
    Implemented by the Aptly HTTP adapter and by test doubles.

  Revision History:
    2026-02-11 HS   Extracted repository collaborator traits.
============================================================*/

use std::fmt::{self, Display, Formatter};

use async_trait::async_trait;

use crate::error::Result;

/// Anything that can answer a package listing query with key strings
/// (`P<arch> <name> <version> <uid>`).
#[async_trait]
pub trait PackageQuery: Send + Sync {
    async fn packages(&self, query: &str) -> Result<Vec<String>>;
}

/// Repository that can drop packages by key.
#[async_trait]
pub trait PackageStore: PackageQuery {
    async fn delete_packages(&self, keys: &[String]) -> Result<()>;
}

/// Builds comma-joined Aptly query expressions.
#[derive(Debug, Default, Clone)]
pub struct QueryBuilder {
    query: Option<String>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, expression: impl AsRef<str>) -> Self {
        let expression = expression.as_ref();
        self.query = Some(match self.query.take() {
            Some(query) => format!("{query}, {expression}"),
            None => expression.to_string(),
        });
        self
    }

    pub fn build(self) -> String {
        self.query.unwrap_or_default()
    }
}

impl Display for QueryBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.query.as_deref().unwrap_or(""))
    }
}

/// `$Architecture (source)`.
pub fn source_query() -> String {
    QueryBuilder::new().and("$Architecture (source)").build()
}

/// Every package that is not a source.
pub fn binaries_query() -> String {
    QueryBuilder::new().and("!$Architecture (source)").build()
}

/// Binary debs built from exactly this source name and version. udebs are
/// left out.
pub fn binaries_of_source_query(name: &str, version: &str) -> String {
    QueryBuilder::new()
        .and("!$Architecture (source)")
        .and("$PackageType (deb)")
        .and(format!("$Source ({name})"))
        .and(format!("$SourceVersion ({version})"))
        .build()
}

/// Every package, of any type, built from this source name and version.
pub fn built_from_source_query(name: &str, version: &str) -> String {
    QueryBuilder::new()
        .and(format!("$Source ({name})"))
        .and(format!("$SourceVersion ({version})"))
        .build()
}
