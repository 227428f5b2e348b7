/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Debian version handling and Aptly repository tooling for
    the Pangea CI jobs: version ordering, epoch guarding,
    install/purge reconciliation, cleanup and release audits.

  Operational Scope:
    Library behind the `pangea-core` binary.

  Revision History:
    2026-02-11 HS   Split library from the command line front.
============================================================*/

pub mod aptly;
pub mod audit;
pub mod cleaner;
pub mod config;
pub mod enforcer;
pub mod error;
pub mod filter;
pub mod logger;
pub mod package_key;
pub mod query;
pub mod repository;
pub mod report;
pub mod spelling;
pub mod upstream;
pub mod version;
pub mod version_check;
