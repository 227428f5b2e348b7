/*============================================================
  Pangea Project: Pangea-Core
  Module: pangea_core::aptly
  Etiquette: Pangea Script Etiquette, Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Query and prune package lists of an Aptly local repository
    through its REST API.

  Security / Safety Notes:
    Listing is read-only. Deletion only removes the exact keys
    it is given. No credentials are transmitted.

  Dependencies:
    reqwest for HTTP, serde for payloads, urlencoding for query
    strings.

  Operational Scope:
    Backs the repository reconciler and cleaner.

  Revision History:
    2024-11-04 COD  Implemented asynchronous HTTP client.
    2026-02-11 HS   Retargeted at the Aptly API.
  ------------------------------------------------------------
  Principles Observed:
    - Fixed-delay retries scoped to a single request
    - Request timeouts count as retryable failures
============================================================*/

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tokio::time::sleep;
use urlencoding::encode;

use crate::config::AptlyConfig;
use crate::error::{PangeaError, Result};
use crate::query::{PackageQuery, PackageStore};

/// A named local repository on an Aptly server.
#[derive(Clone)]
pub struct AptlyRepository {
    client: reqwest::Client,
    base_url: String,
    name: String,
    read_retries: usize,
    write_retries: usize,
    retry_delay: Duration,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    #[serde(rename = "PackageRefs")]
    package_refs: &'a [String],
}

impl AptlyRepository {
    /// Construct a client for repository `name` from configuration.
    pub fn new(config: &AptlyConfig, name: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(concat!("Pangea-Core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| PangeaError::Network(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            name: name.to_string(),
            read_retries: config.read_retries.max(1),
            write_retries: config.write_retries.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn packages_url(&self) -> String {
        format!("{}/api/repos/{}/packages", self.base_url, encode(&self.name))
    }

    async fn fetch_packages(&self, url: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| PangeaError::Network(format!("Aptly request to {url} failed: {err}")))?;

        match response.status() {
            StatusCode::OK => response.json::<Vec<String>>().await.map_err(|err| {
                PangeaError::Serialization(format!("Failed to decode Aptly package list: {err}"))
            }),
            status => Err(PangeaError::Network(format!(
                "Aptly request {url} answered with status {status}"
            ))),
        }
    }

    async fn send_delete(&self, url: &str, keys: &[String]) -> Result<()> {
        let response = self
            .client
            .delete(url)
            .json(&DeleteRequest { package_refs: keys })
            .send()
            .await
            .map_err(|err| PangeaError::Network(format!("Aptly delete on {url} failed: {err}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(PangeaError::Network(format!(
                "Aptly delete on {url} answered with status {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl PackageQuery for AptlyRepository {
    async fn packages(&self, query: &str) -> Result<Vec<String>> {
        let url = format!("{}?q={}", self.packages_url(), encode(query));
        with_retry(self.read_retries, self.retry_delay, &url, || {
            self.fetch_packages(&url)
        })
        .await
    }
}

#[async_trait]
impl PackageStore for AptlyRepository {
    async fn delete_packages(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let url = self.packages_url();
        with_retry(self.write_retries, self.retry_delay, &url, || {
            self.send_delete(&url, keys)
        })
        .await
    }
}

/// Run `operation` up to `attempts` times with a fixed `delay` in between.
///
/// Only `Network` failures are retried; anything else is returned as is.
pub async fn with_retry<T, F, Fut>(
    attempts: usize,
    delay: Duration,
    what: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(PangeaError::Network(reason)) => {
                if attempt >= attempts {
                    return Err(PangeaError::Network(format!(
                        "{what} failed after {attempt} attempts: {reason}"
                    )));
                }
                sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
