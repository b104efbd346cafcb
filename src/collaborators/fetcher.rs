//! HTTP fetch port and its `reqwest`-backed implementation.

use crate::imurl::ImUrl;
use crate::scheduler::errors::{Cause, ClassifiedError};
use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct FetchResult {
    pub url: String,
    pub body: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: HashMap<String, String>,
    pub fetched_at: DateTime<Utc>,
}

pub trait Fetcher {
    /// Resolves to `Err` only for transport failures and timeouts; any HTTP
    /// response received at all (including non-2xx) resolves to `Ok` so
    /// callers with different status-code semantics (the pipeline's Fetch
    /// stage wants `FetchNon2xx`; robots wants 404 to mean "no policy") can
    /// each apply their own classification.
    fn fetch(
        &self,
        url: &ImUrl,
    ) -> impl std::future::Future<Output = anyhow::Result<FetchResult>> + Send;
}

/// Thin wrapper over `reqwest::Client`. Applies the configured per-request
/// timeout itself via `tokio::time::timeout`; the scheduler imposes no
/// additional timeout on top of this.
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(user_agent: impl AsRef<str>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent.as_ref())
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client, timeout })
    }

    /// Classifies a received (non-transport-error) status into the Fetch
    /// stage's taxonomy. 2xx has no cause.
    pub fn classify_status(status: u16) -> Option<Cause> {
        if (200..300).contains(&status) {
            None
        } else {
            Some(Cause::FetchNon2xx(status))
        }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &ImUrl) -> anyhow::Result<FetchResult> {
        let request = self.client.get(url.as_str()).send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| anyhow::Error::new(ClassifiedError::recoverable(Cause::FetchTimeout)))?
            .map_err(|e| {
                anyhow::Error::new(ClassifiedError::recoverable(Cause::FetchTransport(
                    e.to_string(),
                )))
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
            .collect();

        let body = response.text().await.map_err(|e| {
            anyhow::Error::new(ClassifiedError::recoverable(Cause::FetchTransport(
                e.to_string(),
            )))
        })?;

        Ok(FetchResult {
            url: url.as_str().to_string(),
            body,
            status,
            content_type,
            headers,
            fetched_at: Utc::now(),
        })
    }
}

/// Lets a single `HttpFetcher` be shared between the pipeline driver's own
/// `Fetcher` field and a [`crate::collaborators::robots::TxtRobotsPolicy`]
/// without cloning the underlying `reqwest::Client`.
impl<T: Fetcher + ?Sized + Sync> Fetcher for Arc<T> {
    async fn fetch(&self, url: &ImUrl) -> anyhow::Result<FetchResult> {
        (**self).fetch(url).await
    }
}
