//! Configuration loading and validation.
//!
//! A minimal config (`{"seed_urls": ["https://example.com"]}`) is valid;
//! every other key has a documented default (see the table in the
//! scheduler spec's external-interfaces section).

pub mod builder;
pub mod types;

pub use builder::{ConfigBuilder, Missing, WithSeeds};
pub use types::ScrapeConfig;

use crate::collaborators::extractor::ExtractionTunables;
use crate::imurl::ImUrl;
use crate::scheduler::errors::{Cause, ClassifiedError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Deserialize)]
struct RawConfig {
    seed_urls: Vec<String>,
    #[serde(default)]
    max_depth: u32,
    #[serde(default)]
    max_pages: u32,
    user_agent: Option<String>,
    #[serde(default)]
    jitter_ms: Option<u64>,
    #[serde(default)]
    base_delay_ms: Option<u64>,
    #[serde(default)]
    random_seed: u64,
    storage_dir: Option<PathBuf>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    max_page_retries: Option<u32>,
    #[serde(default)]
    body_specificity_bias: Option<f64>,
    #[serde(default)]
    link_density_threshold: Option<f64>,
    #[serde(default)]
    score_multiplier: Option<f64>,
    #[serde(default)]
    threshold: Option<f64>,
}

impl ScrapeConfig {
    /// Loads and validates a JSON config file. Both an unreadable file and
    /// a malformed one are `Fatal` (`ConfigMissing`/`ConfigInvalid`); an
    /// empty `seed_urls` is `Fatal` (`SeedsEmpty`) regardless of whether
    /// the rest of the file parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifiedError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|_| ClassifiedError::fatal(Cause::ConfigMissing))?;

        let raw: RawConfig = serde_json::from_str(&text)
            .map_err(|e| ClassifiedError::fatal(Cause::ConfigInvalid(e.to_string())))?;

        let seed_urls = raw
            .seed_urls
            .iter()
            .map(|s| ImUrl::parse(s))
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(|e| ClassifiedError::fatal(Cause::ConfigInvalid(e.to_string())))?;

        let mut builder = ConfigBuilder::new().seed_urls(seed_urls)?.max_depth(raw.max_depth).max_pages(raw.max_pages).random_seed(raw.random_seed);

        if let Some(user_agent) = raw.user_agent {
            builder = builder.user_agent(user_agent);
        }
        if let Some(jitter_ms) = raw.jitter_ms {
            builder = builder.jitter(Duration::from_millis(jitter_ms));
        }
        if let Some(base_delay_ms) = raw.base_delay_ms {
            builder = builder.base_delay(Duration::from_millis(base_delay_ms));
        }
        if let Some(storage_dir) = raw.storage_dir {
            builder = builder.storage_dir(storage_dir);
        }
        if let Some(timeout_secs) = raw.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(timeout_secs));
        }
        if raw.max_page_retries.is_some() {
            builder = builder.max_page_retries(raw.max_page_retries);
        }

        let mut tunables = ExtractionTunables::default();
        if let Some(v) = raw.body_specificity_bias {
            tunables.body_specificity_bias = v;
        }
        if let Some(v) = raw.link_density_threshold {
            tunables.link_density_threshold = v;
        }
        if let Some(v) = raw.score_multiplier {
            tunables.score_multiplier = v;
        }
        if let Some(v) = raw.threshold {
            tunables.threshold = v;
        }
        builder = builder.extraction_tunables(tunables);

        Ok(builder.build())
    }
}
