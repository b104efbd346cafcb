//! `ScrapeConfig`: the validated, in-memory configuration a run is built
//! from. Constructed either via [`super::builder::ConfigBuilder`] directly
//! (tests, programmatic callers) or via [`ScrapeConfig::load`] from a JSON
//! file on disk (the CLI entry point).

use crate::collaborators::extractor::ExtractionTunables;
use crate::imurl::ImUrl;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ScrapeConfig {
    pub seed_urls: Vec<ImUrl>,
    pub max_depth: u32,
    pub max_pages: u32,
    pub user_agent: String,
    pub jitter: Duration,
    pub base_delay: Duration,
    pub random_seed: u64,
    pub storage_dir: PathBuf,
    pub request_timeout: Duration,
    pub extraction_tunables: ExtractionTunables,
    /// Parsed but unused by the scheduler: no stage-level retry loop exists
    /// in this design (see §7 of the scheduler spec). Kept only so config
    /// files written against a superset schema still parse.
    pub max_page_retries: Option<u32>,
}
