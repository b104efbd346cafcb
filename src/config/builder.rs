//! Typestate builder for [`ScrapeConfig`], mirroring the teacher crate's
//! `CrawlConfigBuilder<State>` pattern: `seed_urls` is the one field that
//! must be set, and non-empty, before `build()` is reachable at all.

use super::types::ScrapeConfig;
use crate::collaborators::extractor::ExtractionTunables;
use crate::imurl::ImUrl;
use crate::scheduler::errors::{Cause, ClassifiedError};
use crate::utils::constants::{
    DEFAULT_BASE_DELAY, DEFAULT_JITTER, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT,
};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;

pub struct Missing;
pub struct WithSeeds;

pub struct ConfigBuilder<State = Missing> {
    seed_urls: Vec<ImUrl>,
    max_depth: u32,
    max_pages: u32,
    user_agent: String,
    jitter: Duration,
    base_delay: Duration,
    random_seed: u64,
    storage_dir: PathBuf,
    request_timeout: Duration,
    extraction_tunables: ExtractionTunables,
    max_page_retries: Option<u32>,
    _state: PhantomData<State>,
}

impl Default for ConfigBuilder<Missing> {
    fn default() -> Self {
        Self {
            seed_urls: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            jitter: DEFAULT_JITTER,
            base_delay: DEFAULT_BASE_DELAY,
            random_seed: 0,
            storage_dir: PathBuf::from("."),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            extraction_tunables: ExtractionTunables::default(),
            max_page_retries: None,
            _state: PhantomData,
        }
    }
}

impl ConfigBuilder<Missing> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The only state transition: a non-empty seed list is the sole
    /// precondition `build()` enforces at the type level.
    pub fn seed_urls(self, seed_urls: Vec<ImUrl>) -> Result<ConfigBuilder<WithSeeds>, ClassifiedError> {
        if seed_urls.is_empty() {
            return Err(ClassifiedError::fatal(Cause::SeedsEmpty));
        }
        Ok(ConfigBuilder {
            seed_urls,
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            user_agent: self.user_agent,
            jitter: self.jitter,
            base_delay: self.base_delay,
            random_seed: self.random_seed,
            storage_dir: self.storage_dir,
            request_timeout: self.request_timeout,
            extraction_tunables: self.extraction_tunables,
            max_page_retries: self.max_page_retries,
            _state: PhantomData,
        })
    }
}

macro_rules! setter {
    ($name:ident, $field:ident, $ty:ty) => {
        pub fn $name(mut self, value: $ty) -> Self {
            self.$field = value;
            self
        }
    };
}

impl ConfigBuilder<WithSeeds> {
    setter!(max_depth, max_depth, u32);
    setter!(max_pages, max_pages, u32);
    setter!(jitter, jitter, Duration);
    setter!(base_delay, base_delay, Duration);
    setter!(random_seed, random_seed, u64);
    setter!(storage_dir, storage_dir, PathBuf);
    setter!(request_timeout, request_timeout, Duration);
    setter!(extraction_tunables, extraction_tunables, ExtractionTunables);
    setter!(max_page_retries, max_page_retries, Option<u32>);

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> ScrapeConfig {
        ScrapeConfig {
            seed_urls: self.seed_urls,
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            user_agent: self.user_agent,
            jitter: self.jitter,
            base_delay: self.base_delay,
            random_seed: self.random_seed,
            storage_dir: self.storage_dir,
            request_timeout: self.request_timeout,
            extraction_tunables: self.extraction_tunables,
            max_page_retries: self.max_page_retries,
        }
    }
}
