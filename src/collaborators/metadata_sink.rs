//! Write-only metadata port: structured log records plus an in-memory
//! summary the CLI's final report (and tests) can inspect without parsing
//! logs.

use crate::collaborators::storage::WriteResult;
use crate::imurl::ImUrl;
use crate::scheduler::errors::ClassifiedError;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub trait MetadataSink {
    fn record_error(&self, err: &ClassifiedError);
    fn record_fetch(&self, url: &ImUrl, status: u16);
    fn record_artifact(&self, result: &WriteResult);
}

/// Separate from [`MetadataSink`] because only the lifecycle driver ever
/// calls it, and it is called exactly once per run.
pub trait CrawlFinalizer {
    fn record_final_crawl_stats(
        &self,
        total_pages: u32,
        total_errors: u32,
        total_assets: u32,
        duration: Duration,
    );
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FinalCrawlStats {
    pub total_pages: u32,
    pub total_errors: u32,
    pub total_assets: u32,
    pub duration: Duration,
}

#[derive(Debug, Default, Clone)]
pub struct MetadataSummary {
    pub errors_recorded: u32,
    pub fetches_recorded: u32,
    pub artifacts_recorded: u32,
    pub final_stats: Option<FinalCrawlStats>,
}

/// Logs every event under `target: "docscrape::metadata"` at the level
/// appropriate to its severity, and accumulates the same counts in memory
/// so a caller never has to scrape logs to learn what a run did.
#[derive(Default)]
pub struct LoggingMetadataSink {
    summary: Mutex<MetadataSummary>,
}

impl LoggingMetadataSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> MetadataSummary {
        self.summary.lock().expect("metadata summary lock poisoned").clone()
    }
}

impl MetadataSink for LoggingMetadataSink {
    fn record_error(&self, err: &ClassifiedError) {
        log::warn!(target: "docscrape::metadata", "{err}");
        self.summary.lock().expect("metadata summary lock poisoned").errors_recorded += 1;
    }

    fn record_fetch(&self, url: &ImUrl, status: u16) {
        log::debug!(target: "docscrape::metadata", "fetched {url} -> {status}");
        self.summary.lock().expect("metadata summary lock poisoned").fetches_recorded += 1;
    }

    fn record_artifact(&self, result: &WriteResult) {
        log::info!(
            target: "docscrape::metadata",
            "wrote {} ({} bytes) from {}",
            result.path.display(),
            result.bytes_written,
            result.url
        );
        self.summary.lock().expect("metadata summary lock poisoned").artifacts_recorded += 1;
    }
}

impl CrawlFinalizer for LoggingMetadataSink {
    fn record_final_crawl_stats(
        &self,
        total_pages: u32,
        total_errors: u32,
        total_assets: u32,
        duration: Duration,
    ) {
        log::info!(
            target: "docscrape::metadata",
            "run complete: {total_pages} pages, {total_errors} errors, {total_assets} assets in {duration:?}"
        );
        self.summary.lock().expect("metadata summary lock poisoned").final_stats = Some(FinalCrawlStats {
            total_pages,
            total_errors,
            total_assets,
            duration,
        });
    }
}

impl<T: MetadataSink + ?Sized> MetadataSink for Arc<T> {
    fn record_error(&self, err: &ClassifiedError) {
        (**self).record_error(err)
    }

    fn record_fetch(&self, url: &ImUrl, status: u16) {
        (**self).record_fetch(url, status)
    }

    fn record_artifact(&self, result: &WriteResult) {
        (**self).record_artifact(result)
    }
}

impl<T: CrawlFinalizer + ?Sized> CrawlFinalizer for Arc<T> {
    fn record_final_crawl_stats(
        &self,
        total_pages: u32,
        total_errors: u32,
        total_assets: u32,
        duration: Duration,
    ) {
        (**self).record_final_crawl_stats(total_pages, total_errors, total_assets, duration)
    }
}
