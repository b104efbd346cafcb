//! The Admission Gate: the single choke-point through which a URL may enter
//! the Frontier. Nothing else constructs a [`CrawlAdmissionCandidate`].

use crate::collaborators::metadata_sink::MetadataSink;
use crate::collaborators::robots::Robots;
use crate::imurl::ImUrl;
use crate::scheduler::errors::{Cause, ClassifiedError};
use crate::scheduler::frontier::Frontier;
use crate::scheduler::rate_limiter::RateLimiter;

/// Where a candidate URL came from. Seeds are admitted once at Initialize;
/// everything else is discovered mid-crawl.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceContext {
    Seed,
    Crawl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscoveryMetadata {
    pub depth: u32,
}

/// A URL that has passed robots and is ready for the Frontier's structural
/// admission checks. The constructor is `pub(crate)` so only this module
/// can produce one.
#[derive(Clone, Debug)]
pub struct CrawlAdmissionCandidate {
    pub url: ImUrl,
    pub source: SourceContext,
    pub metadata: DiscoveryMetadata,
}

impl CrawlAdmissionCandidate {
    pub(crate) fn new(url: ImUrl, source: SourceContext, metadata: DiscoveryMetadata) -> Self {
        Self {
            url,
            source,
            metadata,
        }
    }
}

/// Implements `SubmitUrlForAdmission`: consult robots, update the
/// rate-limiter's per-host crawl delay, and on an allowed decision hand the
/// candidate to the Frontier. Frontier rejection is not an error; a
/// disallowed robots decision is `TerminalSuccess` (returns `None`).
///
/// Generic over the collaborator types rather than `dyn Trait` objects:
/// `Robots`/`MetadataSink` expose `async fn`s, which are not dyn-compatible
/// without a boxing-future adapter this crate has no reason to carry.
pub async fn submit_url_for_admission<R, M>(
    frontier: &mut Frontier,
    rate_limiter: &mut RateLimiter,
    robots: &R,
    sink: &M,
    url: ImUrl,
    source: SourceContext,
    depth: u32,
) -> Option<ClassifiedError>
where
    R: Robots,
    M: MetadataSink,
{
    let host = url.host().unwrap_or_default().to_string();

    let decision = match robots.decide(&url).await {
        Ok(decision) => decision,
        Err(err) => {
            if err.cause.triggers_backoff() {
                rate_limiter.backoff(&host);
            }
            sink.record_error(&err);
            return Some(err);
        }
    };

    rate_limiter.reset_backoff(&host);

    if let Some(crawl_delay) = decision.crawl_delay {
        rate_limiter.set_crawl_delay(&host, crawl_delay);
    }

    if !decision.allowed {
        return None;
    }

    let candidate = CrawlAdmissionCandidate::new(
        url,
        source,
        DiscoveryMetadata { depth },
    );

    // Frontier rejection (scope/depth/dedup/limits) is a normal outcome,
    // never surfaced as an error to the caller.
    let _ = frontier.submit(candidate.url, candidate.metadata.depth);
    None
}

/// Convenience used by discovered-link re-admission in the pipeline: a
/// failure here counts against the current page as Recoverable, never Fatal,
/// regardless of what the underlying cause's default severity would be.
pub fn downgrade_to_recoverable(err: ClassifiedError) -> ClassifiedError {
    ClassifiedError::new(err.cause, crate::scheduler::errors::Severity::Recoverable)
}
