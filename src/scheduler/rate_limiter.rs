//! Per-host politeness: base delay, jitter, exponential backoff.
//!
//! The jitter draw comes from a single deterministic RNG stream owned by
//! this struct (seeded via [`RateLimiter::set_random_seed`]), never a
//! thread-local or global generator — this is what makes two runs with the
//! same seed byte-for-byte identical, per the determinism guarantee the
//! scheduler's integration tests rely on.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Backoff level saturates here: max wait ~= base_delay * 64 + jitter.
const BACKOFF_CEILING: u32 = 6;

#[derive(Clone, Debug, Default)]
struct HostTiming {
    last_fetch_at: Option<Instant>,
    crawl_delay: Duration,
    backoff_level: u32,
}

pub struct RateLimiter {
    base_delay: Duration,
    jitter: Duration,
    rng: StdRng,
    hosts: HashMap<String, HostTiming>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            base_delay: Duration::ZERO,
            jitter: Duration::ZERO,
            rng: StdRng::seed_from_u64(0),
            hosts: HashMap::new(),
        }
    }

    pub fn set_base_delay(&mut self, d: Duration) {
        self.base_delay = d;
    }

    pub fn set_jitter(&mut self, d: Duration) {
        self.jitter = d;
    }

    pub fn set_random_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn set_crawl_delay(&mut self, host: &str, delay: Duration) {
        self.hosts.entry(host.to_string()).or_default().crawl_delay = delay;
    }

    /// Increments `backoffLevel[host]` by one, saturating at [`BACKOFF_CEILING`].
    pub fn backoff(&mut self, host: &str) {
        let timing = self.hosts.entry(host.to_string()).or_default();
        timing.backoff_level = (timing.backoff_level + 1).min(BACKOFF_CEILING);
    }

    pub fn reset_backoff(&mut self, host: &str) {
        self.hosts.entry(host.to_string()).or_default().backoff_level = 0;
    }

    pub fn mark_last_fetch_as_now(&mut self, host: &str) {
        self.hosts.entry(host.to_string()).or_default().last_fetch_at = Some(Instant::now());
    }

    /// `max(baseDelay, crawlDelay) * 2^backoffLevel + uniform(0, jitter) -
    /// (now - lastFetchAt)`, floored at zero.
    pub fn resolve_delay(&mut self, host: &str) -> Duration {
        let timing = self.hosts.entry(host.to_string()).or_default();
        let floor = self.base_delay.max(timing.crawl_delay);
        let backoff_multiplier = 1u32 << timing.backoff_level.min(BACKOFF_CEILING);
        let target = floor * backoff_multiplier;

        let jitter_draw = if self.jitter.is_zero() {
            Duration::ZERO
        } else {
            let jitter_nanos = self.jitter.as_nanos().min(u128::from(u64::MAX)) as u64;
            Duration::from_nanos(self.rng.random_range(0..=jitter_nanos))
        };

        let target = target + jitter_draw;
        let elapsed = timing
            .last_fetch_at
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO);

        target.saturating_sub(elapsed)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
