//! Scheduler-wide defaults used when a config omits a tunable.

use std::time::Duration;

pub const DEFAULT_MAX_DEPTH: u32 = 0;
pub const DEFAULT_MAX_PAGES: u32 = 0;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_JITTER: Duration = Duration::from_millis(250);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = "docscrape/0.1";
