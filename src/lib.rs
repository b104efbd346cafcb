//! `docscrape`: a deterministic, single-threaded scheduler that drives a
//! documentation-site crawl down to persisted Markdown artifacts.
//!
//! The binary (`src/main.rs`) is a thin CLI wrapper; everything that matters
//! lives here as a library so it can be driven programmatically or tested
//! without a process boundary.

pub mod collaborators;
pub mod config;
pub mod imurl;
pub mod scheduler;
pub mod utils;

pub use config::ScrapeConfig;
pub use imurl::ImUrl;
pub use scheduler::errors::{Cause, ClassifiedError, Severity};
pub use scheduler::{execute, initialize, CancellationToken, CrawlingExecution, Scheduler};
