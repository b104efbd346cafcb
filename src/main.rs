//! `docscrape execute <config-path>`: loads a [`ScrapeConfig`], wires up the
//! real (non-mock) collaborators, and drives one crawl to completion.
//!
//! Logging is configured via `env_logger` reading `RUST_LOG` (default
//! `info`). There is no other subcommand; `--help` or no arguments prints
//! usage and exits non-zero.

use docscrape::collaborators::converter::HtmdConverter;
use docscrape::collaborators::extractor::HeuristicExtractor;
use docscrape::collaborators::fetcher::HttpFetcher;
use docscrape::collaborators::metadata_sink::LoggingMetadataSink;
use docscrape::collaborators::normalizer::MarkdownNormalizer;
use docscrape::collaborators::resolver::LocalAssetResolver;
use docscrape::collaborators::robots::TxtRobotsPolicy;
use docscrape::collaborators::sanitizer::AllowListSanitizer;
use docscrape::collaborators::sleeper::TokioSleeper;
use docscrape::collaborators::storage::FsStorage;
use docscrape::{ClassifiedError, ScrapeConfig};
use std::process::ExitCode;
use std::sync::Arc;

fn print_usage() {
    eprintln!("usage: docscrape execute <config-path>");
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let command = args.next();
    let config_path = args.next();

    let (Some(command), Some(config_path)) = (command, config_path) else {
        print_usage();
        return ExitCode::FAILURE;
    };

    if command != "execute" {
        print_usage();
        return ExitCode::FAILURE;
    }

    match run(&config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config_path: &str) -> Result<(), ClassifiedError> {
    let config = ScrapeConfig::load(config_path)?;

    let fetcher = Arc::new(
        HttpFetcher::new(&config.user_agent, config.request_timeout)
            .map_err(|e| ClassifiedError::fatal(docscrape::Cause::ConfigInvalid(e.to_string())))?,
    );
    let robots = TxtRobotsPolicy::new(fetcher.clone(), config.user_agent.as_str());
    let extractor = HeuristicExtractor::new(config.extraction_tunables);
    let sanitizer = AllowListSanitizer::new();
    let converter = HtmdConverter::new();
    let resolver = LocalAssetResolver::new();
    let normalizer = MarkdownNormalizer::new();
    let storage = FsStorage::new(config.storage_dir.clone());
    let sleeper = TokioSleeper;
    let sink = Arc::new(LoggingMetadataSink::new());

    let scheduler = docscrape::initialize(
        &config, robots, fetcher, extractor, sanitizer, converter, resolver, normalizer, storage,
        sleeper, sink.clone(),
    )
    .await?;

    let cancellation = scheduler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("received interrupt, finishing the current page then stopping");
            cancellation.cancel();
        }
    });

    let execution = docscrape::execute(scheduler).await?;

    let summary = sink.summary();
    log::info!(
        "wrote {} page(s); {} error(s) recorded",
        execution.results.len(),
        summary.errors_recorded,
    );

    Ok(())
}
