//! Item crawler coordination
//!
//! A run picks one `ItemCrawler` from configuration and drives it over a
//! list of targets. Failures are per target: one bad seller or item is
//! recorded in the report and the run moves on.

use crate::config::{Config, CrawlerMode};
use crate::crawler::limiter::ConcurrencyLimiter;
use crate::crawler::review_crawler::ReviewCrawler;
use crate::crawler::seller_crawler::SellerCrawler;
use crate::crawler::UpstreamClient;
use crate::storage::BlobStore;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// What a crawler should work on
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Seller ids or item refs, depending on the crawler
    pub targets: Vec<String>,
}

/// A target that could not be crawled
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlFailure {
    pub target: String,
    pub error: String,
    /// HTTP status of the failure, if it had one
    pub status: Option<u16>,
    pub timed_out: bool,
}

/// Outcome of one crawler run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    pub crawler: String,
    pub succeeded: usize,
    pub failed: Vec<CrawlFailure>,
    pub elapsed_ms: u64,
}

impl CrawlReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }
}

/// A crawler that can be selected and run by configuration
#[async_trait]
pub trait ItemCrawler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, options: &CrawlOptions) -> Result<CrawlReport>;
}

/// Runs `crawl_one` over every target under `limiter`
///
/// Per-target errors are logged and collected instead of cancelling the
/// remaining targets.
pub(crate) async fn crawl_targets<'a, F, Fut>(
    name: &'static str,
    limiter: ConcurrencyLimiter,
    targets: &'a [String],
    crawl_one: F,
) -> CrawlReport
where
    F: Fn(&'a String) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let started = Instant::now();
    tracing::info!(
        "{}: crawling {} targets with {} workers",
        name,
        targets.len(),
        limiter.limit()
    );

    let outcomes = limiter
        .map(targets, |target| {
            let attempt = crawl_one(target);
            async move { Ok::<_, Infallible>(attempt.await) }
        })
        .await
        .unwrap_or_else(|never| match never {});

    let mut report = CrawlReport {
        crawler: name.to_string(),
        succeeded: 0,
        failed: Vec::new(),
        elapsed_ms: 0,
    };

    for (target, outcome) in targets.iter().zip(outcomes) {
        match outcome {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                tracing::warn!("{}: {} failed: {}", name, target, e);
                report.failed.push(CrawlFailure {
                    target: target.clone(),
                    status: e.status(),
                    timed_out: e.is_timeout(),
                    error: e.to_string(),
                });
            }
        }
    }

    report.elapsed_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        "{}: {} succeeded, {} failed in {}ms",
        name,
        report.succeeded,
        report.failed.len(),
        report.elapsed_ms
    );

    report
}

/// Builds the crawler named by `crawler.mode`
pub fn select_crawler(
    config: &Config,
    upstream: Arc<UpstreamClient>,
    store: Arc<dyn BlobStore>,
) -> Result<Box<dyn ItemCrawler>> {
    let limiter = ConcurrencyLimiter::new(config.crawler.concurrency as usize);

    let crawler: Box<dyn ItemCrawler> = match config.crawler.mode {
        CrawlerMode::Sellers => Box::new(SellerCrawler::new(
            upstream,
            store,
            limiter,
            config.markers.clone(),
        )?),
        CrawlerMode::Reviews => Box::new(ReviewCrawler::new(
            upstream,
            store,
            limiter,
            u64::from(config.crawler.review_page_size),
            config.crawler.max_review_pages,
        )),
    };

    tracing::debug!("Selected {} crawler", crawler.name());
    Ok(crawler)
}
