//! Crawler core
//!
//! This module contains everything that talks to the marketplace:
//! - Bounded-parallelism fan-out (`ConcurrencyLimiter`)
//! - Host failover for every upstream endpoint
//! - Byte-capped, time-boxed body reads with early abort
//! - Seller page, summary, review and location filter requests
//! - The `ItemCrawler` implementations a run is driven by

mod cache;
mod coordinator;
mod failover;
mod fetcher;
mod limiter;
mod review_crawler;
mod reviews;
mod seller_crawler;
mod stream;

pub use cache::{CachedPage, PageCache};
pub use coordinator::{select_crawler, CrawlFailure, CrawlOptions, CrawlReport, ItemCrawler};
pub use failover::{should_fail_over, HostFailover};
pub use fetcher::{
    build_http_client, FetchResult, LocationFilterOutcome, LocationForm, UpstreamClient,
    UserSummaryResult,
};
pub use limiter::ConcurrencyLimiter;
pub use review_crawler::{ReviewCollection, ReviewCrawler};
pub use reviews::{ReviewPage, ReviewsPaginator};
pub use seller_crawler::{SellerCrawler, SellerDetail};
pub use stream::{read_bounded, AbortReason, BoundedBody, EarlyAbort, StreamLimits};

pub(crate) use seller_crawler::StoredSellerStats;
