//! Review collection crawler

use crate::crawler::coordinator::{crawl_targets, CrawlOptions, CrawlReport, ItemCrawler};
use crate::crawler::limiter::ConcurrencyLimiter;
use crate::crawler::reviews::ReviewsPaginator;
use crate::crawler::UpstreamClient;
use crate::storage::{put_json, reviews_key, BlobStore};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// All reviews gathered for one item, stored at `reviews/{ref}.json`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCollection {
    pub ref_num: String,
    pub item: Option<Value>,
    pub reviews: Vec<Value>,
    pub pages: u32,
    /// False when the page limit stopped collection early
    pub complete: bool,
    pub crawled_at: DateTime<Utc>,
}

/// Pages through each item's reviews and stores them
pub struct ReviewCrawler {
    upstream: Arc<UpstreamClient>,
    store: Arc<dyn BlobStore>,
    limiter: ConcurrencyLimiter,
    page_size: u64,
    max_pages: u32,
}

impl ReviewCrawler {
    pub fn new(
        upstream: Arc<UpstreamClient>,
        store: Arc<dyn BlobStore>,
        limiter: ConcurrencyLimiter,
        page_size: u64,
        max_pages: u32,
    ) -> Self {
        Self {
            upstream,
            store,
            limiter,
            page_size: page_size.max(1),
            max_pages,
        }
    }

    /// Collects reviews until a short or empty page, or the page limit
    pub async fn collect_reviews(&self, ref_num: &str) -> Result<ReviewCollection> {
        let paginator = ReviewsPaginator::new(&self.upstream);
        let mut collection = ReviewCollection {
            ref_num: ref_num.to_string(),
            item: None,
            reviews: Vec::new(),
            pages: 0,
            complete: false,
            crawled_at: Utc::now(),
        };
        let mut offset = 0;

        while collection.pages < self.max_pages {
            let page = paginator.fetch_page(ref_num, offset, self.page_size).await?;
            collection.pages += 1;

            if collection.item.is_none() {
                collection.item = page.item.clone();
            }
            let last = page.reviews.is_empty() || page.is_last(self.page_size);
            collection.reviews.extend(page.reviews);

            if last {
                collection.complete = true;
                break;
            }
            offset += self.page_size;
        }

        if !collection.complete {
            tracing::warn!(
                "Stopped {} after {} review pages",
                ref_num,
                collection.pages
            );
        }

        put_json(self.store.as_ref(), &reviews_key(ref_num), &collection)?;
        tracing::debug!(
            "Stored {} reviews for {} over {} pages",
            collection.reviews.len(),
            ref_num,
            collection.pages
        );
        Ok(collection)
    }
}

#[async_trait]
impl ItemCrawler for ReviewCrawler {
    fn name(&self) -> &'static str {
        "reviews"
    }

    async fn run(&self, options: &CrawlOptions) -> Result<CrawlReport> {
        Ok(crawl_targets(self.name(), self.limiter, &options.targets, |ref_num| async move {
            self.collect_reviews(ref_num).await.map(|_| ())
        })
        .await)
    }
}
