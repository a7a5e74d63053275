//! Seller profile crawler

use crate::aggregate::ReviewStats;
use crate::config::Markers;
use crate::crawler::coordinator::{crawl_targets, CrawlOptions, CrawlReport, ItemCrawler};
use crate::crawler::fetcher::{FetchResult, UserSummaryResult};
use crate::crawler::limiter::ConcurrencyLimiter;
use crate::crawler::UpstreamClient;
use crate::extract::{
    extract_manifesto, extract_seller_image, extract_seller_meta, ImageRules, ManifestoResult,
    OnlineStatus,
};
use crate::storage::{put_json, seller_key, BlobStore};
use crate::{ConfigError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Everything stored for one seller at `sellers/{id}.json`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerDetail {
    pub id: String,
    pub source_url: String,
    pub byte_count: u64,
    pub manifesto: ManifestoResult,
    pub online_status: Option<OnlineStatus>,
    pub joined_text: Option<String>,
    pub image_url: Option<String>,
    pub stats: Option<ReviewStats>,
    pub summary: Option<Value>,
    pub crawled_at: DateTime<Utc>,
}

/// The part of a stored `SellerDetail` the index publisher reads back
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StoredSellerStats {
    #[serde(default)]
    pub stats: Option<ReviewStats>,
}

/// Fetches seller pages and summaries and stores the extracted details
pub struct SellerCrawler {
    upstream: Arc<UpstreamClient>,
    store: Arc<dyn BlobStore>,
    limiter: ConcurrencyLimiter,
    markers: Markers,
    image_rules: ImageRules,
}

impl SellerCrawler {
    pub fn new(
        upstream: Arc<UpstreamClient>,
        store: Arc<dyn BlobStore>,
        limiter: ConcurrencyLimiter,
        markers: Markers,
    ) -> Result<Self> {
        let image_rules = ImageRules::from_markers(&markers)
            .map_err(|e| ConfigError::InvalidPattern(format!("image markers: {}", e)))?;

        Ok(Self {
            upstream,
            store,
            limiter,
            markers,
            image_rules,
        })
    }

    /// Builds a seller's detail record from its fetched page and summary
    ///
    /// Kept synchronous so the parsed document never lives across an await.
    fn build_detail(
        &self,
        seller_id: &str,
        page: FetchResult,
        summary: Option<UserSummaryResult>,
    ) -> SellerDetail {
        let manifesto = extract_manifesto(&page.html, &self.markers);
        let meta = extract_seller_meta(&page.html, &self.markers);
        let image_url = extract_seller_image(&page.html, &self.image_rules);

        let (stats, summary) = match summary {
            Some(summary) => (
                summary.statistics.as_ref().map(ReviewStats::from_statistics),
                summary.summary,
            ),
            None => (None, None),
        };

        SellerDetail {
            id: seller_id.to_string(),
            source_url: page.source_url,
            byte_count: page.byte_count,
            manifesto,
            online_status: meta.online_status,
            joined_text: meta.joined_text,
            image_url,
            stats,
            summary,
            crawled_at: Utc::now(),
        }
    }

    /// Crawls one seller
    ///
    /// The profile page is required and fetched first. A failed summary only
    /// costs the review statistics. Requests are sequential so one worker
    /// never holds more than one upstream connection.
    pub async fn crawl_seller(&self, seller_id: &str) -> Result<SellerDetail> {
        let page = self.upstream.fetch_seller_page(seller_id).await?;
        let summary = match self.upstream.fetch_user_summary(seller_id).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!("Summary for seller {} unavailable: {}", seller_id, e);
                None
            }
        };

        let detail = self.build_detail(seller_id, page, summary);
        put_json(self.store.as_ref(), &seller_key(seller_id), &detail)?;

        tracing::debug!(
            "Stored seller {} (manifesto {} chars, image {})",
            seller_id,
            detail.manifesto.length,
            detail.image_url.is_some()
        );
        Ok(detail)
    }
}

#[async_trait]
impl ItemCrawler for SellerCrawler {
    fn name(&self) -> &'static str {
        "sellers"
    }

    async fn run(&self, options: &CrawlOptions) -> Result<CrawlReport> {
        Ok(crawl_targets(self.name(), self.limiter, &options.targets, |id| async move {
            self.crawl_seller(id).await.map(|_| ())
        })
        .await)
    }
}
