//! Paged review fetching
//!
//! Each call fetches one window of an item's reviews. The paginator keeps no
//! state between calls; callers advance the offset themselves.

use crate::crawler::fetcher::{encode_segment, non_null, unwrap_message, UpstreamClient};
use crate::Result;
use serde::Serialize;
use serde_json::Value;

/// One window of reviews for an item
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    pub item: Option<Value>,
    pub reviews: Vec<Value>,
    pub first_offset: u64,
    pub page_size: u64,
    pub raw: Value,
    pub source_url: String,
    pub elapsed_ms: u64,
}

impl ReviewPage {
    /// True if no further page should be requested after this one
    pub fn is_last(&self, requested: u64) -> bool {
        (self.reviews.len() as u64) < requested
    }
}

/// Reads a number that may arrive as a JSON number or a numeric string
fn lenient_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Fetches review pages through the upstream client's host failover
pub struct ReviewsPaginator<'a> {
    upstream: &'a UpstreamClient,
}

impl<'a> ReviewsPaginator<'a> {
    pub fn new(upstream: &'a UpstreamClient) -> Self {
        Self { upstream }
    }

    /// Fetches `page_size` reviews of `ref_num` starting at `first`
    ///
    /// A missing `message` envelope yields an empty page rather than an error.
    pub async fn fetch_page(&self, ref_num: &str, first: u64, page_size: u64) -> Result<ReviewPage> {
        let path = format!(
            "/core/api/reviews/item/{}?first={}&n={}&requireMedia=false",
            encode_segment(ref_num),
            first,
            page_size
        );
        let response = self.upstream.get_json(&path).await?;

        Ok(parse_review_page(
            response.value,
            response.source_url,
            response.elapsed_ms,
            first,
            page_size,
        ))
    }
}

impl UpstreamClient {
    /// Fetches one review window; see `ReviewsPaginator::fetch_page`
    pub async fn fetch_review_page(&self, ref_num: &str, first: u64, page_size: u64) -> Result<ReviewPage> {
        ReviewsPaginator::new(self).fetch_page(ref_num, first, page_size).await
    }
}

/// Builds a `ReviewPage` from a raw response, falling back to the request window
fn parse_review_page(
    raw: Value,
    source_url: String,
    elapsed_ms: u64,
    first: u64,
    page_size: u64,
) -> ReviewPage {
    let envelope = unwrap_message(&raw);

    let reviews = match envelope.get("reviews") {
        Some(Value::Array(reviews)) => reviews.clone(),
        _ => Vec::new(),
    };

    ReviewPage {
        item: non_null(envelope, "item"),
        reviews,
        first_offset: lenient_u64(envelope.get("first")).unwrap_or(first),
        page_size: lenient_u64(envelope.get("n")).unwrap_or(page_size),
        source_url,
        elapsed_ms,
        raw,
    }
}
