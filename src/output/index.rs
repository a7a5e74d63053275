//! Index publishing
//!
//! Folds the stored market index, raw items and crawled seller details into
//! the artifacts the serving layer reads.

use crate::aggregate::{build_item_image_lookup, build_market_sellers, coerce_key, ReviewStats};
use crate::crawler::StoredSellerStats;
use crate::storage::{
    get_json, put_json, seller_key, BlobStore, IMAGE_LOOKUP_KEY, MARKET_INDEX_KEY,
    MARKET_ITEMS_KEY, MARKET_SELLERS_KEY,
};
use crate::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Counts describing one publishing pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub index_entries: usize,
    pub raw_items: usize,
    pub sellers: usize,
    pub sellers_with_stats: usize,
    pub images_by_ref: usize,
    pub images_by_id: usize,
}

/// Loads review statistics for every seller id in the index
///
/// Missing or unreadable details are skipped.
fn load_review_stats(store: &dyn BlobStore, index: &[Value]) -> HashMap<String, ReviewStats> {
    let mut stats = HashMap::new();

    for seller_id in index.iter().filter_map(|entry| coerce_key(entry.get("sellerId"))) {
        if stats.contains_key(&seller_id) {
            continue;
        }
        match get_json::<StoredSellerStats>(store, &seller_key(&seller_id)) {
            Ok(Some(StoredSellerStats { stats: Some(found) })) => {
                stats.insert(seller_id, found);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Skipping stored detail for seller {}: {}", seller_id, e),
        }
    }

    stats
}

/// Builds and writes the seller list and item image lookup
pub fn publish_index(store: &dyn BlobStore) -> Result<IndexSummary> {
    let index: Vec<Value> = get_json(store, MARKET_INDEX_KEY)?.unwrap_or_default();
    let raw_items: Vec<Value> = get_json(store, MARKET_ITEMS_KEY)?.unwrap_or_default();
    tracing::info!(
        "Publishing index from {} entries and {} raw items",
        index.len(),
        raw_items.len()
    );

    let review_stats = load_review_stats(store, &index);
    let sellers = build_market_sellers(&raw_items, &index, &review_stats);
    let lookup = build_item_image_lookup(&index);

    put_json(store, MARKET_SELLERS_KEY, &sellers)?;
    put_json(store, IMAGE_LOOKUP_KEY, &lookup)?;

    let summary = IndexSummary {
        index_entries: index.len(),
        raw_items: raw_items.len(),
        sellers: sellers.len(),
        sellers_with_stats: review_stats.len(),
        images_by_ref: lookup.by_ref.len(),
        images_by_id: lookup.by_id.len(),
    };
    tracing::info!(
        "Published {} sellers and {} item images",
        summary.sellers,
        summary.images_by_id
    );

    Ok(summary)
}
