//! Seller aggregation
//!
//! Market index entries give seller identity and item counts; raw item
//! records give the online signal; stored summaries give review statistics.

use crate::aggregate::{coerce_key, lenient_f64};
use crate::extract::OnlineStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Field of a raw item record carrying the seller's online status
const ONLINE_FIELD: &str = "sellerOnline";

/// Review statistics reported for a seller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub average_rating: Option<f64>,
    pub average_days_to_arrive: Option<f64>,
    pub number_of_reviews: Option<f64>,
}

impl ReviewStats {
    /// Reads the statistics object of a user summary
    pub fn from_statistics(statistics: &Value) -> Self {
        Self {
            average_rating: lenient_f64(statistics.get("averageRating")),
            average_days_to_arrive: lenient_f64(statistics.get("averageDaysToArrive")),
            number_of_reviews: lenient_f64(statistics.get("numberOfReviews")),
        }
    }
}

/// One deduplicated seller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerAggregate {
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub online_status: Option<OnlineStatus>,
    pub items_count: u64,
    pub average_rating: Option<f64>,
    pub average_days_to_arrive: Option<f64>,
    pub number_of_reviews: Option<f64>,
}

/// Seller identity read from a record
struct SellerIdentity {
    key: String,
    id: Option<String>,
    name: Option<String>,
}

/// Derives the dedup key: `id:<sellerId>` if present, else `name:<lowercased name>`
fn identify(record: &Value) -> Option<SellerIdentity> {
    let record = record.as_object()?;
    let id = coerce_key(record.get("sellerId"));
    let name = record
        .get("sellerName")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let key = match (&id, &name) {
        (Some(id), _) => format!("id:{}", id),
        (None, Some(name)) => format!("name:{}", name.to_lowercase()),
        (None, None) => return None,
    };

    Some(SellerIdentity { key, id, name })
}

/// Primary collation key: diacritics folded away, then lowercased
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Orders names the way a reader would: accents and case only break ties
fn compare_names(a: Option<&str>, b: Option<&str>) -> Ordering {
    let a = a.unwrap_or("");
    let b = b.unwrap_or("");
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Builds the seller list for the market index
///
/// `review_stats` is keyed by seller id. The result is sorted by number of
/// reviews (descending, missing counts as zero) and then by name.
pub fn build_market_sellers(
    raw_items: &[Value],
    index_entries: &[Value],
    review_stats: &HashMap<String, ReviewStats>,
) -> Vec<SellerAggregate> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, (SellerIdentity, u64)> = HashMap::new();

    for entry in index_entries {
        let Some(identity) = identify(entry) else {
            continue;
        };
        match counts.get_mut(&identity.key) {
            Some((_, count)) => *count += 1,
            None => {
                order.push(identity.key.clone());
                counts.insert(identity.key.clone(), (identity, 1));
            }
        }
    }

    // Only ever upgrade: yesterday < today
    let mut online: HashMap<String, OnlineStatus> = HashMap::new();
    for item in raw_items {
        let Some(identity) = identify(item) else {
            continue;
        };
        let Some(status) = item
            .get(ONLINE_FIELD)
            .and_then(Value::as_str)
            .and_then(OnlineStatus::parse)
        else {
            continue;
        };
        online
            .entry(identity.key)
            .and_modify(|current| *current = (*current).max(status))
            .or_insert(status);
    }

    let mut sellers: Vec<SellerAggregate> = order
        .iter()
        .filter_map(|key| counts.remove(key).map(|entry| (key, entry)))
        .map(|(key, (identity, items_count))| {
            let stats = identity
                .id
                .as_ref()
                .and_then(|id| review_stats.get(id))
                .cloned()
                .unwrap_or_default();

            SellerAggregate {
                url: identity.id.as_ref().map(|id| format!("/viewSubject/p/{}", id)),
                id: identity.id,
                name: identity.name,
                online_status: online.get(key).copied(),
                items_count,
                average_rating: stats.average_rating,
                average_days_to_arrive: stats.average_days_to_arrive,
                number_of_reviews: stats.number_of_reviews,
            }
        })
        .collect();

    sellers.sort_by(|a, b| {
        let a_reviews = a.number_of_reviews.unwrap_or(0.0);
        let b_reviews = b.number_of_reviews.unwrap_or(0.0);
        b_reviews
            .total_cmp(&a_reviews)
            .then_with(|| compare_names(a.name.as_deref(), b.name.as_deref()))
            .then_with(|| a.id.cmp(&b.id))
    });

    sellers
}
