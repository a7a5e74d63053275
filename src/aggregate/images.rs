//! Item image lookup
//!
//! Maps item ref numbers and ids to one representative image URL each.

use crate::aggregate::coerce_key;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Compact index entries carry the primary image under a short key
const PRIMARY_IMAGE_FIELD: &str = "pi";
/// Compact thumbnail key, the last resort
const THUMBNAIL_FIELD: &str = "th";

/// Image URL per item ref and per item id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemImageLookup {
    pub by_ref: BTreeMap<String, String>,
    pub by_id: BTreeMap<String, String>,
}

fn non_empty_str<'a>(entry: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    entry
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())
}

/// Picks the representative image of one entry
fn pick_image(entry: &Map<String, Value>) -> Option<&str> {
    non_empty_str(entry, "imageUrl")
        .or_else(|| {
            entry
                .get("imageUrls")
                .and_then(Value::as_array)
                .and_then(|urls| urls.first())
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|url| !url.is_empty())
        })
        .or_else(|| non_empty_str(entry, PRIMARY_IMAGE_FIELD))
        .or_else(|| non_empty_str(entry, THUMBNAIL_FIELD))
}

/// Builds the lookup from market index entries
///
/// The first entry to claim a ref or id keeps it. Entries that are not
/// objects or have no usable image are skipped.
pub fn build_item_image_lookup(entries: &[Value]) -> ItemImageLookup {
    let mut lookup = ItemImageLookup::default();

    for entry in entries {
        let Some(entry) = entry.as_object() else {
            continue;
        };
        let Some(image) = pick_image(entry) else {
            continue;
        };

        if let Some(ref_num) = coerce_key(entry.get("refNum")) {
            lookup
                .by_ref
                .entry(ref_num)
                .or_insert_with(|| image.to_string());
        }
        if let Some(id) = coerce_key(entry.get("id")) {
            lookup.by_id.entry(id).or_insert_with(|| image.to_string());
        }
    }

    lookup
}
