//! Storage module for persisting crawl output
//!
//! The crawler treats persistence as an opaque key-value capability. This
//! module defines that capability, a SQLite backend, an in-memory backend,
//! and the key layout shared by the crawlers and the index publisher.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{BlobStore, StorageError, StorageResult};

use crate::MirrorError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Key of the market index entries
pub const MARKET_INDEX_KEY: &str = "market/index.json";

/// Key of the raw per-item records
pub const MARKET_ITEMS_KEY: &str = "market/items.json";

/// Key of the published seller aggregate list
pub const MARKET_SELLERS_KEY: &str = "market/sellers.json";

/// Key of the published item image lookup maps
pub const IMAGE_LOOKUP_KEY: &str = "market/image-lookup.json";

/// Key of a seller's detail record
pub fn seller_key(seller_id: &str) -> String {
    format!("sellers/{}.json", seller_id)
}

/// Key of an item's collected reviews
pub fn reviews_key(ref_num: &str) -> String {
    format!("reviews/{}.json", ref_num)
}

/// Reads and decodes a JSON value, `None` if the key is absent
pub fn get_json<T: DeserializeOwned>(
    store: &dyn BlobStore,
    key: &str,
) -> Result<Option<T>, MirrorError> {
    match store.get(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Encodes a value as JSON and stores it
pub fn put_json<T: Serialize + ?Sized>(
    store: &dyn BlobStore,
    key: &str,
    value: &T,
) -> Result<(), MirrorError> {
    let bytes = serde_json::to_vec(value)?;
    store.put(key, &bytes)?;
    Ok(())
}
