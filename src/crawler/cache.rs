//! Seller page cache
//!
//! A `PageCache` is created by whoever owns a crawl run and handed to the
//! `UpstreamClient`. Entries are keyed by the SHA-256 of the request path and
//! expire after a fixed time-to-live.

use crate::crawler::fetcher::FetchResult;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

/// A fetched page with the time it was stored
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub page: FetchResult,
    pub fetched_at: DateTime<Utc>,
}

impl CachedPage {
    pub fn new(page: FetchResult) -> Self {
        Self {
            page,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the entry is older than `ttl`
    pub fn is_stale(&self, ttl: Duration) -> bool {
        Utc::now() - self.fetched_at > ttl
    }
}

/// Time-limited in-memory page cache
#[derive(Debug)]
pub struct PageCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedPage>>,
}

impl PageCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::zero()),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cache key for a request path
    pub fn key_for(path: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(path.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Returns a fresh entry for `path`, evicting it if stale
    pub fn get(&self, path: &str) -> Option<FetchResult> {
        let key = Self::key_for(path);
        let mut entries = self.entries.lock().ok()?;

        match entries.get(&key) {
            Some(cached) if !cached.is_stale(self.ttl) => Some(cached.page.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Stores `page`, dropping every entry that has gone stale
    pub fn insert(&self, path: &str, page: FetchResult) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|_, cached| !cached.is_stale(self.ttl));
            entries.insert(Self::key_for(path), CachedPage::new(page));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
