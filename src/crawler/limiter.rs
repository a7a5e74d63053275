//! Bounded-parallelism map over a slice
//!
//! Every fan-out of upstream requests goes through here so that the number
//! of simultaneous connections never exceeds the configured concurrency.

use futures::future::try_join_all;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Caps how many invocations of an async function run at once
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyLimiter {
    limit: usize,
}

impl ConcurrencyLimiter {
    /// Creates a limiter; a limit of zero is treated as one
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Applies `f` to every item with at most `limit` calls in flight
    ///
    /// `min(limit, items.len())` workers each claim the next unprocessed index
    /// from a shared counter until the slice is exhausted. Results come back in
    /// input order regardless of completion order. The first error cancels the
    /// remaining workers and is returned; results already produced are dropped.
    pub async fn map<'a, T, R, E, F, Fut>(&self, items: &'a [T], f: F) -> Result<Vec<R>, E>
    where
        F: Fn(&'a T) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let workers = self.limit.min(items.len());
        let next = AtomicUsize::new(0);
        let next = &next;
        let f = &f;

        let pool = (0..workers).map(|_| async move {
            let mut finished = Vec::new();
            loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                if index >= items.len() {
                    break;
                }
                let value = f(&items[index]).await?;
                finished.push((index, value));
            }
            Ok::<_, E>(finished)
        });

        let batches = try_join_all(pool).await?;

        let mut slots: Vec<Option<R>> = (0..items.len()).map(|_| None).collect();
        for (index, value) in batches.into_iter().flatten() {
            slots[index] = Some(value);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}
