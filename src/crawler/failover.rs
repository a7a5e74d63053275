//! Ordered host failover
//!
//! The marketplace serves the same paths from several base domains. A request
//! is tried against each host in order, moving on only when the failure looks
//! transient: a 5xx status, or no status at all (connect error, timeout,
//! broken stream). A 4xx is the upstream's definitive answer and is returned
//! at once.

use crate::{MirrorError, Result};
use std::future::Future;

/// Returns true if `error` should be retried against the next host
pub fn should_fail_over(error: &MirrorError) -> bool {
    match error.status() {
        Some(status) => status >= 500,
        None => true,
    }
}

/// An ordered list of candidate base URLs
#[derive(Debug, Clone)]
pub struct HostFailover {
    hosts: Vec<String>,
}

impl HostFailover {
    /// Creates a failover list; trailing slashes on hosts are dropped
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.into().trim_end_matches('/').to_string())
                .collect(),
        }
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Runs `attempt` with the full URL of `path` on each host in turn
    ///
    /// Each attempt owns its own time budget, so a slow first host does not
    /// eat into the fallback's. When every host fails the last error is
    /// returned; an empty host list yields `NoHostsSucceeded`.
    pub async fn run<T, F, Fut>(&self, path: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for (index, host) in self.hosts.iter().enumerate() {
            let url = format!("{}{}", host, path);
            tracing::debug!("Attempt {}/{}: {}", index + 1, self.hosts.len(), url);

            match attempt(url).await {
                Ok(value) => return Ok(value),
                Err(e) if should_fail_over(&e) => {
                    tracing::warn!("Host {} failed for {}: {}", host, path, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| MirrorError::NoHostsSucceeded {
            path: path.to_string(),
        }))
    }
}
