//! Upstream HTTP client
//!
//! This module handles every request the crawler makes to the marketplace:
//! - Building the HTTP client with a proper user agent string
//! - Seller page GETs read through the bounded stream reader
//! - JSON GETs (user summaries, review pages) with envelope unwrapping
//! - The location filter POST, whose redirects are reported, not followed
//!
//! All of them go through `HostFailover`.

use crate::config::{Config, LocationConfig, UserAgentConfig};
use crate::crawler::cache::PageCache;
use crate::crawler::failover::HostFailover;
use crate::crawler::stream::{read_bounded, BoundedBody, StreamLimits};
use crate::{MirrorError, Result};
use regex::Regex;
use reqwest::multipart::Form;
use reqwest::{redirect::Policy, Client};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A successfully fetched seller page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    /// Decoded HTML (possibly cut short by the byte cap or early abort)
    pub html: String,

    /// URL of the host that answered
    pub source_url: String,

    /// Bytes received, which may exceed what was kept
    pub byte_count: u64,

    pub elapsed_ms: u64,
}

/// A seller's summary JSON with the envelope removed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryResult {
    pub summary: Option<Value>,
    pub statistics: Option<Value>,
    pub raw: Value,
    pub source_url: String,
}

/// A decoded JSON body and where it came from
#[derive(Debug, Clone)]
pub(crate) struct JsonResponse {
    pub value: Value,
    pub source_url: String,
    pub elapsed_ms: u64,
}

/// Fields posted to the location filter
#[derive(Debug, Clone)]
pub struct LocationForm {
    pub ships_to: String,
    pub source_page: String,
    pub fp: String,
}

impl From<&LocationConfig> for LocationForm {
    fn from(config: &LocationConfig) -> Self {
        Self {
            ships_to: config.ships_to.clone(),
            source_page: config.source_page.clone(),
            fp: config.fp.clone(),
        }
    }
}

/// Result of posting the location filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationFilterOutcome {
    /// The filter was accepted (2xx)
    Applied { status: u16 },

    /// The upstream answered with a redirect, which is not followed
    Redirected {
        status: u16,
        location: Option<String>,
    },
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are disabled so a 3xx is visible to the caller. There is no
/// overall request timeout here; each read carries its own deadline.
pub fn build_http_client(config: &UserAgentConfig) -> std::result::Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Percent-encodes a single path segment
///
/// The form encoder writes a space as `+`, which a path reads as a literal
/// plus. A literal `+` is always escaped to `%2B`, so every `+` left in the
/// output stands for a space.
pub(crate) fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Returns the `message` envelope if present, otherwise the value itself
pub(crate) fn unwrap_message(raw: &Value) -> &Value {
    match raw.get("message") {
        Some(inner) if inner.is_object() => inner,
        _ => raw,
    }
}

/// Returns a non-null field as an owned value
pub(crate) fn non_null(value: &Value, field: &str) -> Option<Value> {
    value.get(field).filter(|v| !v.is_null()).cloned()
}

/// Client for the marketplace's hosts
pub struct UpstreamClient {
    client: Client,
    failover: HostFailover,
    html_limits: StreamLimits,
    json_limits: StreamLimits,
    cache: Arc<PageCache>,
}

impl UpstreamClient {
    pub fn new(
        client: Client,
        failover: HostFailover,
        html_limits: StreamLimits,
        json_limits: StreamLimits,
        cache: Arc<PageCache>,
    ) -> Self {
        Self {
            client,
            failover,
            html_limits,
            json_limits,
            cache,
        }
    }

    /// Builds a client from configuration with an injected cache
    pub fn from_config(config: &Config, cache: Arc<PageCache>) -> Result<Self> {
        let client = build_http_client(&config.user_agent)?;
        let timeout = Duration::from_millis(config.crawler.timeout_ms);

        let mut html_limits = StreamLimits::new(config.crawler.max_bytes, timeout);
        if config.crawler.early_abort {
            let marker = Regex::new(&config.markers.early_abort_pattern).map_err(|e| {
                crate::ConfigError::InvalidPattern(format!("early_abort_pattern: {}", e))
            })?;
            html_limits = html_limits.with_early_abort(config.crawler.early_abort_min_bytes, marker);
        }
        let json_limits = StreamLimits::new(config.crawler.json_max_bytes, timeout);

        Ok(Self::new(
            client,
            HostFailover::new(config.hosts.candidates.iter().cloned()),
            html_limits,
            json_limits,
            cache,
        ))
    }

    pub fn hosts(&self) -> &[String] {
        self.failover.hosts()
    }

    /// GETs `url` and reads the body under `limits`
    ///
    /// The deadline starts before the request is sent and covers the
    /// response headers as well as the body.
    async fn get_bounded(&self, url: &str, limits: &StreamLimits) -> Result<BoundedBody> {
        let started = Instant::now();
        let deadline = started + limits.timeout;

        let response = match tokio::time::timeout_at(deadline, self.client.get(url).send()).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(source)) => {
                return Err(MirrorError::Http {
                    url: url.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(MirrorError::Timeout {
                    url: url.to_string(),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                })
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        read_bounded(url, response.bytes_stream(), limits, started).await
    }

    /// GETs a JSON document through host failover
    pub(crate) async fn get_json(&self, path: &str) -> Result<JsonResponse> {
        self.failover
            .run(path, |url| async move {
                let body = self.get_bounded(&url, &self.json_limits).await?;
                let value = serde_json::from_slice(&body.buffer).map_err(|source| {
                    MirrorError::Decode {
                        url: url.clone(),
                        source,
                    }
                })?;
                Ok(JsonResponse {
                    value,
                    source_url: url,
                    elapsed_ms: body.elapsed_ms,
                })
            })
            .await
    }

    /// Fetches a seller's profile page
    pub async fn fetch_seller_page(&self, seller_id: &str) -> Result<FetchResult> {
        let path = format!("/viewSubject/p/{}", encode_segment(seller_id));

        if let Some(cached) = self.cache.get(&path) {
            tracing::debug!("Cache hit for {}", path);
            return Ok(cached);
        }

        let page = self
            .failover
            .run(&path, |url| async move {
                let body = self.get_bounded(&url, &self.html_limits).await?;
                Ok(FetchResult {
                    html: body.text(),
                    source_url: url,
                    byte_count: body.byte_count,
                    elapsed_ms: body.elapsed_ms,
                })
            })
            .await?;

        tracing::debug!(
            "Fetched {} ({} bytes in {}ms)",
            page.source_url,
            page.byte_count,
            page.elapsed_ms
        );

        self.cache.insert(&path, page.clone());
        Ok(page)
    }

    /// Fetches a seller's summary and statistics
    pub async fn fetch_user_summary(&self, seller_id: &str) -> Result<UserSummaryResult> {
        let path = format!("/core/api/getUserSummary/p/{}", encode_segment(seller_id));
        let response = self.get_json(&path).await?;

        let envelope = unwrap_message(&response.value);
        Ok(UserSummaryResult {
            summary: non_null(envelope, "summary"),
            statistics: non_null(envelope, "statistics"),
            raw: response.value.clone(),
            source_url: response.source_url,
        })
    }

    /// Posts the location filter form
    ///
    /// A 2xx means the filter was applied. A 3xx comes back as `Redirected`
    /// so the caller can tell it apart from success.
    pub async fn apply_location_filter(&self, form: &LocationForm) -> Result<LocationFilterOutcome> {
        let timeout = self.html_limits.timeout;

        self.failover
            .run("/setLocationFilter", |url| async move {
                let multipart = Form::new()
                    .text("shipsTo", form.ships_to.clone())
                    .text("_sourcePage", form.source_page.clone())
                    .text("__fp", form.fp.clone());

                let started = Instant::now();
                let request = self.client.post(&url).multipart(multipart).send();
                let response = match tokio::time::timeout_at(started + timeout, request).await {
                    Ok(Ok(response)) => response,
                    Ok(Err(source)) => return Err(MirrorError::Http { url, source }),
                    Err(_) => {
                        return Err(MirrorError::Timeout {
                            url,
                            elapsed_ms: started.elapsed().as_millis() as u64,
                        })
                    }
                };

                let status = response.status();
                if status.is_success() {
                    Ok(LocationFilterOutcome::Applied {
                        status: status.as_u16(),
                    })
                } else if status.is_redirection() {
                    let location = response
                        .headers()
                        .get(reqwest::header::LOCATION)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    Ok(LocationFilterOutcome::Redirected {
                        status: status.as_u16(),
                        location,
                    })
                } else {
                    Err(MirrorError::Status {
                        url,
                        status: status.as_u16(),
                    })
                }
            })
            .await
    }
}
