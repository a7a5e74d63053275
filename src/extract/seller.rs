//! Seller profile text extraction
//!
//! Pulls the seller's free-text "manifesto" and the online/joined metadata
//! out of a profile page using balanced regions.

use crate::config::Markers;
use crate::extract::region::{
    extract_balanced_region, flatten_lines, html_to_text, strip_labelled_block,
    truncate_at_line, OpenTagPattern,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Hard cap on manifesto text
pub const MANIFESTO_MAX_BYTES: usize = 50 * 1024;

static ONLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)online\s+(\w+)").unwrap());
static JOINED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)joined\s+(.+)$").unwrap());

/// A seller's manifesto text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestoResult {
    /// `None` when the region is missing, unbalanced, or empty
    pub text: Option<String>,
    /// Character count
    pub length: usize,
    /// Number of newline-separated lines
    pub line_count: usize,
}

impl ManifestoResult {
    fn not_found() -> Self {
        Self::default()
    }

    fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::not_found();
        }
        Self {
            length: text.chars().count(),
            line_count: text.split('\n').count(),
            text: Some(text.to_string()),
        }
    }
}

/// When the seller was last seen online
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnlineStatus {
    Yesterday,
    Today,
}

impl OnlineStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Some(Self::Today),
            "yesterday" => Some(Self::Yesterday),
            _ => None,
        }
    }
}

/// Online and joined metadata shown on a seller's profile
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerMeta {
    pub online_status: Option<OnlineStatus>,
    pub joined_text: Option<String>,
}

/// Extracts the manifesto region's text
///
/// The label wrapper inside the region is removed before the markup is
/// flattened, and the result is capped at `MANIFESTO_MAX_BYTES` on a line
/// boundary.
pub fn extract_manifesto(html: &str, markers: &Markers) -> ManifestoResult {
    let region_pattern = OpenTagPattern::with_classes(&markers.manifesto_classes);
    let Some(region) = extract_balanced_region(html, &region_pattern) else {
        return ManifestoResult::not_found();
    };

    let label = OpenTagPattern::with_classes([&markers.manifesto_label_class]);
    let body = strip_labelled_block(region.inner(html), &label);
    let text = html_to_text(&body);

    ManifestoResult::from_text(truncate_at_line(&text, MANIFESTO_MAX_BYTES))
}

/// Extracts online status and joined text from the metadata region
pub fn extract_seller_meta(html: &str, markers: &Markers) -> SellerMeta {
    let pattern = OpenTagPattern::with_classes(&markers.meta_classes);
    let Some(region) = extract_balanced_region(html, &pattern) else {
        return SellerMeta::default();
    };

    let text = flatten_lines(region.inner(html));

    let online_status = ONLINE
        .captures(&text)
        .and_then(|caps| OnlineStatus::parse(&caps[1]));
    let joined_text = JOINED
        .captures(&text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|joined| !joined.is_empty());

    SellerMeta {
        online_status,
        joined_text,
    }
}
