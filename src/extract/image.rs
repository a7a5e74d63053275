//! Seller avatar selection
//!
//! Profile pages lazy-load images, so the real URL may sit in `data-src`,
//! `srcset`, or `src`, and the visible `src` is often a placeholder.

use crate::config::Markers;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Compiled rules for picking a seller image
#[derive(Debug, Clone)]
pub struct ImageRules {
    /// Class token of the seller's avatar `<img>`
    pub marker: String,
    /// Matches placeholder file names
    pub placeholder: Regex,
    /// Matches paths of real uploaded assets
    pub real_asset: Regex,
}

impl ImageRules {
    pub fn from_markers(markers: &Markers) -> Result<Self, regex::Error> {
        Ok(Self {
            marker: markers.image_class.clone(),
            placeholder: Regex::new(&markers.placeholder_pattern)?,
            real_asset: Regex::new(&markers.asset_path_pattern)?,
        })
    }
}

fn non_empty_attr<'a>(img: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    img.value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// First URL of a `srcset` list
fn first_srcset_url(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .next()
        .and_then(|entry| entry.split_whitespace().next())
}

/// Preferred source attribute: `data-src`, then `srcset`, then `src`
fn candidate<'a>(img: &ElementRef<'a>) -> Option<&'a str> {
    non_empty_attr(img, "data-src")
        .or_else(|| non_empty_attr(img, "srcset").and_then(first_srcset_url))
        .or_else(|| non_empty_attr(img, "src"))
}

/// Applies the placeholder rule to an image's preferred source
fn resolve(img: &ElementRef<'_>, rules: &ImageRules) -> Option<String> {
    let chosen = candidate(img)?;
    if !rules.placeholder.is_match(chosen) {
        return Some(chosen.to_string());
    }

    non_empty_attr(img, "data-src")
        .filter(|data_src| !rules.placeholder.is_match(data_src))
        .map(str::to_string)
}

fn has_marker(img: &ElementRef<'_>, marker: &str) -> bool {
    img.value().classes().any(|class| class == marker)
}

/// Picks the seller's image URL from a profile page
///
/// The `<img>` carrying the marker class wins. Failing that, the first image
/// that either carries the marker or points at a real asset path is used.
/// Placeholders are never returned.
pub fn extract_seller_image(html: &str, rules: &ImageRules) -> Option<String> {
    let Ok(selector) = Selector::parse("img") else {
        return None;
    };
    let document = Html::parse_document(html);

    let primary = document
        .select(&selector)
        .find(|img| has_marker(img, &rules.marker))
        .and_then(|img| resolve(&img, rules));
    if primary.is_some() {
        return primary;
    }

    document.select(&selector).find_map(|img| {
        let source = candidate(&img)?;
        if rules.real_asset.is_match(source) || has_marker(&img, &rules.marker) {
            resolve(&img, rules)
        } else {
            None
        }
    })
}
