//! HTML extraction for seller profile pages
//!
//! This module turns raw upstream HTML into seller fields:
//! - Balanced-depth region location (the only markup-structure dependency)
//! - Manifesto text and online/joined metadata
//! - Seller avatar selection with placeholder skipping

pub mod region;
mod image;
mod seller;

pub use image::{extract_seller_image, ImageRules};
pub use region::{extract_balanced_region, OpenTagPattern, Region};
pub use seller::{
    extract_manifesto, extract_seller_meta, ManifestoResult, OnlineStatus, SellerMeta,
    MANIFESTO_MAX_BYTES,
};
