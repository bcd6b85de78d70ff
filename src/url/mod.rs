//! URL handling for sitemap entries
//!
//! This module validates `<loc>` values as absolute HTTP(S) URLs and computes
//! the normalized keys used to deduplicate sitemaps and articles.

mod normalize;

pub use normalize::{normalize_str, normalize_url, parse_absolute_url};
