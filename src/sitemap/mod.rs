//! Sitemap protocol support
//!
//! This module decodes and encodes documents in the sitemap protocol 0.9
//! namespace:
//! - `<sitemapindex>` documents, which list other sitemaps
//! - `<urlset>` documents, which list the pages themselves

mod decoder;
mod encoder;

pub use decoder::{decode, DecodeError};
pub use encoder::encode;

use url::Url;

/// The sitemap protocol namespace every recognized root element must carry
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// One decoded sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapNode {
    /// A sitemap index: each URL is itself a sitemap
    Index(Vec<Url>),

    /// A leaf sitemap: each URL is a page
    Leaf(Vec<Url>),
}

impl SitemapNode {
    /// Returns the URLs listed by this node in document order
    pub fn urls(&self) -> &[Url] {
        match self {
            Self::Index(urls) | Self::Leaf(urls) => urls,
        }
    }

    /// Returns true if this node lists other sitemaps
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }

    /// Returns true if the node lists nothing
    pub fn is_empty(&self) -> bool {
        self.urls().is_empty()
    }
}

/// The result of decoding one sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSitemap {
    /// The decoded node
    pub node: SitemapNode,

    /// `<loc>` values that were dropped because they are not absolute URLs
    pub dropped: Vec<String>,
}
