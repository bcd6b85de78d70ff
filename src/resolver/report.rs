use crate::fetcher::FetchError;
use crate::sitemap::DecodeError;
use thiserror::Error;

/// Why a sitemap subtree was skipped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BranchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// One skipped sitemap subtree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("skipped sitemap {url} at depth {depth}: {reason}")]
pub struct PartialFailure {
    pub url: String,
    /// Depth of the skipped document; the root is depth 0
    pub depth: usize,
    pub reason: BranchError,
}

/// Summary of one sitemap walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub root: String,
    /// Sitemap documents fetched and decoded, root included
    pub sitemaps_visited: usize,
    pub articles_emitted: usize,
    pub duplicates_dropped: usize,
    /// `<loc>` values dropped because they were not absolute URLs
    pub malformed_entries: usize,
    pub skipped: Vec<PartialFailure>,
    /// Sitemaps that were queued or in flight when the walk was cancelled
    pub abandoned: Vec<String>,
    pub cancelled: bool,
}

impl ResolveReport {
    pub(crate) fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            ..Self::default()
        }
    }

    /// Returns true if every sitemap in the tree was visited
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.abandoned.is_empty() && !self.cancelled
    }
}
