use crate::url::normalize_url;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use url::Url;

/// A concurrent "seen" set keyed by normalized URL
///
/// Safe to share between tasks. When two writers race on the same key the
/// first insert wins and only that caller sees `true`.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: Mutex<HashSet<String>>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `url`; returns true if it had not been seen before
    pub fn insert(&self, url: &Url) -> bool {
        let key = normalize_url(url);
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key)
    }

    pub fn contains(&self, url: &Url) -> bool {
        let key = normalize_url(url);
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
    }

    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
