/// Article lifecycle states
///
/// An article starts as a stub and ends in exactly one terminal state.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an article is in its extraction lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    /// Discovered in a sitemap; only the URL is known
    Stub,

    /// Extraction succeeded; content fields are filled on a best-effort basis
    Complete,

    /// Extraction failed; the record carries an error annotation instead of content
    Failed,
}

impl ArticleStatus {
    /// Returns true for `Complete` and `Failed`
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Stub)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Stub => "stub",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "stub" => Some(Self::Stub),
            "complete" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_string_round_trip() {
        for status in [
            ArticleStatus::Stub,
            ArticleStatus::Complete,
            ArticleStatus::Failed,
        ] {
            assert_eq!(
                ArticleStatus::from_db_string(status.to_db_string()),
                Some(status)
            );
        }
        assert_eq!(ArticleStatus::from_db_string("processed"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ArticleStatus::Stub.is_terminal());
        assert!(ArticleStatus::Complete.is_terminal());
        assert!(ArticleStatus::Failed.is_terminal());
    }

    #[test]
    fn test_serde_uses_lowercase() {
        assert_eq!(
            serde_json::to_string(&ArticleStatus::Complete).unwrap(),
            "\"complete\""
        );
        assert_eq!(ArticleStatus::Failed.to_string(), "failed");
    }
}
