//! Key predicates applied during prefix search.

use serde::{Deserialize, Serialize};

/// Marker every submission key carries.
pub const SUBMISSION_MARKER: &str = "submission.json";

/// Predicate deciding which listed keys a search keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "marker", rename_all = "snake_case")]
pub enum KeyFilter {
    /// Keep every key.
    Any,
    /// Keep keys containing the marker anywhere.
    Contains(String),
    /// Keep keys ending with the marker.
    Suffix(String),
}

impl KeyFilter {
    /// Keeps keys containing `marker`.
    pub fn contains(marker: impl Into<String>) -> Self {
        Self::Contains(marker.into())
    }

    /// Keeps keys ending with `marker`.
    pub fn suffix(marker: impl Into<String>) -> Self {
        Self::Suffix(marker.into())
    }

    /// Returns `true` if `key` passes the filter.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Contains(marker) => key.contains(marker.as_str()),
            Self::Suffix(marker) => key.ends_with(marker.as_str()),
        }
    }
}

impl Default for KeyFilter {
    fn default() -> Self {
        Self::contains(SUBMISSION_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_submissions() {
        let filter = KeyFilter::default();
        assert!(filter.matches("case-1/submission.json"));
        assert!(filter.matches("case-1/submission.json.bak"));
        assert!(!filter.matches("case-1/attachment.pdf"));
    }

    #[test]
    fn suffix_is_strict() {
        let filter = KeyFilter::suffix(".json");
        assert!(filter.matches("a/b.json"));
        assert!(!filter.matches("a/b.json.bak"));
    }

    #[test]
    fn any_matches_everything() {
        assert!(KeyFilter::Any.matches(""));
    }
}
