use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Cache-layer errors with user-facing messages.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The requested partition has never been written.
    #[error("no cached news for '{0}'")]
    NotFound(String),

    /// The partition file exists but does not deserialize. Never overwritten
    /// silently: blind overwrite would duplicate historical items on the next
    /// merge.
    #[error("cache partition '{path}' is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem error while reading or writing a partition.
    #[error("cache I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// Data Structures
// ============================================================================

/// One normalized feed entry.
///
/// The serialized field order is the persisted cache format; optional fields
/// round-trip as `null`, never as an empty string. There are two ways into
/// this type: the feed parser builds it from XML events, and the cache store
/// reconstitutes it with serde. Both must produce equal records for equal
/// input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Raw publication-date text, format unknown until classified.
    pub date: Option<String>,
    pub title: String,
    pub source: Option<String>,
    pub category: Option<String>,
    /// Primary URL. Always equals `links[0]`.
    pub link: String,
    /// First of `enclosure` / `media:content` / `media:thumbnail`, by tag
    /// name priority.
    pub enclosure: Option<String>,
    /// Description HTML reduced to plain text, block breaks as newlines.
    pub description: Option<String>,
    /// Primary link first, then every `url`-attributed reference found in the
    /// item, document order, duplicates allowed.
    pub links: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn full_item() -> NewsItem {
        NewsItem {
            date: Some("Sat, 30 Oct 2021 09:05:17 +0300".to_string()),
            title: "Something happened".to_string(),
            source: Some("Example Wire".to_string()),
            category: Some("World".to_string()),
            link: "https://news.example.com/1".to_string(),
            enclosure: Some("https://news.example.com/1.jpg".to_string()),
            description: Some("First line\nSecond line".to_string()),
            links: vec![
                "https://news.example.com/1".to_string(),
                "https://news.example.com/1.jpg".to_string(),
            ],
        }
    }

    #[test]
    fn test_serialized_field_order_matches_cache_format() {
        // Struct fields serialize in declaration order; the persisted format
        // depends on it.
        let json = serde_json::to_string(&full_item()).unwrap();
        let fields = ["\"date\"", "\"title\"", "\"source\"", "\"category\"", "\"link\"", "\"enclosure\"", "\"description\"", "\"links\""];
        let positions: Vec<usize> = fields.iter().map(|f| json.find(f).unwrap()).collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_absent_optionals_serialize_as_null() {
        let item = NewsItem {
            date: None,
            title: "Bare".to_string(),
            source: None,
            category: None,
            link: "https://news.example.com/bare".to_string(),
            enclosure: None,
            description: None,
            links: vec!["https://news.example.com/bare".to_string()],
        };
        let json = serde_json::to_value(&item).unwrap();
        assert!(json["source"].is_null());
        assert!(json["description"].is_null());

        let back: NewsItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
        assert_eq!(back.source, None); // not coerced to ""
    }
}
