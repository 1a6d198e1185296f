use anyhow::{Context, Result};

use crate::storage::NewsItem;

/// Serializes the result list as pretty-printed JSON — the same record shape
/// the cache stores, so cached and fresh output are indistinguishable.
pub fn format_json(items: &[NewsItem]) -> Result<String> {
    serde_json::to_string_pretty(items).context("Failed to serialize news items as JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_round_trips_record_shape() {
        let item = NewsItem {
            date: Some("2021-10-27T15:36:51Z".to_string()),
            title: "Round trip".to_string(),
            source: None,
            category: Some("Tech".to_string()),
            link: "https://news.example.com/rt".to_string(),
            enclosure: None,
            description: None,
            links: vec!["https://news.example.com/rt".to_string()],
        };

        let json = format_json(std::slice::from_ref(&item)).unwrap();
        let back: Vec<NewsItem> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![item]);
    }

    #[test]
    fn test_empty_list_is_empty_array() {
        assert_eq!(format_json(&[]).unwrap(), "[]");
    }
}
