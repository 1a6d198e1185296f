use crate::storage::NewsItem;

/// Formats one item in the stdout layout: mandatory lines always present,
/// optional lines only when the field is.
pub fn format_item(item: &NewsItem) -> String {
    let mut out = format!("Title: {}", item.title);
    if let Some(source) = &item.source {
        out.push_str(&format!("\nSource: {}", source));
    }
    if let Some(date) = &item.date {
        out.push_str(&format!("\nDate: {}", date));
    }
    out.push_str(&format!("\nLink: {}", item.link));
    if let Some(category) = &item.category {
        out.push_str(&format!("\nCategory: {}", category));
    }
    if let Some(description) = &item.description {
        out.push_str(&format!("\n\nDescription: {}", description));
    }
    out.push_str("\n\nLinks:");
    for (i, link) in item.links.iter().enumerate() {
        out.push_str(&format!("\n[{}]: {}", i + 1, link));
    }
    out
}

/// Formats the whole result: feed header, then each item separated by blank
/// lines.
pub fn format_feed(items: &[NewsItem], title: &str) -> String {
    let mut out = format!("\nFeed: {}\n", title);
    for item in items {
        out.push('\n');
        out.push_str(&format_item(item));
        out.push('\n');
    }
    out
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
            enclosure: Some("https://img.example.com/1.jpg".to_string()),
            description: Some("Lead\nTail".to_string()),
            links: vec![
                "https://news.example.com/1".to_string(),
                "https://img.example.com/1.jpg".to_string(),
            ],
        }
    }

    #[test]
    fn test_full_item_layout() {
        let expected = "\
Title: Something happened
Source: Example Wire
Date: Sat, 30 Oct 2021 09:05:17 +0300
Link: https://news.example.com/1
Category: World

Description: Lead
Tail

Links:
[1]: https://news.example.com/1
[2]: https://img.example.com/1.jpg";
        assert_eq!(format_item(&full_item()), expected);
    }

    #[test]
    fn test_sparse_item_omits_absent_lines() {
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
        let text = format_item(&item);
        assert_eq!(
            text,
            "Title: Bare\nLink: https://news.example.com/bare\n\nLinks:\n[1]: https://news.example.com/bare"
        );
    }

    #[test]
    fn test_feed_header_and_separation() {
        let text = format_feed(&[full_item()], "Example News");
        assert!(text.starts_with("\nFeed: Example News\n\nTitle: Something happened"));
        assert!(text.ends_with("[2]: https://img.example.com/1.jpg\n"));
    }
}
