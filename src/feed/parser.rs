use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::storage::NewsItem;
use crate::util::strip_html;

/// Errors that end the whole parse. Per-item trouble never lands here — a
/// broken item is skipped and counted instead.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document has no RSS root marker (an HTML page, an Atom feed, …).
    #[error("source does not contain an RSS web feed")]
    NotAFeed,

    /// The content is not parseable XML at all.
    #[error("XML parse error: {0}")]
    Xml(String),
}

/// Result of parsing one feed document.
#[derive(Debug)]
pub struct ParsedFeed {
    /// Title of the top-level feed element. Empty when the channel carries
    /// none; callers substitute the host name for display.
    pub title: String,
    /// Valid items in document order.
    pub items: Vec<NewsItem>,
    /// Items dropped for missing a mandatory field (title or link).
    pub skipped: usize,
}

/// Enclosure tag names, in fixed priority order. The first name with a match
/// anywhere in the item wins, regardless of document order.
const ENCLOSURE_TAGS: [&[u8]; 3] = [b"enclosure", b"media:content", b"media:thumbnail"];

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Date,
    Title,
    Source,
    Category,
    Link,
    Description,
}

impl Field {
    fn for_tag(name: &[u8]) -> Option<Field> {
        match name {
            b"pubDate" => Some(Field::Date),
            b"title" => Some(Field::Title),
            b"source" => Some(Field::Source),
            b"category" => Some(Field::Category),
            b"link" => Some(Field::Link),
            b"description" => Some(Field::Description),
            _ => None,
        }
    }
}

/// Accumulates one `<item>`'s fields as events stream past, then converts to
/// a [`NewsItem`] — the parse-side constructor of the canonical record (the
/// cache-side one is serde).
#[derive(Default)]
struct ItemDraft {
    date: String,
    title: String,
    source: String,
    category: String,
    link: String,
    description: String,
    // Indexed like ENCLOSURE_TAGS; first occurrence per tag name.
    enclosures: [Option<String>; 3],
    // Every url attribute inside the item, document order, duplicates kept.
    url_refs: Vec<String>,
}

impl ItemDraft {
    fn append(&mut self, field: Field, fragment: &str) {
        let buf = match field {
            Field::Date => &mut self.date,
            Field::Title => &mut self.title,
            Field::Source => &mut self.source,
            Field::Category => &mut self.category,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
        };
        if field == Field::Description && !buf.is_empty() {
            buf.push('\n');
        }
        buf.push_str(fragment);
    }

    /// `title` and `link` are mandatory; everything else is independently
    /// optional. Returns `None` (caller warns and counts) when a mandatory
    /// field is absent.
    fn build(self) -> Option<NewsItem> {
        let title = non_empty(self.title)?;
        let link = non_empty(self.link)?;

        let enclosure = self.enclosures.into_iter().flatten().next();
        let description = non_empty(strip_html(&self.description));

        let mut links = Vec::with_capacity(1 + self.url_refs.len());
        links.push(link.clone());
        links.extend(self.url_refs);

        Some(NewsItem {
            date: non_empty(self.date),
            title,
            source: non_empty(self.source),
            category: non_empty(self.category),
            link,
            enclosure,
            description,
            links,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses raw feed content into normalized items plus the feed title.
///
/// The root element must be `<rss>`; anything else fails the invocation with
/// [`ParseError::NotAFeed`]. Items missing `title` or `link` are skipped with
/// a warning and counted in [`ParsedFeed::skipped`] — the batch survives.
pub fn parse_feed(content: &str) -> Result<ParsedFeed, ParseError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    expect_rss_root(&mut reader)?;

    let mut title = String::new();
    let mut items = Vec::new();
    let mut skipped = 0usize;

    let mut draft: Option<ItemDraft> = None;
    let mut field: Option<Field> = None;
    let mut in_channel_title = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                if let Some(item) = draft.as_mut() {
                    collect_item_attributes(&reader, &e, item);
                    if field.is_none() {
                        field = Field::for_tag(&name);
                    }
                } else if name == b"item" {
                    draft = Some(ItemDraft::default());
                } else if name == b"title" && title.is_empty() {
                    in_channel_title = true;
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(item) = draft.as_mut() {
                    collect_item_attributes(&reader, &e, item);
                }
            }
            Ok(Event::Text(e)) => {
                let fragment = match e.unescape() {
                    Ok(text) => text.into_owned(),
                    Err(_) => String::from_utf8_lossy(e.as_ref()).into_owned(),
                };
                append_text(&mut draft, field, in_channel_title, &mut title, &fragment);
            }
            Ok(Event::CData(e)) => {
                let fragment = String::from_utf8_lossy(e.as_ref()).into_owned();
                append_text(&mut draft, field, in_channel_title, &mut title, &fragment);
            }
            Ok(Event::End(e)) => {
                let name = e.name().as_ref().to_vec();
                if name == b"item" {
                    if let Some(item) = draft.take() {
                        match item.build() {
                            Some(news) => items.push(news),
                            None => {
                                skipped += 1;
                                tracing::warn!(
                                    item = items.len() + skipped,
                                    "Skipping item without title or link"
                                );
                            }
                        }
                    }
                    field = None;
                } else if field.is_some() && Field::for_tag(&name) == field {
                    field = None;
                } else if in_channel_title && name == b"title" {
                    in_channel_title = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            Ok(_) => {}
        }
    }

    Ok(ParsedFeed { title, items, skipped })
}

/// Skips the prolog and checks the document root: no `<rss>` marker means
/// the content is not a web feed.
fn expect_rss_root(reader: &mut Reader<&[u8]>) -> Result<(), ParseError> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.name().as_ref() == b"rss" {
                    return Ok(());
                }
                return Err(ParseError::NotAFeed);
            }
            Ok(Event::Empty(_)) | Ok(Event::Eof) => return Err(ParseError::NotAFeed),
            Ok(_) => {}
            Err(e) => return Err(ParseError::Xml(e.to_string())),
        }
    }
}

/// Harvests url-bearing attributes from a tag inside an item: the links list
/// records every `url` attribute in document order, and the enclosure slots
/// record the first occurrence per recognized tag name.
fn collect_item_attributes(reader: &Reader<&[u8]>, e: &BytesStart<'_>, item: &mut ItemDraft) {
    let name = e.name();
    let slot = ENCLOSURE_TAGS.iter().position(|t| *t == name.as_ref());

    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed item attribute");
                continue;
            }
        };
        if attr.key.as_ref() != b"url" {
            continue;
        }
        let value = match attr.decode_and_unescape_value(reader.decoder()) {
            Ok(value) => value.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping undecodable url attribute");
                continue;
            }
        };
        if let Some(index) = slot {
            if item.enclosures[index].is_none() {
                item.enclosures[index] = Some(value.clone());
            }
        }
        item.url_refs.push(value);
    }
}

fn append_text(
    draft: &mut Option<ItemDraft>,
    field: Option<Field>,
    in_channel_title: bool,
    title: &mut String,
    fragment: &str,
) {
    match (draft.as_mut(), field) {
        (Some(item), Some(field)) => item.append(field, fragment),
        (None, _) if in_channel_title => title.push_str(fragment),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Example News</title>
    <link>https://news.example.com</link>
    <item>
      <title>First story</title>
      <link>https://news.example.com/1</link>
      <pubDate>Sat, 30 Oct 2021 09:05:17 +0300</pubDate>
      <source url="https://news.example.com/rss">Example Wire</source>
      <category>World</category>
      <media:content url="https://img.example.com/1.jpg" />
      <description>&lt;p&gt;Lead paragraph&lt;/p&gt;&lt;p&gt;Second &amp;amp; last&lt;/p&gt;</description>
    </item>
    <item>
      <title><![CDATA[Second story]]></title>
      <link>https://news.example.com/2</link>
      <pubDate>Sat, 30 Oct 2021 06:12:19 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_feed_title_and_item_count() {
        let feed = parse_feed(FEED).unwrap();
        assert_eq!(feed.title, "Example News");
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.skipped, 0);
    }

    #[test]
    fn test_full_item_extraction() {
        let feed = parse_feed(FEED).unwrap();
        let item = &feed.items[0];
        assert_eq!(item.title, "First story");
        assert_eq!(item.link, "https://news.example.com/1");
        assert_eq!(item.date.as_deref(), Some("Sat, 30 Oct 2021 09:05:17 +0300"));
        assert_eq!(item.source.as_deref(), Some("Example Wire"));
        assert_eq!(item.category.as_deref(), Some("World"));
        assert_eq!(item.enclosure.as_deref(), Some("https://img.example.com/1.jpg"));
        assert_eq!(
            item.description.as_deref(),
            Some("Lead paragraph\nSecond & last")
        );
    }

    #[test]
    fn test_links_start_with_primary_and_keep_document_order() {
        let feed = parse_feed(FEED).unwrap();
        let item = &feed.items[0];
        assert_eq!(
            item.links,
            vec![
                "https://news.example.com/1".to_string(),
                "https://news.example.com/rss".to_string(),
                "https://img.example.com/1.jpg".to_string(),
            ]
        );
        assert_eq!(item.links[0], item.link);
    }

    #[test]
    fn test_cdata_title_and_sparse_item() {
        let feed = parse_feed(FEED).unwrap();
        let item = &feed.items[1];
        assert_eq!(item.title, "Second story");
        assert_eq!(item.source, None);
        assert_eq!(item.enclosure, None);
        assert_eq!(item.description, None);
        assert_eq!(item.links, vec!["https://news.example.com/2".to_string()]);
    }

    #[test]
    fn test_enclosure_priority_is_by_tag_name_not_document_order() {
        let feed = parse_feed(
            r#"<rss version="2.0"><channel><title>T</title>
            <item>
              <title>A</title><link>https://e.com/a</link>
              <media:thumbnail url="https://e.com/thumb.jpg"/>
              <media:content url="https://e.com/content.jpg"/>
              <enclosure url="https://e.com/enclosure.mp3" type="audio/mpeg"/>
            </item></channel></rss>"#,
        )
        .unwrap();
        assert_eq!(feed.items[0].enclosure.as_deref(), Some("https://e.com/enclosure.mp3"));
    }

    #[test]
    fn test_media_thumbnail_used_when_alone() {
        let feed = parse_feed(
            r#"<rss version="2.0"><channel><title>T</title>
            <item>
              <title>A</title><link>https://e.com/a</link>
              <media:thumbnail url="https://e.com/thumb.jpg"/>
            </item></channel></rss>"#,
        )
        .unwrap();
        assert_eq!(feed.items[0].enclosure.as_deref(), Some("https://e.com/thumb.jpg"));
    }

    #[test]
    fn test_item_without_title_is_skipped_others_survive_in_order() {
        let feed = parse_feed(
            r#"<rss version="2.0"><channel><title>T</title>
            <item><title>One</title><link>https://e.com/1</link></item>
            <item><link>https://e.com/untitled</link></item>
            <item><title>Three</title><link>https://e.com/3</link></item>
            </channel></rss>"#,
        )
        .unwrap();
        assert_eq!(feed.skipped, 1);
        let titles: Vec<&str> = feed.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Three"]);
    }

    #[test]
    fn test_item_without_link_is_skipped() {
        let feed = parse_feed(
            r#"<rss version="2.0"><channel><title>T</title>
            <item><title>No link here</title></item>
            </channel></rss>"#,
        )
        .unwrap();
        assert_eq!(feed.skipped, 1);
        assert!(feed.items.is_empty());
    }

    #[test]
    fn test_html_document_is_not_a_feed() {
        let result = parse_feed("<html lang=\"en\"><body>nope</body></html>");
        assert!(matches!(result, Err(ParseError::NotAFeed)));
    }

    #[test]
    fn test_garbage_is_an_xml_error() {
        let result = parse_feed("<not valid xml");
        assert!(matches!(result, Err(ParseError::Xml(_))));
    }

    #[test]
    fn test_empty_channel_parses_to_no_items() {
        let feed = parse_feed(r#"<rss version="2.0"><channel><title>Empty</title></channel></rss>"#)
            .unwrap();
        assert!(feed.items.is_empty());
        assert_eq!(feed.title, "Empty");
    }

    #[test]
    fn test_item_title_does_not_become_feed_title() {
        let feed = parse_feed(
            r#"<rss version="2.0"><channel>
            <item><title>Only item</title><link>https://e.com/1</link></item>
            </channel></rss>"#,
        )
        .unwrap();
        assert_eq!(feed.title, "");
        assert_eq!(feed.items[0].title, "Only item");
    }

    #[test]
    fn test_cdata_description_is_stripped() {
        let feed = parse_feed(
            r#"<rss version="2.0"><channel><title>T</title>
            <item><title>A</title><link>https://e.com/a</link>
            <description><![CDATA[<p>Raw <b>HTML</b> body</p>]]></description>
            </item></channel></rss>"#,
        )
        .unwrap();
        assert_eq!(feed.items[0].description.as_deref(), Some("Raw\nHTML\nbody"));
    }
}
