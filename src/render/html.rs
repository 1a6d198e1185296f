use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::storage::NewsItem;

/// Generates a standalone HTML document for the result list.
///
/// One `<div>` per item with class-tagged paragraphs mirroring the text
/// layout, the enclosure as an image wrapped in the item link, and the links
/// list as numbered anchors. All text goes through the writer's escaping.
pub fn render_html(items: &[NewsItem], title: &str) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("Failed to write XML declaration")?;

    writer
        .write_event(Event::Start(BytesStart::new("html")))
        .context("Failed to write html element")?;

    // <head><meta charset="utf-8"/><title>…</title></head>
    writer
        .write_event(Event::Start(BytesStart::new("head")))
        .context("Failed to write head element")?;
    let mut meta = BytesStart::new("meta");
    meta.push_attribute(("charset", "utf-8"));
    writer
        .write_event(Event::Empty(meta))
        .context("Failed to write meta element")?;
    write_text_element(&mut writer, "title", &[], title)?;
    writer
        .write_event(Event::End(BytesEnd::new("head")))
        .context("Failed to write head end")?;

    writer
        .write_event(Event::Start(BytesStart::new("body")))
        .context("Failed to write body element")?;
    write_text_element(&mut writer, "h1", &[], title)?;

    for (i, item) in items.iter().enumerate() {
        write_item(&mut writer, i, item)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("body")))
        .context("Failed to write body end")?;
    writer
        .write_event(Event::End(BytesEnd::new("html")))
        .context("Failed to write html end")?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).context("Generated HTML is not valid UTF-8")
}

/// Renders and writes `<dir>/<stem>.html`, creating the directory when
/// needed. Returns the written path.
pub fn write_html_file(dir: &Path, stem: &str, items: &[NewsItem], title: &str) -> Result<PathBuf> {
    let html = render_html(items, title)?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory '{}'", dir.display()))?;
    let path = dir.join(format!("{}.html", stem));
    std::fs::write(&path, html)
        .with_context(|| format!("Failed to write HTML file '{}'", path.display()))?;
    tracing::info!(path = %path.display(), "HTML written");
    Ok(path)
}

fn write_item(writer: &mut Writer<Cursor<Vec<u8>>>, index: usize, item: &NewsItem) -> Result<()> {
    let mut div = BytesStart::new("div");
    div.push_attribute(("class", "news"));
    div.push_attribute(("id", format!("news{}", index).as_str()));
    writer
        .write_event(Event::Start(div))
        .context("Failed to write item div")?;

    write_labeled(writer, "title", "Title: ", &item.title)?;
    if let Some(source) = &item.source {
        write_labeled(writer, "source", "Source: ", source)?;
    }
    if let Some(date) = &item.date {
        write_labeled(writer, "date", "Date: ", date)?;
    }

    // Link: <a href>…</a>
    let mut p = BytesStart::new("p");
    p.push_attribute(("class", "link"));
    writer.write_event(Event::Start(p)).context("Failed to write link paragraph")?;
    writer
        .write_event(Event::Text(BytesText::new("Link: ")))
        .context("Failed to write link label")?;
    write_anchor(writer, &item.link, &item.link)?;
    writer
        .write_event(Event::End(BytesEnd::new("p")))
        .context("Failed to write link paragraph end")?;

    if let Some(category) = &item.category {
        write_labeled(writer, "category", "Category: ", category)?;
    }

    if let Some(enclosure) = &item.enclosure {
        // The image links back to the story, like the text layout's primary
        // link does.
        let mut a = BytesStart::new("a");
        a.push_attribute(("href", item.link.as_str()));
        a.push_attribute(("target", "_blank"));
        writer.write_event(Event::Start(a)).context("Failed to write enclosure anchor")?;
        let mut img = BytesStart::new("img");
        img.push_attribute(("class", "enclosure"));
        img.push_attribute(("src", enclosure.as_str()));
        img.push_attribute(("alt", enclosure.as_str()));
        writer.write_event(Event::Empty(img)).context("Failed to write enclosure image")?;
        writer
            .write_event(Event::End(BytesEnd::new("a")))
            .context("Failed to write enclosure anchor end")?;
    }

    if let Some(description) = &item.description {
        let mut p = BytesStart::new("p");
        p.push_attribute(("class", "description"));
        writer.write_event(Event::Start(p)).context("Failed to write description paragraph")?;
        writer
            .write_event(Event::Text(BytesText::new("Description: ")))
            .context("Failed to write description label")?;
        for (i, line) in description.lines().enumerate() {
            if i > 0 {
                writer
                    .write_event(Event::Empty(BytesStart::new("br")))
                    .context("Failed to write line break")?;
            }
            writer
                .write_event(Event::Text(BytesText::new(line)))
                .context("Failed to write description line")?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("p")))
            .context("Failed to write description paragraph end")?;
    }

    write_labeled(writer, "links", "Links:", "")?;
    for (j, link) in item.links.iter().enumerate() {
        let mut p = BytesStart::new("p");
        p.push_attribute(("class", "link list"));
        writer.write_event(Event::Start(p)).context("Failed to write links paragraph")?;
        writer
            .write_event(Event::Text(BytesText::new(&format!("[{}]: ", j + 1))))
            .context("Failed to write link index")?;
        write_anchor(writer, link, link)?;
        writer
            .write_event(Event::End(BytesEnd::new("p")))
            .context("Failed to write links paragraph end")?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("div")))
        .context("Failed to write item div end")?;
    Ok(())
}

fn write_labeled(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    class: &str,
    label: &str,
    value: &str,
) -> Result<()> {
    let mut p = BytesStart::new("p");
    p.push_attribute(("class", class));
    writer.write_event(Event::Start(p)).context("Failed to write paragraph")?;
    writer
        .write_event(Event::Text(BytesText::new(&format!("{}{}", label, value))))
        .context("Failed to write paragraph text")?;
    writer
        .write_event(Event::End(BytesEnd::new("p")))
        .context("Failed to write paragraph end")?;
    Ok(())
}

fn write_anchor(writer: &mut Writer<Cursor<Vec<u8>>>, href: &str, text: &str) -> Result<()> {
    let mut a = BytesStart::new("a");
    a.push_attribute(("href", href));
    a.push_attribute(("target", "_blank"));
    writer.write_event(Event::Start(a)).context("Failed to write anchor")?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .context("Failed to write anchor text")?;
    writer
        .write_event(Event::End(BytesEnd::new("a")))
        .context("Failed to write anchor end")?;
    Ok(())
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    tag: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    let mut start = BytesStart::new(tag);
    for (k, v) in attrs {
        start.push_attribute((*k, *v));
    }
    writer
        .write_event(Event::Start(start))
        .with_context(|| format!("Failed to write {} element", tag))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .with_context(|| format!("Failed to write {} text", tag))?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .with_context(|| format!("Failed to write {} end", tag))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> NewsItem {
        NewsItem {
            date: Some("Sat, 30 Oct 2021 09:05:17 +0300".to_string()),
            title: "Markets & <markup>".to_string(),
            source: Some("Example Wire".to_string()),
            category: None,
            link: "https://news.example.com/1".to_string(),
            enclosure: Some("https://img.example.com/1.jpg".to_string()),
            description: Some("Line one\nLine two".to_string()),
            links: vec![
                "https://news.example.com/1".to_string(),
                "https://img.example.com/1.jpg".to_string(),
            ],
        }
    }

    #[test]
    fn test_document_structure() {
        let html = render_html(&[item()], "Example News").unwrap();
        assert!(html.contains("<h1>Example News</h1>"));
        assert!(html.contains("<div class=\"news\" id=\"news0\">"));
        assert!(html.contains("Source: Example Wire"));
        assert!(html.contains("<img class=\"enclosure\" src=\"https://img.example.com/1.jpg\""));
        assert!(html.contains("[2]: "));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = render_html(&[item()], "Example News").unwrap();
        assert!(html.contains("Markets &amp; &lt;markup&gt;"));
        assert!(!html.contains("Markets & <markup>"));
    }

    #[test]
    fn test_description_newlines_become_breaks() {
        let html = render_html(&[item()], "T").unwrap();
        assert!(html.contains("Line one"));
        assert!(html.contains("<br/>"));
        assert!(html.contains("Line two"));
    }

    #[test]
    fn test_write_html_file_creates_directory() {
        let dir = std::env::temp_dir().join("newsline_html_test_out");
        let _ = std::fs::remove_dir_all(&dir);

        let path = write_html_file(&dir, "news.example.com_20211030", &[item()], "T").unwrap();
        assert!(path.is_file());
        assert!(path.ends_with("news.example.com_20211030.html"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
