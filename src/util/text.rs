use quick_xml::events::Event;
use quick_xml::Reader;

/// Reduces an HTML fragment to plain text.
///
/// Feed descriptions routinely carry markup (`<p>`, `<a>`, `<img>`, entity
/// escapes). Rendering and caching both want readable text: tags are
/// dropped, each run of text between tags becomes one line, fragments are
/// trimmed, and the result joins with `\n`. Entities decode through
/// quick-xml's escape layer, which only knows the five XML builtins — an
/// unknown entity leaves the fragment as written rather than failing the
/// item.
///
/// Parsing is deliberately lax (`check_end_names` off): feed HTML is rarely
/// well-formed and a stray unclosed tag must not cost us the description.
pub fn strip_html(fragment: &str) -> String {
    let mut reader = Reader::from_str(fragment);
    let config = reader.config_mut();
    config.check_end_names = false;

    let mut lines: Vec<String> = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                let text = match t.unescape() {
                    Ok(unescaped) => unescaped.into_owned(),
                    Err(_) => String::from_utf8_lossy(t.as_ref()).into_owned(),
                };
                push_trimmed(&mut lines, &text);
            }
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(t.as_ref()).into_owned();
                push_trimmed(&mut lines, &text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            // Keep whatever parsed so far; broken markup truncates, it does
            // not fail.
            Err(e) => {
                tracing::debug!(error = %e, "Stopping description scan on malformed markup");
                break;
            }
        }
    }

    lines.join("\n")
}

fn push_trimmed(lines: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        lines.push(trimmed.to_string());
    }
}
