//! Output rendering for the finalized `(items, title)` pair.
//!
//! Consumers of the pipeline result, not part of it: plain text for stdout,
//! pretty JSON, and a generated HTML document.

mod html;
mod json;
mod text;

pub use html::{render_html, write_html_file};
pub use json::format_json;
pub use text::{format_feed, format_item};
