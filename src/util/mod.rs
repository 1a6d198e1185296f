//! Shared helpers: description HTML stripping and source URL validation.

mod source_url;
mod text;

pub use source_url::{parse_source_url, source_host, SourceUrlError};
pub use text::strip_html;
