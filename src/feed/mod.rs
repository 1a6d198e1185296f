//! Feed ingestion: HTTP retrieval, RSS parsing, and publication-date
//! classification.
//!
//! - [`fetcher`] - single-URL retrieval with classified failures
//! - [`parser`] - event-driven RSS parsing into normalized items
//! - [`dates`] - raw date strings to `YYYYMMDD` cache keys

mod dates;
mod fetcher;
mod parser;

pub use dates::{classify, partition_by_date, validate_date_key, DateError};
pub use fetcher::{fetch, FetchError};
pub use parser::{parse_feed, ParseError, ParsedFeed};
