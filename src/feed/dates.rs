use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::storage::NewsItem;

/// Publication-date classification failures.
///
/// Fatal for the whole reconciliation step: partition keys are derived from
/// dates, so a single unclassifiable item prevents caching the batch.
#[derive(Debug, Error)]
pub enum DateError {
    #[error("unrecognized publication date format: '{0}'")]
    Unrecognized(String),

    #[error("'{0}' invalid date input. 'YYYYMMDD' is required")]
    InvalidDateKey(String),
}

const RFC822_NUMERIC_OFFSET: &str = "%a, %d %b %Y %H:%M:%S %z";
const RFC822_NO_ZONE: &str = "%a, %d %b %Y %H:%M:%S";
const ISO8601_UTC: &str = "%Y-%m-%dT%H:%M:%SZ";
const DATE_KEY: &str = "%Y%m%d";

/// Classifies a raw publication-date string into a `YYYYMMDD` cache key.
///
/// Exactly three patterns are tried, in order, and the first that parses
/// wins:
///
/// 1. RFC-822 with a numeric UTC offset (`Sat, 30 Oct 2021 09:05:17 +0300`)
/// 2. RFC-822 with a named zone abbreviation (`Sat, 30 Oct 2021 06:12:19 GMT`)
/// 3. ISO-8601 UTC (`2021-10-27T15:36:51Z`)
///
/// The key is the calendar date of the parsed wall-clock components; no
/// normalization to a fixed zone happens, so a `+0300` timestamp files under
/// the day its own clock shows. Feeds using any other convention fail fast
/// instead of sorting into the wrong day.
pub fn classify(raw: &str) -> Result<String, DateError> {
    if let Ok(parsed) = DateTime::parse_from_str(raw, RFC822_NUMERIC_OFFSET) {
        return Ok(parsed.naive_local().date().format(DATE_KEY).to_string());
    }

    // chrono has no parser for named zones. The abbreviation is split off and
    // checked for shape only; it cannot shift the wall-clock date.
    if let Some((head, zone)) = raw.rsplit_once(' ') {
        let looks_like_zone =
            (1..=5).contains(&zone.len()) && zone.chars().all(|c| c.is_ascii_alphabetic());
        if looks_like_zone {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(head, RFC822_NO_ZONE) {
                return Ok(parsed.date().format(DATE_KEY).to_string());
            }
        }
    }

    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, ISO8601_UTC) {
        return Ok(parsed.date().format(DATE_KEY).to_string());
    }

    Err(DateError::Unrecognized(raw.to_string()))
}

/// Validates a user-supplied `--date` argument as a strict `YYYYMMDD` key.
pub fn validate_date_key(date: &str) -> Result<(), DateError> {
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateError::InvalidDateKey(date.to_string()));
    }
    NaiveDate::parse_from_str(date, DATE_KEY)
        .map(|_| ())
        .map_err(|_| DateError::InvalidDateKey(date.to_string()))
}

/// Groups a parsed batch by canonical date.
///
/// Within-date order is the batch's arrival order; dates keep first-seen
/// order. An item with no publication date classifies like an unparsable one.
pub fn partition_by_date(items: Vec<NewsItem>) -> Result<Vec<(String, Vec<NewsItem>)>, DateError> {
    let mut partitions: Vec<(String, Vec<NewsItem>)> = Vec::new();
    for item in items {
        let raw = item.date.as_deref().unwrap_or("<missing>");
        let key = classify(raw)?;
        match partitions.iter_mut().find(|(date, _)| *date == key) {
            Some((_, bucket)) => bucket.push(item),
            None => partitions.push((key, vec![item])),
        }
    }
    Ok(partitions)
}
