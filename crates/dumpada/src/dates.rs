//! Sample date parsing.
//!
//! Accepts `DD-MM-YYYY` (the wire format) or an unambiguous ISO form
//! (`YYYY-MM-DD`, RFC 3339, `YYYY-MM-DD HH:MM:SS`). A missing or blank
//! input means "today" at processing time.

use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::codes::CODE_DATE_FORMAT;
use crate::error::ServiceError;

static RE_DAY_MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-\d{2}-\d{4}$").unwrap());

/// Parses a sample date in any accepted form.
pub fn parse_sample_date(input: &str) -> Result<NaiveDate, ServiceError> {
    let input = input.trim();
    let invalid = || {
        ServiceError::validation(
            "date",
            format!("'{}' is not a DD-MM-YYYY or ISO date", input),
        )
    };

    if RE_DAY_MONTH_YEAR.is_match(input) {
        return NaiveDate::parse_from_str(input, CODE_DATE_FORMAT).map_err(|_| invalid());
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(input) {
        return Ok(datetime.date_naive());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(datetime.date());
        }
    }

    Err(invalid())
}

/// Normalizes an optional sample date, defaulting to today.
pub fn normalize_sample_date(input: Option<&str>) -> Result<NaiveDate, ServiceError> {
    match input.map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_sample_date(raw),
        _ => Ok(Local::now().date_naive()),
    }
}
