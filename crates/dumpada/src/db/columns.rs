//! Conversions between typed values and their stored TEXT columns.
//!
//! Timestamps are RFC 3339 in UTC with microseconds, so lexical order is
//! chronological order. Decimals are stored in their canonical string form.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rust_decimal::Decimal;

use super::DatabaseError;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// The current time, truncated to the stored precision so returned values
/// compare equal to what a later read produces.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(
    table: &'static str,
    column: &'static str,
    raw: String,
) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DatabaseError::corrupt(table, column, raw))
}

pub(crate) fn parse_opt_timestamp(
    table: &'static str,
    column: &'static str,
    raw: Option<String>,
) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    raw.map(|r| parse_timestamp(table, column, r)).transpose()
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(
    table: &'static str,
    column: &'static str,
    raw: String,
) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|_| DatabaseError::corrupt(table, column, raw))
}

pub(crate) fn format_decimal(value: Option<Decimal>) -> Option<String> {
    value.map(|d| d.normalize().to_string())
}

pub(crate) fn parse_decimal(
    table: &'static str,
    column: &'static str,
    raw: Option<String>,
) -> Result<Option<Decimal>, DatabaseError> {
    raw.map(|r| Decimal::from_str(&r).map_err(|_| DatabaseError::corrupt(table, column, r)))
        .transpose()
}

/// Parses a stored enum value through its `FromStr` impl.
pub(crate) fn parse_enum<T: FromStr>(
    table: &'static str,
    column: &'static str,
    raw: String,
) -> Result<T, DatabaseError> {
    raw.parse::<T>()
        .map_err(|_| DatabaseError::corrupt(table, column, raw))
}
