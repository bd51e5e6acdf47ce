//! Composite code assembly for samples and work fronts.
//!
//! Sample ("acopio") codes read `{front}-{shift}-{seq:03}-{DD-MM-YYYY}`,
//! e.g. `FR1-AM-007-05-03-2024`. Work front codes concatenate their segments
//! with no delimiter, e.g. `M5` + `-1SH` + `1A` + `L7` → `M5-1SH1AL7`.

use chrono::{Local, NaiveDate};

use crate::sample::Shift;

/// Date format used inside sample codes and accepted on the wire.
pub const CODE_DATE_FORMAT: &str = "%d-%m-%Y";

/// Renders a date as `DD-MM-YYYY`.
pub fn format_code_date(date: NaiveDate) -> String {
    date.format(CODE_DATE_FORMAT).to_string()
}

/// Builds a sample's composite code. A missing date means today.
pub fn build_sample_code(
    work_front_code: &str,
    shift: Shift,
    sequence_number: i64,
    date: Option<NaiveDate>,
) -> String {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    format!(
        "{}-{}-{:03}-{}",
        work_front_code,
        shift.as_str(),
        sequence_number,
        format_code_date(date)
    )
}

/// Builds a work front's composite code.
///
/// Empty optional segments are skipped. The type abbreviation is trimmed and,
/// when non-empty, the front number is appended to it directly (`L` + `7`).
/// A front number without an abbreviation is dropped. An empty seam yields a
/// code without its leading segment; callers reject empty seams beforehand.
pub fn build_front_code(
    seam: &str,
    street: Option<&str>,
    strand: Option<&str>,
    front_number: Option<&str>,
    type_abbreviation: Option<&str>,
) -> String {
    let mut code = String::from(seam.trim());

    for segment in [street, strand].into_iter().flatten() {
        code.push_str(segment.trim());
    }

    let abbreviation = type_abbreviation.map(str::trim).unwrap_or_default();
    if !abbreviation.is_empty() {
        code.push_str(abbreviation);
        if let Some(number) = front_number.map(str::trim) {
            code.push_str(number);
        }
    }

    code
}
