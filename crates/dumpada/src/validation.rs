//! Field checks shared by the managers. All run before any write.

use rust_decimal::Decimal;

use crate::error::ServiceError;

/// Largest number of fractional digits a grade or tonnage may carry.
pub const MAX_DECIMAL_SCALE: u32 = 6;
/// Largest number of integer digits a grade or tonnage may carry.
pub const MAX_INTEGER_DIGITS: u32 = 6;

/// Trims `value` and rejects it when blank or longer than `max_len` chars.
pub(crate) fn required_text(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::validation(field, "is required"));
    }
    max_length(field, Some(value), max_len)?;
    Ok(value.to_string())
}

pub(crate) fn max_length(
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> Result<(), ServiceError> {
    match value {
        Some(v) if v.chars().count() > max_len => Err(ServiceError::validation(
            field,
            format!("must be at most {} characters", max_len),
        )),
        _ => Ok(()),
    }
}

/// Rejects negative values and values outside the stored precision.
///
/// Values are never rounded: `0.0000005` is an error, not `0.000001`.
pub(crate) fn non_negative_decimal(
    field: &'static str,
    value: Option<Decimal>,
) -> Result<(), ServiceError> {
    let Some(value) = value else {
        return Ok(());
    };
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ServiceError::validation(field, "must not be negative"));
    }
    let value = value.normalize();
    if value.scale() > MAX_DECIMAL_SCALE {
        return Err(ServiceError::validation(
            field,
            format!("has more than {} decimal places", MAX_DECIMAL_SCALE),
        ));
    }
    if value.trunc().abs() >= Decimal::from(10_i64.pow(MAX_INTEGER_DIGITS)) {
        return Err(ServiceError::validation(
            field,
            format!("has more than {} integer digits", MAX_INTEGER_DIGITS),
        ));
    }
    Ok(())
}
