//! Cell readers over Polars `AnyValue`.
//!
//! Survey columns arrive with whatever dtype the loader inferred, so the
//! comparators and the tabulation code read cells through these helpers
//! instead of matching on `AnyValue` themselves.

use polars::prelude::*;

/// Text form of a cell as it appears in category keys.
///
/// Null reads as an empty string and integral floats lose their fraction,
/// so a numeric code stored as `1.0` keys the same category as `1`.
///
/// ```
/// use polars::prelude::AnyValue;
/// use xtab_common::any_to_string;
///
/// assert_eq!(any_to_string(AnyValue::Null), "");
/// assert_eq!(any_to_string(AnyValue::Float64(2.0)), "2");
/// assert_eq!(any_to_string(AnyValue::String("Yes")), "Yes");
/// ```
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_owned(),
        AnyValue::StringOwned(s) => s.to_string(),
        // Integers and booleans display without decoration.
        other => other.to_string(),
    }
}

/// Shortest decimal form of `v`: `1.0` is `"1"`, `-0.0` is `"0"`.
pub fn format_numeric(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let text = v.to_string();
    match text.split_once('.') {
        Some(_) => text.trim_end_matches('0').trim_end_matches('.').to_string(),
        None => text,
    }
}

/// Numeric value of a cell. Booleans count as 0/1 and numeric text is
/// parsed; anything else is `None`.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Boolean(b) => Some(f64::from(u8::from(b))),
        AnyValue::String(s) => parse_f64(s),
        AnyValue::StringOwned(s) => parse_f64(&s),
        other if other.dtype().is_numeric() => other.extract::<f64>(),
        _ => None,
    }
}

/// Parses trimmed text as `f64`; blank text is `None`.
pub fn parse_f64(value: &str) -> Option<f64> {
    match value.trim() {
        "" => None,
        trimmed => trimmed.parse().ok(),
    }
}

/// Null and float NaN both mark a missing answer.
pub fn is_missing(value: &AnyValue<'_>) -> bool {
    match value {
        AnyValue::Null => true,
        AnyValue::Float32(v) => v.is_nan(),
        AnyValue::Float64(v) => v.is_nan(),
        _ => false,
    }
}

pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    dtype.is_numeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_read_as_integers() {
        assert_eq!(any_to_string(AnyValue::Int64(-100)), "-100");
        assert_eq!(any_to_string(AnyValue::UInt8(7)), "7");
        assert_eq!(any_to_string(AnyValue::Float64(3.0)), "3");
        assert_eq!(any_to_string(AnyValue::Float64(1.5)), "1.5");
        assert_eq!(any_to_string(AnyValue::Boolean(true)), "true");
    }

    #[test]
    fn numeric_text_has_no_trailing_zeros() {
        assert_eq!(format_numeric(10.0), "10");
        assert_eq!(format_numeric(100.0), "100");
        assert_eq!(format_numeric(0.250), "0.25");
        assert_eq!(format_numeric(-0.0), "0");
    }

    #[test]
    fn cells_to_numbers() {
        assert_eq!(any_to_f64(AnyValue::Null), None);
        assert_eq!(any_to_f64(AnyValue::Int32(42)), Some(42.0));
        assert_eq!(any_to_f64(AnyValue::Float32(0.5)), Some(0.5));
        assert_eq!(any_to_f64(AnyValue::String(" 2.5 ")), Some(2.5));
        assert_eq!(any_to_f64(AnyValue::String("n/a")), None);
        assert_eq!(any_to_f64(AnyValue::Boolean(true)), Some(1.0));
    }

    #[test]
    fn missing_answers() {
        assert!(is_missing(&AnyValue::Null));
        assert!(is_missing(&AnyValue::Float64(f64::NAN)));
        assert!(!is_missing(&AnyValue::Float64(0.0)));
        assert!(!is_missing(&AnyValue::String("")));
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(!is_numeric_dtype(&DataType::String));
    }
}
