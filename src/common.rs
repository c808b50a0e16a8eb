//! Small shared helpers for explicit string-to-typed field mapping.
//!
//! Form fields and CSV columns both arrive as strings; every numeric
//! coercion in the system goes through these functions so the fallback
//! behavior (zero on parse failure) is identical everywhere.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Trims and returns `None` for empty input, `Some(trimmed)` otherwise.
pub fn none_if_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses an integer, falling back to `default` on empty or malformed input.
pub fn parse_i32_or(value: &str, default: i32) -> i32 {
    value.trim().parse::<i32>().unwrap_or(default)
}

/// Parses a decimal, falling back to `default` on empty or malformed input.
/// Accepts a comma as decimal separator, as Italian spreadsheets emit it.
pub fn parse_decimal_or(value: &str, default: Decimal) -> Decimal {
    let normalized = value.trim().replace(',', ".");
    Decimal::from_str(&normalized).unwrap_or(default)
}

/// Parses a `YYYY-MM-DD` date, returning `None` for empty or malformed input.
pub fn parse_date_opt(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Collapses newlines to spaces and clips to `max` characters, for
/// single-line CSV cells and narrow PDF columns.
pub fn single_line(value: &str, max: usize) -> String {
    value
        .replace(['\n', '\r'], " ")
        .chars()
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn numeric_coercion_falls_back_to_default() {
        assert_eq!(parse_i32_or("42", 0), 42);
        assert_eq!(parse_i32_or("", 0), 0);
        assert_eq!(parse_i32_or("abc", 0), 0);
        assert_eq!(parse_decimal_or("12.50", dec!(0)), dec!(12.50));
        assert_eq!(parse_decimal_or("12,50", dec!(0)), dec!(12.50));
        assert_eq!(parse_decimal_or("n/a", dec!(0)), dec!(0));
    }

    #[test]
    fn empty_strings_map_to_none() {
        assert_eq!(none_if_empty("  "), None);
        assert_eq!(none_if_empty(" x "), Some("x".to_string()));
    }

    #[test]
    fn single_line_sanitizes_and_clips() {
        assert_eq!(single_line("a\nb\rc", 100), "a b c");
        assert_eq!(single_line("abcdef", 3), "abc");
    }
}
