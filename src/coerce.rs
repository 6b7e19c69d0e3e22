//! Lenient numeric parsing for values typed into forms.
//!
//! Bad numeric input is normalized, never rejected: a field that does not
//! start with a number collapses to the caller's default.

use once_cell::sync::Lazy;
use regex::Regex;

static DECIMAL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("decimal prefix pattern to compile")
});

static INTEGER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+").expect("integer prefix pattern to compile"));

/// Parse the longest leading decimal number in `input`.
///
/// `"72.5kg"` yields `72.5`; `""`, `"abc"` and `"-"` yield `default`.
pub fn coerce_numeric(input: &str, default: f64) -> f64 {
    DECIMAL_PREFIX
        .find(input.trim())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(default)
}

/// Parse the leading integer in `input`, truncating any fractional part.
///
/// A zero result is returned as-is; only a missing number falls back.
pub fn coerce_whole(input: &str, default: i64) -> i64 {
    INTEGER_PREFIX
        .find(input.trim())
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .unwrap_or(default)
}
