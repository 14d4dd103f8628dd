//! Shared utilities for the analysis pipeline.
//!
//! Helpers for reading typed values out of Polars columns and for parsing
//! the loosely formatted numbers found in exported reports.

use polars::prelude::*;
use sha2::{Digest, Sha256};

/// Integer or float column.
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    dtype.is_integer() || dtype.is_float()
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 3] = ['%', ' ', '\u{a0}'];

/// Common error/missing value markers in exported reports.
pub const ERROR_MARKERS: [&str; 8] = [
    "error", "unknown", "n/a", "na", "null", "missing", "none", "-",
];

/// Check if a string is an error/missing value marker.
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Remove whitespace and percent signs before numeric parsing.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Whether `s` is an integer written with one kind of thousands separator,
/// e.g. `1.234.567` or `1,234`.
fn is_grouped_integer(s: &str, separator: char) -> bool {
    let mut groups = s.split(separator);
    let Some(first) = groups.next() else {
        return false;
    };
    if first.is_empty() || first.len() > 3 || !first.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let mut saw_group = false;
    for group in groups {
        if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        saw_group = true;
    }
    saw_group
}

/// Parse a count such as page views or likes.
///
/// Accepts plain integers, German (`1.234`) and English (`1,234`) thousands
/// grouping and decimal values (rounded). Negative values clamp to zero.
/// Empty strings and error markers yield `None`.
pub fn parse_count(s: &str) -> Option<u64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() || is_error_marker(&cleaned) {
        return None;
    }

    if let Ok(value) = cleaned.parse::<u64>() {
        return Some(value);
    }

    for separator in ['.', ','] {
        if is_grouped_integer(&cleaned, separator) {
            return cleaned.replace(separator, "").parse::<u64>().ok();
        }
    }

    // A single comma is a German decimal separator.
    let normalized = if cleaned.matches(',').count() == 1 && !cleaned.contains('.') {
        cleaned.replace(',', ".")
    } else {
        cleaned
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0).round() as u64)
}

// =============================================================================
// Column Extraction Utilities
// =============================================================================

/// Values of a column cast to strings. Blank strings become `None`, others
/// are kept verbatim.
pub fn string_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let series = df.column(name)?.as_materialized_series();
    let as_string = series.cast(&DataType::String)?;
    let values = as_string
        .str()?
        .into_iter()
        .map(|opt| {
            opt.filter(|v| !v.trim().is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}

/// Like [`string_values`], but an absent column yields all-`None`.
pub fn optional_string_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    if df.column(name).is_ok() {
        string_values(df, name)
    } else {
        Ok(vec![None; df.height()])
    }
}

/// Values of a count column. Nulls and unparsable cells become 0.
pub fn count_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<u64>> {
    let series = df.column(name)?.as_materialized_series();

    if is_numeric_dtype(series.dtype()) {
        let floats = series.cast(&DataType::Float64)?;
        let values = floats
            .f64()?
            .into_iter()
            .map(|opt| match opt {
                Some(v) if v.is_finite() => v.max(0.0).round() as u64,
                _ => 0,
            })
            .collect();
        return Ok(values);
    }

    let as_string = series.cast(&DataType::String)?;
    let values = as_string
        .str()?
        .into_iter()
        .map(|opt| opt.and_then(parse_count).unwrap_or(0))
        .collect();
    Ok(values)
}

// =============================================================================
// Fingerprints
// =============================================================================

/// Hex-encoded SHA-256 of `bytes`.
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{digest:x}")
}
