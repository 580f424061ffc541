//! Shared column-slicing primitives used by every format reader in this crate:
//! fixed-width float parsing with Fortran `D`/`d` exponent normalization, and
//! space-as-missing detection.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("number parse error in \"{0}\"")]
    NumberParse(String),
}

/// Slices `line` at `[start, start+len)` in *character* units (not bytes), padding
/// with nothing if the line is shorter. Returns `None` if `start` is already past
/// the end of the line (used to detect "line ends before this column" so callers
/// can apply their missing-column policy instead of erroring).
pub fn slice(line: &str, start: usize, len: usize) -> Option<&str> {
    // RINEX/SP3/ANTEX content is ASCII, so byte indices double as char indices;
    // this keeps the hot per-record parsing path allocation-free.
    debug_assert!(line.is_ascii(), "non-ASCII RINEX line: {line:?}");
    if start >= line.len() {
        return None;
    }
    let end = (start + len).min(line.len());
    Some(&line[start..end])
}

/// `true` if a sliced column is entirely whitespace (the RINEX "missing value"
/// encoding).
pub fn is_blank(field: &str) -> bool {
    field.trim().is_empty()
}

/// Parses a fixed-width numeric field, normalizing a Fortran `D`/`d` exponent
/// character to `E` first (`0.123456789012D+04` → `0.123456789012E+04`). Returns
/// `Ok(None)` for a blank field (space-as-missing), `Err` for anything that isn't
/// valid f64 once normalized.
pub fn parse_f64_or_missing(field: &str) -> Result<Option<f64>, Error> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_f64(trimmed).map(Some)
}

/// Same as [`parse_f64_or_missing`] but a blank field is an error: use when the
/// caller's format never allows a missing value in this slot.
pub fn parse_f64(field: &str) -> Result<f64, Error> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Err(Error::NumberParse(field.to_string()));
    }
    let normalized: String = trimmed
        .chars()
        .map(|c| match c {
            'D' => 'E',
            'd' => 'e',
            other => other,
        })
        .collect();
    normalized
        .parse::<f64>()
        .map_err(|_| Error::NumberParse(field.to_string()))
}

/// Parses a fixed-width integer field, `Ok(None)` on blank.
pub fn parse_i64_or_missing(field: &str) -> Result<Option<i64>, Error> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| Error::NumberParse(field.to_string()))
}

/// Extracts `count` consecutive fixed-width numeric columns of `width` chars
/// starting at `start`, missing columns mapped to `sentinel` rather than erroring
/// (used by record bodies that tolerate short lines, e.g. RINEX-Obs satellite
/// records).
pub fn columns_or_sentinel(line: &str, start: usize, width: usize, count: usize, sentinel: f64) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let col_start = start + i * width;
            match slice(line, col_start, width) {
                Some(field) if !is_blank(field) => parse_f64(field).unwrap_or(sentinel),
                _ => sentinel,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_fortran_exponent() {
        assert_eq!(parse_f64("0.123456789012D+04").unwrap(), 1234.56789012);
        assert_eq!(parse_f64("-1.5d-03").unwrap(), -0.0015);
    }

    #[test]
    fn blank_is_missing_not_error() {
        assert_eq!(parse_f64_or_missing("            ").unwrap(), None);
        assert!(parse_f64("            ").is_err());
    }

    #[test]
    fn slice_past_end_is_none() {
        assert_eq!(slice("abc", 10, 4), None);
    }

    #[test]
    fn slice_truncates_short_tail() {
        assert_eq!(slice("abcdef", 4, 10), Some("ef"));
    }

    #[test]
    fn columns_or_sentinel_short_line() {
        // 3 columns of width 16 requested, line only has enough for 2.
        let line = format!("{:16}{:16}", "  1234.500  0 0", "  2345.600  0 0");
        let values = columns_or_sentinel(&line, 0, 16, 3, -999.99);
        assert_eq!(values.len(), 3);
        assert!((values[0] - 1234.500).abs() < 1e-6);
        assert!((values[1] - 2345.600).abs() < 1e-6);
        assert_eq!(values[2], -999.99);
    }
}
