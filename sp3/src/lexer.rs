//! Column-slicing primitives for SP3's fixed-width fields. A near-duplicate of
//! the `rinex` crate's lexer module; kept crate-local since `sp3` does not
//! depend on `rinex` and each format crate owns its own copy of this sliver of
//! plumbing (the pack's own RINEX readers each do the same rather than share
//! a lexing crate).
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("number parse error in \"{0}\"")]
    NumberParse(String),
}

/// Slices `line` at `[start, start+len)` in character units, never panicking
/// on a short line. `None` if `start` is already past the end.
pub fn slice(line: &str, start: usize, len: usize) -> Option<&str> {
    debug_assert!(line.is_ascii(), "non-ASCII SP3 line: {line:?}");
    if start >= line.len() {
        return None;
    }
    let end = (start + len).min(line.len());
    Some(&line[start..end])
}

pub fn is_blank(field: &str) -> bool {
    field.trim().is_empty()
}

/// Parses a fixed-width float field, `Ok(None)` for a blank field.
pub fn parse_f64_or_missing(field: &str) -> Result<Option<f64>, Error> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| Error::NumberParse(field.to_string()))
}

pub fn parse_f64(field: &str) -> Result<f64, Error> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Err(Error::NumberParse(field.to_string()));
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| Error::NumberParse(field.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_past_end_is_none() {
        assert_eq!(slice("abc", 10, 4), None);
    }

    #[test]
    fn slice_truncates_short_tail() {
        assert_eq!(slice("abcdef", 4, 10), Some("ef"));
    }

    #[test]
    fn blank_is_missing_not_error() {
        assert_eq!(parse_f64_or_missing("       ").unwrap(), None);
        assert!(parse_f64("       ").is_err());
    }
}
