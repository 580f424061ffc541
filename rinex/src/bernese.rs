//! Reader for CODE's Bernese `SATELLIT.I14`-style satellite table, which maps a
//! GLONASS SVN to its PRN/slot and frequency channel (`IFRQN`) over a validity
//! interval. Broadcast GLONASS navigation messages don't reliably carry a
//! frequency channel themselves, so carrier-frequency resolution downstream
//! needs this table. Not a RINEX format; included because GLONASS evaluation
//! in this data plane depends on it.
use crate::lexer;
use crate::reader::CursorToken;
use gnss_core::prelude::Epoch;
use hifitime::TimeScale;
use std::io::{BufRead, Seek, SeekFrom};
use thiserror::Error;

const HEADER_LINE_1: &str = "SATELLITE-SPECIFIC INFO FOR GPS/GLONASS/GEO/LEO/SLR";
const PART2_MARKER: &str = "PART 2: ON-BOARD SENSORS";
const MAX_SCAN_LINES: u32 = 1000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BerneseError {
    #[error("file does not start with the expected SATELLIT header line")]
    BadHeader,
    #[error("\"PART 2: ON-BOARD SENSORS\" marker not found within the scan limit")]
    Part2NotFound,
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for BerneseError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// One Part-2 `MW` (on-board sensor) record: a GLONASS SVN's PRN/slot and
/// frequency channel over a validity window. `valid_until = None` mirrors the
/// ANTEX `VALID UNTIL` convention: open-ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BerneseRecord {
    pub svn: u16,
    pub prn: u8,
    pub frequency_channel: i8,
    pub valid_from: Epoch,
    pub valid_until: Option<Epoch>,
}

impl BerneseRecord {
    pub fn covers(&self, epoch: Epoch) -> bool {
        epoch >= self.valid_from && self.valid_until.map_or(true, |until| epoch < until)
    }
}

/// Streaming reader over a Bernese `SATELLIT.I14`-style file, positioned at
/// the start of Part 2's records after construction.
pub struct BerneseTable<R> {
    source: R,
    part2_offset: CursorToken,
}

impl<R: BufRead + Seek> BerneseTable<R> {
    /// Validates the first line, scans forward to the `PART 2` marker, skips
    /// its dashed separator and two-line column header, and remembers the
    /// resulting offset as the reader's rewind point.
    pub fn new(mut source: R) -> Result<Self, BerneseError> {
        let mut first = String::new();
        source.read_line(&mut first)?;
        if !first.trim_end().starts_with(HEADER_LINE_1) {
            return Err(BerneseError::BadHeader);
        }

        let mut scanned = 0;
        loop {
            let mut line = String::new();
            let n = source.read_line(&mut line)?;
            if n == 0 || scanned >= MAX_SCAN_LINES {
                return Err(BerneseError::Part2NotFound);
            }
            scanned += 1;
            if line.trim_end().starts_with(PART2_MARKER) {
                break;
            }
        }

        // Dashed separator, then the two column-header lines.
        for _ in 0..3 {
            let mut line = String::new();
            source.read_line(&mut line)?;
        }
        let part2_offset = source.stream_position()?;
        Ok(Self { source, part2_offset })
    }

    pub fn rewind(&mut self) -> std::io::Result<()> {
        self.source.seek(SeekFrom::Start(self.part2_offset)).map(|_| ())
    }

    /// Scans Part 2's records from the top for the first `MW` record matching
    /// `svn` whose validity window covers `epoch`. Skips malformed lines and
    /// any non-`MW` sensor type (SLR records, for instance, carry no SVN
    /// field this table needs). Returns `None` once records are exhausted.
    pub fn find_channel(&mut self, svn: u16, epoch: Epoch) -> Result<Option<BerneseRecord>, BerneseError> {
        self.rewind()?;
        let mut line_count = 0u32;
        loop {
            if line_count >= MAX_SCAN_LINES {
                return Ok(None);
            }
            let mut line = String::new();
            let n = self.source.read_line(&mut line)?;
            if n == 0 {
                return Ok(None);
            }
            line_count += 1;
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.len() < 10 || trimmed.starts_with("PART 3") {
                return Ok(None);
            }

            match parse_mw_record(trimmed) {
                Ok(Some(record)) if record.svn == svn && record.covers(epoch) => return Ok(Some(record)),
                Ok(_) => continue,
                Err(_) => continue,
            }
        }
    }
}

/// Parses one Part-2 record line if it's an `MW` (on-board sensor) record;
/// `Ok(None)` for any other sensor type, which the caller skips.
fn parse_mw_record(line: &str) -> Result<Option<BerneseRecord>, BerneseError> {
    let discriminator = lexer::slice(line, 5, 2).unwrap_or("");
    if discriminator != "MW" {
        return Ok(None);
    }

    let prn_field = lexer::slice(line, 0, 5).unwrap_or("").trim();
    let prn: u8 = prn_field
        .parse()
        .map_err(|_| BerneseError::MalformedRecord(format!("bad PRN field {prn_field:?}")))?;

    let svn_field = lexer::slice(line, 28, 6).unwrap_or("").trim();
    let svn: u16 = svn_field
        .parse()
        .map_err(|_| BerneseError::MalformedRecord(format!("bad SVN field {svn_field:?}")))?;

    let start_field = lexer::slice(line, 41, 19).unwrap_or("");
    let valid_from = parse_bernese_epoch(start_field)
        .ok_or_else(|| BerneseError::MalformedRecord(format!("bad start time {start_field:?}")))?;

    let stop_field = lexer::slice(line, 62, 19).unwrap_or("");
    let valid_until = if stop_field.trim().is_empty() { None } else { parse_bernese_epoch(stop_field) };

    let ifrqn_field = lexer::slice(line, 193, 3).unwrap_or("").trim();
    let frequency_channel: i8 = ifrqn_field
        .parse()
        .map_err(|_| BerneseError::MalformedRecord(format!("bad IFRQN field {ifrqn_field:?}")))?;

    Ok(Some(BerneseRecord { svn, prn, frequency_channel, valid_from, valid_until }))
}

/// Parses Bernese's `YYYY MM DD HH MM SS` field layout, whitespace-delimited
/// within its fixed column span.
fn parse_bernese_epoch(field: &str) -> Option<Epoch> {
    let tokens: Vec<&str> = field.split_whitespace().collect();
    if tokens.len() < 6 {
        return None;
    }
    Epoch::parse_rinex_civil(&tokens[0..6], TimeScale::UTC).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_file() -> String {
        let header = "SATELLITE-SPECIFIC INFO FOR GPS/GLONASS/GEO/LEO/SLR, BSW5.2";
        let part2 = "PART 2: ON-BOARD SENSORS";
        let dashes = "----------------------------------------------------------";
        let hln1 = "(column header line 1)";
        let hln2 = "(column header line 2)";
        let blank = "";

        let mut record = vec![b' '; 200];
        record[0..2].copy_from_slice(b"22");
        record[5..7].copy_from_slice(b"MW");
        record[28..31].copy_from_slice(b"755");
        record[41..60].copy_from_slice(b"2022 01 01 00 00 00");
        record[193..195].copy_from_slice(b"-7");
        let record_line = String::from_utf8(record).unwrap();

        [header, part2, dashes, hln1, hln2, blank, record_line.as_str()].join("\n")
    }

    #[test]
    fn finds_channel_for_matching_svn_and_epoch() {
        let mut table = BerneseTable::new(Cursor::new(sample_file())).unwrap();
        let epoch = Epoch::from_gregorian_utc(2022, 6, 1, 0, 0, 0, 0);
        let found = table.find_channel(755, epoch).unwrap().unwrap();
        assert_eq!(found.prn, 22);
        assert_eq!(found.frequency_channel, -7);
        assert!(found.valid_until.is_none());
    }

    #[test]
    fn returns_none_for_unmatched_svn() {
        let mut table = BerneseTable::new(Cursor::new(sample_file())).unwrap();
        let epoch = Epoch::from_gregorian_utc(2022, 6, 1, 0, 0, 0, 0);
        assert!(table.find_channel(999, epoch).unwrap().is_none());
    }

    #[test]
    fn rejects_bad_header() {
        let bad = "NOT THE RIGHT HEADER\n".to_string();
        assert!(BerneseTable::new(Cursor::new(bad)).is_err());
    }
}
