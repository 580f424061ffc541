//! Streaming SP3 reader: header once, then one `(Epoch, Vec<Sp3Entry>)` per
//! `next_epoch()` call.
use crate::error::Sp3Error;
use crate::header::{self, Header};
use crate::record::{self, Sp3Entry};
use gnss_core::prelude::Epoch;
use std::io::{BufRead, Seek, SeekFrom};

/// A previously-observed byte offset into a reader's file, returned by
/// `position()` and accepted back by `rewind_to`.
pub type CursorToken = u64;

/// The outcome of one `next_epoch` call: either a record was produced, the
/// stream is exhausted, or a stream-time recoverable error occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamStatus<T, E> {
    Ok(T),
    Eof,
    Err(E),
}

impl<T, E> StreamStatus<T, E> {
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            _ => None,
        }
    }
}

pub type EpochStatus = StreamStatus<(Epoch, Vec<Sp3Entry>), Sp3Error>;

pub struct Sp3Reader<R> {
    source: R,
    header: Header,
    header_end: CursorToken,
    /// A line already consumed from the stream but not yet dispatched: the
    /// header parser can't push lines back, and `next_epoch` can't either
    /// once it reads one line past the epoch it's assembling.
    lookahead: Option<String>,
}

impl<R: BufRead + Seek> Sp3Reader<R> {
    pub fn new(mut source: R) -> Result<Self, Sp3Error> {
        let (header, first_record_line) = header::parse(&mut source)?;
        let header_end = source.stream_position()?;
        Ok(Self {
            source,
            header,
            header_end,
            lookahead: Some(first_record_line),
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn position(&mut self) -> std::io::Result<CursorToken> {
        self.source.stream_position()
    }

    /// Rewinds to the first record, right after the header.
    pub fn rewind(&mut self) -> std::io::Result<()> {
        self.source.seek(SeekFrom::Start(self.header_end))?;
        self.lookahead = None;
        Ok(())
    }

    pub fn rewind_to(&mut self, token: CursorToken) -> std::io::Result<()> {
        self.source.seek(SeekFrom::Start(token))?;
        self.lookahead = None;
        Ok(())
    }

    fn next_line(&mut self) -> Result<Option<String>, Sp3Error> {
        if let Some(line) = self.lookahead.take() {
            return Ok(Some(line));
        }
        Ok(record::read_line(&mut self.source)?)
    }

    /// Reads one epoch's worth of entries: the `*` line, then every `P`/`V`
    /// line up to (not including) the next `*` line or the terminal `EOF`.
    /// `V` lines are merged into the preceding `P` entry for the same SV.
    pub fn next_epoch(&mut self) -> EpochStatus {
        let first = match self.next_line() {
            Ok(Some(l)) => l,
            Ok(None) => return StreamStatus::Eof,
            Err(e) => return StreamStatus::Err(e),
        };
        if first.trim().is_empty() || first.trim_start().starts_with("EOF") {
            return StreamStatus::Eof;
        }
        if !first.starts_with('*') {
            return StreamStatus::Err(Sp3Error::BadEpochLine(first));
        }

        let epoch = match record::parse_epoch_line(&first) {
            Ok(e) => e,
            Err(e) => return StreamStatus::Err(e),
        };

        let mut entries: Vec<Sp3Entry> = Vec::new();
        loop {
            let line = match self.next_line() {
                Ok(Some(l)) => l,
                Ok(None) => break,
                Err(e) => return StreamStatus::Err(e),
            };
            if line.trim().is_empty() || line.trim_start().starts_with("EOF") || line.starts_with('*') {
                self.lookahead = Some(line);
                break;
            }
            match line.as_bytes().first() {
                Some(b'P') => match record::parse_position_entry(&line) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => return StreamStatus::Err(e),
                },
                Some(b'V') => match record::parse_velocity_entry(&line) {
                    Ok((sv, velocity_m_s, clock_drift_us_per_s)) => {
                        if let Some(entry) = entries.iter_mut().find(|e| e.sv == sv) {
                            entry.velocity_m_s = Some(velocity_m_s);
                            entry.clock_drift_us_per_s = clock_drift_us_per_s;
                        }
                    },
                    Err(e) => return StreamStatus::Err(e),
                },
                _ => return StreamStatus::Err(Sp3Error::BadEpochLine(line)),
            }
        }

        StreamStatus::Ok((epoch, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EntryFlags;
    use std::io::Cursor;

    fn sample() -> String {
        let mut s = String::new();
        s.push_str("#dP1980  1  6  0  0  0.00000000       2 ORBIT IGS14 HLM IGS\n");
        s.push_str("##    0      0.00000000   900.00000000 44244 0.0000000000000\n");
        s.push_str("+    1   G01  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0\n");
        for _ in 0..4 {
            s.push_str("+          0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0\n");
        }
        s.push_str("++        2  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0\n");
        for _ in 0..4 {
            s.push_str("++         0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0\n");
        }
        s.push_str("%c G  cc GPS ccc cccc cccc cccc cccc ccccc ccccc ccccc ccccc\n");
        s.push_str("%c cc cc ccc ccc cccc cccc cccc cccc ccccc ccccc ccccc ccccc\n");
        s.push_str("%f  1.2500000  1.025000000  0.00000000000  0.000000000000000\n");
        s.push_str("%f  0.0000000  0.000000000  0.00000000000  0.000000000000000\n");
        s.push_str("%i    0    0    0    0      0      0      0      0         0\n");
        s.push_str("%i    0    0    0    0      0      0      0      0         0\n");
        s.push_str("/* test fixture\n");
        s.push_str("*  1980  1  6  0  0  0.00000000\n");
        s.push_str("PG01      0.000000      0.000000      0.000000    123.456789\n");
        s.push_str("VG01    100.000000    200.000000    300.000000      1.000000\n");
        s.push_str("*  1980  1  6  0 15  0.00000000\n");
        s.push_str("PG01   1000.000000   2000.000000   3000.000000    123.456789\n");
        s.push_str("EOF\n");
        s
    }

    #[test]
    fn reads_two_epochs_then_eof() {
        let cursor = Cursor::new(sample());
        let mut reader = Sp3Reader::new(cursor).expect("header parses");

        let (epoch1, entries1) = reader.next_epoch().ok().expect("first epoch");
        assert_eq!(entries1.len(), 1);
        assert!(entries1[0].flags.contains(EntryFlags::MISSING_POSITION));
        assert_eq!(entries1[0].velocity_m_s, Some([100.0e-1, 200.0e-1, 300.0e-1]));

        let (epoch2, entries2) = reader.next_epoch().ok().expect("second epoch");
        assert!(epoch2 > epoch1);
        assert_eq!(entries2[0].position_m[0], 1_000_000.0);
        assert_eq!(entries2[0].velocity_m_s, None);

        assert!(reader.next_epoch().is_eof());
    }

    #[test]
    fn rewind_replays_from_first_epoch() {
        let cursor = Cursor::new(sample());
        let mut reader = Sp3Reader::new(cursor).expect("header parses");
        reader.next_epoch();
        reader.next_epoch();
        reader.rewind().unwrap();
        let (_, entries) = reader.next_epoch().ok().expect("first epoch again");
        assert_eq!(entries.len(), 1);
    }
}
