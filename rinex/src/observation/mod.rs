//! RINEX Observation v3.x streaming reader: a cursor over epoch records, each
//! resolved against a [`RecipePlan`](crate::recipe::RecipePlan) into one combined
//! value per recipe per satellite.
mod header;
mod record;

pub use header::ObsHeader;
pub use record::{EpochFlag, ObsEpoch, RawSample};

use crate::reader::{CursorToken, StreamStatus};
use gnss_core::prelude::SV;
use std::io::{BufRead, Seek, SeekFrom};
use thiserror::Error;

#[cfg(feature = "log")]
use log::warn;

/// The value a missing observation is reported as; short-circuits recipe
/// combination per [`gnss_core::observable::GnssObservable::combine`].
pub const MISSING_SENTINEL: f64 = -999.99;

/// Upper bound on satellites carried in one epoch record. Values beyond this are
/// read and discarded with a warning rather than grown into unboundedly.
pub const MAX_SATS_PER_EPOCH: usize = 80;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObservationError {
    #[error("malformed epoch header line: \"{0}\"")]
    BadEpochLine(String),
    #[error("invalid epoch timestamp: {0}")]
    BadTimestamp(#[from] gnss_core::epoch::Error),
    #[error("malformed satellite count field")]
    BadSatCount,
    #[error("unexpected end of file mid-record")]
    UnexpectedEof,
    #[error("malformed header: {0}")]
    BadHeader(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ObservationError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type ObservationStatus = StreamStatus<ObsEpoch, ObservationError>;

/// Streaming reader over a RINEX Observation v3.x file.
pub struct ObservationReader<R> {
    source: R,
    header: ObsHeader,
    header_end: CursorToken,
}

impl<R: BufRead + Seek> ObservationReader<R> {
    /// Reads and parses the header, leaving the cursor at the first epoch record.
    pub fn new(mut source: R) -> Result<Self, ObservationError> {
        let mut header_lines = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            let n = source.read_line(&mut line)?;
            if n == 0 {
                return Err(ObservationError::UnexpectedEof);
            }
            let trimmed = line.trim_end_matches(['\n', '\r']).to_string();
            let is_last = trimmed.len() > 60 && trimmed[60..].trim_start().starts_with("END OF HEADER");
            header_lines.push(trimmed);
            if is_last {
                break;
            }
        }

        let header = header::parse(&header_lines)?;
        #[cfg(feature = "log")]
        if header.clock_offset_applied {
            warn!("RCV CLOCK OFFS APPL=1: epochs, code and phase are already receiver-clock corrected upstream");
        }

        let header_end = source.stream_position()?;
        Ok(Self {
            source,
            header,
            header_end,
        })
    }

    pub fn header(&self) -> &ObsHeader {
        &self.header
    }

    /// Byte offset that can later be passed to [`Self::rewind_to`].
    pub fn position(&mut self) -> std::io::Result<CursorToken> {
        self.source.stream_position()
    }

    /// Resets the cursor to just after the header.
    pub fn rewind(&mut self) -> std::io::Result<()> {
        self.source.seek(SeekFrom::Start(self.header_end))?;
        Ok(())
    }

    pub fn rewind_to(&mut self, token: CursorToken) -> std::io::Result<()> {
        self.source.seek(SeekFrom::Start(token))?;
        Ok(())
    }

    /// Reads one epoch, resolving each satellite's raw observations against
    /// `plan`. Returns `Eof` at end of file, never an error, per the EOF-as-value
    /// convention used throughout this crate.
    pub fn next_epoch(&mut self, plan: &crate::recipe::RecipePlan) -> ObservationStatus {
        match self.read_epoch_header() {
            Ok(Some(mut partial)) => {
                if let Err(e) = self.read_epoch_body(&mut partial, plan) {
                    return StreamStatus::Err(e);
                }
                StreamStatus::Ok(partial.epoch)
            },
            Ok(None) => StreamStatus::Eof,
            Err(e) => StreamStatus::Err(e),
        }
    }

    fn read_epoch_header(&mut self) -> Result<Option<record::PartialEpoch>, ObservationError> {
        let mut line = String::new();
        let n = self.source.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        let line = line.trim_end_matches(['\n', '\r']);
        record::parse_epoch_header(line, self.header.timescale).map(Some)
    }

    fn read_epoch_body(
        &mut self,
        partial: &mut record::PartialEpoch,
        plan: &crate::recipe::RecipePlan,
    ) -> Result<(), ObservationError> {
        let nsat = partial.nsat as usize;
        let mut satellites = Vec::with_capacity(nsat.min(MAX_SATS_PER_EPOCH));

        for i in 0..nsat {
            let mut line = String::new();
            let n = self.source.read_line(&mut line)?;
            if n == 0 {
                return Err(ObservationError::UnexpectedEof);
            }
            let line = line.trim_end_matches(['\n', '\r']);

            if i >= MAX_SATS_PER_EPOCH {
                #[cfg(feature = "log")]
                warn!("epoch carries more than {MAX_SATS_PER_EPOCH} satellites, discarding extras");
                continue;
            }

            if let Some((sv, values)) = record::parse_satellite_line(line, plan, MISSING_SENTINEL) {
                satellites.push((sv, values));
            }
        }

        partial.epoch.satellites = satellites;
        Ok(())
    }
}

/// One yielded satellite's resolved recipe values, in the same order as the
/// plans returned by `RecipePlan::plans_for` for its constellation.
pub type SatelliteValues = (SV, Vec<RawSample>);
