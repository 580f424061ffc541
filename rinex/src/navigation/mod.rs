//! RINEX Navigation v3.x streaming reader, plus the broadcast-ephemeris
//! evaluators that turn a parsed frame into an ECEF position and clock offset.
mod constants;
mod frame;
mod glonass;
mod keplerian;
mod validity;

pub use frame::{GeoFrame, GlonassFrame, KeplerianFrame, NavFrame};
pub use keplerian::ura_meters;
pub use validity::{covers, is_healthy};

use crate::reader::{CursorToken, StreamStatus};
use gnss_core::prelude::{Constellation, Epoch};
use hifitime::TimeScale;
use std::io::{BufRead, Seek, SeekFrom};
use thiserror::Error;

#[cfg(feature = "log")]
use log::warn;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavigationError {
    #[error("unrecognized satellite system byte in \"{0}\"")]
    BadSatsysByte(String),
    #[error("invalid epoch timestamp: {0}")]
    BadTimestamp(#[from] gnss_core::epoch::Error),
    #[error("number parse error: {0}")]
    NumberParse(#[from] crate::lexer::Error),
    #[error("unexpected end of file mid-record")]
    UnexpectedEof,
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for NavigationError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Conditions an evaluator can run into that aren't parse errors: the input was
/// well-formed, but the physics didn't cooperate (non-convergent Kepler solve,
/// a diverging GLONASS integration) or the caller asked for something the frame
/// can't honor (an unhealthy satellite, an out-of-table URA index).
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum EvaluationError {
    #[error("Kepler equation did not converge within the iteration cap")]
    KeplerNoConverge,
    #[error("GLONASS RK4 integration did not converge within the iteration cap")]
    GloIntegrationDiverged,
    #[error("frame is outside its validity window for the query epoch")]
    EphemerisStale,
    #[error("satellite is marked unhealthy in its broadcast frame")]
    UnhealthySat,
    #[error("URA index {0} has no entry in the accuracy table")]
    UraUnknown(f64),
    #[error("no evaluator for constellation {0:?}; only Keplerian and GLONASS frames propagate")]
    UnsupportedConstellation(Constellation),
}

pub type NavigationStatus = StreamStatus<NavFrame, NavigationError>;

/// Streaming reader over a RINEX Navigation v3.x file: one cursor, one
/// constellation-tagged frame per `read_next`.
pub struct NavigationReader<R> {
    source: R,
    header_end: CursorToken,
    timescale_hint: TimeScale,
    /// First three characters of the next unread record, if already peeked.
    peeked_line: Option<String>,
}

impl<R: BufRead + Seek> NavigationReader<R> {
    /// Reads the header (kept only for its `END OF HEADER` terminator; this
    /// reader carries no other header state, unlike the observation reader's
    /// observable-code table) and leaves the cursor at the first record.
    pub fn new(mut source: R) -> Result<Self, NavigationError> {
        loop {
            let mut line = String::new();
            let n = source.read_line(&mut line)?;
            if n == 0 {
                return Err(NavigationError::UnexpectedEof);
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.len() > 60 && trimmed[60..].trim_start().starts_with("END OF HEADER") {
                break;
            }
        }
        let header_end = source.stream_position()?;
        Ok(Self {
            source,
            header_end,
            timescale_hint: TimeScale::GPST,
            peeked_line: None,
        })
    }

    pub fn position(&mut self) -> std::io::Result<CursorToken> {
        self.source.stream_position()
    }

    pub fn rewind(&mut self) -> std::io::Result<()> {
        self.source.seek(SeekFrom::Start(self.header_end))?;
        self.peeked_line = None;
        Ok(())
    }

    pub fn rewind_to(&mut self, token: CursorToken) -> std::io::Result<()> {
        self.source.seek(SeekFrom::Start(token))?;
        self.peeked_line = None;
        Ok(())
    }

    fn next_line(&mut self) -> Result<Option<String>, NavigationError> {
        if let Some(line) = self.peeked_line.take() {
            return Ok(Some(line));
        }
        let mut line = String::new();
        let n = self.source.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Observes the constellation tag of the next record's leading satellite
    /// code without consuming it.
    pub fn peek_satsys(&mut self) -> Option<Constellation> {
        if self.peeked_line.is_none() {
            self.peeked_line = self.next_line().ok().flatten();
        }
        let line = self.peeked_line.as_ref()?;
        let code = crate::lexer::slice(line, 0, 1)?;
        std::str::FromStr::from_str(code).ok()
    }

    /// Consumes and discards one record without parsing its orbital fields.
    pub fn skip_next(&mut self) -> StreamStatus<(), NavigationError> {
        match self.read_record_lines() {
            Ok(Some(_)) => StreamStatus::Ok(()),
            Ok(None) => StreamStatus::Eof,
            Err(e) => StreamStatus::Err(e),
        }
    }

    /// Reads one navigation frame, dispatching on the leading satellite code's
    /// constellation to the 4-line (GLONASS/SBAS) or 8-line (Keplerian) block
    /// layout.
    pub fn read_next(&mut self) -> NavigationStatus {
        let first = match self.next_line() {
            Ok(Some(l)) => l,
            Ok(None) => return StreamStatus::Eof,
            Err(e) => return StreamStatus::Err(e),
        };
        if first.trim().is_empty() {
            return StreamStatus::Eof;
        }

        let code = match crate::lexer::slice(&first, 0, 1) {
            Some(c) => c,
            None => return StreamStatus::Err(NavigationError::UnexpectedEof),
        };
        let constellation: Constellation = match std::str::FromStr::from_str(code) {
            Ok(c) => c,
            Err(_) => return StreamStatus::Err(NavigationError::BadSatsysByte(code.to_string())),
        };

        let block_lines = match constellation {
            Constellation::Glonass | Constellation::SBAS => frame::STATE_VECTOR_BLOCK_LINES,
            _ => frame::KEPLERIAN_BLOCK_LINES,
        };

        let mut lines = Vec::with_capacity(block_lines);
        lines.push(first);
        for _ in 1..block_lines {
            match self.next_line() {
                Ok(Some(l)) => lines.push(l),
                Ok(None) => return StreamStatus::Err(NavigationError::UnexpectedEof),
                Err(e) => return StreamStatus::Err(e),
            }
        }
        let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();

        let result = match constellation {
            Constellation::Glonass => frame::parse_glonass(&borrowed, TimeScale::UTC),
            Constellation::SBAS => frame::parse_geo(&borrowed, TimeScale::GPST),
            other => {
                let ts = other.timescale().unwrap_or(self.timescale_hint);
                frame::parse_keplerian(&borrowed, ts)
            },
        };

        match result {
            Ok(parsed) => StreamStatus::Ok(parsed),
            Err(e) => StreamStatus::Err(e),
        }
    }

    fn read_record_lines(&mut self) -> Result<Option<Vec<String>>, NavigationError> {
        let first = match self.next_line()? {
            Some(l) if !l.trim().is_empty() => l,
            _ => return Ok(None),
        };
        let code = crate::lexer::slice(&first, 0, 1).unwrap_or(" ");
        let constellation: Constellation = std::str::FromStr::from_str(code)
            .map_err(|_| NavigationError::BadSatsysByte(code.to_string()))?;
        let block_lines = match constellation {
            Constellation::Glonass | Constellation::SBAS => frame::STATE_VECTOR_BLOCK_LINES,
            _ => frame::KEPLERIAN_BLOCK_LINES,
        };
        let mut lines = vec![first];
        for _ in 1..block_lines {
            match self.next_line()? {
                Some(l) => lines.push(l),
                None => return Err(NavigationError::UnexpectedEof),
            }
        }
        Ok(Some(lines))
    }

    /// Scans forward for the next frame matching `(constellation, prn)`,
    /// remembering the byte offset just before it was read so the caller can
    /// `rewind_to` if it wants to re-scan from here.
    pub fn find_next(&mut self, cursor_out: &mut Option<CursorToken>, constellation: Constellation, prn: u8) -> NavigationStatus {
        loop {
            let before = match self.position() {
                Ok(p) => p,
                Err(e) => return StreamStatus::Err(NavigationError::from(e)),
            };
            match self.read_next() {
                StreamStatus::Ok(frame) => {
                    let sv = frame.sv();
                    if sv.constellation == constellation && sv.prn == prn {
                        *cursor_out = Some(before);
                        return StreamStatus::Ok(frame);
                    }
                },
                StreamStatus::Eof => return StreamStatus::Eof,
                StreamStatus::Err(e) => return StreamStatus::Err(e),
            }
        }
    }

    /// Like [`Self::find_next`], but additionally requires the frame to cover
    /// `epoch` per [`validity::covers`]. Restores the original cursor if
    /// nothing is found; otherwise the cursor is left just past the match, as
    /// with `find_next`.
    pub fn find_next_valid(
        &mut self,
        epoch: Epoch,
        constellation: Constellation,
        prn: u8,
    ) -> NavigationStatus {
        let origin = match self.position() {
            Ok(p) => p,
            Err(e) => return StreamStatus::Err(NavigationError::from(e)),
        };
        loop {
            match self.read_next() {
                StreamStatus::Ok(frame) => {
                    let sv = frame.sv();
                    if sv.constellation == constellation && sv.prn == prn && validity::covers(&frame, epoch) {
                        return StreamStatus::Ok(frame);
                    }
                },
                StreamStatus::Eof => {
                    let _ = self.rewind_to(origin);
                    return StreamStatus::Eof;
                },
                StreamStatus::Err(e) => {
                    let _ = self.rewind_to(origin);
                    return StreamStatus::Err(e);
                },
            }
        }
    }
}

/// Combined evaluation entry point: dispatches on `frame`'s constellation to
/// the Keplerian or GLONASS evaluator, refusing to evaluate an unhealthy
/// satellite or an SBAS/GEO frame (this crate has no propagation model for
/// either). Reuses the Kepler solve's `Ek` for both position and clock, per
/// the single-iteration contract.
pub fn state_and_clock(frame: &NavFrame, t: Epoch) -> Result<([f64; 3], f64), EvaluationError> {
    if !validity::is_healthy(frame) {
        #[cfg(feature = "log")]
        warn!("evaluating unhealthy satellite {}", frame.sv());
        return Err(EvaluationError::UnhealthySat);
    }
    match frame {
        NavFrame::Keplerian(k) => keplerian::evaluate(k, t),
        NavFrame::Glonass(g) => glonass::evaluate(g, t),
        NavFrame::Geo(_) => Err(EvaluationError::UnsupportedConstellation(frame.constellation())),
    }
}

/// Same as [`state_and_clock`] but uses GLONASS's precise inertial-frame
/// integrator instead of the simplified rotating-frame one; Keplerian frames
/// are unaffected by the choice.
pub fn state_and_clock_precise(frame: &NavFrame, t: Epoch) -> Result<([f64; 3], f64), EvaluationError> {
    if !validity::is_healthy(frame) {
        return Err(EvaluationError::UnhealthySat);
    }
    match frame {
        NavFrame::Keplerian(k) => keplerian::evaluate(k, t),
        NavFrame::Glonass(g) => glonass::evaluate_precise(g, t),
        NavFrame::Geo(_) => Err(EvaluationError::UnsupportedConstellation(frame.constellation())),
    }
}
