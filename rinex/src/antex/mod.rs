//! ANTEX antenna-calibration reader: streams `START OF ANTENNA` blocks and
//! extracts mean phase-center offsets (no PCV grid interpolation, per this
//! data plane's scope). Supports both receiver-antenna lookup (model/radome/
//! serial) and satellite-antenna lookup (constellation/PRN + validity window).
pub mod antenna;

pub use antenna::{Antenna, AntennaIdentity, FrequencyPco, Pco};

use crate::reader::{CursorToken, StreamStatus};
use gnss_core::prelude::{Constellation, Epoch, ReceiverAntenna, SV};
use hifitime::TimeScale;
use std::io::{BufRead, Seek, SeekFrom};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AntexError {
    #[error("malformed ANTEX header: {0}")]
    BadHeader(String),
    #[error("invalid epoch in VALID FROM/UNTIL: {0}")]
    BadTimestamp(#[from] gnss_core::epoch::Error),
    #[error("number parse error: {0}")]
    NumberParse(#[from] crate::lexer::Error),
    #[error("unrecognized satellite code in \"{0}\"")]
    BadSatsysByte(String),
    #[error("unexpected end of file mid-block")]
    UnexpectedEof,
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AntexError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type AntexStatus = StreamStatus<Antenna, AntexError>;

/// How a requested receiver antenna matched against the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchQuality {
    /// Model, radome and serial number all matched.
    Exact,
    /// Model and radome matched a record with no serial number on file (the
    /// generic per-model calibration); only returned when the caller didn't
    /// require an exact serial match.
    ModelOnly,
}

fn label(line: &str) -> &str {
    if line.len() > 60 {
        line[60..].trim()
    } else {
        ""
    }
}

fn content(line: &str) -> &str {
    if line.len() > 60 { &line[..60] } else { line }
}

/// Streaming reader over an ANTEX file: one `Antenna` block per `next_antenna`.
pub struct AntexReader<R> {
    source: R,
    header_end: CursorToken,
}

impl<R: BufRead + Seek> AntexReader<R> {
    pub fn new(mut source: R) -> Result<Self, AntexError> {
        loop {
            let mut line = String::new();
            let n = source.read_line(&mut line)?;
            if n == 0 {
                return Err(AntexError::UnexpectedEof);
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if label(trimmed) == "END OF HEADER" {
                break;
            }
        }
        let header_end = source.stream_position()?;
        Ok(Self { source, header_end })
    }

    pub fn position(&mut self) -> std::io::Result<CursorToken> {
        self.source.stream_position()
    }

    pub fn rewind(&mut self) -> std::io::Result<()> {
        self.source.seek(SeekFrom::Start(self.header_end)).map(|_| ())
    }

    pub fn rewind_to(&mut self, token: CursorToken) -> std::io::Result<()> {
        self.source.seek(SeekFrom::Start(token)).map(|_| ())
    }

    fn read_line(&mut self) -> Result<Option<String>, AntexError> {
        let mut line = String::new();
        let n = self.source.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Reads lines forward until `START OF ANTENNA`, then parses every line up
    /// to and including `END OF ANTENNA` into one [`Antenna`].
    pub fn next_antenna(&mut self) -> AntexStatus {
        loop {
            match self.read_line() {
                Ok(Some(line)) => {
                    if label(&line) == "START OF ANTENNA" {
                        break;
                    }
                },
                Ok(None) => return StreamStatus::Eof,
                Err(e) => return StreamStatus::Err(e),
            }
        }

        let mut type_designator = String::new();
        let mut serial: Option<String> = None;
        let mut sv: Option<SV> = None;
        let mut valid_from: Option<Epoch> = None;
        let mut valid_until: Option<Epoch> = None;
        let mut frequencies = Vec::new();
        let mut current_channel: Option<String> = None;

        loop {
            let line = match self.read_line() {
                Ok(Some(l)) => l,
                Ok(None) => return StreamStatus::Err(AntexError::UnexpectedEof),
                Err(e) => return StreamStatus::Err(e),
            };
            let body = content(&line);
            match label(&line) {
                "END OF ANTENNA" => break,
                "TYPE / SERIAL NO" => {
                    let type_field = crate::lexer::slice(body, 0, 20).unwrap_or("").trim();
                    let serial_field = crate::lexer::slice(body, 20, 20).unwrap_or("").trim();
                    type_designator = type_field.to_string();
                    if let Ok(parsed_sv) = SV::from_rinex_code(serial_field.trim()) {
                        sv = Some(parsed_sv);
                    } else if !serial_field.is_empty() {
                        serial = Some(serial_field.to_string());
                    }
                },
                "VALID FROM" => {
                    valid_from = Some(parse_antex_epoch(body)?);
                },
                "VALID UNTIL" => {
                    valid_until = Some(parse_antex_epoch(body)?);
                },
                "START OF FREQUENCY" => {
                    current_channel = Some(crate::lexer::slice(body, 0, 3).unwrap_or("").trim().to_string());
                },
                "NORTH / EAST / UP" => {
                    let values = crate::lexer::columns_or_sentinel(body, 0, 10, 3, 0.0);
                    if let Some(channel) = current_channel.clone() {
                        frequencies.push(FrequencyPco {
                            channel,
                            pco: Pco {
                                north_mm: values[0],
                                east_mm: values[1],
                                up_mm: values[2],
                            },
                        });
                    }
                },
                "END OF FREQUENCY" => current_channel = None,
                _ => {},
            }
        }

        let identity = match sv {
            Some(sv) => AntennaIdentity::Satellite {
                sv,
                valid_from: valid_from.unwrap_or_else(|| Epoch::from_gregorian_utc(1980, 1, 6, 0, 0, 0, 0)),
                valid_until,
            },
            None => AntennaIdentity::Receiver { serial },
        };

        StreamStatus::Ok(Antenna { type_designator, identity, frequencies })
    }

    /// Looks up a receiver antenna by `model`+`radome` (concatenated the way
    /// `TYPE / SERIAL NO` carries it) and, if `serial` is given, requires an
    /// exact serial match; otherwise falls back to the model-only record that
    /// carries no serial number. Restores the cursor to where it started.
    pub fn find_receiver(
        &mut self,
        type_designator: &str,
        serial: Option<&str>,
    ) -> Result<Option<(Antenna, MatchQuality)>, AntexError> {
        let origin = self.position()?;
        self.rewind()?;
        let mut model_only: Option<Antenna> = None;
        loop {
            match self.next_antenna() {
                StreamStatus::Ok(ant)
                    if !ant.is_satellite()
                        && designator(&ant.type_designator).same_model_radome(&designator(type_designator)) =>
                {
                    match (serial, ant.serial()) {
                        (Some(want), Some(have)) if want == have => {
                            self.rewind_to(origin)?;
                            return Ok(Some((ant, MatchQuality::Exact)));
                        },
                        (None, None) => {
                            self.rewind_to(origin)?;
                            return Ok(Some((ant, MatchQuality::Exact)));
                        },
                        (Some(_), None) => model_only = Some(ant),
                        _ => {},
                    }
                },
                StreamStatus::Ok(_) => {},
                StreamStatus::Eof => break,
                StreamStatus::Err(e) => {
                    self.rewind_to(origin)?;
                    return Err(e);
                },
            }
        }
        self.rewind_to(origin)?;
        Ok(model_only.map(|ant| (ant, MatchQuality::ModelOnly)))
    }

    /// Looks up the satellite antenna for `(constellation, prn)` whose
    /// validity window covers `epoch`. Restores the cursor to where it
    /// started.
    pub fn find_satellite(
        &mut self,
        constellation: Constellation,
        prn: u8,
        epoch: Epoch,
    ) -> Result<Option<Antenna>, AntexError> {
        let origin = self.position()?;
        self.rewind()?;
        let result = loop {
            match self.next_antenna() {
                StreamStatus::Ok(ant) => {
                    if let Some(sv) = ant.sv() {
                        if sv.constellation == constellation && sv.prn == prn && ant.covers(epoch) {
                            break Ok(Some(ant));
                        }
                    }
                },
                StreamStatus::Eof => break Ok(None),
                StreamStatus::Err(e) => break Err(e),
            }
        };
        self.rewind_to(origin)?;
        result
    }
}

/// Splits a raw `TYPE / SERIAL NO` type field (model cols 0-15, radome cols
/// 16-20) into a [`ReceiverAntenna`] so model+radome matching goes through
/// the same blank-radome-to-`NONE` normalization every other antenna
/// designator in this data plane uses, instead of comparing padded strings
/// literally.
fn designator(type_field: &str) -> ReceiverAntenna {
    let model = crate::lexer::slice(type_field, 0, 15).unwrap_or("").trim();
    let radome = crate::lexer::slice(type_field, 16, 4).unwrap_or("").trim();
    ReceiverAntenna::new(model, radome, "")
}

/// Parses an ANTEX `VALID FROM`/`VALID UNTIL` content field: 6 whitespace
/// separated `Y M D h m s` values, the same civil fields RINEX epoch lines
/// carry elsewhere in this crate.
fn parse_antex_epoch(body: &str) -> Result<Epoch, AntexError> {
    let tokens: Vec<&str> = body.split_whitespace().collect();
    if tokens.len() < 6 {
        return Err(AntexError::BadHeader(format!("short VALID FROM/UNTIL field: {body:?}")));
    }
    Epoch::parse_rinex_civil(&tokens[0..6], TimeScale::GPST).map_err(AntexError::from)
}
