//! Error taxonomy for header validation and stream-time record parsing.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Sp3Error {
    #[error("malformed header line #1: \"{0}\"")]
    BadLine1(String),
    #[error("malformed header line #2: \"{0}\"")]
    BadLine2(String),
    #[error("unsupported SP3 revision: {0}")]
    UnsupportedVersion(#[from] crate::version::UnsupportedVersion),
    #[error("start epoch does not agree with the ## line's GPS-week/SoW and MJD fields")]
    StartEpochMismatch,
    #[error("malformed satellite-id or accuracy block line: \"{0}\"")]
    BadSatelliteBlock(String),
    #[error("malformed %c descriptor line: \"{0}\"")]
    BadDescriptor(String),
    #[error("unrecognized constellation code: {0}")]
    BadConstellation(#[from] gnss_core::constellation::ParsingError),
    #[error("invalid epoch timestamp: {0}")]
    BadTimestamp(#[from] gnss_core::epoch::Error),
    #[error("malformed epoch header line: \"{0}\"")]
    BadEpochLine(String),
    #[error("unrecognized satellite code in \"{0}\"")]
    BadSatelliteCode(String),
    #[error("malformed position/clock fields in \"{0}\"")]
    BadPositionLine(String),
    #[error("malformed velocity fields in \"{0}\"")]
    BadVelocityLine(String),
    #[error("number parse error: {0}")]
    NumberParse(#[from] crate::lexer::Error),
    #[error("unexpected end of file")]
    UnexpectedEof,
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Sp3Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
