//! Satellite identity.
use crate::constellation::{Constellation, ParsingError as ConstellationParsingError};
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors raised while identifying a satellite from its RINEX/SP3 textual form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("constellation parsing error: {0}")]
    Constellation(#[from] ConstellationParsingError),
    #[error("PRN parsing error in \"{0}\"")]
    Prn(String),
}

/// A satellite vehicle: constellation tag plus the in-band PRN-like identifier, and
/// optionally the hardware SVN and the satellite antenna model designator.
///
/// The in-band identifier is the number RINEX itself prints: PRN for GPS/BeiDou,
/// slot number for GLONASS, SVID for Galileo, the 1..10-ranged id for QZSS, and the
/// 20..58-ranged id for SBAS. Some global PRN-numbering schemes instead assign QZSS
/// and SBAS satellites PRN 193+ / PRN 120+; `SV::prn` always stores the in-band
/// value RINEX text carries, not that global numbering.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SV {
    /// In-band PRN-like identifier.
    pub prn: u8,
    /// Constellation this vehicle belongs to.
    pub constellation: Constellation,
    /// Hardware Space Vehicle Number, when known (not carried by RINEX itself).
    pub svn: Option<u16>,
}

impl SV {
    pub fn new(constellation: Constellation, prn: u8) -> Self {
        Self {
            prn,
            constellation,
            svn: None,
        }
    }

    pub fn with_svn(mut self, svn: u16) -> Self {
        self.svn = Some(svn);
        self
    }

    /// Parses a RINEX-style `"Gnn"` / `"Rnn"` satellite code: one constellation
    /// letter followed by a (possibly space-padded) two-digit PRN.
    pub fn from_rinex_code(code: &str) -> Result<Self, ParsingError> {
        if code.len() < 2 {
            return Err(ParsingError::Prn(code.to_string()));
        }
        let constellation = Constellation::from_str(&code[0..1])?;
        let prn: u8 = code[1..]
            .trim()
            .parse()
            .map_err(|_| ParsingError::Prn(code.to_string()))?;
        Ok(SV::new(constellation, prn))
    }
}

impl FromStr for SV {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SV::from_rinex_code(s)
    }
}

impl std::fmt::Display for SV {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{:02}", self.constellation.rinex_char(), self.prn)
    }
}
