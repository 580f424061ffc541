//! GNSS constellation tags.
use hifitime::TimeScale;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Constellation parsing related errors.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ParsingError {
    #[error("unknown constellation \"{0}\"")]
    Unknown(String),
}

/// The eight constellation tags this data plane recognizes.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Constellation {
    /// American constellation.
    #[default]
    GPS,
    /// Russian constellation.
    Glonass,
    /// European constellation.
    Galileo,
    /// Augmentation systems, reported generically (RINEX does not distinguish
    /// WAAS/EGNOS/MSAS/etc in the observation/navigation record header).
    SBAS,
    /// Chinese constellation.
    BeiDou,
    /// Japanese constellation.
    QZSS,
    /// Indian constellation, also known as NavIC.
    IRNSS,
    /// Mixed-constellation file (RINEX `SYS = M`).
    Mixed,
}

impl Constellation {
    /// True for the augmentation-system tag.
    pub fn is_sbas(&self) -> bool {
        matches!(self, Self::SBAS)
    }

    /// True for the catch-all multi-constellation tag.
    pub fn is_mixed(&self) -> bool {
        matches!(self, Self::Mixed)
    }

    /// Native broadcast time scale for this constellation's navigation messages.
    /// `None` for tags with no navigation message of their own (SBAS messages are
    /// expressed in GPS time; `Mixed` has none at all).
    pub fn timescale(&self) -> Option<TimeScale> {
        match self {
            Self::GPS | Self::QZSS => Some(TimeScale::GPST),
            Self::Galileo => Some(TimeScale::GST),
            Self::BeiDou => Some(TimeScale::BDT),
            // GLONASS broadcasts the message-frame-time in UTC; the evaluator
            // converts internally (see rinex::navigation::glonass).
            Self::Glonass => Some(TimeScale::UTC),
            Self::SBAS => Some(TimeScale::GPST),
            Self::IRNSS | Self::Mixed => None,
        }
    }

    /// Single-character RINEX system identifier, as used in `SYS / # / OBS TYPES`
    /// and observation/navigation record lines.
    pub const fn rinex_char(&self) -> char {
        match self {
            Self::GPS => 'G',
            Self::Glonass => 'R',
            Self::SBAS => 'S',
            Self::Galileo => 'E',
            Self::BeiDou => 'C',
            Self::QZSS => 'J',
            Self::IRNSS => 'I',
            Self::Mixed => 'M',
        }
    }
}

impl std::str::FromStr for Constellation {
    type Err = ParsingError;
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let s = string.trim();
        match s {
            "G" | "g" | "GPS" | "gps" => Ok(Self::GPS),
            "R" | "r" | "GLO" | "glo" | "GLONASS" | "glonass" => Ok(Self::Glonass),
            "E" | "e" | "GAL" | "gal" | "Galileo" | "galileo" => Ok(Self::Galileo),
            "C" | "c" | "BDS" | "bds" | "BeiDou" | "beidou" => Ok(Self::BeiDou),
            "J" | "j" | "QZSS" | "qzss" => Ok(Self::QZSS),
            "I" | "i" | "IRNSS" | "irnss" | "NavIC" | "navic" => Ok(Self::IRNSS),
            "S" | "s" | "SBAS" | "sbas" => Ok(Self::SBAS),
            "M" | "m" | "Mixed" | "mixed" => Ok(Self::Mixed),
            _ => Err(ParsingError::Unknown(string.to_string())),
        }
    }
}

impl std::fmt::Display for Constellation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.rinex_char())
    }
}

impl std::fmt::LowerHex for Constellation {
    /// `{:x}` prints the single standard RINEX letter.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.rinex_char())
    }
}

impl std::fmt::UpperHex for Constellation {
    /// `{:X}` prints the 3-4 letter mnemonic.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::GPS => write!(f, "GPS"),
            Self::Glonass => write!(f, "GLO"),
            Self::Galileo => write!(f, "GAL"),
            Self::BeiDou => write!(f, "BDS"),
            Self::QZSS => write!(f, "QZSS"),
            Self::IRNSS => write!(f, "IRNSS"),
            Self::SBAS => write!(f, "SBAS"),
            Self::Mixed => write!(f, "MIXED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn from_str_single_char() {
        for (desc, expected) in [
            ("G", Constellation::GPS),
            ("R", Constellation::Glonass),
            ("E", Constellation::Galileo),
            ("C", Constellation::BeiDou),
            ("J", Constellation::QZSS),
            ("I", Constellation::IRNSS),
            ("S", Constellation::SBAS),
            ("M", Constellation::Mixed),
        ] {
            assert_eq!(Constellation::from_str(desc).unwrap(), expected, "{desc}");
            assert_eq!(expected.rinex_char().to_string(), desc);
        }
    }

    #[test]
    fn rejects_unknown() {
        for bad in ["X", "gpx", "", "unknown"] {
            assert!(Constellation::from_str(bad).is_err());
        }
    }

    #[test]
    fn timescale_mapping() {
        assert_eq!(Constellation::GPS.timescale(), Some(TimeScale::GPST));
        assert_eq!(Constellation::Galileo.timescale(), Some(TimeScale::GST));
        assert_eq!(Constellation::BeiDou.timescale(), Some(TimeScale::BDT));
        assert_eq!(Constellation::IRNSS.timescale(), None);
    }

    #[test]
    fn display_roundtrip() {
        for c in [
            Constellation::GPS,
            Constellation::Glonass,
            Constellation::Galileo,
            Constellation::SBAS,
            Constellation::BeiDou,
            Constellation::QZSS,
            Constellation::IRNSS,
            Constellation::Mixed,
        ] {
            let printed = format!("{}", c);
            assert_eq!(Constellation::from_str(&printed).unwrap(), c);
        }
    }
}
