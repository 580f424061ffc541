//! Observable codes (the RINEX `tna` triplet), per-constellation nominal carrier
//! frequencies, and the `GnssObservable` recipe type.
use crate::constellation::Constellation;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("observable code too short: \"{0}\"")]
    TooShort(String),
    #[error("unknown observable type \"{0}\"")]
    UnknownKind(char),
    #[error("invalid band digit \"{0}\"")]
    BadBand(char),
    #[error("empty recipe: a GnssObservable needs at least one term")]
    EmptyRecipe,
}

/// The physical quantity a raw observable measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObservableKind {
    Pseudorange,
    Phase,
    Doppler,
    SignalStrength,
    IonosphereDelay,
    ChannelNumber,
    /// Wildcard, matches any type during recipe resolution.
    Any,
}

impl ObservableKind {
    pub const fn code(&self) -> char {
        match self {
            Self::Pseudorange => 'C',
            Self::Phase => 'L',
            Self::Doppler => 'D',
            Self::SignalStrength => 'S',
            Self::IonosphereDelay => 'I',
            Self::ChannelNumber => 'X',
            Self::Any => '?',
        }
    }
}

impl TryFrom<char> for ObservableKind {
    type Error = ParsingError;
    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'C' => Ok(Self::Pseudorange),
            'L' => Ok(Self::Phase),
            'D' => Ok(Self::Doppler),
            'S' => Ok(Self::SignalStrength),
            'I' => Ok(Self::IonosphereDelay),
            'X' => Ok(Self::ChannelNumber),
            '?' => Ok(Self::Any),
            other => Err(ParsingError::UnknownKind(other)),
        }
    }
}

/// A `(type, band, attribute)` triplet, e.g. `C1C` (pseudorange, band 1,
/// tracking-mode `C`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observable {
    pub kind: ObservableKind,
    pub band: u8,
    pub attribute: char,
}

impl Observable {
    pub fn new(kind: ObservableKind, band: u8, attribute: char) -> Self {
        Self {
            kind,
            band,
            attribute,
        }
    }
}

impl FromStr for Observable {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.trim().chars().collect();
        if chars.len() < 3 {
            return Err(ParsingError::TooShort(s.to_string()));
        }
        let kind = ObservableKind::try_from(chars[0])?;
        if !chars[1].is_ascii_digit() {
            return Err(ParsingError::BadBand(chars[1]));
        }
        let band = chars[1] as u8 - b'0';
        Ok(Observable::new(kind, band, chars[2]))
    }
}

impl std::fmt::Display for Observable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}{}", self.kind.code(), self.band, self.attribute)
    }
}

lazy_static::lazy_static! {
    /// Nominal per-constellation, per-band carrier frequency in Hz. GLONASS FDMA
    /// bands additionally need a per-satellite channel offset, see
    /// [`glonass_channel_frequency`].
    static ref NOMINAL_FREQUENCY_HZ: HashMap<(Constellation, u8), f64> = {
        let mut m = HashMap::new();
        m.insert((Constellation::GPS, 1), 1575.42e6);
        m.insert((Constellation::GPS, 2), 1227.60e6);
        m.insert((Constellation::GPS, 5), 1176.45e6);
        m.insert((Constellation::Galileo, 1), 1575.42e6);
        m.insert((Constellation::Galileo, 5), 1176.45e6);
        m.insert((Constellation::Galileo, 6), 1278.75e6);
        m.insert((Constellation::Galileo, 7), 1207.140e6);
        m.insert((Constellation::Galileo, 8), 1191.795e6);
        m.insert((Constellation::BeiDou, 1), 1575.42e6);
        m.insert((Constellation::BeiDou, 2), 1561.098e6);
        m.insert((Constellation::BeiDou, 6), 1268.52e6);
        m.insert((Constellation::BeiDou, 7), 1207.14e6);
        m.insert((Constellation::QZSS, 1), 1575.42e6);
        m.insert((Constellation::QZSS, 2), 1227.60e6);
        m.insert((Constellation::QZSS, 5), 1176.45e6);
        m.insert((Constellation::QZSS, 6), 1278.75e6);
        m.insert((Constellation::SBAS, 1), 1575.42e6);
        m.insert((Constellation::SBAS, 5), 1176.45e6);
        // GLONASS centre frequencies; per-satellite FDMA offset applied separately.
        m.insert((Constellation::Glonass, 1), 1602.0e6);
        m.insert((Constellation::Glonass, 2), 1246.0e6);
        m.insert((Constellation::Glonass, 3), 1202.025e6);
        m
    };
}

/// GLONASS FDMA step per band, Hz.
const GLONASS_STEP_HZ: [(u8, f64); 2] = [(1, 0.5625e6), (2, 0.4375e6)];

/// Nominal frequency for a `(constellation, band)` pair, `None` if this data plane
/// has no table entry for it.
pub fn nominal_frequency_hz(constellation: Constellation, band: u8) -> Option<f64> {
    NOMINAL_FREQUENCY_HZ.get(&(constellation, band)).copied()
}

/// GLONASS carrier frequency for a given FDMA channel number `k` (-7..=6 for band 1
/// and 2; `k` is the per-satellite channel offset broadcast in the navigation
/// message / Bernese satellite table). Returns `None` for bands without an FDMA
/// step defined (e.g. the CDMA band 3).
pub fn glonass_channel_frequency(band: u8, k: i8) -> Option<f64> {
    let base = nominal_frequency_hz(Constellation::Glonass, band)?;
    let step = GLONASS_STEP_HZ.iter().find(|(b, _)| *b == band)?.1;
    Some(base + step * k as f64)
}

/// One term of a [`GnssObservable`] recipe: a raw observable code, weighted by a
/// coefficient, tied to one constellation.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservableTerm {
    pub constellation: Constellation,
    pub observable: Observable,
    pub coefficient: f64,
}

/// A non-empty, ordered, coefficient-weighted sum of raw observable codes. Valid
/// only when every term shares one constellation; that invariant is enforced by
/// whoever resolves the recipe against a header (see `rinex::recipe`), not here.
#[derive(Debug, Clone, PartialEq)]
pub struct GnssObservable {
    terms: Vec<ObservableTerm>,
}

impl GnssObservable {
    /// Builds a recipe; `terms` must be non-empty.
    pub fn new(terms: Vec<ObservableTerm>) -> Result<Self, ParsingError> {
        if terms.is_empty() {
            return Err(ParsingError::EmptyRecipe);
        }
        Ok(Self { terms })
    }

    /// Single-term recipe shortcut, e.g. a raw `C1C` observation read as-is.
    pub fn single(constellation: Constellation, observable: Observable, coefficient: f64) -> Self {
        Self {
            terms: vec![ObservableTerm {
                constellation,
                observable,
                coefficient,
            }],
        }
    }

    pub fn terms(&self) -> &[ObservableTerm] {
        &self.terms
    }

    /// `true` when every term shares one constellation.
    pub fn is_single_constellation(&self) -> bool {
        let first = self.terms[0].constellation;
        self.terms.iter().all(|t| t.constellation == first)
    }

    /// The constellation shared by all terms, if [`is_single_constellation`] holds.
    pub fn constellation(&self) -> Option<Constellation> {
        self.is_single_constellation()
            .then(|| self.terms[0].constellation)
    }

    /// Coefficient-weighted sum of the underlying raw readings. `values` must be
    /// aligned with `terms()` (one value per term, in order). The missing sentinel
    /// short-circuits: if any aligned value equals `sentinel`, the whole sum is
    /// `sentinel`.
    pub fn combine(&self, values: &[f64], sentinel: f64) -> f64 {
        debug_assert_eq!(values.len(), self.terms.len());
        if values.iter().any(|v| *v == sentinel) {
            return sentinel;
        }
        self.terms
            .iter()
            .zip(values.iter())
            .map(|(term, value)| term.coefficient * value)
            .sum()
    }

    /// Coefficient-weighted sum of term frequencies, `None` if any term's
    /// frequency is undefined (e.g. unknown band for that constellation, or a
    /// GLONASS term whose FDMA channel wasn't supplied).
    pub fn frequency_hz(&self, glonass_channel: Option<i8>) -> Option<f64> {
        let mut total = 0.0;
        for term in &self.terms {
            let f = if term.constellation == Constellation::Glonass {
                glonass_channel_frequency(term.observable.band, glonass_channel?)?
            } else {
                nominal_frequency_hz(term.constellation, term.observable.band)?
            };
            total += term.coefficient * f;
        }
        Some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_triplet() {
        let obs: Observable = "C1C".parse().unwrap();
        assert_eq!(obs.kind, ObservableKind::Pseudorange);
        assert_eq!(obs.band, 1);
        assert_eq!(obs.attribute, 'C');
        assert_eq!(obs.to_string(), "C1C");
    }

    #[test]
    fn rejects_short_or_bad_band() {
        assert!(Observable::from_str("C1").is_err());
        assert!(Observable::from_str("CXC").is_err());
    }

    #[test]
    fn missing_sentinel_short_circuits_combination() {
        let c1c = Observable::new(ObservableKind::Pseudorange, 1, 'C');
        let c2w = Observable::new(ObservableKind::Pseudorange, 2, 'W');
        let recipe = GnssObservable::new(vec![
            ObservableTerm {
                constellation: Constellation::GPS,
                observable: c1c,
                coefficient: 2.5457,
            },
            ObservableTerm {
                constellation: Constellation::GPS,
                observable: c2w,
                coefficient: -1.5457,
            },
        ])
        .unwrap();

        let value = recipe.combine(&[20_000_000.0, -999.99], -999.99);
        assert_eq!(value, -999.99);

        let value = recipe.combine(&[20_000_000.0, 20_000_100.0], -999.99);
        assert!(value.is_finite());
    }

    #[test]
    fn glonass_channel_frequency_steps() {
        let k0 = glonass_channel_frequency(1, 0).unwrap();
        let k1 = glonass_channel_frequency(1, 1).unwrap();
        assert!((k1 - k0 - 0.5625e6).abs() < 1.0);
    }

    #[test]
    fn rejects_empty_recipe() {
        assert!(matches!(
            GnssObservable::new(vec![]),
            Err(ParsingError::EmptyRecipe)
        ));
    }

    #[test]
    fn single_constellation_detection() {
        let a = ObservableTerm {
            constellation: Constellation::GPS,
            observable: Observable::new(ObservableKind::Pseudorange, 1, 'C'),
            coefficient: 1.0,
        };
        let b = ObservableTerm {
            constellation: Constellation::Galileo,
            observable: Observable::new(ObservableKind::Pseudorange, 1, 'C'),
            coefficient: 1.0,
        };
        let mixed = GnssObservable::new(vec![a, b]).unwrap();
        assert!(!mixed.is_single_constellation());
        assert_eq!(mixed.constellation(), None);
    }
}
