//! Epoch header and satellite-record parsing for the observation stream.
use super::ObservationError;
use crate::lexer;
use crate::recipe::RecipePlan;
use gnss_core::prelude::{Epoch, SV};
use hifitime::TimeScale;
use std::str::FromStr;

/// Sampling-condition flag carried by every RINEX-Obs epoch header. Values `2..=5`
/// mark event-only records (the body, if any, isn't a normal satellite block);
/// `6` marks a cycle-slip record. Anything `>= 7` is reserved by the format but is
/// still surfaced, never discarded, so a caller parsing a future revision notices
/// it instead of silently treating it as `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EpochFlag {
    Ok,
    PowerFailure,
    AntennaBeingMoved,
    NewSiteOccupation,
    HeaderInformationFollows,
    ExternalEvent,
    CycleSlip,
    Reserved(u8),
}

impl EpochFlag {
    pub fn code(&self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::PowerFailure => 1,
            Self::AntennaBeingMoved => 2,
            Self::NewSiteOccupation => 3,
            Self::HeaderInformationFollows => 4,
            Self::ExternalEvent => 5,
            Self::CycleSlip => 6,
            Self::Reserved(v) => *v,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// `true` for flags `2..=5`: the record carries no normal satellite body, just
    /// an event marker (and possibly `HEADER INFORMATION FOLLOWS` lines).
    pub fn is_event(&self) -> bool {
        matches!(
            self,
            Self::AntennaBeingMoved
                | Self::NewSiteOccupation
                | Self::HeaderInformationFollows
                | Self::ExternalEvent
        )
    }
}

impl From<u8> for EpochFlag {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Ok,
            1 => Self::PowerFailure,
            2 => Self::AntennaBeingMoved,
            3 => Self::NewSiteOccupation,
            4 => Self::HeaderInformationFollows,
            5 => Self::ExternalEvent,
            6 => Self::CycleSlip,
            other => Self::Reserved(other),
        }
    }
}

impl FromStr for EpochFlag {
    type Err = ObservationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map(EpochFlag::from)
            .map_err(|_| ObservationError::BadEpochLine(s.to_string()))
    }
}

/// One recipe-resolved value: the coefficient-weighted sum described in the
/// recipe plan, plus the loss-of-lock/signal-strength quality flags of the
/// raw column it came from. Those flags are only carried through for
/// single-term recipes (the common case, e.g. a bare pseudorange); a
/// multi-term combination (e.g. an ionosphere-free combo) has no single raw
/// column the flags could describe, so `lli`/`ssi` are `None` there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub value: f64,
    pub lli: Option<u8>,
    pub ssi: Option<u8>,
}

/// One resolved observation epoch: timestamp, sampling flag, the receiver clock
/// offset if the epoch header carried one, and one resolved-value vector per
/// satellite (aligned with the plans `RecipePlan::plans_for` returns for that
/// satellite's constellation).
#[derive(Debug, Clone, PartialEq)]
pub struct ObsEpoch {
    pub epoch: Epoch,
    pub flag: EpochFlag,
    pub clock_offset: Option<f64>,
    pub satellites: Vec<(SV, Vec<RawSample>)>,
}

/// Epoch header parsed, body not yet read.
pub(crate) struct PartialEpoch {
    pub epoch: ObsEpoch,
    pub nsat: u16,
}

/// Parses the `'>' YYYY MM DD hh mm ss.sssssss  flag  nsat  [clock_offset]` line.
pub(crate) fn parse_epoch_header(line: &str, ts: TimeScale) -> Result<PartialEpoch, ObservationError> {
    let body = line
        .strip_prefix('>')
        .ok_or_else(|| ObservationError::BadEpochLine(line.to_string()))?;

    if body.len() < 29 {
        return Err(ObservationError::BadEpochLine(line.to_string()));
    }

    let fields: Vec<&str> = body[0..26]
        .split_whitespace()
        .collect();
    let epoch = Epoch::parse_rinex_civil(&fields, ts)?;

    let flag_field = lexer::slice(body, 26, 3).ok_or_else(|| ObservationError::BadEpochLine(line.to_string()))?;
    let flag = EpochFlag::from_str(flag_field)?;

    let nsat_field = lexer::slice(body, 29, 3).ok_or(ObservationError::BadSatCount)?;
    let nsat: u16 = nsat_field
        .trim()
        .parse()
        .map_err(|_| ObservationError::BadSatCount)?;

    let clock_offset = lexer::slice(body, 32, 15)
        .and_then(|f| lexer::parse_f64_or_missing(f).ok().flatten());

    Ok(PartialEpoch {
        epoch: ObsEpoch {
            epoch,
            flag,
            clock_offset,
            satellites: Vec::new(),
        },
        nsat,
    })
}

/// Parses one satellite record line against `plan`. Returns `None` when the
/// satellite's constellation has no surviving recipe (a known-but-uninteresting
/// satellite is silently skipped, per contract).
pub(crate) fn parse_satellite_line(
    line: &str,
    plan: &RecipePlan,
    sentinel: f64,
) -> Option<(SV, Vec<RawSample>)> {
    let code = lexer::slice(line, 0, 3)?;
    let sv = SV::from_rinex_code(code).ok()?;

    let plans = plan.plans_for(sv.constellation);
    if plans.is_empty() {
        return None;
    }

    let values: Vec<RawSample> = plans
        .iter()
        .map(|recipe_terms| combine_terms(line, recipe_terms, sentinel))
        .collect();

    Some((sv, values))
}

/// Column offset of the single raw character following a 14-wide value field
/// that carries the loss-of-lock indicator; the signal-strength indicator is
/// the character right after that.
const LLI_OFFSET: usize = 14;
const SSI_OFFSET: usize = 15;

fn parse_flag_digit(line: &str, start: usize, offset: usize) -> Option<u8> {
    lexer::slice(line, start + offset, 1)?.trim().parse().ok()
}

fn combine_terms(line: &str, terms: &[(usize, f64)], sentinel: f64) -> RawSample {
    let mut total = 0.0;
    let mut single_term_flags = None;
    for (col, coefficient) in terms {
        let start = 3 + col * 16;
        let value = lexer::slice(line, start, 14)
            .filter(|f| !lexer::is_blank(f))
            .and_then(|f| lexer::parse_f64(f).ok());
        match value {
            Some(v) => {
                total += coefficient * v;
                if terms.len() == 1 {
                    single_term_flags = Some((
                        parse_flag_digit(line, start, LLI_OFFSET),
                        parse_flag_digit(line, start, SSI_OFFSET),
                    ));
                }
            },
            None => {
                return RawSample { value: sentinel, lli: None, ssi: None };
            },
        }
    }
    let (lli, ssi) = single_term_flags.unwrap_or((None, None));
    RawSample { value: total, lli, ssi }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::RecipePlan;
    use gnss_core::prelude::Constellation;
    use std::collections::HashMap;

    #[test]
    fn parses_epoch_header_line() {
        let line = "> 2018 11 04 00 00  0.0000000  0 24       -0.123456789012";
        let partial = parse_epoch_header(line, TimeScale::GPST).unwrap();
        assert_eq!(partial.nsat, 24);
        assert_eq!(partial.epoch.flag, EpochFlag::Ok);
        assert!(partial.epoch.clock_offset.is_some());
    }

    #[test]
    fn rejects_missing_leading_marker() {
        let line = "2018 11 04 00 00  0.0000000  0 24";
        assert!(parse_epoch_header(line, TimeScale::GPST).is_err());
    }

    #[test]
    fn event_flags_are_recognized() {
        assert!(EpochFlag::from(4).is_event());
        assert!(!EpochFlag::from(6).is_event());
        assert_eq!(EpochFlag::from(9), EpochFlag::Reserved(9));
    }

    fn fake_plan() -> RecipePlan {
        let mut user_map = HashMap::new();
        user_map.insert(
            Constellation::GPS,
            vec![gnss_core::prelude::GnssObservable::single(
                Constellation::GPS,
                gnss_core::prelude::Observable::new(
                    gnss_core::prelude::ObservableKind::Pseudorange,
                    1,
                    'C',
                ),
                1.0,
            )],
        );
        let mut header_codes = HashMap::new();
        header_codes.insert(
            Constellation::GPS,
            vec![gnss_core::prelude::Observable::new(
                gnss_core::prelude::ObservableKind::Pseudorange,
                1,
                'C',
            )],
        );
        crate::recipe::resolve(
            &mut user_map,
            &header_codes,
            crate::recipe::RecipeOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn parses_satellite_line_with_sentinel_on_blank() {
        let plan = fake_plan();
        let line = format!("G01{}", " ".repeat(16));
        let (sv, values) = parse_satellite_line(&line, &plan, -999.99).unwrap();
        assert_eq!(sv, SV::new(Constellation::GPS, 1));
        assert_eq!(values[0].value, -999.99);
        assert!(values[0].lli.is_none());
    }

    #[test]
    fn single_term_recipe_carries_lli_and_ssi() {
        let plan = fake_plan();
        let line = format!("G01{:>14.3}54{}", 20_123_456.789, " ".repeat(0));
        let (_, values) = parse_satellite_line(&line, &plan, -999.99).unwrap();
        assert_eq!(values[0].lli, Some(5));
        assert_eq!(values[0].ssi, Some(4));
    }

    #[test]
    fn unknown_constellation_returns_none() {
        let plan = fake_plan();
        let line = format!("R01{}", " ".repeat(16));
        assert!(parse_satellite_line(&line, &plan, -999.99).is_none());
    }
}
