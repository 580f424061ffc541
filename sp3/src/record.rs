//! Per-epoch position/velocity/clock records: the `*` epoch line and its
//! following `P`/`V` satellite entry lines.
use crate::error::Sp3Error;
use gnss_core::prelude::{Epoch, SV};
use std::io::BufRead;

bitflags::bitflags! {
    /// Per-entry status bits: missing position/clock sentinels, clock
    /// events, maneuvers, and orbit predictions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EntryFlags: u8 {
        const MISSING_POSITION  = 0b0000_0001;
        const MISSING_CLOCK     = 0b0000_0010;
        const CLOCK_EVENT       = 0b0000_0100;
        const CLOCK_PREDICTION  = 0b0000_1000;
        const MANEUVER          = 0b0001_0000;
        const ORBIT_PREDICTION  = 0b0010_0000;
    }
}

/// Clock value at or beyond this magnitude (microseconds) marks a missing
/// clock reading rather than a real one.
pub const MISSING_CLOCK_SENTINEL_US: f64 = 999_999.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sp3Entry {
    pub sv: SV,
    pub position_m: [f64; 3],
    pub clock_us: Option<f64>,
    pub velocity_m_s: Option<[f64; 3]>,
    pub clock_drift_us_per_s: Option<f64>,
    pub flags: EntryFlags,
}

fn field(line: &str, start: usize, end: usize) -> Option<&str> {
    crate::lexer::slice(line, start, end.saturating_sub(start))
}

fn parse_km(line: &str, start: usize) -> Result<f64, Sp3Error> {
    field(line, start, start + 14)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .and_then(|f| f.parse::<f64>().ok())
        .ok_or_else(|| Sp3Error::BadPositionLine(line.to_string()))
}

/// Parses the `*  YYYY MM DD hh mm ss.ssssssss` epoch header line.
pub fn parse_epoch_line(line: &str) -> Result<Epoch, Sp3Error> {
    let bad = || Sp3Error::BadEpochLine(line.to_string());
    if !line.starts_with('*') {
        return Err(bad());
    }
    let rest = field(line, 3, line.len()).ok_or_else(bad)?;
    let year = field(rest, 0, 4).ok_or_else(bad)?;
    let month = field(rest, 4, 7).ok_or_else(bad)?;
    let day = field(rest, 7, 10).ok_or_else(bad)?;
    let hour = field(rest, 10, 13).ok_or_else(bad)?;
    let minute = field(rest, 13, 16).ok_or_else(bad)?;
    let sec_and_fraction = field(rest, 16, 27).ok_or_else(bad)?;
    Epoch::parse_rinex_civil(&[year, month, day, hour, minute, sec_and_fraction], hifitime::TimeScale::UTC)
        .map_err(|_| bad())
}

/// Parses a `P` position/clock entry line.
pub fn parse_position_entry(line: &str) -> Result<Sp3Entry, Sp3Error> {
    let bad_sv = || Sp3Error::BadSatelliteCode(line.to_string());
    let code = field(line, 1, 4).ok_or_else(bad_sv)?;
    let sv = SV::from_rinex_code(code).map_err(|_| bad_sv())?;

    let x_km = parse_km(line, 4)?;
    let y_km = parse_km(line, 18)?;
    let z_km = parse_km(line, 32)?;
    let position_m = [x_km * 1000.0, y_km * 1000.0, z_km * 1000.0];

    let mut flags = EntryFlags::empty();
    if x_km == 0.0 && y_km == 0.0 && z_km == 0.0 {
        flags |= EntryFlags::MISSING_POSITION;
    }

    let clock_field = field(line, 46, 60).map(str::trim).unwrap_or("");
    let clock_us = if clock_field.is_empty() || clock_field.starts_with("999999.") {
        flags |= EntryFlags::MISSING_CLOCK;
        None
    } else {
        let value: f64 = clock_field.parse().map_err(|_| Sp3Error::BadPositionLine(line.to_string()))?;
        if value.abs() >= MISSING_CLOCK_SENTINEL_US {
            flags |= EntryFlags::MISSING_CLOCK;
            None
        } else {
            Some(value)
        }
    };

    if field(line, 74, 75) == Some("E") {
        flags |= EntryFlags::CLOCK_EVENT;
    }
    if field(line, 75, 76) == Some("P") {
        flags |= EntryFlags::CLOCK_PREDICTION;
    }
    if field(line, 78, 79) == Some("M") {
        flags |= EntryFlags::MANEUVER;
    }
    if field(line, 79, 80) == Some("P") {
        flags |= EntryFlags::ORBIT_PREDICTION;
    }

    Ok(Sp3Entry {
        sv,
        position_m,
        clock_us,
        velocity_m_s: None,
        clock_drift_us_per_s: None,
        flags,
    })
}

/// Parses a `V` velocity/clock-drift entry line, returning the owning SV and
/// the velocity/drift pair to be merged into that SV's position entry for
/// the same epoch.
pub fn parse_velocity_entry(line: &str) -> Result<(SV, [f64; 3], Option<f64>), Sp3Error> {
    let bad_sv = || Sp3Error::BadSatelliteCode(line.to_string());
    let code = field(line, 1, 4).ok_or_else(bad_sv)?;
    let sv = SV::from_rinex_code(code).map_err(|_| bad_sv())?;

    let bad = || Sp3Error::BadVelocityLine(line.to_string());
    let vx_raw = field(line, 4, 18).map(str::trim).filter(|f| !f.is_empty()).ok_or_else(bad)?;
    let vy_raw = field(line, 18, 32).map(str::trim).filter(|f| !f.is_empty()).ok_or_else(bad)?;
    let vz_raw = field(line, 32, 46).map(str::trim).filter(|f| !f.is_empty()).ok_or_else(bad)?;
    let vx_raw: f64 = vx_raw.parse().map_err(|_| bad())?;
    let vy_raw: f64 = vy_raw.parse().map_err(|_| bad())?;
    let vz_raw: f64 = vz_raw.parse().map_err(|_| bad())?;
    // raw units are 0.1 mm/s (1.0e-4 km/s); * 1.0e-1 -> m/s.
    let velocity_m_s = [vx_raw * 1.0e-1, vy_raw * 1.0e-1, vz_raw * 1.0e-1];

    let drift_field = field(line, 46, 60).map(str::trim).unwrap_or("");
    let clock_drift_us_per_s = if drift_field.is_empty() || drift_field.starts_with("999999.") {
        None
    } else {
        let raw: f64 = drift_field.parse().map_err(|_| bad())?;
        Some(raw * 1.0e-4)
    };

    Ok((sv, velocity_m_s, clock_drift_us_per_s))
}

pub(crate) fn read_line<R: BufRead>(source: &mut R) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    let n = source.read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_epoch_line() {
        let epoch = parse_epoch_line("*  1980  1  6  0  0  0.00000000").unwrap();
        let (week, sow) = epoch.gpst_week_sow();
        assert_eq!(week, 0);
        assert_eq!(sow, 0.0);
    }

    #[test]
    fn parses_position_entry_with_clock() {
        let line = "PG01  -9330.448002 -15629.455741 -19611.553003    123.456789";
        let entry = parse_position_entry(line).unwrap();
        assert_eq!(entry.sv, SV::new(gnss_core::prelude::Constellation::GPS, 1));
        assert!((entry.position_m[0] - (-9330.448002 * 1000.0)).abs() < 1.0e-6);
        assert_eq!(entry.clock_us, Some(123.456789));
        assert!(!entry.flags.contains(EntryFlags::MISSING_CLOCK));
        assert!(!entry.flags.contains(EntryFlags::MISSING_POSITION));
    }

    #[test]
    fn missing_clock_sentinel_sets_flag() {
        let line = "PG01  -9330.448002 -15629.455741 -19611.553003 999999.999999";
        let entry = parse_position_entry(line).unwrap();
        assert!(entry.flags.contains(EntryFlags::MISSING_CLOCK));
        assert_eq!(entry.clock_us, None);
    }

    #[test]
    fn zero_position_sets_missing_flag() {
        let line = "PG01      0.000000      0.000000      0.000000 999999.999999";
        let entry = parse_position_entry(line).unwrap();
        assert!(entry.flags.contains(EntryFlags::MISSING_POSITION));
    }

    #[test]
    fn velocity_axes_do_not_swap() {
        let line = "VG01    100.000000    200.000000    300.000000      1.000000";
        let (sv, velocity, drift) = parse_velocity_entry(line).unwrap();
        assert_eq!(sv, SV::new(gnss_core::prelude::Constellation::GPS, 1));
        assert!((velocity[0] - 100.0 * 1.0e-1).abs() < 1.0e-9);
        assert!((velocity[1] - 200.0 * 1.0e-1).abs() < 1.0e-9);
        assert!((velocity[2] - 300.0 * 1.0e-1).abs() < 1.0e-9);
        assert_eq!(drift, Some(1.0 * 1.0e-4));
    }
}
