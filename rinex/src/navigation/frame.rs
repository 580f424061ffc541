//! The per-constellation broadcast navigation message, and the fixed-width block
//! parsing that turns raw RINEX-Nav lines into it.
use super::NavigationError;
use crate::lexer;
use gnss_core::prelude::{Constellation, Epoch, SV};
use hifitime::TimeScale;

/// Number of physical lines a Keplerian-constellation record occupies (the epoch
/// line plus seven `4 x D19.12` continuation lines).
pub const KEPLERIAN_BLOCK_LINES: usize = 8;
/// Number of physical lines a GLONASS or SBAS record occupies.
pub const STATE_VECTOR_BLOCK_LINES: usize = 4;

/// One parsed broadcast navigation message. The Keplerian and state-vector
/// (GLONASS/SBAS) layouts carry different fields entirely, so this is a tagged
/// union rather than one struct with unused fields.
#[derive(Debug, Clone, PartialEq)]
pub enum NavFrame {
    Keplerian(KeplerianFrame),
    Glonass(GlonassFrame),
    /// SBAS broadcasts a state vector like GLONASS, but this data plane has no
    /// propagation model for it (SBAS messages are normally used as-is, not
    /// integrated); the frame is still surfaced for callers who only need the
    /// raw clock/position fields.
    Geo(GeoFrame),
}

impl NavFrame {
    pub fn sv(&self) -> SV {
        match self {
            Self::Keplerian(f) => f.sv,
            Self::Glonass(f) => f.sv,
            Self::Geo(f) => f.sv,
        }
    }

    pub fn constellation(&self) -> Constellation {
        self.sv().constellation
    }

    pub fn toc(&self) -> Epoch {
        match self {
            Self::Keplerian(f) => f.toc,
            Self::Glonass(f) => f.toc,
            Self::Geo(f) => f.toc,
        }
    }
}

/// GPS, Galileo, BeiDou, QZSS and IRNSS all broadcast this same Keplerian element
/// set (modulo which of `tgd`/`tgd2` is populated).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerianFrame {
    pub sv: SV,
    pub toc: Epoch,
    pub clock_bias: f64,
    pub clock_drift: f64,
    pub clock_drift_rate: f64,
    pub iode: f64,
    pub crs: f64,
    pub delta_n: f64,
    pub m0: f64,
    pub cuc: f64,
    pub e: f64,
    pub cus: f64,
    pub sqrt_a: f64,
    /// Time of ephemeris, seconds of the broadcast week (raw field, used for the
    /// `OMEGA0` earth-rotation correction).
    pub toe_sow: f64,
    pub toe: Epoch,
    pub cic: f64,
    pub raan0: f64,
    pub cis: f64,
    pub i0: f64,
    pub crc: f64,
    pub arg_perigee: f64,
    pub raan_dot: f64,
    pub idot: f64,
    pub week: f64,
    pub ura_index: f64,
    pub health: f64,
    pub tgd: f64,
    /// Second group delay term: BeiDou's `TGD2`, Galileo's `BGD(E5b)`. Zero /
    /// unused for GPS, QZSS, IRNSS.
    pub tgd2: f64,
    pub iodc: f64,
    pub transmission_time: f64,
    pub fit_interval_hours: f64,
}

/// GLONASS's broadcast state vector: an ECEF position/velocity/luni-solar
/// acceleration triple at `toe`, plus the linear clock model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlonassFrame {
    pub sv: SV,
    pub toc: Epoch,
    /// `-TauN`, as broadcast (RINEX already carries the sign-flipped value).
    pub clock_bias: f64,
    pub gamma_n: f64,
    /// Message frame time, raw seconds-of-UTC-week field (`tk + nd*86400`).
    pub message_frame_time_sow: f64,
    pub toe: Epoch,
    /// Position, meters, PZ-90 ECEF.
    pub pos: [f64; 3],
    /// Velocity, meters/second.
    pub vel: [f64; 3],
    /// Luni-solar acceleration, meters/second^2.
    pub acc: [f64; 3],
    pub health: f64,
    pub freq_num: f64,
    pub age_days: f64,
}

/// SBAS/GEO broadcast state vector. Same physical shape as GLONASS's but in
/// WGS84/ITRF and with no orbit-propagation model in this crate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFrame {
    pub sv: SV,
    pub toc: Epoch,
    pub clock_bias: f64,
    pub clock_drift_rate: f64,
    pub message_frame_time_sow: f64,
    pub pos: [f64; 3],
    pub vel: [f64; 3],
    pub acc: [f64; 3],
    pub health: f64,
    pub ura_index: f64,
    pub iodn: f64,
}

/// Parses the leading `"Snn yyyy mm dd hh mm ss"` epoch line shared by every
/// constellation's record, plus the three clock-polynomial fields that follow it
/// on the same line. The date runs cols 3..23 (space-delimited within that span);
/// the clock fields are glued directly onto it and onto each other with no
/// separating space when negative, so they're read as fixed-width `D19.12`
/// columns at 23/42/61 rather than split on whitespace.
fn parse_epoch_line(line: &str, ts: TimeScale) -> Result<(SV, Epoch, [f64; 3]), NavigationError> {
    let code = lexer::slice(line, 0, 3).ok_or_else(|| NavigationError::UnexpectedEof)?;
    let sv = SV::from_rinex_code(code).map_err(|_| NavigationError::BadSatsysByte(code.to_string()))?;

    let date_field = lexer::slice(line, 3, 20).ok_or_else(|| NavigationError::UnexpectedEof)?;
    let tokens: Vec<&str> = date_field.split_whitespace().collect();
    if tokens.len() < 6 {
        return Err(NavigationError::UnexpectedEof);
    }
    let epoch = Epoch::parse_rinex_civil(&tokens[0..6], ts)?;

    let mut clock = [0.0; 3];
    for (i, slot) in clock.iter_mut().enumerate() {
        let field = lexer::slice(line, 23 + i * 19, 19).ok_or_else(|| NavigationError::UnexpectedEof)?;
        *slot = lexer::parse_f64(field)?;
    }
    Ok((sv, epoch, clock))
}

/// Extracts up to 4 `D19.12` fields from a continuation line, 3 leading columns
/// reserved for the (blank, on continuation lines) satellite field.
fn orbit_line(line: &str) -> [f64; 4] {
    let values = lexer::columns_or_sentinel(line, 3, 19, 4, f64::NAN);
    [values[0], values[1], values[2], values[3]]
}

/// Parses an 8-line GPS/Galileo/BeiDou/QZSS/IRNSS record into its raw field
/// array, normalizing the Galileo/BeiDou 5th-line 3-value short row to the same
/// 4-wide shape (last slot left as `NAN`, unused by any Keplerian field at that
/// position).
pub(crate) fn parse_keplerian(lines: &[&str], ts: TimeScale) -> Result<NavFrame, NavigationError> {
    if lines.len() < KEPLERIAN_BLOCK_LINES {
        return Err(NavigationError::UnexpectedEof);
    }
    let (sv, toc, clock) = parse_epoch_line(lines[0], ts)?;

    let l1 = orbit_line(lines[1]);
    let l2 = orbit_line(lines[2]);
    let l3 = orbit_line(lines[3]);
    let l4 = orbit_line(lines[4]);
    let l5 = orbit_line(lines[5]);
    let l6 = orbit_line(lines[6]);
    let l7 = orbit_line(lines[7]);

    let toe_sow = l3[0];
    let week = l5[2];
    let toe_ts = sv.constellation.timescale().unwrap_or(ts);
    let toe = Epoch::from_gregorian(1980, 1, 6, 0, 0, 0, 0, toe_ts) + gps_week_sow_duration(week, toe_sow);

    // The 6th and 7th broadcast-orbit lines carry different fields per
    // constellation: GPS/QZSS/IRNSS put IODC and a broadcast fit interval where
    // Galileo puts a second BGD and nothing, and BeiDou puts AODC where GPS puts
    // the fit interval. Nominal fit intervals for the constellations that don't
    // broadcast one come from each ICD's published ephemeris validity window.
    let (tgd, tgd2, iodc, fit_interval_hours) = match sv.constellation {
        Constellation::Galileo => (l6[2], l6[3], l1[0], 4.0),
        Constellation::BeiDou => (l6[2], l6[3], l7[1], 1.0),
        Constellation::IRNSS => (l6[2], 0.0, l6[3], 2.0),
        _ => (l6[2], 0.0, l6[3], if l7[1] > 0.0 { l7[1] } else { 4.0 }), // GPS, QZSS
    };

    Ok(NavFrame::Keplerian(KeplerianFrame {
        sv,
        toc,
        clock_bias: clock[0],
        clock_drift: clock[1],
        clock_drift_rate: clock[2],
        iode: l1[0],
        crs: l1[1],
        delta_n: l1[2],
        m0: l1[3],
        cuc: l2[0],
        e: l2[1],
        cus: l2[2],
        sqrt_a: l2[3],
        toe_sow,
        toe,
        cic: l3[1],
        raan0: l3[2],
        cis: l3[3],
        i0: l4[0],
        crc: l4[1],
        arg_perigee: l4[2],
        raan_dot: l4[3],
        idot: l5[0],
        week,
        ura_index: l6[0],
        health: l6[1],
        tgd,
        tgd2,
        transmission_time: l7[0],
        iodc,
        fit_interval_hours,
    }))
}

fn gps_week_sow_duration(week: f64, sow: f64) -> hifitime::Duration {
    hifitime::Duration::from_days(week * 7.0) + hifitime::Duration::from_seconds(sow)
}

/// Parses a 4-line GLONASS record.
pub(crate) fn parse_glonass(lines: &[&str], ts: TimeScale) -> Result<NavFrame, NavigationError> {
    if lines.len() < STATE_VECTOR_BLOCK_LINES {
        return Err(NavigationError::UnexpectedEof);
    }
    let (sv, toc, clock) = parse_epoch_line(lines[0], ts)?;
    let l1 = orbit_line(lines[1]);
    let l2 = orbit_line(lines[2]);
    let l3 = orbit_line(lines[3]);

    let message_frame_time_sow = clock[2];
    let toe = glonass_toe(toc, message_frame_time_sow);

    const KM_TO_M: f64 = 1000.0;
    Ok(NavFrame::Glonass(GlonassFrame {
        sv,
        toc,
        clock_bias: clock[0],
        gamma_n: clock[1],
        message_frame_time_sow,
        toe,
        pos: [l1[0] * KM_TO_M, l2[0] * KM_TO_M, l3[0] * KM_TO_M],
        vel: [l1[1] * KM_TO_M, l2[1] * KM_TO_M, l3[1] * KM_TO_M],
        acc: [l1[2] * KM_TO_M, l2[2] * KM_TO_M, l3[2] * KM_TO_M],
        health: l1[3],
        freq_num: l2[3],
        age_days: l3[3],
    }))
}

/// Parses a 4-line SBAS/GEO record. Same physical shape as GLONASS's.
pub(crate) fn parse_geo(lines: &[&str], ts: TimeScale) -> Result<NavFrame, NavigationError> {
    if lines.len() < STATE_VECTOR_BLOCK_LINES {
        return Err(NavigationError::UnexpectedEof);
    }
    let (sv, toc, clock) = parse_epoch_line(lines[0], ts)?;
    let l1 = orbit_line(lines[1]);
    let l2 = orbit_line(lines[2]);
    let l3 = orbit_line(lines[3]);

    const KM_TO_M: f64 = 1000.0;
    Ok(NavFrame::Geo(GeoFrame {
        sv,
        toc,
        clock_bias: clock[0],
        clock_drift_rate: clock[1],
        message_frame_time_sow: clock[2],
        pos: [l1[0] * KM_TO_M, l2[0] * KM_TO_M, l3[0] * KM_TO_M],
        vel: [l1[1] * KM_TO_M, l2[1] * KM_TO_M, l3[1] * KM_TO_M],
        acc: [l1[2] * KM_TO_M, l2[2] * KM_TO_M, l3[2] * KM_TO_M],
        health: l1[3],
        ura_index: l2[3],
        iodn: l3[3],
    }))
}

/// Resolves GLONASS's message-frame-time field (UTC seconds of week, day-wrapped
/// against `toc`) to an explicit `Epoch`, per this crate's decision to carry
/// `toe` as a first-class field on every frame rather than recomputing it lazily
/// on every evaluation call.
fn glonass_toe(toc: Epoch, message_frame_time_sow: f64) -> Epoch {
    let (toc_week_days, toc_sow) = {
        let (week, sow) = toc.to_time_scale(TimeScale::GPST).gpst_week_sow();
        (week, sow)
    };
    let toc_dow = (toc_sow / 86400.0).floor();
    let tb_dow = (message_frame_time_sow / 86400.0).floor();
    let tb_sod = message_frame_time_sow - tb_dow * 86400.0;
    let day_offset = toc_dow - tb_dow;
    let week_start = Epoch::from_gregorian(1980, 1, 6, 0, 0, 0, 0, TimeScale::UTC)
        + hifitime::Duration::from_days(toc_week_days as f64 * 7.0);
    week_start + hifitime::Duration::from_days(toc_dow - day_offset) + hifitime::Duration::from_seconds(tb_sod)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beidou_block() -> Vec<&'static str> {
        vec![
            "C05 2021 01 01 00 00 00 -.426337239332e-03 -.752518047875e-10  .000000000000e+00",
            "      .100000000000e+01  .118906250000e+02  .105325815814e-08 -.255139531119e+01",
            "      .169500708580e-06  .401772442274e-03  .292365439236e-04  .649346986580e+04",
            "      .432000000000e+06  .105705112219e-06 -.277512444499e+01 -.211410224438e-06",
            "      .607169709798e-01 -.897671875000e+03  .154887266488e+00 -.871464871438e-10",
            "     -.940753471872e-09  .000000000000e+00  .782000000000e+03  .000000000000e+00",
            "      .200000000000e+01  .000000000000e+00 -.599999994133e-09 -.900000000000e-08",
            "      .432000000000e+06  .000000000000e+00 0.000000000000e+00 0.000000000000e+00",
        ]
    }

    #[test]
    fn parses_beidou_keplerian_block() {
        let frame = parse_keplerian(&beidou_block(), TimeScale::BDT).unwrap();
        match frame {
            NavFrame::Keplerian(k) => {
                assert_eq!(k.sv, SV::new(Constellation::BeiDou, 5));
                assert!((k.sqrt_a - 6493.46986580).abs() < 1e-3);
                assert!((k.e - 0.000292365439236).abs() < 1e-9);
                assert!((k.toe_sow - 432000.0).abs() < 1e-6);
            },
            _ => panic!("expected Keplerian"),
        }
    }

    #[test]
    fn parses_glonass_block() {
        let lines = vec![
            "R21 2022 01 01 09 15 00-2.666609361768E-04-2.728484105319E-12 5.508000000000E+05",
            "   -1.488799804690D+03-2.196182250980D+00 3.725290298460D-09 0.000000000000D+00",
            "    2.193169775390D+04 1.059645652770D+00-9.313225746150D-10 0.000000000000D+00",
            "    9.139236328125D+03 2.895772933960D+00 9.313225746150D-10 0.000000000000D+00",
        ];
        let frame = parse_glonass(&lines, TimeScale::UTC).unwrap();
        match frame {
            NavFrame::Glonass(g) => {
                assert_eq!(g.sv, SV::new(Constellation::Glonass, 21));
                assert!((g.pos[0] - (-1.488799804690e3 * 1000.0)).abs() < 1.0);
                assert!((g.vel[1] - (1.059645652770 * 1000.0)).abs() < 1.0);
            },
            _ => panic!("expected Glonass"),
        }
    }

    #[test]
    fn rejects_short_block() {
        let lines = vec!["G01 2021 01 01 00 00 00 0.0 0.0 0.0"];
        assert!(parse_keplerian(&lines, TimeScale::GPST).is_err());
    }
}
