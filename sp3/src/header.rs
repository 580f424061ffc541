//! SP3-c/d header parsing: the `#`/`##` timing lines, the satellite-id and
//! accuracy blocks, the `%c`/`%f`/`%i` descriptor lines and the `/* ` comment
//! lines that precede the first epoch record.
use crate::error::Sp3Error;
use crate::version::Version;
use gnss_core::prelude::{Constellation, Epoch, SV};
use hifitime::TimeScale;
use std::io::BufRead;

const MAX_HEADER_LINES: usize = 1000;
/// Tolerance, in seconds, for cross-checking the `#` line's calendar epoch
/// against the `##` line's GPS-week/SoW and MJD fields. Exact equality is
/// fragile across the timescale round-trip; fixture files agree to well
/// within a microsecond.
const START_EPOCH_TOLERANCE_S: f64 = 1.0e-3;

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Position,
    Velocity,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrbitType {
    Fitted,
    ExtrapolatedOrFitted,
    Broadcast,
    Helmert,
    Other(String),
}

impl From<&str> for OrbitType {
    fn from(s: &str) -> Self {
        match s.trim() {
            "FIT" => Self::Fitted,
            "EXT" => Self::ExtrapolatedOrFitted,
            "BCT" => Self::Broadcast,
            "HLM" => Self::Helmert,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: Version,
    pub data_type: DataType,
    pub start_epoch: Epoch,
    pub num_epochs: u32,
    pub coord_system: String,
    pub orbit_type: OrbitType,
    pub agency: String,
    pub gps_week: u32,
    pub week_seconds: f64,
    pub sampling_period_s: f64,
    pub mjd: i64,
    pub mjd_fraction: f64,
    pub constellation: Constellation,
    pub timescale: TimeScale,
    pub satellites: Vec<SV>,
    pub comments: Vec<String>,
}

fn read_line<R: BufRead>(source: &mut R) -> Result<String, Sp3Error> {
    let mut line = String::new();
    let n = source.read_line(&mut line)?;
    if n == 0 {
        return Err(Sp3Error::UnexpectedEof);
    }
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

fn field(line: &str, start: usize, end: usize) -> Option<&str> {
    crate::lexer::slice(line, start, end.saturating_sub(start))
}

fn parse_line1(line: &str) -> Result<(Version, DataType, Epoch, u32, String, OrbitType, String), Sp3Error> {
    let bad = || Sp3Error::BadLine1(line.to_string());
    let version: Version = field(line, 1, 2).ok_or_else(bad)?.parse()?;
    let data_type = match field(line, 2, 3).ok_or_else(bad)? {
        "P" => DataType::Position,
        "V" => DataType::Velocity,
        _ => return Err(bad()),
    };
    let year = field(line, 3, 7).ok_or_else(bad)?;
    let month = field(line, 8, 10).ok_or_else(bad)?;
    let day = field(line, 11, 13).ok_or_else(bad)?;
    let hour = field(line, 14, 16).ok_or_else(bad)?;
    let minute = field(line, 17, 19).ok_or_else(bad)?;
    let sec_and_fraction = field(line, 20, 31).ok_or_else(bad)?;
    let start_epoch =
        Epoch::parse_rinex_civil(&[year, month, day, hour, minute, sec_and_fraction], TimeScale::UTC)?;

    let num_epochs: u32 = field(line, 32, 39).ok_or_else(bad)?.trim().parse().map_err(|_| bad())?;
    let coord_system = field(line, 45, 51).ok_or_else(bad)?.trim().to_string();
    let orbit_type = OrbitType::from(field(line, 51, 55).ok_or_else(bad)?);
    let agency = field(line, 55, line.len()).unwrap_or("").trim().to_string();

    Ok((version, data_type, start_epoch, num_epochs, coord_system, orbit_type, agency))
}

fn parse_line2(line: &str) -> Result<(u32, f64, f64, i64, f64), Sp3Error> {
    let bad = || Sp3Error::BadLine2(line.to_string());
    let week: u32 = field(line, 2, 7).ok_or_else(bad)?.trim().parse().map_err(|_| bad())?;
    let week_seconds: f64 = field(line, 7, 23).ok_or_else(bad)?.trim().parse().map_err(|_| bad())?;
    let sampling_period_s: f64 = field(line, 24, 38).ok_or_else(bad)?.trim().parse().map_err(|_| bad())?;
    let mjd: i64 = field(line, 38, 44).ok_or_else(bad)?.trim().parse().map_err(|_| bad())?;
    let mjd_fraction: f64 = field(line, 44, line.len())
        .unwrap_or("0")
        .trim()
        .parse()
        .map_err(|_| bad())?;
    Ok((week, week_seconds, sampling_period_s, mjd, mjd_fraction))
}

fn check_start_epoch(start_epoch: Epoch, week: u32, week_seconds: f64, mjd: i64, mjd_fraction: f64) -> Result<(), Sp3Error> {
    let (gpst_week, gpst_sow) = start_epoch.gpst_week_sow();
    if gpst_week != week || (gpst_sow - week_seconds).abs() > START_EPOCH_TOLERANCE_S {
        return Err(Sp3Error::StartEpochMismatch);
    }
    let mjd_full = mjd as f64 + mjd_fraction;
    let (epoch_mjd, epoch_secs_of_day) = start_epoch.mjd_and_seconds_of_day();
    let epoch_mjd_full = epoch_mjd as f64 + epoch_secs_of_day / 86_400.0;
    if (epoch_mjd_full - mjd_full).abs() > START_EPOCH_TOLERANCE_S / 86_400.0 {
        return Err(Sp3Error::StartEpochMismatch);
    }
    Ok(())
}

/// Fixed number of `+`/`++` lines the format reserves regardless of the
/// actual satellite count (up to 85 satellites, 17 per line).
const SAT_BLOCK_LINES: usize = 5;
const SAT_SLOTS_PER_LINE: usize = 17;
const SAT_CODE_COLUMN: usize = 9;

fn collect_sat_slots(line: &str, out: &mut Vec<String>) {
    for slot in 0..SAT_SLOTS_PER_LINE {
        let start = SAT_CODE_COLUMN + slot * 3;
        let Some(code) = field(line, start, start + 3) else {
            break;
        };
        if !code.trim().is_empty() {
            out.push(code.to_string());
        }
    }
}

/// Reads the satellite-id block (`+` lines): the first line carries the
/// satellite count at columns 4-6, every line (including the first)
/// contributes up to 17 more 3-char SV codes starting at column 9. Exactly
/// [`SAT_BLOCK_LINES`] lines are always present.
fn read_satellite_id_block<R: BufRead>(source: &mut R, first_line: &str) -> Result<Vec<SV>, Sp3Error> {
    let bad = || Sp3Error::BadSatelliteBlock(first_line.to_string());
    let count: usize = field(first_line, 4, 6).ok_or_else(bad)?.trim().parse().map_err(|_| bad())?;

    let mut codes = Vec::new();
    collect_sat_slots(first_line, &mut codes);
    for _ in 1..SAT_BLOCK_LINES {
        let line = read_line(source)?;
        collect_sat_slots(&line, &mut codes);
    }

    codes
        .into_iter()
        .take(count)
        .map(|code| SV::from_rinex_code(&code).map_err(Sp3Error::from))
        .collect()
}

/// Reads and discards the satellite-accuracy block (`++` lines): same
/// fixed-width layout as the id block, minus a count field, and this
/// reader doesn't surface per-satellite accuracy exponents.
fn read_accuracy_block<R: BufRead>(source: &mut R) -> Result<(), Sp3Error> {
    for _ in 1..SAT_BLOCK_LINES {
        read_line(source)?;
    }
    Ok(())
}

fn parse_descriptor_line(line: &str) -> Result<(Constellation, TimeScale), Sp3Error> {
    let bad = || Sp3Error::BadDescriptor(line.to_string());
    let constellation_code = field(line, 3, 5).ok_or_else(bad)?.trim();
    let constellation: Constellation = constellation_code.parse().map_err(Sp3Error::from)?;
    let ts_code = field(line, 9, 12).ok_or_else(bad)?.trim();
    let timescale = match ts_code {
        "GPS" => TimeScale::GPST,
        "GAL" => TimeScale::GST,
        "GLO" => TimeScale::UTC,
        "BDT" | "BDS" => TimeScale::BDT,
        "UTC" => TimeScale::UTC,
        "TAI" => TimeScale::TAI,
        _ => return Err(bad()),
    };
    Ok((constellation, timescale))
}

/// Parses the full header. `BufRead` gives no way to un-read a line once
/// consumed, so the first line that isn't part of the header (the first
/// epoch line, or a bare `EOF`) is returned alongside the header instead of
/// pushed back onto the stream; the record reader seeds its own lookahead
/// buffer with it.
pub fn parse<R: BufRead>(source: &mut R) -> Result<(Header, String), Sp3Error> {
    let line1 = read_line(source)?;
    let (version, data_type, start_epoch, num_epochs, coord_system, orbit_type, agency) = parse_line1(&line1)?;

    let line2 = read_line(source)?;
    let (week, week_seconds, sampling_period_s, mjd, mjd_fraction) = parse_line2(&line2)?;
    check_start_epoch(start_epoch, week, week_seconds, mjd, mjd_fraction)?;

    let mut satellites = Vec::new();
    let mut seen_sat_block = false;
    let mut seen_accuracy_block = false;
    let mut descriptor: Option<(Constellation, TimeScale)> = None;
    let mut f_lines_seen = 0;
    let mut i_lines_seen = 0;
    let mut comments = Vec::new();
    let mut first_record_line = None;

    for _ in 0..MAX_HEADER_LINES {
        let line = read_line(source)?;
        if line.starts_with("++") {
            read_accuracy_block(source)?;
            seen_accuracy_block = true;
        } else if line.starts_with('+') {
            satellites = read_satellite_id_block(source, &line)?;
            seen_sat_block = true;
        } else if line.starts_with("%c") {
            if descriptor.is_none() {
                descriptor = Some(parse_descriptor_line(&line)?);
            }
        } else if line.starts_with("%f") || line.starts_with("%i") {
            if line.starts_with("%f") {
                f_lines_seen += 1;
            } else {
                i_lines_seen += 1;
            }
        } else if let Some(rest) = line.strip_prefix("/* ") {
            comments.push(rest.trim_end().to_string());
        } else if line.trim_start().starts_with("/*") {
            comments.push(line.trim_start_matches("/*").trim().to_string());
        } else {
            // First non-header line: either an epoch record or the bare EOF
            // marker. The header block is done; hand this line back to the
            // caller since it can't be pushed back onto the stream.
            first_record_line = Some(line);
            break;
        }
    }

    let (constellation, timescale) = descriptor.ok_or(Sp3Error::UnexpectedEof)?;
    if !seen_sat_block || !seen_accuracy_block || f_lines_seen < 2 || i_lines_seen < 2 {
        return Err(Sp3Error::UnexpectedEof);
    }
    let first_record_line = first_record_line.ok_or(Sp3Error::UnexpectedEof)?;

    let header = Header {
        version,
        data_type,
        start_epoch,
        num_epochs,
        coord_system,
        orbit_type,
        agency,
        gps_week: week,
        week_seconds,
        sampling_period_s,
        mjd,
        mjd_fraction,
        constellation,
        timescale,
        satellites,
        comments,
    };
    Ok((header, first_record_line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> &'static str {
        "#dP1980  1  6  0  0  0.00000000     288 ORBIT IGS14 HLM IGS\n\
         ##    0      0.00000000   900.00000000 44244 0.0000000000000\n\
         +   27   G01G02G03G04G05G06G07G08G09G10G11G12G13G14G15G16G17\n\
         +        G18G19G20G21G22G23G24G25G26G27  0  0  0  0  0  0  0\n\
         +          0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0\n\
         +          0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0\n\
         +          0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0\n\
         ++        2  2  2  2  2  2  2  2  2  2  2  2  2  2  2  2  2\n\
         ++        2  2  2  2  2  2  2  2  2  0  0  0  0  0  0  0  0\n\
         ++         0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0\n\
         ++         0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0\n\
         ++         0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0\n\
         %c G  cc GPS ccc cccc cccc cccc cccc ccccc ccccc ccccc ccccc\n\
         %c cc cc ccc ccc cccc cccc cccc cccc ccccc ccccc ccccc ccccc\n\
         %f  1.2500000  1.025000000  0.00000000000  0.000000000000000\n\
         %f  0.0000000  0.000000000  0.00000000000  0.000000000000000\n\
         %i    0    0    0    0      0      0      0      0         0\n\
         %i    0    0    0    0      0      0      0      0         0\n\
         /* generated for testing purposes only\n\
         *  1980  1  6  0  0  0.00000000\n"
    }

    #[test]
    fn parses_full_header() {
        let mut cursor = Cursor::new(sample());
        let (header, first_record_line) = parse(&mut cursor).expect("header parses");
        assert_eq!(header.version, Version::D);
        assert_eq!(header.data_type, DataType::Position);
        assert_eq!(header.gps_week, 0);
        assert_eq!(header.satellites.len(), 27);
        assert_eq!(header.constellation, Constellation::GPS);
        assert_eq!(header.comments, vec!["generated for testing purposes only".to_string()]);
        assert!(first_record_line.starts_with("*  1980"));
    }

    #[test]
    fn rejects_start_epoch_mismatch() {
        let bad = sample().replacen("##    0      0.00000000", "##    0    100.00000000", 1);
        let mut cursor = Cursor::new(bad);
        assert!(matches!(parse(&mut cursor), Err(Sp3Error::StartEpochMismatch)));
    }
}
