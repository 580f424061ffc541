//! RINEX Observation header: marker/receiver/antenna metadata and the
//! per-constellation observable-code table recipes are resolved against.
use super::ObservationError;
use crate::lexer;
use gnss_core::prelude::{Constellation, Observable};
use hifitime::TimeScale;
use std::collections::HashMap;
use std::str::FromStr;

/// Parsed RINEX Observation header. Carries just the fields this data plane's
/// consumers need: site/receiver identity, approximate position, ARP offset and
/// the observable-code table recipes resolve against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObsHeader {
    pub marker_name: Option<String>,
    pub marker_number: Option<String>,
    pub receiver_serial: Option<String>,
    pub receiver_type: Option<String>,
    pub antenna_serial: Option<String>,
    pub antenna_type: Option<String>,
    pub approx_position_xyz: Option<[f64; 3]>,
    /// ARP eccentricity, `(up, east, north)` meters.
    pub antenna_delta_hen: Option<(f64, f64, f64)>,
    pub codes: HashMap<Constellation, Vec<Observable>>,
    /// `true` when `RCV CLOCK OFFS APPL = 1`: epochs are already receiver-clock
    /// corrected upstream. See [`super::ObservationReader::new`] for the
    /// construction-time warning this triggers.
    pub clock_offset_applied: bool,
    /// Time scale `TIME OF FIRST OBS` declares; epoch headers are parsed in this
    /// scale. Defaults to GPST if the header omits the label.
    pub timescale: TimeScale,
}

fn label(line: &str) -> &str {
    if line.len() > 60 {
        line[60..].trim()
    } else {
        ""
    }
}

fn value(line: &str) -> &str {
    if line.len() > 60 {
        line[..60].trim_end()
    } else {
        line.trim_end()
    }
}

pub(crate) fn parse(lines: &[String]) -> Result<ObsHeader, ObservationError> {
    let mut header = ObsHeader {
        timescale: TimeScale::GPST,
        ..Default::default()
    };
    let mut current_constellation: Option<Constellation> = None;

    for line in lines {
        match label(line) {
            "MARKER NAME" => header.marker_name = Some(value(line).trim().to_string()),
            "MARKER NUMBER" => header.marker_number = Some(value(line).trim().to_string()),
            "REC # / TYPE / VERS" => {
                let v = value(line);
                header.receiver_serial = lexer::slice(v, 0, 20).map(|s| s.trim().to_string());
                header.receiver_type = lexer::slice(v, 20, 20).map(|s| s.trim().to_string());
            },
            "ANT # / TYPE" => {
                let v = value(line);
                header.antenna_serial = lexer::slice(v, 0, 20).map(|s| s.trim().to_string());
                header.antenna_type = lexer::slice(v, 20, 20).map(|s| s.trim().to_string());
            },
            "APPROX POSITION XYZ" => {
                let v = value(line);
                let x = lexer::slice(v, 0, 14).and_then(|f| lexer::parse_f64(f).ok());
                let y = lexer::slice(v, 14, 14).and_then(|f| lexer::parse_f64(f).ok());
                let z = lexer::slice(v, 28, 14).and_then(|f| lexer::parse_f64(f).ok());
                if let (Some(x), Some(y), Some(z)) = (x, y, z) {
                    header.approx_position_xyz = Some([x, y, z]);
                }
            },
            "ANTENNA: DELTA H/E/N" => {
                let v = value(line);
                let h = lexer::slice(v, 0, 14).and_then(|f| lexer::parse_f64(f).ok());
                let e = lexer::slice(v, 14, 14).and_then(|f| lexer::parse_f64(f).ok());
                let n = lexer::slice(v, 28, 14).and_then(|f| lexer::parse_f64(f).ok());
                if let (Some(h), Some(e), Some(n)) = (h, e, n) {
                    header.antenna_delta_hen = Some((h, e, n));
                }
            },
            "RCV CLOCK OFFS APPL" => {
                let v = value(line);
                header.clock_offset_applied = v.trim().parse::<i32>().unwrap_or(0) == 1;
            },
            "TIME OF FIRST OBS" => {
                let v = value(line);
                if let Some(ts_field) = v.split_whitespace().last() {
                    if let Ok(ts) = timescale_from_label(ts_field) {
                        header.timescale = ts;
                    }
                }
            },
            "SYS / # / OBS TYPES" => {
                parse_obs_types_line(line, &mut current_constellation, &mut header)?;
            },
            _ => {},
        }
    }

    Ok(header)
}

fn timescale_from_label(s: &str) -> Result<TimeScale, ()> {
    match s.trim() {
        "GPS" => Ok(TimeScale::GPST),
        "GLO" => Ok(TimeScale::UTC),
        "GAL" => Ok(TimeScale::GST),
        "BDT" | "BDS" => Ok(TimeScale::BDT),
        "QZS" => Ok(TimeScale::GPST),
        _ => Err(()),
    }
}

/// Parses one `SYS / # / OBS TYPES` line, either starting a new constellation's
/// code list (constellation char present in column 0) or continuing the previous
/// one (blank column 0, up to 13 codes per line either way).
fn parse_obs_types_line(
    line: &str,
    current: &mut Option<Constellation>,
    header: &mut ObsHeader,
) -> Result<(), ObservationError> {
    let v = value(line);
    let sys_field = lexer::slice(v, 0, 1).unwrap_or(" ");

    if !sys_field.trim().is_empty() {
        let constellation = Constellation::from_str(sys_field)
            .map_err(|e| ObservationError::BadHeader(format!("SYS / # / OBS TYPES: {e}")))?;
        *current = Some(constellation);
        header.codes.entry(constellation).or_default();
    }

    let constellation = current
        .ok_or_else(|| ObservationError::BadHeader("OBS TYPES continuation with no prior SYS".to_string()))?;

    let codes_field = lexer::slice(v, 7, 13 * 4).unwrap_or("");
    let mut idx = 0;
    loop {
        let start = idx * 4;
        let Some(code_field) = lexer::slice(codes_field, start, 4) else {
            break;
        };
        if lexer::is_blank(code_field) {
            break;
        }
        let observable = Observable::from_str(code_field)
            .map_err(|e| ObservationError::BadHeader(format!("OBS TYPES code \"{code_field}\": {e}")))?;
        header.codes.entry(constellation).or_default().push(observable);
        idx += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad_label(content: &str, label: &str) -> String {
        format!("{content:<60}{label}")
    }

    #[test]
    fn parses_marker_and_position() {
        let lines = vec![
            pad_label("SITE01", "MARKER NAME"),
            pad_label(&format!("{:14.4}{:14.4}{:14.4}", 1.0, 2.0, 3.0), "APPROX POSITION XYZ"),
            pad_label("", "END OF HEADER"),
        ];
        let header = parse(&lines).unwrap();
        assert_eq!(header.marker_name.as_deref(), Some("SITE01"));
        assert_eq!(header.approx_position_xyz, Some([1.0, 2.0, 3.0]));
    }

    #[test]
    fn parses_obs_types_with_continuation() {
        // "A1,3X,I3,13(1X,A3)": sys char, 3 blanks, I3 count, then 4-char code
        // slots starting at column 7.
        let codes_13 = [
            "C1C", "L1C", "D1C", "S1C", "C2W", "L2W", "D2W", "S2W", "C5Q", "L5Q", "D5Q", "S5Q",
            "C1W",
        ];
        let mut first = format!("G   {:3}", 15);
        for c in codes_13 {
            first.push(' ');
            first.push_str(c);
        }
        let mut second = "       ".to_string(); // 7 blank columns (no sys char, no count)
        for c in ["L1W", "D1W"] {
            second.push(' ');
            second.push_str(c);
        }
        let lines = vec![
            pad_label(&first, "SYS / # / OBS TYPES"),
            pad_label(&second, "SYS / # / OBS TYPES"),
            pad_label("", "END OF HEADER"),
        ];
        let header = parse(&lines).unwrap();
        let codes = header.codes.get(&Constellation::GPS).unwrap();
        assert_eq!(codes.len(), 15);
        assert_eq!(codes[0].to_string(), "C1C");
        assert_eq!(codes[13].to_string(), "L1W");
        assert_eq!(codes[14].to_string(), "D1W");
    }

    #[test]
    fn clock_offset_applied_flag() {
        let lines = vec![
            pad_label("     1", "RCV CLOCK OFFS APPL"),
            pad_label("", "END OF HEADER"),
        ];
        let header = parse(&lines).unwrap();
        assert!(header.clock_offset_applied);
    }

    #[test]
    fn time_of_first_obs_sets_timescale() {
        let lines = vec![
            pad_label("  2018    11     4     0     0    0.0000000     GAL", "TIME OF FIRST OBS"),
            pad_label("", "END OF HEADER"),
        ];
        let header = parse(&lines).unwrap();
        assert_eq!(header.timescale, TimeScale::GST);
    }
}
