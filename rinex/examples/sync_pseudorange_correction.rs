//! Synchronizes an observation epoch with the navigation frame valid at that
//! epoch and applies the broadcast clock correction to a pseudorange:
//!
//!   corrected = raw_pseudorange + c * dtsv
//!
//! This mirrors what an external positioning engine does with this crate's
//! output; no estimator lives here, just the two readers and the evaluator.
use gnss_core::prelude::{Constellation, GnssObservable, Observable, ObservableKind};
use rinex::navigation::{state_and_clock, NavigationReader};
use rinex::observation::ObservationReader;
use rinex::recipe::{self, RecipeOptions};
use rinex::reader::StreamStatus;
use std::collections::HashMap;
use std::io::Cursor;

/// Same value as the crate's internal navigation-evaluation constant;
/// duplicated here because that constant isn't part of the public surface.
const SPEED_OF_LIGHT_MPS: f64 = 299_792_458.0;

const OBS_SAMPLE: &str = "\
     3.04           OBSERVATION DATA    M (MIXED)           RINEX VERSION / TYPE
G   16 C1C L1C D1C S1C C2W L2W D2W S2W C5Q L5Q D5Q S5Q C1C L1C D1C S1C C2W L2W D2W S2W C5Q L5Q D5Q S5Q
                                                            END OF HEADER
> 2018 11 04 00 00  0.0000000  0  1       -0.123456789012
G03   20123456.789
";

const NAV_SAMPLE: &str = "\
     3.04           N: GNSS NAV DATA    M: MIXED                      RINEX VERSION / TYPE
                                                            END OF HEADER
G03 2018 11 04 00 00 00 1.00000000000e-04 0.00000000000e+00 0.00000000000e+00
     1.00000000000e+00 0.00000000000e+00 2.50000000000e+00 5153.700000000
     0.00000000000e+00 1.00000000000e+00 0.00000000000e+00 5.15370000000e+03
     0.00000000000e+00 1.00000000000e+00 0.00000000000e+00 9.70000000000e-01
     0.00000000000e+00 -8.00000000000e-09 0.00000000000e+00 -5.00000000000e-11
     0.00000000000e+00 0.00000000000e+00 0.00000000000e+00 0.00000000000e+00
     0.00000000000e+00 0.00000000000e+00 0.00000000000e+00 0.00000000000e+00
     0.00000000000e+00 0.00000000000e+00 0.00000000000e+00 0.00000000000e+00
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut obs = ObservationReader::new(Cursor::new(OBS_SAMPLE))?;

    let mut user_map = HashMap::new();
    user_map.insert(
        Constellation::GPS,
        vec![GnssObservable::single(
            Constellation::GPS,
            Observable::new(ObservableKind::Pseudorange, 1, 'C'),
            1.0,
        )],
    );
    let plan = recipe::resolve(&mut user_map, &obs.header().codes, RecipeOptions::default())?;

    let epoch = match obs.next_epoch(&plan) {
        StreamStatus::Ok(epoch) => epoch,
        StreamStatus::Eof => return Err("observation stream was empty".into()),
        StreamStatus::Err(e) => return Err(Box::new(e)),
    };

    let mut nav = NavigationReader::new(Cursor::new(NAV_SAMPLE))?;
    let frame = match nav.find_next_valid(epoch.epoch, Constellation::GPS, 3) {
        StreamStatus::Ok(frame) => frame,
        StreamStatus::Eof => return Err("no navigation frame covers this epoch".into()),
        StreamStatus::Err(e) => return Err(Box::new(e)),
    };

    let (_position_ecef, dtsv) = state_and_clock(&frame, epoch.epoch)?;

    for (sv, values) in &epoch.satellites {
        if sv.constellation != Constellation::GPS || sv.prn != 3 {
            continue;
        }
        let raw = values[0].value;
        let corrected = raw + SPEED_OF_LIGHT_MPS * dtsv;
        println!("{sv}: raw={raw:.3} m, dtsv={dtsv:.9} s, corrected={corrected:.3} m");
    }

    Ok(())
}
