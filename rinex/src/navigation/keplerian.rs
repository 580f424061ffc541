//! Keplerian broadcast-ephemeris evaluator shared by GPS, Galileo, BeiDou, QZSS
//! and IRNSS: iterate the eccentric anomaly, then build the ECEF position and
//! clock bias from the corrected orbital elements.
use super::constants;
use super::frame::KeplerianFrame;
use super::EvaluationError;
use gnss_core::prelude::Epoch;

/// Kepler-equation iteration tolerance, radians.
const KEPLER_TOLERANCE: f64 = 1e-14;
/// Iteration cap before the solve is declared non-convergent.
const MAX_KEPLER_ITER: u32 = 1000;
/// Half-period window `tk` is normalized into: `(-302400, 302400]` seconds.
const HALF_WEEK_SECONDS: f64 = 302_400.0;
const WEEK_SECONDS: f64 = 604_800.0;

/// GPS URA index -> nominal accuracy (meters), IS-GPS-200H Table 20-I. Applied
/// to QZSS/BeiDou/Galileo/IRNSS accuracy indices as well, absent a published
/// per-constellation table in this data plane's scope.
const URA_TABLE_METERS: [f64; 15] = [
    2.40, 3.40, 4.85, 6.85, 9.65, 13.65, 24.00, 48.00, 96.00, 192.00, 384.00, 768.00, 1536.00, 3072.00, 6144.00,
];

pub fn ura_meters(index: f64) -> Result<f64, EvaluationError> {
    let idx = index.round();
    if !(0.0..=14.0).contains(&idx) || idx < 0.0 {
        return Err(EvaluationError::UraUnknown(index));
    }
    Ok(URA_TABLE_METERS[idx as usize])
}

/// Normalizes a raw `t - toe` difference into `(-302400, 302400]` seconds,
/// applied uniformly to every Keplerian constellation rather than only BeiDou.
pub fn normalize_tk(mut tk: f64) -> f64 {
    if tk > HALF_WEEK_SECONDS {
        tk -= WEEK_SECONDS;
    } else if tk <= -HALF_WEEK_SECONDS {
        tk += WEEK_SECONDS;
    }
    tk
}

/// Solves Kepler's equation `E = M + e*sin(E)` for the eccentric anomaly,
/// starting from `E0 = M`.
fn solve_eccentric_anomaly(mean_anomaly: f64, eccentricity: f64) -> Result<f64, EvaluationError> {
    let mut e_k = mean_anomaly;
    for _ in 0..MAX_KEPLER_ITER {
        let e_next = mean_anomaly + eccentricity * e_k.sin();
        if (e_next - e_k).abs() < KEPLER_TOLERANCE {
            return Ok(e_next);
        }
        e_k = e_next;
    }
    Err(EvaluationError::KeplerNoConverge)
}

/// Evaluates ECEF position (meters) and clock bias (seconds) for a Keplerian
/// frame at query epoch `t`.
pub fn evaluate(frame: &KeplerianFrame, t: Epoch) -> Result<([f64; 3], f64), EvaluationError> {
    let constellation = frame.sv.constellation;
    let mu = constants::gm(constellation);
    let omega_e = constants::earth_rotation_rate(constellation);
    let f = constants::relativistic_f(constellation);

    let a = frame.sqrt_a * frame.sqrt_a;
    let n0 = (mu / (a * a * a)).sqrt();
    let n = n0 + frame.delta_n;

    let tk = normalize_tk((t - frame.toe).to_seconds());
    let mean_anomaly = frame.m0 + n * tk;
    let e_k = solve_eccentric_anomaly(mean_anomaly, frame.e)?;

    let true_anomaly = ((1.0 - frame.e * frame.e).sqrt() * e_k.sin()).atan2(e_k.cos() - frame.e);
    let phi = true_anomaly + frame.arg_perigee;
    let sin2phi = (2.0 * phi).sin();
    let cos2phi = (2.0 * phi).cos();

    let du = frame.cus * sin2phi + frame.cuc * cos2phi;
    let dr = frame.crs * sin2phi + frame.crc * cos2phi;
    let di = frame.cis * sin2phi + frame.cic * cos2phi;

    let u = phi + du;
    let r = a * (1.0 - frame.e * e_k.cos()) + dr;
    let incl = frame.i0 + di + frame.idot * tk;

    let x_orb = r * u.cos();
    let y_orb = r * u.sin();

    let raan = frame.raan0 + (frame.raan_dot - omega_e) * tk - omega_e * frame.toe_sow;

    let cos_raan = raan.cos();
    let sin_raan = raan.sin();
    let cos_incl = incl.cos();
    let sin_incl = incl.sin();

    let x = x_orb * cos_raan - y_orb * sin_raan * cos_incl;
    let y = x_orb * sin_raan + y_orb * cos_raan * cos_incl;
    let z = y_orb * sin_incl;

    let dt_clock = (t - frame.toc).to_seconds();
    let relativistic = f * frame.e * frame.sqrt_a * e_k.sin();
    let clock_bias =
        frame.clock_bias + frame.clock_drift * dt_clock + frame.clock_drift_rate * dt_clock * dt_clock + relativistic;

    Ok(([x, y, z], clock_bias))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnss_core::prelude::{Constellation, SV};
    use hifitime::TimeScale;

    fn sample_frame() -> KeplerianFrame {
        // Roughly nominal GPS-like orbital elements (not from a real almanac;
        // exercises the pipeline, not validated against a reference ephemeris).
        let toe = Epoch::from_gregorian(2021, 1, 1, 0, 0, 0, 0, TimeScale::GPST);
        KeplerianFrame {
            sv: SV::new(Constellation::GPS, 1),
            toc: toe,
            clock_bias: 1e-5,
            clock_drift: 1e-12,
            clock_drift_rate: 0.0,
            iode: 10.0,
            crs: 5.0,
            delta_n: 4.5e-9,
            m0: 0.5,
            cuc: 1e-6,
            e: 0.01,
            cus: 1e-6,
            sqrt_a: 5153.7,
            toe_sow: 0.0,
            toe,
            cic: 1e-7,
            raan0: 1.2,
            cis: 1e-7,
            i0: 0.95,
            crc: 300.0,
            arg_perigee: 0.3,
            raan_dot: -8e-9,
            idot: 1e-10,
            week: 2138.0,
            ura_index: 2.0,
            health: 0.0,
            tgd: 1e-8,
            tgd2: 0.0,
            iodc: 10.0,
            transmission_time: 0.0,
            fit_interval_hours: 4.0,
        }
    }

    #[test]
    fn evaluates_to_plausible_orbit_radius() {
        let frame = sample_frame();
        let (pos, _clock) = evaluate(&frame, frame.toe).unwrap();
        let r = (pos[0] * pos[0] + pos[1] * pos[1] + pos[2] * pos[2]).sqrt();
        // GPS semi-major axis is about 26,560 km; the evaluated radius should
        // land within a wide band around it for sane inputs.
        assert!(r > 2.0e7 && r < 3.0e7, "r = {r}");
    }

    #[test]
    fn tk_normalizes_into_half_week_window() {
        assert!((normalize_tk(400_000.0) - (400_000.0 - WEEK_SECONDS)).abs() < 1e-9);
        assert!((normalize_tk(-400_000.0) - (-400_000.0 + WEEK_SECONDS)).abs() < 1e-9);
        assert_eq!(normalize_tk(100.0), 100.0);
    }

    #[test]
    fn ura_table_covers_expected_range() {
        assert_eq!(ura_meters(0.0).unwrap(), 2.40);
        assert_eq!(ura_meters(14.0).unwrap(), 6144.00);
        assert!(ura_meters(15.0).is_err());
        assert!(ura_meters(-1.0).is_err());
    }

    #[test]
    fn kepler_converges_for_well_behaved_eccentricity() {
        assert!(solve_eccentric_anomaly(1.0, 0.02).is_ok());
    }
}
