//! Whether a navigation frame may be used to evaluate position/clock at a given
//! query epoch: health state plus the constellation-appropriate validity window.
use super::frame::NavFrame;
use gnss_core::prelude::Epoch;
use hifitime::Duration;

/// `true` when the frame's broadcast health field marks the satellite usable.
/// Every constellation's health encoding treats `0` as healthy; this data plane
/// only needs the healthy/unhealthy boolean the validity rule asks for, not the
/// full per-constellation health bitfield.
pub fn is_healthy(frame: &NavFrame) -> bool {
    match frame {
        NavFrame::Keplerian(f) => f.health == 0.0,
        NavFrame::Glonass(f) => f.health == 0.0,
        NavFrame::Geo(f) => f.health == 0.0,
    }
}

/// `true` if `frame` covers the query epoch `t`: healthy, and within its
/// constellation-appropriate validity window.
/// - Keplerian: `toc <= t < toc + fit_interval_hours * 3600`.
/// - GLONASS: `|t - toe| <= fit_interval` (a symmetric window around toe; this
///   reuses the evaluator's own `+/-15min` target window as the fit interval,
///   since GLONASS broadcasts no explicit fit-interval field).
/// - Geo (SBAS): no propagation model in this crate, so a Geo frame is only
///   ever valid exactly at its own `toc`.
pub fn covers(frame: &NavFrame, t: Epoch) -> bool {
    if !is_healthy(frame) {
        return false;
    }
    match frame {
        NavFrame::Keplerian(f) => {
            let window = Duration::from_hours(f.fit_interval_hours);
            t >= f.toc && t < f.toc + window
        },
        NavFrame::Glonass(f) => {
            let half_window = Duration::from_seconds(super::constants::GLO_VALIDITY_SECONDS);
            let delta = if t >= f.toe { t - f.toe } else { f.toe - t };
            delta <= half_window
        },
        NavFrame::Geo(f) => t == f.toc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::frame::{GlonassFrame, KeplerianFrame};
    use gnss_core::prelude::{Constellation, SV};
    use hifitime::TimeScale;

    fn kepler_frame(health: f64, fit_hours: f64) -> NavFrame {
        let toc = Epoch::from_gregorian(2021, 1, 1, 0, 0, 0, 0, TimeScale::GPST);
        NavFrame::Keplerian(KeplerianFrame {
            sv: SV::new(Constellation::GPS, 1),
            toc,
            clock_bias: 0.0,
            clock_drift: 0.0,
            clock_drift_rate: 0.0,
            iode: 0.0,
            crs: 0.0,
            delta_n: 0.0,
            m0: 0.0,
            cuc: 0.0,
            e: 0.0,
            cus: 0.0,
            sqrt_a: 5153.7,
            toe_sow: 0.0,
            toe: toc,
            cic: 0.0,
            raan0: 0.0,
            cis: 0.0,
            i0: 0.0,
            crc: 0.0,
            arg_perigee: 0.0,
            raan_dot: 0.0,
            idot: 0.0,
            week: 0.0,
            ura_index: 0.0,
            health,
            tgd: 0.0,
            tgd2: 0.0,
            iodc: 0.0,
            transmission_time: 0.0,
            fit_interval_hours: fit_hours,
        })
    }

    #[test]
    fn unhealthy_keplerian_is_never_valid() {
        let frame = kepler_frame(1.0, 4.0);
        assert!(!covers(&frame, frame.toc()));
    }

    #[test]
    fn keplerian_valid_within_fit_window_only() {
        let frame = kepler_frame(0.0, 4.0);
        assert!(covers(&frame, frame.toc()));
        assert!(covers(&frame, frame.toc() + Duration::from_hours(3.9)));
        assert!(!covers(&frame, frame.toc() + Duration::from_hours(4.1)));
        assert!(!covers(&frame, frame.toc() - Duration::from_seconds(1.0)));
    }

    #[test]
    fn glonass_valid_within_symmetric_window() {
        let toe = Epoch::from_gregorian(2022, 1, 1, 9, 15, 0, 0, TimeScale::UTC);
        let frame = NavFrame::Glonass(GlonassFrame {
            sv: SV::new(Constellation::Glonass, 1),
            toc: toe,
            clock_bias: 0.0,
            gamma_n: 0.0,
            message_frame_time_sow: 0.0,
            toe,
            pos: [0.0; 3],
            vel: [0.0; 3],
            acc: [0.0; 3],
            health: 0.0,
            freq_num: 0.0,
            age_days: 0.0,
        });
        assert!(covers(&frame, toe + Duration::from_minutes(14.0)));
        assert!(!covers(&frame, toe + Duration::from_minutes(16.0)));
        assert!(!covers(&frame, toe - Duration::from_minutes(16.0)));
    }
}
