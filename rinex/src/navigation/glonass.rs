//! GLONASS broadcast-ephemeris evaluator: the message gives a state vector at
//! `toe` rather than Keplerian elements, so position at any other epoch comes
//! from numerically integrating the equations of motion (GLONASS-ICD Appendix
//! J), not from a closed-form orbit.
use super::constants::{GLO_AE, GLO_GM, GLO_J2, GLO_MAX_ITER, GLO_OMEGA, GLO_RK4_STEP, GLO_VALIDITY_SECONDS};
use super::frame::GlonassFrame;
use super::EvaluationError;
use gnss_core::prelude::Epoch;
use hifitime::Duration;

#[cfg(feature = "log")]
use log::warn;

type State = [f64; 6];

/// Simplified (rotating PZ-90 ECEF) equations of motion, GLONASS-ICD Appendix
/// J.2.
fn state_deriv_ecef(x: &State, acc: [f64; 3]) -> State {
    let r2 = x[0] * x[0] + x[1] * x[1] + x[2] * x[2];
    let r3 = r2 * r2.sqrt();
    let omega2 = GLO_OMEGA * GLO_OMEGA;
    let a = 1.5 * GLO_J2 * GLO_GM * (GLO_AE * GLO_AE) / r2 / r3;
    let b = 5.0 * x[2] * x[2] / r2;
    let c = -GLO_GM / r3 - a * (1.0 - b);

    [
        x[3],
        x[4],
        x[5],
        (c + omega2) * x[0] + 2.0 * GLO_OMEGA * x[4] + acc[0],
        (c + omega2) * x[1] - 2.0 * GLO_OMEGA * x[3] + acc[1],
        (c - 2.0 * a) * x[2] + acc[2],
    ]
}

/// Precise (pseudo-inertial) equations of motion, GLONASS-ICD Appendix J.1.
fn state_deriv_inertial(x: &State, acc: [f64; 3]) -> State {
    let r2 = x[0] * x[0] + x[1] * x[1] + x[2] * x[2];
    let r = r2.sqrt();
    let xhat = x[0] / r;
    let yhat = x[1] / r;
    let zhat = x[2] / r;
    let zhat2 = zhat * zhat;
    let rho = GLO_AE / r;
    let gm_hat = GLO_GM / r2;
    let term = 1.5 * GLO_J2 * gm_hat * rho * rho;

    [
        x[3],
        x[4],
        x[5],
        -gm_hat * xhat - term * (1.0 - 5.0 * zhat2) * xhat + acc[0],
        -gm_hat * yhat - term * (1.0 - 5.0 * zhat2) * yhat + acc[1],
        -gm_hat * zhat - term * (3.0 - 5.0 * zhat2) * zhat + acc[2],
    ]
}

fn rk4_step(state: State, acc: [f64; 3], h: f64, deriv: fn(&State, [f64; 3]) -> State) -> State {
    let k1 = deriv(&state, acc);
    let mut tmp = state;
    for i in 0..6 {
        tmp[i] = state[i] + (h / 2.0) * k1[i];
    }
    let k2 = deriv(&tmp, acc);
    for i in 0..6 {
        tmp[i] = state[i] + (h / 2.0) * k2[i];
    }
    let k3 = deriv(&tmp, acc);
    for i in 0..6 {
        tmp[i] = state[i] + h * k3[i];
    }
    let k4 = deriv(&tmp, acc);

    let mut out = state;
    for i in 0..6 {
        out[i] = state[i] + (h / 6.0) * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
    out
}

/// Integrates `state` from `tb_sod` to `t_lim` (both seconds-of-day, already
/// day-wrapped by the caller) with a fixed `+/-60s` step, per GLONASS-ICD
/// Appendix J. Fails with `GloIntegrationDiverged` past 1500 steps.
fn integrate(
    mut state: State,
    acc: [f64; 3],
    tb_sod: f64,
    t_lim: f64,
    deriv: fn(&State, [f64; 3]) -> State,
) -> Result<State, EvaluationError> {
    if (t_lim - tb_sod).abs() < 1e-9 {
        return Ok(state);
    }
    let h = if t_lim > tb_sod { GLO_RK4_STEP } else { -GLO_RK4_STEP };
    let mut ti = tb_sod;
    let mut iterations = 0u32;

    while (h > 0.0 && ti < t_lim) || (h < 0.0 && ti > t_lim) {
        state = rk4_step(state, acc, h, deriv);
        ti += h;
        iterations += 1;
        if iterations >= GLO_MAX_ITER {
            return Err(EvaluationError::GloIntegrationDiverged);
        }
    }
    Ok(state)
}

/// Greenwich Mean Sidereal Time for the Julian Date at 00:00, GLONASS-ICD
/// Appendix K.
fn gmst(jd0: f64) -> f64 {
    const TWO_PI: f64 = 2.0 * std::f64::consts::PI;
    let era = TWO_PI * (0.7790572732640 + 1.00273781191135448 * (jd0 - 2451545.0));
    let td = (jd0 - 2451545.0) / 36525.0;
    era + 0.0000000703270726
        + (0.0223603658710194
            + (0.0000067465784654 - (0.0000000000021332 - (0.0000000001452308 - (0.0000000000001784) * td) * td) * td)
                * td)
            * td
}

/// GMST at the given Moscow-Time instant (`sec_of_day` advances from midnight
/// by the Earth rotation rate, per GLONASS-ICD Appendix J.4/J.5).
fn gmst_at(mjd_day: i64, sec_of_day: f64) -> f64 {
    let jd0 = mjd_day as f64 + 2_400_000.5;
    gmst(jd0) + GLO_OMEGA * (sec_of_day - 10_800.0)
}

fn rotate_ecef_to_inertial(x: State, acc: [f64; 3], gmst_b: f64) -> (State, [f64; 3]) {
    let (sin_s, cos_s) = gmst_b.sin_cos();
    let inertial = [
        x[0] * cos_s - x[1] * sin_s,
        x[0] * sin_s + x[1] * cos_s,
        x[2],
        x[3] * cos_s - x[4] * sin_s - GLO_OMEGA * x[1],
        x[3] * sin_s + x[4] * cos_s + GLO_OMEGA * x[0],
        x[5],
    ];
    let acc_inertial = [
        acc[0] * cos_s - acc[1] * sin_s,
        acc[0] * sin_s + acc[1] * cos_s,
        acc[2],
    ];
    (inertial, acc_inertial)
}

fn rotate_inertial_to_ecef(x: State, gmst_i: f64) -> State {
    let (sin_s, cos_s) = gmst_i.sin_cos();
    [
        x[0] * cos_s + x[1] * sin_s,
        -x[0] * sin_s + x[1] * cos_s,
        x[2],
        x[3] * cos_s + x[4] * sin_s + GLO_OMEGA * x[1],
        -x[3] * sin_s + x[4] * cos_s - GLO_OMEGA * x[0],
        x[5],
    ]
}

/// Moscow-Time `(mjd_day, seconds_of_day)` reading of `epoch`.
fn moscow_mjd_sod(epoch: Epoch) -> (i64, f64) {
    let moscow = epoch + Duration::from_hours(3.0);
    moscow.mjd_and_seconds_of_day()
}

/// Evaluates ECEF position (meters) and clock bias (seconds) for a GLONASS
/// frame at query epoch `t`, using the simplified (rotating-frame) integrator.
/// See [`evaluate_precise`] for the inertial-frame variant.
pub fn evaluate(frame: &GlonassFrame, t: Epoch) -> Result<([f64; 3], f64), EvaluationError> {
    let (_, tb_sod) = moscow_mjd_sod(frame.toe);
    let (_, t_sod) = moscow_mjd_sod(t);

    if (tb_sod - t_sod).abs() > GLO_VALIDITY_SECONDS {
        #[cfg(feature = "log")]
        warn!(
            "GLONASS {} queried {:.0}s from toe, outside the +/-15min window this integrator targets",
            frame.sv,
            (tb_sod - t_sod).abs()
        );
    }

    let state: State = [
        frame.pos[0],
        frame.pos[1],
        frame.pos[2],
        frame.vel[0],
        frame.vel[1],
        frame.vel[2],
    ];
    let t_lim = t_sod - ((t_sod - tb_sod) / 86400.0).round() * 86400.0;
    let result = integrate(state, frame.acc, tb_sod, t_lim, state_deriv_ecef)?;

    Ok(([result[0], result[1], result[2]], clock_bias(frame, t)))
}

/// Evaluates using the precise (inertial-frame) integrator: rotate to a
/// pseudo-inertial frame at `toe`'s GMST, integrate without rotation terms,
/// then rotate back to ECEF at `t`'s GMST.
pub fn evaluate_precise(frame: &GlonassFrame, t: Epoch) -> Result<([f64; 3], f64), EvaluationError> {
    let (tb_day, tb_sod) = moscow_mjd_sod(frame.toe);
    let (_, t_sod) = moscow_mjd_sod(t);

    if (tb_sod - t_sod).abs() > GLO_VALIDITY_SECONDS {
        return Err(EvaluationError::GloIntegrationDiverged);
    }

    let state_ecef: State = [
        frame.pos[0],
        frame.pos[1],
        frame.pos[2],
        frame.vel[0],
        frame.vel[1],
        frame.vel[2],
    ];
    let gmst_b = gmst_at(tb_day, tb_sod);
    let (state_inertial, acc_inertial) = rotate_ecef_to_inertial(state_ecef, frame.acc, gmst_b);

    let t_lim = t_sod - ((t_sod - tb_sod) / 86400.0).round() * 86400.0;
    let result = integrate(state_inertial, acc_inertial, tb_sod, t_lim, state_deriv_inertial)?;

    let gmst_i = gmst_at(tb_day, t_lim);
    let ecef = rotate_inertial_to_ecef(result, gmst_i);

    Ok(([ecef[0], ecef[1], ecef[2]], clock_bias(frame, t)))
}

/// `Δtsv = -τN + γN*(t - toe)`, day-wrapped the same way the integrator's `tk`
/// is (GLONASS messages can be queried across a UTC day boundary from `toe`).
fn clock_bias(frame: &GlonassFrame, t: Epoch) -> f64 {
    let dt = (t - frame.toe).to_seconds();
    let dt = dt - (dt / 86400.0).round() * 86400.0;
    frame.clock_bias + frame.gamma_n * dt
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnss_core::prelude::{Constellation, SV};
    use hifitime::TimeScale;

    fn sample_frame() -> GlonassFrame {
        let toe = Epoch::from_gregorian(2022, 1, 1, 9, 15, 0, 0, TimeScale::UTC);
        GlonassFrame {
            sv: SV::new(Constellation::Glonass, 21),
            toc: toe,
            clock_bias: -2.666609361768e-04,
            gamma_n: -2.728484105319e-12,
            message_frame_time_sow: 550_800.0,
            toe,
            pos: [-1.488799804690e3 * 1000.0, 2.193169775390e4 * 1000.0, 9.139236328125e3 * 1000.0],
            vel: [-2.196182250980e0 * 1000.0, 1.059645652770e0 * 1000.0, 2.895772933960e0 * 1000.0],
            acc: [3.725290298460e-9 * 1000.0, -9.313225746150e-10 * 1000.0, 9.313225746150e-10 * 1000.0],
            health: 0.0,
            freq_num: 0.0,
            age_days: 0.0,
        }
    }

    #[test]
    fn quick_return_at_toe_matches_broadcast_state() {
        let frame = sample_frame();
        let (pos, _) = evaluate(&frame, frame.toe).unwrap();
        assert!((pos[0] - frame.pos[0]).abs() < 1e-6);
        assert!((pos[1] - frame.pos[1]).abs() < 1e-6);
        assert!((pos[2] - frame.pos[2]).abs() < 1e-6);
    }

    #[test]
    fn integrates_forward_one_step_without_diverging() {
        let frame = sample_frame();
        let t = frame.toe + Duration::from_seconds(60.0);
        let result = evaluate(&frame, t);
        assert!(result.is_ok());
        let (pos, _) = result.unwrap();
        // one RK4 step shouldn't move the satellite by an absurd distance.
        let dx = pos[0] - frame.pos[0];
        assert!(dx.abs() < 1.0e5, "dx = {dx}");
    }

    #[test]
    fn precise_mode_agrees_roughly_with_simplified_mode() {
        let frame = sample_frame();
        let t = frame.toe + Duration::from_seconds(120.0);
        let (simplified, _) = evaluate(&frame, t).unwrap();
        let (precise, _) = evaluate_precise(&frame, t).unwrap();
        for i in 0..3 {
            assert!((simplified[i] - precise[i]).abs() < 50.0, "axis {i}: {simplified:?} vs {precise:?}");
        }
    }

    #[test]
    fn clock_bias_applies_linear_model() {
        let frame = sample_frame();
        let t = frame.toe + Duration::from_seconds(100.0);
        let (_, bias) = evaluate(&frame, t).unwrap();
        let expected = frame.clock_bias + frame.gamma_n * 100.0;
        assert!((bias - expected).abs() < 1e-15);
    }
}
