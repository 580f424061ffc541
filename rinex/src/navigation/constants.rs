//! Per-constellation physical constants the broadcast-ephemeris evaluators need.
//! Values follow each constellation's own ICD rather than a single shared WGS84
//! table, since GPS/QZSS/IRNSS, Galileo and BeiDou disagree on the third digit of
//! the gravitational constant and on the adopted Earth rotation rate.
use gnss_core::prelude::Constellation;

/// Vacuum speed of light, meters/second (used to derive the relativistic
/// correction factor for constellations whose ICD gives a formula rather than a
/// fixed constant).
pub const SPEED_OF_LIGHT_MPS: f64 = 299_792_458.0;

/// GLONASS PZ-90 geocentric gravitational constant, m^3/s^2.
pub const GLO_GM: f64 = 3.986004418e14;
/// GLONASS PZ-90 semi-major axis of the Earth ellipsoid, meters.
pub const GLO_AE: f64 = 6_378_136.0;
/// GLONASS second-degree zonal harmonic of the Earth's gravitational potential.
pub const GLO_J2: f64 = 1_082_625.75e-9;
/// GLONASS adopted Earth rotation rate, rad/s.
pub const GLO_OMEGA: f64 = 7.2921151467e-5;
/// Runge-Kutta step for the GLONASS integrators, seconds.
pub const GLO_RK4_STEP: f64 = 60.0;
/// Iteration cap before a GLONASS integration is declared divergent.
pub const GLO_MAX_ITER: u32 = 1500;
/// Half-width of the window around `toe` GLONASS ephemerides are meant to be
/// queried within; crossing it is a warning, not a hard failure, in the
/// simplified integrator.
pub const GLO_VALIDITY_SECONDS: f64 = 15.0 * 60.0;

/// Geocentric gravitational constant for the Keplerian constellations, m^3/s^2.
pub fn gm(constellation: Constellation) -> f64 {
    match constellation {
        Constellation::Galileo | Constellation::BeiDou => 3.986004418e14,
        _ => 3.986005e14, // GPS, QZSS, IRNSS
    }
}

/// Adopted Earth rotation rate for the Keplerian constellations, rad/s.
pub fn earth_rotation_rate(constellation: Constellation) -> f64 {
    match constellation {
        Constellation::BeiDou => 7.2921150e-5,
        _ => 7.2921151467e-5, // GPS, QZSS, IRNSS, Galileo
    }
}

/// Relativistic clock-correction coefficient `F` in `F * e * sqrt(A) * sin(Ek)`.
/// GPS/QZSS/IRNSS and Galileo each publish a fixed value in their ICD; BeiDou's
/// ICD instead gives the defining formula `F = -2*sqrt(mu)/c^2`, which we evaluate
/// directly rather than hardcoding BeiDou's own rounded constant.
pub fn relativistic_f(constellation: Constellation) -> f64 {
    match constellation {
        Constellation::Galileo => -4.442807309e-10,
        Constellation::BeiDou => -2.0 * gm(constellation).sqrt() / (SPEED_OF_LIGHT_MPS * SPEED_OF_LIGHT_MPS),
        _ => -4.442807633e-10, // GPS, QZSS, IRNSS
    }
}
