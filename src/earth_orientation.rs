//! # Earth orientation helpers
//!
//! Minimal frame machinery needed by the planner:
//!
//! - [`obleq`] – mean obliquity of the ecliptic (IAU 1976),
//! - [`precession_matrix`] – rotation from the J2000 mean equator to the mean equator of date,
//! - [`ecliptic_to_equatorial`] – rotation about the vernal-equinox axis,
//! - [`radec_to_unit`] / [`unit_to_radec`] – spherical ↔ Cartesian conversions.
//!
//! Target coordinates are catalogued in J2000 while altitudes are computed against the
//! true sky of the observing night; over a few decades precession moves a source by a
//! fraction of a degree, which is enough to shift an airmass threshold crossing by minutes.
use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{Radian, DPI, RADEG, RADSEC, T2000};

/// Compute the mean obliquity of the ecliptic at a given epoch (IAU 1976 model).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale).
///
/// Returns
/// --------
/// * Mean obliquity of the ecliptic in radians.
pub fn obleq(tjm: f64) -> Radian {
    let ob0 = ((23.0 * 3600.0 + 26.0 * 60.0) + 21.448) * RADSEC;
    let ob1 = -46.815 * RADSEC;
    let ob2 = -0.0006 * RADSEC;
    let ob3 = 0.00181 * RADSEC;

    let t = (tjm - T2000) / 36525.0;

    ((ob3 * t + ob2) * t + ob1) * t + ob0
}

/// Active rotation matrix of angle `alpha` (radians) about the axis `k` (0 = x, 1 = y, 2 = z).
///
/// # Panics
///
/// Panics if `k > 2`.
pub fn rotmt(alpha: f64, k: usize) -> Matrix3<f64> {
    let axis = match k {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        2 => Vector3::z_axis(),
        _ => panic!("invalid rotation axis index {k} (must be 0, 1 or 2)"),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Precession matrix from the J2000 mean equator to the mean equator and equinox of date.
///
/// IAU 1976 angles (ζ, z, θ) from the Astronomical Almanac:
///
/// ```text
/// ζ(T) = (0.6406161 + 0.0000839·T + 0.0000050·T²) · T  [deg]
/// z(T) = (0.6406161 + 0.0003041·T + 0.0000051·T²) · T  [deg]
/// θ(T) = (0.5567530 − 0.0001185·T − 0.0000116·T²) · T  [deg]
/// ```
///
/// and `x_date = P · x_J2000` with `P = R_z(z) · R_y(−θ) · R_z(ζ)` (active rotations).
pub fn precession_matrix(tjm: f64) -> Matrix3<f64> {
    let t = (tjm - T2000) / 36525.0;

    let zeta = ((0.0000050 * t + 0.0000839) * t + 0.6406161) * t * RADEG;
    let z = ((0.0000051 * t + 0.0003041) * t + 0.6406161) * t * RADEG;
    let theta = ((-0.0000116 * t - 0.0001185) * t + 0.5567530) * t * RADEG;

    rotmt(z, 2) * rotmt(-theta, 1) * rotmt(zeta, 2)
}

/// Rotation from ecliptic to equatorial coordinates for the obliquity of date.
pub fn ecliptic_to_equatorial(tjm: f64) -> Matrix3<f64> {
    rotmt(obleq(tjm), 0)
}

/// Unit vector pointing at (ra, dec), both in radians.
pub fn radec_to_unit(ra: Radian, dec: Radian) -> Vector3<f64> {
    let (sd, cd) = dec.sin_cos();
    let (sa, ca) = ra.sin_cos();
    Vector3::new(cd * ca, cd * sa, sd)
}

/// Right ascension in [0, 2π) and declination of a (non-zero) Cartesian vector, in radians.
pub fn unit_to_radec(vector: &Vector3<f64>) -> (Radian, Radian) {
    let norm = vector.norm();
    if norm == 0.0 {
        return (0.0, 0.0);
    }
    let dec = (vector.z / norm).clamp(-1.0, 1.0).asin();
    let ra = vector.y.atan2(vector.x).rem_euclid(DPI);
    (ra, dec)
}

/// Precess J2000 coordinates (radians) to the mean equator and equinox of `tjm`.
pub fn precess_from_j2000(ra: Radian, dec: Radian, tjm: f64) -> (Radian, Radian) {
    unit_to_radec(&(precession_matrix(tjm) * radec_to_unit(ra, dec)))
}
