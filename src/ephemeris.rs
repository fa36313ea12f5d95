//! # Low-precision Sun and Moon ephemerides
//!
//! Planning only needs the Sun altitude to within a fraction of a degree (twilight
//! crossings) and the Moon position to within about a degree (separation and
//! illumination reporting). The formulas of the *Astronomical Almanac* low-precision
//! section are sufficient for both:
//!
//! - Sun: ≈ 0.01° in position between 1950 and 2050,
//! - Moon: ≈ 0.3° in ecliptic longitude, 0.2° in latitude (geocentric).
//!
//! All functions take a MJD; the difference between UTC and TT (about one minute) is
//! negligible at this precision.
use nalgebra::Vector3;

use crate::constants::{Degree, Radian, RADEG, T2000};
use crate::earth_orientation::{ecliptic_to_equatorial, obleq, radec_to_unit, unit_to_radec};

/// Geocentric apparent equatorial position (right ascension, declination) in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquatorialPosition {
    pub ra: Radian,
    pub dec: Radian,
}

impl EquatorialPosition {
    pub fn unit_vector(&self) -> Vector3<f64> {
        radec_to_unit(self.ra, self.dec)
    }

    pub fn ra_deg(&self) -> Degree {
        self.ra / RADEG
    }

    pub fn dec_deg(&self) -> Degree {
        self.dec / RADEG
    }
}

fn sin_deg(x: f64) -> f64 {
    (x * RADEG).sin()
}

/// Position of the Sun at a given MJD.
pub fn sun_position(mjd: f64) -> EquatorialPosition {
    let n = mjd - T2000;

    // Mean longitude and mean anomaly, degrees
    let mean_longitude = (280.460 + 0.9856474 * n).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.9856003 * n).rem_euclid(360.0);

    let ecliptic_longitude = (mean_longitude
        + 1.915 * sin_deg(mean_anomaly)
        + 0.020 * sin_deg(2.0 * mean_anomaly))
        * RADEG;

    let eps = obleq(mjd);
    let (sl, cl) = ecliptic_longitude.sin_cos();

    EquatorialPosition {
        ra: (eps.cos() * sl).atan2(cl).rem_euclid(std::f64::consts::TAU),
        dec: (eps.sin() * sl).asin(),
    }
}

/// Geocentric position of the Moon at a given MJD.
pub fn moon_position(mjd: f64) -> EquatorialPosition {
    let t = (mjd - T2000) / 36525.0;

    let longitude = 218.32 + 481267.881 * t + 6.29 * sin_deg(135.0 + 477198.87 * t)
        - 1.27 * sin_deg(259.3 - 413335.36 * t)
        + 0.66 * sin_deg(235.7 + 890534.22 * t)
        + 0.21 * sin_deg(269.9 + 954397.74 * t)
        - 0.19 * sin_deg(357.5 + 35999.05 * t)
        - 0.11 * sin_deg(186.5 + 966404.03 * t);

    let latitude = 5.13 * sin_deg(93.3 + 483202.02 * t) + 0.28 * sin_deg(228.2 + 960400.89 * t)
        - 0.28 * sin_deg(318.3 + 6003.15 * t)
        - 0.17 * sin_deg(217.6 - 407332.21 * t);

    let ecliptic = radec_to_unit(longitude.rem_euclid(360.0) * RADEG, latitude * RADEG);
    let (ra, dec) = unit_to_radec(&(ecliptic_to_equatorial(mjd) * ecliptic));

    EquatorialPosition { ra, dec }
}

/// Illuminated fraction of the lunar disk (0 = new moon, 1 = full moon).
///
/// The phase angle is approximated by the supplement of the Sun–Moon elongation, which is
/// accurate to a fraction of a percent since the Moon is ~400 times closer than the Sun.
pub fn moon_illumination(mjd: f64) -> f64 {
    let sun = sun_position(mjd).unit_vector();
    let moon = moon_position(mjd).unit_vector();
    let cos_elongation = sun.dot(&moon).clamp(-1.0, 1.0);
    (1.0 - cos_elongation) / 2.0
}
