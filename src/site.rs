//! # Observing site geometry
//!
//! [`Site`] stores the geodetic position of an observatory and converts equatorial
//! coordinates to the local horizontal frame:
//!
//! ```text
//! (ra, dec) J2000 --(precession)--> (ra, dec) of date --(LST, latitude)--> (alt, az)
//! ```
//!
//! Conventions
//! -----------------
//! * Longitudes are **east positive** (Palomar is at −116.865°).
//! * Azimuths are measured from North through East.
//! * Airmass is the plane-parallel `sec z`, undefined below the horizon.
use crate::constants::{Degree, Meter, Radian, DPI, RADEG};
use crate::earth_orientation::precess_from_j2000;
use crate::ephemeris::{moon_position, sun_position};
use crate::planobs_errors::PlanobsError;
use crate::time::gmst;

/// Local horizontal coordinates, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizontalPosition {
    pub altitude: Degree,
    pub azimuth: Degree,
}

impl HorizontalPosition {
    /// Plane-parallel airmass (`1 / sin(alt)`), `None` when the object is below the horizon.
    pub fn airmass(&self) -> Option<f64> {
        airmass(self.altitude)
    }
}

/// Plane-parallel airmass of an altitude in degrees, `None` at or below the horizon.
pub fn airmass(altitude: Degree) -> Option<f64> {
    (altitude > 0.0).then(|| 1.0 / (altitude * RADEG).sin())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub name: String,
    /// Geodetic latitude in **degrees**.
    pub latitude: Degree,
    /// Geodetic longitude in **degrees**, east positive.
    pub longitude: Degree,
    pub elevation: Meter,
}

impl Default for Site {
    fn default() -> Self {
        Self::palomar()
    }
}

impl Site {
    pub fn new(
        name: impl Into<String>,
        latitude: Degree,
        longitude: Degree,
        elevation: Meter,
    ) -> Result<Self, PlanobsError> {
        if !(-90.0..=90.0).contains(&latitude) || !latitude.is_finite() {
            return Err(PlanobsError::InvalidCoordinate(format!(
                "site latitude {latitude}"
            )));
        }
        if !longitude.is_finite() {
            return Err(PlanobsError::InvalidCoordinate(format!(
                "site longitude {longitude}"
            )));
        }
        Ok(Site {
            name: name.into(),
            latitude,
            longitude: (longitude + 180.0).rem_euclid(360.0) - 180.0,
            elevation,
        })
    }

    /// Palomar Observatory, home of the ZTF camera on the Samuel Oschin 48-inch telescope.
    pub fn palomar() -> Self {
        Site {
            name: "Palomar".into(),
            latitude: 33.3563,
            longitude: -116.8650,
            elevation: 1712.0,
        }
    }

    /// Local mean sidereal time in radians, in [0, 2π).
    pub fn local_sidereal_time(&self, mjd: f64) -> Radian {
        (gmst(mjd) + self.longitude * RADEG).rem_euclid(DPI)
    }

    /// Horizontal coordinates of a position already referred to the equator of date.
    ///
    /// Arguments
    /// -----------------
    /// * `ra`, `dec`: right ascension and declination of date, in **radians**.
    /// * `mjd`: UTC modified julian date of the observation.
    pub fn altaz_of_date(&self, ra: Radian, dec: Radian, mjd: f64) -> HorizontalPosition {
        let hour_angle = self.local_sidereal_time(mjd) - ra;
        let (sin_lat, cos_lat) = (self.latitude * RADEG).sin_cos();
        let (sin_dec, cos_dec) = dec.sin_cos();
        let (sin_ha, cos_ha) = hour_angle.sin_cos();

        let sin_alt = (sin_lat * sin_dec + cos_lat * cos_dec * cos_ha).clamp(-1.0, 1.0);
        let azimuth = (-cos_dec * sin_ha).atan2(sin_dec * cos_lat - cos_dec * sin_lat * cos_ha);

        HorizontalPosition {
            altitude: sin_alt.asin() / RADEG,
            azimuth: azimuth.rem_euclid(DPI) / RADEG,
        }
    }

    /// Horizontal coordinates of a J2000 position (degrees) at a given MJD.
    pub fn altaz(&self, ra: Degree, dec: Degree, mjd: f64) -> HorizontalPosition {
        let (ra_date, dec_date) = precess_from_j2000(ra * RADEG, dec * RADEG, mjd);
        self.altaz_of_date(ra_date, dec_date, mjd)
    }

    /// Altitude of the Sun in degrees.
    pub fn sun_altitude(&self, mjd: f64) -> Degree {
        let sun = sun_position(mjd);
        self.altaz_of_date(sun.ra, sun.dec, mjd).altitude
    }

    /// Altitude of the Moon in degrees (geocentric, parallax neglected).
    pub fn moon_altitude(&self, mjd: f64) -> Degree {
        let moon = moon_position(mjd);
        self.altaz_of_date(moon.ra, moon.dec, mjd).altitude
    }
}
