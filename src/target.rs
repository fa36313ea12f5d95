//! # Targets and alert sources
//!
//! A [`Target`] is what a plan observes: a J2000 position, an optional asymmetric
//! positional uncertainty (as published for IceCube neutrino tracks) and an optional
//! arrival time. The uncertainty defines a rectangular [`SkyRegion`] used to score how
//! well each ZTF field covers the alert.
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{Degree, MJD};
use crate::conversion::wrap_delta_ra;
use crate::planobs_errors::PlanobsError;

static ZTF_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ZTF\d{2}[a-z]{7}$").expect("static ZTF name pattern")
});

static ICECUBE_SHORT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^IC(\d{6}[A-Z])$").expect("static IceCube name pattern")
});

static ICECUBE_LONG_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^IceCube-(\d{6}[A-Z])$").expect("static IceCube name pattern")
});

/// Where the target (and its coordinates) comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AlertSource {
    /// A ZTF transient, resolved through the ZTF alert archive.
    Ztf,
    /// An IceCube neutrino alert, resolved through GCN circulars.
    IceCube,
    /// Coordinates are given by the user.
    #[default]
    None,
}

impl FromStr for AlertSource {
    type Err = PlanobsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ztf" => Ok(AlertSource::Ztf),
            "icecube" => Ok(AlertSource::IceCube),
            "" | "none" => Ok(AlertSource::None),
            _ => Err(PlanobsError::UnknownAlertSource(s.to_string())),
        }
    }
}

impl fmt::Display for AlertSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSource::Ztf => write!(f, "ZTF"),
            AlertSource::IceCube => write!(f, "icecube"),
            AlertSource::None => write!(f, "none"),
        }
    }
}

/// Check that a ZTF object name has the `ZTFYYaaaaaaa` form.
pub fn is_ztf_name(name: &str) -> bool {
    ZTF_NAME.is_match(name)
}

/// Convert an IceCube event name to the form used in GCN circular subjects.
///
/// `IC220624A` and `IceCube-220624A` both give `IceCube-220624A`.
pub fn icecube_circular_name(name: &str) -> Result<String, PlanobsError> {
    let name = name.trim();
    ICECUBE_SHORT_NAME
        .captures(name)
        .or_else(|| ICECUBE_LONG_NAME.captures(name))
        .map(|caps| format!("IceCube-{}", &caps[1]))
        .ok_or_else(|| PlanobsError::InvalidTargetName {
            source_name: AlertSource::IceCube.to_string(),
            name: name.to_string(),
        })
}

/// Asymmetric uncertainty on one coordinate, in degrees.
///
/// `plus` is non-negative and `minus` non-positive, as printed in IceCube circulars
/// (`RA: 224.12 (+0.95 -1.24 deg 90% PSF containment)`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionError {
    pub plus: Degree,
    pub minus: Degree,
}

impl PositionError {
    pub fn new(plus: Degree, minus: Degree) -> Self {
        PositionError {
            plus: plus.abs(),
            minus: -minus.abs(),
        }
    }

    pub fn symmetric(radius: Degree) -> Self {
        Self::new(radius, radius)
    }
}

/// Rectangular sky region in (ra, dec). `ra_min` may exceed `ra_max` when the region
/// straddles RA = 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyRegion {
    pub ra_min: Degree,
    pub ra_max: Degree,
    pub dec_min: Degree,
    pub dec_max: Degree,
}

impl SkyRegion {
    /// Width of the region along right ascension, in RA degrees.
    pub fn ra_span(&self) -> Degree {
        (self.ra_max - self.ra_min).rem_euclid(360.0)
    }

    pub fn contains(&self, ra: Degree, dec: Degree) -> bool {
        let offset = (ra - self.ra_min).rem_euclid(360.0);
        offset <= self.ra_span() && dec >= self.dec_min && dec <= self.dec_max
    }

    /// Solid angle of the region in square degrees.
    pub fn area(&self) -> f64 {
        let rad = std::f64::consts::PI / 180.0;
        self.ra_span() * ((self.dec_max * rad).sin() - (self.dec_min * rad).sin()) / rad
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    /// J2000 right ascension, degrees.
    pub ra: Degree,
    /// J2000 declination, degrees.
    pub dec: Degree,
    pub ra_err: Option<PositionError>,
    pub dec_err: Option<PositionError>,
    /// Time of the alert (UTC MJD), when known.
    pub arrival_time: Option<MJD>,
    pub alert_source: AlertSource,
}

impl Target {
    pub fn new(name: impl Into<String>, ra: Degree, dec: Degree) -> Result<Self, PlanobsError> {
        if !ra.is_finite() {
            return Err(PlanobsError::InvalidCoordinate(format!("right ascension {ra}")));
        }
        if !(-90.0..=90.0).contains(&dec) {
            return Err(PlanobsError::InvalidCoordinate(format!("declination {dec}")));
        }
        Ok(Target {
            name: name.into(),
            ra: ra.rem_euclid(360.0),
            dec,
            ra_err: None,
            dec_err: None,
            arrival_time: None,
            alert_source: AlertSource::None,
        })
    }

    pub fn with_errors(mut self, ra_err: PositionError, dec_err: PositionError) -> Self {
        self.ra_err = Some(ra_err);
        self.dec_err = Some(dec_err);
        self
    }

    pub fn with_arrival_time(mut self, arrival_time: MJD) -> Self {
        self.arrival_time = Some(arrival_time);
        self
    }

    pub fn with_alert_source(mut self, alert_source: AlertSource) -> Self {
        self.alert_source = alert_source;
        self
    }

    /// Rectangle spanned by the positional uncertainty, `None` for point-like targets.
    pub fn error_region(&self) -> Option<SkyRegion> {
        let ra_err = self.ra_err?;
        let dec_err = self.dec_err?;

        // Wider than the whole sky only happens for degenerate alerts, keep it just below 360°
        let span = (ra_err.plus - ra_err.minus).min(359.999_999);
        let ra_min = (self.ra + ra_err.minus).rem_euclid(360.0);
        Some(SkyRegion {
            ra_min,
            ra_max: (ra_min + span).rem_euclid(360.0),
            dec_min: (self.dec + dec_err.minus).max(-90.0),
            dec_max: (self.dec + dec_err.plus).min(90.0),
        })
    }

    /// Signed RA offset of a position from the target, in RA degrees wrapped to (-180, 180].
    pub fn ra_offset(&self, ra: Degree) -> Degree {
        wrap_delta_ra(ra - self.ra)
    }
}

#[cfg(test)]
mod target_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_alert_source_parse() {
        assert_eq!("ZTF".parse::<AlertSource>().unwrap(), AlertSource::Ztf);
        assert_eq!("icecube".parse::<AlertSource>().unwrap(), AlertSource::IceCube);
        assert_eq!("IceCube".parse::<AlertSource>().unwrap(), AlertSource::IceCube);
        assert_eq!(
            "fermi".parse::<AlertSource>().unwrap_err(),
            PlanobsError::UnknownAlertSource("fermi".into())
        );
    }

    #[test]
    fn test_names() {
        assert!(is_ztf_name("ZTF19accdntg"));
        assert!(!is_ztf_name("ZTF19ACCDNTG"));
        assert!(!is_ztf_name("IC220624A"));
        assert_eq!(icecube_circular_name("IC220624A").unwrap(), "IceCube-220624A");
        assert_eq!(icecube_circular_name("IceCube-220501A").unwrap(), "IceCube-220501A");
        assert!(icecube_circular_name("IC22062A").is_err());
    }

    #[test]
    fn test_error_region() {
        let target = Target::new("IC220624A", 224.12, 41.19)
            .unwrap()
            .with_errors(PositionError::new(0.95, -1.24), PositionError::new(0.70, -0.98));
        let region = target.error_region().unwrap();
        assert_abs_diff_eq!(region.ra_min, 222.88, epsilon = 1e-9);
        assert_abs_diff_eq!(region.ra_max, 225.07, epsilon = 1e-9);
        assert_abs_diff_eq!(region.dec_min, 40.21, epsilon = 1e-9);
        assert_abs_diff_eq!(region.dec_max, 41.89, epsilon = 1e-9);
        assert!(region.contains(224.12, 41.19));
        assert!(!region.contains(226.0, 41.19));
        assert!(Target::new("point", 1.0, 2.0).unwrap().error_region().is_none());
    }

    #[test]
    fn test_error_region_wraps_ra() {
        let target = Target::new("wrap", 0.5, -10.0)
            .unwrap()
            .with_errors(PositionError::symmetric(1.0), PositionError::symmetric(1.0));
        let region = target.error_region().unwrap();
        assert_abs_diff_eq!(region.ra_min, 359.5, epsilon = 1e-9);
        assert_abs_diff_eq!(region.ra_max, 1.5, epsilon = 1e-9);
        assert_abs_diff_eq!(region.ra_span(), 2.0, epsilon = 1e-9);
        assert!(region.contains(0.0, -10.0));
        assert!(region.contains(359.8, -10.5));
        assert!(!region.contains(2.0, -10.0));
    }

    #[test]
    fn test_region_area() {
        let region = SkyRegion {
            ra_min: 0.0,
            ra_max: 10.0,
            dec_min: -5.0,
            dec_max: 5.0,
        };
        // Close to 100 deg² near the equator
        assert_abs_diff_eq!(region.area(), 99.87, epsilon = 0.01);
    }

    #[test]
    fn test_invalid_target() {
        assert!(Target::new("bad", 10.0, 95.0).is_err());
        assert!(Target::new("bad", f64::NAN, 0.0).is_err());
        assert_eq!(Target::new("wrap", -10.0, 0.0).unwrap().ra, 350.0);
    }
}
