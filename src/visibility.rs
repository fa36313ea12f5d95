//! # Night and target visibility
//!
//! This module answers the two questions a follow-up plan starts with:
//!
//! 1. **When is it dark?** [`find_night`] locates the astronomical night following a
//!    given instant, i.e. the interval where the Sun stays below a twilight altitude
//!    (−18° by default).
//! 2. **When is the target worth observing?** [`AirmassCurve`] samples the target altitude
//!    and airmass (plus the Sun and Moon altitudes) over the day of that night; the
//!    minimum-airmass time then anchors the recommended g/r observation windows
//!    ([`recommend_windows`]).
//!
//! ## Night search
//!
//! The Sun altitude is scanned with a coarse 10 minute step starting at `from_mjd`. The first
//! sign change from "above the threshold" to "below" brackets the evening twilight, the next
//! opposite change brackets the morning twilight; both are refined with Brent's method
//! ([`roots::find_root_brent`]). When no crossing is found within 1.5 days (polar day or
//! polar night) there is no night to plan.
//!
//! ## Sampling
//!
//! The airmass curve is sampled on a grid starting at 00:00 UTC of the plan date and covering
//! the whole day. Only samples at least [`TWILIGHT_MARGIN`] (0.01 day) inside the night count
//! as observable, so the minimum airmass never sits on a twilight.
//!
//! ## Windows
//!
//! Let `t_min` be the time of minimum airmass among the observable samples. When `t_min`
//! lies in the second half of the night, the target is still rising at dawn and windows
//! are placed *before* it:
//!
//! ```text
//! g: [t_min − length − 30 min, t_min − 30 min]     r: [t_min − length, t_min]
//! ```
//!
//! otherwise the target is setting and windows start at it:
//!
//! ```text
//! g: [t_min, t_min + length]     r: [t_min + 30 min, t_min + 30 min + length]
//! ```
//!
//! Window starts are rounded to the nearest whole UTC minute.
use itertools::Itertools;
use roots::{find_root_brent, SimpleConvergency};

use crate::constants::{Band, Degree, Seconds, FILTER_SEPARATION, MJD, RADEG, SECONDS_PER_DAY};
use crate::earth_orientation::precess_from_j2000;
use crate::planobs_errors::PlanobsError;
use crate::site::{airmass, Site};
use crate::time::{add_seconds, mjd_to_iso_seconds, round_to_minute, seconds_between};

/// Step of the coarse Sun altitude scan, in days (10 minutes).
const NIGHT_SCAN_STEP: f64 = 10.0 / 1440.0;

/// Longest interval searched for a twilight crossing, in days.
const NIGHT_SEARCH_SPAN: f64 = 1.5;

/// Samples closer than this to either twilight are not planned on, in days (14.4 minutes).
pub const TWILIGHT_MARGIN: f64 = 0.01;

/// An interval of darkness, bounded by the evening and morning twilights (UTC MJD).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Night {
    pub evening: MJD,
    pub morning: MJD,
}

impl Night {
    pub fn duration_hours(&self) -> f64 {
        (self.morning - self.evening) * 24.0
    }

    pub fn contains(&self, mjd: MJD) -> bool {
        mjd >= self.evening && mjd <= self.morning
    }

    /// `true` when `mjd` is inside the night and at least [`TWILIGHT_MARGIN`] away from both
    /// twilights.
    pub fn is_dark(&self, mjd: MJD) -> bool {
        mjd >= self.evening + TWILIGHT_MARGIN && mjd <= self.morning - TWILIGHT_MARGIN
    }

    /// `true` when `mjd` is closer to the morning twilight than to the evening one.
    pub fn is_late(&self, mjd: MJD) -> bool {
        (self.morning - mjd) < (mjd - self.evening)
    }
}

/// Search the first crossing of `f` in the given direction between `from` and
/// `from + NIGHT_SEARCH_SPAN`, refined to sub-second precision.
fn find_crossing<F>(f: &F, from: MJD, falling: bool) -> Result<Option<MJD>, PlanobsError>
where
    F: Fn(f64) -> f64,
{
    let steps = (NIGHT_SEARCH_SPAN / NIGHT_SCAN_STEP).ceil() as usize;

    let bracket = (0..steps)
        .map(|i| from + i as f64 * NIGHT_SCAN_STEP)
        .map(|t| (t, f(t)))
        .tuple_windows()
        .find(|((_, fa), (_, fb))| {
            if falling {
                *fa >= 0.0 && *fb < 0.0
            } else {
                *fa < 0.0 && *fb >= 0.0
            }
        });

    let Some(((a, _), (b, _))) = bracket else {
        return Ok(None);
    };

    // 1e-7 day ≈ 9 ms
    let mut convergency = SimpleConvergency {
        eps: 1e-7,
        max_iter: 60,
    };
    Ok(Some(find_root_brent(a, b, f, &mut convergency)?))
}

/// Find the night following `from_mjd` at a site.
///
/// Arguments
/// ---------
/// * `site`: the observatory.
/// * `from_mjd`: start of the search (UTC MJD); the night returned is the first one whose
///   evening twilight comes after this instant.
/// * `sun_altitude`: twilight altitude of the Sun in degrees (e.g. −18 for astronomical night).
///
/// Return
/// ------
/// * `Some(Night)`, or `None` when the Sun does not cross the threshold within 1.5 days.
pub fn find_night(
    site: &Site,
    from_mjd: MJD,
    sun_altitude: Degree,
) -> Result<Option<Night>, PlanobsError> {
    let f = |t: f64| site.sun_altitude(t) - sun_altitude;

    let Some(evening) = find_crossing(&f, from_mjd, true)? else {
        return Ok(None);
    };
    let Some(morning) = find_crossing(&f, evening, false)? else {
        return Ok(None);
    };

    log::debug!(
        "Night at {}: {} -> {}",
        site.name,
        mjd_to_iso_seconds(evening),
        mjd_to_iso_seconds(morning)
    );
    Ok(Some(Night { evening, morning }))
}

/// State of the sky at one instant of the night.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirmassSample {
    pub mjd: MJD,
    /// Target altitude, degrees.
    pub altitude: Degree,
    /// Target airmass, `None` below the horizon.
    pub airmass: Option<f64>,
    pub sun_altitude: Degree,
    pub moon_altitude: Degree,
}

impl AirmassSample {
    /// Above the horizon and below `max_airmass`, regardless of the Sun.
    pub fn within_airmass(&self, max_airmass: f64) -> bool {
        self.airmass.is_some_and(|am| am <= max_airmass)
    }
}

/// Target altitude and airmass sampled over the day of a night.
#[derive(Debug, Clone, PartialEq)]
pub struct AirmassCurve {
    night: Night,
    samples: Vec<AirmassSample>,
}

impl AirmassCurve {
    /// Sample a J2000 position on a regular grid starting at `start`.
    ///
    /// The grid covers one day from `start`, extended up to the morning twilight when the
    /// night ends later than that. Both ends are included when they fall on the grid.
    ///
    /// Arguments
    /// ---------
    /// * `site`: the observatory.
    /// * `ra`, `dec`: J2000 coordinates of the target in degrees.
    /// * `start`: first sample (UTC MJD), usually 00:00 of the plan date.
    /// * `night`: the night the curve is used for.
    /// * `time_resolution`: sampling step in seconds.
    pub fn compute(
        site: &Site,
        ra: Degree,
        dec: Degree,
        start: MJD,
        night: &Night,
        time_resolution: Seconds,
    ) -> Self {
        let step = time_resolution.max(1.0);
        let span = (start + 1.0).max(night.morning) - start;
        // 1e-6 keeps a step dividing the span exactly from losing the last sample
        let n_samples = (span * SECONDS_PER_DAY / step + 1e-6).floor() as usize;

        // Precession hardly moves within a night, a single epoch is enough
        let (ra_date, dec_date) = precess_from_j2000(ra * RADEG, dec * RADEG, night.evening);

        let samples = (0..=n_samples)
            .map(|i| add_seconds(start, i as f64 * step))
            .map(|mjd| {
                let altitude = site.altaz_of_date(ra_date, dec_date, mjd).altitude;
                AirmassSample {
                    mjd,
                    altitude,
                    airmass: airmass(altitude),
                    sun_altitude: site.sun_altitude(mjd),
                    moon_altitude: site.moon_altitude(mjd),
                }
            })
            .collect();

        AirmassCurve {
            night: *night,
            samples,
        }
    }

    pub fn night(&self) -> &Night {
        &self.night
    }

    pub fn samples(&self) -> &[AirmassSample] {
        &self.samples
    }

    /// A sample is observable when it is dark (see [`Night::is_dark`]) and the target is
    /// below `max_airmass`.
    pub fn is_observable_sample(&self, sample: &AirmassSample, max_airmass: f64) -> bool {
        self.night.is_dark(sample.mjd) && sample.within_airmass(max_airmass)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Dark samples where the target is above the horizon and below `max_airmass`.
    pub fn observable_samples(&self, max_airmass: f64) -> impl Iterator<Item = &AirmassSample> {
        self.samples
            .iter()
            .filter(move |s| self.is_observable_sample(s, max_airmass))
    }

    pub fn is_observable(&self, max_airmass: f64) -> bool {
        self.observable_samples(max_airmass).next().is_some()
    }

    /// Observable sample with the lowest airmass (the earliest one on ties).
    pub fn best_sample(&self, max_airmass: f64) -> Option<&AirmassSample> {
        self.observable_samples(max_airmass).min_by(|a, b| {
            a.airmass
                .unwrap_or(f64::INFINITY)
                .total_cmp(&b.airmass.unwrap_or(f64::INFINITY))
        })
    }

    /// First and last observable instants, `None` when the target is never observable.
    pub fn observable_interval(&self, max_airmass: f64) -> Option<(MJD, MJD)> {
        match self
            .observable_samples(max_airmass)
            .map(|s| s.mjd)
            .minmax()
        {
            itertools::MinMaxResult::NoElements => None,
            itertools::MinMaxResult::OneElement(t) => Some((t, t)),
            itertools::MinMaxResult::MinMax(a, b) => Some((a, b)),
        }
    }
}

/// One planned exposure window in a given band (UTC MJD).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationWindow {
    pub band: Band,
    pub start: MJD,
    pub end: MJD,
}

impl ObservationWindow {
    pub fn new(band: Band, start: MJD, length: Seconds) -> Self {
        ObservationWindow {
            band,
            start,
            end: add_seconds(start, length),
        }
    }

    /// Window length in whole seconds.
    pub fn exposure_time(&self) -> u32 {
        seconds_between(self.start, self.end)
    }
}

impl std::fmt::Display for ObservationWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            mjd_to_iso_seconds(self.start),
            mjd_to_iso_seconds(self.end)
        )
    }
}

/// Place the observation windows of a night around the minimum-airmass time.
///
/// Arguments
/// ---------
/// * `night`: the night the windows belong to.
/// * `t_min`: time of minimum airmass (UTC MJD).
/// * `length`: length of each window in seconds.
/// * `bands`: bands to schedule; the g window always precedes the r window by 30 minutes
///   and the i band, when requested, follows r by another 30 minutes.
///
/// Return
/// ------
/// * One window per requested band, in band order.
pub fn recommend_windows(
    night: &Night,
    t_min: MJD,
    length: Seconds,
    bands: &[Band],
) -> Vec<ObservationWindow> {
    let first_start = if night.is_late(t_min) {
        add_seconds(t_min, -length - FILTER_SEPARATION)
    } else {
        t_min
    };

    bands
        .iter()
        .sorted()
        .dedup()
        .map(|band| {
            let offset = match band {
                Band::G => 0.0,
                Band::R => FILTER_SEPARATION,
                Band::I => 2.0 * FILTER_SEPARATION,
            };
            let start = round_to_minute(add_seconds(first_start, offset));
            ObservationWindow::new(*band, start, length)
        })
        .collect()
}

#[cfg(test)]
mod visibility_test {
    use super::*;
    use crate::constants::{ASTRONOMICAL_TWILIGHT, MINUTES_PER_DAY};
    use approx::assert_abs_diff_eq;

    /// Two minutes, in days
    const TOLERANCE: f64 = 2.0 / MINUTES_PER_DAY;

    fn utc(mjd: f64, h: f64, m: f64, s: f64) -> f64 {
        mjd + (h * 3600.0 + m * 60.0 + s) / SECONDS_PER_DAY
    }

    #[test]
    fn test_palomar_may_night() {
        let site = Site::palomar();
        let night = find_night(&site, 59702.0, ASTRONOMICAL_TWILIGHT)
            .unwrap()
            .unwrap();

        assert_abs_diff_eq!(night.evening, utc(59702.0, 4.0, 3.0, 1.0), epsilon = TOLERANCE);
        assert_abs_diff_eq!(night.morning, utc(59702.0, 11.0, 25.0, 21.0), epsilon = TOLERANCE);
        assert!(night.duration_hours() > 5.0 && night.duration_hours() < 10.0);

        // The Sun sits on the threshold at both ends
        assert_abs_diff_eq!(site.sun_altitude(night.evening), -18.0, epsilon = 1e-3);
        assert_abs_diff_eq!(site.sun_altitude(night.morning), -18.0, epsilon = 1e-3);
    }

    #[test]
    fn test_night_starts_after_search_start() {
        let site = Site::palomar();
        // Starting in the middle of a night gives the next one
        let from = utc(59702.0, 6.0, 0.0, 0.0);
        let night = find_night(&site, from, ASTRONOMICAL_TWILIGHT)
            .unwrap()
            .unwrap();
        assert!(night.evening > 59703.0);
        assert!(night.evening - from < 1.0);
    }

    #[test]
    fn test_no_night_in_polar_summer() {
        let site = Site::new("Svalbard", 78.2, 15.6, 0.0).unwrap();
        assert_eq!(
            find_night(&site, 59752.0, ASTRONOMICAL_TWILIGHT).unwrap(),
            None
        );
    }

    #[test]
    fn test_airmass_curve_observability() {
        let site = Site::palomar();
        let night = find_night(&site, 59702.0, ASTRONOMICAL_TWILIGHT)
            .unwrap()
            .unwrap();

        let curve = AirmassCurve::compute(&site, 311.57, 18.68, 59702.0, &night, 60.0);
        assert_eq!(curve.samples().first().unwrap().mjd, 59702.0);
        assert_eq!(curve.samples().len(), 1441);
        assert!(curve.is_observable(2.0));
        assert!(curve
            .observable_samples(2.0)
            .all(|s| s.sun_altitude < -18.0 && night.is_dark(s.mjd)));

        // Rising target: the best airmass is reached at the last dark sample
        let best = curve.best_sample(2.0).unwrap();
        assert!(best.mjd <= night.morning - TWILIGHT_MARGIN);
        assert_abs_diff_eq!(
            best.mjd,
            night.morning - TWILIGHT_MARGIN,
            epsilon = 1.0 / MINUTES_PER_DAY
        );
        let (first, last) = curve.observable_interval(2.0).unwrap();
        assert!(first < last && last == best.mjd);

        // Never above the horizon from Palomar
        let south = AirmassCurve::compute(&site, 311.57, -80.0, 59702.0, &night, 60.0);
        assert!(!south.is_observable(2.0));
        assert!(south.best_sample(2.0).is_none());
        assert!(south.observable_interval(2.0).is_none());
    }

    #[test]
    fn test_twilight_margin() {
        let night = Night {
            evening: 59702.17,
            morning: 59702.47,
        };
        assert!(night.contains(59702.175));
        assert!(!night.is_dark(59702.175));
        assert!(!night.is_dark(59702.465));
        assert!(night.is_dark(59702.185));
        assert!(night.is_dark(59702.455));
    }

    #[test]
    fn test_bright_samples_are_not_observable() {
        let site = Site::palomar();
        let night = find_night(&site, 59702.0, ASTRONOMICAL_TWILIGHT)
            .unwrap()
            .unwrap();
        let curve = AirmassCurve::compute(&site, 311.57, 18.68, 59702.0, &night, 60.0);

        // Daytime and twilight samples may have a low airmass but are never planned on
        let bright = curve
            .samples()
            .iter()
            .filter(|s| s.within_airmass(2.0) && !night.is_dark(s.mjd))
            .collect::<Vec<_>>();
        assert!(!bright.is_empty());
        assert!(bright.iter().all(|s| !curve.is_observable_sample(s, 2.0)));
    }

    #[test]
    fn test_recommend_windows_late_in_night() {
        let site = Site::palomar();
        let night = find_night(&site, 59702.0, ASTRONOMICAL_TWILIGHT)
            .unwrap()
            .unwrap();
        let curve = AirmassCurve::compute(&site, 311.57, 18.68, 59702.0, &night, 60.0);
        let t_min = curve.best_sample(2.0).unwrap().mjd;

        let windows = recommend_windows(&night, t_min, 300.0, &[Band::R, Band::G]);
        assert_eq!(windows.len(), 2);
        let (g, r) = (windows[0], windows[1]);
        assert_eq!(g.band, Band::G);
        assert_abs_diff_eq!(g.start, utc(59702.0, 10.0, 35.0, 0.0), epsilon = 1e-9);
        assert_abs_diff_eq!(r.start - g.start, 30.0 / MINUTES_PER_DAY, epsilon = 1e-9);
        assert_eq!(g.exposure_time(), 300);
        assert!(r.end <= t_min + 0.5 / MINUTES_PER_DAY);

        // Starts fall on whole minutes
        let minutes = g.start * MINUTES_PER_DAY;
        assert_abs_diff_eq!(minutes, minutes.round(), epsilon = 1e-6);
    }

    #[test]
    fn test_recommend_windows_early_in_night() {
        let night = Night {
            evening: 59702.17,
            morning: 59702.47,
        };
        let t_min = 59702.2;
        let windows = recommend_windows(&night, t_min, 30.0, &[Band::G, Band::R]);
        assert_abs_diff_eq!(windows[0].start, round_to_minute(t_min), epsilon = 1e-12);
        assert_abs_diff_eq!(
            windows[1].start,
            round_to_minute(t_min + 30.0 / MINUTES_PER_DAY),
            epsilon = 1e-12
        );
        assert_eq!(windows[1].exposure_time(), 30);
    }

    #[test]
    fn test_window_display() {
        let window = ObservationWindow::new(Band::G, 59702.44097222222, 300.0);
        assert_eq!(
            window.to_string(),
            "2022-05-03 10:35:00 - 2022-05-03 10:40:00"
        );
    }
}
