use hifitime::{Epoch, Unit};
use std::str::FromStr;

use crate::constants::{DPI, MINUTES_PER_DAY, MJD, SECONDS_PER_DAY, T2000};
use crate::planobs_errors::PlanobsError;

/// Parse a calendar date or a full ISO datetime into a UTC modified julian date (MJD)
///
/// Argument
/// --------
/// * `date`: a date `YYYY-MM-DD` (interpreted at 00:00 UTC), or any ISO datetime accepted by hifitime
///   (e.g. `2022-06-24T09:23:41 UTC`)
///
/// Return
/// ------
/// * the MJD in the UTC time scale, or [`PlanobsError::InvalidDate`]
pub fn parse_date(date: &str) -> Result<MJD, PlanobsError> {
    let date = date.trim();
    let parts: Vec<&str> = date.split('-').collect();

    if parts.len() == 3 && parts.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())) {
        let year = i32::from_str(parts[0]).map_err(|_| invalid_date(date))?;
        let month = u8::from_str(parts[1]).map_err(|_| invalid_date(date))?;
        let day = u8::from_str(parts[2]).map_err(|_| invalid_date(date))?;

        let epoch = Epoch::maybe_from_gregorian_utc(year, month, day, 0, 0, 0, 0)
            .map_err(|_| invalid_date(date))?;
        return Ok(epoch.to_mjd_utc_days());
    }

    Epoch::from_str(date)
        .map(|epoch| epoch.to_mjd_utc_days())
        .map_err(|_| invalid_date(date))
}

fn invalid_date(date: &str) -> PlanobsError {
    PlanobsError::InvalidDate(date.to_string())
}

/// Build a UTC MJD from calendar components.
pub fn gregorian_to_mjd(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: f64,
) -> Result<MJD, PlanobsError> {
    let whole = second.trunc();
    let nanos = ((second - whole) * 1e9).round() as u32;
    Epoch::maybe_from_gregorian_utc(year, month, day, hour, minute, whole as u8, nanos)
        .map(|epoch| epoch.to_mjd_utc_days())
        .map_err(|_| {
            PlanobsError::InvalidDate(format!(
                "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second}"
            ))
        })
}

/// Current date (00:00 UTC) as a MJD.
pub fn today_mjd() -> Result<MJD, PlanobsError> {
    let now = Epoch::now().map_err(|e| PlanobsError::InvalidDate(e.to_string()))?;
    Ok(now.to_mjd_utc_days().floor())
}

/// 00:00 UTC of the day containing `mjd`.
///
/// Dates parsed at midnight may land a few nanoseconds before the day boundary, those are
/// kept on their own day.
pub fn start_of_day(mjd: MJD) -> MJD {
    (mjd + 1e-9).floor()
}

/// Round a MJD to the nearest whole UTC minute
pub fn round_to_minute(mjd: MJD) -> MJD {
    (mjd * MINUTES_PER_DAY).round() / MINUTES_PER_DAY
}

/// Shift a MJD by a number of seconds
pub fn add_seconds(mjd: MJD, seconds: f64) -> MJD {
    mjd + seconds / SECONDS_PER_DAY
}

/// Number of seconds between two MJD, rounded to the closest integer
pub fn seconds_between(start: MJD, end: MJD) -> u32 {
    ((end - start) * SECONDS_PER_DAY).round().max(0.0) as u32
}

/// Format a MJD (UTC) as `YYYY-MM-DD HH:MM:SS`, rounded to the nearest second.
pub fn mjd_to_iso_seconds(mjd: MJD) -> String {
    let epoch = Epoch::from_mjd_utc(mjd).round(Unit::Second * 1);
    let (y, m, d, hh, mm, ss, _) = epoch.to_gregorian_utc();
    format!("{y:04}-{m:02}-{d:02} {hh:02}:{mm:02}:{ss:02}")
}

/// Format the calendar date of a MJD (UTC) as `YYYY-MM-DD`.
pub fn mjd_to_date(mjd: MJD) -> String {
    let epoch = Epoch::from_mjd_utc(mjd).round(Unit::Second * 1);
    let (y, m, d, ..) = epoch.to_gregorian_utc();
    format!("{y:04}-{m:02}-{d:02}")
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT1 time scale).
///
/// This function implements the IAU 1982 polynomial formula
/// for the mean sidereal time at 0h UT1, plus the fractional-day
/// correction term due to Earth's rotation rate.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (MJD, UT1 time scale). UTC may be used
///   in place of UT1 at planning precision (|UT1 − UTC| < 0.9 s).
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
pub fn gmst(tjm: f64) -> f64 {
    // Polynomial coefficients for GMST at 0h UT1 (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    // Ratio of sidereal day to solar day
    const RAP: f64 = 1.00273790934;

    let itjm = tjm.floor();
    let t = (itjm - T2000) / 36525.0;

    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / SECONDS_PER_DAY;

    let h = (tjm - itjm) * DPI;
    (gmst0 + h * RAP).rem_euclid(DPI)
}
