//! # AMON notices
//!
//! The automated GCN/AMON notices of IceCube Gold and Bronze tracks are `KEY: value`
//! records, some values continuing on indented lines:
//!
//! ```text
//! NOTICE_TYPE:      ICECUBE Astrotrack Gold
//! RUN_NUM:          136889
//! EVENT_NUM:        28484006
//! SRC_RA:           224.2108d {+14h 56m 51s} (J2000),
//!                   224.4622d {+14h 57m 51s} (current),
//! SRC_ERROR:        77.99 [arcmin radius, stat-only, 90% containment]
//! DISCOVERY_DATE:   19754 TJD;   175 DOY;   22/06/24 (yy/mm/dd)
//! DISCOVERY_TIME:   33821 SOD {09:23:41.02} UT
//! ```
//!
//! A notice page accumulates every revision of an event, separated by a line of slashes.
use nom::{
    bytes::complete::{take_till, take_while1},
    character::complete::{char, not_line_ending, space0},
    sequence::{delimited, preceded},
    IResult, Parser,
};

use crate::constants::{Degree, ARCMIN_TO_DEG, MJD};
use crate::planobs_errors::PlanobsError;
use crate::target::{AlertSource, PositionError, Target};
use crate::time::gregorian_to_mjd;

use super::circular::{parse_calendar_date, parse_clock_time};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmonNotice {
    records: Vec<(String, String)>,
}

/// `KEY:   value` or `KEY :  value`.
fn record_line(input: &str) -> IResult<&str, (&str, &str)> {
    (
        take_while1(|c: char| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'),
        preceded((space0, char(':'), space0), not_line_ending),
    )
        .parse(input)
}

/// Leading number of a value, with an optional unit letter (`224.2108d`, `+41.3161d`, `77.99`).
fn leading_number(value: &str) -> Option<f64> {
    value
        .split_whitespace()
        .next()
        .map(|token| token.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == ','))
        .and_then(|token| token.parse::<f64>().ok())
}

/// `... {09:23:41.02} UT` into the time inside the braces.
fn braced_time(input: &str) -> IResult<&str, (u8, u8, f64)> {
    preceded(
        take_till(|c| c == '{'),
        delimited(char('{'), parse_clock_time, char('}')),
    )
    .parse(input)
}

/// Parse one notice (a single revision).
///
/// Lines that are neither records nor indented continuation lines are ignored.
pub fn parse_amon_notice(text: &str) -> Result<AmonNotice, PlanobsError> {
    let mut records: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let continuation = line.starts_with(char::is_whitespace);
        match (continuation, record_line(line)) {
            (false, Ok((_, (key, value)))) => {
                records.push((key.to_string(), value.trim().to_string()));
            }
            (true, _) => {
                if let Some((_, value)) = records.last_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
            }
            (false, Err(_)) => log::debug!("Skipping notice line: {line}"),
        }
    }

    if records.is_empty() {
        return Err(PlanobsError::NomParsingError(
            text.lines().next().unwrap_or_default().to_string(),
        ));
    }
    Ok(AmonNotice { records })
}

/// Split a notice page into its revisions and parse each of them, oldest first.
pub fn parse_amon_notices(text: &str) -> Result<Vec<AmonNotice>, PlanobsError> {
    let mut blocks: Vec<String> = vec![String::new()];
    for line in text.lines() {
        if line.trim_start().starts_with("////") {
            blocks.push(String::new());
        } else if let Some(block) = blocks.last_mut() {
            block.push_str(line);
            block.push('\n');
        }
    }

    blocks
        .iter()
        .filter(|block| !block.trim().is_empty())
        .map(|block| parse_amon_notice(block))
        .collect()
}

impl AmonNotice {
    /// First value recorded under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value recorded under `key` (e.g. the `COMMENTS` lines).
    pub fn values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.records
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn records(&self) -> &[(String, String)] {
        &self.records
    }

    fn required(&self, key: &str) -> Result<&str, PlanobsError> {
        self.get(key)
            .ok_or_else(|| PlanobsError::MissingGcnField(key.to_string()))
    }

    fn number(&self, key: &str) -> Result<f64, PlanobsError> {
        leading_number(self.required(key)?)
            .ok_or_else(|| PlanobsError::MissingGcnField(key.to_string()))
    }

    pub fn notice_type(&self) -> Option<&str> {
        self.get("NOTICE_TYPE")
    }

    pub fn run_number(&self) -> Result<u64, PlanobsError> {
        Ok(self.number("RUN_NUM")? as u64)
    }

    pub fn event_number(&self) -> Result<u64, PlanobsError> {
        Ok(self.number("EVENT_NUM")? as u64)
    }

    pub fn revision(&self) -> Result<u32, PlanobsError> {
        Ok(self.number("REVISION")? as u32)
    }

    /// J2000 right ascension (first value of `SRC_RA`), degrees.
    pub fn ra(&self) -> Result<Degree, PlanobsError> {
        self.number("SRC_RA")
    }

    /// J2000 declination (first value of `SRC_DEC`), degrees.
    pub fn dec(&self) -> Result<Degree, PlanobsError> {
        self.number("SRC_DEC")
    }

    /// 90 % containment radius (`SRC_ERROR`, given in arcmin), degrees.
    pub fn error_90(&self) -> Result<Degree, PlanobsError> {
        Ok(self.number("SRC_ERROR")? * ARCMIN_TO_DEG)
    }

    /// Estimated neutrino energy, TeV.
    pub fn energy(&self) -> Result<f64, PlanobsError> {
        self.number("ENERGY")
    }

    pub fn signalness(&self) -> Result<f64, PlanobsError> {
        self.number("SIGNALNESS")
    }

    /// False alarm rate, per year.
    pub fn far(&self) -> Result<f64, PlanobsError> {
        self.number("FAR")
    }

    /// Event time from `DISCOVERY_DATE` (`yy/mm/dd` entry) and `DISCOVERY_TIME` (`{hh:mm:ss.ss}`).
    pub fn discovery_time(&self) -> Result<MJD, PlanobsError> {
        let date = self.required("DISCOVERY_DATE")?;
        let (year, month, day) = date
            .split(';')
            .map(str::trim)
            .find_map(|part| parse_calendar_date(part).ok())
            .map(|(_, ymd)| ymd)
            .ok_or_else(|| PlanobsError::NomParsingError(date.to_string()))?;

        let time = self.required("DISCOVERY_TIME")?;
        let (_, (hour, minute, second)) =
            braced_time(time).map_err(|_| PlanobsError::NomParsingError(time.to_string()))?;

        gregorian_to_mjd(year, month, day, hour, minute, second)
    }

    /// Planning target with the symmetric 90 % error radius of the notice.
    pub fn to_target(&self, name: &str) -> Result<Target, PlanobsError> {
        let error = PositionError::symmetric(self.error_90()?);
        Ok(Target::new(name, self.ra()?, self.dec()?)?
            .with_errors(error, error)
            .with_arrival_time(self.discovery_time()?)
            .with_alert_source(AlertSource::IceCube))
    }
}

#[cfg(test)]
mod notice_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    const NOTICE: &str = "\
TITLE:            GCN/AMON NOTICE
NOTICE_DATE:      Fri 24 Jun 22 09:24:52 UT
NOTICE_TYPE:      ICECUBE Astrotrack Gold
STREAM:           24
RUN_NUM:          136889
EVENT_NUM:        28484006
SRC_RA:           224.2108d {+14h 56m 51s} (J2000),
                  224.4622d {+14h 57m 51s} (current),
                  223.7205d {+14h 54m 53s} (1950)
SRC_DEC:          +41.3161d {+41d 18' 57\"} (J2000),
                  +41.2234d {+41d 13' 24\"} (current),
                  +41.5005d {+41d 30' 02\"} (1950)
SRC_ERROR:        77.99 [arcmin radius, stat-only, 90% containment]
SRC_ERROR50:      31.64 [arcmin radius, stat-only, 50% containment]
DISCOVERY_DATE:   19754 TJD;   175 DOY;   22/06/24 (yy/mm/dd)
DISCOVERY_TIME:   33821 SOD {09:23:41.02} UT
REVISION:         0
ENERGY :          1.6429e+02 [TeV]
SIGNALNESS:       5.5050e-01 [dn]
FAR:              0.8927 [yr^-1]
COMMENTS:         IceCube Gold event.
COMMENTS:         The position error is statistical only, there is no systematic added.
";

    #[test]
    fn test_parse_notice() {
        let notice = parse_amon_notice(NOTICE).unwrap();
        assert_eq!(notice.notice_type(), Some("ICECUBE Astrotrack Gold"));
        assert_eq!(notice.run_number().unwrap(), 136889);
        assert_eq!(notice.event_number().unwrap(), 28484006);
        assert_eq!(notice.revision().unwrap(), 0);
        assert_eq!(notice.ra().unwrap(), 224.2108);
        assert_eq!(notice.dec().unwrap(), 41.3161);
        assert_abs_diff_eq!(notice.error_90().unwrap(), 77.99 / 60.0, epsilon = 1e-12);
        assert_eq!(notice.energy().unwrap(), 164.29);
        assert_eq!(notice.signalness().unwrap(), 0.5505);
        assert_eq!(notice.far().unwrap(), 0.8927);
        assert_eq!(notice.values("COMMENTS").count(), 2);

        let expected = gregorian_to_mjd(2022, 6, 24, 9, 23, 41.02).unwrap();
        assert_abs_diff_eq!(notice.discovery_time().unwrap(), expected, epsilon = 1e-9);

        // Continuation lines are kept with their record
        assert!(notice.get("SRC_RA").unwrap().contains("(current)"));
    }

    #[test]
    fn test_missing_fields() {
        let notice = parse_amon_notice("RUN_NUM: 1\n").unwrap();
        assert_eq!(
            notice.ra().unwrap_err(),
            PlanobsError::MissingGcnField("SRC_RA".into())
        );
        assert!(parse_amon_notice("no records here\n").is_err());
    }

    #[test]
    fn test_revisions() {
        let revised = NOTICE.replace("REVISION:         0", "REVISION:         1");
        let page = format!("{NOTICE}\n//////////////////////////////////////////////////////////\n{revised}");
        let notices = parse_amon_notices(&page).unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[1].revision().unwrap(), 1);
    }

    #[test]
    fn test_to_target() {
        let target = parse_amon_notice(NOTICE)
            .unwrap()
            .to_target("IC220624A")
            .unwrap();
        let region = target.error_region().unwrap();
        assert_abs_diff_eq!(region.dec_max - region.dec_min, 2.0 * 77.99 / 60.0, epsilon = 1e-9);
    }
}
