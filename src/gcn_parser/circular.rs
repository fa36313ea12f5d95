//! # IceCube GCN circulars
//!
//! IceCube announces each refined track alert in a plain-text GCN circular:
//!
//! ```text
//! NUMBER:  32245
//! SUBJECT: IceCube-220624A - IceCube observation of a high-energy neutrino candidate track-like event
//! ...
//! The event was selected by the ICECUBE_Astrotrack_Gold alert stream.
//! ...
//! Date: 22/06/24
//! Time: 09:23:41.02 UT
//! RA: 224.12 (+0.95 -1.24 deg 90% PSF containment) J2000
//! Dec: 41.19 (+0.70 -0.98 deg 90% PSF containment) J2000
//! ```
//!
//! [`parse_icecube_circular`] extracts the header, the arrival time and the refined
//! position with its asymmetric 90 % containment errors. Dates are accepted both as
//! `YY/MM/DD` and `YYYY-MM-DD`.
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while_m_n},
    character::complete::{char, digit1, not_line_ending, space0, space1},
    combinator::map_res,
    number::complete::double,
    sequence::{preceded, terminated},
    IResult, Parser,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::{Degree, MJD};
use crate::planobs_errors::PlanobsError;
use crate::target::{AlertSource, PositionError, Target};
use crate::time::gregorian_to_mjd;

static ALERT_STREAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"ICECUBE_Astrotrack_(Gold|Bronze)").expect("static alert stream pattern")
});

static EVENT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"IceCube-\d{6}[A-Z]").expect("static event name pattern"));

/// IceCube realtime alert stream of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertStream {
    Gold,
    Bronze,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IceCubeCircular {
    pub number: Option<u32>,
    pub subject: Option<String>,
    /// Event name as written in the subject, e.g. `IceCube-220624A`.
    pub event_name: Option<String>,
    /// Neutrino arrival time, UTC MJD.
    pub arrival_time: MJD,
    pub ra: Degree,
    pub ra_err: PositionError,
    pub dec: Degree,
    pub dec_err: PositionError,
    pub alert_stream: Option<AlertStream>,
}

impl IceCubeCircular {
    /// Build the planning target described by the circular.
    pub fn to_target(&self, name: &str) -> Result<Target, PlanobsError> {
        Ok(Target::new(name, self.ra, self.dec)?
            .with_errors(self.ra_err, self.dec_err)
            .with_arrival_time(self.arrival_time)
            .with_alert_source(AlertSource::IceCube))
    }
}

fn header_value<'a>(
    key: &'static str,
) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    preceded((tag(key), char(':'), space0), not_line_ending)
}

fn number_2(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_digit()), str::parse::<u8>).parse(input)
}

fn number_4(input: &str) -> IResult<&str, i32> {
    map_res(take_while_m_n(4, 4, |c: char| c.is_ascii_digit()), str::parse::<i32>).parse(input)
}

/// `22/06/24` or `2022-06-24` into (year, month, day).
pub(crate) fn parse_calendar_date(input: &str) -> IResult<&str, (i32, u8, u8)> {
    alt((
        (
            terminated(number_4, char('-')),
            terminated(number_2, char('-')),
            number_2,
        ),
        (
            terminated(number_2, char('/')).map(|yy| 2000 + yy as i32),
            terminated(number_2, char('/')),
            number_2,
        ),
    ))
    .parse(input)
}

/// `09:23:41.02` into (hour, minute, second).
pub(crate) fn parse_clock_time(input: &str) -> IResult<&str, (u8, u8, f64)> {
    (
        terminated(number_2, char(':')),
        terminated(number_2, char(':')),
        double,
    )
        .parse(input)
}

fn date_line(input: &str) -> IResult<&str, (i32, u8, u8)> {
    preceded((tag("Date:"), space0), parse_calendar_date).parse(input)
}

fn time_line(input: &str) -> IResult<&str, (u8, u8, f64)> {
    preceded((tag("Time:"), space0), parse_clock_time).parse(input)
}

/// `RA: 224.12 (+0.95 -1.24 deg ...` into (value, +err, -err).
fn coordinate_line<'a>(
    key: &'static str,
) -> impl Parser<&'a str, Output = (f64, f64, f64), Error = nom::error::Error<&'a str>> {
    preceded(
        (tag_no_case(key), char(':'), space0),
        (
            double,
            preceded(space0, preceded(char('('), preceded(space0, double))),
            preceded(space1, double),
        ),
    )
}

fn number_line(input: &str) -> IResult<&str, u32> {
    map_res(
        preceded((tag("NUMBER:"), space0), digit1),
        str::parse::<u32>,
    )
    .parse(input)
}

/// Parse the text of an IceCube GCN circular.
///
/// Arguments
/// ---------
/// * `text`: the full circular, headers included.
///
/// Return
/// ------
/// * The parsed circular, or [`PlanobsError::MissingGcnField`] naming the first of `RA`,
///   `Dec`, `Date`, `Time` that could not be found.
pub fn parse_icecube_circular(text: &str) -> Result<IceCubeCircular, PlanobsError> {
    let mut number = None;
    let mut subject = None;
    let mut date = None;
    let mut time = None;
    let mut ra = None;
    let mut dec = None;

    for line in text.lines().map(str::trim) {
        if let Ok((_, n)) = number_line(line) {
            number.get_or_insert(n);
        } else if let Ok((_, s)) = header_value("SUBJECT").parse(line) {
            subject.get_or_insert(s.trim().to_string());
        } else if let Ok((_, d)) = date_line(line) {
            date.get_or_insert(d);
        } else if let Ok((_, t)) = time_line(line) {
            time.get_or_insert(t);
        } else if let Ok((_, c)) = coordinate_line("RA").parse(line) {
            ra.get_or_insert(c);
        } else if let Ok((_, c)) = coordinate_line("Dec").parse(line) {
            dec.get_or_insert(c);
        }
    }

    let missing = |field: &str| PlanobsError::MissingGcnField(field.to_string());
    let (ra, ra_plus, ra_minus) = ra.ok_or_else(|| missing("RA"))?;
    let (dec, dec_plus, dec_minus) = dec.ok_or_else(|| missing("Dec"))?;
    let (year, month, day) = date.ok_or_else(|| missing("Date"))?;
    let (hour, minute, second) = time.ok_or_else(|| missing("Time"))?;

    let event_name = subject
        .as_deref()
        .and_then(|s| EVENT_NAME.find(s))
        .map(|m| m.as_str().to_string());

    let alert_stream = ALERT_STREAM.captures(text).map(|caps| match &caps[1] {
        "Gold" => AlertStream::Gold,
        _ => AlertStream::Bronze,
    });

    Ok(IceCubeCircular {
        number,
        subject,
        event_name,
        arrival_time: gregorian_to_mjd(year, month, day, hour, minute, second)?,
        ra,
        ra_err: PositionError::new(ra_plus, ra_minus),
        dec,
        dec_err: PositionError::new(dec_plus, dec_minus),
        alert_stream,
    })
}

/// Subject line of a circular, without parsing the rest of it.
pub fn circular_subject(text: &str) -> Option<&str> {
    text.lines()
        .map(str::trim)
        .find_map(|line| header_value("SUBJECT").parse(line).ok())
        .map(|(_, subject)| subject.trim())
}
