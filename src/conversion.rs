use crate::constants::{Degree, RADEG};
use crate::planobs_errors::PlanobsError;

/// Split a sexagesimal string on blanks, colons or `h`/`m`/`s`/`d`/`'`/`"` markers.
fn split_sexagesimal(value: &str) -> Vec<&str> {
    value
        .split(|c: char| c.is_whitespace() || matches!(c, ':' | 'h' | 'm' | 's' | 'd' | '\'' | '"'))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a right ascension string to degrees
///
/// Arguments
/// ---------
/// * `ra`: a right ascension either in decimal degrees (`"224.12"`) or sexagesimal hours
///   (`"14 56 28.8"`, `"14:56:28.8"`, `"14h56m28.8s"`)
///
/// Returns
/// -------
/// * `Option<Degree>`: the right ascension in degrees, wrapped to [0, 360), or `None` if the
///   input is malformed
pub fn parse_ra_to_deg(ra: &str) -> Option<Degree> {
    let parts = split_sexagesimal(ra);
    let value = match parts.as_slice() {
        [deg] => deg.parse::<f64>().ok()?,
        [h, m, s] => {
            let h: f64 = h.parse().ok()?;
            let m: f64 = m.parse().ok()?;
            let s: f64 = s.parse().ok()?;
            if !(0.0..24.0).contains(&h) || !(0.0..60.0).contains(&m) || !(0.0..60.0).contains(&s)
            {
                return None;
            }
            (h + m / 60.0 + s / 3600.0) * 15.0
        }
        _ => return None,
    };
    value.is_finite().then(|| value.rem_euclid(360.0))
}

/// Parse a declination string to degrees
///
/// Arguments
/// ---------
/// * `dec`: a declination either in decimal degrees (`"-4.5"`) or sexagesimal (`"+41 11 59"`,
///   `"-00:30:14.2"`)
///
/// Returns
/// -------
/// * `Option<Degree>`: the declination in degrees, or `None` if the input is malformed or outside
///   [-90, 90]
pub fn parse_dec_to_deg(dec: &str) -> Option<Degree> {
    let parts = split_sexagesimal(dec);
    let value = match parts.as_slice() {
        [deg] => deg.parse::<f64>().ok()?,
        [d, m, s] => {
            let sign = if d.starts_with('-') { -1.0 } else { 1.0 };
            let d: f64 = d.trim_start_matches(&['-', '+'][..]).parse().ok()?;
            let m: f64 = m.parse().ok()?;
            let s: f64 = s.parse().ok()?;
            if !(0.0..60.0).contains(&m) || !(0.0..60.0).contains(&s) {
                return None;
            }
            sign * (d + m / 60.0 + s / 3600.0)
        }
        _ => return None,
    };
    (value.is_finite() && (-90.0..=90.0).contains(&value)).then_some(value)
}

/// Parse a (ra, dec) pair given in any format accepted by [`parse_ra_to_deg`] / [`parse_dec_to_deg`].
pub fn parse_coordinates(ra: &str, dec: &str) -> Result<(Degree, Degree), PlanobsError> {
    let ra_deg = parse_ra_to_deg(ra)
        .ok_or_else(|| PlanobsError::InvalidCoordinate(format!("right ascension {ra}")))?;
    let dec_deg = parse_dec_to_deg(dec)
        .ok_or_else(|| PlanobsError::InvalidCoordinate(format!("declination {dec}")))?;
    Ok((ra_deg, dec_deg))
}

/// Format a right ascension (degrees) as `HHhMMmSS.SSs`.
pub fn ra_to_hms(ra: Degree) -> String {
    let total_seconds = (ra.rem_euclid(360.0) / 15.0 * 3600.0 * 100.0).round() / 100.0;
    let total_seconds = total_seconds % 86_400.0;
    let h = (total_seconds / 3600.0).floor();
    let m = ((total_seconds - h * 3600.0) / 60.0).floor();
    let s = total_seconds - h * 3600.0 - m * 60.0;
    format!("{:02}h{:02}m{:05.2}s", h as u32, m as u32, s)
}

/// Format a declination (degrees) as `±DDdMMmSS.Ss`.
pub fn dec_to_dms(dec: Degree) -> String {
    let sign = if dec < 0.0 { '-' } else { '+' };
    let total_seconds = (dec.abs() * 3600.0 * 10.0).round() / 10.0;
    let d = (total_seconds / 3600.0).floor();
    let m = ((total_seconds - d * 3600.0) / 60.0).floor();
    let s = total_seconds - d * 3600.0 - m * 60.0;
    format!("{sign}{:02}d{:02}m{:04.1}s", d as u32, m as u32, s)
}

/// Great-circle separation between two sky positions (all angles in degrees).
///
/// Uses the Vincenty formula, well conditioned for both small and antipodal separations.
pub fn angular_separation(ra1: Degree, dec1: Degree, ra2: Degree, dec2: Degree) -> Degree {
    let (sd1, cd1) = (dec1 * RADEG).sin_cos();
    let (sd2, cd2) = (dec2 * RADEG).sin_cos();
    let (sdra, cdra) = ((ra2 - ra1) * RADEG).sin_cos();

    let num1 = cd2 * sdra;
    let num2 = cd1 * sd2 - sd1 * cd2 * cdra;
    let denominator = sd1 * sd2 + cd1 * cd2 * cdra;

    num1.hypot(num2).atan2(denominator) / RADEG
}

/// Wrap a right ascension difference into (-180, 180].
pub fn wrap_delta_ra(delta: Degree) -> Degree {
    let wrapped = delta.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
