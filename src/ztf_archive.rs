//! # ZTF alert archive
//!
//! Resolve a ZTF transient name (e.g. `ZTF19accdntg`) into a planning [`Target`] using the
//! AMPEL ZTF alert archive. The position is the median of the alert positions and the
//! arrival time is the time of the first alert.
use serde::Deserialize;

use crate::constants::{Degree, JDTOMJD, MJD};
use crate::conversion::wrap_delta_ra;
use crate::env_state::PlanobsEnv;
use crate::planobs_errors::PlanobsError;
use crate::target::{is_ztf_name, AlertSource, Target};

/// The part of an alert packet candidate the planner needs.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AlertCandidate {
    pub ra: Degree,
    pub dec: Degree,
    /// Julian date of the detection.
    pub jd: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ZtfAlert {
    #[serde(rename = "objectId", default)]
    pub object_id: Option<String>,
    pub candidate: AlertCandidate,
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Build a target from the alerts of one object.
///
/// Right ascensions are averaged as offsets from the first alert, so that objects close to
/// RA = 0 are not pulled to RA = 180.
pub fn target_from_alerts(name: &str, alerts: &[ZtfAlert]) -> Result<Target, PlanobsError> {
    let first = alerts
        .first()
        .ok_or_else(|| PlanobsError::ZtfObjectNotFound(name.to_string()))?;
    let ra0 = first.candidate.ra;

    let ra_offset = median(
        alerts
            .iter()
            .map(|a| wrap_delta_ra(a.candidate.ra - ra0))
            .collect(),
    );
    let dec = median(alerts.iter().map(|a| a.candidate.dec).collect());
    let (Some(ra_offset), Some(dec)) = (ra_offset, dec) else {
        return Err(PlanobsError::ZtfObjectNotFound(name.to_string()));
    };

    let arrival: Option<MJD> = alerts
        .iter()
        .map(|a| a.candidate.jd - JDTOMJD)
        .min_by(f64::total_cmp);

    let mut target = Target::new(name, ra0 + ra_offset, dec)?.with_alert_source(AlertSource::Ztf);
    if let Some(arrival) = arrival {
        target = target.with_arrival_time(arrival);
    }
    Ok(target)
}

/// Client of the AMPEL ZTF archive.
pub struct ZtfArchive<'a> {
    env: &'a PlanobsEnv,
}

impl<'a> ZtfArchive<'a> {
    pub fn new(env: &'a PlanobsEnv) -> Self {
        ZtfArchive { env }
    }

    /// Fetch every alert of a ZTF object.
    pub fn alerts(&self, name: &str) -> Result<Vec<ZtfAlert>, PlanobsError> {
        let config = &self.env.config.ampel;
        let url = format!(
            "{}/object/{}/alerts",
            config.archive_url.trim_end_matches('/'),
            name
        );
        log::debug!("GET {url}");

        let mut request = self
            .env
            .http_client
            .get(&url)
            .query("with_history", "false");
        if let Some(token) = &config.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let alerts: Vec<ZtfAlert> = request.call()?.body_mut().read_json()?;
        Ok(alerts)
    }

    /// Resolve a ZTF object name into a target.
    pub fn resolve(&self, name: &str) -> Result<Target, PlanobsError> {
        if !is_ztf_name(name) {
            return Err(PlanobsError::InvalidTargetName {
                source_name: AlertSource::Ztf.to_string(),
                name: name.to_string(),
            });
        }
        let alerts = self.alerts(name)?;
        log::info!("{} alerts found for {name}", alerts.len());
        target_from_alerts(name, &alerts)
    }
}

#[cfg(test)]
mod ztf_archive_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn alert(ra: f64, dec: f64, jd: f64) -> ZtfAlert {
        ZtfAlert {
            object_id: Some("ZTF19accdntg".into()),
            candidate: AlertCandidate { ra, dec, jd },
        }
    }

    #[test]
    fn test_decode_alerts() {
        let json = r#"[
            {"objectId": "ZTF19accdntg", "candid": 1, "candidate": {"ra": 10.5, "dec": -2.0, "jd": 2459417.8, "magpsf": 19.1}},
            {"objectId": "ZTF19accdntg", "candidate": {"ra": 10.6, "dec": -2.1, "jd": 2459416.9}}
        ]"#;
        let alerts: Vec<ZtfAlert> = serde_json::from_str(json).unwrap();
        assert_eq!(alerts.len(), 2);

        let target = target_from_alerts("ZTF19accdntg", &alerts).unwrap();
        assert_abs_diff_eq!(target.ra, 10.55, epsilon = 1e-9);
        assert_abs_diff_eq!(target.dec, -2.05, epsilon = 1e-9);
        assert_abs_diff_eq!(target.arrival_time.unwrap(), 59416.4, epsilon = 1e-6);
        assert_eq!(target.alert_source, AlertSource::Ztf);
    }

    #[test]
    fn test_median_across_ra_zero() {
        let alerts = [
            alert(359.9, 5.0, 2459417.0),
            alert(0.1, 5.2, 2459418.0),
            alert(0.05, 5.1, 2459419.0),
        ];
        let target = target_from_alerts("ZTF21aaaaaaa", &alerts).unwrap();
        assert_abs_diff_eq!(target.ra, 0.05, epsilon = 1e-9);
        assert_abs_diff_eq!(target.dec, 5.1, epsilon = 1e-12);
    }

    #[test]
    fn test_no_alerts() {
        assert_eq!(
            target_from_alerts("ZTF19accdntg", &[]).unwrap_err(),
            PlanobsError::ZtfObjectNotFound("ZTF19accdntg".into())
        );
    }

    #[test]
    fn test_reject_invalid_name() {
        let env = PlanobsEnv::new(crate::config::PlanobsConfig::default());
        assert!(matches!(
            ZtfArchive::new(&env).resolve("IC220624A"),
            Err(PlanobsError::InvalidTargetName { .. })
        ));
    }
}
