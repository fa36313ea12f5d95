//! # GCN alert parsing
//!
//! Resolve IceCube neutrino alerts into planning targets from the Gamma-ray Coordinates
//! Network (GCN):
//!
//! - [`circular`] – refined positions published in human-written GCN circulars,
//! - [`notice`] – automated AMON notices (first, unrefined position),
//! - this module – archive lookups and the network entry points going through a
//!   [`PlanobsEnv`].
//!
//! ## Typical flow
//!
//! ```rust,ignore
//! use planobs::env_state::PlanobsEnv;
//! use planobs::gcn_parser::target_from_circular;
//!
//! let env = PlanobsEnv::from_default_config()?;
//! let target = target_from_circular(&env, "IC220624A")?;
//! println!("{} at ({}, {})", target.name, target.ra, target.dec);
//! ```
pub mod circular;
pub mod notice;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::env_state::PlanobsEnv;
use crate::planobs_errors::PlanobsError;
use crate::target::{icecube_circular_name, Target};

use self::circular::parse_icecube_circular;
use self::notice::{parse_amon_notices, AmonNotice};

static ARCHIVE_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a href="?gcn3/(\d+)\.gcn3"?>[^<]*</a>\s*([^<\n]*)"#)
        .expect("static archive entry pattern")
});

static NOTICE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href="?([^"\s>]*notices_amon_g_b/\d+_\d+\.amon)"?"#)
        .expect("static notice link pattern")
});

/// Circular numbers and subjects listed in the GCN archive page.
pub fn archive_entries(archive_html: &str) -> Vec<(u32, String)> {
    ARCHIVE_ENTRY
        .captures_iter(archive_html)
        .filter_map(|caps| {
            let number = caps[1].parse::<u32>().ok()?;
            Some((number, caps[2].trim().to_string()))
        })
        .collect()
}

/// Find the circular reporting an IceCube event in the archive listing.
///
/// Arguments
/// ---------
/// * `event_name`: circular form of the name, e.g. `IceCube-220624A`.
/// * `archive_html`: the GCN circular archive page.
///
/// Return
/// ------
/// * The number of the IceCube collaboration circular ("IceCube observation of ...") when
///   there is one, otherwise the earliest circular about the event.
pub fn find_gcn_circular(event_name: &str, archive_html: &str) -> Result<u32, PlanobsError> {
    let matching: Vec<(u32, String)> = archive_entries(archive_html)
        .into_iter()
        .filter(|(_, subject)| subject.starts_with(event_name))
        .collect();

    matching
        .iter()
        .filter(|(_, subject)| subject.contains("IceCube observation"))
        .map(|(number, _)| *number)
        .min()
        .or_else(|| matching.iter().map(|(number, _)| *number).min())
        .ok_or_else(|| PlanobsError::GcnCircularNotFound(event_name.to_string()))
}

/// Links to the AMON notice pages in the Gold/Bronze events table, in page order.
pub fn notice_links(events_html: &str) -> Vec<String> {
    NOTICE_LINK
        .captures_iter(events_html)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn absolute_url(base: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            link.trim_start_matches('/')
        )
    }
}

/// Download the text of GCN circular `number`.
pub fn get_circular(env: &PlanobsEnv, number: u32) -> Result<String, PlanobsError> {
    let url = absolute_url(
        &env.config.gcn.circular_base_url,
        &format!("gcn3/{number}.gcn3"),
    );
    env.get_from_url(&url)
}

/// Resolve an IceCube event (`IC220624A` or `IceCube-220624A`) into a target through its
/// GCN circular.
pub fn target_from_circular(env: &PlanobsEnv, name: &str) -> Result<Target, PlanobsError> {
    let event_name = icecube_circular_name(name)?;
    let archive = env.get_from_url(&env.config.gcn.archive_url)?;
    let number = find_gcn_circular(&event_name, &archive)?;
    log::info!("Using GCN circular {number} for {event_name}");

    let text = get_circular(env, number)?;
    parse_icecube_circular(&text)?.to_target(name)
}

/// URL of the notice page of the most recent Gold/Bronze event.
pub fn latest_notice_url(env: &PlanobsEnv) -> Result<String, PlanobsError> {
    let events_url = &env.config.gcn.amon_events_url;
    let page = env.get_from_url(events_url)?;
    notice_links(&page)
        .first()
        .map(|link| absolute_url(&env.config.gcn.notice_base_url, link))
        .ok_or_else(|| PlanobsError::GcnNoticeNotFound(events_url.clone()))
}

/// Text of the notice page of the most recent Gold/Bronze event.
///
/// Return
/// ------
/// * The non-empty notice text, or [`PlanobsError::GcnNoticeNotFound`].
pub fn parse_latest_gcn_notice(env: &PlanobsEnv) -> Result<String, PlanobsError> {
    let url = latest_notice_url(env)?;
    let text = env.get_from_url(&url)?;
    if text.trim().is_empty() {
        return Err(PlanobsError::GcnNoticeNotFound(url));
    }
    Ok(text)
}

/// Latest revision of the most recent Gold/Bronze notice.
pub fn latest_amon_notice(env: &PlanobsEnv) -> Result<AmonNotice, PlanobsError> {
    let url = latest_notice_url(env)?;
    let text = env.get_from_url(&url)?;
    parse_amon_notices(&text)?
        .pop()
        .ok_or(PlanobsError::GcnNoticeNotFound(url))
}

#[cfg(test)]
mod gcn_parser_test {
    use super::*;

    const ARCHIVE: &str = r#"
<li><a href=gcn3/32247.gcn3>32247</a> IceCube-220624A: No significant detection by Fermi-LAT<br>
<li><a href=gcn3/32246.gcn3>32246</a> IceCube-220624A: ZTF follow-up observations<br>
<li><a href=gcn3/32245.gcn3>32245</a> IceCube-220624A - IceCube observation of a high-energy neutrino candidate track-like event<br>
<li><a href=gcn3/32240.gcn3>32240</a> GRB 220623A: Swift-XRT afterglow detection<br>
<li><a href=gcn3/31960.gcn3>31960</a> IceCube-220501A: Upper limits from Fermi-GBM<br>
<li><a href=gcn3/31958.gcn3>31958</a> IceCube-220501A: Fermi-LAT Gamma-ray Observations<br>
"#;

    #[test]
    fn test_archive_entries() {
        let entries = archive_entries(ARCHIVE);
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[3], (32240, "GRB 220623A: Swift-XRT afterglow detection".into()));
    }

    #[test]
    fn test_find_circular() {
        assert_eq!(find_gcn_circular("IceCube-220624A", ARCHIVE).unwrap(), 32245);
        // Without the collaboration circular, the earliest one wins
        assert_eq!(find_gcn_circular("IceCube-220501A", ARCHIVE).unwrap(), 31958);
        assert_eq!(
            find_gcn_circular("IceCube-991231A", ARCHIVE).unwrap_err(),
            PlanobsError::GcnCircularNotFound("IceCube-991231A".into())
        );
    }

    #[test]
    fn test_notice_links() {
        let html = r#"<tr><td><a href="notices_amon_g_b/136889_28484006.amon">136889_28484006</a></td>
<tr><td><a href="notices_amon_g_b/136766_13543000.amon">136766_13543000</a></td>"#;
        let links = notice_links(html);
        assert_eq!(links, vec![
            "notices_amon_g_b/136889_28484006.amon",
            "notices_amon_g_b/136766_13543000.amon",
        ]);
        assert_eq!(
            absolute_url("https://gcn.gsfc.nasa.gov/", &links[0]),
            "https://gcn.gsfc.nasa.gov/notices_amon_g_b/136889_28484006.amon"
        );
    }

    #[test]
    #[ignore = "requires network access"]
    fn test_latest_notice() {
        let env = PlanobsEnv::new(crate::config::PlanobsConfig::default());
        let latest = parse_latest_gcn_notice(&env).unwrap();
        assert!(!latest.is_empty());
    }
}
