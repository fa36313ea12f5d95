use approx::assert_abs_diff_eq;
use camino::Utf8Path;
use planobs::config::PlanobsConfig;
use planobs::fields::footprint::Footprint;
use planobs::fields::grid::FieldGrid;
use planobs::gcn_parser::circular::{parse_icecube_circular, AlertStream};
use planobs::gcn_parser::find_gcn_circular;
use planobs::gcn_parser::notice::parse_amon_notices;
use planobs::multiday_plan::MultiDayObservation;
use planobs::plan::PlanObservation;
use planobs::target::{AlertSource, PositionError};
use planobs::time::gregorian_to_mjd;
use planobs::PlanobsEnv;

fn read(name: &str) -> String {
    std::fs::read_to_string(Utf8Path::new("tests/data").join(name)).unwrap()
}

fn sample_grid() -> FieldGrid {
    FieldGrid::from_path(Utf8Path::new("tests/data/ztf_fields_sample.txt")).unwrap()
}

#[test]
fn test_archive_lookup() {
    let archive = read("gcn3_archive.html");
    assert_eq!(find_gcn_circular("IceCube-220624A", &archive).unwrap(), 32245);
    assert_eq!(find_gcn_circular("IceCube-220501A", &archive).unwrap(), 31958);
    assert!(find_gcn_circular("IceCube-220101A", &archive).is_err());
}

#[test]
fn test_icecube_220624a_circular() {
    let circular = parse_icecube_circular(&read("icecube_220624a.gcn3")).unwrap();
    assert_eq!(circular.number, Some(32245));
    assert_eq!(circular.alert_stream, Some(AlertStream::Gold));
    assert_eq!(circular.ra, 224.12);
    assert_eq!(circular.ra_err, PositionError::new(0.95, -1.24));
    assert_eq!(circular.dec, 41.19);
    assert_eq!(circular.dec_err, PositionError::new(0.70, -0.98));
    assert_abs_diff_eq!(
        circular.arrival_time,
        gregorian_to_mjd(2022, 6, 24, 9, 23, 41.02).unwrap(),
        epsilon = 1e-9
    );

    let target = circular.to_target("IC220624A").unwrap();
    assert_eq!(target.alert_source, AlertSource::IceCube);
    let candidate = sample_grid()
        .recommend(&target, &Footprint::default(), 30)
        .unwrap();
    assert_eq!(candidate.field.id, 720);
    assert_abs_diff_eq!(candidate.coverage, 1.0, epsilon = 1e-12);
}

#[test]
fn test_amon_notice_revisions() {
    let notices = parse_amon_notices(&read("amon_136889_28484006.amon")).unwrap();
    assert_eq!(notices.len(), 2);

    let latest = &notices[1];
    assert_eq!(latest.revision().unwrap(), 1);
    assert_eq!(latest.run_number().unwrap(), 136889);
    assert_eq!(latest.event_number().unwrap(), 28484006);
    assert_eq!(latest.ra().unwrap(), 224.1151);
    assert_eq!(latest.dec().unwrap(), 41.1926);
    assert_abs_diff_eq!(latest.error_90().unwrap(), 64.80 / 60.0, epsilon = 1e-12);
    assert!(latest.error_90().unwrap() < notices[0].error_90().unwrap());
}

#[test]
fn test_plan_from_circular() {
    let target = parse_icecube_circular(&read("icecube_220624a.gcn3"))
        .unwrap()
        .to_target("IC220624A")
        .unwrap();
    let env = PlanobsEnv::with_field_grid(PlanobsConfig::default(), sample_grid());

    // The arrival date is used when no date is given
    let mut plan = PlanObservation::builder("IC220624A")
        .target(target)
        .build(&env)
        .unwrap();
    assert_eq!(plan.date(), 59754.0);
    assert!(plan.is_observable());
    assert_eq!(plan.request_ztf_fields(&env).unwrap(), Some(720));
}

#[test]
fn test_campaign_from_circular() {
    let target = parse_icecube_circular(&read("icecube_220624a.gcn3"))
        .unwrap()
        .to_target("IC220624A")
        .unwrap();
    let env = PlanobsEnv::with_field_grid(PlanobsConfig::default(), sample_grid());

    let campaign = MultiDayObservation::from_target(target, "2022-06-24", &env).unwrap();
    assert_eq!(campaign.field(), Some(720));
    assert_eq!(campaign.nights().len(), 6);

    let triggers = campaign.triggers();
    assert_eq!(triggers.len(), 8);
    assert!(triggers[..6].iter().all(|t| t.filter_id == 1));
    assert!(triggers[6..].iter().all(|t| t.filter_id == 2));
    assert_eq!(triggers[0].exposure_time, 300);
    assert_eq!(triggers[1].exposure_time, 30);
    assert_eq!(triggers[6].exposure_time, 300);
    assert!(triggers[..6].windows(2).all(|w| w[0].mjd_start < w[1].mjd_start));
}
