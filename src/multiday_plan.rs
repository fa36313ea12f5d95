//! # Multi-day follow-up campaign
//!
//! A neutrino follow-up with ZTF is not a single visit: the candidate counterparts have to
//! be monitored for several nights. [`MultiDayObservation`] repeats the single-night plan
//! of [`PlanObservation`] over the nights of [`NIGHTS`] (counted from the start date, night 1
//! being the start date itself):
//!
//! | night | bands | exposure |
//! | --- | --- | --- |
//! | 1 | g, r | 300 s |
//! | 2, 3, 5, 7 | g | 30 s |
//! | 9 | g, r | 30 s |
//!
//! The target and the ZTF field are resolved once, by the plan of the start date; the
//! following nights only need the target coordinates.
//!
//! The campaign turns into [`PlannedTrigger`]s, g-band first, ready to be added to a
//! [`crate::api::Queue`].
use crate::constants::{
    Band, FieldId, Seconds, FIRST_NIGHT_EXPOSURE, MJD, NIGHTS, ONE_FILTER_NIGHTS,
    SHORT_NIGHT_EXPOSURE,
};
use crate::env_state::PlanobsEnv;
use crate::plan::{PlanObservation, PlanOptions};
use crate::planobs_errors::PlanobsError;
use crate::target::{AlertSource, Target};
use crate::time::{mjd_to_date, parse_date, start_of_day};
use crate::visibility::ObservationWindow;

const SEPARATOR_WIDTH: usize = 49;

/// Exposure time of a campaign night.
pub fn night_exposure(night: u32) -> Seconds {
    if night == 1 {
        FIRST_NIGHT_EXPOSURE
    } else {
        SHORT_NIGHT_EXPOSURE
    }
}

/// Bands observed during a campaign night.
pub fn night_bands(night: u32) -> &'static [Band] {
    if ONE_FILTER_NIGHTS.contains(&night) {
        &[Band::G]
    } else {
        &[Band::G, Band::R]
    }
}

/// Windows planned for one night of the campaign.
#[derive(Debug, Clone, PartialEq)]
pub struct NightPlan {
    /// Night number, 1 being the start date.
    pub night: u32,
    /// 00:00 UTC of the night date.
    pub date: MJD,
    /// Empty when the target is not observable that night.
    pub windows: Vec<ObservationWindow>,
}

impl NightPlan {
    pub fn window(&self, band: Band) -> Option<&ObservationWindow> {
        self.windows.iter().find(|w| w.band == band)
    }
}

/// An exposure to request from the ZTF scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedTrigger {
    pub mjd_start: MJD,
    pub field_id: FieldId,
    pub filter_id: u8,
    /// Seconds.
    pub exposure_time: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiDayObservation {
    name: String,
    start_date: MJD,
    field: Option<FieldId>,
    nights: Vec<NightPlan>,
}

impl MultiDayObservation {
    /// Plan a campaign for an alert, resolving the target through its alert source.
    ///
    /// Arguments
    /// ---------
    /// * `name`: alert name (`IC220501A`, `ZTF19accdntg`, ...).
    /// * `start_date`: date of night 1, `YYYY-MM-DD`.
    /// * `alert_source`: where the coordinates come from.
    /// * `env`: network client, configuration and field grid.
    pub fn new(
        name: &str,
        start_date: &str,
        alert_source: AlertSource,
        env: &PlanobsEnv,
    ) -> Result<Self, PlanobsError> {
        let initial = PlanObservation::builder(name)
            .date(start_date)
            .alert_source(alert_source)
            .build(env)?;
        Self::from_initial_plan(initial, env)
    }

    /// Plan a campaign for a target whose coordinates are already known.
    pub fn from_target(
        target: Target,
        start_date: &str,
        env: &PlanobsEnv,
    ) -> Result<Self, PlanobsError> {
        let initial = PlanObservation::builder(target.name.clone())
            .date(start_date)
            .target(target)
            .build(env)?;
        Self::from_initial_plan(initial, env)
    }

    fn from_initial_plan(
        mut initial: PlanObservation,
        env: &PlanobsEnv,
    ) -> Result<Self, PlanobsError> {
        let field = initial.request_ztf_fields(env)?;
        let start_date = initial.date();

        let nights = NIGHTS
            .iter()
            .map(|&night| {
                let options = PlanOptions {
                    observation_length: night_exposure(night),
                    bands: night_bands(night).to_vec(),
                    ..initial.options().clone()
                };
                let date = start_date + f64::from(night - 1);
                let plan = PlanObservation::compute(initial.target().clone(), date, options)?;
                if !plan.is_observable() {
                    log::warn!(
                        "{} is not observable during night {night} ({})",
                        plan.name(),
                        mjd_to_date(date)
                    );
                }
                Ok(NightPlan {
                    night,
                    date,
                    windows: plan.windows().to_vec(),
                })
            })
            .collect::<Result<Vec<_>, PlanobsError>>()?;

        Ok(Self::from_nights(initial.name(), start_date, field, nights))
    }

    /// Assemble a campaign from nights planned elsewhere.
    pub fn from_nights(
        name: impl Into<String>,
        start_date: MJD,
        field: Option<FieldId>,
        nights: Vec<NightPlan>,
    ) -> Self {
        MultiDayObservation {
            name: name.into(),
            start_date,
            field,
            nights,
        }
    }

    /// Same as [`Self::from_nights`] with the start date given as `YYYY-MM-DD`.
    pub fn from_nights_on(
        name: impl Into<String>,
        start_date: &str,
        field: Option<FieldId>,
        nights: Vec<NightPlan>,
    ) -> Result<Self, PlanobsError> {
        Ok(Self::from_nights(
            name,
            start_of_day(parse_date(start_date)?),
            field,
            nights,
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_date(&self) -> MJD {
        self.start_date
    }

    pub fn field(&self) -> Option<FieldId> {
        self.field
    }

    pub fn nights(&self) -> &[NightPlan] {
        &self.nights
    }

    /// Windows of one band across the campaign, with their night number.
    pub fn band_windows(&self, band: Band) -> impl Iterator<Item = (u32, &ObservationWindow)> {
        self.nights
            .iter()
            .filter_map(move |n| n.window(band).map(|w| (n.night, w)))
    }

    /// The campaign, band by band:
    ///
    /// ```text
    ///
    /// Your multi-day observation plan for IC220501A
    /// -------------------------------------------------
    /// g-band observations
    /// Night 1 2022-05-03 10:35:00 - 2022-05-03 10:40:00
    /// ...
    /// -------------------------------------------------
    ///
    /// -------------------------------------------------
    /// r-band observations
    /// ...
    /// ```
    pub fn summary_text(&self) -> String {
        let separator = "-".repeat(SEPARATOR_WIDTH);
        let mut text = format!("\nYour multi-day observation plan for {}\n", self.name);

        for band in [Band::G, Band::R] {
            text.push_str(&format!("{separator}\n{band} observations\n"));
            for (night, window) in self.band_windows(band) {
                text.push_str(&format!("Night {night} {window}\n"));
            }
            text.push_str(&format!("{separator}\n\n"));
        }
        text
    }

    pub fn print_plan(&self) {
        print!("{}", self.summary_text());
    }

    /// Exposures to request, g-band first then r-band, each in night order.
    ///
    /// Return
    /// ------
    /// * The triggers, empty (with a warning) when no ZTF field was recommended.
    pub fn triggers(&self) -> Vec<PlannedTrigger> {
        let Some(field_id) = self.field else {
            log::warn!("No ZTF field recommended for {}, no trigger planned", self.name);
            return Vec::new();
        };

        [Band::G, Band::R]
            .into_iter()
            .flat_map(|band| self.band_windows(band).map(|(_, w)| *w))
            .map(|window| PlannedTrigger {
                mjd_start: window.start,
                field_id,
                filter_id: window.band.filter_id(),
                exposure_time: window.exposure_time(),
            })
            .collect()
    }

    pub fn print_triggers(&self) {
        println!("{}", crate::display::trigger_table(&self.triggers()));
    }
}

#[cfg(test)]
mod multiday_test {
    use super::*;

    fn night(night: u32, start: MJD, bands: &[Band]) -> NightPlan {
        let length = night_exposure(night);
        NightPlan {
            night,
            date: start.floor(),
            windows: bands
                .iter()
                .enumerate()
                .map(|(i, &band)| ObservationWindow::new(band, start + i as f64 / 48.0, length))
                .collect(),
        }
    }

    #[test]
    fn test_schedule() {
        assert_eq!(night_exposure(1), 300.0);
        assert_eq!(night_exposure(9), 30.0);
        assert_eq!(night_bands(1), &[Band::G, Band::R]);
        assert_eq!(night_bands(5), &[Band::G]);
        assert_eq!(night_bands(9), &[Band::G, Band::R]);
    }

    #[test]
    fn test_triggers_order() {
        let plan = MultiDayObservation::from_nights(
            "IC220501A",
            59702.0,
            Some(593),
            vec![
                night(1, 59702.4, &[Band::G, Band::R]),
                night(2, 59703.4, &[Band::G]),
                night(9, 59710.4, &[Band::G, Band::R]),
            ],
        );
        let triggers = plan.triggers();
        let filters: Vec<u8> = triggers.iter().map(|t| t.filter_id).collect();
        assert_eq!(filters, vec![1, 1, 1, 2, 2]);
        let exposures: Vec<u32> = triggers.iter().map(|t| t.exposure_time).collect();
        assert_eq!(exposures, vec![300, 30, 30, 300, 30]);
        assert!(triggers.iter().all(|t| t.field_id == 593));
    }

    #[test]
    fn test_no_field_no_trigger() {
        let plan = MultiDayObservation::from_nights(
            "IC220501A",
            59702.0,
            None,
            vec![night(1, 59702.4, &[Band::G, Band::R])],
        );
        assert!(plan.triggers().is_empty());
    }

    #[test]
    fn test_unobservable_night_is_skipped() {
        let plan = MultiDayObservation::from_nights(
            "far_south",
            59702.0,
            Some(1),
            vec![NightPlan {
                night: 1,
                date: 59702.0,
                windows: Vec::new(),
            }],
        );
        assert!(plan.triggers().is_empty());
        assert!(plan.summary_text().contains("g-band observations\n----"));
    }
}
