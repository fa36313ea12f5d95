//! # Single-night observation plan
//!
//! [`PlanObservation`] answers, for one target and one date, the questions asked before a
//! ZTF Target-of-Opportunity request:
//!
//! - Is there an astronomical night at Palomar, and when does it start and end?
//! - Is the target above the airmass limit at some point of that night?
//! - When should the g-band and r-band exposures be taken?
//! - How far is the Moon, and how bright?
//! - Which ZTF field covers the target best ([`PlanObservation::request_ztf_fields`])?
//!
//! ## Overview
//!
//! ```rust,ignore
//! use planobs::env_state::PlanobsEnv;
//! use planobs::plan::PlanObservation;
//! use planobs::target::AlertSource;
//!
//! let env = PlanobsEnv::from_default_config()?;
//! let mut plan = PlanObservation::builder("IC220624A")
//!     .alert_source(AlertSource::IceCube)
//!     .build(&env)?;
//! plan.request_ztf_fields(&env)?;
//! plan.print_plan();
//! println!("{:?}", plan.recommended_field());
//! ```
//!
//! ## Coordinates
//!
//! Explicit coordinates (or a full [`Target`]) always win. Otherwise the alert source
//! decides: IceCube events are looked up in the GCN circular archive, ZTF transients in the
//! ZTF alert archive. Without either, [`PlanobsError::MissingCoordinates`] is returned.
//!
//! ## Date
//!
//! The night planned for a date is the first night whose evening twilight follows
//! 00:00 UTC of that date. Without an explicit date the arrival date of the alert is used,
//! and today otherwise.
//!
//! ## See also
//!
//! * [`crate::visibility`] – night search, airmass sampling and window placement.
//! * [`crate::multiday_plan`] – the same plan repeated over a follow-up campaign.
use camino::Utf8Path;
use serde::Serialize;

use crate::constants::{
    Band, Degree, FieldId, Seconds, ASTRONOMICAL_TWILIGHT, DEFAULT_MAX_AIRMASS,
    DEFAULT_OBSERVATION_LENGTH, MJD, RADEG, SECONDS_PER_DAY,
};
use crate::conversion::{angular_separation, dec_to_dms, ra_to_hms};
use crate::earth_orientation::precess_from_j2000;
use crate::env_state::PlanobsEnv;
use crate::ephemeris::{moon_illumination, moon_position};
use crate::fields::footprint::Footprint;
use crate::fields::grid::{FieldCandidate, FieldGrid};
use crate::gcn_parser::target_from_circular;
use crate::planobs_errors::PlanobsError;
use crate::site::Site;
use crate::target::{AlertSource, Target};
use crate::time::{mjd_to_date, mjd_to_iso_seconds, parse_date, start_of_day, today_mjd};
use crate::visibility::{
    find_night, recommend_windows, AirmassCurve, AirmassSample, Night, ObservationWindow,
};
use crate::ztf_archive::ZtfArchive;

/// Default sampling step of the airmass curve, in seconds: 1000 samples over the plan
/// date, both midnights included.
pub const DEFAULT_TIME_RESOLUTION: Seconds = SECONDS_PER_DAY / 999.0;

/// Everything a plan depends on besides the target and the date.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOptions {
    pub site: Site,
    pub max_airmass: f64,
    /// Length of each observation window, seconds.
    pub observation_length: Seconds,
    /// Sampling step of the airmass curve, seconds.
    pub time_resolution: Seconds,
    pub bands: Vec<Band>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        PlanOptions {
            site: Site::palomar(),
            max_airmass: DEFAULT_MAX_AIRMASS,
            observation_length: DEFAULT_OBSERVATION_LENGTH,
            time_resolution: DEFAULT_TIME_RESOLUTION,
            bands: vec![Band::G, Band::R],
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlanObservationBuilder {
    name: String,
    date: Option<String>,
    coordinates: Option<(Degree, Degree)>,
    target: Option<Target>,
    alert_source: AlertSource,
    options: PlanOptions,
}

impl PlanObservationBuilder {
    /// Date of the plan, `YYYY-MM-DD` or a full ISO datetime (only the UTC day is used).
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// J2000 coordinates in degrees.
    pub fn coordinates(mut self, ra: Degree, dec: Degree) -> Self {
        self.coordinates = Some((ra, dec));
        self
    }

    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn alert_source(mut self, alert_source: AlertSource) -> Self {
        self.alert_source = alert_source;
        self
    }

    pub fn max_airmass(mut self, max_airmass: f64) -> Self {
        self.options.max_airmass = max_airmass;
        self
    }

    pub fn observation_length(mut self, seconds: Seconds) -> Self {
        self.options.observation_length = seconds;
        self
    }

    pub fn site(mut self, site: Site) -> Self {
        self.options.site = site;
        self
    }

    pub fn time_resolution(mut self, seconds: Seconds) -> Self {
        self.options.time_resolution = seconds;
        self
    }

    pub fn bands(mut self, bands: &[Band]) -> Self {
        self.options.bands = bands.to_vec();
        self
    }

    fn resolve_target(&self, env: &PlanobsEnv) -> Result<Target, PlanobsError> {
        if let Some(target) = &self.target {
            return Ok(target.clone());
        }
        if let Some((ra, dec)) = self.coordinates {
            return Ok(Target::new(&self.name, ra, dec)?.with_alert_source(self.alert_source));
        }
        match self.alert_source {
            AlertSource::IceCube => target_from_circular(env, &self.name),
            AlertSource::Ztf => ZtfArchive::new(env).resolve(&self.name),
            AlertSource::None => Err(PlanobsError::MissingCoordinates(self.name.clone())),
        }
    }

    /// Resolve the target and compute the plan.
    ///
    /// Network access only happens when the coordinates have to be looked up from the
    /// alert source.
    pub fn build(self, env: &PlanobsEnv) -> Result<PlanObservation, PlanobsError> {
        let target = self.resolve_target(env)?;

        let date = match (&self.date, target.arrival_time) {
            (Some(date), _) => start_of_day(parse_date(date)?),
            (None, Some(arrival)) => start_of_day(arrival),
            (None, None) => today_mjd()?,
        };

        PlanObservation::compute(target, date, self.options)
    }
}

/// One row of the visibility export.
#[derive(Debug, Serialize)]
struct VisibilityRecord {
    time_utc: String,
    mjd: MJD,
    altitude: Degree,
    airmass: Option<f64>,
    sun_altitude: Degree,
    moon_altitude: Degree,
    observable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanObservation {
    target: Target,
    /// 00:00 UTC of the plan date.
    date: MJD,
    options: PlanOptions,
    night: Option<Night>,
    airmass_curve: Option<AirmassCurve>,
    windows: Vec<ObservationWindow>,
    best_sample: Option<AirmassSample>,
    moon_separation: Option<Degree>,
    moon_illumination: Option<f64>,
    field_candidates: Vec<FieldCandidate>,
    recommended_field: Option<FieldId>,
}

impl PlanObservation {
    pub fn builder(name: impl Into<String>) -> PlanObservationBuilder {
        PlanObservationBuilder {
            name: name.into(),
            date: None,
            coordinates: None,
            target: None,
            alert_source: AlertSource::None,
            options: PlanOptions::default(),
        }
    }

    /// Plan a known target for the night following `date`.
    ///
    /// Arguments
    /// ---------
    /// * `target`: the J2000 target.
    /// * `date`: start of the night search (UTC MJD), usually 00:00 of the plan date.
    /// * `options`: site, airmass limit, window length, sampling step and bands.
    ///
    /// Return
    /// ------
    /// * The plan. A target never observable (or a site without night) gives a plan with no
    ///   window rather than an error.
    pub fn compute(
        target: Target,
        date: MJD,
        options: PlanOptions,
    ) -> Result<Self, PlanobsError> {
        let mut plan = PlanObservation {
            target,
            date,
            options,
            night: None,
            airmass_curve: None,
            windows: Vec::new(),
            best_sample: None,
            moon_separation: None,
            moon_illumination: None,
            field_candidates: Vec::new(),
            recommended_field: None,
        };

        let site = &plan.options.site;
        let Some(night) = find_night(site, date, ASTRONOMICAL_TWILIGHT)? else {
            log::warn!(
                "No astronomical night at {} after {}",
                site.name,
                mjd_to_date(date)
            );
            return Ok(plan);
        };

        let curve = AirmassCurve::compute(
            site,
            plan.target.ra,
            plan.target.dec,
            date,
            &night,
            plan.options.time_resolution,
        );

        if let Some(best) = curve.best_sample(plan.options.max_airmass).copied() {
            plan.windows = recommend_windows(
                &night,
                best.mjd,
                plan.options.observation_length,
                &plan.options.bands,
            );

            let moon = moon_position(best.mjd);
            let (ra, dec) =
                precess_from_j2000(plan.target.ra * RADEG, plan.target.dec * RADEG, best.mjd);
            plan.moon_separation = Some(angular_separation(
                ra / RADEG,
                dec / RADEG,
                moon.ra_deg(),
                moon.dec_deg(),
            ));
            plan.moon_illumination = Some(moon_illumination(best.mjd));
            plan.best_sample = Some(best);
        } else {
            log::info!(
                "{} is not observable from {} on {} (airmass <= {})",
                plan.target.name,
                site.name,
                mjd_to_date(date),
                plan.options.max_airmass
            );
        }

        plan.night = Some(night);
        plan.airmass_curve = Some(curve);
        Ok(plan)
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn name(&self) -> &str {
        &self.target.name
    }

    pub fn date(&self) -> MJD {
        self.date
    }

    pub fn options(&self) -> &PlanOptions {
        &self.options
    }

    pub fn site(&self) -> &Site {
        &self.options.site
    }

    pub fn night(&self) -> Option<&Night> {
        self.night.as_ref()
    }

    pub fn airmass_curve(&self) -> Option<&AirmassCurve> {
        self.airmass_curve.as_ref()
    }

    pub fn is_observable(&self) -> bool {
        self.best_sample.is_some()
    }

    /// Lowest-airmass observable instant of the night.
    pub fn best_sample(&self) -> Option<&AirmassSample> {
        self.best_sample.as_ref()
    }

    pub fn windows(&self) -> &[ObservationWindow] {
        &self.windows
    }

    pub fn window(&self, band: Band) -> Option<&ObservationWindow> {
        self.windows.iter().find(|w| w.band == band)
    }

    pub fn g_band_window(&self) -> Option<&ObservationWindow> {
        self.window(Band::G)
    }

    pub fn r_band_window(&self) -> Option<&ObservationWindow> {
        self.window(Band::R)
    }

    /// Target–Moon separation at the best time, degrees.
    pub fn moon_separation(&self) -> Option<Degree> {
        self.moon_separation
    }

    /// Illuminated fraction of the Moon at the best time.
    pub fn moon_illumination(&self) -> Option<f64> {
        self.moon_illumination
    }

    pub fn field_candidates(&self) -> &[FieldCandidate] {
        &self.field_candidates
    }

    pub fn recommended_field(&self) -> Option<FieldId> {
        self.recommended_field
    }

    /// Look for the ZTF fields covering the target, using the grid and footprint of `env`.
    ///
    /// Return
    /// ------
    /// * The recommended field, see [`Self::select_fields`].
    pub fn request_ztf_fields(&mut self, env: &PlanobsEnv) -> Result<Option<FieldId>, PlanobsError> {
        let grid = env.field_grid()?;
        Ok(self.select_fields(grid, &env.footprint(), env.config.fields.coverage_samples))
    }

    /// Score the fields containing the target and keep the best one.
    ///
    /// The candidates are always stored, the recommendation only when the target is
    /// observable during the night.
    pub fn select_fields(
        &mut self,
        grid: &FieldGrid,
        footprint: &Footprint,
        samples: usize,
    ) -> Option<FieldId> {
        self.field_candidates = grid.candidates(&self.target, footprint, samples);

        self.recommended_field = match self.field_candidates.first() {
            Some(best) if self.is_observable() => Some(best.field.id),
            Some(_) => {
                log::warn!(
                    "{} is not observable, no field recommended",
                    self.target.name
                );
                None
            }
            None => {
                log::warn!("No ZTF field contains {}", self.target.name);
                None
            }
        };
        self.recommended_field
    }

    /// Human-readable description of the plan.
    pub fn summary_text(&self) -> String {
        let target = &self.target;
        let mut lines = vec![
            format!(
                "Target {}: RA {} ({:.4}), Dec {} ({:.4})",
                target.name,
                ra_to_hms(target.ra),
                target.ra,
                dec_to_dms(target.dec),
                target.dec
            ),
            format!("Observation date: {}", mjd_to_date(self.date)),
        ];

        match &self.night {
            Some(night) => lines.push(format!(
                "Astronomical night at {}: {} - {}",
                self.options.site.name,
                mjd_to_iso_seconds(night.evening),
                mjd_to_iso_seconds(night.morning)
            )),
            None => lines.push(format!(
                "No astronomical night at {}",
                self.options.site.name
            )),
        }

        match &self.best_sample {
            Some(best) => {
                lines.push(format!(
                    "Observable (airmass <= {}), best airmass {:.2} at {}",
                    self.options.max_airmass,
                    best.airmass.unwrap_or(f64::NAN),
                    mjd_to_iso_seconds(best.mjd)
                ));
                lines.extend(
                    self.windows
                        .iter()
                        .map(|window| format!("{}: {window}", window.band)),
                );
            }
            None => lines.push(format!(
                "Not observable (airmass <= {})",
                self.options.max_airmass
            )),
        }

        if let (Some(separation), Some(illumination)) =
            (self.moon_separation, self.moon_illumination)
        {
            lines.push(format!(
                "Moon: separation {separation:.1} deg, illumination {:.0} %",
                illumination * 100.0
            ));
        }

        if let Some(id) = self.recommended_field {
            let coverage = self
                .field_candidates
                .iter()
                .find(|c| c.field.id == id)
                .map_or(0.0, |c| c.coverage);
            lines.push(format!(
                "Recommended field: {id} (coverage {:.0} %)",
                coverage * 100.0
            ));
        }

        lines.join("\n")
    }

    pub fn print_plan(&self) {
        println!("{}", self.summary_text());
        if !self.field_candidates.is_empty() {
            println!("{}", crate::display::field_table(&self.field_candidates));
        }
    }

    /// Write the airmass curve as CSV, one row per sample.
    ///
    /// Columns: `time_utc, mjd, altitude, airmass, sun_altitude, moon_altitude, observable`;
    /// the airmass is empty below the horizon. Nothing but the header is written when the
    /// site has no night.
    pub fn write_visibility_csv(&self, path: &Utf8Path) -> Result<(), PlanobsError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        writer.write_record([
            "time_utc",
            "mjd",
            "altitude",
            "airmass",
            "sun_altitude",
            "moon_altitude",
            "observable",
        ])?;

        let Some(curve) = &self.airmass_curve else {
            writer.flush()?;
            return Ok(());
        };
        let samples = curve.samples();
        for sample in samples {
            writer.serialize(VisibilityRecord {
                time_utc: mjd_to_iso_seconds(sample.mjd),
                mjd: sample.mjd,
                altitude: sample.altitude,
                airmass: sample.airmass,
                sun_altitude: sample.sun_altitude,
                moon_altitude: sample.moon_altitude,
                observable: curve.is_observable_sample(sample, self.options.max_airmass),
            })?;
        }
        writer.flush()?;
        log::debug!("{} visibility samples written to {path}", samples.len());
        Ok(())
    }
}
