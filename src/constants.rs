//! # Constants and type definitions for planobs
//!
//! This module centralizes the **physical constants**, **unit conversions**, **type aliases**
//! and the **ZTF-specific identifiers** used by the planner.
//!
//! ## Overview
//!
//! - Angular and temporal unit conversions (degrees ↔ radians, days ↔ seconds)
//! - Reference epochs (J2000 in MJD)
//! - Type aliases used across the crate (`Degree`, `MJD`, …)
//! - ZTF filter identifiers and the fixed multi-night follow-up schedule
//!
//! These definitions are shared by the visibility, field and queue modules.

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Number of minutes in a day
pub const MINUTES_PER_DAY: f64 = 1_440.0;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Conversion factor between Julian Date and Modified Julian Date
pub const JDTOMJD: f64 = 2400000.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Arcminutes → degrees
pub const ARCMIN_TO_DEG: f64 = 1.0 / 60.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Distance in meters
pub type Meter = f64;
/// Duration in seconds
pub type Seconds = f64;
/// Modified Julian Date (days, UTC unless stated otherwise)
pub type MJD = f64;
/// ZTF field identifier
pub type FieldId = u32;

// -------------------------------------------------------------------------------------------------
// ZTF identifiers
// -------------------------------------------------------------------------------------------------

/// Highest field identifier of the ZTF primary grid; fields above belong to the secondary grid.
pub const PRIMARY_GRID_MAX_ID: FieldId = 999;

/// Sun altitude defining astronomical twilight, in degrees.
pub const ASTRONOMICAL_TWILIGHT: Degree = -18.0;

/// Default maximum airmass accepted by a plan.
pub const DEFAULT_MAX_AIRMASS: f64 = 2.0;

/// Default length of a single observation window, in seconds.
pub const DEFAULT_OBSERVATION_LENGTH: Seconds = 300.0;

/// Separation between the g-band and r-band windows of a night, in seconds.
pub const FILTER_SEPARATION: Seconds = 1_800.0;

/// Photometric bands of the ZTF camera, with their queue filter identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Band {
    G,
    R,
    I,
}

impl Band {
    /// Filter identifier expected by the ZTF scheduler queue (`g = 1`, `r = 2`, `i = 3`).
    pub fn filter_id(&self) -> u8 {
        match self {
            Band::G => 1,
            Band::R => 2,
            Band::I => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Band::G => "g",
            Band::R => "r",
            Band::I => "i",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-band", self.name())
    }
}

// -------------------------------------------------------------------------------------------------
// Multi-night follow-up schedule
// -------------------------------------------------------------------------------------------------

/// Nights (1-based, counted from the start date) of a multi-day follow-up campaign.
pub const NIGHTS: [u32; 6] = [1, 2, 3, 5, 7, 9];

/// Nights observed in the g band only.
pub const ONE_FILTER_NIGHTS: [u32; 4] = [2, 3, 5, 7];

/// Exposure time used on the first night, in seconds.
pub const FIRST_NIGHT_EXPOSURE: Seconds = 300.0;

/// Exposure time used on every night after the first, in seconds.
pub const SHORT_NIGHT_EXPOSURE: Seconds = 30.0;
