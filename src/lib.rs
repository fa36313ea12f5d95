pub mod api;
pub mod config;
pub mod constants;
pub mod conversion;
pub mod display;
mod earth_orientation;
pub mod env_state;
mod ephemeris;
pub mod fields;
pub mod gcn_parser;
pub mod multiday_plan;
pub mod plan;
pub mod planobs_errors;
pub mod site;
pub mod target;
pub mod time;
pub mod visibility;
pub mod ztf_archive;

pub use api::{ApiError, Queue, TriggerSpec};
pub use env_state::PlanobsEnv;
pub use multiday_plan::MultiDayObservation;
pub use plan::PlanObservation;
pub use planobs_errors::PlanobsError;
