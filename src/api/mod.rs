//! # ZTF Target-of-Opportunity queue
//!
//! A [`Queue`] collects ToO triggers locally, then submits them to (or deletes them from)
//! the ZTF scheduler through a [`QueueBackend`]. The production backend is the Kowalski
//! API ([`kowalski::KowalskiClient`]); any other implementation of the trait (an in-memory
//! queue in tests, a dry-run logger, ...) can be plugged in with [`Queue::with_backend`].
//!
//! ## Trigger records
//!
//! Each call to [`Queue::add_trigger_to_queue`] creates one [`Trigger`], a single-target
//! queue named `"{trigger_name}_{index}"` where `index` counts the insertions:
//!
//! ```json
//! {
//!   "user": "DESY",
//!   "queue_name": "ToO_IC220501A_0",
//!   "queue_type": "list",
//!   "validity_window_mjd": [59702.44097222222, 59702.44444444444],
//!   "targets": [{
//!     "request_id": 1, "field_id": 593, "filter_id": 1,
//!     "subprogram_name": "ToO_Neutrino", "program_pi": "Kulkarni",
//!     "program_id": 2, "exposure_time": 300
//!   }]
//! }
//! ```
//!
//! ## Errors
//!
//! Every remote failure is an [`ApiError`]. Deleting triggers that are not in the remote
//! queue (e.g. an already empty queue) is reported as [`ApiError::Request`]; callers may
//! treat it as non-fatal.
pub mod kowalski;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{FieldId, MJD, SECONDS_PER_DAY};
use crate::env_state::PlanobsEnv;
use crate::planobs_errors::PlanobsError;

use self::kowalski::KowalskiClient;

/// Prefix required for every trigger name.
pub const TRIGGER_PREFIX: &str = "ToO_";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Request rejected by the queue API (status {status}): {message}")]
    Request { status: String, message: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Queue API is not reachable: {0}")]
    PingFailed(String),

    #[error("Invalid trigger name {0}: trigger names must start with ToO_")]
    InvalidTriggerName(String),

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("Unable to decode the queue API response: {0}")]
    Decode(String),
}

/// One target of a queue, as expected by the ZTF scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueTarget {
    pub request_id: u32,
    pub field_id: FieldId,
    pub filter_id: u8,
    pub subprogram_name: String,
    pub program_pi: String,
    pub program_id: u32,
    pub exposure_time: u32,
}

/// A named single-use queue submitted to the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub user: String,
    pub queue_name: String,
    pub queue_type: String,
    pub validity_window_mjd: [MJD; 2],
    pub targets: Vec<QueueTarget>,
}

/// Parameters of a trigger, with the defaults of the neutrino follow-up program.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerSpec {
    pub trigger_name: String,
    pub validity_window_start_mjd: MJD,
    /// Defaults to `start + exposure_time`.
    pub validity_window_end_mjd: Option<MJD>,
    pub field_id: FieldId,
    pub filter_id: u8,
    pub exposure_time: u32,
    pub request_id: u32,
    pub subprogram_name: String,
    pub program_pi: String,
    pub program_id: u32,
}

impl TriggerSpec {
    pub fn new(
        trigger_name: impl Into<String>,
        validity_window_start_mjd: MJD,
        field_id: FieldId,
        filter_id: u8,
    ) -> Self {
        TriggerSpec {
            trigger_name: trigger_name.into(),
            validity_window_start_mjd,
            validity_window_end_mjd: None,
            field_id,
            filter_id,
            exposure_time: 30,
            request_id: 1,
            subprogram_name: "ToO_Neutrino".into(),
            program_pi: "Kulkarni".into(),
            program_id: 2,
        }
    }

    pub fn exposure_time(mut self, seconds: u32) -> Self {
        self.exposure_time = seconds;
        self
    }

    pub fn validity_window_end(mut self, mjd: MJD) -> Self {
        self.validity_window_end_mjd = Some(mjd);
        self
    }

    pub fn subprogram(mut self, subprogram_name: impl Into<String>, program_id: u32) -> Self {
        self.subprogram_name = subprogram_name.into();
        self.program_id = program_id;
        self
    }

    pub fn program_pi(mut self, program_pi: impl Into<String>) -> Self {
        self.program_pi = program_pi.into();
        self
    }

    pub fn request_id(mut self, request_id: u32) -> Self {
        self.request_id = request_id;
        self
    }

    fn into_trigger(self, user: &str, index: usize) -> Trigger {
        let start = self.validity_window_start_mjd;
        let end = self
            .validity_window_end_mjd
            .unwrap_or(start + self.exposure_time as f64 / SECONDS_PER_DAY);

        Trigger {
            user: user.to_string(),
            queue_name: format!("{}_{}", self.trigger_name, index),
            queue_type: "list".into(),
            validity_window_mjd: [start, end],
            targets: vec![QueueTarget {
                request_id: self.request_id,
                field_id: self.field_id,
                filter_id: self.filter_id,
                subprogram_name: self.subprogram_name,
                program_pi: self.program_pi,
                program_id: self.program_id,
                exposure_time: self.exposure_time,
            }],
        }
    }
}

/// One queue known by the scheduler. Only the name is interpreted, everything else is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueRecord {
    pub queue_name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl QueueRecord {
    pub fn new(queue_name: impl Into<String>) -> Self {
        QueueRecord {
            queue_name: queue_name.into(),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueListing {
    pub data: Vec<QueueRecord>,
}

/// Remote side of a [`Queue`].
pub trait QueueBackend {
    /// Submit one trigger.
    fn submit(&self, trigger: &Trigger) -> Result<(), ApiError>;

    /// Delete the queue `queue_name` of `user`.
    fn delete(&self, user: &str, queue_name: &str) -> Result<(), ApiError>;

    /// Every queue currently known for `user`.
    fn list(&self, user: &str) -> Result<Vec<QueueRecord>, ApiError>;
}

pub struct Queue {
    user: String,
    backend: Box<dyn QueueBackend>,
    triggers: BTreeMap<usize, Trigger>,
    next_index: usize,
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("user", &self.user)
            .field("triggers", &self.triggers)
            .finish_non_exhaustive()
    }
}

impl Queue {
    /// Connect to the Kowalski API configured in `env` (authentication and ping).
    pub fn new(user: impl Into<String>, env: &PlanobsEnv) -> Result<Self, PlanobsError> {
        let client = KowalskiClient::connect(&env.config.kowalski)?;
        Ok(Self::with_backend(user, client))
    }

    pub fn with_backend(user: impl Into<String>, backend: impl QueueBackend + 'static) -> Self {
        Queue {
            user: user.into(),
            backend: Box::new(backend),
            triggers: BTreeMap::new(),
            next_index: 0,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Add a trigger to the local queue.
    ///
    /// Return
    /// ------
    /// * The index of the trigger, or [`ApiError::InvalidTriggerName`] when the name does not
    ///   start with `ToO_`.
    pub fn add_trigger_to_queue(&mut self, spec: TriggerSpec) -> Result<usize, ApiError> {
        if !spec.trigger_name.starts_with(TRIGGER_PREFIX) {
            return Err(ApiError::InvalidTriggerName(spec.trigger_name));
        }
        let index = self.next_index;
        let trigger = spec.into_trigger(&self.user, index);
        log::debug!("Adding trigger {} to the queue", trigger.queue_name);
        self.triggers.insert(index, trigger);
        self.next_index += 1;
        Ok(index)
    }

    /// Local triggers with their index, in insertion order.
    pub fn get_triggers(&self) -> Vec<(usize, Trigger)> {
        self.triggers
            .iter()
            .map(|(i, t)| (*i, t.clone()))
            .collect()
    }

    /// Print the local triggers as a table.
    pub fn print(&self) {
        println!("{}", crate::display::queue_table(self.triggers.iter()));
    }

    /// Submit every local trigger.
    pub fn submit_queue(&self) -> Result<(), ApiError> {
        for trigger in self.triggers.values() {
            self.backend.submit(trigger)?;
            log::info!("Submitted trigger {}", trigger.queue_name);
        }
        Ok(())
    }

    /// Delete every local trigger from the remote queue. The local queue is kept.
    pub fn delete_queue(&self) -> Result<(), ApiError> {
        for trigger in self.triggers.values() {
            self.backend.delete(&self.user, &trigger.queue_name)?;
            log::info!("Deleted trigger {}", trigger.queue_name);
        }
        Ok(())
    }

    /// Delete one queue remotely, and locally if it was created by this queue.
    pub fn delete_trigger(&mut self, queue_name: &str) -> Result<(), ApiError> {
        self.backend.delete(&self.user, queue_name)?;
        self.triggers.retain(|_, t| t.queue_name != queue_name);
        Ok(())
    }

    pub fn get_all_queues(&self) -> Result<QueueListing, ApiError> {
        Ok(QueueListing {
            data: self.backend.list(&self.user)?,
        })
    }

    /// Remote queues whose name starts with `ToO`.
    pub fn get_too_queues(&self) -> Result<QueueListing, ApiError> {
        let mut listing = self.get_all_queues()?;
        listing.data.retain(|record| record.queue_name.starts_with("ToO"));
        Ok(listing)
    }

    pub fn get_too_queue_names(&self) -> Result<Vec<String>, ApiError> {
        Ok(self
            .get_too_queues()?
            .data
            .into_iter()
            .map(|record| record.queue_name)
            .collect())
    }

    /// Drop every local trigger and restart the numbering.
    pub fn clear(&mut self) {
        self.triggers.clear();
        self.next_index = 0;
    }
}
