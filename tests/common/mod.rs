use std::sync::{Arc, Mutex};

use planobs::api::{ApiError, QueueBackend, QueueRecord, Trigger};

/// Scheduler stand-in keeping the submitted triggers in memory.
#[derive(Clone, Default)]
pub struct InMemoryScheduler {
    pub queues: Arc<Mutex<Vec<Trigger>>>,
}

impl QueueBackend for InMemoryScheduler {
    fn submit(&self, trigger: &Trigger) -> Result<(), ApiError> {
        self.queues.lock().unwrap().push(trigger.clone());
        Ok(())
    }

    fn delete(&self, user: &str, queue_name: &str) -> Result<(), ApiError> {
        let mut queues = self.queues.lock().unwrap();
        let before = queues.len();
        queues.retain(|t| !(t.user == user && t.queue_name == queue_name));
        if queues.len() == before {
            return Err(ApiError::Request {
                status: "error".into(),
                message: format!("no queue named {queue_name}"),
            });
        }
        Ok(())
    }

    fn list(&self, user: &str) -> Result<Vec<QueueRecord>, ApiError> {
        Ok(self
            .queues
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user == user)
            .map(|t| QueueRecord::new(t.queue_name.clone()))
            .collect())
    }
}

use camino::Utf8Path;
use planobs::config::PlanobsConfig;
use planobs::fields::grid::FieldGrid;
use planobs::multiday_plan::MultiDayObservation;
use planobs::target::Target;
use planobs::PlanobsEnv;

/// Environment backed by the field grid excerpt of `tests/data`, no network needed.
pub fn offline_env() -> PlanobsEnv {
    let grid = FieldGrid::from_path(Utf8Path::new("tests/data/ztf_fields_sample.txt")).unwrap();
    PlanobsEnv::with_field_grid(PlanobsConfig::default(), grid)
}

/// IC220501A campaign started on 2022-05-03, computed from the circular position.
pub fn ic220501a_campaign() -> MultiDayObservation {
    let target = Target::new("IC220501A", 311.57, 18.68).unwrap();
    MultiDayObservation::from_target(target, "2022-05-03", &offline_env()).unwrap()
}
