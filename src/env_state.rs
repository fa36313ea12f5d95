//! # Planner environment state
//!
//! This module defines [`PlanobsEnv`], the **shared environment object** handed to every
//! operation that needs external data. It provides:
//!
//! - A persistent blocking **HTTP client** ([`ureq::Agent`]) with a global timeout, used for
//!   GCN pages and the AMPEL archive.
//! - The resolved [`PlanobsConfig`] (endpoints, credentials, footprint geometry).
//! - A lazily loaded **ZTF field grid**, read once on first use and cached in a [`OnceCell`].
//!
//! ## Structure
//!
//! ```text
//! PlanobsEnv
//! ├── http_client (ureq::Agent)
//! ├── config      (PlanobsConfig)
//! └── field_grid  (OnceCell<FieldGrid>)
//! ```
//!
//! Creating an environment never touches the network; requests are only issued by the
//! operations that need them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use planobs::env_state::PlanobsEnv;
//!
//! let env = PlanobsEnv::from_default_config()?;
//! let grid = env.field_grid()?;
//! println!("{} ZTF fields loaded", grid.len());
//! ```
use std::time::Duration;

use once_cell::sync::OnceCell;
use ureq::Agent;

use crate::config::PlanobsConfig;
use crate::fields::footprint::Footprint;
use crate::fields::grid::FieldGrid;
use crate::planobs_errors::PlanobsError;

/// Timeout applied to plain GET requests (GCN pages, archives), in seconds.
const HTTP_TIMEOUT: u64 = 10;

#[derive(Debug, Clone)]
pub struct PlanobsEnv {
    pub http_client: Agent,
    pub config: PlanobsConfig,
    field_grid: OnceCell<FieldGrid>,
}

impl PlanobsEnv {
    /// Create a new environment from an already resolved configuration.
    pub fn new(config: PlanobsConfig) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT)))
            .build();
        let agent: Agent = agent_config.into();

        PlanobsEnv {
            http_client: agent,
            config,
            field_grid: OnceCell::new(),
        }
    }

    /// Create an environment from the default configuration file and `PLANOBS_*` variables.
    pub fn from_default_config() -> Result<Self, PlanobsError> {
        Ok(Self::new(PlanobsConfig::load()?))
    }

    /// Create an environment whose field grid is already known (no file access needed).
    pub fn with_field_grid(config: PlanobsConfig, grid: FieldGrid) -> Self {
        PlanobsEnv {
            field_grid: OnceCell::with_value(grid),
            ..Self::new(config)
        }
    }

    /// Perform a GET request and return the response body as text.
    pub(crate) fn get_from_url(&self, url: &str) -> Result<String, PlanobsError> {
        log::debug!("GET {url}");
        let body = self
            .http_client
            .get(url)
            .call()?
            .body_mut()
            .read_to_string()?;
        Ok(body)
    }

    /// Get the lazily loaded ZTF field grid.
    ///
    /// The grid is read from `fields.grid_path` on first use. When no path is configured
    /// and the `grid-download` feature is enabled, the grid is downloaded into the user cache
    /// directory first.
    ///
    /// Return
    /// ----------
    /// * A reference to the cached [`FieldGrid`], or an error if it cannot be located or parsed.
    pub fn field_grid(&self) -> Result<&FieldGrid, PlanobsError> {
        self.field_grid.get_or_try_init(|| {
            let path = crate::fields::locate_grid_file(&self.config.fields)?;
            log::info!("Loading ZTF field grid from {path}");
            FieldGrid::from_path(&path)
        })
    }

    /// Camera footprint configured for field containment and coverage computations.
    pub fn footprint(&self) -> Footprint {
        Footprint::new(
            self.config.fields.half_width,
            self.config.fields.half_height,
        )
    }
}

#[cfg(test)]
mod env_state_test {
    use super::*;

    #[test]
    fn test_preloaded_grid() {
        let grid: FieldGrid = "1 10.0 20.0\n2 20.0 20.0\n".parse().unwrap();
        let env = PlanobsEnv::with_field_grid(PlanobsConfig::default(), grid);
        assert_eq!(env.field_grid().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_grid_path() {
        let mut config = PlanobsConfig::default();
        config.fields.grid_path = Some("does/not/exist/ZTF_Fields.txt".into());
        let env = PlanobsEnv::new(config);
        assert_eq!(
            env.field_grid().unwrap_err(),
            PlanobsError::FieldGridNotFound("does/not/exist/ZTF_Fields.txt".into())
        );
    }
}
