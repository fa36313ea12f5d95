//! # Planner configuration
//!
//! [`PlanobsConfig`] gathers every external endpoint and credential the planner needs:
//! the Kowalski queue API, the GCN archives, the AMPEL ZTF archive and the location of
//! the ZTF field grid file.
//!
//! Values are resolved in three layers, each overriding the previous one:
//!
//! 1. built-in defaults ([`PlanobsConfig::default`]),
//! 2. a TOML file (by default `<config dir>/planobs/config.toml`, see [`PlanobsConfig::default_path`]),
//! 3. environment variables:
//!    - `PLANOBS_KOWALSKI_USER`, `PLANOBS_KOWALSKI_PASSWORD`
//!    - `PLANOBS_AMPEL_TOKEN`
//!    - `PLANOBS_FIELD_GRID`
//!
//! ```toml
//! [kowalski]
//! host = "kowalski.caltech.edu"
//! username = "planner"
//!
//! [fields]
//! grid_path = "/data/ZTF_Fields.txt"
//! half_width = 3.5
//! ```
use std::env;

use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::planobs_errors::PlanobsError;

const ENV_KOWALSKI_USER: &str = "PLANOBS_KOWALSKI_USER";
const ENV_KOWALSKI_PASSWORD: &str = "PLANOBS_KOWALSKI_PASSWORD";
const ENV_AMPEL_TOKEN: &str = "PLANOBS_AMPEL_TOKEN";
const ENV_FIELD_GRID: &str = "PLANOBS_FIELD_GRID";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KowalskiConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    /// Global timeout of a single API call, in seconds.
    pub timeout: u64,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for KowalskiConfig {
    fn default() -> Self {
        KowalskiConfig {
            protocol: "https".into(),
            host: "kowalski.caltech.edu".into(),
            port: 443,
            timeout: 30,
            username: None,
            password: None,
        }
    }
}

impl KowalskiConfig {
    /// Base URL of the API, e.g. `https://kowalski.caltech.edu:443`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcnConfig {
    /// HTML listing of all GCN circulars (number + subject).
    pub archive_url: String,
    /// Base URL under which circular `N` is served as `gcn3/N.gcn3`.
    pub circular_base_url: String,
    /// HTML table of the IceCube Gold/Bronze AMON events.
    pub amon_events_url: String,
    /// Base URL of the AMON notice pages linked from the events table.
    pub notice_base_url: String,
}

impl Default for GcnConfig {
    fn default() -> Self {
        GcnConfig {
            archive_url: "https://gcn.gsfc.nasa.gov/gcn3_archive.html".into(),
            circular_base_url: "https://gcn.gsfc.nasa.gov".into(),
            amon_events_url: "https://gcn.gsfc.nasa.gov/amon_icecube_gold_bronze_events.html"
                .into(),
            notice_base_url: "https://gcn.gsfc.nasa.gov".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmpelConfig {
    pub archive_url: String,
    pub token: Option<String>,
}

impl Default for AmpelConfig {
    fn default() -> Self {
        AmpelConfig {
            archive_url: "https://ampel.zeuthen.desy.de/api/ztf/archive/v3".into(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldsConfig {
    /// Local path of the `ZTF_Fields.txt` grid file.
    pub grid_path: Option<Utf8PathBuf>,
    /// Source of the grid file when it has to be downloaded.
    pub grid_url: String,
    /// Half width of the camera footprint (tangent plane, degrees).
    pub half_width: f64,
    /// Half height of the camera footprint (tangent plane, degrees).
    pub half_height: f64,
    /// Samples per axis used to integrate the error region coverage.
    pub coverage_samples: usize,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        FieldsConfig {
            grid_path: None,
            grid_url:
                "https://raw.githubusercontent.com/MickaelRigault/ztfquery/master/ztfquery/data/ZTF_Fields.txt"
                    .into(),
            half_width: 3.5,
            half_height: 3.5,
            coverage_samples: 40,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanobsConfig {
    pub kowalski: KowalskiConfig,
    pub gcn: GcnConfig,
    pub ampel: AmpelConfig,
    pub fields: FieldsConfig,
}

impl PlanobsConfig {
    /// Default location of the configuration file, `None` when no home directory is known.
    pub fn default_path() -> Option<Utf8PathBuf> {
        let dirs = ProjectDirs::from("", "", "planobs")?;
        let dir = Utf8Path::from_path(dirs.config_dir())?;
        Some(dir.join("config.toml"))
    }

    /// Parse a configuration from a TOML document. Missing tables and keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, PlanobsError> {
        Ok(toml::from_str(content)?)
    }

    /// Read a configuration file without applying environment overrides.
    pub fn from_file(path: &Utf8Path) -> Result<Self, PlanobsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load the configuration from the default file (if it exists) and the environment.
    ///
    /// Return
    /// ----------
    /// * The merged configuration, or an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, PlanobsError> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => {
                log::debug!("Loading planobs configuration from {path}");
                Self::from_file(&path)?
            }
            _ => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override credentials and paths with the `PLANOBS_*` environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(user) = env::var(ENV_KOWALSKI_USER) {
            self.kowalski.username = Some(user);
        }
        if let Ok(password) = env::var(ENV_KOWALSKI_PASSWORD) {
            self.kowalski.password = Some(password);
        }
        if let Ok(token) = env::var(ENV_AMPEL_TOKEN) {
            self.ampel.token = Some(token);
        }
        if let Ok(path) = env::var(ENV_FIELD_GRID) {
            self.fields.grid_path = Some(Utf8PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), PlanobsError> {
        if self.fields.half_width <= 0.0 || self.fields.half_height <= 0.0 {
            return Err(PlanobsError::InvalidConfig(
                "field footprint half sizes must be positive".into(),
            ));
        }
        if self.fields.coverage_samples == 0 {
            return Err(PlanobsError::InvalidConfig(
                "coverage_samples must be at least 1".into(),
            ));
        }
        if self.kowalski.timeout == 0 {
            return Err(PlanobsError::InvalidConfig(
                "kowalski timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}
