//! # ZTF fields
//!
//! Everything related to the fixed ZTF sky tiling:
//!
//! - [`grid`] – the field grid file and the field recommendation for a target,
//! - [`footprint`] – the camera footprint and its coverage of an error region,
//! - `download` – fetching the grid file into the user cache (`grid-download` feature).
//!
//! ## Locating the grid file
//!
//! [`locate_grid_file`] resolves the grid in this order:
//!
//! 1. the configured `fields.grid_path` (or `PLANOBS_FIELD_GRID`), which must exist,
//! 2. a previously cached copy in `<cache dir>/planobs_cache/ZTF_Fields.txt`,
//! 3. a fresh download into that cache when the `grid-download` feature is enabled.
pub mod footprint;
pub mod grid;

#[cfg(feature = "grid-download")]
pub mod download;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::config::FieldsConfig;
use crate::planobs_errors::PlanobsError;

/// Name of the cached grid file.
const GRID_FILE_NAME: &str = "ZTF_Fields.txt";

/// Location of the cached grid file, `None` when the platform has no cache directory.
pub fn default_grid_cache_path() -> Option<Utf8PathBuf> {
    let base_dir = BaseDirs::new()?;
    let cache_path = Utf8Path::from_path(base_dir.cache_dir())?;
    Some(cache_path.join("planobs_cache").join(GRID_FILE_NAME))
}

/// Resolve the path of the ZTF field grid file.
///
/// Arguments
/// ---------
/// * `config`: the fields section of the configuration.
///
/// Return
/// ------
/// * The path of an existing grid file, or [`PlanobsError::FieldGridNotFound`].
pub fn locate_grid_file(config: &FieldsConfig) -> Result<Utf8PathBuf, PlanobsError> {
    if let Some(path) = &config.grid_path {
        return if path.exists() {
            Ok(path.clone())
        } else {
            Err(PlanobsError::FieldGridNotFound(path.to_string()))
        };
    }

    let cache_path = default_grid_cache_path()
        .ok_or_else(|| PlanobsError::FieldGridNotFound("<no cache directory>".into()))?;

    if cache_path.exists() {
        return Ok(cache_path);
    }

    #[cfg(feature = "grid-download")]
    {
        if let Some(parent) = cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        download::download_field_grid(&config.grid_url, &cache_path)?;
        Ok(cache_path)
    }

    #[cfg(not(feature = "grid-download"))]
    {
        Err(PlanobsError::FieldGridNotFound(cache_path.to_string()))
    }
}
