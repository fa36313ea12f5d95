//! # ZTF field grid
//!
//! The ZTF survey tiles the sky with a fixed set of pointings. The grid is distributed as a
//! whitespace separated text file (`ZTF_Fields.txt`):
//!
//! ```text
//! #ID   RA        Dec      Ebv     Gal_Long  Gal_Lat   Ecl_Long  Ecl_Lat   Entry
//! 593   310.7964  19.7500  0.0852  ...
//! ```
//!
//! Only the first three columns are required here. Field identifiers up to
//! [`PRIMARY_GRID_MAX_ID`] form the **primary grid**; the secondary grid is shifted to fill
//! the chip gaps of the primary one and is only used when no primary field contains the
//! target.
use std::str::FromStr;

use camino::Utf8Path;

use crate::constants::{Degree, FieldId, PRIMARY_GRID_MAX_ID};
use crate::conversion::angular_separation;
use crate::planobs_errors::PlanobsError;
use crate::target::Target;

use super::footprint::Footprint;

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: FieldId,
    pub ra: Degree,
    pub dec: Degree,
    /// Galactic reddening E(B−V) at the field centre.
    pub ebv: Option<f64>,
    pub galactic_longitude: Option<Degree>,
    pub galactic_latitude: Option<Degree>,
}

impl Field {
    pub fn is_primary(&self) -> bool {
        self.id <= PRIMARY_GRID_MAX_ID
    }

    /// Angular distance from the field centre, in degrees.
    pub fn separation(&self, ra: Degree, dec: Degree) -> Degree {
        angular_separation(self.ra, self.dec, ra, dec)
    }
}

/// A field that could observe the target, with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCandidate {
    pub field: Field,
    /// Covered fraction of the target error region (1 for a contained point-like target).
    pub coverage: f64,
    /// Distance between the target and the field centre, degrees.
    pub separation: Degree,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldGrid {
    fields: Vec<Field>,
}

fn parse_optional(token: Option<&str>) -> Option<f64> {
    token.and_then(|t| t.parse::<f64>().ok())
}

fn parse_field_line(line: &str, line_number: usize) -> Result<Field, PlanobsError> {
    let invalid = || PlanobsError::InvalidFieldGrid {
        line: line_number,
        content: line.to_string(),
    };

    let mut tokens = line.split_whitespace();
    let id = tokens
        .next()
        .and_then(|t| t.parse::<FieldId>().ok())
        .ok_or_else(invalid)?;
    let ra = tokens
        .next()
        .and_then(|t| t.parse::<f64>().ok())
        .ok_or_else(invalid)?;
    let dec = tokens
        .next()
        .and_then(|t| t.parse::<f64>().ok())
        .filter(|d| (-90.0..=90.0).contains(d))
        .ok_or_else(invalid)?;

    Ok(Field {
        id,
        ra: ra.rem_euclid(360.0),
        dec,
        ebv: parse_optional(tokens.next()),
        galactic_longitude: parse_optional(tokens.next()),
        galactic_latitude: parse_optional(tokens.next()),
    })
}

impl FromStr for FieldGrid {
    type Err = PlanobsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            // column header without leading '#'
            .filter(|(_, line)| !line.starts_with("ID"))
            .map(|(number, line)| parse_field_line(line, number))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FieldGrid { fields })
    }
}

impl FieldGrid {
    /// Read a grid file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, PlanobsError> {
        let content = std::fs::read_to_string(path)?;
        let grid: FieldGrid = content.parse()?;
        log::debug!("{} ZTF fields read from {path}", grid.len());
        Ok(grid)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn get(&self, id: FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Every field (primary or secondary) whose footprint contains the position.
    pub fn fields_containing(
        &self,
        ra: Degree,
        dec: Degree,
        footprint: &Footprint,
    ) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|f| footprint.contains(f, ra, dec))
            .collect()
    }

    /// Score the fields able to observe a target.
    ///
    /// Candidates are the primary fields containing the target position; when there is none,
    /// the secondary fields containing it are used instead. Each candidate is scored by the
    /// fraction of the target error region it covers (see [`Footprint::coverage`]).
    ///
    /// Arguments
    /// ---------
    /// * `target`: the target, with or without positional uncertainty.
    /// * `footprint`: the camera footprint.
    /// * `samples`: samples per axis of the coverage integration.
    ///
    /// Return
    /// ------
    /// * The candidates, best first: highest coverage, then closest centre.
    pub fn candidates(
        &self,
        target: &Target,
        footprint: &Footprint,
        samples: usize,
    ) -> Vec<FieldCandidate> {
        let containing = self.fields_containing(target.ra, target.dec, footprint);
        let (primary, secondary): (Vec<&Field>, Vec<&Field>) =
            containing.into_iter().partition(|f| f.is_primary());

        let selected = if primary.is_empty() {
            if !secondary.is_empty() {
                log::info!(
                    "No primary ZTF field contains {}, using the secondary grid",
                    target.name
                );
            }
            secondary
        } else {
            primary
        };

        let region = target.error_region();
        let mut candidates: Vec<FieldCandidate> = selected
            .into_iter()
            .map(|field| FieldCandidate {
                coverage: region
                    .as_ref()
                    .map_or(1.0, |r| footprint.coverage(field, r, samples)),
                separation: field.separation(target.ra, target.dec),
                field: field.clone(),
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.coverage
                .total_cmp(&a.coverage)
                .then(a.separation.total_cmp(&b.separation))
        });
        candidates
    }

    /// Best field for a target, `None` when no field contains it.
    pub fn recommend(
        &self,
        target: &Target,
        footprint: &Footprint,
        samples: usize,
    ) -> Option<FieldCandidate> {
        self.candidates(target, footprint, samples).into_iter().next()
    }
}
