//! # Camera footprint geometry
//!
//! The ZTF camera covers a roughly square patch of about 7° × 7° on the sky. A field is
//! modelled as a rectangle centred on the field centre in the **gnomonic tangent plane**
//! of that centre:
//!
//! ```text
//!              η
//!              ▲
//!        ┌─────┼─────┐  half_height
//!        │     │     │
//!  ──────┼─────●─────┼──▶ ξ
//!        │   centre  │
//!        └─────┼─────┘
//!         half_width
//! ```
//!
//! Working in the tangent plane keeps the footprint shape independent of the declination
//! of the field, unlike a naive cut in (ra, dec).
//!
//! ## See also
//! ------------
//! * [`FieldGrid::recommend`](crate::fields::grid::FieldGrid::recommend) – uses [`Footprint::coverage`]
//!   to score candidate fields.
use crate::constants::{Degree, RADEG};
use crate::target::SkyRegion;

use super::grid::Field;

/// Rectangular camera footprint in the tangent plane, half sizes in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub half_width: Degree,
    pub half_height: Degree,
}

impl Default for Footprint {
    fn default() -> Self {
        Footprint {
            half_width: 3.5,
            half_height: 3.5,
        }
    }
}

/// Gnomonic projection of `(ra, dec)` on the plane tangent at `(ra0, dec0)`.
///
/// Arguments
/// ---------
/// * `ra0`, `dec0`: tangent point, degrees.
/// * `ra`, `dec`: projected position, degrees.
///
/// Return
/// ------
/// * Standard coordinates `(ξ, η)` in degrees, or `None` when the position lies on the far
///   hemisphere (the projection is undefined there).
pub fn gnomonic(ra0: Degree, dec0: Degree, ra: Degree, dec: Degree) -> Option<(Degree, Degree)> {
    let (sd0, cd0) = (dec0 * RADEG).sin_cos();
    let (sd, cd) = (dec * RADEG).sin_cos();
    let (sdra, cdra) = ((ra - ra0) * RADEG).sin_cos();

    let cos_c = sd0 * sd + cd0 * cd * cdra;
    if cos_c <= 0.0 {
        return None;
    }

    let xi = cd * sdra / cos_c;
    let eta = (cd0 * sd - sd0 * cd * cdra) / cos_c;
    Some((xi / RADEG, eta / RADEG))
}

impl Footprint {
    pub fn new(half_width: Degree, half_height: Degree) -> Self {
        Footprint {
            half_width,
            half_height,
        }
    }

    /// Whether a sky position falls inside the footprint of `field`.
    pub fn contains(&self, field: &Field, ra: Degree, dec: Degree) -> bool {
        gnomonic(field.ra, field.dec, ra, dec)
            .is_some_and(|(xi, eta)| xi.abs() <= self.half_width && eta.abs() <= self.half_height)
    }

    /// Fraction of a sky region covered by the footprint of `field`.
    ///
    /// The region is sampled on an `n × n` grid of cell centres, each sample weighted by
    /// `cos(dec)` so that the result approximates a solid-angle fraction.
    ///
    /// Arguments
    /// ---------
    /// * `field`: the candidate field.
    /// * `region`: the target error region.
    /// * `n`: samples per axis (at least 1).
    ///
    /// Return
    /// ------
    /// * A coverage in [0, 1].
    pub fn coverage(&self, field: &Field, region: &SkyRegion, n: usize) -> f64 {
        let n = n.max(1);
        let ra_span = region.ra_span();
        let dec_span = region.dec_max - region.dec_min;

        let mut covered = 0.0;
        let mut total = 0.0;
        for j in 0..n {
            let dec = region.dec_min + (j as f64 + 0.5) / n as f64 * dec_span;
            let weight = (dec * RADEG).cos();
            for i in 0..n {
                let ra = (region.ra_min + (i as f64 + 0.5) / n as f64 * ra_span).rem_euclid(360.0);
                total += weight;
                if self.contains(field, ra, dec) {
                    covered += weight;
                }
            }
        }

        if total > 0.0 {
            covered / total
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod footprint_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn field(id: u32, ra: f64, dec: f64) -> Field {
        Field {
            id,
            ra,
            dec,
            ebv: None,
            galactic_longitude: None,
            galactic_latitude: None,
        }
    }

    #[test]
    fn test_gnomonic_centre_and_axes() {
        assert_eq!(gnomonic(10.0, 20.0, 10.0, 20.0), Some((0.0, 0.0)));

        let (xi, eta) = gnomonic(10.0, 0.0, 12.0, 0.0).unwrap();
        assert_abs_diff_eq!(xi, (2.0 * RADEG).tan() / RADEG, epsilon = 1e-12);
        assert_abs_diff_eq!(eta, 0.0, epsilon = 1e-12);

        let (xi, eta) = gnomonic(10.0, 0.0, 10.0, 3.0).unwrap();
        assert_abs_diff_eq!(xi, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(eta, (3.0 * RADEG).tan() / RADEG, epsilon = 1e-12);

        assert_eq!(gnomonic(0.0, 0.0, 180.0, 0.0), None);
    }

    #[test]
    fn test_contains() {
        let footprint = Footprint::default();
        let f = field(593, 310.8, 19.75);
        assert!(footprint.contains(&f, 310.8, 19.75));
        assert!(footprint.contains(&f, 311.57, 18.68));
        assert!(!footprint.contains(&f, 310.8, 23.5));
        // 3.5° of tangent-plane width spans more than 3.5° of RA away from the equator
        assert!(footprint.contains(&f, 310.8 + 3.6, 19.75));
        assert!(!footprint.contains(&f, 310.8 + 4.0, 19.75));
    }

    #[test]
    fn test_contains_across_ra_zero() {
        let footprint = Footprint::default();
        let f = field(245, 358.0, -2.5);
        assert!(footprint.contains(&f, 1.0, -2.5));
        assert!(!footprint.contains(&f, 2.0, -2.5));
    }

    #[test]
    fn test_coverage() {
        let footprint = Footprint::default();
        let f = field(720, 224.3, 41.35);

        let inside = SkyRegion {
            ra_min: 222.88,
            ra_max: 225.07,
            dec_min: 40.21,
            dec_max: 41.89,
        };
        assert_abs_diff_eq!(footprint.coverage(&f, &inside, 40), 1.0);

        // Upper half of the region sits above the footprint
        let straddling = SkyRegion {
            ra_min: 223.0,
            ra_max: 225.0,
            dec_min: 41.35 + 1.5,
            dec_max: 41.35 + 5.5,
        };
        let coverage = footprint.coverage(&f, &straddling, 40);
        assert!(coverage > 0.4 && coverage < 0.6, "coverage = {coverage}");

        let outside = SkyRegion {
            ra_min: 100.0,
            ra_max: 101.0,
            dec_min: 0.0,
            dec_max: 1.0,
        };
        assert_eq!(footprint.coverage(&f, &outside, 40), 0.0);
    }
}
