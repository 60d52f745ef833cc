//! Receptor energy grids.
//!
//! The rigid receptor appears only through precomputed per-type grid maps
//! over a regular probe lattice. Map population sums the tabulated pair
//! potential between every receptor atom within cutoff and the probe type
//! at each lattice point.

use nalgebra::Vector3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::atom::{Atom, XsType};
use crate::scoring::ScoringFunction;

/// Errors that can occur when constructing a receptor box.
#[derive(Error, Debug)]
pub enum ReceptorError {
    #[error("Invalid box size: {0:?}")]
    InvalidSize(Vector3<f64>),

    #[error("Invalid granularity: {0}")]
    InvalidGranularity(f64),
}

/// The receptor's search box and its per-type energy maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receptor {
    /// Center of the search box in Angstroms.
    pub center: Vector3<f64>,

    /// Edge lengths of the search box in Angstroms.
    pub size: Vector3<f64>,

    /// Minimum corner of the box.
    pub corner0: Vector3<f64>,

    /// Maximum corner of the box.
    pub corner1: Vector3<f64>,

    /// Probe lattice spacing in Angstroms.
    pub granularity: f64,

    /// Reciprocal of the lattice spacing.
    pub granularity_inverse: f64,

    /// Number of probe points along each axis. Sized so that the lookup at
    /// `index + 1` stays in bounds for any point inside the box.
    pub num_probes: [usize; 3],

    /// Energy maps indexed by scored XS type. A map is empty until
    /// `populate` fills it.
    pub maps: Vec<Vec<f64>>,
}

impl Receptor {
    pub fn new(
        center: Vector3<f64>,
        size: Vector3<f64>,
        granularity: f64,
    ) -> Result<Self, ReceptorError> {
        if size.iter().any(|&s| s <= 0.0) {
            return Err(ReceptorError::InvalidSize(size));
        }
        if granularity <= 0.0 {
            return Err(ReceptorError::InvalidGranularity(granularity));
        }

        let granularity_inverse = 1.0 / granularity;
        let corner0 = center - size * 0.5;
        let corner1 = center + size * 0.5;
        let mut num_probes = [0usize; 3];
        for i in 0..3 {
            num_probes[i] = (size[i] * granularity_inverse).floor() as usize + 2;
        }

        Ok(Self {
            center,
            size,
            corner0,
            corner1,
            granularity,
            granularity_inverse,
            num_probes,
            maps: vec![Vec::new(); XsType::NUM_SCORED],
        })
    }

    /// Whether a point lies inside the search box.
    pub fn within(&self, p: &Vector3<f64>) -> bool {
        (0..3).all(|i| self.corner0[i] <= p[i] && p[i] < self.corner1[i])
    }

    /// Lattice index of the cell containing a point inside the box.
    pub fn coordinate_to_index(&self, p: &Vector3<f64>) -> [usize; 3] {
        debug_assert!(self.within(p));
        let mut index = [0usize; 3];
        for i in 0..3 {
            index[i] = ((p[i] - self.corner0[i]) * self.granularity_inverse) as usize;
        }
        index
    }

    /// Flat offset of a lattice index into a map.
    pub fn map_index(&self, index: [usize; 3]) -> usize {
        index[0] + self.num_probes[0] * (index[1] + self.num_probes[1] * index[2])
    }

    /// World coordinate of a lattice point.
    pub fn probe_coordinate(&self, index: [usize; 3]) -> Vector3<f64> {
        Vector3::new(
            self.corner0.x + self.granularity * index[0] as f64,
            self.corner0.y + self.granularity * index[1] as f64,
            self.corner0.z + self.granularity * index[2] as f64,
        )
    }

    /// Total number of lattice points per map.
    pub fn map_len(&self) -> usize {
        self.num_probes[0] * self.num_probes[1] * self.num_probes[2]
    }

    /// Fills the energy maps for the requested probe types by summing the
    /// tabulated pair potential over all receptor atoms within cutoff of
    /// each lattice point. Already populated maps are left untouched.
    /// Lattice slices along z are filled in parallel.
    pub fn populate(&mut self, sf: &ScoringFunction, atoms: &[Atom], xs_types: &[XsType]) {
        let slice_len = self.num_probes[0] * self.num_probes[1];
        let map_len = self.map_len();
        let (n0, n1) = (self.num_probes[0], self.num_probes[1]);
        let granularity = self.granularity;
        let corner0 = self.corner0;

        for &xs in xs_types {
            if !self.maps[xs.index()].is_empty() {
                continue;
            }
            let mut map = vec![0.0; map_len];
            map.par_chunks_mut(slice_len)
                .enumerate()
                .for_each(|(iz, slice)| {
                    let z = corner0.z + granularity * iz as f64;
                    for iy in 0..n1 {
                        let y = corner0.y + granularity * iy as f64;
                        for ix in 0..n0 {
                            let probe = Vector3::new(corner0.x + granularity * ix as f64, y, z);
                            let mut e = 0.0;
                            for a in atoms {
                                let r2 = (a.coord - probe).norm_squared();
                                if r2 < ScoringFunction::CUTOFF_SQR {
                                    let o = ScoringFunction::offset(a.xs, xs)
                                        + (ScoringFunction::NS as f64 * r2) as usize;
                                    e += sf.e[o];
                                }
                            }
                            slice[ix + n0 * iy] = e;
                        }
                    }
                });
            self.maps[xs.index()] = map;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::AdType;

    fn small_receptor() -> Receptor {
        Receptor::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(10.0, 8.0, 6.0),
            0.5,
        )
        .expect("valid box")
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(Receptor::new(Vector3::zeros(), Vector3::new(0.0, 1.0, 1.0), 0.5).is_err());
        assert!(Receptor::new(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0), 0.0).is_err());
    }

    #[test]
    fn test_within_bounds() {
        let rec = small_receptor();
        assert!(rec.within(&rec.center));
        assert!(rec.within(&rec.corner0));
        assert!(!rec.within(&rec.corner1));
        assert!(!rec.within(&Vector3::new(100.0, 0.0, 0.0)));
    }

    #[test]
    fn test_forward_difference_lookup_in_bounds() {
        let rec = small_receptor();
        // For any point inside the box, the neighbor probes used by the
        // forward difference stay on the lattice.
        let just_inside = rec.corner1 - Vector3::new(1e-9, 1e-9, 1e-9);
        let index = rec.coordinate_to_index(&just_inside);
        for i in 0..3 {
            assert!(index[i] + 1 < rec.num_probes[i]);
        }
        let o = rec.map_index([index[0] + 1, index[1] + 1, index[2] + 1]);
        assert!(o < rec.map_len());
    }

    #[test]
    fn test_coordinate_index_round_trip() {
        let rec = small_receptor();
        let p = Vector3::new(0.3, -0.4, 2.2);
        let index = rec.coordinate_to_index(&p);
        let probe = rec.probe_coordinate(index);
        // The probe is the lower corner of the cell containing p.
        for i in 0..3 {
            assert!(probe[i] <= p[i]);
            assert!(p[i] - probe[i] < rec.granularity);
        }
    }

    #[test]
    fn test_populate_sums_pair_potential() {
        let sf = ScoringFunction::new();
        let mut rec = Receptor::new(Vector3::zeros(), Vector3::new(6.0, 6.0, 6.0), 1.0)
            .expect("valid box");
        let atom = Atom::new(1, Vector3::new(0.25, 0.25, 0.25), AdType::Carbon);
        rec.populate(&sf, &[atom.clone()], &[XsType::CarbonHydrophobic]);

        let map = &rec.maps[XsType::CarbonHydrophobic.index()];
        assert_eq!(map.len(), rec.map_len());

        let index = rec.coordinate_to_index(&Vector3::zeros());
        let probe = rec.probe_coordinate(index);
        let r2 = (atom.coord - probe).norm_squared();
        let o = ScoringFunction::offset(atom.xs, XsType::CarbonHydrophobic)
            + (ScoringFunction::NS as f64 * r2) as usize;
        assert!((map[rec.map_index(index)] - sf.e[o]).abs() < 1e-12);
    }

    #[test]
    fn test_populate_skips_existing_maps() {
        let sf = ScoringFunction::new();
        let mut rec = Receptor::new(Vector3::zeros(), Vector3::new(4.0, 4.0, 4.0), 1.0)
            .expect("valid box");
        rec.maps[XsType::CarbonHydrophobic.index()] = vec![7.0; rec.map_len()];
        rec.populate(&sf, &[], &[XsType::CarbonHydrophobic]);
        assert!(rec.maps[XsType::CarbonHydrophobic.index()]
            .iter()
            .all(|&e| e == 7.0));
    }
}
