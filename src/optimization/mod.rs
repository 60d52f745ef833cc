//! Pose optimization for molecular docking.

pub mod bfgs;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub use bfgs::bfgs;

/// A scored binding pose with world coordinates for every atom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pose {
    /// Predicted total free energy in kcal/mol.
    pub energy: f64,

    /// Heavy-atom world coordinates, in input order.
    pub heavy_atoms: Vec<Vector3<f64>>,

    /// Hydrogen world coordinates, in input order.
    pub hydrogens: Vec<Vector3<f64>>,
}

/// Parameters for the Monte-Carlo-wrapped BFGS optimizer.
#[derive(Debug, Clone)]
pub struct OptimizerParams {
    /// Number of outer perturb-and-relax generations.
    pub num_generations: usize,

    /// Number of step sizes tried by the line search before the inner
    /// loop gives up.
    pub num_alphas: usize,

    /// Per-heavy-atom energy bound; a conformation whose energy reaches
    /// `bound * num_heavy_atoms` is rejected outright.
    pub e_upper_bound_per_atom: f64,
}

impl Default for OptimizerParams {
    fn default() -> Self {
        Self {
            num_generations: 100,
            num_alphas: 5,
            e_upper_bound_per_atom: 40.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_serialization() {
        let pose = Pose {
            energy: -7.25,
            heavy_atoms: vec![Vector3::new(1.0, 2.0, 3.0)],
            hydrogens: vec![Vector3::new(0.5, -0.5, 0.0)],
        };
        let json = serde_json::to_string(&pose).unwrap();
        let back: Pose = serde_json::from_str(&json).unwrap();
        assert_eq!(pose.energy, back.energy);
        assert_eq!(pose.heavy_atoms, back.heavy_atoms);
        assert_eq!(pose.hydrogens, back.hydrogens);
    }
}
