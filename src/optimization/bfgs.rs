//! Monte-Carlo-wrapped quasi-Newton local optimization.
//!
//! Each generation perturbs the best conformation seen so far and relaxes
//! it with a BFGS inner loop: a backtracking line search under the Armijo
//! and curvature conditions, followed by the rank-two update of a packed
//! upper-triangular approximation of the inverse Hessian. Only downhill
//! generations are accepted, so the retained energy is non-increasing.

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ligand::Ligand;
use crate::math;
use crate::optimization::{OptimizerParams, Pose};
use crate::receptor::Receptor;
use crate::scoring::ScoringFunction;

/// Index into the packed upper triangle of an n-by-n symmetric matrix,
/// valid for i <= j.
fn mr(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i <= j && j < n);
    j + i * (2 * n - i - 1) / 2
}

/// Symmetric accessor over the packed upper triangle.
fn mp(n: usize, i: usize, j: usize) -> usize {
    if i <= j {
        mr(n, i, j)
    } else {
        mr(n, j, i)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Runs the seeded optimization and returns the best pose observed.
///
/// The ligand, scoring function, and receptor are shared immutably; all
/// working state lives on this call's stack, so independent seeds can run
/// concurrently without coordination. The same seed reproduces the same
/// pose bit for bit.
pub fn bfgs(
    ligand: &Ligand,
    sf: &ScoringFunction,
    rec: &Receptor,
    seed: u64,
    params: &OptimizerParams,
) -> Pose {
    let nv = 6 + ligand.num_active_torsions;
    let nx = 7 + ligand.num_active_torsions;
    let e_upper_bound = params.e_upper_bound_per_atom * ligand.num_heavy_atoms as f64;

    let mut x0 = vec![0.0; nx];
    let mut x1 = vec![0.0; nx];
    let mut x2 = vec![0.0; nx];
    let mut g0 = vec![0.0; nv];
    let mut g1 = vec![0.0; nv];
    let mut g2 = vec![0.0; nv];
    let mut p = vec![0.0; nv];
    let mut y = vec![0.0; nv];
    let mut mhy = vec![0.0; nv];
    let mut h = vec![0.0; nv * (nv + 1) / 2];

    let mut rng = StdRng::seed_from_u64(seed);
    let mut uniform = || rng.gen_range(-1.0..=1.0);

    // Random initial conformation: position in the center +- size box,
    // orientation uniform on the unit 3-sphere, torsions in [-1, 1].
    x0[0] = rec.center[0] + uniform() * rec.size[0];
    x0[1] = rec.center[1] + uniform() * rec.size[1];
    x0[2] = rec.center[2] + uniform() * rec.size[2];
    let orientation = math::normalize4([uniform(), uniform(), uniform(), uniform()]);
    x0[3..7].copy_from_slice(&orientation);
    for i in 0..ligand.num_active_torsions {
        x0[7 + i] = uniform();
    }

    let mut e0 = 0.0;
    ligand.evaluate(&x0, sf, rec, e_upper_bound, &mut e0, &mut g0);
    let mut best = ligand.compose_result(e0, &x0);

    for _ in 0..params.num_generations {
        // Perturb the retained conformation's position.
        x1.copy_from_slice(&x0);
        x1[0] += uniform();
        x1[1] += uniform();
        x1[2] += uniform();
        let mut e1 = 0.0;
        ligand.evaluate(&x1, sf, rec, e_upper_bound, &mut e1, &mut g1);

        // Start each BFGS run from the identity inverse Hessian.
        h.fill(0.0);
        for i in 0..nv {
            h[mr(nv, i, i)] = 1.0;
        }

        // The inner loop runs until the line search fails to find an
        // acceptable step.
        loop {
            // Descent direction p = -H g.
            for i in 0..nv {
                let mut sum = 0.0;
                for j in 0..nv {
                    sum += h[mp(nv, i, j)] * g1[j];
                }
                p[i] = -sum;
            }
            let pg1 = dot(&p, &g1);

            // Backtracking line search under the Armijo bound, with the
            // curvature condition checked on accepted trials.
            let mut alpha = 1.0;
            let mut e2 = 0.0;
            let mut found = false;
            for _ in 0..params.num_alphas {
                x2[0] = x1[0] + alpha * p[0];
                x2[1] = x1[1] + alpha * p[1];
                x2[2] = x1[2] + alpha * p[2];
                let q1 = math::quat_from_wxyz(x1[3], x1[4], x1[5], x1[6]);
                let rotation = Vector3::new(p[3], p[4], p[5]) * alpha;
                let q2 = math::rotation_vector_to_quat(&rotation) * q1;
                x2[3..7].copy_from_slice(&math::quat_wxyz(&q2));
                for i in 0..ligand.num_active_torsions {
                    x2[7 + i] = x1[7 + i] + alpha * p[6 + i];
                }

                if ligand.evaluate(&x2, sf, rec, e1 + 0.0001 * alpha * pg1, &mut e2, &mut g2) {
                    let pg2 = dot(&p, &g2);
                    if pg2 >= 0.9 * pg1 {
                        found = true;
                        break;
                    }
                }
                alpha *= 0.1;
            }
            if !found {
                break;
            }

            // Rank-two update of the packed inverse Hessian.
            for i in 0..nv {
                y[i] = g2[i] - g1[i];
            }
            for i in 0..nv {
                let mut sum = 0.0;
                for j in 0..nv {
                    sum += h[mp(nv, i, j)] * y[j];
                }
                mhy[i] = -sum;
            }
            let yhy = -dot(&y, &mhy);
            let yp = dot(&y, &p);
            let ryp = 1.0 / yp;
            let pco = ryp * (ryp * yhy + alpha);
            for i in 0..nv {
                for j in i..nv {
                    h[mr(nv, i, j)] += ryp * (mhy[i] * p[j] + mhy[j] * p[i]) + pco * p[i] * p[j];
                }
            }

            x1.copy_from_slice(&x2);
            e1 = e2;
            g1.copy_from_slice(&g2);
        }

        // Accept only downhill moves.
        if e1 < e0 {
            best = ligand.compose_result(e1, &x1);
            x0.copy_from_slice(&x1);
            e0 = e1;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangular_indexing_covers_matrix() {
        let n = 9;
        let mut seen = vec![0usize; n * (n + 1) / 2];
        for i in 0..n {
            for j in i..n {
                seen[mr(n, i, j)] += 1;
            }
        }
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn test_symmetric_accessor() {
        let n = 7;
        for i in 0..n {
            for j in 0..n {
                assert_eq!(mp(n, i, j), mp(n, j, i));
            }
        }
    }

    #[test]
    fn test_dot() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, -5.0, 6.0]), 12.0);
    }
}
