//! Tabulated empirical pair potential.
//!
//! The five-term scoring function (two attractive gaussians, a quadratic
//! repulsion, a hydrophobic term, and a hydrogen-bond term) is precomputed
//! for every unordered pair of scored interaction types, sampled uniformly
//! in squared distance. The evaluator then scores an atom pair with a
//! single table lookup at `offset + floor(ns * r2)`.

use crate::atom::XsType;

/// Weights for each component of the scoring function.
#[derive(Debug, Clone)]
pub struct ScoringParams {
    pub weight_gauss1: f64,
    pub weight_gauss2: f64,
    pub weight_repulsion: f64,
    pub weight_hydrophobic: f64,
    pub weight_hbond: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            weight_gauss1: -0.035579,
            weight_gauss2: -0.005156,
            weight_repulsion: 0.840245,
            weight_hydrophobic: -0.035069,
            weight_hbond: -0.587439,
        }
    }
}

/// Precomputed energy and derivative tables over squared distance.
///
/// `e[o]` is the pair energy and `d[o]` is `(dU/dr) / r`, so multiplying
/// `d[o]` by the separation vector yields the force on the pair directly.
#[derive(Debug, Clone)]
pub struct ScoringFunction {
    pub params: ScoringParams,
    pub e: Vec<f64>,
    pub d: Vec<f64>,
}

impl ScoringFunction {
    /// Interaction cutoff in Angstroms.
    pub const CUTOFF: f64 = 8.0;

    /// Squared interaction cutoff.
    pub const CUTOFF_SQR: f64 = Self::CUTOFF * Self::CUTOFF;

    /// Number of samples per unit of squared distance.
    pub const NS: usize = 128;

    /// Number of samples per type pair, i.e. the stride between the table
    /// blocks of consecutive pairs. The extra sample guards the lookup at
    /// `r2` just below the cutoff.
    pub const NR: usize = Self::NS * Self::CUTOFF_SQR as usize + 1;

    /// Number of unordered pairs of scored types.
    pub const NUM_PAIRS: usize = XsType::NUM_SCORED * (XsType::NUM_SCORED + 1) / 2;

    /// Canonical index of an unordered type pair.
    pub fn pair_index(t1: XsType, t2: XsType) -> usize {
        let (a, b) = if t1.index() <= t2.index() {
            (t1.index(), t2.index())
        } else {
            (t2.index(), t1.index())
        };
        debug_assert!(b < XsType::NUM_SCORED);
        a + b * (b + 1) / 2
    }

    /// Base offset of a type pair's table block.
    pub fn offset(t1: XsType, t2: XsType) -> usize {
        Self::NR * Self::pair_index(t1, t2)
    }

    /// Precomputes the tables for all scored type pairs.
    pub fn new() -> Self {
        Self::with_params(ScoringParams::default())
    }

    pub fn with_params(params: ScoringParams) -> Self {
        let mut e = vec![0.0; Self::NUM_PAIRS * Self::NR];
        let mut d = vec![0.0; Self::NUM_PAIRS * Self::NR];
        for (bi, &t1) in XsType::SCORED.iter().enumerate() {
            for &t2 in &XsType::SCORED[..=bi] {
                let o = Self::offset(t1, t2);
                for s in 0..Self::NR {
                    let r2 = s as f64 / Self::NS as f64;
                    let r = r2.sqrt();
                    e[o + s] = score(&params, t1, t2, r);
                    d[o + s] = if r > 0.0 {
                        score_derivative(&params, t1, t2, r) / r
                    } else {
                        0.0
                    };
                }
            }
        }
        Self { params, e, d }
    }
}

impl Default for ScoringFunction {
    fn default() -> Self {
        Self::new()
    }
}

/// Continuous pair energy at distance `r`, before tabulation.
pub fn score(params: &ScoringParams, t1: XsType, t2: XsType, r: f64) -> f64 {
    let s = t1.vdw_radius() + t2.vdw_radius();
    let delta = r - s;

    let mut e = params.weight_gauss1 * (-4.0 * delta * delta).exp();
    e += params.weight_gauss2 * (-0.25 * (delta - 3.0) * (delta - 3.0)).exp();
    if delta < 0.0 {
        e += params.weight_repulsion * delta * delta;
    }
    if t1.is_hydrophobic() && t2.is_hydrophobic() {
        e += params.weight_hydrophobic * slope(delta, 1.5, 0.5);
    }
    if (t1.is_donor() && t2.is_acceptor()) || (t2.is_donor() && t1.is_acceptor()) {
        e += params.weight_hbond * slope(delta, 0.0, -0.7);
    }
    e
}

/// Analytic derivative dU/dr of the continuous pair energy.
fn score_derivative(params: &ScoringParams, t1: XsType, t2: XsType, r: f64) -> f64 {
    let s = t1.vdw_radius() + t2.vdw_radius();
    let delta = r - s;

    let mut de = params.weight_gauss1 * (-4.0 * delta * delta).exp() * (-8.0 * delta);
    de += params.weight_gauss2
        * (-0.25 * (delta - 3.0) * (delta - 3.0)).exp()
        * (-0.5 * (delta - 3.0));
    if delta < 0.0 {
        de += params.weight_repulsion * 2.0 * delta;
    }
    if t1.is_hydrophobic() && t2.is_hydrophobic() && delta > 0.5 && delta < 1.5 {
        de += params.weight_hydrophobic * (-1.0);
    }
    if ((t1.is_donor() && t2.is_acceptor()) || (t2.is_donor() && t1.is_acceptor()))
        && delta > -0.7
        && delta < 0.0
    {
        de += params.weight_hbond * (-1.0 / 0.7);
    }
    de
}

/// Linear ramp: 1 below `one`, 0 above `zero`, interpolated between.
fn slope(x: f64, zero: f64, one: f64) -> f64 {
    debug_assert!(one < zero);
    if x <= one {
        1.0
    } else if x >= zero {
        0.0
    } else {
        (zero - x) / (zero - one)
    }
}
