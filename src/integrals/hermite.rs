//! McMurchie--Davidson Hermite expansion coefficients and Hermite Coulomb integrals.
//!
//! The product of two one-dimensional Cartesian Gaussians is expanded in Hermite Gaussians
//! $`\Lambda_t`$ centred at $`P`$,
//!
//! ```math
//! G_i(x; \alpha, A) G_j(x; \beta, B) = \sum_{t=0}^{i+j} E^{ij}_t \Lambda_t(x; \gamma, P),
//! ```
//!
//! with the coefficients obtained by upward recurrence from $`E^{00}_0 = K_x`$:
//!
//! ```math
//! E^{i+1,j}_t = \frac{1}{2\gamma} E^{ij}_{t-1} + X_{PA} E^{ij}_t + (t+1) E^{ij}_{t+1}, \qquad
//! E^{i,j+1}_t = \frac{1}{2\gamma} E^{ij}_{t-1} + X_{PB} E^{ij}_t + (t+1) E^{ij}_{t+1}.
//! ```
//!
//! See Helgaker, T., Jørgensen, P. & Olsen, J. *Molecular Electronic-Structure Theory*
//! (Wiley, 2000), Chapter 9.

use anyhow::{self, ensure};
use nalgebra::Vector3;
use ndarray::Array3;

use crate::errors::IntegralError;
use crate::integrals::primitive_pair::PrimitivePair;

#[cfg(test)]
#[path = "hermite_tests.rs"]
mod hermite_tests;

// ------------------
// HermiteExpansion1D
// ------------------

/// Hermite expansion coefficients $`E^{ij}_t`$ for one Cartesian direction of a primitive pair.
#[derive(Clone, Debug)]
pub struct HermiteExpansion1D {
    /// Coefficients indexed by $`(i, j, t)`$. The $`t`$ axis carries one extra zero entry so that
    /// $`E^{ij}_{t+1}`$ is always addressable.
    coefficients: Array3<f64>,
}

impl HermiteExpansion1D {
    /// Builds $`E^{ij}_t`$ for all $`0 \le i \le`$ `max_i`, $`0 \le j \le`$ `max_j`.
    ///
    /// # Arguments
    ///
    /// * `pair` - The primitive pair.
    /// * `axis` - The Cartesian direction (`0`, `1` or `2`).
    /// * `max_i` - The largest bra index required.
    /// * `max_j` - The largest ket index required.
    pub fn new(pair: &PrimitivePair, axis: usize, max_i: usize, max_j: usize) -> Self {
        let one_over_2gamma = 0.5 / pair.gamma;
        let xpa = pair.pa[axis];
        let xpb = pair.pb[axis];
        let mut e = Array3::<f64>::zeros((max_i + 1, max_j + 1, max_i + max_j + 2));
        e[(0, 0, 0)] = pair.k_axis(axis);
        for i in 0..=max_i {
            if i > 0 {
                for t in 0..=i {
                    let lower = if t > 0 { e[(i - 1, 0, t - 1)] } else { 0.0 };
                    e[(i, 0, t)] = one_over_2gamma * lower
                        + xpa * e[(i - 1, 0, t)]
                        + (t + 1) as f64 * e[(i - 1, 0, t + 1)];
                }
            }
            for j in 1..=max_j {
                for t in 0..=(i + j) {
                    let lower = if t > 0 { e[(i, j - 1, t - 1)] } else { 0.0 };
                    e[(i, j, t)] = one_over_2gamma * lower
                        + xpb * e[(i, j - 1, t)]
                        + (t + 1) as f64 * e[(i, j - 1, t + 1)];
                }
            }
        }
        Self { coefficients: e }
    }

    /// Returns $`E^{ij}_t`$, which vanishes for $`t > i + j`$.
    #[inline]
    pub fn get(&self, i: usize, j: usize, t: usize) -> f64 {
        if t > i + j {
            0.0
        } else {
            self.coefficients[(i, j, t)]
        }
    }

    /// The largest bra index available.
    pub fn max_i(&self) -> usize {
        self.coefficients.shape()[0] - 1
    }

    /// The largest ket index available.
    pub fn max_j(&self) -> usize {
        self.coefficients.shape()[1] - 1
    }
}

// ----------------
// HermiteExpansion
// ----------------

/// Hermite expansion coefficients for all three Cartesian directions of a primitive pair,
/// together with the one-dimensional overlaps $`S_{ij} = E^{ij}_0\sqrt{\pi/\gamma}`$.
#[derive(Clone, Debug)]
pub struct HermiteExpansion {
    /// The primitive pair being expanded.
    pub pair: PrimitivePair,

    /// One expansion per Cartesian direction.
    pub axes: [HermiteExpansion1D; 3],
}

impl HermiteExpansion {
    /// Builds the expansions of `pair` up to `max_i` in the bra and `max_j` in the ket along
    /// every direction.
    pub fn new(pair: PrimitivePair, max_i: usize, max_j: usize) -> Self {
        let axes = [
            HermiteExpansion1D::new(&pair, 0, max_i, max_j),
            HermiteExpansion1D::new(&pair, 1, max_i, max_j),
            HermiteExpansion1D::new(&pair, 2, max_i, max_j),
        ];
        Self { pair, axes }
    }

    /// The one-dimensional overlap $`S_{ij}`$ along `axis`, including $`K_x`$.
    #[inline]
    pub fn overlap_1d(&self, axis: usize, i: usize, j: usize) -> f64 {
        self.axes[axis].get(i, j, 0) * (std::f64::consts::PI / self.pair.gamma).sqrt()
    }
}

// --------------
// HermiteCoulomb
// --------------

/// Hermite Coulomb integrals $`R_{tuv} = R^0_{tuv}(a, \mathbf{R}_{PC})`$ for
/// $`t + u + v \le L`$, obtained from
///
/// ```math
/// R^n_{000} = (-2a)^n F_n(a R_{PC}^2),\qquad
/// R^n_{t+1,u,v} = t R^{n+1}_{t-1,u,v} + X_{PC} R^{n+1}_{tuv},
/// ```
///
/// and likewise along $`u`$ and $`v`$.
#[derive(Clone, Debug)]
pub struct HermiteCoulomb {
    values: Array3<f64>,
    l_total: usize,
}

impl HermiteCoulomb {
    /// Builds all $`R_{tuv}`$ with $`t + u + v \le`$ `l_total`.
    ///
    /// # Arguments
    ///
    /// * `l_total` - The largest total Hermite order required.
    /// * `a` - The exponent entering the Boys argument ($`\gamma`$ for nuclear attraction,
    /// $`pq/(p+q)`$ for electron repulsion).
    /// * `rpc` - The vector $`\mathbf{P} - \mathbf{C}`$.
    /// * `boys` - $`F_n(a R_{PC}^2)`$ for $`0 \le n \le`$ `l_total`.
    ///
    /// # Errors
    ///
    /// Errors if fewer Boys values are supplied than required.
    pub fn new(
        l_total: usize,
        a: f64,
        rpc: &Vector3<f64>,
        boys: &[f64],
    ) -> Result<Self, anyhow::Error> {
        ensure!(
            boys.len() > l_total,
            IntegralError::DimensionMismatch(format!(
                "{} Boys values supplied but orders up to {l_total} are required",
                boys.len()
            ))
        );
        let dim = l_total + 1;
        // `next` holds level n + 1 while level n is written into `current`. Level n only reads
        // entries with t + u + v <= l_total - n - 1, all of which level n + 1 has written.
        let mut current = Array3::<f64>::zeros((dim, dim, dim));
        let mut next = Array3::<f64>::zeros((dim, dim, dim));
        let minus_2a = -2.0 * a;
        for n in (0..=l_total).rev() {
            current[(0, 0, 0)] = minus_2a.powi(n as i32) * boys[n];
            let budget = l_total - n;
            for t in 0..=budget {
                for u in 0..=(budget - t) {
                    for v in 0..=(budget - t - u) {
                        if t + u + v == 0 {
                            continue;
                        }
                        current[(t, u, v)] = if t > 0 {
                            let lower = if t > 1 {
                                (t - 1) as f64 * next[(t - 2, u, v)]
                            } else {
                                0.0
                            };
                            lower + rpc[0] * next[(t - 1, u, v)]
                        } else if u > 0 {
                            let lower = if u > 1 {
                                (u - 1) as f64 * next[(t, u - 2, v)]
                            } else {
                                0.0
                            };
                            lower + rpc[1] * next[(t, u - 1, v)]
                        } else {
                            let lower = if v > 1 {
                                (v - 1) as f64 * next[(t, u, v - 2)]
                            } else {
                                0.0
                            };
                            lower + rpc[2] * next[(t, u, v - 1)]
                        };
                    }
                }
            }
            std::mem::swap(&mut current, &mut next);
        }
        let values = next;
        Ok(Self { values, l_total })
    }

    /// Returns $`R_{tuv}`$, or zero beyond the built range.
    #[inline]
    pub fn get(&self, t: usize, u: usize, v: usize) -> f64 {
        if t + u + v > self.l_total {
            0.0
        } else {
            self.values[(t, u, v)]
        }
    }
}
