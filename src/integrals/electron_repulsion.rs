//! Four-centre electron-repulsion integrals over contracted Gaussian shells.
//!
//! For primitive pairs $`P = (a, b)`$ and $`Q = (c, d)`$ with combined exponents $`p`$ and $`q`$,
//!
//! ```math
//! (ab|cd) = \frac{2\pi^{5/2}}{pq\sqrt{p+q}}
//!     \sum_{tuv} E^{ab}_{t}E^{ab}_{u}E^{ab}_{v}
//!     \sum_{\tau\nu\phi} (-1)^{\tau+\nu+\phi} E^{cd}_{\tau}E^{cd}_{\nu}E^{cd}_{\phi}
//!     R_{t+\tau,u+\nu,v+\phi}\Big(\frac{pq}{p+q}, \mathbf{P} - \mathbf{Q}\Big).
//! ```
//!
//! The inner sum over the ket is computed once per primitive quartet and reused for every bra
//! component.

use std::f64::consts::PI;
use std::fmt;

use anyhow::{self, ensure};
use itertools::Itertools;
use nalgebra::Vector3;
use ndarray::{s, Array1, Array4, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::angmom::spherical::cart_block_to_functions;
use crate::basis::basis_set::BasisSet;
use crate::basis::shell::Shell;
use crate::errors::IntegralError;
use crate::integrals::boys::boys_values;
use crate::integrals::hermite::{HermiteCoulomb, HermiteExpansion};
use crate::integrals::primitive_pair::PrimitivePair;

#[cfg(test)]
#[path = "electron_repulsion_tests.rs"]
mod electron_repulsion_tests;

/// Axis permutations relating a quartet $`(ij|kl)`$ to its seven equivalents under the
/// permutational symmetry of real two-electron integrals.
const QUARTET_PERMUTATIONS: [[usize; 4]; 8] = [
    [0, 1, 2, 3],
    [1, 0, 2, 3],
    [0, 1, 3, 2],
    [1, 0, 3, 2],
    [2, 3, 0, 1],
    [3, 2, 0, 1],
    [2, 3, 1, 0],
    [3, 2, 1, 0],
];

// -----------
// EriNotation
// -----------

/// The index convention of a four-index electron-repulsion tensor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EriNotation {
    /// Mulliken notation, $`(\mu\nu|\lambda\sigma)`$: the first two indices belong to electron 1.
    #[default]
    Chemist,

    /// Dirac notation, $`\langle\mu\nu|\lambda\sigma\rangle = (\mu\lambda|\nu\sigma)`$: the first
    /// and third indices belong to electron 1.
    Physicist,
}

impl fmt::Display for EriNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chemist => write!(f, "chemist's notation (μν|λσ)"),
            Self::Physicist => write!(f, "physicist's notation <μν|λσ>"),
        }
    }
}

// ------------------
// Public entry point
// ------------------

/// Evaluates the electron-repulsion tensor over all functions of `basis`.
///
/// Only the shell quartets $`(ij|kl)`$ with $`i \ge j`$, $`k \ge l`$ and $`ij \ge kl`$ are
/// evaluated; every other block is obtained by permuting the axes of a unique one.
///
/// # Arguments
///
/// * `basis` - The basis set.
/// * `notation` - The index convention of the returned tensor.
///
/// # Returns
///
/// A tensor of shape $`(n, n, n, n)`$.
///
/// # Errors
///
/// Errors if a Boys function or Hermite table cannot be evaluated.
pub fn electron_repulsion(
    basis: &BasisSet,
    notation: EriNotation,
) -> Result<Array4<f64>, anyhow::Error> {
    let quartets = unique_shell_quartets(basis.n_shells());
    log::debug!(
        "Evaluating {} unique shell quartets over {} shells.",
        quartets.len(),
        basis.n_shells()
    );
    let blocks = quartets
        .par_iter()
        .map(|&quartet| {
            let [i, j, k, l] = quartet;
            ShellQuartet::new([&basis[i], &basis[j], &basis[k], &basis[l]])
                .contracted_block()
                .map(|block| (quartet, block))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let n = basis.n_funcs();
    let bounds = basis.shell_boundaries();
    let mut eri = Array4::<f64>::zeros((n, n, n, n));
    for (quartet, block) in blocks {
        let expected = quartet.map(|shell| bounds[shell].1 - bounds[shell].0);
        ensure!(
            block.shape() == &expected[..],
            IntegralError::DimensionMismatch(format!(
                "block of shape {:?} for shell quartet {quartet:?} spanning {expected:?} functions",
                block.shape()
            ))
        );
        for perm in QUARTET_PERMUTATIONS
            .iter()
            .unique_by(|perm| perm.map(|axis| quartet[axis]))
        {
            let [a, b, c, d] = perm.map(|axis| bounds[quartet[axis]]);
            eri.slice_mut(s![a.0..a.1, b.0..b.1, c.0..c.1, d.0..d.1])
                .assign(&block.view().permuted_axes(*perm));
        }
    }

    Ok(match notation {
        EriNotation::Chemist => eri,
        EriNotation::Physicist => eri.permuted_axes([0, 2, 1, 3]).as_standard_layout().to_owned(),
    })
}

/// Enumerates the shell quartets $`[i, j, k, l]`$ with $`i \ge j`$, $`k \ge l`$ and
/// $`i(i+1)/2 + j \ge k(k+1)/2 + l`$.
fn unique_shell_quartets(n_shells: usize) -> Vec<[usize; 4]> {
    let pairs = (0..n_shells)
        .flat_map(|i| (0..=i).map(move |j| (i, j)))
        .collect::<Vec<_>>();
    pairs
        .iter()
        .enumerate()
        .flat_map(|(ij, &(i, j))| pairs[..=ij].iter().map(move |&(k, l)| [i, j, k, l]))
        .collect()
}

// ------------
// ShellQuartet
// ------------

/// Four shells whose repulsion block is to be evaluated.
struct ShellQuartet<'a> {
    shells: [&'a Shell; 4],
}

impl<'a> ShellQuartet<'a> {
    fn new(shells: [&'a Shell; 4]) -> Self {
        Self { shells }
    }

    /// The block in the shell functions, of shape $`(n_i, n_j, n_k, n_l)`$.
    fn contracted_block(&self) -> Result<Array4<f64>, anyhow::Error> {
        let [a, b, c, d] = self.shells;
        let mut contracted = Array4::<f64>::zeros((
            a.n_cart_funcs(),
            b.n_cart_funcs(),
            c.n_cart_funcs(),
            d.n_cart_funcs(),
        ));
        let mut prim = Array4::<f64>::zeros((a.n_cart(), b.n_cart(), c.n_cart(), d.n_cart()));
        let bra_pairs = primitive_pairs(a, b);
        let ket_pairs = primitive_pairs(c, d);
        for (ka, kb, bra) in bra_pairs.iter() {
            for (kc, kd, ket) in ket_pairs.iter() {
                self.primitive_block(bra, ket, &mut prim)?;
                accumulate_contracted(
                    &mut contracted,
                    &prim,
                    [
                        a.scaled_coefficients().row(*ka),
                        b.scaled_coefficients().row(*kb),
                        c.scaled_coefficients().row(*kc),
                        d.scaled_coefficients().row(*kd),
                    ],
                );
            }
        }
        cart_block_to_functions(
            contracted,
            &[a.conversion(), b.conversion(), c.conversion(), d.conversion()],
        )
    }

    /// Writes the integrals over the unnormalised Cartesian primitives of one primitive quartet
    /// into `prim`.
    fn primitive_block(
        &self,
        bra: &HermiteExpansion,
        ket: &HermiteExpansion,
        prim: &mut Array4<f64>,
    ) -> Result<(), anyhow::Error> {
        let [a, b, c, d] = self.shells;
        let l_bra = (a.l() + b.l()) as usize;
        let l_ket = (c.l() + d.l()) as usize;
        let l_total = l_bra + l_ket;

        let (p, q) = (bra.pair.gamma, ket.pair.gamma);
        let reduced = p * q / (p + q);
        let rpq: Vector3<f64> = bra.pair.p - ket.pair.p;
        let mut boys = vec![0.0; l_total + 1];
        boys_values(reduced * rpq.norm_squared(), &mut boys)?;
        let r = HermiteCoulomb::new(l_total, reduced, &rpq, &boys)?;
        let prefactor = 2.0 * PI.powf(2.5) / (p * q * (p + q).sqrt());

        let hermite_index = hermite_indices(l_bra);
        for (ic, cart_c) in c.cart_tuples().iter().enumerate() {
            let cc = cart_index(*cart_c);
            for (id, cart_d) in d.cart_tuples().iter().enumerate() {
                let dd = cart_index(*cart_d);
                // Ket intermediate, one entry per bra Hermite index (t, u, v).
                let w = hermite_index
                    .iter()
                    .map(|&[t, u, v]| {
                        let mut value = 0.0;
                        for tau in 0..=(cc[0] + dd[0]) {
                            let ex = ket.axes[0].get(cc[0], dd[0], tau);
                            for nu in 0..=(cc[1] + dd[1]) {
                                let exy = ex * ket.axes[1].get(cc[1], dd[1], nu);
                                for phi in 0..=(cc[2] + dd[2]) {
                                    let sign = if (tau + nu + phi) % 2 == 0 { 1.0 } else { -1.0 };
                                    value += sign
                                        * exy
                                        * ket.axes[2].get(cc[2], dd[2], phi)
                                        * r.get(t + tau, u + nu, v + phi);
                                }
                            }
                        }
                        value
                    })
                    .collect::<Array1<f64>>();

                for (ia, cart_a) in a.cart_tuples().iter().enumerate() {
                    let aa = cart_index(*cart_a);
                    for (ib, cart_b) in b.cart_tuples().iter().enumerate() {
                        let bb = cart_index(*cart_b);
                        let value = hermite_index
                            .iter()
                            .zip(w.iter())
                            .map(|(&[t, u, v], w_tuv)| {
                                bra.axes[0].get(aa[0], bb[0], t)
                                    * bra.axes[1].get(aa[1], bb[1], u)
                                    * bra.axes[2].get(aa[2], bb[2], v)
                                    * w_tuv
                            })
                            .sum::<f64>();
                        prim[(ia, ib, ic, id)] = prefactor * value;
                    }
                }
            }
        }
        Ok(())
    }
}

/// The Hermite expansions of all primitive pairs of two shells, with the primitive indices.
fn primitive_pairs(a: &Shell, b: &Shell) -> Vec<(usize, usize, HermiteExpansion)> {
    a.exponents()
        .iter()
        .enumerate()
        .cartesian_product(b.exponents().iter().enumerate())
        .map(|((ka, alpha), (kb, beta))| {
            let pair = PrimitivePair::new(*alpha, a.centre(), *beta, b.centre());
            (
                ka,
                kb,
                HermiteExpansion::new(pair, a.l() as usize, b.l() as usize),
            )
        })
        .collect()
}

/// All Hermite indices $`(t, u, v)`$ with $`t + u + v \le`$ `l`.
fn hermite_indices(l: usize) -> Vec<[usize; 3]> {
    (0..=l)
        .flat_map(|t| (0..=(l - t)).flat_map(move |u| (0..=(l - t - u)).map(move |v| [t, u, v])))
        .collect()
}

#[inline]
fn cart_index((lx, ly, lz): (u32, u32, u32)) -> [usize; 3] {
    [lx as usize, ly as usize, lz as usize]
}

/// Adds the primitive block weighted by the scaled coefficients of the four primitives to every
/// contracted Cartesian entry.
fn accumulate_contracted(
    contracted: &mut Array4<f64>,
    prim: &Array4<f64>,
    coeffs: [ArrayView1<f64>; 4],
) {
    let (nca, ncb, ncc, ncd) = prim.dim();
    let [da, db, dc, dd] = coeffs;
    for (ia, wa) in da.iter().enumerate() {
        if *wa == 0.0 {
            continue;
        }
        for (ib, wb) in db.iter().enumerate() {
            let wab = wa * wb;
            if wab == 0.0 {
                continue;
            }
            for (ic, wc) in dc.iter().enumerate() {
                let wabc = wab * wc;
                if wabc == 0.0 {
                    continue;
                }
                for (id, wd) in dd.iter().enumerate() {
                    contracted[(ia, ib, ic, id)] +=
                        wabc * wd * prim[(ia % nca, ib % ncb, ic % ncc, id % ncd)];
                }
            }
        }
    }
}
