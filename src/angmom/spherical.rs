//! Process-wide Cartesian-to-real-solid-harmonic matrices and their application to integral
//! blocks.

use std::sync::OnceLock;

use anyhow::{self, ensure, format_err};
use lazy_static::lazy_static;
use ndarray::{s, Array, Array2, ArrayBase, Axis, Data, Dimension, Zip};

use crate::angmom::sh_conversion::sh_rl2cart_mat;
use crate::angmom::MAX_ANGMOM;
use crate::basis::ao::{BasisShell, CartOrder, PureOrder, ShellOrder};
use crate::errors::IntegralError;

#[cfg(test)]
#[path = "spherical_tests.rs"]
mod spherical_tests;

lazy_static! {
    /// One slot per angular momentum, each filled at most once on first use.
    static ref SOLID_HARMONIC_MATRICES: Vec<OnceLock<Array2<f64>>> =
        (0..=MAX_ANGMOM).map(|_| OnceLock::new()).collect();
}

/// Returns the shared matrix $`\mathbf{W}^{(l,l)}`$ with Cartesian rows in lexicographic order
/// and real solid harmonic columns in increasing-$`m`$ order, using the Condon--Shortley phase.
///
/// The matrix is computed on the first request for `l` and shared immutably afterwards.
/// Concurrent first requests may compute it more than once, but exactly one value is ever stored.
///
/// # Errors
///
/// Errors with [`IntegralError::UnsupportedAngularMomentum`] if `l` exceeds [`MAX_ANGMOM`].
pub fn solid_harmonic_matrix(l: u32) -> Result<&'static Array2<f64>, anyhow::Error> {
    let slot = SOLID_HARMONIC_MATRICES
        .get(l as usize)
        .ok_or(IntegralError::UnsupportedAngularMomentum(l))?;
    if let Some(wmat) = slot.get() {
        return Ok(wmat);
    }
    let wmat = sh_rl2cart_mat(l, l, &CartOrder::lex(l), true, &PureOrder::increasingm(l))?;
    // A racing thread may have won; its value is identical.
    let _ = slot.set(wmat);
    slot.get()
        .ok_or_else(|| format_err!("Solid harmonic matrix for l = {l} was not stored."))
}

/// Returns $`\mathbf{W}^{(l,l)}`$ with its rows arranged in `cartorder` and its columns in
/// `pureorder`.
pub fn solid_harmonic_matrix_ordered(
    cartorder: &CartOrder,
    pureorder: &PureOrder,
) -> Result<Array2<f64>, anyhow::Error> {
    ensure!(
        cartorder.lcart == pureorder.lpure,
        "Mismatched Cartesian rank {} and pure rank {}.",
        cartorder.lcart,
        pureorder.lpure
    );
    let wmat = solid_harmonic_matrix(cartorder.lcart)?;
    Ok(wmat
        .select(Axis(0), &cartorder.indices_in_lex())
        .select(Axis(1), &pureorder.indices_in_increasingm()))
}

/// Returns the matrix converting the lexicographic Cartesian components of `shell` into its
/// functions, or `None` if the shell is Cartesian and needs no conversion.
///
/// With `n_contractions` generalised contractions the components are ordered
/// contraction-major and the matrix is block-diagonal with one $`\mathbf{W}`$ block per
/// contraction.
pub fn shell_conversion_matrix(
    shell: &BasisShell,
    n_contractions: usize,
) -> Result<Option<Array2<f64>>, anyhow::Error> {
    match &shell.shell_order {
        ShellOrder::Cart(_) => {
            ensure!(
                shell.l <= MAX_ANGMOM,
                IntegralError::UnsupportedAngularMomentum(shell.l)
            );
            Ok(None)
        }
        ShellOrder::Pure(pureorder) => {
            let wmat = solid_harmonic_matrix_ordered(&CartOrder::lex(shell.l), pureorder)?;
            if n_contractions == 1 {
                return Ok(Some(wmat));
            }
            let (nrows, ncols) = wmat.dim();
            let mut block_diag =
                Array2::<f64>::zeros((nrows * n_contractions, ncols * n_contractions));
            for m in 0..n_contractions {
                block_diag
                    .slice_mut(s![m * nrows..(m + 1) * nrows, m * ncols..(m + 1) * ncols])
                    .assign(&wmat);
            }
            Ok(Some(block_diag))
        }
    }
}

/// Converts one axis of a Cartesian integral block into real solid harmonics:
///
/// ```math
/// B'_{\dots\lambda\dots} = \sum_{\lambda_{\mathrm{cart}}}
///     B_{\dots\lambda_{\mathrm{cart}}\dots} W_{\lambda_{\mathrm{cart}}\lambda}.
/// ```
///
/// # Arguments
///
/// * `block` - The Cartesian block.
/// * `axis` - The axis to convert.
/// * `wmat` - The conversion matrix, with as many rows as `block` has along `axis`.
///
/// # Errors
///
/// Errors with [`IntegralError::DimensionMismatch`] if the sizes disagree.
pub fn transform_block_axis<S, D>(
    block: &ArrayBase<S, D>,
    axis: usize,
    wmat: &Array2<f64>,
) -> Result<Array<f64, D>, anyhow::Error>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    ensure!(
        axis < block.ndim(),
        IntegralError::DimensionMismatch(format!(
            "axis {axis} requested on a block of rank {}",
            block.ndim()
        ))
    );
    ensure!(
        block.shape()[axis] == wmat.nrows(),
        IntegralError::DimensionMismatch(format!(
            "block axis {axis} has length {} but the conversion matrix has {} rows",
            block.shape()[axis],
            wmat.nrows()
        ))
    );
    let mut out_dim = block.raw_dim();
    out_dim[axis] = wmat.ncols();
    let mut out = Array::<f64, D>::zeros(out_dim);
    Zip::from(out.lanes_mut(Axis(axis)))
        .and(block.lanes(Axis(axis)))
        .for_each(|mut out_lane, in_lane| {
            out_lane.assign(&wmat.t().dot(&in_lane));
        });
    Ok(out)
}

/// Converts the leading axes of a Cartesian block into function space. Axis `k` of `block` is
/// converted by `conversions[k]`; `None` leaves the axis untouched, as do axes beyond
/// `conversions`.
pub fn cart_block_to_functions<D>(
    block: Array<f64, D>,
    conversions: &[Option<&Array2<f64>>],
) -> Result<Array<f64, D>, anyhow::Error>
where
    D: Dimension,
{
    conversions
        .iter()
        .enumerate()
        .try_fold(block, |acc, (axis, conversion)| match conversion {
            Some(wmat) => transform_block_axis(&acc, axis, wmat),
            None => Ok(acc),
        })
}
