//! Transformation of integral tensors from the atomic-orbital basis into other bases, *e.g.*
//! molecular orbitals.

use anyhow::{self, ensure, format_err};
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array, Array2, Array3, Array4, Dimension};
use ndarray_einsum_beta::*;
use serde::{Deserialize, Serialize};

use crate::errors::IntegralError;

#[cfg(test)]
#[path = "transform_tests.rs"]
mod transform_tests;

const AXIS_LABELS: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

/// The label of the new basis index in the contraction strings.
const NEW_LABEL: char = 'z';

// --------------
// BasisTransform
// --------------

/// Coefficient matrices taking the leading (basis) axes of an integral tensor into new bases.
///
/// Matrix $`k`$ has shape $`(n_{\mathrm{AO}}, n_{\mathrm{new}})`$ and contracts axis $`k`$:
///
/// ```math
/// T'_{\dots p\dots} = \sum_{\mu} T_{\dots\mu\dots} C_{\mu p}.
/// ```
///
/// A `None` entry leaves its axis untouched. Component axes trailing the basis axes are never
/// transformed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasisTransform {
    matrices: Vec<Option<Array2<f64>>>,
}

impl BasisTransform {
    /// Creates a transform with one optional matrix per leading axis.
    pub fn new(matrices: Vec<Option<Array2<f64>>>) -> Self {
        Self { matrices }
    }

    /// The same matrix on each of `rank` basis axes.
    pub fn symmetric(c: &Array2<f64>, rank: usize) -> Self {
        Self::new(vec![Some(c.clone()); rank])
    }

    /// Separate matrices for the bra and the ket of a two-index quantity.
    pub fn two_basis(c_a: &Array2<f64>, c_b: &Array2<f64>) -> Self {
        Self::new(vec![Some(c_a.clone()), Some(c_b.clone())])
    }

    /// The number of axes this transform addresses.
    pub fn rank(&self) -> usize {
        self.matrices.len()
    }

    /// Applies the transform to the first `n_basis_axes` axes of `tensor`.
    ///
    /// # Errors
    ///
    /// Errors with [`IntegralError::DimensionMismatch`] if there are more matrices than basis axes,
    /// more basis axes than tensor axes, or a matrix whose row count differs from the length of
    /// its axis.
    pub fn apply<D: Dimension>(
        &self,
        tensor: &Array<f64, D>,
        n_basis_axes: usize,
    ) -> Result<Array<f64, D>, anyhow::Error> {
        ensure!(
            n_basis_axes <= tensor.ndim() && tensor.ndim() <= AXIS_LABELS.len(),
            IntegralError::DimensionMismatch(format!(
                "{n_basis_axes} basis axes requested on a tensor of rank {}",
                tensor.ndim()
            ))
        );
        ensure!(
            self.rank() <= n_basis_axes,
            IntegralError::DimensionMismatch(format!(
                "{} transformation matrices supplied for {n_basis_axes} basis axes",
                self.rank()
            ))
        );
        for (axis, c) in self.matrices.iter().enumerate() {
            if let Some(c) = c {
                ensure!(
                    c.nrows() == tensor.shape()[axis],
                    IntegralError::DimensionMismatch(format!(
                        "axis {axis} has length {} but its transformation matrix has {} rows",
                        tensor.shape()[axis],
                        c.nrows()
                    ))
                );
            }
        }

        let ndim = tensor.ndim();
        let mut result = tensor.clone().into_dyn();
        for (axis, c) in self.matrices.iter().enumerate() {
            let Some(c) = c else { continue };
            let labels = &AXIS_LABELS[..ndim];
            let input = labels.iter().collect::<String>();
            let output = labels
                .iter()
                .enumerate()
                .map(|(i, label)| if i == axis { NEW_LABEL } else { *label })
                .collect::<String>();
            let subscripts = format!("{input},{}{NEW_LABEL}->{output}", labels[axis]);
            log::debug!("Transforming axis {axis} with `{subscripts}`.");
            let transformed =
                einsum(&subscripts, &[&result.view(), &c.view()]).map_err(|err| format_err!(err))?;
            result = transformed;
        }
        result.into_dimensionality::<D>().map_err(|err| format_err!(err))
    }

    /// Transforms both axes of a matrix.
    pub fn apply_matrix(&self, mat: &Array2<f64>) -> Result<Array2<f64>, anyhow::Error> {
        self.apply(mat, 2)
    }

    /// Transforms the two basis axes of a multi-component one-electron tensor.
    pub fn apply_one_electron(&self, ints: &Array3<f64>) -> Result<Array3<f64>, anyhow::Error> {
        self.apply(ints, 2)
    }

    /// Transforms the four basis axes of an electron-repulsion tensor.
    pub fn apply_electron_repulsion(
        &self,
        eri: &Array4<f64>,
    ) -> Result<Array4<f64>, anyhow::Error> {
        self.apply(eri, 4)
    }
}

// ----------------------
// Orthonormalising bases
// ----------------------

/// Canonical orthonormalisation $`\mathbf{C} = \mathbf{U}\mathbf{s}^{-1/2}`$ of a basis with
/// overlap matrix `smat = U s U^T`, columns ordered by decreasing eigenvalue, such that
/// $`\mathbf{C}^{\mathsf{T}}\mathbf{S}\mathbf{C} = \mathbf{I}`$.
///
/// # Errors
///
/// Errors with [`IntegralError::DimensionMismatch`] if `smat` is not square, and with
/// [`IntegralError::NumericalInstability`] if an eigenvalue falls below `threshold`, *i.e.* the
/// basis is numerically linearly dependent.
pub fn orthonormalising_coefficients(
    smat: &Array2<f64>,
    threshold: f64,
) -> Result<Array2<f64>, anyhow::Error> {
    let (n, m) = smat.dim();
    ensure!(
        n == m,
        IntegralError::DimensionMismatch(format!("overlap matrix of shape ({n}, {m})"))
    );
    let eig = SymmetricEigen::new(DMatrix::from_fn(n, n, |i, j| smat[(i, j)]));
    let mut order = (0..n).collect::<Vec<_>>();
    order.sort_by(|&i, &j| eig.eigenvalues[j].total_cmp(&eig.eigenvalues[i]));
    if let Some(&smallest) = order.last() {
        let s_min = eig.eigenvalues[smallest];
        ensure!(
            s_min >= threshold,
            IntegralError::NumericalInstability(format!(
                "overlap eigenvalue {s_min:.3e} is below the linear-dependence threshold {threshold:.3e}"
            ))
        );
    }
    Ok(Array2::from_shape_fn((n, n), |(mu, p)| {
        let k = order[p];
        eig.eigenvectors[(mu, k)] / eig.eigenvalues[k].sqrt()
    }))
}
