//! Evaluation of contracted basis functions, and of their derivatives with respect to the shell
//! centres, at points in space.

use anyhow::{self, ensure};
use nalgebra::Point3;
use ndarray::{s, Array, Array2, Array3, Dimension};
use rayon::prelude::*;

use crate::angmom::spherical::transform_block_axis;
use crate::basis::basis_set::BasisSet;
use crate::basis::shell::Shell;
use crate::errors::IntegralError;

#[cfg(test)]
#[path = "eval_tests.rs"]
mod eval_tests;

/// Evaluates every function of `basis` at `points` (in Bohr).
///
/// # Returns
///
/// An array of shape $`(n_{\mathrm{funcs}}, n_{\mathrm{points}})`$ in basis order.
pub fn evaluate_basis(
    basis: &BasisSet,
    points: &[Point3<f64>],
) -> Result<Array2<f64>, anyhow::Error> {
    let blocks = basis
        .shells()
        .par_iter()
        .map(|shell| shell_values(shell, points))
        .collect::<Result<Vec<_>, _>>()?;
    let mut values = Array2::<f64>::zeros((basis.n_funcs(), points.len()));
    for ((start, end), block) in basis.shell_boundaries().iter().zip(blocks.iter()) {
        ensure!(
            block.nrows() == end - start,
            IntegralError::DimensionMismatch(format!(
                "{} values for a shell spanning {} functions",
                block.nrows(),
                end - start
            ))
        );
        values.slice_mut(s![*start..*end, ..]).assign(block);
    }
    Ok(values)
}

/// Evaluates the derivatives of every function of `basis` with respect to the $`x`$, $`y`$ and
/// $`z`$ coordinates of its own shell centre, at `points` (in Bohr).
///
/// Since each function depends on $`\mathbf{r} - \mathbf{R}`$ only, these are the negatives of
/// the spatial gradients of the functions.
///
/// # Returns
///
/// An array of shape $`(3, n_{\mathrm{funcs}}, n_{\mathrm{points}})`$.
pub fn evaluate_basis_centre_gradient(
    basis: &BasisSet,
    points: &[Point3<f64>],
) -> Result<Array3<f64>, anyhow::Error> {
    let blocks = basis
        .shells()
        .par_iter()
        .map(|shell| shell_centre_gradient(shell, points))
        .collect::<Result<Vec<_>, _>>()?;
    let mut gradient = Array3::<f64>::zeros((3, basis.n_funcs(), points.len()));
    for ((start, end), block) in basis.shell_boundaries().iter().zip(blocks.iter()) {
        ensure!(
            block.shape()[1] == end - start,
            IntegralError::DimensionMismatch(format!(
                "{} gradient rows for a shell spanning {} functions",
                block.shape()[1],
                end - start
            ))
        );
        gradient.slice_mut(s![.., *start..*end, ..]).assign(block);
    }
    Ok(gradient)
}

/// Values of the functions of one shell, of shape $`(n_{\mathrm{funcs}}, n_{\mathrm{points}})`$.
fn shell_values(shell: &Shell, points: &[Point3<f64>]) -> Result<Array2<f64>, anyhow::Error> {
    let mut cart = Array2::<f64>::zeros((shell.n_cart_funcs(), points.len()));
    let n_cart = shell.n_cart();
    for (ipt, point) in points.iter().enumerate() {
        let d = point - shell.centre();
        let r2 = d.norm_squared();
        for (k, alpha) in shell.exponents().iter().enumerate() {
            let radial = (-alpha * r2).exp();
            let coeffs = shell.scaled_coefficients().row(k);
            for (ic, &(lx, ly, lz)) in shell.cart_tuples().iter().enumerate() {
                let angular = d[0].powi(lx as i32) * d[1].powi(ly as i32) * d[2].powi(lz as i32);
                for m in 0..shell.n_contractions() {
                    let col = m * n_cart + ic;
                    cart[(col, ipt)] += coeffs[col] * angular * radial;
                }
            }
        }
    }
    to_shell_functions(cart, shell, 0)
}

/// Centre derivatives of the functions of one shell, of shape
/// $`(3, n_{\mathrm{funcs}}, n_{\mathrm{points}})`$.
///
/// ```math
/// \frac{\partial}{\partial R_x}(x - R_x)^{l_x}e^{-\alpha\lvert\mathbf{r}-\mathbf{R}\rvert^2}
///     = \big(2\alpha(x - R_x)^{l_x+1} - l_x(x - R_x)^{l_x-1}\big)
///     e^{-\alpha\lvert\mathbf{r}-\mathbf{R}\rvert^2}
/// ```
fn shell_centre_gradient(
    shell: &Shell,
    points: &[Point3<f64>],
) -> Result<Array3<f64>, anyhow::Error> {
    let mut cart = Array3::<f64>::zeros((3, shell.n_cart_funcs(), points.len()));
    let n_cart = shell.n_cart();
    for (ipt, point) in points.iter().enumerate() {
        let d = point - shell.centre();
        let r2 = d.norm_squared();
        for (k, alpha) in shell.exponents().iter().enumerate() {
            let radial = (-alpha * r2).exp();
            let coeffs = shell.scaled_coefficients().row(k);
            for (ic, &(lx, ly, lz)) in shell.cart_tuples().iter().enumerate() {
                let ls = [lx as i32, ly as i32, lz as i32];
                let powers = [0, 1, 2].map(|axis| d[axis].powi(ls[axis]));
                let derivs = [0, 1, 2].map(|axis| {
                    let lower = if ls[axis] > 0 {
                        f64::from(ls[axis]) * d[axis].powi(ls[axis] - 1)
                    } else {
                        0.0
                    };
                    2.0 * alpha * d[axis].powi(ls[axis] + 1) - lower
                });
                for axis in 0..3 {
                    let angular = (0..3)
                        .map(|other| {
                            if other == axis {
                                derivs[other]
                            } else {
                                powers[other]
                            }
                        })
                        .product::<f64>();
                    for m in 0..shell.n_contractions() {
                        let col = m * n_cart + ic;
                        cart[(axis, col, ipt)] += coeffs[col] * angular * radial;
                    }
                }
            }
        }
    }
    to_shell_functions(cart, shell, 1)
}

/// Converts the Cartesian function axis `axis` of `cart` into the functions of `shell`.
fn to_shell_functions<D: Dimension>(
    cart: Array<f64, D>,
    shell: &Shell,
    axis: usize,
) -> Result<Array<f64, D>, anyhow::Error> {
    match shell.conversion() {
        Some(wmat) => transform_block_axis(&cart, axis, wmat),
        None => Ok(cart),
    }
}

/// A uniform cubic grid of points with spacing `step` centred at `centre`, extending `half_width`
/// points in each direction, together with the volume element. Useful for quadrature checks of
/// rapidly decaying integrands.
pub fn cubic_grid(
    centre: &Point3<f64>,
    step: f64,
    half_width: usize,
) -> (Vec<Point3<f64>>, f64) {
    let n = half_width as i64;
    let offsets = (-n..=n).map(|i| i as f64 * step).collect::<Vec<_>>();
    let offsets = offsets.as_slice();
    let points = offsets
        .iter()
        .flat_map(|x| {
            offsets.iter().flat_map(move |y| {
                offsets
                    .iter()
                    .map(move |z| Point3::new(centre[0] + x, centre[1] + y, centre[2] + z))
            })
        })
        .collect::<Vec<_>>();
    (points, step.powi(3))
}

/// Estimates $`\int\phi_\mu\phi_\nu\,d\mathbf{r}`$ from values on a grid with uniform weights.
pub fn grid_overlap(values: &Array2<f64>, weight: f64) -> Array2<f64> {
    values.dot(&values.t()) * weight
}
