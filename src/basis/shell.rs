//! Contracted Gaussian shells on a centre.

use std::fmt;

use anyhow::{self, ensure};
use itertools::Itertools;
use nalgebra::Point3;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::angmom::sh_conversion::norm_cart_gaussian;
use crate::angmom::spherical::shell_conversion_matrix;
use crate::basis::ao::{BasisShell, CartOrder, ShellOrder};
use crate::errors::IntegralError;

#[cfg(test)]
#[path = "shell_tests.rs"]
mod shell_tests;

/// A shell of contracted Gaussian functions sharing a centre, an angular momentum and a set of
/// primitive exponents, possibly with several (generalised) contractions.
///
/// A primitive Cartesian component
///
/// ```math
/// g(\alpha, l_x, l_y, l_z) = N(l_x, l_y, l_z, \alpha)(x - R_x)^{l_x}(y - R_y)^{l_y}(z - R_z)^{l_z}
///     e^{-\alpha\lvert\mathbf{r} - \mathbf{R}\rvert^2}
/// ```
///
/// is always normalised. Contraction $`m`$ of a component is
/// $`\mathcal{N}_m\sum_k c_{km} g(\alpha_k, l_x, l_y, l_z)`$, where the contraction normalisation
/// $`\mathcal{N}_m`$ makes the function unit-norm if the shell is renormalised and is one
/// otherwise. Functions are ordered contraction-major.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Shell {
    /// The angular part of the shell.
    basis_shell: BasisShell,

    /// The centre of the shell in Bohr.
    centre: Point3<f64>,

    /// The primitive exponents, of length $`K`$.
    exponents: Array1<f64>,

    /// The contraction coefficients as given, of shape $`(K, M)`$.
    coefficients: Array2<f64>,

    /// The index of the atom carrying this shell, if any.
    atom_index: Option<usize>,

    /// Whether the contractions are renormalised.
    renormalise: bool,

    /// Contraction normalisation constants, one per contraction.
    contraction_norms: Array1<f64>,

    /// The Cartesian components in the order integrals are computed in: lexicographic for pure
    /// shells, the shell's own order for Cartesian shells.
    cart_tuples: Vec<(u32, u32, u32)>,

    /// Fully scaled primitive coefficients of shape $`(K, M n_{\mathrm{cart}})`$, with column
    /// $`m n_{\mathrm{cart}} + c`$ holding $`\mathcal{N}_m c_{km} N_c(\alpha_k)`$.
    scaled_coefficients: Array2<f64>,

    /// The matrix taking the computed Cartesian components to the shell functions, or `None` for
    /// Cartesian shells.
    conversion: Option<Array2<f64>>,
}

impl Shell {
    /// Constructs and validates a shell.
    ///
    /// # Arguments
    ///
    /// * `basis_shell` - The angular momentum and function ordering.
    /// * `centre` - The centre in Bohr.
    /// * `exponents` - The $`K`$ primitive exponents.
    /// * `coefficients` - The contraction coefficients, one row per exponent and one column per
    /// contraction.
    /// * `renormalise` - Whether each contraction is scaled to unit norm.
    ///
    /// # Errors
    ///
    /// Errors with [`IntegralError::MalformedBasis`] if there are no primitives or no
    /// contractions, if the coefficient rows do not match the exponents, if an exponent is not
    /// finite and positive, or if a contraction has no norm. Errors with
    /// [`IntegralError::UnsupportedAngularMomentum`] if the angular momentum is too high.
    pub fn new(
        basis_shell: BasisShell,
        centre: Point3<f64>,
        exponents: Array1<f64>,
        coefficients: Array2<f64>,
        renormalise: bool,
    ) -> Result<Self, anyhow::Error> {
        let n_prims = exponents.len();
        ensure!(
            n_prims >= 1,
            IntegralError::MalformedBasis("a shell must have at least one primitive".to_string())
        );
        ensure!(
            coefficients.ncols() >= 1,
            IntegralError::MalformedBasis(
                "a shell must have at least one contraction".to_string()
            )
        );
        ensure!(
            coefficients.nrows() == n_prims,
            IntegralError::MalformedBasis(format!(
                "{n_prims} exponents but {} coefficient rows",
                coefficients.nrows()
            ))
        );
        ensure!(
            exponents.iter().all(|alpha| alpha.is_finite() && *alpha > 0.0),
            IntegralError::MalformedBasis(format!(
                "exponents must be finite and positive, got {exponents}"
            ))
        );
        ensure!(
            coefficients.iter().all(|c| c.is_finite()),
            IntegralError::MalformedBasis("contraction coefficients must be finite".to_string())
        );

        let conversion = shell_conversion_matrix(&basis_shell, coefficients.ncols())?;
        let cart_tuples = match &basis_shell.shell_order {
            ShellOrder::Pure(_) => CartOrder::lex(basis_shell.l).cart_tuples,
            ShellOrder::Cart(cart_order) => cart_order.cart_tuples.clone(),
        };

        let contraction_norms = if renormalise {
            contraction_norms(basis_shell.l, &exponents, &coefficients)?
        } else {
            Array1::ones(coefficients.ncols())
        };

        let n_cart = cart_tuples.len();
        let mut scaled_coefficients =
            Array2::<f64>::zeros((n_prims, coefficients.ncols() * n_cart));
        for (k, alpha) in exponents.iter().enumerate() {
            let prim_norms = cart_tuples
                .iter()
                .map(|tuple| norm_cart_gaussian(*tuple, *alpha))
                .collect::<Result<Vec<_>, _>>()?;
            for (m, norm_m) in contraction_norms.iter().enumerate() {
                for (c, prim_norm) in prim_norms.iter().enumerate() {
                    scaled_coefficients[(k, m * n_cart + c)] =
                        norm_m * coefficients[(k, m)] * prim_norm;
                }
            }
        }

        Ok(Self {
            basis_shell,
            centre,
            exponents,
            coefficients,
            atom_index: None,
            renormalise,
            contraction_norms,
            cart_tuples,
            scaled_coefficients,
            conversion,
        })
    }

    /// Attaches the index of the atom carrying this shell.
    pub fn with_atom_index(mut self, atom_index: usize) -> Self {
        self.atom_index = Some(atom_index);
        self
    }

    /// Returns a copy of this shell moved to `centre`.
    pub fn with_centre(&self, centre: Point3<f64>) -> Self {
        let mut moved = self.clone();
        moved.centre = centre;
        moved
    }

    /// The angular momentum of the shell.
    pub fn l(&self) -> u32 {
        self.basis_shell.l
    }

    pub fn basis_shell(&self) -> &BasisShell {
        &self.basis_shell
    }

    pub fn centre(&self) -> &Point3<f64> {
        &self.centre
    }

    pub fn exponents(&self) -> &Array1<f64> {
        &self.exponents
    }

    pub fn coefficients(&self) -> &Array2<f64> {
        &self.coefficients
    }

    pub fn atom_index(&self) -> Option<usize> {
        self.atom_index
    }

    pub fn is_renormalised(&self) -> bool {
        self.renormalise
    }

    pub fn contraction_norms(&self) -> &Array1<f64> {
        &self.contraction_norms
    }

    /// The number of primitives $`K`$.
    pub fn n_primitives(&self) -> usize {
        self.exponents.len()
    }

    /// The number of contractions $`M`$.
    pub fn n_contractions(&self) -> usize {
        self.coefficients.ncols()
    }

    /// The number of Cartesian components per contraction.
    pub fn n_cart(&self) -> usize {
        self.cart_tuples.len()
    }

    /// The number of computed Cartesian functions over all contractions.
    pub fn n_cart_funcs(&self) -> usize {
        self.n_contractions() * self.n_cart()
    }

    /// The number of basis functions over all contractions.
    pub fn n_funcs(&self) -> usize {
        self.n_contractions() * self.basis_shell.n_funcs()
    }

    /// The Cartesian exponent tuples of the computed components.
    pub fn cart_tuples(&self) -> &[(u32, u32, u32)] {
        &self.cart_tuples
    }

    /// The fully scaled primitive coefficients, see [`Shell`].
    pub fn scaled_coefficients(&self) -> &Array2<f64> {
        &self.scaled_coefficients
    }

    /// The matrix taking the computed Cartesian functions to the shell functions, if any.
    pub fn conversion(&self) -> Option<&Array2<f64>> {
        self.conversion.as_ref()
    }

    /// Labels of the functions in this shell, suffixed by the contraction index when there is
    /// more than one contraction.
    pub fn function_labels(&self) -> Vec<String> {
        let labels = self.basis_shell.function_labels();
        if self.n_contractions() == 1 {
            labels
        } else {
            (0..self.n_contractions())
                .cartesian_product(labels.iter())
                .map(|(m, label)| format!("{label}[{m}]"))
                .collect_vec()
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} shell ({} prim., {} contr.) at ({:+.6}, {:+.6}, {:+.6})",
            self.basis_shell.shell_order,
            self.n_primitives(),
            self.n_contractions(),
            self.centre[0],
            self.centre[1],
            self.centre[2]
        )
    }
}

/// Computes the contraction normalisation constants
///
/// ```math
/// \mathcal{N}_m = \left[\sum_{ab} c_{am} c_{bm}
///     \left(\frac{2\sqrt{\alpha_a\alpha_b}}{\alpha_a + \alpha_b}\right)^{l + 3/2}\right]^{-1/2},
/// ```
///
/// the bracket being the self-overlap of contraction $`m`$ of any Cartesian component built from
/// normalised primitives.
fn contraction_norms(
    l: u32,
    exponents: &Array1<f64>,
    coefficients: &Array2<f64>,
) -> Result<Array1<f64>, anyhow::Error> {
    let power = f64::from(l) + 1.5;
    coefficients
        .columns()
        .into_iter()
        .enumerate()
        .map(|(m, column)| {
            let self_overlap = exponents
                .iter()
                .zip(column.iter())
                .cartesian_product(exponents.iter().zip(column.iter()))
                .map(|((alpha_a, c_a), (alpha_b, c_b))| {
                    let ratio = 2.0 * (alpha_a * alpha_b).sqrt() / (alpha_a + alpha_b);
                    c_a * c_b * ratio.powf(power)
                })
                .sum::<f64>();
            ensure!(
                self_overlap.is_finite() && self_overlap > 0.0,
                IntegralError::MalformedBasis(format!(
                    "contraction {m} has a non-positive self-overlap {self_overlap:.3e}"
                ))
            );
            Ok(1.0 / self_overlap.sqrt())
        })
        .collect::<Result<Array1<_>, _>>()
}
