//! One-electron integrals over contracted Gaussian shells.
//!
//! Every operator is evaluated by a kernel acting on primitive pairs. The kernel produces a
//! Cartesian block for the pair, which is contracted over the primitives of the two shells,
//! converted to the shell functions and scattered into the result tensor of shape
//! $`(n_{\mathrm{A}}, n_{\mathrm{B}}, n_{\mathrm{comp}})`$.

use std::f64::consts::PI;

use anyhow::{self, ensure};
use nalgebra::{Point3, Vector3};
use ndarray::{s, Array2, Array3, ArrayView1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::angmom::spherical::cart_block_to_functions;
use crate::auxiliary::atom::PointCharge;
use crate::auxiliary::molecule::Molecule;
use crate::basis::ao::CartOrder;
use crate::basis::basis_set::BasisSet;
use crate::basis::shell::Shell;
use crate::errors::IntegralError;
use crate::integrals::boys::boys_values;
use crate::integrals::hermite::{HermiteCoulomb, HermiteExpansion, HermiteExpansion1D};
use crate::integrals::primitive_pair::PrimitivePair;

#[cfg(test)]
#[path = "one_electron_tests.rs"]
mod one_electron_tests;

// -------------------
// OneElectronOperator
// -------------------

/// One-electron operators. The operator acts on the ket function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OneElectronOperator {
    /// The identity.
    Overlap,

    /// The kinetic energy operator $`-\tfrac{1}{2}\nabla^2`$.
    Kinetic,

    /// The differential operators $`\partial_x^{e_x}\partial_y^{e_y}\partial_z^{e_z}`$, one
    /// component per order triple $`(e_x, e_y, e_z)`$.
    Differential { orders: Vec<(u32, u32, u32)> },

    /// The multipole operators $`(x - C_x)^{m_x}(y - C_y)^{m_y}(z - C_z)^{m_z}`$ about `origin`,
    /// one component per order triple $`(m_x, m_y, m_z)`$.
    Moment {
        origin: Point3<f64>,
        orders: Vec<(u32, u32, u32)>,
    },

    /// The three components (x, y, z) of $`\mathbf{r}_C \times \nabla`$ about `origin`.
    ///
    /// The angular momentum operator is $`\hat{\mathbf{L}} = -i\,\mathbf{r}_C\times\nabla`$, so the
    /// real antisymmetric matrices returned here are $`i`$ times the matrices of
    /// $`\hat{\mathbf{L}}`$.
    AngularMomentum { origin: Point3<f64> },

    /// The interaction of an electron with each point charge $`q`$ at $`\mathbf{C}`$,
    /// $`-q/\lvert\mathbf{r} - \mathbf{C}\rvert`$, one component per charge in input order.
    PointCharges { charges: Vec<PointCharge> },

    /// The attraction to all nuclei, $`-\sum_C Z_C/\lvert\mathbf{r} - \mathbf{C}\rvert`$, as a
    /// single component.
    NuclearAttraction { nuclei: Vec<PointCharge> },
}

/// The behaviour of an operator matrix under exchange of bra and ket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PairSymmetry {
    Symmetric,
    Antisymmetric,
    Unsymmetric,
}

impl PairSymmetry {
    fn sign(&self) -> Option<f64> {
        match self {
            Self::Symmetric => Some(1.0),
            Self::Antisymmetric => Some(-1.0),
            Self::Unsymmetric => None,
        }
    }
}

impl OneElectronOperator {
    /// The nuclear attraction operator of a molecule.
    pub fn nuclear_attraction(mol: &Molecule) -> Self {
        Self::NuclearAttraction {
            nuclei: mol.point_charges(),
        }
    }

    /// All multipole operators about `origin` with total order up to `max_order`. See
    /// [`moment_orders`].
    pub fn moments_up_to(origin: Point3<f64>, max_order: u32) -> Self {
        Self::Moment {
            origin,
            orders: moment_orders(max_order),
        }
    }

    /// The number of components along the last axis of the result.
    pub fn n_components(&self) -> usize {
        match self {
            Self::Overlap | Self::Kinetic | Self::NuclearAttraction { .. } => 1,
            Self::Differential { orders } | Self::Moment { orders, .. } => orders.len(),
            Self::AngularMomentum { .. } => 3,
            Self::PointCharges { charges } => charges.len(),
        }
    }

    fn pair_symmetry(&self) -> PairSymmetry {
        match self {
            Self::Differential { orders } => {
                let parities = orders
                    .iter()
                    .map(|(ex, ey, ez)| (ex + ey + ez) % 2)
                    .collect::<Vec<_>>();
                match parities.first() {
                    Some(parity) if parities.iter().all(|p| p == parity) => {
                        if *parity == 0 {
                            PairSymmetry::Symmetric
                        } else {
                            PairSymmetry::Antisymmetric
                        }
                    }
                    _ => PairSymmetry::Unsymmetric,
                }
            }
            Self::AngularMomentum { .. } => PairSymmetry::Antisymmetric,
            _ => PairSymmetry::Symmetric,
        }
    }

    /// Evaluates the operator over all pairs of functions of `basis`.
    ///
    /// # Returns
    ///
    /// A tensor of shape $`(n, n, n_{\mathrm{comp}})`$.
    ///
    /// # Errors
    ///
    /// Errors if the operator has no components where it needs at least one, or if an
    /// evaluation fails numerically.
    pub fn evaluate(&self, basis: &BasisSet) -> Result<Array3<f64>, anyhow::Error> {
        self.dispatch(basis, None)
    }

    /// Evaluates the operator between the functions of `basis_a` (bra) and those of `basis_b`
    /// (ket).
    ///
    /// # Returns
    ///
    /// A tensor of shape $`(n_{\mathrm{A}}, n_{\mathrm{B}}, n_{\mathrm{comp}})`$.
    pub fn evaluate_two_basis(
        &self,
        basis_a: &BasisSet,
        basis_b: &BasisSet,
    ) -> Result<Array3<f64>, anyhow::Error> {
        self.dispatch(basis_a, Some(basis_b))
    }

    fn dispatch(
        &self,
        basis_a: &BasisSet,
        basis_b: Option<&BasisSet>,
    ) -> Result<Array3<f64>, anyhow::Error> {
        let symmetry = self.pair_symmetry();
        match self {
            Self::Overlap => evaluate_with_kernel(&OverlapKernel, basis_a, basis_b, symmetry),
            Self::Kinetic => evaluate_with_kernel(&KineticKernel, basis_a, basis_b, symmetry),
            Self::Differential { orders } => {
                ensure!(
                    !orders.is_empty(),
                    "At least one differential order is required."
                );
                let kernel = MomentDerivativeKernel {
                    origin: Point3::origin(),
                    components: orders
                        .iter()
                        .map(|&(ex, ey, ez)| [(0, ex), (0, ey), (0, ez)])
                        .collect(),
                };
                evaluate_with_kernel(&kernel, basis_a, basis_b, symmetry)
            }
            Self::Moment { origin, orders } => {
                ensure!(!orders.is_empty(), "At least one moment order is required.");
                let kernel = MomentDerivativeKernel {
                    origin: *origin,
                    components: orders
                        .iter()
                        .map(|&(mx, my, mz)| [(mx, 0), (my, 0), (mz, 0)])
                        .collect(),
                };
                evaluate_with_kernel(&kernel, basis_a, basis_b, symmetry)
            }
            Self::AngularMomentum { origin } => evaluate_with_kernel(
                &AngularMomentumKernel { origin: *origin },
                basis_a,
                basis_b,
                symmetry,
            ),
            Self::PointCharges { charges } => evaluate_with_kernel(
                &CoulombKernel {
                    charges,
                    summed: false,
                },
                basis_a,
                basis_b,
                symmetry,
            ),
            Self::NuclearAttraction { nuclei } => evaluate_with_kernel(
                &CoulombKernel {
                    charges: nuclei,
                    summed: true,
                },
                basis_a,
                basis_b,
                symmetry,
            ),
        }
    }
}

/// Enumerates the order triples $`(m_x, m_y, m_z)`$ of all total orders from zero up to
/// `max_order`, each total order in lexicographic order: $`(0,0,0)`$, $`(1,0,0)`$,
/// $`(0,1,0)`$, $`(0,0,1)`$, $`(2,0,0)`$, $`(1,1,0)`$, ...
pub fn moment_orders(max_order: u32) -> Vec<(u32, u32, u32)> {
    (0..=max_order)
        .flat_map(|order| CartOrder::lex(order).cart_tuples)
        .collect()
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~
// Convenience matrix routines
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~

fn single_component(tensor: Array3<f64>) -> Array2<f64> {
    tensor.index_axis_move(Axis(2), 0)
}

/// The overlap matrix of `basis`.
pub fn overlap(basis: &BasisSet) -> Result<Array2<f64>, anyhow::Error> {
    OneElectronOperator::Overlap
        .evaluate(basis)
        .map(single_component)
}

/// The kinetic energy matrix of `basis`.
pub fn kinetic(basis: &BasisSet) -> Result<Array2<f64>, anyhow::Error> {
    OneElectronOperator::Kinetic
        .evaluate(basis)
        .map(single_component)
}

/// The nuclear attraction matrix of `basis` for the nuclei of `mol`.
pub fn nuclear_attraction(basis: &BasisSet, mol: &Molecule) -> Result<Array2<f64>, anyhow::Error> {
    OneElectronOperator::nuclear_attraction(mol)
        .evaluate(basis)
        .map(single_component)
}

/// The core Hamiltonian $`\mathbf{H} = \mathbf{T} + \mathbf{V}`$ of `basis` for the nuclei of
/// `mol`.
pub fn core_hamiltonian(basis: &BasisSet, mol: &Molecule) -> Result<Array2<f64>, anyhow::Error> {
    Ok(kinetic(basis)? + nuclear_attraction(basis, mol)?)
}

// -------
// Kernels
// -------

/// A primitive-pair kernel of a one-electron operator.
trait OneElectronKernel: Sync {
    /// The number of operator components.
    fn n_components(&self) -> usize;

    /// Writes the integrals between the Cartesian components `carts_a` of the bra primitive and
    /// `carts_b` of the ket primitive into `block`, of shape
    /// $`(n_{\mathrm{cart,A}}, n_{\mathrm{cart,B}}, n_{\mathrm{comp}})`$. The primitives are
    /// unnormalised.
    fn primitive_block(
        &self,
        pair: &PrimitivePair,
        ls: (u32, u32),
        carts_a: &[(u32, u32, u32)],
        carts_b: &[(u32, u32, u32)],
        block: &mut Array3<f64>,
    ) -> Result<(), anyhow::Error>;
}

/// One-dimensional integrals of the ket-side operator $`(x - C)^m\partial_x^e`$ between the
/// Cartesian factors of a primitive pair along one direction.
struct AxisIntegrals {
    expansion: HermiteExpansion1D,
    sqrt_pi_over_gamma: f64,
    beta: f64,
    /// $`B - C`$ along this direction.
    xbc: f64,
}

impl AxisIntegrals {
    /// Builds the integrals for bra indices up to `max_i` and ket indices up to `max_j`, the
    /// latter including any raise needed by the operator.
    fn new(
        pair: &PrimitivePair,
        axis: usize,
        max_i: usize,
        max_j: usize,
        origin: &Point3<f64>,
    ) -> Self {
        let b = pair.p[axis] - pair.pb[axis];
        Self {
            expansion: HermiteExpansion1D::new(pair, axis, max_i, max_j),
            sqrt_pi_over_gamma: (PI / pair.gamma).sqrt(),
            beta: pair.beta,
            xbc: b - origin[axis],
        }
    }

    fn all(pair: &PrimitivePair, max_i: usize, max_j: usize, origin: &Point3<f64>) -> [Self; 3] {
        [
            Self::new(pair, 0, max_i, max_j, origin),
            Self::new(pair, 1, max_i, max_j, origin),
            Self::new(pair, 2, max_i, max_j, origin),
        ]
    }

    #[inline]
    fn overlap(&self, i: usize, j: usize) -> f64 {
        self.expansion.get(i, j, 0) * self.sqrt_pi_over_gamma
    }

    /// $`\langle G_i \vert (x - C)^m \partial^e \vert G_j\rangle`$, using
    /// $`\partial G_j = jG_{j-1} - 2\beta G_{j+1}`$ and $`(x - C)G_j = G_{j+1} + X_{BC}G_j`$.
    /// Requires $`j + m + e`$ not to exceed the ket range of the expansion.
    fn moment_derivative(&self, i: usize, j: usize, m: u32, e: u32) -> f64 {
        if e > 0 {
            let lower = if j > 0 {
                j as f64 * self.moment_derivative(i, j - 1, m, e - 1)
            } else {
                0.0
            };
            lower - 2.0 * self.beta * self.moment_derivative(i, j + 1, m, e - 1)
        } else if m > 0 {
            self.moment_derivative(i, j + 1, m - 1, 0)
                + self.xbc * self.moment_derivative(i, j, m - 1, 0)
        } else {
            self.overlap(i, j)
        }
    }

    /// $`\langle G_i \vert -\tfrac{1}{2}\partial^2 \vert G_j\rangle`$.
    fn kinetic(&self, i: usize, j: usize) -> f64 {
        let lower = if j > 1 {
            -0.5 * (j * (j - 1)) as f64 * self.overlap(i, j - 2)
        } else {
            0.0
        };
        lower + self.beta * (2 * j + 1) as f64 * self.overlap(i, j)
            - 2.0 * self.beta * self.beta * self.overlap(i, j + 2)
    }
}

#[inline]
fn cart_index((lx, ly, lz): (u32, u32, u32)) -> [usize; 3] {
    [lx as usize, ly as usize, lz as usize]
}

struct OverlapKernel;

impl OneElectronKernel for OverlapKernel {
    fn n_components(&self) -> usize {
        1
    }

    fn primitive_block(
        &self,
        pair: &PrimitivePair,
        (la, lb): (u32, u32),
        carts_a: &[(u32, u32, u32)],
        carts_b: &[(u32, u32, u32)],
        block: &mut Array3<f64>,
    ) -> Result<(), anyhow::Error> {
        let axes = AxisIntegrals::all(pair, la as usize, lb as usize, &Point3::origin());
        for (ia, cart_a) in carts_a.iter().enumerate() {
            let a = cart_index(*cart_a);
            for (ib, cart_b) in carts_b.iter().enumerate() {
                let b = cart_index(*cart_b);
                block[(ia, ib, 0)] = (0..3)
                    .map(|axis| axes[axis].overlap(a[axis], b[axis]))
                    .product();
            }
        }
        Ok(())
    }
}

struct KineticKernel;

impl OneElectronKernel for KineticKernel {
    fn n_components(&self) -> usize {
        1
    }

    fn primitive_block(
        &self,
        pair: &PrimitivePair,
        (la, lb): (u32, u32),
        carts_a: &[(u32, u32, u32)],
        carts_b: &[(u32, u32, u32)],
        block: &mut Array3<f64>,
    ) -> Result<(), anyhow::Error> {
        let axes = AxisIntegrals::all(pair, la as usize, lb as usize + 2, &Point3::origin());
        for (ia, cart_a) in carts_a.iter().enumerate() {
            let a = cart_index(*cart_a);
            for (ib, cart_b) in carts_b.iter().enumerate() {
                let b = cart_index(*cart_b);
                let s = [0, 1, 2].map(|axis| axes[axis].overlap(a[axis], b[axis]));
                let t = [0, 1, 2].map(|axis| axes[axis].kinetic(a[axis], b[axis]));
                block[(ia, ib, 0)] =
                    t[0] * s[1] * s[2] + s[0] * t[1] * s[2] + s[0] * s[1] * t[2];
            }
        }
        Ok(())
    }
}

/// Products of one-dimensional $`(x - C)^m\partial^e`$ operators, one `[(m, e); 3]` per
/// component.
struct MomentDerivativeKernel {
    origin: Point3<f64>,
    components: Vec<[(u32, u32); 3]>,
}

impl OneElectronKernel for MomentDerivativeKernel {
    fn n_components(&self) -> usize {
        self.components.len()
    }

    fn primitive_block(
        &self,
        pair: &PrimitivePair,
        (la, lb): (u32, u32),
        carts_a: &[(u32, u32, u32)],
        carts_b: &[(u32, u32, u32)],
        block: &mut Array3<f64>,
    ) -> Result<(), anyhow::Error> {
        let raise = self
            .components
            .iter()
            .flat_map(|component| component.iter().map(|(m, e)| m + e))
            .max()
            .unwrap_or(0);
        let axes = AxisIntegrals::all(pair, la as usize, (lb + raise) as usize, &self.origin);
        for (ia, cart_a) in carts_a.iter().enumerate() {
            let a = cart_index(*cart_a);
            for (ib, cart_b) in carts_b.iter().enumerate() {
                let b = cart_index(*cart_b);
                for (ic, component) in self.components.iter().enumerate() {
                    block[(ia, ib, ic)] = (0..3)
                        .map(|axis| {
                            let (m, e) = component[axis];
                            axes[axis].moment_derivative(a[axis], b[axis], m, e)
                        })
                        .product();
                }
            }
        }
        Ok(())
    }
}

/// The components of $`\mathbf{r}_C \times \nabla`$.
struct AngularMomentumKernel {
    origin: Point3<f64>,
}

impl OneElectronKernel for AngularMomentumKernel {
    fn n_components(&self) -> usize {
        3
    }

    fn primitive_block(
        &self,
        pair: &PrimitivePair,
        (la, lb): (u32, u32),
        carts_a: &[(u32, u32, u32)],
        carts_b: &[(u32, u32, u32)],
        block: &mut Array3<f64>,
    ) -> Result<(), anyhow::Error> {
        let axes = AxisIntegrals::all(pair, la as usize, lb as usize + 1, &self.origin);
        for (ia, cart_a) in carts_a.iter().enumerate() {
            let a = cart_index(*cart_a);
            for (ib, cart_b) in carts_b.iter().enumerate() {
                let b = cart_index(*cart_b);
                let s = [0, 1, 2].map(|k| axes[k].moment_derivative(a[k], b[k], 0, 0));
                let r = [0, 1, 2].map(|k| axes[k].moment_derivative(a[k], b[k], 1, 0));
                let d = [0, 1, 2].map(|k| axes[k].moment_derivative(a[k], b[k], 0, 1));
                // (r x grad)_i = r_j d_k - r_k d_j for cyclic (i, j, k).
                for (i, j, k) in [(0, 1, 2), (1, 2, 0), (2, 0, 1)] {
                    block[(ia, ib, i)] = s[i] * (r[j] * d[k] - d[j] * r[k]);
                }
            }
        }
        Ok(())
    }
}

/// Coulomb interaction with point charges, either one component per charge or summed.
struct CoulombKernel<'a> {
    charges: &'a [PointCharge],
    summed: bool,
}

impl<'a> OneElectronKernel for CoulombKernel<'a> {
    fn n_components(&self) -> usize {
        if self.summed {
            1
        } else {
            self.charges.len()
        }
    }

    fn primitive_block(
        &self,
        pair: &PrimitivePair,
        (la, lb): (u32, u32),
        carts_a: &[(u32, u32, u32)],
        carts_b: &[(u32, u32, u32)],
        block: &mut Array3<f64>,
    ) -> Result<(), anyhow::Error> {
        let l_total = (la + lb) as usize;
        let expansion = HermiteExpansion::new(*pair, la as usize, lb as usize);
        let prefactor = 2.0 * PI / pair.gamma;
        let mut boys = vec![0.0; l_total + 1];
        block.fill(0.0);
        for (icharge, charge) in self.charges.iter().enumerate() {
            let rpc: Vector3<f64> = pair.p - charge.position;
            boys_values(pair.gamma * rpc.norm_squared(), &mut boys)?;
            let r = HermiteCoulomb::new(l_total, pair.gamma, &rpc, &boys)?;
            let ic = if self.summed { 0 } else { icharge };
            for (ia, cart_a) in carts_a.iter().enumerate() {
                let a = cart_index(*cart_a);
                for (ib, cart_b) in carts_b.iter().enumerate() {
                    let b = cart_index(*cart_b);
                    let mut value = 0.0;
                    for t in 0..=(a[0] + b[0]) {
                        let ex = expansion.axes[0].get(a[0], b[0], t);
                        for u in 0..=(a[1] + b[1]) {
                            let exy = ex * expansion.axes[1].get(a[1], b[1], u);
                            for v in 0..=(a[2] + b[2]) {
                                value +=
                                    exy * expansion.axes[2].get(a[2], b[2], v) * r.get(t, u, v);
                            }
                        }
                    }
                    block[(ia, ib, ic)] -= charge.charge * prefactor * value;
                }
            }
        }
        Ok(())
    }
}

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
// Contraction, conversion and scattering
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

/// Evaluates a kernel over a shell pair, returning the block in the shell functions of shape
/// $`(n_{\mathrm{A}}, n_{\mathrm{B}}, n_{\mathrm{comp}})`$.
fn evaluate_shell_pair<K: OneElectronKernel>(
    kernel: &K,
    shell_a: &Shell,
    shell_b: &Shell,
) -> Result<Array3<f64>, anyhow::Error> {
    let n_comp = kernel.n_components();
    let (nca, ncb) = (shell_a.n_cart(), shell_b.n_cart());
    let mut prim = Array3::<f64>::zeros((nca, ncb, n_comp));
    let mut contracted =
        Array3::<f64>::zeros((shell_a.n_cart_funcs(), shell_b.n_cart_funcs(), n_comp));
    for (ka, alpha) in shell_a.exponents().iter().enumerate() {
        for (kb, beta) in shell_b.exponents().iter().enumerate() {
            let pair = PrimitivePair::new(*alpha, shell_a.centre(), *beta, shell_b.centre());
            kernel.primitive_block(
                &pair,
                (shell_a.l(), shell_b.l()),
                shell_a.cart_tuples(),
                shell_b.cart_tuples(),
                &mut prim,
            )?;
            accumulate_contracted(
                &mut contracted,
                &prim,
                shell_a.scaled_coefficients().row(ka),
                shell_b.scaled_coefficients().row(kb),
            );
        }
    }
    cart_block_to_functions(contracted, &[shell_a.conversion(), shell_b.conversion()])
}

/// Adds $`d^A_I d^B_J P_{c(I)c(J)}`$ to every contracted Cartesian entry $`(I, J)`$.
fn accumulate_contracted(
    contracted: &mut Array3<f64>,
    prim: &Array3<f64>,
    coeffs_a: ArrayView1<f64>,
    coeffs_b: ArrayView1<f64>,
) {
    let (nca, ncb, _) = prim.dim();
    for (ia, da) in coeffs_a.iter().enumerate() {
        for (ib, db) in coeffs_b.iter().enumerate() {
            let weight = da * db;
            if weight == 0.0 {
                continue;
            }
            contracted
                .slice_mut(s![ia, ib, ..])
                .scaled_add(weight, &prim.slice(s![ia % nca, ib % ncb, ..]));
        }
    }
}

/// Evaluates a kernel over all required shell pairs in parallel and scatters the blocks.
///
/// With a single basis only the pairs $`i \ge j`$ are evaluated for operators with a pair
/// symmetry, the remaining blocks being (anti)transposes.
fn evaluate_with_kernel<K: OneElectronKernel>(
    kernel: &K,
    basis_a: &BasisSet,
    basis_b: Option<&BasisSet>,
    symmetry: PairSymmetry,
) -> Result<Array3<f64>, anyhow::Error> {
    let n_comp = kernel.n_components();
    let two_basis = basis_b.is_some();
    let basis_b = basis_b.unwrap_or(basis_a);
    let sign = if two_basis { None } else { symmetry.sign() };

    let pairs = (0..basis_a.n_shells())
        .flat_map(|i| {
            let j_end = if sign.is_some() { i + 1 } else { basis_b.n_shells() };
            (0..j_end).map(move |j| (i, j))
        })
        .collect::<Vec<_>>();

    let blocks = pairs
        .par_iter()
        .map(|&(i, j)| {
            evaluate_shell_pair(kernel, &basis_a[i], &basis_b[j]).map(|block| (i, j, block))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut result = Array3::<f64>::zeros((basis_a.n_funcs(), basis_b.n_funcs(), n_comp));
    let bounds_a = basis_a.shell_boundaries();
    let bounds_b = basis_b.shell_boundaries();
    for (i, j, block) in blocks {
        let (a0, a1) = bounds_a[i];
        let (b0, b1) = bounds_b[j];
        ensure!(
            block.dim() == (a1 - a0, b1 - b0, n_comp),
            IntegralError::DimensionMismatch(format!(
                "block of shape {:?} for shells ({i}, {j}) spanning ({}, {}) functions",
                block.dim(),
                a1 - a0,
                b1 - b0
            ))
        );
        result.slice_mut(s![a0..a1, b0..b1, ..]).assign(&block);
        if let Some(sign) = sign {
            if i != j {
                let transposed = block.permuted_axes([1, 0, 2]);
                result
                    .slice_mut(s![b0..b1, a0..a1, ..])
                    .assign(&(transposed * sign));
            }
        }
    }
    Ok(result)
}
