//! Gaussian product theorem for two primitive Gaussians.

use nalgebra::{Point3, Vector3};

#[cfg(test)]
#[path = "primitive_pair_tests.rs"]
mod primitive_pair_tests;

/// Structure holding the product of two primitive Gaussians
/// $`e^{-\alpha|\mathbf{r}-\mathbf{A}|^2}e^{-\beta|\mathbf{r}-\mathbf{B}|^2}
/// = K e^{-\gamma|\mathbf{r}-\mathbf{P}|^2}`$.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrimitivePair {
    /// Exponent of the bra primitive, $`\alpha`$.
    pub alpha: f64,

    /// Exponent of the ket primitive, $`\beta`$.
    pub beta: f64,

    /// The combined exponent $`\gamma = \alpha + \beta`$.
    pub gamma: f64,

    /// The reduced exponent $`\xi = \alpha\beta/\gamma`$.
    pub xi: f64,

    /// The combined centre $`\mathbf{P} = (\alpha\mathbf{A} + \beta\mathbf{B})/\gamma`$.
    pub p: Point3<f64>,

    /// $`\mathbf{P} - \mathbf{A}`$.
    pub pa: Vector3<f64>,

    /// $`\mathbf{P} - \mathbf{B}`$.
    pub pb: Vector3<f64>,

    /// $`\mathbf{A} - \mathbf{B}`$.
    pub ab: Vector3<f64>,

    /// The prefactor $`K = e^{-\xi|\mathbf{A}-\mathbf{B}|^2}`$.
    pub k: f64,
}

impl PrimitivePair {
    /// Forms the product of the primitive with exponent `alpha` on `a` and the primitive with
    /// exponent `beta` on `b`.
    #[inline]
    pub fn new(alpha: f64, a: &Point3<f64>, beta: f64, b: &Point3<f64>) -> Self {
        let gamma = alpha + beta;
        let xi = alpha * beta / gamma;
        let ab = a - b;
        let p = Point3::from((alpha * a.coords + beta * b.coords) / gamma);
        Self {
            alpha,
            beta,
            gamma,
            xi,
            p,
            pa: p - a,
            pb: p - b,
            ab,
            k: (-xi * ab.norm_squared()).exp(),
        }
    }

    /// The one-dimensional prefactor $`K_x = e^{-\xi X_{AB}^2}`$ along Cartesian direction
    /// `axis`, such that $`K = K_xK_yK_z`$.
    #[inline]
    pub fn k_axis(&self, axis: usize) -> f64 {
        (-self.xi * self.ab[axis] * self.ab[axis]).exp()
    }

    /// The overlap of the two unnormalised $`s`$ primitives, $`(\pi/\gamma)^{3/2}K`$.
    #[inline]
    pub fn ss_overlap(&self) -> f64 {
        (std::f64::consts::PI / self.gamma).powf(1.5) * self.k
    }
}
