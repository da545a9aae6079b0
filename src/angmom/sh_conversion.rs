//! Conversion coefficients between Cartesian and solid-harmonic Gaussians.
//!
//! All coefficients relate *normalised* Cartesian Gaussians to *normalised* solid-harmonic
//! Gaussians of the same radial width, following Schlegel, H. B. & Frisch, M. J. Transformation
//! between Cartesian and pure spherical harmonic Gaussians. *International Journal of Quantum
//! Chemistry* **54**, 83–87 (1995), [DOI](https://doi.org/10.1002/qua.560540202).

use std::cmp::Ordering;

use anyhow::{self, ensure, format_err};
use factorial::Factorial;
use ndarray::{Array2, Axis};
use num::{BigUint, Complex};
use num_traits::{cast::ToPrimitive, Zero};

use crate::basis::ao::{CartOrder, PureOrder};

#[cfg(test)]
#[path = "sh_conversion_tests.rs"]
mod sh_conversion_tests;

// ------------------
// Integer arithmetic
// ------------------

/// Computes $`n!`$ exactly.
fn factorial_big(n: u32) -> Result<BigUint, anyhow::Error> {
    BigUint::from(n)
        .checked_factorial()
        .ok_or_else(|| format_err!("Unable to compute the factorial of {n}."))
}

/// Converts an exact integer into `f64`.
fn big_to_f64(x: &BigUint) -> Result<f64, anyhow::Error> {
    x.to_f64()
        .ok_or_else(|| format_err!("Unable to convert `{x}` to `f64`."))
}

/// Calculates the number of combinations of `n` things taken `r` at a time (signed arguments).
///
/// If $`n < 0`$ or $`r < 0`$ or $`r > n`$, `0` is returned.
fn comb(n: i32, r: i32) -> Result<BigUint, anyhow::Error> {
    if n < 0 || r < 0 || r > n {
        Ok(BigUint::zero())
    } else {
        let nu = n.unsigned_abs();
        let ru = r.unsigned_abs();
        Ok((nu - ru + 1..=nu).product::<BigUint>() / factorial_big(ru)?)
    }
}

/// Calculates the number of combinations of `nu` things taken `ru` at a time.
fn combu(nu: u32, ru: u32) -> Result<BigUint, anyhow::Error> {
    if ru > nu {
        Ok(BigUint::zero())
    } else {
        Ok((nu - ru + 1..=nu).product::<BigUint>() / factorial_big(ru)?)
    }
}

// -----------------------
// Normalisation constants
// -----------------------

/// Obtains the normalisation constant $`\tilde{N}(n, \alpha)`$ for a solid harmonic Gaussian
/// $`\tilde{N}(n, \alpha) Y_l^m r^n e^{-\alpha r^2}`$ (Equation 8 of Schlegel & Frisch).
///
/// # Arguments
///
/// * `n` - The non-negative exponent of the radial part of the solid harmonic Gaussian.
/// * `alpha` - The coefficient on the exponent of the Gaussian term.
pub(crate) fn norm_sph_gaussian(n: u32, alpha: f64) -> Result<f64, anyhow::Error> {
    let num = big_to_f64(&(BigUint::from(2u64).pow(2 * n + 3) * factorial_big(n + 1)?))?
        * (2.0 * alpha).powf(f64::from(n) + 1.5);
    let den = big_to_f64(&factorial_big(2 * n + 2)?)? * std::f64::consts::PI.sqrt();
    Ok((num / den).sqrt())
}

/// Obtains the normalisation constant $`N(l_x, l_y, l_z, \alpha)`$ for a Cartesian Gaussian
/// primitive
///
/// ```math
/// g(\alpha, l_x, l_y, l_z, \mathbf{r})
///     = N(l_x, l_y, l_z, \alpha) x^{l_x} y^{l_y} z^{l_z} e^{-\alpha r^2},
/// ```
///
/// as given in Equation 9 of Schlegel & Frisch:
///
/// ```math
/// N(l_x, l_y, l_z, \alpha) = \left[
///     \frac{2^{2l} l_x! l_y! l_z! (2\alpha)^{l + 3/2}}
///          {(2l_x)! (2l_y)! (2l_z)! \pi^{3/2}}
/// \right]^{1/2}.
/// ```
///
/// # Arguments
///
/// * `lcartqns` - A tuple of $`(l_x, l_y, l_z)`$ specifying the non-negative exponents of
/// the Cartesian components of the Cartesian Gaussian.
/// * `alpha` - The coefficient on the exponent of the Gaussian term.
///
/// # Errors
///
/// Errors if any of the factorials involved cannot be represented.
pub fn norm_cart_gaussian(lcartqns: (u32, u32, u32), alpha: f64) -> Result<f64, anyhow::Error> {
    let (lx, ly, lz) = lcartqns;
    let lcart = lx + ly + lz;
    let num = big_to_f64(
        &(BigUint::from(2u32).pow(2 * lcart)
            * factorial_big(lx)?
            * factorial_big(ly)?
            * factorial_big(lz)?),
    )? * (2.0 * alpha).powf(f64::from(lcart) + 1.5);
    let den = big_to_f64(
        &(factorial_big(2 * lx)? * factorial_big(2 * ly)? * factorial_big(2 * lz)?),
    )? * std::f64::consts::PI.powi(3).sqrt();
    Ok((num / den).sqrt())
}

// ---------------------
// Complex coefficients
// ---------------------

/// Obtains the complex coefficient $`c(l, m_l, l_{\mathrm{cart}}, l_x, l_y, l_z)`$ expanding a
/// normalised complex solid harmonic Gaussian in normalised Cartesian Gaussians,
///
/// ```math
/// \tilde{g}(\alpha, l, m_l, l_{\mathrm{cart}}, \mathbf{r})
/// = \sum_{l_x+l_y+l_z=l_{\mathrm{cart}}}
///     c(l, m_l, l_{\mathrm{cart}}, l_x, l_y, l_z)
///     g(\alpha, l_x, l_y, l_z, \mathbf{r}),
/// ```
///
/// generalised from Equation 15 of Schlegel & Frisch to $`l \le l_{\mathrm{cart}}`$. The
/// coefficient vanishes when $`l_{\mathrm{cart}} - l`$ is odd and is independent of
/// $`\alpha`$.
///
/// # Arguments
///
/// * `lpureqns` - A tuple of $`(l, m_l)`$.
/// * `lcartqns` - A tuple of $`(l_x, l_y, l_z)`$.
/// * `csphase` - If `true`, the Condon--Shortley phase $`(-1)^{m_l}`$ is applied for
/// $`m_l > 0`$.
///
/// # Errors
///
/// Errors if $`\lvert m_l \rvert > l`$ or if any factorial cannot be computed.
pub fn complexc(
    lpureqns: (u32, i32),
    lcartqns: (u32, u32, u32),
    csphase: bool,
) -> Result<Complex<f64>, anyhow::Error> {
    let (l, m) = lpureqns;
    let mabs = m.unsigned_abs();
    ensure!(mabs <= l, "m = {m} must be between -{l} and {l} (inclusive).");
    let li32 = i32::try_from(l)?;
    let (lx, ly, lz) = lcartqns;
    let lxi32 = i32::try_from(lx)?;
    let lyi32 = i32::try_from(ly)?;
    let lcart = lx + ly + lz;
    let dl = i32::try_from(lcart)? - li32;
    if dl < 0 || dl % 2 != 0 {
        return Ok(Complex::<f64>::zero());
    }

    let num = big_to_f64(&(BigUint::from(2 * l + 1) * factorial_big(l - mabs)?))?;
    let den = 4.0 * std::f64::consts::PI * big_to_f64(&factorial_big(l + mabs)?)?;
    let mut prefactor = (num / den).sqrt()
        / big_to_f64(&(BigUint::from(2u32).pow(l) * factorial_big(l)?))?;
    if csphase && m > 0 && mabs % 2 == 1 {
        prefactor = -prefactor;
    }
    let ntilde = norm_sph_gaussian(lcart, 1.0)?;
    let n = norm_cart_gaussian(lcartqns, 1.0)?;

    let mut si = Complex::<f64>::zero();
    for i in 0..=((l - mabs) / 2) {
        let ii32 = i32::try_from(i)?;
        let mut ifactor = big_to_f64(&combu(l, i)?)? * big_to_f64(&factorial_big(2 * l - 2 * i)?)?
            / big_to_f64(&factorial_big(l - mabs - 2 * i)?)?;
        if i % 2 == 1 {
            ifactor = -ifactor;
        }
        let mut sp = Complex::<f64>::zero();
        for p in 0..=mabs {
            let pi32 = i32::try_from(p)?;
            let unit = if m > 0 {
                Complex::<f64>::i()
            } else {
                -Complex::<f64>::i()
            };
            let pfactor = big_to_f64(&combu(mabs, p)?)? * unit.powu(mabs - p);
            let mut sq = Complex::<f64>::zero();
            for q in 0..=(dl / 2) {
                let jq_num = lxi32 + lyi32 - 2 * q - m.abs();
                if jq_num.rem_euclid(2) != 0 {
                    continue;
                }
                let jq = jq_num.div_euclid(2);
                let qfactor = big_to_f64(&(comb(dl / 2, q)? * comb(ii32, jq)?))?;
                let mut sk = 0.0;
                for k in 0..=jq {
                    let tpk_num = lxi32 - pi32 - 2 * k;
                    if tpk_num.rem_euclid(2) == 0 {
                        sk += big_to_f64(&(comb(q, tpk_num.div_euclid(2))? * comb(jq, k)?))?;
                    }
                }
                sq += qfactor * sk;
            }
            sp += pfactor * sq;
        }
        si += ifactor * sp;
    }
    Ok((ntilde / n) * prefactor * si)
}

/// Calculates the overlap between two normalised Cartesian Gaussians of the same order and
/// radial width on the same centre (Equation 19 of Schlegel & Frisch).
///
/// # Errors
///
/// Errors if the two Cartesian Gaussians are of different orders.
pub(crate) fn cartov(
    lcartqns1: (u32, u32, u32),
    lcartqns2: (u32, u32, u32),
) -> Result<f64, anyhow::Error> {
    let (lx1, ly1, lz1) = lcartqns1;
    let (lx2, ly2, lz2) = lcartqns2;
    ensure!(
        lx1 + ly1 + lz1 == lx2 + ly2 + lz2,
        "Only Cartesian Gaussians of the same order are supported."
    );
    if (lx1 + lx2) % 2 != 0 || (ly1 + ly2) % 2 != 0 || (lz1 + lz2) % 2 != 0 {
        return Ok(0.0);
    }
    let num1 = factorial_big(lx1 + lx2)? * factorial_big(ly1 + ly2)? * factorial_big(lz1 + lz2)?;
    let den1 = factorial_big((lx1 + lx2) / 2)?
        * factorial_big((ly1 + ly2) / 2)?
        * factorial_big((lz1 + lz2) / 2)?;
    let num2 = [lx1, ly1, lz1, lx2, ly2, lz2]
        .into_iter()
        .try_fold(BigUint::from(1u32), |acc, k| {
            factorial_big(k).map(|f| acc * f)
        })?;
    let den2 = [lx1, ly1, lz1, lx2, ly2, lz2]
        .into_iter()
        .try_fold(BigUint::from(1u32), |acc, k| {
            factorial_big(2 * k).map(|f| acc * f)
        })?;
    Ok(big_to_f64(&num1)? / big_to_f64(&den1)? * (big_to_f64(&num2)? / big_to_f64(&den2)?).sqrt())
}

/// Builds the overlap matrix between the normalised Cartesian Gaussians of a single shell, in
/// the order given by `cartorder`.
pub fn cart_overlap_mat(cartorder: &CartOrder) -> Result<Array2<f64>, anyhow::Error> {
    let n = cartorder.ncomps();
    let mut smat = Array2::<f64>::zeros((n, n));
    for (i, &ti) in cartorder.iter().enumerate() {
        for (j, &tj) in cartorder.iter().enumerate() {
            smat[(i, j)] = cartov(ti, tj)?;
        }
    }
    Ok(smat)
}

// -----------------
// Matrix assemblers
// -----------------

/// Obtains the matrix $`\boldsymbol{\Upsilon}^{(l)}`$ expressing complex spherical harmonics as
/// linear combinations of real spherical harmonics,
/// $`Y_l^m = \sum_{m'} Y_{lm'} \Upsilon^{(l)}_{m'm}`$.
///
/// Both axes follow `pureorder`.
///
/// # Errors
///
/// Errors if `pureorder` is not of degree `l`.
pub fn sh_c2r_mat(
    l: u32,
    csphase: bool,
    pureorder: &PureOrder,
) -> Result<Array2<Complex<f64>>, anyhow::Error> {
    ensure!(pureorder.lpure == l, "Mismatched pure ranks.");
    let lusize = l as usize;
    let sq2inv = 1.0 / 2.0f64.sqrt();
    let mut upmat = Array2::<Complex<f64>>::zeros((2 * lusize + 1, 2 * lusize + 1));
    for mcomplex in -(l as i32)..=(l as i32) {
        let absm = mcomplex.unsigned_abs() as usize;
        match mcomplex.cmp(&0) {
            Ordering::Less => {
                upmat[(lusize - absm, lusize - absm)] = Complex::<f64>::new(0.0, -sq2inv);
                upmat[(lusize + absm, lusize - absm)] = Complex::<f64>::new(sq2inv, 0.0);
            }
            Ordering::Equal => {
                upmat[(lusize, lusize)] = Complex::<f64>::from(1.0);
            }
            Ordering::Greater => {
                let lcs = if csphase && absm % 2 == 1 { -1.0 } else { 1.0 };
                upmat[(lusize - absm, lusize + absm)] = lcs * Complex::<f64>::new(0.0, sq2inv);
                upmat[(lusize + absm, lusize + absm)] = lcs * Complex::<f64>::new(sq2inv, 0.0);
            }
        }
    }

    // `upmat` is built in increasing-m order on both axes.
    let image = pureorder.indices_in_increasingm();
    Ok(upmat.select(Axis(0), &image).select(Axis(1), &image))
}

/// Obtains $`\boldsymbol{\Upsilon}^{(l)\dagger}`$, the inverse of [`sh_c2r_mat`], which expresses
/// real spherical harmonics as linear combinations of complex ones.
pub fn sh_r2c_mat(
    l: u32,
    csphase: bool,
    pureorder: &PureOrder,
) -> Result<Array2<Complex<f64>>, anyhow::Error> {
    let mut mat = sh_c2r_mat(l, csphase, pureorder)?.t().to_owned();
    mat.mapv_inplace(|x| x.conj());
    Ok(mat)
}

/// Obtains the matrix $`\mathbf{U}^{(l_{\mathrm{cart}}, l)}`$ with elements
/// $`U_{\lambda_{\mathrm{cart}}\lambda} = c(l, m_l, l_{\mathrm{cart}}, l_x, l_y, l_z)`$, so that
/// $`\tilde{\mathbf{g}}^{\mathsf{T}}(l) = \mathbf{g}^{\mathsf{T}}(l_{\mathrm{cart}})
/// \mathbf{U}^{(l_{\mathrm{cart}}, l)}`$.
///
/// # Errors
///
/// Errors if the ranks of `cartorder` or `pureorder` do not match `lcart` or `l`.
pub fn sh_cl2cart_mat(
    lcart: u32,
    l: u32,
    cartorder: &CartOrder,
    csphase: bool,
    pureorder: &PureOrder,
) -> Result<Array2<Complex<f64>>, anyhow::Error> {
    ensure!(cartorder.lcart == lcart, "Mismatched Cartesian ranks.");
    ensure!(pureorder.lpure == l, "Mismatched pure ranks.");
    let mut umat = Array2::<Complex<f64>>::zeros((cartorder.ncomps(), pureorder.ncomps()));
    for (i, &m) in pureorder.iter().enumerate() {
        for (icart, &lcartqns) in cartorder.iter().enumerate() {
            umat[(icart, i)] = complexc((l, m), lcartqns, csphase)?;
        }
    }
    Ok(umat)
}

/// Obtains the real matrix $`\mathbf{W}^{(l_{\mathrm{cart}}, l)}
/// = \mathbf{U}^{(l_{\mathrm{cart}}, l)} \boldsymbol{\Upsilon}^{(l)\dagger}`$ expressing
/// normalised real solid harmonic Gaussians in normalised Cartesian Gaussians,
///
/// ```math
/// \bar{\mathbf{g}}^{\mathsf{T}}(l)
///     = \mathbf{g}^{\mathsf{T}}(l_{\mathrm{cart}})
///     \ \mathbf{W}^{(l_{\mathrm{cart}}, l)}.
/// ```
///
/// $`\mathbf{W}`$ has dimensions
/// $`\frac{1}{2}(l_{\mathrm{cart}}+1)(l_{\mathrm{cart}}+2) \times (2l+1)`$.
///
/// # Arguments
///
/// * `lcart` - The total Cartesian degree.
/// * `l` - The spherical harmonic degree.
/// * `cartorder` - Ordering of the Cartesian rows.
/// * `csphase` - Whether the Condon--Shortley phase is used.
/// * `pureorder` - Ordering of the pure columns.
///
/// # Errors
///
/// Errors if the ranks mismatch or if the product fails to be real.
pub fn sh_rl2cart_mat(
    lcart: u32,
    l: u32,
    cartorder: &CartOrder,
    csphase: bool,
    pureorder: &PureOrder,
) -> Result<Array2<f64>, anyhow::Error> {
    let upmatdagger = sh_r2c_mat(l, csphase, pureorder)?;
    let umat = sh_cl2cart_mat(lcart, l, cartorder, csphase, pureorder)?;
    let wmat = umat.dot(&upmatdagger);
    ensure!(
        wmat.iter()
            .all(|x| approx::relative_eq!(x.im, 0.0, max_relative = 1e-7, epsilon = 1e-7)),
        "The Cartesian-to-real-solid-harmonic matrix for l = {l} is not entirely real."
    );
    Ok(wmat.map(|x| x.re))
}
