use approx;
use itertools::Itertools;
use ndarray::{array, Array2};
use num::Complex;
use num_traits::{One, Zero};

use crate::angmom::sh_conversion::{
    cart_overlap_mat, complexc, norm_cart_gaussian, norm_sph_gaussian, sh_c2r_mat,
    sh_cl2cart_mat, sh_r2c_mat, sh_rl2cart_mat,
};
use crate::basis::ao::{CartOrder, PureOrder};

type C128 = Complex<f64>;

#[test]
fn test_sh_conversion_norm_cart_gaussian() {
    // s primitive: (2 alpha / pi)^{3/4}
    let alpha = 0.8;
    approx::assert_relative_eq!(
        norm_cart_gaussian((0, 0, 0), alpha).unwrap(),
        (2.0 * alpha / std::f64::consts::PI).powf(0.75),
        max_relative = 1e-14
    );

    // p primitive: (128 alpha^5 / pi^3)^{1/4}
    approx::assert_relative_eq!(
        norm_cart_gaussian((0, 1, 0), alpha).unwrap(),
        (128.0 * alpha.powi(5) / std::f64::consts::PI.powi(3)).powf(0.25),
        max_relative = 1e-14
    );

    // The s solid harmonic Gaussian carries the extra 1/sqrt(4 pi) of Y_0^0.
    approx::assert_relative_eq!(
        norm_sph_gaussian(0, alpha).unwrap() / (4.0 * std::f64::consts::PI).sqrt(),
        norm_cart_gaussian((0, 0, 0), alpha).unwrap(),
        max_relative = 1e-14
    );
}

#[test]
fn test_sh_conversion_complexc() {
    // =====
    // l = 0
    // =====
    for lcartqns in (0..=8).combinations_with_replacement(3) {
        let (lx, ly, lz) = (lcartqns[0], lcartqns[1], lcartqns[2]);
        let c = complexc((0, 0), (lx, ly, lz), true).unwrap();
        if lx == 0 && ly == 0 && lz == 0 {
            assert!((c - C128::one()).norm() < 1e-14);
        } else if lx % 2 != 0 || ly % 2 != 0 || lz % 2 != 0 {
            assert!(c.norm() < 1e-14);
        } else {
            assert!(c.norm() >= 1e-14);
        }
    }

    let ntilde_2 = norm_sph_gaussian(2, 1.0).unwrap();
    let n_200 = norm_cart_gaussian((2, 0, 0), 1.0).unwrap();
    let complexc_00_200_ref = ntilde_2 / (n_200 * (4.0 * std::f64::consts::PI).sqrt());
    for lcartqns in [(2, 0, 0), (0, 2, 0), (0, 0, 2)] {
        assert!((complexc((0, 0), lcartqns, true).unwrap() - complexc_00_200_ref).norm() < 1e-14);
    }

    // =====
    // l = 1
    // =====
    assert!((complexc((1, 0), (0, 0, 1), true).unwrap() - C128::one()).norm() < 1e-14);
    assert!(
        (complexc((1, 1), (1, 0, 0), true).unwrap() - C128::new(-1.0 / 2.0f64.sqrt(), 0.0))
            .norm()
            < 1e-14
    );
    assert!(
        (complexc((1, 1), (0, 1, 0), true).unwrap() - C128::new(0.0, -1.0 / 2.0f64.sqrt()))
            .norm()
            < 1e-14
    );
    assert!(
        (complexc((1, -1), (1, 0, 0), true).unwrap() - C128::new(1.0 / 2.0f64.sqrt(), 0.0))
            .norm()
            < 1e-14
    );
    assert!(
        (complexc((1, -1), (0, 1, 0), true).unwrap() - C128::new(0.0, -1.0 / 2.0f64.sqrt()))
            .norm()
            < 1e-14
    );

    // Without the Condon--Shortley phase, m = +1 flips sign.
    assert!(
        (complexc((1, 1), (1, 0, 0), false).unwrap() - C128::new(1.0 / 2.0f64.sqrt(), 0.0))
            .norm()
            < 1e-14
    );

    // Parity mismatch between l and lcart.
    for m in -1..=1 {
        assert!(complexc((1, m), (1, 1, 0), true).unwrap().norm() < 1e-14);
    }

    assert!(complexc((1, 2), (1, 0, 0), true).is_err());
}

#[test]
fn test_sh_conversion_c2r() {
    let sq2 = 2.0f64.sqrt();

    let c2r0 = sh_c2r_mat(0, true, &PureOrder::increasingm(0)).unwrap();
    assert_eq!(c2r0.shape(), &[1, 1]);
    assert_eq!(c2r0[(0, 0)], C128::from(1.0));

    let c2r1 = sh_c2r_mat(1, true, &PureOrder::increasingm(1)).unwrap();
    let c2r1_ref = array![
        [
            C128::new(0.0, -1.0 / sq2),
            C128::zero(),
            C128::new(0.0, -1.0 / sq2)
        ],
        [C128::zero(), C128::one(), C128::zero()],
        [
            C128::new(1.0 / sq2, 0.0),
            C128::zero(),
            C128::new(-1.0 / sq2, 0.0)
        ],
    ];
    assert_eq!(c2r1, c2r1_ref);

    let c2r1_decreasingm = sh_c2r_mat(1, true, &PureOrder::decreasingm(1)).unwrap();
    let c2r1_decreasingm_ref = array![
        [
            C128::new(-1.0 / sq2, 0.0),
            C128::zero(),
            C128::new(1.0 / sq2, 0.0)
        ],
        [C128::zero(), C128::one(), C128::zero()],
        [
            C128::new(0.0, -1.0 / sq2),
            C128::zero(),
            C128::new(0.0, -1.0 / sq2)
        ],
    ];
    assert_eq!(c2r1_decreasingm, c2r1_decreasingm_ref);

    assert!(sh_c2r_mat(2, true, &PureOrder::increasingm(1)).is_err());
}

#[test]
fn test_sh_conversion_r2c_is_inverse_of_c2r() {
    for l in 0..=4 {
        let po = PureOrder::increasingm(l);
        let c2r = sh_c2r_mat(l, true, &po).unwrap();
        let r2c = sh_r2c_mat(l, true, &po).unwrap();
        let prod = c2r.dot(&r2c);
        let n = po.ncomps();
        let diff = (&prod - &Array2::<C128>::eye(n))
            .iter()
            .map(|x| x.norm_sqr())
            .sum::<f64>()
            .sqrt();
        approx::assert_abs_diff_eq!(diff, 0.0, epsilon = 1e-14);
    }
}

#[test]
fn test_sh_conversion_cl2cart() {
    let umat11 = sh_cl2cart_mat(1, 1, &CartOrder::lex(1), true, &PureOrder::increasingm(1)).unwrap();
    assert_eq!(umat11.shape(), &[3, 3]);
    let sq2 = 2.0f64.sqrt();
    let umat11_ref = array![
        [C128::new(1.0 / sq2, 0.0), C128::zero(), C128::new(-1.0 / sq2, 0.0)],
        [C128::new(0.0, -1.0 / sq2), C128::zero(), C128::new(0.0, -1.0 / sq2)],
        [C128::zero(), C128::one(), C128::zero()],
    ];
    let diff = (&umat11 - &umat11_ref)
        .iter()
        .map(|x| x.norm_sqr())
        .sum::<f64>()
        .sqrt();
    approx::assert_abs_diff_eq!(diff, 0.0, epsilon = 1e-14);

    assert!(sh_cl2cart_mat(2, 1, &CartOrder::lex(1), true, &PureOrder::increasingm(1)).is_err());
}

#[test]
fn test_sh_conversion_rl2cart() {
    let wmat00 =
        sh_rl2cart_mat(0, 0, &CartOrder::lex(0), true, &PureOrder::increasingm(0)).unwrap();
    assert_eq!(wmat00.shape(), &[1, 1]);
    approx::assert_relative_eq!(wmat00[(0, 0)], 1.0, max_relative = 1e-14);

    let wmat11 =
        sh_rl2cart_mat(1, 1, &CartOrder::lex(1), true, &PureOrder::increasingm(1)).unwrap();
    let wmat11_ref = array![[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    approx::assert_abs_diff_eq!(
        (&wmat11 - &wmat11_ref).map(|x| x * x).sum().sqrt(),
        0.0,
        epsilon = 1e-14
    );

    let wmat22 =
        sh_rl2cart_mat(2, 2, &CartOrder::lex(2), true, &PureOrder::increasingm(2)).unwrap();
    assert_eq!(wmat22.shape(), &[6, 5]);
    let wmat22_ref = array![
        [0.0, 0.0, -0.5, 0.0, 3.0f64.sqrt() / 2.0],
        [1.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, -0.5, 0.0, -3.0f64.sqrt() / 2.0],
        [0.0, 1.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0, 0.0],
    ];
    approx::assert_abs_diff_eq!(
        (&wmat22 - &wmat22_ref).map(|x| x * x).sum().sqrt(),
        0.0,
        epsilon = 1e-14
    );

    // Non-lexicographic orders are row and column selections of the lex/increasing-m matrix.
    let wmat22_qchem_dec =
        sh_rl2cart_mat(2, 2, &CartOrder::qchem(2), true, &PureOrder::decreasingm(2)).unwrap();
    let wmat22_selected = wmat22_ref
        .select(ndarray::Axis(0), &CartOrder::qchem(2).indices_in_lex())
        .select(
            ndarray::Axis(1),
            &PureOrder::decreasingm(2).indices_in_increasingm(),
        );
    approx::assert_abs_diff_eq!(
        (&wmat22_qchem_dec - &wmat22_selected)
            .map(|x| x * x)
            .sum()
            .sqrt(),
        0.0,
        epsilon = 1e-14
    );
}

#[test]
fn test_sh_conversion_rl2cart_orthonormal() {
    // Real solid harmonics built from normalised Cartesians must themselves be orthonormal.
    for l in 0..=6 {
        let co = CartOrder::lex(l);
        let wmat = sh_rl2cart_mat(l, l, &co, true, &PureOrder::increasingm(l)).unwrap();
        let smat = cart_overlap_mat(&co).unwrap();
        let n = 2 * l as usize + 1;
        let pure_ov = wmat.t().dot(&smat).dot(&wmat);
        approx::assert_abs_diff_eq!(
            (&pure_ov - &Array2::<f64>::eye(n))
                .map(|x| x * x)
                .sum()
                .sqrt(),
            0.0,
            epsilon = 1e-10
        );
    }
}
