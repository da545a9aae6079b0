use approx;
use nalgebra::Point3;
use ndarray::{array, s, Array1, Array2, Axis};
use serial_test::serial;

use crate::auxiliary::molecule::Molecule;
use crate::basis::ao::BasisShell;
use crate::basis::basis_set::BasisSet;
use crate::basis::shell::Shell;
use crate::errors::IntegralError;
use crate::integrals::electron_repulsion::{electron_repulsion, EriNotation};
use crate::integrals::one_electron::{overlap, OneElectronOperator};
use crate::transform::{orthonormalising_coefficients, BasisTransform};

const ROOT: &str = env!("CARGO_MANIFEST_DIR");

fn water() -> BasisSet {
    let mol = Molecule::from_xyz(format!("{ROOT}/tests/xyz/h2o.xyz"), true).unwrap();
    BasisSet::from_file(format!("{ROOT}/tests/basis/sto-3g.yaml"), &mol, false, true).unwrap()
}

fn is_dimension_mismatch(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<IntegralError>(),
        Some(IntegralError::DimensionMismatch(_))
    )
}

#[test]
#[serial]
fn test_transform_orthonormalisation() {
    let basis = water();
    let smat = overlap(&basis).unwrap();
    let c = orthonormalising_coefficients(&smat, 1e-8).unwrap();
    assert_eq!(c.dim(), (7, 7));
    let s_orth = BasisTransform::symmetric(&c, 2).apply_matrix(&smat).unwrap();
    for ((i, j), value) in s_orth.indexed_iter() {
        let expected = if i == j { 1.0 } else { 0.0 };
        approx::assert_abs_diff_eq!(*value, expected, epsilon = 1e-10);
    }
    // Columns follow decreasing overlap eigenvalues, so their norms increase.
    let norms = c
        .axis_iter(Axis(1))
        .map(|col| col.dot(&col))
        .collect::<Vec<_>>();
    assert!(norms.windows(2).all(|w| w[0] <= w[1] + 1e-12));
}

#[test]
#[serial]
fn test_transform_one_electron_components() {
    let basis = water();
    let smat = overlap(&basis).unwrap();
    let c = orthonormalising_coefficients(&smat, 1e-8).unwrap();
    let c_occ = c.slice(s![.., 0..3]).to_owned();
    let dipoles = OneElectronOperator::moments_up_to(Point3::origin(), 1)
        .evaluate(&basis)
        .unwrap();
    let transformed = BasisTransform::symmetric(&c_occ, 2)
        .apply_one_electron(&dipoles)
        .unwrap();
    assert_eq!(transformed.dim(), (3, 3, 4));
    for k in 0..4 {
        let expected = c_occ
            .t()
            .dot(&dipoles.index_axis(Axis(2), k))
            .dot(&c_occ);
        for (x, y) in transformed.index_axis(Axis(2), k).iter().zip(expected.iter()) {
            approx::assert_relative_eq!(*x, *y, max_relative = 1e-10, epsilon = 1e-12);
        }
    }
}

#[test]
#[serial]
fn test_transform_two_basis_and_partial() {
    let basis = water();
    let smat = overlap(&basis).unwrap();
    let c_a = Array2::from_shape_fn((7, 3), |(i, j)| ((i + 2 * j) as f64 * 0.37).sin());
    let c_b = Array2::from_shape_fn((7, 2), |(i, j)| ((3 * i + j) as f64 * 0.11).cos());

    let rect = BasisTransform::two_basis(&c_a, &c_b)
        .apply_matrix(&smat)
        .unwrap();
    let expected = c_a.t().dot(&smat).dot(&c_b);
    assert_eq!(rect.dim(), (3, 2));
    for (x, y) in rect.iter().zip(expected.iter()) {
        approx::assert_relative_eq!(*x, *y, max_relative = 1e-12, epsilon = 1e-14);
    }

    let ket_only = BasisTransform::new(vec![None, Some(c_b.clone())])
        .apply_matrix(&smat)
        .unwrap();
    let expected = smat.dot(&c_b);
    assert_eq!(ket_only.dim(), (7, 2));
    for (x, y) in ket_only.iter().zip(expected.iter()) {
        approx::assert_relative_eq!(*x, *y, max_relative = 1e-12, epsilon = 1e-14);
    }

    let unchanged = BasisTransform::new(vec![]).apply_matrix(&smat).unwrap();
    assert_eq!(unchanged, smat);
}

#[test]
#[serial]
fn test_transform_electron_repulsion() {
    let basis = water();
    let eri = electron_repulsion(&basis, EriNotation::Chemist).unwrap();
    let c = Array2::from_shape_fn((7, 2), |(i, j)| 0.1 * (i as f64) - 0.2 * (j as f64) + 0.3);
    let mo = BasisTransform::symmetric(&c, 4)
        .apply_electron_repulsion(&eri)
        .unwrap();
    assert_eq!(mo.dim(), (2, 2, 2, 2));
    for (p, q, r, t) in [(0, 0, 0, 0), (0, 1, 0, 1), (1, 0, 1, 1), (1, 1, 0, 0)] {
        let mut expected = 0.0;
        for ((mu, nu, lambda, sigma), value) in eri.indexed_iter() {
            expected += c[(mu, p)] * c[(nu, q)] * c[(lambda, r)] * c[(sigma, t)] * value;
        }
        approx::assert_relative_eq!(mo[(p, q, r, t)], expected, max_relative = 1e-10);
    }
    approx::assert_relative_eq!(mo[(0, 1, 0, 0)], mo[(1, 0, 0, 0)], max_relative = 1e-12);
}

#[test]
fn test_transform_errors() {
    let smat = array![[1.0, 0.2], [0.2, 1.0]];
    let c_wrong = Array2::<f64>::eye(3);
    let err = BasisTransform::symmetric(&c_wrong, 2)
        .apply_matrix(&smat)
        .unwrap_err();
    assert!(is_dimension_mismatch(&err));

    let c = Array2::<f64>::eye(2);
    let err = BasisTransform::symmetric(&c, 3)
        .apply_matrix(&smat)
        .unwrap_err();
    assert!(is_dimension_mismatch(&err));

    let err = orthonormalising_coefficients(&Array2::zeros((2, 3)), 1e-8).unwrap_err();
    assert!(is_dimension_mismatch(&err));

    // Two identical functions are linearly dependent.
    let s_shell = Shell::new(
        BasisShell::standard(0, false).unwrap(),
        Point3::origin(),
        Array1::from(vec![1.0]),
        array![[1.0]],
        true,
    )
    .unwrap();
    let dependent = overlap(&BasisSet::new(vec![s_shell.clone(), s_shell])).unwrap();
    let err = orthonormalising_coefficients(&dependent, 1e-8).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<IntegralError>(),
        Some(IntegralError::NumericalInstability(_))
    ));
}
