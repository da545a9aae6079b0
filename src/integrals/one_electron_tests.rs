use std::f64::consts::PI;

use approx;
use nalgebra::Point3;
use ndarray::{array, Array1, Array2, Axis};
use proptest::prelude::*;
use serial_test::serial;

use crate::auxiliary::atom::PointCharge;
use crate::auxiliary::molecule::Molecule;
use crate::basis::ao::BasisShell;
use crate::basis::basis_set::BasisSet;
use crate::basis::shell::Shell;
use crate::integrals::one_electron::{
    core_hamiltonian, kinetic, moment_orders, nuclear_attraction, overlap, OneElectronOperator,
};

const ROOT: &str = env!("CARGO_MANIFEST_DIR");

fn water() -> (Molecule, BasisSet, BasisSet) {
    let mol = Molecule::from_xyz(format!("{ROOT}/tests/xyz/h2o.xyz"), true).unwrap();
    let path = format!("{ROOT}/tests/basis/sto-3g.yaml");
    let cart = BasisSet::from_file(&path, &mol, true, true).unwrap();
    let pure = BasisSet::from_file(&path, &mol, false, true).unwrap();
    (mol, cart, pure)
}

fn shell(l: u32, cart: bool, centre: Point3<f64>, exponents: &[f64], coeffs: &[f64]) -> Shell {
    Shell::new(
        BasisShell::standard(l, cart).unwrap(),
        centre,
        Array1::from(exponents.to_vec()),
        Array2::from_shape_vec((coeffs.len(), 1), coeffs.to_vec()).unwrap(),
        true,
    )
    .unwrap()
}

fn assert_symmetric(mat: &Array2<f64>, sign: f64) {
    for i in 0..mat.nrows() {
        for j in 0..mat.ncols() {
            approx::assert_abs_diff_eq!(mat[(i, j)], sign * mat[(j, i)], epsilon = 1e-12);
        }
    }
}

#[test]
#[serial]
fn test_one_electron_water_sto3g_reference() {
    let (mol, cart, _) = water();
    // Cartesian order: O 1s, O 2s, O 2px, O 2py, O 2pz, H1 1s, H2 1s.
    let smat = overlap(&cart).unwrap();
    assert_eq!(smat.dim(), (7, 7));
    for i in 0..7 {
        approx::assert_relative_eq!(smat[(i, i)], 1.0, max_relative = 1e-12);
    }
    approx::assert_relative_eq!(smat[(0, 1)], 0.236703936511, max_relative = 1e-9);
    approx::assert_relative_eq!(smat[(0, 5)], 0.038405599786, max_relative = 1e-9);
    approx::assert_relative_eq!(smat[(2, 5)], 0.268438243716, max_relative = 1e-9);
    approx::assert_relative_eq!(smat[(2, 6)], -0.268438243716, max_relative = 1e-9);
    approx::assert_relative_eq!(smat[(3, 6)], 0.209726941420, max_relative = 1e-9);
    approx::assert_relative_eq!(smat[(5, 6)], 0.181759886298, max_relative = 1e-9);
    approx::assert_abs_diff_eq!(smat[(4, 5)], 0.0, epsilon = 1e-14);
    assert_symmetric(&smat, 1.0);

    let tmat = kinetic(&cart).unwrap();
    approx::assert_relative_eq!(tmat[(0, 0)], 29.003199945540, max_relative = 1e-9);
    approx::assert_relative_eq!(tmat[(0, 1)], -0.168010939316, max_relative = 1e-9);
    approx::assert_relative_eq!(tmat[(2, 2)], 2.528731198195, max_relative = 1e-9);
    approx::assert_relative_eq!(tmat[(3, 5)], 0.114920016354, max_relative = 1e-9);
    approx::assert_relative_eq!(tmat[(5, 6)], -0.003979868622, max_relative = 1e-8);
    assert_symmetric(&tmat, 1.0);

    let vmat = nuclear_attraction(&cart, &mol).unwrap();
    approx::assert_relative_eq!(vmat[(0, 0)], -61.580595358150, max_relative = 1e-9);
    approx::assert_relative_eq!(vmat[(0, 3)], -0.014473835903, max_relative = 1e-8);
    approx::assert_relative_eq!(vmat[(1, 1)], -10.009071226860, max_relative = 1e-9);
    approx::assert_relative_eq!(vmat[(2, 6)], 1.822241058023, max_relative = 1e-9);
    approx::assert_relative_eq!(vmat[(4, 4)], -9.875876065926, max_relative = 1e-9);
    approx::assert_relative_eq!(vmat[(5, 5)], -5.300202953840, max_relative = 1e-9);
    assert_symmetric(&vmat, 1.0);

    let hmat = core_hamiltonian(&cart, &mol).unwrap();
    for ((h, t), v) in hmat.iter().zip(tmat.iter()).zip(vmat.iter()) {
        approx::assert_relative_eq!(*h, t + v, max_relative = 1e-14, epsilon = 1e-14);
    }
}

#[test]
#[serial]
fn test_one_electron_pure_ordering() {
    let (_, cart, pure) = water();
    let s_cart = overlap(&cart).unwrap();
    let s_pure = overlap(&pure).unwrap();
    // Increasing m for l = 1: p-1 = y, p0 = z, p+1 = x.
    let cart_of_pure = [0, 1, 3, 4, 2, 5, 6];
    for (i, ci) in cart_of_pure.iter().enumerate() {
        for (j, cj) in cart_of_pure.iter().enumerate() {
            approx::assert_relative_eq!(
                s_pure[(i, j)],
                s_cart[(*ci, *cj)],
                max_relative = 1e-12,
                epsilon = 1e-14
            );
        }
    }
}

#[test]
#[serial]
fn test_one_electron_point_charges_at_nuclei() {
    let (mol, cart, pure) = water();
    for basis in [&cart, &pure] {
        let vmat = nuclear_attraction(basis, &mol).unwrap();
        let per_charge = OneElectronOperator::PointCharges {
            charges: mol.point_charges(),
        }
        .evaluate(basis)
        .unwrap();
        assert_eq!(per_charge.dim(), (7, 7, 3));
        let summed = per_charge.sum_axis(Axis(2));
        for (v, s) in vmat.iter().zip(summed.iter()) {
            approx::assert_relative_eq!(*v, *s, max_relative = 1e-12, epsilon = 1e-13);
        }
    }

    // A charge of opposite sign repels.
    let s_shell = shell(0, false, Point3::origin(), &[1.0], &[1.0]);
    let basis = BasisSet::new(vec![s_shell]);
    let v = OneElectronOperator::PointCharges {
        charges: vec![
            PointCharge::new(Point3::new(0.0, 0.0, 1.0), 1.0),
            PointCharge::new(Point3::new(0.0, 0.0, 1.0), -2.0),
        ],
    }
    .evaluate(&basis)
    .unwrap();
    assert!(v[(0, 0, 0)] < 0.0);
    approx::assert_relative_eq!(v[(0, 0, 1)], -2.0 * v[(0, 0, 0)], max_relative = 1e-14);
}

#[test]
fn test_one_electron_two_s_gaussians_analytic() {
    let (a, b): (f64, f64) = (0.9, 0.35);
    let centre_a = Point3::new(0.1, -0.2, 0.3);
    let centre_b = Point3::new(-0.8, 0.4, 1.1);
    let basis = BasisSet::new(vec![
        shell(0, true, centre_a, &[a], &[1.0]),
        shell(0, true, centre_b, &[b], &[1.0]),
    ]);
    let smat = overlap(&basis).unwrap();
    let r2 = (centre_a - centre_b).norm_squared();
    let analytic = (2.0 * (a * b).sqrt() / (a + b)).powf(1.5) * (-a * b / (a + b) * r2).exp();
    approx::assert_relative_eq!(smat[(0, 1)], analytic, epsilon = 1e-10);
    approx::assert_relative_eq!(smat[(1, 0)], analytic, epsilon = 1e-10);
}

#[test]
#[serial]
fn test_one_electron_two_basis_mode() {
    let (mol, cart, pure) = water();
    for op in [
        OneElectronOperator::Overlap,
        OneElectronOperator::Kinetic,
        OneElectronOperator::nuclear_attraction(&mol),
    ] {
        let symmetric = op.evaluate(&pure).unwrap();
        let asymmetric = op.evaluate_two_basis(&pure, &pure).unwrap();
        for (x, y) in symmetric.iter().zip(asymmetric.iter()) {
            approx::assert_relative_eq!(*x, *y, max_relative = 1e-12, epsilon = 1e-13);
        }
    }

    // Mixed pure and Cartesian bases: rectangular and consistent with the single-basis blocks.
    let mixed = OneElectronOperator::Overlap
        .evaluate_two_basis(&cart, &pure)
        .unwrap();
    assert_eq!(mixed.dim(), (7, 7, 1));
    approx::assert_relative_eq!(mixed[(2, 4, 0)], 1.0, max_relative = 1e-12);
    approx::assert_relative_eq!(mixed[(3, 2, 0)], 1.0, max_relative = 1e-12);

    let h_only = BasisSet::new(vec![shell(
        2,
        false,
        Point3::new(0.0, 0.0, 1.0),
        &[0.7],
        &[1.0],
    )]);
    let rect = OneElectronOperator::Overlap
        .evaluate_two_basis(&pure, &h_only)
        .unwrap();
    assert_eq!(rect.dim(), (7, 5, 1));
}

#[test]
fn test_one_electron_kinetic_from_second_derivatives() {
    let basis = BasisSet::new(vec![
        shell(2, false, Point3::new(0.0, 0.3, -0.2), &[1.3, 0.4], &[0.6, 0.5]),
        shell(1, true, Point3::new(0.5, -0.1, 0.7), &[0.9], &[1.0]),
        shell(3, false, Point3::new(-0.4, 0.0, 0.2), &[0.6], &[1.0]),
    ]);
    let tmat = kinetic(&basis).unwrap();
    let d2 = OneElectronOperator::Differential {
        orders: vec![(2, 0, 0), (0, 2, 0), (0, 0, 2)],
    }
    .evaluate(&basis)
    .unwrap();
    let from_laplacian = d2.sum_axis(Axis(2)) * -0.5;
    for (t, l) in tmat.iter().zip(from_laplacian.iter()) {
        approx::assert_relative_eq!(*t, *l, max_relative = 1e-10, epsilon = 1e-12);
    }
    assert_symmetric(&tmat, 1.0);
}

#[test]
fn test_one_electron_first_derivative_antisymmetric() {
    let centre_b = Point3::new(0.5, -0.1, 0.7);
    let shell_a = shell(1, false, Point3::new(0.0, 0.3, -0.2), &[1.3, 0.4], &[0.6, 0.5]);
    let shell_b = shell(2, false, centre_b, &[0.9], &[1.0]);
    let basis = BasisSet::new(vec![shell_a.clone(), shell_b.clone()]);
    let orders = vec![(1, 0, 0), (0, 1, 0), (0, 0, 1)];
    let dmat = OneElectronOperator::Differential {
        orders: orders.clone(),
    }
    .evaluate(&basis)
    .unwrap();
    for comp in 0..3 {
        assert_symmetric(&dmat.index_axis(Axis(2), comp).to_owned(), -1.0);
    }

    // <a|d/dx_k|b> = -d<a|b>/dB_k
    let h = 1e-5;
    let basis_a = BasisSet::new(vec![shell_a]);
    for (k, _) in orders.iter().enumerate() {
        let mut plus = centre_b;
        plus[k] += h;
        let mut minus = centre_b;
        minus[k] -= h;
        let s_plus = overlap_two(&basis_a, &shell_b.with_centre(plus));
        let s_minus = overlap_two(&basis_a, &shell_b.with_centre(minus));
        let fd = (s_plus - s_minus) / (2.0 * h);
        for i in 0..3 {
            for j in 0..5 {
                approx::assert_abs_diff_eq!(dmat[(i, 3 + j, k)], -fd[(i, j)], epsilon = 1e-7);
            }
        }
    }
}

fn overlap_two(basis_a: &BasisSet, shell_b: &Shell) -> Array2<f64> {
    OneElectronOperator::Overlap
        .evaluate_two_basis(basis_a, &BasisSet::new(vec![shell_b.clone()]))
        .unwrap()
        .index_axis_move(Axis(2), 0)
}

#[test]
fn test_one_electron_moments() {
    let alpha = 0.8;
    let centre = Point3::new(0.2, -0.5, 1.0);
    let basis = BasisSet::new(vec![shell(0, false, centre, &[alpha], &[1.0])]);
    let moments = OneElectronOperator::moments_up_to(centre, 2)
        .evaluate(&basis)
        .unwrap();
    assert_eq!(moment_orders(2).len(), 10);
    assert_eq!(moments.dim(), (1, 1, 10));
    approx::assert_relative_eq!(moments[(0, 0, 0)], 1.0, max_relative = 1e-12);
    for k in 1..4 {
        approx::assert_abs_diff_eq!(moments[(0, 0, k)], 0.0, epsilon = 1e-14);
    }
    // Orders 2: xx, xy, xz, yy, yz, zz.
    let second = moments[(0, 0, 4)] + moments[(0, 0, 7)] + moments[(0, 0, 9)];
    approx::assert_relative_eq!(second, 3.0 / (4.0 * alpha), max_relative = 1e-12);
    approx::assert_abs_diff_eq!(moments[(0, 0, 5)], 0.0, epsilon = 1e-14);

    // Dipoles about another origin shift by the origin displacement.
    let origin = Point3::origin();
    let shifted = OneElectronOperator::Moment {
        origin,
        orders: vec![(1, 0, 0), (0, 1, 0), (0, 0, 1)],
    }
    .evaluate(&basis)
    .unwrap();
    for k in 0..3 {
        approx::assert_relative_eq!(shifted[(0, 0, k)], centre[k], max_relative = 1e-12);
    }
}

#[test]
#[serial]
fn test_one_electron_zeroth_moment_is_overlap() {
    let (_, _, pure) = water();
    let smat = overlap(&pure).unwrap();
    let m0 = OneElectronOperator::Moment {
        origin: Point3::new(1.0, 2.0, 3.0),
        orders: vec![(0, 0, 0)],
    }
    .evaluate(&pure)
    .unwrap();
    for (s, m) in smat.iter().zip(m0.iter()) {
        approx::assert_relative_eq!(*s, *m, max_relative = 1e-12, epsilon = 1e-14);
    }
    assert_eq!(
        moment_orders(1),
        vec![(0, 0, 0), (1, 0, 0), (0, 1, 0), (0, 0, 1)]
    );
}

#[test]
fn test_one_electron_angular_momentum() {
    let centre = Point3::new(0.3, 0.1, -0.4);
    let basis = BasisSet::new(vec![
        shell(1, true, centre, &[0.7, 0.2], &[0.5, 0.6]),
        shell(0, true, Point3::new(0.0, 1.0, 0.0), &[0.5], &[1.0]),
    ]);
    let lmat = OneElectronOperator::AngularMomentum { origin: centre }
        .evaluate(&basis)
        .unwrap();
    assert_eq!(lmat.dim(), (4, 4, 3));
    for comp in 0..3 {
        assert_symmetric(&lmat.index_axis(Axis(2), comp).to_owned(), -1.0);
    }
    // (x d/dy - y d/dx) p_y = p_x about the shell centre.
    approx::assert_relative_eq!(lmat[(0, 1, 2)], 1.0, max_relative = 1e-12);
    approx::assert_relative_eq!(lmat[(1, 0, 2)], -1.0, max_relative = 1e-12);
    // (y d/dz - z d/dy) p_z = p_y, (z d/dx - x d/dz) p_x = p_z.
    approx::assert_relative_eq!(lmat[(1, 2, 0)], 1.0, max_relative = 1e-12);
    approx::assert_relative_eq!(lmat[(2, 0, 1)], 1.0, max_relative = 1e-12);
    approx::assert_abs_diff_eq!(lmat[(0, 0, 2)], 0.0, epsilon = 1e-14);
}

#[test]
fn test_one_electron_generalised_contraction_matches_split_shells() {
    let centre = Point3::new(0.0, 0.2, 0.1);
    let exps = array![1.5, 0.5];
    let coeffs = array![[0.7, 0.1], [0.4, 0.9]];
    let general = Shell::new(
        BasisShell::standard(2, false).unwrap(),
        centre,
        exps.clone(),
        coeffs.clone(),
        true,
    )
    .unwrap();
    let split = (0..2)
        .map(|m| {
            Shell::new(
                BasisShell::standard(2, false).unwrap(),
                centre,
                exps.clone(),
                coeffs.slice(ndarray::s![.., m..m + 1]).to_owned(),
                true,
            )
            .unwrap()
        })
        .collect::<Vec<_>>();
    let other = shell(1, false, Point3::new(1.0, 0.0, 0.0), &[0.6], &[1.0]);

    let s_general = overlap(&BasisSet::new(vec![general, other.clone()])).unwrap();
    let mut split_shells = split;
    split_shells.push(other);
    let s_split = overlap(&BasisSet::new(split_shells)).unwrap();
    assert_eq!(s_general.dim(), (13, 13));
    for (g, s) in s_general.iter().zip(s_split.iter()) {
        approx::assert_relative_eq!(*g, *s, max_relative = 1e-12, epsilon = 1e-14);
    }
    for i in 0..10 {
        approx::assert_relative_eq!(s_general[(i, i)], 1.0, max_relative = 1e-12);
    }
}

#[test]
fn test_one_electron_empty_orders() {
    let basis = BasisSet::new(vec![shell(0, true, Point3::origin(), &[1.0], &[1.0])]);
    assert!(OneElectronOperator::Differential { orders: vec![] }
        .evaluate(&basis)
        .is_err());
    assert!(OneElectronOperator::Moment {
        origin: Point3::origin(),
        orders: vec![]
    }
    .evaluate(&basis)
    .is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn test_one_electron_random_geometry_symmetry(
        ax in -1.5f64..1.5, ay in -1.5f64..1.5, az in -1.5f64..1.5,
        bx in -1.5f64..1.5, by in -1.5f64..1.5, bz in -1.5f64..1.5,
        alpha in 0.1f64..5.0, beta in 0.1f64..5.0,
    ) {
        let basis = BasisSet::new(vec![
            shell(2, false, Point3::new(ax, ay, az), &[alpha, 2.0 * alpha], &[0.5, 0.5]),
            shell(1, true, Point3::new(bx, by, bz), &[beta], &[1.0]),
        ]);
        let charges = vec![PointCharge::new(Point3::new(0.1, 0.2, 0.3), 2.0)];
        let smat = overlap(&basis).unwrap();
        let tmat = kinetic(&basis).unwrap();
        let vmat = OneElectronOperator::NuclearAttraction { nuclei: charges }
            .evaluate(&basis)
            .unwrap()
            .index_axis_move(Axis(2), 0);
        for i in 0..smat.nrows() {
            prop_assert!((smat[(i, i)] - 1.0).abs() < 1e-10);
            prop_assert!(tmat[(i, i)] > 0.0);
            prop_assert!(vmat[(i, i)] < 0.0);
            for j in 0..smat.ncols() {
                prop_assert!((smat[(i, j)] - smat[(j, i)]).abs() < 1e-12);
                prop_assert!(smat[(i, j)].abs() <= 1.0 + 1e-10);
            }
        }
    }
}

/// $`\Gamma(l + 3/2)`$.
fn gamma_half_integer(l: u32) -> f64 {
    (0..=l).fold(PI.sqrt(), |acc, k| acc * (f64::from(k) + 0.5))
}

#[test]
fn test_one_electron_self_overlap_all_angular_momenta() {
    let centre = Point3::new(0.2, -0.3, 0.1);
    for l in 0..=6 {
        for cart in [true, false] {
            let basis = BasisSet::new(vec![shell(l, cart, centre, &[2.3, 0.6], &[0.35, 0.8])]);
            let smat = overlap(&basis).unwrap();
            for ((i, j), value) in smat.indexed_iter() {
                if i == j {
                    approx::assert_relative_eq!(*value, 1.0, max_relative = 1e-12);
                } else if !cart {
                    approx::assert_abs_diff_eq!(*value, 0.0, epsilon = 1e-12);
                }
            }
            assert_symmetric(&smat, 1.0);
        }
    }
}

#[test]
fn test_one_electron_kinetic_and_attraction_all_angular_momenta() {
    // For a normalised r^l Y_lm exp(-alpha r^2): <T> = alpha (2l + 3) / 2 and
    // <1/r> = sqrt(2 alpha) l! / Gamma(l + 3/2).
    let alpha = 0.9;
    let centre = Point3::new(-0.4, 0.1, 0.25);
    for l in 0..=6 {
        let basis = BasisSet::new(vec![shell(l, false, centre, &[alpha], &[1.0])]);
        let tmat = kinetic(&basis).unwrap();
        let vmat = OneElectronOperator::PointCharges {
            charges: vec![PointCharge::new(centre, 1.0)],
        }
        .evaluate(&basis)
        .unwrap();
        let l_factorial = (1..=l).map(f64::from).product::<f64>();
        let expected_t = alpha * f64::from(2 * l + 3) / 2.0;
        let expected_v = -(2.0 * alpha).sqrt() * l_factorial / gamma_half_integer(l);
        for ((i, j), value) in tmat.indexed_iter() {
            if i == j {
                approx::assert_relative_eq!(*value, expected_t, max_relative = 1e-11);
                approx::assert_relative_eq!(vmat[(i, j, 0)], expected_v, max_relative = 1e-11);
            } else {
                approx::assert_abs_diff_eq!(*value, 0.0, epsilon = 1e-11);
                approx::assert_abs_diff_eq!(vmat[(i, j, 0)], 0.0, epsilon = 1e-11);
            }
        }
    }
}
