use std::f64::consts::PI;

use approx;
use nalgebra::Point3;
use ndarray::{array, Array1, Array2};

use crate::angmom::spherical::solid_harmonic_matrix;
use crate::basis::ao::{BasisShell, CartOrder, ShellOrder};
use crate::basis::basis_set::BasisSet;
use crate::basis::eval::{cubic_grid, evaluate_basis, evaluate_basis_centre_gradient, grid_overlap};
use crate::basis::shell::Shell;
use crate::integrals::one_electron::overlap;

fn shell(basis_shell: BasisShell, centre: Point3<f64>, exponents: &[f64], coeffs: &[f64]) -> Shell {
    Shell::new(
        basis_shell,
        centre,
        Array1::from(exponents.to_vec()),
        Array2::from_shape_vec((coeffs.len(), 1), coeffs.to_vec()).unwrap(),
        true,
    )
    .unwrap()
}

fn sample_points() -> Vec<Point3<f64>> {
    vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.3, -0.4, 0.5),
        Point3::new(-1.1, 0.2, 0.9),
        Point3::new(0.7, 1.3, -0.6),
        Point3::new(2.0, -0.5, 0.1),
    ]
}

#[test]
fn test_eval_s_function_at_centre() {
    let alpha = 0.9;
    let centre = Point3::new(0.1, 0.2, 0.3);
    let basis = BasisSet::new(vec![shell(
        BasisShell::standard(0, false).unwrap(),
        centre,
        &[alpha],
        &[1.0],
    )]);
    let values = evaluate_basis(&basis, &[centre, Point3::new(0.1, 0.2, 1.3)]).unwrap();
    assert_eq!(values.dim(), (1, 2));
    let norm = (2.0 * alpha / PI).powf(0.75);
    approx::assert_relative_eq!(values[(0, 0)], norm, max_relative = 1e-12);
    approx::assert_relative_eq!(values[(0, 1)], norm * (-alpha).exp(), max_relative = 1e-12);
}

#[test]
fn test_eval_pure_values_from_cartesian() {
    let centre = Point3::new(0.2, -0.1, 0.4);
    let pure = BasisSet::new(vec![shell(
        BasisShell::standard(3, false).unwrap(),
        centre,
        &[1.1, 0.35],
        &[0.4, 0.7],
    )]);
    let cart = BasisSet::new(vec![shell(
        BasisShell::new(3, ShellOrder::Cart(CartOrder::lex(3))).unwrap(),
        centre,
        &[1.1, 0.35],
        &[0.4, 0.7],
    )]);
    let points = sample_points();
    let pure_values = evaluate_basis(&pure, &points).unwrap();
    let cart_values = evaluate_basis(&cart, &points).unwrap();
    let wmat = solid_harmonic_matrix(3).unwrap();
    let expected = wmat.t().dot(&cart_values);
    assert_eq!(pure_values.dim(), (7, 5));
    for (p, e) in pure_values.iter().zip(expected.iter()) {
        approx::assert_relative_eq!(*p, *e, max_relative = 1e-12, epsilon = 1e-14);
    }
}

#[test]
fn test_eval_centre_gradient_finite_difference() {
    let shells = vec![
        Shell::new(
            BasisShell::standard(2, false).unwrap(),
            Point3::new(0.1, 0.0, -0.2),
            array![1.4, 0.45],
            array![[0.5, 0.1], [0.6, 1.0]],
            true,
        )
        .unwrap(),
        shell(
            BasisShell::standard(3, true).unwrap(),
            Point3::new(-0.3, 0.4, 0.2),
            &[0.8],
            &[1.0],
        ),
        shell(
            BasisShell::standard(0, false).unwrap(),
            Point3::new(0.5, 0.5, 0.5),
            &[2.0, 0.5],
            &[0.3, 0.8],
        ),
    ];
    let points = sample_points();
    let basis = BasisSet::new(shells.clone());
    let gradient = evaluate_basis_centre_gradient(&basis, &points).unwrap();
    assert_eq!(gradient.dim(), (3, 10 + 10 + 1, 5));

    let h = 1e-5;
    for axis in 0..3 {
        let displaced = |sign: f64| {
            let moved = shells
                .iter()
                .map(|shell| {
                    let mut centre = *shell.centre();
                    centre[axis] += sign * h;
                    shell.with_centre(centre)
                })
                .collect::<Vec<_>>();
            evaluate_basis(&BasisSet::new(moved), &points).unwrap()
        };
        let fd = (displaced(1.0) - displaced(-1.0)) / (2.0 * h);
        for ((ifunc, ipt), value) in fd.indexed_iter() {
            approx::assert_abs_diff_eq!(gradient[(axis, ifunc, ipt)], *value, epsilon = 1e-7);
        }
    }
}

#[test]
fn test_eval_grid_overlap_agrees_with_integrals() {
    let basis = BasisSet::new(vec![
        shell(
            BasisShell::standard(0, false).unwrap(),
            Point3::origin(),
            &[1.2],
            &[1.0],
        ),
        shell(
            BasisShell::standard(1, false).unwrap(),
            Point3::new(0.0, 0.0, 0.5),
            &[0.8],
            &[1.0],
        ),
        shell(
            BasisShell::standard(2, true).unwrap(),
            Point3::new(0.3, 0.0, 0.0),
            &[1.0],
            &[1.0],
        ),
    ]);
    let (points, weight) = cubic_grid(&Point3::origin(), 0.2, 35);
    assert_eq!(points.len(), 71 * 71 * 71);
    let values = evaluate_basis(&basis, &points).unwrap();
    let s_grid = grid_overlap(&values, weight);
    let s_exact = overlap(&basis).unwrap();
    for (g, e) in s_grid.iter().zip(s_exact.iter()) {
        approx::assert_abs_diff_eq!(*g, *e, epsilon = 1e-7);
    }
}
