//! Evaluation of the Boys function
//!
//! ```math
//! F_n(x) = \int_0^1 t^{2n} e^{-xt^2}\ \mathrm{d}t.
//! ```
//!
//! All orders $`0 \le n \le n_{\mathrm{max}}`$ are produced together. Four branches are used:
//!
//! * $`x < 10^{-15}`$: $`F_n(x) = 1/(2n+1)`$;
//! * $`x \le 40`$ and $`n_{\mathrm{max}} \le`$ [`BOYS_TABLE_MAX_ORDER`]: a Taylor expansion of
//!   $`F_{n_{\mathrm{max}}}`$ about the nearest point of a precomputed grid, followed by downward
//!   recurrence;
//! * $`x \le 40`$ otherwise: the convergent series for $`F_{n_{\mathrm{max}}}`$, followed by
//!   downward recurrence;
//! * $`x > 40`$: $`F_0(x) = \frac{1}{2}\sqrt{\pi/x}`$, followed by upward recurrence.

use anyhow::{self, ensure};
use lazy_static::lazy_static;
use ndarray::{Array1, Array2};

use crate::errors::IntegralError;

#[cfg(test)]
#[path = "boys_tests.rs"]
mod boys_tests;

// ---------
// Constants
// ---------

/// The largest order served by the tabulated branch.
pub const BOYS_TABLE_MAX_ORDER: usize = 32;

/// Number of terms in the Taylor expansion about a grid point.
const TAYLOR_TERMS: usize = 8;

/// Grid spacing of the table.
const GRID_STEP: f64 = 0.1;

/// Largest argument handled by the table and the series.
const X_CROSSOVER: f64 = 40.0;

/// Arguments below this are treated as zero.
const X_SMALL: f64 = 1e-15;

lazy_static! {
    /// $`F_n(x_i)`$ for grid points $`x_i = i\Delta`$ (rows) and orders
    /// $`0 \le n < `$ `BOYS_TABLE_MAX_ORDER + TAYLOR_TERMS` (columns).
    static ref BOYS_TABLE: Array2<f64> = build_table();
}

fn build_table() -> Array2<f64> {
    let n_points = (X_CROSSOVER / GRID_STEP).round() as usize + 1;
    let n_orders = BOYS_TABLE_MAX_ORDER + TAYLOR_TERMS;
    let mut table = Array2::<f64>::zeros((n_points, n_orders));
    for (i, mut row) in table.rows_mut().into_iter().enumerate() {
        let x = i as f64 * GRID_STEP;
        let mut values = vec![0.0; n_orders];
        values[n_orders - 1] = boys_series(n_orders - 1, x);
        downward_recurrence(x, &mut values);
        row.iter_mut()
            .zip(values.iter())
            .for_each(|(entry, value)| *entry = *value);
    }
    table
}

// ---------------
// Branch kernels
// ---------------

/// Evaluates $`F_n(x) = e^{-x}\sum_{k\ge0} (2x)^k / [(2n+1)(2n+3)\cdots(2n+2k+1)]`$.
fn boys_series(n: usize, x: f64) -> f64 {
    let mut denom = 2.0 * n as f64 + 1.0;
    let mut term = 1.0 / denom;
    let mut sum = term;
    for _ in 0..2000 {
        denom += 2.0;
        term *= 2.0 * x / denom;
        sum += term;
        if term < sum * 1e-17 {
            break;
        }
    }
    (-x).exp() * sum
}

/// Fills `values[..n_max]` from `values[n_max]` using
/// $`F_n = (2xF_{n+1} + e^{-x})/(2n+1)`$.
fn downward_recurrence(x: f64, values: &mut [f64]) {
    let emx = (-x).exp();
    for n in (0..values.len().saturating_sub(1)).rev() {
        values[n] = (2.0 * x * values[n + 1] + emx) / (2.0 * n as f64 + 1.0);
    }
}

/// Fills `values[1..]` from `values[0]` using $`F_{n+1} = ((2n+1)F_n - e^{-x})/(2x)`$.
fn upward_recurrence(x: f64, values: &mut [f64]) {
    let emx = (-x).exp();
    for n in 0..values.len().saturating_sub(1) {
        values[n + 1] = ((2.0 * n as f64 + 1.0) * values[n] - emx) / (2.0 * x);
    }
}

/// Taylor expansion of $`F_n(x)`$ about the nearest grid point, using
/// $`\mathrm{d}F_n/\mathrm{d}x = -F_{n+1}`$.
fn boys_tabulated(n: usize, x: f64) -> f64 {
    let i = (x / GRID_STEP).round() as usize;
    let x0 = i as f64 * GRID_STEP;
    let dx = x0 - x;
    let row = BOYS_TABLE.row(i);
    let mut factor = 1.0;
    let mut value = 0.0;
    for k in 0..TAYLOR_TERMS {
        value += row[n + k] * factor;
        factor *= dx / (k as f64 + 1.0);
    }
    value
}

// ---------
// Interface
// ---------

/// Evaluates $`F_n(x)`$ for every $`n`$ from $`0`$ to `values.len() - 1`, writing the results
/// into `values`. No allocation takes place.
///
/// # Errors
///
/// Errors with [`IntegralError::NumericalInstability`] if `x` is negative or not finite, or if
/// any resulting value is not finite.
pub fn boys_values(x: f64, values: &mut [f64]) -> Result<(), anyhow::Error> {
    ensure!(
        x.is_finite() && x >= 0.0,
        IntegralError::NumericalInstability(format!(
            "Boys function requested at invalid argument x = {x}"
        ))
    );
    if values.is_empty() {
        return Ok(());
    }
    let n_max = values.len() - 1;
    if x < X_SMALL {
        values
            .iter_mut()
            .enumerate()
            .for_each(|(n, value)| *value = 1.0 / (2.0 * n as f64 + 1.0));
    } else if x <= X_CROSSOVER {
        values[n_max] = if n_max <= BOYS_TABLE_MAX_ORDER {
            boys_tabulated(n_max, x)
        } else {
            boys_series(n_max, x)
        };
        downward_recurrence(x, values);
    } else {
        values[0] = 0.5 * (std::f64::consts::PI / x).sqrt();
        upward_recurrence(x, values);
    }
    ensure!(
        values.iter().all(|value| value.is_finite()),
        IntegralError::NumericalInstability(format!(
            "Boys function of order up to {n_max} at x = {x} is not finite"
        ))
    );
    Ok(())
}

/// Evaluates $`F_n(x)`$ for $`0 \le n \le`$ `n_max`.
///
/// # Errors
///
/// See [`boys_values`].
pub fn boys_function(n_max: usize, x: f64) -> Result<Array1<f64>, anyhow::Error> {
    let mut values = vec![0.0; n_max + 1];
    boys_values(x, &mut values)?;
    Ok(Array1::from(values))
}
