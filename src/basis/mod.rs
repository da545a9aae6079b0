//! Gaussian basis functions: shell orderings, contracted shells, basis sets and their evaluation
//! on grids.

pub mod ao;
pub mod basis_set;
pub mod eval;
pub mod shell;
