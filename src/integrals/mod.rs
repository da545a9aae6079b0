//! Molecular integrals over contracted Gaussian shells by the McMurchie--Davidson scheme.

pub mod boys;
pub mod electron_repulsion;
pub mod hermite;
pub mod one_electron;
pub mod primitive_pair;
