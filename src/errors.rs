//! Error types raised by the integral engine.

use std::error::Error;
use std::fmt;

/// An enumerated type for the failures that the integral engine can detect.
///
/// All public operations return `Result<_, anyhow::Error>`; when the failure is one of the
/// conditions below, the error value wraps an [`IntegralError`] which can be recovered with
/// [`anyhow::Error::downcast_ref`].
#[derive(Debug, Clone, PartialEq)]
pub enum IntegralError {
    /// A basis-set specification does not cover the requested system, *e.g.* an element of the
    /// molecule has no entry.
    InvalidBasis(String),

    /// A shell or contraction is internally inconsistent, *e.g.* exponent and coefficient counts
    /// disagree or an exponent is not positive.
    MalformedBasis(String),

    /// A tensor axis and the matrix supposed to act on it have different lengths.
    DimensionMismatch(String),

    /// The angular momentum of a shell exceeds what the solid-harmonic tables support.
    UnsupportedAngularMomentum(u32),

    /// A numerical quantity could not be evaluated to the required precision.
    NumericalInstability(String),
}

impl fmt::Display for IntegralError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidBasis(msg) => write!(f, "Invalid basis: {msg}"),
            Self::MalformedBasis(msg) => write!(f, "Malformed basis: {msg}"),
            Self::DimensionMismatch(msg) => write!(f, "Dimension mismatch: {msg}"),
            Self::UnsupportedAngularMomentum(l) => write!(
                f,
                "Unsupported angular momentum: l = {l} exceeds the maximum of {}",
                crate::angmom::MAX_ANGMOM
            ),
            Self::NumericalInstability(msg) => write!(f, "Numerical instability: {msg}"),
        }
    }
}

impl Error for IntegralError {}
