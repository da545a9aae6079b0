//! # GTOInts: Molecular Integrals over Gaussian-Type Orbitals
//!
//! GTOInts evaluates molecular integrals over contracted Cartesian and real-solid-harmonic
//! Gaussian basis functions by the McMurchie–Davidson scheme:
//! - overlap, kinetic energy and nuclear attraction matrices,
//! - arbitrary-order Cartesian differential operators, multipole moments about an origin and
//!   angular momentum integrals,
//! - attraction to arbitrary sets of point charges,
//! - four-centre electron-repulsion integrals in chemist or physicist notation, and
//! - values and centre gradients of basis functions at points in space.
//!
//! Integral tensors can be transformed into other bases, *e.g.* a canonically orthonormalised
//! basis or molecular orbitals, by [`transform::BasisTransform`].
//!
//! ## Getting started
//!
//! To use GTOInts in your Rust project, simply add this crate to your project's `Cargo.toml`.
//! The available features defined by this crate are:
//!
//! ### Basis sets
//! - `bse`: Enables basis sets to be retrieved from
//!   [BasisSetExchange](https://www.basissetexchange.org/) at run time
//!
//! ### Composite
//! - `full`: Enables the `bse` feature
//!
//! ## Usage
//!
//! For most items (structs, enums, functions, and traits), their usages are illustrated in test
//! functions. For usage of the compiled `gtoints` binary, run `gtoints --help`; the binary reads a
//! YAML configuration file described by [`interfaces::input::Input`].
//!
//! ## License
//!
//! GNU Lesser General Public License v3.0.

pub mod angmom;
pub mod auxiliary;
pub mod basis;
pub mod drivers;
pub mod errors;
pub mod integrals;
pub mod interfaces;
pub mod io;
pub mod transform;
