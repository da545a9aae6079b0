//! YAML input configuration of the `gtoints` binary.

use std::fmt;
use std::path::PathBuf;

use anyhow;
use serde::{Deserialize, Serialize};

use crate::auxiliary::molecule::Molecule;
use crate::basis::basis_set::BasisSet;
use crate::drivers::integral_evaluation::{IntegralEvaluationDriver, IntegralEvaluationParams};
use crate::drivers::GtoIntsDriver;
use crate::interfaces::InputHandle;
use crate::io::format::{gtoints_error, gtoints_output, log_micsec_begin, log_micsec_end, nice_bool};


// -------------
// MoleculeInput
// -------------

/// Specification of the molecule in the input configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoleculeInput {
    /// Path to an XYZ file.
    pub xyz: PathBuf,

    /// Whether the coordinates in the XYZ file are in Bohr rather than Ångström.
    #[serde(default)]
    pub bohr: bool,
}

// -----------
// BasisSource
// -----------

/// The source from which basis-set information is obtained.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BasisSource {
    /// A YAML or BasisSetExchange JSON basis file.
    File(PathBuf),

    /// A basis set retrieved from BasisSetExchange. Requires the `bse` feature.
    BasisSetExchange {
        /// The name of the basis set.
        name: String,

        /// Whether the optimised contraction version is requested.
        #[serde(default)]
        optimised_contraction: bool,

        /// The version of the basis set.
        #[serde(default = "default_bse_version")]
        version: usize,
    },
}

fn default_bse_version() -> usize {
    1
}

impl fmt::Display for BasisSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasisSource::File(path) => write!(f, "file `{}`", path.display()),
            BasisSource::BasisSetExchange {
                name,
                optimised_contraction,
                version,
            } => write!(
                f,
                "BasisSetExchange `{name}` (version {version}, optimised contraction: {})",
                nice_bool(*optimised_contraction)
            ),
        }
    }
}

// ----------
// BasisInput
// ----------

fn default_true() -> bool {
    true
}

/// Specification of the basis set in the input configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BasisInput {
    /// Where the basis-set information comes from.
    pub source: BasisSource,

    /// Whether all shells use Cartesian rather than pure functions.
    #[serde(default)]
    pub cartesian: bool,

    /// Whether every contraction is renormalised.
    #[serde(default = "default_true")]
    pub renormalise: bool,

    /// Whether the shells are reordered by increasing angular momentum.
    #[serde(default)]
    pub sort_by_angular_momentum: bool,
}

impl BasisInput {
    /// Builds the basis set for `mol`.
    pub fn to_basis_set(&self, mol: &Molecule) -> Result<BasisSet, anyhow::Error> {
        let mut basis_set = match &self.source {
            BasisSource::File(path) => {
                BasisSet::from_file(path, mol, self.cartesian, self.renormalise)?
            }
            #[cfg(feature = "bse")]
            BasisSource::BasisSetExchange {
                name,
                optimised_contraction,
                version,
            } => BasisSet::from_bse(
                mol,
                name,
                self.cartesian,
                *optimised_contraction,
                *version,
                self.renormalise,
            )?,
            #[cfg(not(feature = "bse"))]
            BasisSource::BasisSetExchange { name, .. } => {
                anyhow::bail!("Retrieving `{name}` from BasisSetExchange requires the `bse` feature.")
            }
        };
        if self.sort_by_angular_momentum {
            basis_set.sort_by_angular_momentum();
        }
        Ok(basis_set)
    }
}

// -----
// Input
// -----

/// A structure containing `GTOInts` input parameters which can be serialised into and
/// deserialised from a YAML input file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Input {
    /// Specification of the molecule.
    pub molecule: MoleculeInput,

    /// Specification of the basis set.
    pub basis: BasisInput,

    /// Parameters for integral evaluation. If not specified, the default parameters are used.
    #[serde(default)]
    pub integrals: IntegralEvaluationParams,
}

impl InputHandle for Input {
    fn handle(&self) -> Result<(), anyhow::Error> {
        log_micsec_begin("Input");
        gtoints_output!("Molecule: `{}`", self.molecule.xyz.display());
        gtoints_output!(
            "Coordinates in: {}",
            if self.molecule.bohr { "Bohr" } else { "Ångström" }
        );
        gtoints_output!("Basis: {}", self.basis.source);
        gtoints_output!("Cartesian functions: {}", nice_bool(self.basis.cartesian));
        gtoints_output!("Renormalise: {}", nice_bool(self.basis.renormalise));
        log_micsec_end("Input");
        gtoints_output!("");

        let mol = Molecule::from_xyz(&self.molecule.xyz, self.molecule.bohr)?;
        let basis_set = self.basis.to_basis_set(&mol)?;
        let mut driver = IntegralEvaluationDriver::builder()
            .parameters(&self.integrals)
            .molecule(&mol)
            .basis_set(&basis_set)
            .build()?;
        driver.run().map_err(|err| {
            gtoints_error!("Integral evaluation failed: {err}");
            err
        })?;
        driver.result().map(|_| ())
    }
}
