//! Driver for the evaluation of molecular integrals over a basis set.

use std::fmt;
use std::path::PathBuf;

use anyhow::{self, format_err};
use derive_builder::Builder;
use nalgebra::Point3;
use ndarray::{Array2, Array3, Array4};
use serde::{Deserialize, Serialize};

use crate::auxiliary::molecule::Molecule;
use crate::basis::basis_set::BasisSet;
use crate::drivers::GtoIntsDriver;
use crate::integrals::electron_repulsion::{electron_repulsion, EriNotation};
use crate::integrals::one_electron::{
    kinetic, moment_orders, nuclear_attraction, overlap, OneElectronOperator,
};
use crate::io::format::{
    gtoints_output, gtoints_warn, log_macsec_begin, log_macsec_end, log_subtitle, log_title,
    nice_bool, write_subtitle, GtoIntsOutput,
};
use crate::io::{write_gtoints_binary, GtoIntsFileType};
use crate::transform::{orthonormalising_coefficients, BasisTransform};


// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

/// Electron-repulsion tensors with more elements than this trigger a memory warning.
const ERI_LARGE_TENSOR_ELEMENTS: usize = 1 << 27;

fn default_true() -> bool {
    true
}
fn default_linear_dependence_threshold() -> f64 {
    1e-7
}

/// Structure containing control parameters for integral evaluation.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntegralEvaluationParams {
    /// Boolean indicating if the overlap matrix is evaluated.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub overlap: bool,

    /// Boolean indicating if the kinetic energy matrix is evaluated.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub kinetic: bool,

    /// Boolean indicating if the nuclear attraction matrix is evaluated.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub nuclear_attraction: bool,

    /// Boolean indicating if the core Hamiltonian $`\mathbf{T} + \mathbf{V}`$ is evaluated. This
    /// implies the kinetic energy and nuclear attraction matrices.
    #[builder(default = "false")]
    #[serde(default)]
    pub core_hamiltonian: bool,

    /// The largest total order of multipole moments to evaluate, if any.
    #[builder(default = "None")]
    #[serde(default)]
    pub max_moment_order: Option<u32>,

    /// The origin of the multipole moments in Bohr.
    #[builder(default = "Point3::origin()")]
    #[serde(default = "Point3::origin")]
    pub moment_origin: Point3<f64>,

    /// Boolean indicating if the electron-repulsion tensor is evaluated.
    #[builder(default = "false")]
    #[serde(default)]
    pub electron_repulsion: bool,

    /// The index convention of the electron-repulsion tensor.
    #[builder(default = "EriNotation::Chemist")]
    #[serde(default)]
    pub eri_notation: EriNotation,

    /// Boolean indicating if every result is transformed into the canonically orthonormalised
    /// basis.
    #[builder(default = "false")]
    #[serde(default)]
    pub orthonormalise: bool,

    /// The smallest overlap eigenvalue tolerated when orthonormalising.
    #[builder(default = "1e-7")]
    #[serde(default = "default_linear_dependence_threshold")]
    pub linear_dependence_threshold: f64,

    /// The output verbosity level. At level 1 and above the matrices are printed.
    #[builder(default = "0")]
    #[serde(default)]
    pub verbose: u8,

    /// Optional name for saving the result as a binary file of type [`GtoIntsFileType::Int`]. If
    /// `None`, the result will not be saved.
    #[builder(default = "None")]
    #[serde(default)]
    pub result_save_name: Option<PathBuf>,
}

impl IntegralEvaluationParams {
    /// Returns a builder to construct a [`IntegralEvaluationParams`] structure.
    pub fn builder() -> IntegralEvaluationParamsBuilder {
        IntegralEvaluationParamsBuilder::default()
    }
}

impl Default for IntegralEvaluationParams {
    fn default() -> Self {
        Self {
            overlap: true,
            kinetic: true,
            nuclear_attraction: true,
            core_hamiltonian: false,
            max_moment_order: None,
            moment_origin: Point3::origin(),
            electron_repulsion: false,
            eri_notation: EriNotation::Chemist,
            orthonormalise: false,
            linear_dependence_threshold: default_linear_dependence_threshold(),
            verbose: 0,
            result_save_name: None,
        }
    }
}

impl fmt::Display for IntegralEvaluationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Overlap matrix: {}", nice_bool(self.overlap))?;
        writeln!(f, "Kinetic energy matrix: {}", nice_bool(self.kinetic))?;
        writeln!(
            f,
            "Nuclear attraction matrix: {}",
            nice_bool(self.nuclear_attraction)
        )?;
        writeln!(f, "Core Hamiltonian: {}", nice_bool(self.core_hamiltonian))?;
        writeln!(
            f,
            "Multipole moments: {}",
            if let Some(order) = self.max_moment_order {
                format!(
                    "up to order {order} about ({:+.7}, {:+.7}, {:+.7})",
                    self.moment_origin[0], self.moment_origin[1], self.moment_origin[2]
                )
            } else {
                nice_bool(false)
            }
        )?;
        writeln!(
            f,
            "Electron repulsion: {}",
            if self.electron_repulsion {
                self.eri_notation.to_string()
            } else {
                nice_bool(false)
            }
        )?;
        writeln!(
            f,
            "Orthonormalise basis: {}",
            if self.orthonormalise {
                format!(
                    "yes (linear-dependence threshold {:.3e})",
                    self.linear_dependence_threshold
                )
            } else {
                nice_bool(false)
            }
        )?;
        writeln!(f)?;
        writeln!(f, "Output level: {}", self.verbose)?;
        writeln!(
            f,
            "Save integral results to file: {}",
            if let Some(name) = self.result_save_name.as_ref() {
                let mut path = name.clone();
                path.set_extension(GtoIntsFileType::Int.ext());
                path.display().to_string()
            } else {
                nice_bool(false)
            }
        )?;
        writeln!(f)?;

        Ok(())
    }
}

// ------
// Result
// ------

/// Structure to contain integral evaluation results. Every array is in the basis-function order
/// of the basis set, or in the orthonormalised basis when requested.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct IntegralEvaluationResult {
    /// The control parameters used to obtain this set of results.
    pub parameters: IntegralEvaluationParams,

    /// The labels of the atomic basis functions.
    pub function_labels: Vec<String>,

    /// The nuclear repulsion energy in Hartree.
    pub nuclear_repulsion_energy: f64,

    /// The coefficients of the orthonormalised basis in terms of the atomic basis functions.
    #[builder(default = "None")]
    pub orthonormalising_coefficients: Option<Array2<f64>>,

    /// The overlap matrix.
    #[builder(default = "None")]
    pub overlap: Option<Array2<f64>>,

    /// The kinetic energy matrix.
    #[builder(default = "None")]
    pub kinetic: Option<Array2<f64>>,

    /// The nuclear attraction matrix.
    #[builder(default = "None")]
    pub nuclear_attraction: Option<Array2<f64>>,

    /// The core Hamiltonian.
    #[builder(default = "None")]
    pub core_hamiltonian: Option<Array2<f64>>,

    /// The order triples of the multipole moments, in the order of the last axis of
    /// [`Self::moments`].
    #[builder(default = "None")]
    pub moment_orders: Option<Vec<(u32, u32, u32)>>,

    /// The multipole moment integrals.
    #[builder(default = "None")]
    pub moments: Option<Array3<f64>>,

    /// The electron-repulsion tensor.
    #[builder(default = "None")]
    pub electron_repulsion: Option<Array4<f64>>,
}

impl IntegralEvaluationResult {
    fn builder() -> IntegralEvaluationResultBuilder {
        IntegralEvaluationResultBuilder::default()
    }
}

impl fmt::Display for IntegralEvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "Summary of evaluated integrals")?;
        writeln!(
            f,
            "Nuclear repulsion energy: {:+.12} Eh",
            self.nuclear_repulsion_energy
        )?;
        writeln!(f, "Number of basis functions: {}", self.function_labels.len())?;
        let matrices = [
            ("Overlap", &self.overlap),
            ("Kinetic energy", &self.kinetic),
            ("Nuclear attraction", &self.nuclear_attraction),
            ("Core Hamiltonian", &self.core_hamiltonian),
        ];
        for (name, mat) in matrices {
            if let Some(mat) = mat {
                writeln!(
                    f,
                    "{name} matrix: shape {:?}, trace {:+.12}",
                    mat.dim(),
                    mat.diag().sum()
                )?;
            }
        }
        if let (Some(orders), Some(moments)) = (&self.moment_orders, &self.moments) {
            writeln!(
                f,
                "Multipole moments: {} components, shape {:?}",
                orders.len(),
                moments.dim()
            )?;
        }
        if let Some(eri) = &self.electron_repulsion {
            writeln!(
                f,
                "Electron repulsion ({}): shape {:?}, largest element {:.12}",
                self.parameters.eri_notation,
                eri.dim(),
                eri.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
            )?;
        }
        Ok(())
    }
}

// ------
// Driver
// ------

/// Driver for the evaluation of molecular integrals.
#[derive(Clone, Builder)]
pub struct IntegralEvaluationDriver<'a> {
    /// The control parameters for integral evaluation.
    parameters: &'a IntegralEvaluationParams,

    /// The molecule supplying the nuclei.
    molecule: &'a Molecule,

    /// The basis set over which integrals are evaluated.
    basis_set: &'a BasisSet,

    /// The result of the evaluation.
    #[builder(setter(skip), default = "None")]
    result: Option<IntegralEvaluationResult>,
}

impl<'a> IntegralEvaluationDriver<'a> {
    /// Returns a builder to construct a [`IntegralEvaluationDriver`] structure.
    pub fn builder() -> IntegralEvaluationDriverBuilder<'a> {
        IntegralEvaluationDriverBuilder::default()
    }

    /// Evaluates the requested integrals.
    fn evaluate_integrals(&mut self) -> Result<(), anyhow::Error> {
        log_title("Integral Evaluation");
        gtoints_output!("");
        let params = self.parameters;
        params.log_output_display();

        log_subtitle("Molecule");
        gtoints_output!("");
        self.molecule.log_output_display();
        gtoints_output!("");

        log_subtitle("Basis set");
        gtoints_output!("");
        self.basis_set.log_output_display();
        gtoints_output!("");

        let basis = self.basis_set;
        let mut builder = IntegralEvaluationResult::builder();
        builder
            .parameters(params.clone())
            .function_labels(basis.function_labels())
            .nuclear_repulsion_energy(self.molecule.nuclear_repulsion_energy());

        log_macsec_begin("One-electron integrals");
        gtoints_output!("");
        let smat = if params.overlap || params.orthonormalise {
            Some(overlap(basis)?)
        } else {
            None
        };
        let tmat = if params.kinetic || params.core_hamiltonian {
            Some(kinetic(basis)?)
        } else {
            None
        };
        let vmat = if params.nuclear_attraction || params.core_hamiltonian {
            Some(nuclear_attraction(basis, self.molecule)?)
        } else {
            None
        };
        let hmat = if params.core_hamiltonian {
            match (&tmat, &vmat) {
                (Some(tmat), Some(vmat)) => Some(tmat + vmat),
                _ => None,
            }
        } else {
            None
        };
        let moments = if let Some(order) = params.max_moment_order {
            Some(OneElectronOperator::moments_up_to(params.moment_origin, order).evaluate(basis)?)
        } else {
            None
        };
        log_macsec_end("One-electron integrals");
        gtoints_output!("");

        let eri = if params.electron_repulsion {
            log_macsec_begin("Electron-repulsion integrals");
            gtoints_output!("");
            gtoints_output!("Notation: {}", params.eri_notation);
            let n_elements = basis.n_funcs().pow(4);
            if n_elements > ERI_LARGE_TENSOR_ELEMENTS {
                gtoints_warn!(
                    "The electron-repulsion tensor has {n_elements} elements ({:.1} GiB).",
                    (n_elements * std::mem::size_of::<f64>()) as f64 / f64::from(1u32 << 30)
                );
            }
            let eri = electron_repulsion(basis, params.eri_notation)?;
            log_macsec_end("Electron-repulsion integrals");
            gtoints_output!("");
            Some(eri)
        } else {
            None
        };

        let transform = if params.orthonormalise {
            let smat = smat
                .as_ref()
                .ok_or_else(|| format_err!("No overlap matrix available for orthonormalisation."))?;
            let c = orthonormalising_coefficients(smat, params.linear_dependence_threshold)?;
            builder.orthonormalising_coefficients(Some(c.clone()));
            Some(c)
        } else {
            None
        };
        let to_matrix = |mat: Option<Array2<f64>>| -> Result<Option<Array2<f64>>, anyhow::Error> {
            match (mat, &transform) {
                (Some(mat), Some(c)) => Ok(Some(BasisTransform::symmetric(c, 2).apply_matrix(&mat)?)),
                (mat, _) => Ok(mat),
            }
        };

        builder
            .overlap(to_matrix(smat.filter(|_| params.overlap))?)
            .kinetic(to_matrix(tmat.filter(|_| params.kinetic))?)
            .nuclear_attraction(to_matrix(vmat.filter(|_| params.nuclear_attraction))?)
            .core_hamiltonian(to_matrix(hmat)?);
        if let Some(moments) = moments {
            let moments = match &transform {
                Some(c) => BasisTransform::symmetric(c, 2).apply_one_electron(&moments)?,
                None => moments,
            };
            builder
                .moment_orders(params.max_moment_order.map(moment_orders))
                .moments(Some(moments));
        }
        if let Some(eri) = eri {
            let eri = match &transform {
                Some(c) => BasisTransform::symmetric(c, 4).apply_electron_repulsion(&eri)?,
                None => eri,
            };
            builder.electron_repulsion(Some(eri));
        }

        let result = builder.build()?;
        result.log_output_display();
        gtoints_output!("");
        if params.verbose >= 1 {
            log_matrices(&result);
        }

        if let Some(name) = params.result_save_name.as_ref() {
            write_gtoints_binary(name, GtoIntsFileType::Int, &result)?;
            gtoints_output!(
                "Integral results saved as {}.{}.",
                name.display(),
                GtoIntsFileType::Int.ext()
            );
            gtoints_output!("");
        }
        self.result = Some(result);
        Ok(())
    }
}

fn log_matrices(result: &IntegralEvaluationResult) {
    let matrices = [
        ("Overlap matrix", &result.overlap),
        ("Kinetic energy matrix", &result.kinetic),
        ("Nuclear attraction matrix", &result.nuclear_attraction),
        ("Core Hamiltonian", &result.core_hamiltonian),
    ];
    for (name, mat) in matrices {
        if let Some(mat) = mat {
            log_subtitle(name);
            gtoints_output!("{mat:+14.8}");
            gtoints_output!("");
        }
    }
}

impl<'a> GtoIntsDriver for IntegralEvaluationDriver<'a> {
    type Params = IntegralEvaluationParams;

    type Outcome = IntegralEvaluationResult;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No integral evaluation results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.evaluate_integrals()
    }
}
