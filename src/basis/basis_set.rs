//! Ordered collections of shells built from basis-set specifications.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::ops::Index;
use std::path::Path;

use anyhow::{self, ensure, format_err};
use itertools::Itertools;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::angmom::angmom_label;
use crate::auxiliary::atom::ElementMap;
use crate::auxiliary::molecule::Molecule;
use crate::basis::ao::BasisShell;
use crate::basis::shell::Shell;
use crate::errors::IntegralError;

#[cfg(feature = "bse")]
use rayon::prelude::*;

#[cfg(test)]
#[path = "basis_set_tests.rs"]
mod basis_set_tests;

/// Primitives whose coefficients in every contraction of a shell fall below this magnitude are
/// discarded.
const CONTRACTION_COEFF_THRESH: f64 = 1e-16;

#[cfg(feature = "bse")]
const BSE_BASE_API: &str = "https://www.basissetexchange.org/api";

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
// Deserialisable basis-set specification (BasisSetExchange)
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~

/// A key identifying an element in a basis-set specification, either by atomic number or by
/// symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementKey {
    AtomicNumber(u32),
    Symbol(String),
}

impl ElementKey {
    /// Resolves this key to an atomic number. Symbols that are themselves numbers, as found in
    /// JSON object keys, are parsed as atomic numbers.
    fn atomic_number(&self, emap: &ElementMap) -> Result<u32, anyhow::Error> {
        match self {
            Self::AtomicNumber(z) => Ok(*z),
            Self::Symbol(sym) => match sym.trim().parse::<u32>() {
                Ok(z) => Ok(z),
                Err(_) => emap.lookup(sym).map(|(_, z, _)| z),
            },
        }
    }
}

/// A number that may be written either as a number or as a string, as BasisSetExchange does.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl TryFrom<NumberOrString> for f64 {
    type Error = std::num::ParseFloatError;

    fn try_from(value: NumberOrString) -> Result<Self, Self::Error> {
        match value {
            NumberOrString::Number(x) => Ok(x),
            NumberOrString::Text(s) => s.trim().replace(['D', 'd'], "E").parse::<f64>(),
        }
    }
}

/// A basis-set specification with the layout of BasisSetExchange JSON files.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BasisSetSpecification {
    /// Name of the basis set.
    #[serde(default)]
    pub name: String,

    /// Version of the basis set.
    #[serde(default)]
    pub version: Option<String>,

    /// Basis information for each element.
    pub elements: HashMap<ElementKey, ElementBasisSpecification>,
}

/// Basis-set information for an element.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElementBasisSpecification {
    /// The shells of this element, in order.
    pub electron_shells: Vec<ShellSpecification>,
}

/// Basis-set information for a shell entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "ShellSpecificationRaw")]
pub struct ShellSpecification {
    /// The type of basis functions in this shell.
    pub function_type: String,

    /// The chemical region described by this shell.
    pub region: String,

    /// The angular momenta covered by this entry. A single value with several coefficient
    /// vectors gives a generalised contraction; several values (*e.g.* `[0, 1]`) pair up with the
    /// coefficient vectors one by one.
    pub angular_momentum: Vec<u32>,

    /// The primitive exponents.
    pub exponents: Vec<f64>,

    /// The contraction coefficient vectors, each as long as `exponents`.
    pub coefficients: Vec<Vec<f64>>,
}

/// A shell entry as read, with numbers possibly given as strings.
#[derive(Deserialize)]
struct ShellSpecificationRaw {
    #[serde(default = "default_function_type")]
    function_type: String,

    #[serde(default)]
    region: String,

    angular_momentum: Vec<u32>,

    exponents: Vec<NumberOrString>,

    coefficients: Vec<Vec<NumberOrString>>,
}

fn default_function_type() -> String {
    "gto".to_string()
}

impl TryFrom<ShellSpecificationRaw> for ShellSpecification {
    type Error = std::num::ParseFloatError;

    fn try_from(other: ShellSpecificationRaw) -> Result<Self, Self::Error> {
        Ok(Self {
            function_type: other.function_type,
            region: other.region,
            angular_momentum: other.angular_momentum,
            exponents: other
                .exponents
                .into_iter()
                .map(f64::try_from)
                .collect::<Result<Vec<_>, _>>()?,
            coefficients: other
                .coefficients
                .into_iter()
                .map(|d| d.into_iter().map(f64::try_from).collect::<Result<Vec<_>, _>>())
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

impl ShellSpecification {
    /// Splits this entry into `(l, columns)` groups, one per shell to be built.
    ///
    /// # Errors
    ///
    /// Errors with [`IntegralError::MalformedBasis`] if the entry is internally inconsistent.
    fn shell_groups(&self) -> Result<Vec<(u32, Vec<&Vec<f64>>)>, anyhow::Error> {
        ensure!(
            !self.angular_momentum.is_empty(),
            IntegralError::MalformedBasis("a shell entry has no angular momentum".to_string())
        );
        ensure!(
            !self.coefficients.is_empty(),
            IntegralError::MalformedBasis("a shell entry has no coefficients".to_string())
        );
        ensure!(
            self.coefficients
                .iter()
                .all(|d| d.len() == self.exponents.len()),
            IntegralError::MalformedBasis(format!(
                "a shell entry has {} exponents but coefficient vectors of lengths {:?}",
                self.exponents.len(),
                self.coefficients.iter().map(Vec::len).collect_vec()
            ))
        );
        if let [l] = self.angular_momentum[..] {
            Ok(vec![(l, self.coefficients.iter().collect_vec())])
        } else {
            ensure!(
                self.angular_momentum.len() == self.coefficients.len(),
                IntegralError::MalformedBasis(format!(
                    "angular momenta {:?} cannot be paired with {} coefficient vectors",
                    self.angular_momentum,
                    self.coefficients.len()
                ))
            );
            Ok(self
                .angular_momentum
                .iter()
                .zip(self.coefficients.iter())
                .map(|(l, d)| (*l, vec![d]))
                .collect_vec())
        }
    }
}

impl BasisSetSpecification {
    /// Reads a specification from a YAML or BasisSetExchange JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = fs::read_to_string(&path).map_err(|err| {
            format_err!(
                "Unable to read basis file {}: {err}",
                path.as_ref().display()
            )
        })?;
        serde_yaml::from_str(&contents).map_err(|err| format_err!(err))
    }

    /// The shell entries of the element with atomic number `z`, if present.
    fn element(
        &self,
        z: u32,
        emap: &ElementMap,
    ) -> Result<Option<&ElementBasisSpecification>, anyhow::Error> {
        for (key, element) in self.elements.iter() {
            if key.atomic_number(emap)? == z {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}

// --------
// BasisSet
// --------

/// An ordered basis set. Shells follow atom order and, within an atom, the order of the
/// specification. Functions are numbered consecutively through the shells.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BasisSet {
    /// The shells, in order.
    shells: Vec<Shell>,

    /// The function boundaries for the shells.
    shell_boundaries: Vec<(usize, usize)>,

    /// The function boundaries for consecutive runs of shells on the same atom.
    atom_boundaries: Vec<(usize, usize)>,
}

impl BasisSet {
    /// Creates a basis set from an ordered list of shells.
    pub fn new(shells: Vec<Shell>) -> Self {
        let mut basis_set = Self {
            shells,
            shell_boundaries: vec![],
            atom_boundaries: vec![],
        };
        basis_set.update_boundaries();
        basis_set
    }

    /// Recomputes the cached boundaries, as required when shells have been reordered.
    fn update_boundaries(&mut self) -> &mut Self {
        self.shell_boundaries = self
            .shells
            .iter()
            .scan(0, |acc, shell| {
                let boundary = (*acc, *acc + shell.n_funcs());
                *acc += shell.n_funcs();
                Some(boundary)
            })
            .collect_vec();
        self.atom_boundaries = self
            .shells
            .iter()
            .zip(self.shell_boundaries.iter())
            .group_by(|(shell, _)| shell.atom_index())
            .into_iter()
            .filter_map(|(_, group)| {
                let bounds = group.map(|(_, bound)| *bound).collect_vec();
                Some((bounds.first()?.0, bounds.last()?.1))
            })
            .collect_vec();
        self
    }

    /// Builds the basis set of a molecule from a specification.
    ///
    /// # Arguments
    ///
    /// * `spec` - The basis-set specification.
    /// * `mol` - The molecule, with coordinates in Bohr.
    /// * `cart` - If `true`, shells use lexicographic Cartesian functions; otherwise they use
    /// increasing-$`m`$ real solid harmonics.
    /// * `renormalise` - Whether every contraction is renormalised.
    ///
    /// # Errors
    ///
    /// Errors with [`IntegralError::InvalidBasis`] if an element of `mol` is absent from `spec`,
    /// and with [`IntegralError::MalformedBasis`] if a shell entry is inconsistent.
    pub fn from_specification(
        spec: &BasisSetSpecification,
        mol: &Molecule,
        cart: bool,
        renormalise: bool,
    ) -> Result<Self, anyhow::Error> {
        let emap = ElementMap::new();
        let mut shells = vec![];
        for (atom_index, atom) in mol.atoms.iter().enumerate() {
            let element = spec.element(atom.atomic_number, &emap)?.ok_or_else(|| {
                IntegralError::InvalidBasis(format!(
                    "no basis functions for element {} (atom {atom_index}) in basis `{}`",
                    atom.atomic_symbol, spec.name
                ))
            })?;
            for shell_spec in element.electron_shells.iter() {
                for (l, columns) in shell_spec.shell_groups()? {
                    let kept = (0..shell_spec.exponents.len())
                        .filter(|k| {
                            columns
                                .iter()
                                .any(|d| d[*k].abs() > CONTRACTION_COEFF_THRESH)
                        })
                        .collect_vec();
                    let exponents = kept
                        .iter()
                        .map(|k| shell_spec.exponents[*k])
                        .collect::<Array1<_>>();
                    let coefficients =
                        Array2::from_shape_fn((kept.len(), columns.len()), |(k, m)| {
                            columns[m][kept[k]]
                        });
                    let shell = Shell::new(
                        BasisShell::standard(l, cart)?,
                        atom.coordinates,
                        exponents,
                        coefficients,
                        renormalise,
                    )?
                    .with_atom_index(atom_index);
                    shells.push(shell);
                }
            }
        }
        Ok(Self::new(shells))
    }

    /// Reads a YAML or BasisSetExchange JSON basis file and builds the basis set of `mol`. See
    /// [`Self::from_specification`].
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        mol: &Molecule,
        cart: bool,
        renormalise: bool,
    ) -> Result<Self, anyhow::Error> {
        let spec = BasisSetSpecification::from_file(path)?;
        Self::from_specification(&spec, mol, cart, renormalise)
    }

    /// Retrieves basis information from BasisSetExchange and builds the basis set of `mol`.
    ///
    /// # Arguments
    ///
    /// * `mol` - The molecule.
    /// * `basis_name` - The name of the basis set to be retrieved.
    /// * `cart` - See [`Self::from_specification`].
    /// * `optimised_contraction` - Whether the optimised contraction version of the shells is
    /// requested.
    /// * `version` - The requested version of the basis set.
    /// * `renormalise` - See [`Self::from_specification`].
    #[cfg(feature = "bse")]
    pub fn from_bse(
        mol: &Molecule,
        basis_name: &str,
        cart: bool,
        optimised_contraction: bool,
        version: usize,
        renormalise: bool,
    ) -> Result<Self, anyhow::Error> {
        let symbols = mol
            .atoms
            .iter()
            .map(|atom| atom.atomic_symbol.clone())
            .unique()
            .collect_vec();
        let responses = symbols
            .par_iter()
            .map(|element| {
                let api_url = format!(
                    "{BSE_BASE_API}/basis/\
                    {basis_name}/format/json/\
                    ?elements={element}\
                    &optimize_general={optimised_contraction}\
                    &version={version}"
                );
                let response: BasisSetSpecification =
                    reqwest::blocking::get(&api_url)?.json()?;
                Ok(response)
            })
            .collect::<Result<Vec<_>, anyhow::Error>>()?;
        let spec = responses.into_iter().fold(
            BasisSetSpecification {
                name: basis_name.to_string(),
                version: Some(version.to_string()),
                elements: HashMap::new(),
            },
            |mut acc, response| {
                acc.elements.extend(response.elements);
                acc
            },
        );
        Self::from_specification(&spec, mol, cart, renormalise)
    }

    /// The number of shells in the basis set.
    pub fn n_shells(&self) -> usize {
        self.shells.len()
    }

    /// The number of basis functions in the basis set.
    pub fn n_funcs(&self) -> usize {
        self.shells.iter().map(Shell::n_funcs).sum()
    }

    /// The largest angular momentum in the basis set.
    pub fn max_l(&self) -> u32 {
        self.shells.iter().map(Shell::l).max().unwrap_or(0)
    }

    /// Sorts the shells of each atom by their angular momenta, keeping the relative order of
    /// shells with equal angular momenta.
    pub fn sort_by_angular_momentum(&mut self) -> &mut Self {
        let shells = std::mem::take(&mut self.shells);
        let mut sorted = Vec::with_capacity(shells.len());
        for (_, group) in shells
            .into_iter()
            .group_by(|shell| shell.atom_index())
            .into_iter()
        {
            let mut atom_shells = group.collect_vec();
            atom_shells.sort_by_key(Shell::l);
            sorted.extend(atom_shells);
        }
        self.shells = sorted;
        self.update_boundaries()
    }

    /// The function boundaries `(start, end)` of the shells.
    pub fn shell_boundaries(&self) -> &[(usize, usize)] {
        &self.shell_boundaries
    }

    /// The function boundaries `(start, end)` of consecutive runs of shells on the same atom.
    pub fn atom_boundaries(&self) -> &[(usize, usize)] {
        &self.atom_boundaries
    }

    /// The shells, in order.
    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    /// Returns an iterator over the shells.
    pub fn iter(&self) -> std::slice::Iter<'_, Shell> {
        self.shells.iter()
    }

    /// Labels of all functions in the basis set, prefixed by the atom index.
    pub fn function_labels(&self) -> Vec<String> {
        self.shells
            .iter()
            .flat_map(|shell| {
                let atom = shell
                    .atom_index()
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "-".to_string());
                shell
                    .function_labels()
                    .into_iter()
                    .map(move |label| format!("{atom}:{label}"))
            })
            .collect_vec()
    }
}

impl Index<usize> for BasisSet {
    type Output = Shell;

    fn index(&self, i: usize) -> &Self::Output {
        &self.shells[i]
    }
}

impl<'a> IntoIterator for &'a BasisSet {
    type Item = &'a Shell;
    type IntoIter = std::slice::Iter<'a, Shell>;

    fn into_iter(self) -> Self::IntoIter {
        self.shells.iter()
    }
}

impl fmt::Display for BasisSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "┈".repeat(64))?;
        writeln!(
            f,
            "{:>5} {:>5} {:>3} {:>6} {:>6} {:>6} {:>14}",
            "Shell", "Atom", "L", "Type", "#Prim", "#Contr", "Functions"
        )?;
        writeln!(f, "{}", "┈".repeat(64))?;
        for (i, (shell, (start, end))) in
            self.shells.iter().zip(self.shell_boundaries.iter()).enumerate()
        {
            writeln!(
                f,
                "{i:>5} {:>5} {:>3} {:>6} {:>6} {:>6} {:>14}",
                shell
                    .atom_index()
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                angmom_label(shell.l()),
                if shell.basis_shell().is_pure() {
                    "pure"
                } else {
                    "cart"
                },
                shell.n_primitives(),
                shell.n_contractions(),
                format!("{start}..{end}"),
            )?;
        }
        writeln!(f, "{}", "┈".repeat(64))?;
        write!(
            f,
            "{} shells, {} functions",
            self.n_shells(),
            self.n_funcs()
        )
    }
}
