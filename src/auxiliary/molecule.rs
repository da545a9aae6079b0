//! Molecules as ordered collections of atoms.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{self, ensure, format_err};
use serde::{Deserialize, Serialize};

use crate::auxiliary::atom::{Atom, ElementMap, PointCharge};

#[cfg(test)]
#[path = "molecule_tests.rs"]
mod molecule_tests;

/// A struct containing the atoms constituting a molecule. Atom order is significant: basis sets
/// built on a molecule follow it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    /// The atoms constituting this molecule.
    pub atoms: Vec<Atom>,
}

impl Molecule {
    /// Constructs a molecule from a list of atoms.
    pub fn from_atoms(atoms: &[Atom]) -> Self {
        Self {
            atoms: atoms.to_vec(),
        }
    }

    /// Parses an `xyz` file to construct a molecule.
    ///
    /// The first line gives the number of atoms, the second line is a comment, and every
    /// following non-empty line describes one atom.
    ///
    /// # Arguments
    ///
    /// * `filename` - The `xyz` file to be parsed.
    /// * `bohr` - If `true`, the coordinates in the file are in Bohr; otherwise they are in
    /// Ångström and are converted.
    ///
    /// # Errors
    ///
    /// Errors if the file cannot be read, is malformed, or declares a different number of atoms
    /// than it contains.
    pub fn from_xyz<P: AsRef<Path>>(filename: P, bohr: bool) -> Result<Self, anyhow::Error> {
        let contents = fs::read_to_string(&filename).map_err(|err| {
            format_err!(
                "Unable to read file {}: {err}",
                filename.as_ref().display()
            )
        })?;
        Self::from_xyz_str(&contents, bohr)
    }

    /// Parses the contents of an `xyz` file. See [`Self::from_xyz`].
    pub fn from_xyz_str(contents: &str, bohr: bool) -> Result<Self, anyhow::Error> {
        let emap = ElementMap::new();
        let mut lines = contents.lines();
        let n_atoms = lines
            .next()
            .ok_or_else(|| format_err!("Empty xyz contents."))?
            .trim()
            .parse::<usize>()
            .map_err(|err| format_err!("Unable to parse the number of atoms: {err}"))?;
        let atoms = lines
            .skip(1)
            .filter(|line| !line.trim().is_empty())
            .map(|line| Atom::from_xyz(line, &emap, bohr))
            .collect::<Result<Vec<_>, _>>()?;
        ensure!(
            atoms.len() == n_atoms,
            "Expected {n_atoms} atoms, got {} instead.",
            atoms.len()
        );
        Ok(Self { atoms })
    }

    /// The number of atoms.
    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// The nuclei of this molecule as point charges of magnitude $`Z`$, in atom order.
    pub fn point_charges(&self) -> Vec<PointCharge> {
        self.atoms.iter().map(PointCharge::from).collect()
    }

    /// The nuclear repulsion energy $`\sum_{A<B} Z_AZ_B/R_{AB}`$.
    pub fn nuclear_repulsion_energy(&self) -> f64 {
        self.atoms
            .iter()
            .enumerate()
            .flat_map(|(i, atom_i)| {
                self.atoms[i + 1..].iter().map(move |atom_j| {
                    atom_i.nuclear_charge() * atom_j.nuclear_charge()
                        / (atom_i.coordinates - atom_j.coordinates).norm()
                })
            })
            .sum()
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "┈".repeat(49))?;
        writeln!(
            f,
            "{:>3} {:>3} {:>14} {:>14} {:>14}",
            "#", "El", "x / bohr", "y / bohr", "z / bohr"
        )?;
        writeln!(f, "{}", "┈".repeat(49))?;
        for (i, atom) in self.atoms.iter().enumerate() {
            writeln!(f, "{i:>3} {atom}")?;
        }
        write!(f, "{}", "┈".repeat(49))
    }
}
