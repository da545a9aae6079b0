//! Atoms, element look-up and point charges.

use std::collections::HashMap;
use std::fmt;

use anyhow::{self, ensure, format_err};
use lazy_static::lazy_static;
use nalgebra::Point3;
use periodic_table;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Conversion factor from Ångström to Bohr.
pub const ANGSTROM_TO_BOHR: f64 = 1.0 / 0.529_177_210_903;

lazy_static! {
    static ref ELEMENT_LABEL_RE: Regex =
        Regex::new(r"^([A-Za-z]{1,3})[0-9_]*$").expect("Regex pattern invalid.");
}

// ----------
// ElementMap
// ----------

/// A struct storing a look-up of element symbols to give atomic numbers and atomic masses.
pub struct ElementMap<'a> {
    /// A [`HashMap`] from a symbol string to a tuple of atomic number and atomic mass.
    pub map: HashMap<&'a str, (u32, f64)>,
}

impl Default for ElementMap<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementMap<'static> {
    /// Creates a new [`ElementMap`] for all elements in the periodic table.
    #[must_use]
    pub fn new() -> ElementMap<'static> {
        let mut map = HashMap::new();
        for element in periodic_table::periodic_table() {
            let mass = parse_atomic_mass(element.atomic_mass).unwrap_or(0.0);
            map.insert(element.symbol, (element.atomic_number, mass));
        }
        ElementMap { map }
    }
}

impl<'a> ElementMap<'a> {
    /// Looks up an element label such as `H`, `h`, `O1` or `Cl_2`, returning its canonical
    /// symbol, atomic number and mass.
    ///
    /// # Errors
    ///
    /// Errors if the label does not name a known element.
    pub fn lookup(&self, label: &str) -> Result<(&'a str, u32, f64), anyhow::Error> {
        let caps = ELEMENT_LABEL_RE
            .captures(label.trim())
            .ok_or_else(|| format_err!("Invalid atom label `{label}`."))?;
        let letters = caps
            .get(1)
            .map(|m| m.as_str())
            .ok_or_else(|| format_err!("Invalid atom label `{label}`."))?;
        let mut chars = letters.chars();
        let symbol = match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(char::to_lowercase))
                .collect::<String>(),
            None => String::new(),
        };
        self.map
            .get_key_value(symbol.as_str())
            .map(|(sym, (z, mass))| (*sym, *z, *mass))
            .ok_or_else(|| format_err!("Unknown element `{symbol}` from atom label `{label}`."))
    }
}

/// Parses an atomic mass string of [`periodic_table`], which is either `x.y(z)` with the
/// uncertain digit `z` in parentheses, or `[x]` with the mass number of the most stable isotope.
fn parse_atomic_mass(mass_str: &str) -> Result<f64, anyhow::Error> {
    let mass = mass_str.replace(&['(', ')', '[', ']'][..], "");
    mass.parse::<f64>()
        .map_err(|_| format_err!("Unable to parse atomic mass string {mass}."))
}

// ----
// Atom
// ----

/// A struct representing an atom. Coordinates are always stored in Bohr.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// The atomic number of the atom.
    pub atomic_number: u32,

    /// The atomic symbol of the atom.
    pub atomic_symbol: String,

    /// The weighted-average atomic mass for all naturally occuring isotopes.
    pub atomic_mass: f64,

    /// The position of the atom in Bohr.
    pub coordinates: Point3<f64>,
}

impl Atom {
    /// Parses an atom line in an `xyz` file to construct an [`Atom`].
    ///
    /// # Arguments
    ///
    /// * `line` - A line containing an atom label and three Cartesian coordinates.
    /// * `emap` - The element look-up.
    /// * `bohr` - If `true`, the coordinates are in Bohr; otherwise they are in Ångström and are
    /// converted.
    ///
    /// # Errors
    ///
    /// Errors if the line does not have exactly four fields, if the label is not an element, or
    /// if a coordinate cannot be parsed.
    pub fn from_xyz(line: &str, emap: &ElementMap, bohr: bool) -> Result<Atom, anyhow::Error> {
        let split = line.split_whitespace().collect::<Vec<_>>();
        ensure!(
            split.len() == 4,
            "Expected an atom label followed by three coordinates, got `{line}`."
        );
        let coords = split[1..]
            .iter()
            .map(|s| {
                s.parse::<f64>()
                    .map_err(|err| format_err!("Unable to parse coordinate `{s}`: {err}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let coordinates = Point3::new(coords[0], coords[1], coords[2]);
        Atom::new_ordinary(split[0], coordinates, emap, bohr)
    }

    /// Creates an atom from a label and a position.
    ///
    /// # Errors
    ///
    /// Errors if `label` is not an element.
    pub fn new_ordinary(
        label: &str,
        coordinates: Point3<f64>,
        emap: &ElementMap,
        bohr: bool,
    ) -> Result<Atom, anyhow::Error> {
        let (symbol, atomic_number, atomic_mass) = emap.lookup(label)?;
        let coordinates = if bohr {
            coordinates
        } else {
            coordinates * ANGSTROM_TO_BOHR
        };
        Ok(Atom {
            atomic_number,
            atomic_symbol: symbol.to_string(),
            atomic_mass,
            coordinates,
        })
    }

    /// The nuclear charge of this atom.
    pub fn nuclear_charge(&self) -> f64 {
        f64::from(self.atomic_number)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>3} {:+14.8} {:+14.8} {:+14.8}",
            self.atomic_symbol, self.coordinates[0], self.coordinates[1], self.coordinates[2],
        )
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

// -----------
// PointCharge
// -----------

/// A classical point charge, in Bohr and atomic units of charge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointCharge {
    /// The position of the charge.
    pub position: Point3<f64>,

    /// The magnitude of the charge.
    pub charge: f64,
}

impl PointCharge {
    /// Constructs a point charge.
    pub fn new(position: Point3<f64>, charge: f64) -> Self {
        Self { position, charge }
    }
}

impl From<&Atom> for PointCharge {
    fn from(atom: &Atom) -> Self {
        Self::new(atom.coordinates, atom.nuclear_charge())
    }
}
