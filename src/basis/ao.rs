//! Angular ordering of the functions in a Gaussian shell.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::slice::Iter;

use anyhow::{self, bail, ensure, format_err};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::angmom::{angmom_label, MAX_ANGMOM};
use crate::errors::IntegralError;

#[cfg(test)]
#[path = "ao_tests.rs"]
mod ao_tests;

// -------------------
// Shell order structs
// -------------------

// ~~~~~~~~~
// PureOrder
// ~~~~~~~~~

/// Structure to contain information about the ordering of pure Gaussians of a certain rank.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PureOrder {
    /// A sequence of $`m_l`$ values giving the ordering of the pure Gaussians.
    mls: Vec<i32>,

    /// The rank of the pure Gaussians.
    pub lpure: u32,
}

impl PureOrder {
    /// Constructs a new [`PureOrder`] structure from its constituting $`m_l`$ values.
    ///
    /// # Errors
    ///
    /// Errors if the $`m_l`$ values do not form a complete set for the deduced rank.
    pub fn new(mls: &[i32]) -> Result<Self, anyhow::Error> {
        let lpure = mls
            .iter()
            .map(|m| m.unsigned_abs())
            .max()
            .ok_or_else(|| format_err!("No m values found."))?;
        let pure_order = Self {
            mls: mls.to_vec(),
            lpure,
        };
        ensure!(
            pure_order.verify(),
            IntegralError::MalformedBasis(format!("invalid pure order {mls:?}"))
        );
        Ok(pure_order)
    }

    /// Constructs a new [`PureOrder`] structure for a specified rank with increasing-$`m`$ order.
    ///
    /// # Arguments
    ///
    /// * `lpure` - The required pure Gaussian rank.
    ///
    /// # Returns
    ///
    /// A [`PureOrder`] struct for a specified rank with increasing-$`m`$ order.
    #[must_use]
    pub fn increasingm(lpure: u32) -> Self {
        let lpure_i32 = lpure as i32;
        Self {
            mls: (-lpure_i32..=lpure_i32).collect_vec(),
            lpure,
        }
    }

    /// Constructs a new [`PureOrder`] structure for a specified rank with decreasing-$`m`$ order.
    #[must_use]
    pub fn decreasingm(lpure: u32) -> Self {
        let lpure_i32 = lpure as i32;
        Self {
            mls: (-lpure_i32..=lpure_i32).rev().collect_vec(),
            lpure,
        }
    }

    /// Constructs a new [`PureOrder`] structure for a specified rank with Molden order, *i.e.*
    /// $`0, 1, -1, 2, -2, \ldots`$.
    #[must_use]
    pub fn molden(lpure: u32) -> Self {
        let lpure_i32 = lpure as i32;
        let mls = (0..=lpure_i32)
            .flat_map(|absm| {
                if absm == 0 {
                    vec![0]
                } else {
                    vec![absm, -absm]
                }
            })
            .collect_vec();
        Self { mls, lpure }
    }

    /// Verifies if this [`PureOrder`] struct is valid.
    #[must_use]
    pub fn verify(&self) -> bool {
        let mls_set = self.mls.iter().collect::<HashSet<_>>();
        let lpure = self.lpure;
        self.mls.len() == self.ncomps()
            && mls_set.len() == self.ncomps()
            && mls_set.iter().all(|m| m.unsigned_abs() <= lpure)
    }

    /// Iterates over the constituent $`m_l`$ values.
    pub fn iter(&'_ self) -> Iter<'_, i32> {
        self.mls.iter()
    }

    /// Returns the number of pure components in the shell.
    pub fn ncomps(&self) -> usize {
        2 * self.lpure as usize + 1
    }

    /// Returns the indices of the components of this order within the increasing-$`m`$ order of
    /// the same rank. Element `i` of the result is the increasing-$`m`$ position of the `i`th
    /// component here.
    pub fn indices_in_increasingm(&self) -> Vec<usize> {
        let lpure_i32 = self.lpure as i32;
        self.mls
            .iter()
            .map(|m| (m + lpure_i32) as usize)
            .collect_vec()
    }
}

impl fmt::Display for PureOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pure {} ({})",
            angmom_label(self.lpure),
            self.mls.iter().map(|m| format!("{m:+}")).join(", ")
        )
    }
}

impl fmt::Debug for PureOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PureOrder({}: {:?})", self.lpure, self.mls)
    }
}

// ~~~~~~~~~
// CartOrder
// ~~~~~~~~~

/// Structure to contain information about the ordering of Cartesian Gaussians of a certain rank.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartOrder {
    /// A sequence of $`(l_x, l_y, l_z)`$ tuples giving the ordering of the Cartesian Gaussians.
    pub cart_tuples: Vec<(u32, u32, u32)>,

    /// The rank of the Cartesian Gaussians.
    pub lcart: u32,
}

impl CartOrder {
    /// Constructs a new [`CartOrder`] structure from its constituting tuples, each of which contains
    /// the $`x`$, $`y`$, and $`z`$ exponents for one Cartesian term.
    ///
    /// # Errors
    ///
    /// Errors if the Cartesian tuples are invalid (*e.g.* missing components or containing
    /// inconsistent components).
    pub fn new(cart_tuples: &[(u32, u32, u32)]) -> Result<Self, anyhow::Error> {
        let first_tuple = cart_tuples
            .first()
            .ok_or(format_err!("No Cartesian tuples found."))?;
        let lcart = first_tuple.0 + first_tuple.1 + first_tuple.2;
        let cart_order = CartOrder {
            cart_tuples: cart_tuples.to_vec(),
            lcart,
        };
        ensure!(
            cart_order.verify(),
            IntegralError::MalformedBasis(format!("invalid Cartesian order {cart_tuples:?}"))
        );
        Ok(cart_order)
    }

    /// Constructs a new [`CartOrder`] structure for a specified rank with lexicographic order.
    ///
    /// This is the order in which the recurrence engine produces Cartesian components.
    ///
    /// # Arguments
    ///
    /// * `lcart` - The required Cartesian Gaussian rank.
    ///
    /// # Returns
    ///
    /// A [`CartOrder`] struct for a specified rank with lexicographic order.
    #[must_use]
    pub fn lex(lcart: u32) -> Self {
        let mut cart_tuples =
            Vec::with_capacity(((lcart + 1) * (lcart + 2)).div_euclid(2) as usize);
        for lx in (0..=lcart).rev() {
            for ly in (0..=(lcart - lx)).rev() {
                cart_tuples.push((lx, ly, lcart - lx - ly));
            }
        }
        Self { cart_tuples, lcart }
    }

    /// Constructs a new [`CartOrder`] structure for a specified rank with Molden order.
    ///
    /// # Errors
    ///
    /// Errors if `lcart` is greater than 4, for which Molden does not define an order.
    pub fn molden(lcart: u32) -> Result<Self, anyhow::Error> {
        let cart_tuples: Vec<(u32, u32, u32)> = match lcart {
            0 => vec![(0, 0, 0)],
            1 => vec![(1, 0, 0), (0, 1, 0), (0, 0, 1)],
            2 => vec![
                (2, 0, 0),
                (0, 2, 0),
                (0, 0, 2),
                (1, 1, 0),
                (1, 0, 1),
                (0, 1, 1),
            ],
            3 => vec![
                (3, 0, 0),
                (0, 3, 0),
                (0, 0, 3),
                (1, 2, 0),
                (2, 1, 0),
                (2, 0, 1),
                (1, 0, 2),
                (0, 1, 2),
                (0, 2, 1),
                (1, 1, 1),
            ],
            4 => vec![
                (4, 0, 0),
                (0, 4, 0),
                (0, 0, 4),
                (3, 1, 0),
                (3, 0, 1),
                (1, 3, 0),
                (0, 3, 1),
                (1, 0, 3),
                (0, 1, 3),
                (2, 2, 0),
                (2, 0, 2),
                (0, 2, 2),
                (2, 1, 1),
                (1, 2, 1),
                (1, 1, 2),
            ],
            _ => bail!(IntegralError::UnsupportedAngularMomentum(lcart)),
        };
        Ok(Self { cart_tuples, lcart })
    }

    /// Constructs a new [`CartOrder`] structure for a specified rank with Q-Chem order, *i.e.*
    /// increasing $`l_z`$, then increasing $`l_y`$ (`xx, xy, yy, xz, yz, zz` for $`l = 2`$).
    #[must_use]
    pub fn qchem(lcart: u32) -> Self {
        let mut cart_tuples = Vec::with_capacity(((lcart + 1) * (lcart + 2)).div_euclid(2) as usize);
        for lz in 0..=lcart {
            for ly in 0..=(lcart - lz) {
                cart_tuples.push((lcart - ly - lz, ly, lz));
            }
        }
        Self { cart_tuples, lcart }
    }

    /// Verifies if this [`CartOrder`] struct is valid.
    #[must_use]
    pub fn verify(&self) -> bool {
        let cart_tuples_set = self.cart_tuples.iter().collect::<HashSet<_>>();
        let lcart = self.lcart;
        self.cart_tuples.len() == self.ncomps()
            && cart_tuples_set.len() == self.ncomps()
            && cart_tuples_set
                .iter()
                .all(|(lx, ly, lz)| lx + ly + lz == lcart)
    }

    /// Iterates over the constituent tuples.
    pub fn iter(&'_ self) -> Iter<'_, (u32, u32, u32)> {
        self.cart_tuples.iter()
    }

    /// Returns the number of Cartesian components in the shell.
    pub fn ncomps(&self) -> usize {
        let lcart = self.lcart as usize;
        ((lcart + 1) * (lcart + 2)).div_euclid(2)
    }

    /// Returns the indices of the components of this order within the lexicographic order of the
    /// same rank.
    pub fn indices_in_lex(&self) -> Vec<usize> {
        let lex_indices = CartOrder::lex(self.lcart)
            .cart_tuples
            .into_iter()
            .enumerate()
            .map(|(i, tuple)| (tuple, i))
            .collect::<HashMap<_, _>>();
        self.cart_tuples
            .iter()
            .filter_map(|tuple| lex_indices.get(tuple).copied())
            .collect_vec()
    }
}

impl fmt::Display for CartOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cart {} ({})",
            angmom_label(self.lcart),
            self.cart_tuples
                .iter()
                .map(|tuple| cart_tuple_to_str(tuple, true))
                .join(", ")
        )
    }
}

impl fmt::Debug for CartOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CartOrder({}: {:?})", self.lcart, self.cart_tuples)
    }
}

/// Translates a Cartesian exponent tuple to a human-understandable string.
///
/// # Arguments
///
/// * `cart_tuple` - A tuple of $`(l_x, l_y, l_z)`$ specifying the exponents of the Cartesian
///   components of the Cartesian Gaussian.
/// * flat - A flag indicating if the string representation is flat (*e.g.* `xxyz`) or compact
///   (*e.g.* `x^2yz`).
pub(crate) fn cart_tuple_to_str(cart_tuple: &(u32, u32, u32), flat: bool) -> String {
    if cart_tuple.0 + cart_tuple.1 + cart_tuple.2 == 0u32 {
        "1".to_string()
    } else {
        let cart_array = [cart_tuple.0, cart_tuple.1, cart_tuple.2];
        let carts = ["x", "y", "z"];
        cart_array
            .iter()
            .enumerate()
            .map(|(i, &l)| {
                if flat {
                    carts[i].repeat(l as usize)
                } else {
                    match l.cmp(&1) {
                        Ordering::Greater => format!("{}^{l}", carts[i]),
                        Ordering::Equal => carts[i].to_string(),
                        Ordering::Less => String::new(),
                    }
                }
            })
            .collect::<String>()
    }
}

// ~~~~~~~~~~
// ShellOrder
// ~~~~~~~~~~

/// Enumerated type to indicate the type of the angular functions in a shell and how they are
/// ordered.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ShellOrder {
    /// This variant indicates that the angular functions are real solid harmonics. The associated
    /// value is a [`PureOrder`] struct containing the order of these functions.
    Pure(PureOrder),

    /// This variant indicates that the angular functions are Cartesian functions. The associated
    /// value is a [`CartOrder`] struct containing the order of these functions.
    Cart(CartOrder),
}

impl fmt::Display for ShellOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellOrder::Pure(pure_order) => write!(f, "{pure_order}"),
            ShellOrder::Cart(cart_order) => write!(f, "{cart_order}"),
        }
    }
}

// ----------
// BasisShell
// ----------

/// Structure representing the angular part of a shell: its rank and the type and ordering of its
/// angular functions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasisShell {
    /// A non-negative integer indicating the rank of the shell.
    pub l: u32,

    /// An enum indicating the type of the angular functions in a shell and how they are ordered.
    pub shell_order: ShellOrder,
}

impl BasisShell {
    /// Constructs a new [`BasisShell`].
    ///
    /// # Arguments
    ///
    /// * `l` - The rank of this shell.
    /// * `shell_order` - A [`ShellOrder`] structure specifying the type and ordering of the basis
    ///   functions in this shell.
    ///
    /// # Errors
    ///
    /// Errors if the rank of the shell order does not match `l`, or if `l` exceeds
    /// [`MAX_ANGMOM`].
    pub fn new(l: u32, shell_order: ShellOrder) -> Result<Self, anyhow::Error> {
        ensure!(
            l <= MAX_ANGMOM,
            IntegralError::UnsupportedAngularMomentum(l)
        );
        let order_l = match &shell_order {
            ShellOrder::Pure(pure_order) => pure_order.lpure,
            ShellOrder::Cart(cart_order) => cart_order.lcart,
        };
        ensure!(
            order_l == l,
            IntegralError::MalformedBasis(format!(
                "shell rank {l} does not match the rank {order_l} of its function order"
            ))
        );
        Ok(Self { l, shell_order })
    }

    /// Constructs a shell with the default ordering: lexicographic Cartesian if `cart`,
    /// increasing-$`m`$ pure otherwise.
    pub fn standard(l: u32, cart: bool) -> Result<Self, anyhow::Error> {
        let shell_order = if cart {
            ShellOrder::Cart(CartOrder::lex(l))
        } else {
            ShellOrder::Pure(PureOrder::increasingm(l))
        };
        Self::new(l, shell_order)
    }

    /// Returns `true` if the angular functions are real solid harmonics.
    pub fn is_pure(&self) -> bool {
        matches!(self.shell_order, ShellOrder::Pure(_))
    }

    /// Returns the number of Cartesian components of this rank, regardless of the shell type.
    pub fn n_cart(&self) -> usize {
        let lsize = self.l as usize;
        ((lsize + 1) * (lsize + 2)).div_euclid(2)
    }

    /// Returns the number of basis functions in this shell per contraction.
    pub fn n_funcs(&self) -> usize {
        match self.shell_order {
            ShellOrder::Pure(_) => 2 * self.l as usize + 1,
            ShellOrder::Cart(_) => self.n_cart(),
        }
    }

    /// Returns human-readable labels of the functions in this shell.
    pub fn function_labels(&self) -> Vec<String> {
        match &self.shell_order {
            ShellOrder::Pure(pure_order) => pure_order
                .iter()
                .map(|m| format!("{}{m:+}", angmom_label(self.l).to_lowercase()))
                .collect_vec(),
            ShellOrder::Cart(cart_order) => cart_order
                .iter()
                .map(|tuple| {
                    if self.l == 0 {
                        "s".to_string()
                    } else {
                        cart_tuple_to_str(tuple, true)
                    }
                })
                .collect_vec(),
        }
    }
}
