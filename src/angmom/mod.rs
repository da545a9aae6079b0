//! Angular momentum labels and Cartesian/solid-harmonic conversion.

pub mod sh_conversion;
pub mod spherical;

/// The largest shell angular momentum supported by the solid-harmonic tables.
pub const MAX_ANGMOM: u32 = 6;

/// Alphabetical labels of angular momenta.
pub static ANGMOM_LABELS: [&str; 7] = ["S", "P", "D", "F", "G", "H", "I"];

/// Returns the alphabetical label of an angular momentum, or `l=<n>` if it has no letter.
pub fn angmom_label(l: u32) -> String {
    ANGMOM_LABELS
        .get(l as usize)
        .map(|label| (*label).to_string())
        .unwrap_or_else(|| format!("l={l}"))
}
