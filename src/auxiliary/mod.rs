//! Helper items to assist the working of GTOInts.

pub mod atom;
pub mod molecule;
