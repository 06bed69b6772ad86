//! Market structure: swing pivots and breaks of structure.

pub mod bos;
pub mod swing;

pub use bos::{find_bos, structure_bias};
pub use swing::{find_swings, find_swings_in, SwingConfig};
