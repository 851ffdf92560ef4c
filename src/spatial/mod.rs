//! Spatial search over tile colors
//!
//! This module contains the nearest-neighbor index used to match source
//! photo samples against tile mean colors.

/// Static k-d tree with deterministic tie-breaking
pub mod kdtree;

pub use kdtree::{ColorIndex, ColorPoint, Neighbor};
