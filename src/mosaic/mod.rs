//! Photomosaic reconstruction
//!
//! Planning downsamples the source photo and matches each cell against the
//! tile index; composition paints the matched tiles into an output canvas.

/// Tile matching and canvas painting
pub mod compose;
/// Cached dataset and index shared across requests
pub mod context;
/// Cell grid sizing and source sampling
pub mod plan;

pub use compose::{compose, render};
pub use context::MosaicContext;
pub use plan::MosaicPlan;
