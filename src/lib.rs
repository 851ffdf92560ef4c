//! Photomosaic pipeline built on a labelled tile dataset
//!
//! Pickled image batches are decoded into a tile corpus, summarized by each
//! tile's mean color, and persisted as a columnar store. Source photos are then
//! downsampled to a cell grid; each cell is replaced by the tile whose mean color
//! is nearest, found through a k-d tree over the tile means.

#![deny(unsafe_code)]

/// Tile records, corpus assembly, batch ingestion, and the persistent store
pub mod dataset;
/// Input/output operations, configuration, and error handling
pub mod io;
/// Cell planning and mosaic composition
pub mod mosaic;
/// Nearest-color search over tile means
pub mod spatial;

pub use io::error::{MosaicError, Result};
