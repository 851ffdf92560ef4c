//! Tile dataset model, ingestion, and persistence

/// Parallel-array tile collections at full and quantized precision
pub mod corpus;
/// Pickled batch decoding into a tile corpus
pub mod ingest;
/// Columnar `.npz` store for quantized datasets
pub mod store;
/// Single tile representation and mean color computation
pub mod tile;

pub use corpus::{TileCorpus, TileDataset};
pub use tile::{Tile, TileShape};
