//! Dataset constants and runtime configuration defaults

use crate::dataset::tile::TileShape;

// Geometry of the CIFAR-style batches the ingestor expects by default
/// Height of one tile in pixels
pub const TILE_HEIGHT: usize = 32;
/// Width of one tile in pixels
pub const TILE_WIDTH: usize = 32;
/// Color channels per tile
pub const TILE_CHANNELS: usize = 3;

/// File name prefix identifying batch files inside the batch directory
pub const BATCH_FILE_PREFIX: &str = "data_batch_";
/// Pickle dictionary key holding the flat image records
pub const DATA_KEY: &str = "data";
/// Pickle dictionary key holding the integer labels
pub const LABELS_KEY: &str = "labels";

// Array names inside the tile store
/// Tile pixel array, shape (N, H, W, C)
pub const IMAGES_ARRAY: &str = "images";
/// Tile label array, shape (N,)
pub const META_ARRAY: &str = "meta";
/// Quantized mean color array, shape (N, 3)
pub const MEANS_ARRAY: &str = "means";

/// Store file written by `build` and read by `compose` when no path is given
pub const DEFAULT_STORE_FILE: &str = "mosaic_tiles.npz";

/// Point count below which k-d tree ranges are scanned linearly
pub const KD_LEAF_SIZE: usize = 8;

// Output settings
/// Suffix added to composed mosaic filenames
pub const OUTPUT_SUFFIX: &str = "_mosaic";
/// Extension of composed mosaic files
pub const OUTPUT_EXTENSION: &str = "png";
/// Photo extensions accepted by `compose` (compared case-insensitively)
pub const PHOTO_EXTENSIONS: [&str; 3] = ["png", "jpeg", "jpg"];

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

/// Log specification used when neither `--log-level` nor `RUST_LOG` is set
pub const DEFAULT_LOG_SPEC: &str = "info";

/// Parameters controlling batch discovery and record decoding
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestConfig {
    /// Only files whose name starts with this prefix are ingested
    pub batch_prefix: String,
    /// Geometry every record must decode to
    pub shape: TileShape,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_prefix: BATCH_FILE_PREFIX.to_string(),
            shape: TileShape::new(TILE_HEIGHT, TILE_WIDTH, TILE_CHANNELS),
        }
    }
}
