//! Struct-of-arrays tile collections
//!
//! [`TileCorpus`] is the full-precision form produced by ingestion. [`TileDataset`]
//! is the quantized form that the store persists and every mosaic request reads.
//! Both keep images, labels, and means as parallel arrays indexed by the same
//! tile position; rows are never reordered independently.

use crate::dataset::tile::{COLOR_COMPONENTS, Tile, TileShape, mean_color};
use crate::io::configuration::{MEANS_ARRAY, META_ARRAY};
use crate::io::error::{MosaicError, Result, corrupt_data};
use ndarray::{Array1, Array2, Array4, ArrayView1, ArrayView2, ArrayView3, ArrayView4, Axis};
use num_traits::ToPrimitive;
use std::collections::BTreeMap;

/// Ingested tiles at full precision
#[derive(Clone, Debug, PartialEq)]
pub struct TileCorpus {
    images: Array4<u8>,
    labels: Array1<i64>,
    means: Array2<f64>,
}

impl TileCorpus {
    /// Assemble a corpus from parallel arrays, computing mean colors from `images`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `images` and `labels` disagree in length
    /// - The tile geometry has a zero dimension or an unsupported channel count
    pub fn from_arrays(images: Array4<u8>, labels: Array1<i64>) -> Result<Self> {
        let means = compute_means(images.view());
        Self::new(images, labels, means)
    }

    /// Assemble a corpus from parallel arrays with precomputed means
    ///
    /// # Errors
    ///
    /// Returns an error if the three arrays are not parallel, `means` is not
    /// N x 3, or the tile geometry is invalid
    pub fn new(images: Array4<u8>, labels: Array1<i64>, means: Array2<f64>) -> Result<Self> {
        check_parallel(images.view(), labels.len(), means.dim())?;
        Ok(Self {
            images,
            labels,
            means,
        })
    }

    /// Collect in-memory tiles into a corpus, preserving their order
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `tiles` is empty (the tile geometry is unknown)
    /// - Tiles disagree in shape
    pub fn from_tiles(tiles: Vec<Tile>) -> Result<Self> {
        let shape = tiles.first().map(Tile::shape).ok_or(MosaicError::EmptyCorpus)?;
        let count = tiles.len();

        let mut images = Array4::zeros((count, shape.height, shape.width, shape.channels));
        let mut labels = Array1::zeros(count);
        let mut means = Array2::zeros((count, COLOR_COMPONENTS));

        for (row, tile) in tiles.into_iter().enumerate() {
            if tile.shape() != shape {
                return Err(corrupt_data(&format!(
                    "tile {row} has shape {:?}, expected {shape:?}",
                    tile.shape()
                )));
            }
            let (pixels, label, mean) = tile.into_parts();
            images.index_axis_mut(Axis(0), row).assign(&pixels);
            if let Some(slot) = labels.get_mut(row) {
                *slot = label;
            }
            means.row_mut(row).assign(&ArrayView1::from(&mean));
        }

        Self::new(images, labels, means)
    }

    /// Number of tiles
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the corpus holds no tiles
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Geometry shared by every tile
    pub fn tile_shape(&self) -> TileShape {
        shape_of(self.images.view())
    }

    /// Pixel data, shape (N, H, W, C)
    pub fn images(&self) -> ArrayView4<'_, u8> {
        self.images.view()
    }

    /// Labels, shape (N,)
    pub const fn labels(&self) -> &Array1<i64> {
        &self.labels
    }

    /// Full-precision mean colors, shape (N, 3)
    pub fn means(&self) -> ArrayView2<'_, f64> {
        self.means.view()
    }

    /// Pixel block of the tile at `index`
    pub fn tile_pixels(&self, index: usize) -> Option<ArrayView3<'_, u8>> {
        (index < self.len()).then(|| self.images.index_axis(Axis(0), index))
    }

    /// Narrow labels and mean colors to unsigned 8-bit elements
    ///
    /// Mean colors are truncated toward zero. This is the lossy step every
    /// stored dataset goes through, so matching always uses quantized means.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Encoding`] for the first label or mean value
    /// outside `0..=255` (or not finite)
    pub fn quantize(&self) -> Result<TileDataset> {
        let (labels, means) = self.quantized_columns()?;
        TileDataset::new(self.images.clone(), labels, means)
    }

    /// Quantized `(labels, means)` without copying the pixel data
    ///
    /// # Errors
    ///
    /// Same as [`Self::quantize`]
    pub fn quantized_columns(&self) -> Result<(Array1<u8>, Array2<u8>)> {
        let mut labels = Array1::zeros(self.len());
        for ((row, &label), slot) in self.labels.indexed_iter().zip(labels.iter_mut()) {
            *slot = label.to_u8().ok_or_else(|| MosaicError::Encoding {
                array: META_ARRAY,
                row,
                value: label.to_string(),
            })?;
        }

        let mut means = Array2::zeros(self.means.dim());
        for (((row, _), &mean), slot) in self.means.indexed_iter().zip(means.iter_mut()) {
            *slot = mean.to_u8().ok_or_else(|| MosaicError::Encoding {
                array: MEANS_ARRAY,
                row,
                value: mean.to_string(),
            })?;
        }

        Ok((labels, means))
    }
}

/// Quantized tiles as persisted by the store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileDataset {
    images: Array4<u8>,
    labels: Array1<u8>,
    means: Array2<u8>,
}

impl TileDataset {
    /// Assemble a dataset from parallel arrays
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::CorruptData`] if the arrays are not parallel,
    /// `means` is not N x 3, or the tile geometry is invalid
    pub fn new(images: Array4<u8>, labels: Array1<u8>, means: Array2<u8>) -> Result<Self> {
        check_parallel(images.view(), labels.len(), means.dim())?;
        Ok(Self {
            images,
            labels,
            means,
        })
    }

    /// Number of tiles
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the dataset holds no tiles
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Geometry shared by every tile
    pub fn tile_shape(&self) -> TileShape {
        shape_of(self.images.view())
    }

    /// Pixel data, shape (N, H, W, C)
    pub fn images(&self) -> ArrayView4<'_, u8> {
        self.images.view()
    }

    /// Labels, shape (N,)
    pub const fn labels(&self) -> &Array1<u8> {
        &self.labels
    }

    /// Quantized mean colors, shape (N, 3)
    pub fn means(&self) -> ArrayView2<'_, u8> {
        self.means.view()
    }

    /// Pixel block of the tile at `index`
    pub fn tile_pixels(&self, index: usize) -> Option<ArrayView3<'_, u8>> {
        (index < self.len()).then(|| self.images.index_axis(Axis(0), index))
    }

    /// Count of tiles per label, in ascending label order
    pub fn label_histogram(&self) -> BTreeMap<u8, usize> {
        let mut histogram = BTreeMap::new();
        for &label in &self.labels {
            *histogram.entry(label).or_insert(0) += 1;
        }
        histogram
    }

    /// Consume the dataset and return `(images, labels, means)`
    pub fn into_parts(self) -> (Array4<u8>, Array1<u8>, Array2<u8>) {
        (self.images, self.labels, self.means)
    }
}

/// Mean color of every tile in an (N, H, W, C) block
pub fn compute_means(images: ArrayView4<'_, u8>) -> Array2<f64> {
    let mut means = Array2::zeros((images.len_of(Axis(0)), COLOR_COMPONENTS));
    for (tile, mut row) in images.outer_iter().zip(means.rows_mut()) {
        let mean = mean_color(tile);
        row.assign(&ArrayView1::from(&mean));
    }
    means
}

fn shape_of(images: ArrayView4<'_, u8>) -> TileShape {
    let (_, height, width, channels) = images.dim();
    TileShape::new(height, width, channels)
}

// Shared by both collections: rows must line up and the geometry must be usable
fn check_parallel(
    images: ArrayView4<'_, u8>,
    label_count: usize,
    means_dim: (usize, usize),
) -> Result<()> {
    let image_count = images.len_of(Axis(0));
    let (mean_count, mean_width) = means_dim;

    if image_count != label_count || image_count != mean_count {
        return Err(corrupt_data(&format!(
            "array lengths differ: images={image_count}, meta={label_count}, means={mean_count}"
        )));
    }
    if mean_width != COLOR_COMPONENTS {
        return Err(corrupt_data(&format!(
            "means rows have {mean_width} components, expected {COLOR_COMPONENTS}"
        )));
    }
    shape_of(images)
        .validate()
        .map_err(|e| corrupt_data(&format!("invalid tile geometry: {e}")))
}
