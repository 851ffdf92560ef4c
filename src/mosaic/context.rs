//! Shared read-only mosaic state
//!
//! A context owns one quantized dataset and the index built over its mean
//! colors. Both are immutable and reference counted, so a context can be
//! built once per process and cloned into every request that needs it.

use crate::dataset::TileDataset;
use crate::dataset::store;
use crate::io::error::Result;
use crate::io::image::canvas_to_image;
use crate::mosaic::compose::compose;
use crate::spatial::ColorIndex;
use image::DynamicImage;
use log::info;
use ndarray::Array3;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Dataset and color index shared across mosaic requests
#[derive(Clone, Debug)]
pub struct MosaicContext {
    dataset: Arc<TileDataset>,
    index: Arc<ColorIndex>,
}

impl MosaicContext {
    /// Read the store at `path` and index its mean colors
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or holds no tiles
    pub fn open(path: &Path) -> Result<Self> {
        let dataset = store::read(path)?;
        Self::from_dataset(dataset)
    }

    /// Index an in-memory dataset
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset holds no tiles
    pub fn from_dataset(dataset: TileDataset) -> Result<Self> {
        let start = Instant::now();
        let index = ColorIndex::build(dataset.means())?;
        info!(
            "Indexed {} tile colors in {:.2?}",
            index.len(),
            start.elapsed()
        );

        Ok(Self {
            dataset: Arc::new(dataset),
            index: Arc::new(index),
        })
    }

    /// The shared dataset
    pub fn dataset(&self) -> &TileDataset {
        &self.dataset
    }

    /// The shared color index
    pub fn index(&self) -> &ColorIndex {
        &self.index
    }

    /// Compose a mosaic of `source` as a raw (H, W, C) canvas
    ///
    /// # Errors
    ///
    /// Returns an error if the source photo is smaller than one tile
    pub fn compose(&self, source: &DynamicImage) -> Result<Array3<u8>> {
        compose(source, &self.index, self.dataset.images())
    }

    /// Compose a mosaic of `source` as an image ready for encoding
    ///
    /// # Errors
    ///
    /// Returns an error if the source photo is smaller than one tile or the
    /// canvas cannot be represented as an image
    pub fn compose_image(&self, source: &DynamicImage) -> Result<DynamicImage> {
        let canvas = self.compose(source)?;
        canvas_to_image(&canvas)
    }
}
