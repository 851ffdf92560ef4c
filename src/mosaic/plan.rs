//! Mosaic planning from a downsampled source photo
//!
//! The source photo is resized to one pixel per output cell with a single
//! nearest-neighbor sampling pass. Each cell's color is the query for the
//! tile chosen there. No averaging over the full-resolution region under a
//! cell takes place, so a cell's color is that of one sampled source pixel.

use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::spatial::ColorIndex;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use log::debug;
use ndarray::Array2;

/// Resampling filter used to reduce the source photo to the cell grid
pub const SAMPLE_FILTER: FilterType = FilterType::Nearest;

/// Chosen tile index for every cell of the output grid
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MosaicPlan {
    tile_grid: Array2<usize>,
    tile_height: usize,
    tile_width: usize,
}

impl MosaicPlan {
    /// Plan a mosaic of `source` using tiles of the given size
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The source photo is smaller than one tile in either dimension
    /// - A tile dimension is zero
    /// - The index is empty
    pub fn build(
        source: &DynamicImage,
        index: &ColorIndex,
        tile_height: usize,
        tile_width: usize,
    ) -> Result<Self> {
        let (cols, rows) = grid_dimensions(source.dimensions(), (tile_width, tile_height))?;
        let sampled = sample_photo(source, cols, rows)?;

        let mut tile_grid = Array2::zeros((rows, cols));
        for (x, y, pixel) in sampled.enumerate_pixels() {
            let neighbor = index.query_color(pixel.0)?;
            if let Some(cell) = tile_grid.get_mut((y as usize, x as usize)) {
                *cell = neighbor.index;
            }
        }

        debug!(
            "Planned {cols}x{rows} mosaic of {tile_width}x{tile_height} tiles for {}x{} source",
            source.width(),
            source.height()
        );

        Ok(Self {
            tile_grid,
            tile_height,
            tile_width,
        })
    }

    /// Wrap an explicit (rows, cols) grid of tile indices
    ///
    /// # Errors
    ///
    /// Returns an error if a tile dimension is zero
    pub fn from_grid(tile_grid: Array2<usize>, tile_height: usize, tile_width: usize) -> Result<Self> {
        if tile_height == 0 || tile_width == 0 {
            return Err(invalid_parameter(
                "tile_size",
                &format!("{tile_width}x{tile_height}"),
                &"tile dimensions must be non-zero",
            ));
        }
        Ok(Self {
            tile_grid,
            tile_height,
            tile_width,
        })
    }

    /// Tile index per cell, shape (rows, cols)
    pub const fn tile_grid(&self) -> &Array2<usize> {
        &self.tile_grid
    }

    /// Number of cell columns
    pub fn cols(&self) -> usize {
        self.tile_grid.ncols()
    }

    /// Number of cell rows
    pub fn rows(&self) -> usize {
        self.tile_grid.nrows()
    }

    /// Tile height in pixels
    pub const fn tile_height(&self) -> usize {
        self.tile_height
    }

    /// Tile width in pixels
    pub const fn tile_width(&self) -> usize {
        self.tile_width
    }

    /// Output canvas size (width, height) in pixels
    pub fn canvas_dimensions(&self) -> (usize, usize) {
        (self.cols() * self.tile_width, self.rows() * self.tile_height)
    }
}

/// Number of tile columns and rows covering a source of `source` (width, height)
///
/// Each count is the source extent divided by the tile extent, rounded half to
/// even.
///
/// # Errors
///
/// Returns an error if:
/// - A tile dimension is zero
/// - The source is smaller than one tile in either dimension
pub fn grid_dimensions(source: (u32, u32), tile: (usize, usize)) -> Result<(usize, usize)> {
    let (source_width, source_height) = source;
    let (tile_width, tile_height) = tile;

    if tile_width == 0 || tile_height == 0 {
        return Err(invalid_parameter(
            "tile_size",
            &format!("{tile_width}x{tile_height}"),
            &"tile dimensions must be non-zero",
        ));
    }
    if (source_width as usize) < tile_width || (source_height as usize) < tile_height {
        return Err(MosaicError::InvalidSize {
            source_dimensions: source,
            tile_dimensions: tile,
        });
    }

    let cells = |extent: u32, tile_extent: usize| {
        let ratio = f64::from(extent) / tile_extent as f64;
        (ratio.round_ties_even() as usize).max(1)
    };
    Ok((
        cells(source_width, tile_width),
        cells(source_height, tile_height),
    ))
}

/// Resize `source` to exactly `cols` x `rows` RGB pixels
///
/// # Errors
///
/// Returns an error if a grid dimension does not fit in `u32`
pub fn sample_photo(source: &DynamicImage, cols: usize, rows: usize) -> Result<RgbImage> {
    let width = u32::try_from(cols).map_err(|e| invalid_parameter("cols", &cols, &e))?;
    let height = u32::try_from(rows).map_err(|e| invalid_parameter("rows", &rows, &e))?;
    Ok(image::imageops::resize(
        &source.to_rgb8(),
        width,
        height,
        SAMPLE_FILTER,
    ))
}
