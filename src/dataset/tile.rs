//! Single tile representation and mean color summaries
//!
//! A tile is a small fixed-size image with an integer label. Its mean color is
//! the fingerprint used for matching and is computed exactly once, when the
//! tile is built.

use crate::io::error::{Result, invalid_parameter};
use ndarray::{Array3, ArrayView3, Axis};

/// Color space dimensionality used for matching
pub const COLOR_COMPONENTS: usize = 3;

/// Pixel geometry shared by every tile of one dataset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileShape {
    /// Rows of pixels
    pub height: usize,
    /// Columns of pixels
    pub width: usize,
    /// Channels per pixel (1 for grayscale, 3 for RGB)
    pub channels: usize,
}

impl TileShape {
    /// Create a shape without validating it
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    /// Number of pixels in one channel plane; only meaningful for a validated shape
    pub const fn plane_len(&self) -> usize {
        self.height * self.width
    }

    /// Length of one flat channel-major record
    pub const fn record_len(&self) -> usize {
        self.plane_len() * self.channels
    }

    /// Reject shapes the dataset cannot hold
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any dimension is zero
    /// - The channel count is not 1 or 3
    /// - One record's length does not fit in `usize`
    pub fn validate(&self) -> Result<()> {
        if self.height == 0 || self.width == 0 {
            return Err(invalid_parameter(
                "tile_shape",
                &format!("{}x{}", self.width, self.height),
                &"tile dimensions must be non-zero",
            ));
        }
        if self.channels != 1 && self.channels != COLOR_COMPONENTS {
            return Err(invalid_parameter(
                "channels",
                &self.channels,
                &"tiles must have 1 (grayscale) or 3 (RGB) channels",
            ));
        }
        let record_len = self
            .height
            .checked_mul(self.width)
            .and_then(|plane| plane.checked_mul(self.channels));
        if record_len.is_none() {
            return Err(invalid_parameter(
                "tile_shape",
                &format!("{}x{}", self.width, self.height),
                &"tile dimensions overflow the record length",
            ));
        }
        Ok(())
    }
}

/// One decoded tile with its label and mean color
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pixels: Array3<u8>,
    label: i64,
    mean_color: [f64; COLOR_COMPONENTS],
}

impl Tile {
    /// Build a tile from an (H, W, C) pixel block, computing its mean color
    ///
    /// # Errors
    ///
    /// Returns an error if the pixel block has an invalid [`TileShape`]
    pub fn new(pixels: Array3<u8>, label: i64) -> Result<Self> {
        let (height, width, channels) = pixels.dim();
        TileShape::new(height, width, channels).validate()?;
        let mean_color = mean_color(pixels.view());

        Ok(Self {
            pixels,
            label,
            mean_color,
        })
    }

    /// Pixel block, shape (H, W, C)
    pub const fn pixels(&self) -> &Array3<u8> {
        &self.pixels
    }

    /// Integer class label
    pub const fn label(&self) -> i64 {
        self.label
    }

    /// Per-channel mean intensity
    pub const fn mean_color(&self) -> [f64; COLOR_COMPONENTS] {
        self.mean_color
    }

    /// Geometry of the pixel block
    pub fn shape(&self) -> TileShape {
        let (height, width, channels) = self.pixels.dim();
        TileShape::new(height, width, channels)
    }

    /// Consume the tile and return its parts
    pub fn into_parts(self) -> (Array3<u8>, i64, [f64; COLOR_COMPONENTS]) {
        (self.pixels, self.label, self.mean_color)
    }
}

/// Average every channel of a pixel block over all of its pixels
///
/// Grayscale blocks have their single channel mean replicated into all three
/// components so that every tile lives in the same 3-dimensional color space.
/// Channels beyond the third are ignored. An empty block averages to zero.
pub fn mean_color(pixels: ArrayView3<'_, u8>) -> [f64; COLOR_COMPONENTS] {
    let (height, width, channels) = pixels.dim();
    let count = height * width;
    if count == 0 || channels == 0 {
        return [0.0; COLOR_COMPONENTS];
    }

    let channel_mean = |channel: usize| {
        let sum: u64 = pixels
            .index_axis(Axis(2), channel)
            .iter()
            .map(|&v| u64::from(v))
            .sum();
        sum as f64 / count as f64
    };

    if channels < COLOR_COMPONENTS {
        let gray = channel_mean(0);
        return [gray; COLOR_COMPONENTS];
    }

    [channel_mean(0), channel_mean(1), channel_mean(2)]
}
