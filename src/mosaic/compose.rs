//! Mosaic composition: tile matching and canvas painting

use crate::io::error::{MosaicError, Result, corrupt_data, invalid_parameter};
use crate::mosaic::plan::MosaicPlan;
use crate::spatial::ColorIndex;
use image::DynamicImage;
use ndarray::{Array3, ArrayView4, Axis, s};

/// Rebuild `source` as a grid of the closest-colored tiles
///
/// The canvas has shape (rows * H, cols * W, C) where (H, W, C) is the tile
/// shape of `tile_images`. `index` must have been built over the mean colors
/// of exactly these tiles.
///
/// # Errors
///
/// Returns an error if:
/// - `tile_images` holds no tiles
/// - `index` covers a different number of tiles than `tile_images`
/// - The source photo is smaller than one tile
pub fn compose(
    source: &DynamicImage,
    index: &ColorIndex,
    tile_images: ArrayView4<'_, u8>,
) -> Result<Array3<u8>> {
    let (count, tile_height, tile_width, _) = tile_images.dim();
    if count == 0 {
        return Err(MosaicError::EmptyCorpus);
    }
    if index.len() != count {
        return Err(corrupt_data(&format!(
            "index covers {} tiles but {count} tile images were supplied",
            index.len()
        )));
    }

    let plan = MosaicPlan::build(source, index, tile_height, tile_width)?;
    render(&plan, tile_images)
}

/// Paint every planned tile into a fresh canvas
///
/// Cells are placed row-major at (row * H, col * W) with no blending.
///
/// # Errors
///
/// Returns an error if:
/// - The tile size of `tile_images` differs from the one the plan was made for
/// - The plan references a tile beyond `tile_images`
pub fn render(plan: &MosaicPlan, tile_images: ArrayView4<'_, u8>) -> Result<Array3<u8>> {
    let (count, tile_height, tile_width, channels) = tile_images.dim();
    if (tile_height, tile_width) != (plan.tile_height(), plan.tile_width()) {
        return Err(invalid_parameter(
            "tile_images",
            &format!("{tile_width}x{tile_height}"),
            &format!(
                "plan was made for {}x{} tiles",
                plan.tile_width(),
                plan.tile_height()
            ),
        ));
    }

    let mut canvas = Array3::zeros((plan.rows() * tile_height, plan.cols() * tile_width, channels));
    for ((row, col), &tile) in plan.tile_grid().indexed_iter() {
        if tile >= count {
            return Err(MosaicError::InvalidTileIndex {
                index: tile,
                max_tiles: count,
            });
        }
        let top = row * tile_height;
        let left = col * tile_width;
        canvas
            .slice_mut(s![top..top + tile_height, left..left + tile_width, ..])
            .assign(&tile_images.index_axis(Axis(0), tile));
    }

    Ok(canvas)
}
