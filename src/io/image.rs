//! Source photo loading and mosaic export

use crate::io::error::{MosaicError, Result, WithPath, corrupt_data, invalid_parameter};
use image::{DynamicImage, ImageBuffer, Luma, Rgb};
use ndarray::Array3;
use std::path::Path;

/// Decode a source photo from disk
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a supported image format
pub fn load_photo(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| MosaicError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Convert an (H, W, C) canvas into an image
///
/// One channel becomes an 8-bit grayscale image, three channels an 8-bit RGB image.
///
/// # Errors
///
/// Returns an error if:
/// - The canvas has a channel count other than 1 or 3
/// - A canvas dimension does not fit in `u32`
pub fn canvas_to_image(canvas: &Array3<u8>) -> Result<DynamicImage> {
    let (height, width, channels) = canvas.dim();
    let width = u32::try_from(width).map_err(|e| invalid_parameter("width", &width, &e))?;
    let height = u32::try_from(height).map_err(|e| invalid_parameter("height", &height, &e))?;
    // Logical iteration order is row-major regardless of memory layout
    let raw: Vec<u8> = canvas.iter().copied().collect();

    let image = match channels {
        1 => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, raw).map(DynamicImage::ImageLuma8),
        3 => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, raw).map(DynamicImage::ImageRgb8),
        _ => {
            return Err(invalid_parameter(
                "channels",
                &channels,
                &"canvas must have 1 or 3 channels",
            ));
        }
    };
    image.ok_or_else(|| corrupt_data(&"canvas buffer does not match its dimensions"))
}

/// Save an image, creating parent directories as needed
///
/// The format is chosen from the file extension.
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The image cannot be encoded or written to the specified path
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_path(parent, "create directory")?;
    }

    image.save(path).map_err(|e| MosaicError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}
