//! Tests for photo loading and mosaic export

#[cfg(test)]
mod tests {
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
    use ndarray::Array3;
    use photomosaic::MosaicError;
    use photomosaic::io::image::{canvas_to_image, load_photo, save_image};
    use std::fs;
    use tempfile::TempDir;

    // Tests RGB canvases become RGB images with matching pixels
    // Verified by transposing width and height
    #[test]
    fn test_canvas_to_image_rgb() {
        let canvas = Array3::from_shape_fn((2, 3, 3), |(y, x, c)| (y * 100 + x * 10 + c) as u8);
        let image = canvas_to_image(&canvas).unwrap();

        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.to_rgb8().get_pixel(2, 1), &Rgb([120, 121, 122]));
    }

    // Tests single-channel canvases become grayscale images
    // Verified by always building RGB images
    #[test]
    fn test_canvas_to_image_grayscale() {
        let canvas = Array3::from_elem((4, 5, 1), 9u8);
        let image = canvas_to_image(&canvas).unwrap();
        assert!(matches!(image, DynamicImage::ImageLuma8(_)));
        assert_eq!(image.dimensions(), (5, 4));
    }

    // Tests non-standard layouts are read in logical order
    // Verified by copying the raw buffer instead of iterating
    #[test]
    fn test_canvas_to_image_non_contiguous() {
        let wide = Array3::from_shape_fn((3, 2, 3), |(y, x, c)| (x * 100 + y * 10 + c) as u8);
        let canvas = wide.clone().permuted_axes([1, 0, 2]);
        let transposed = wide.view().permuted_axes([1, 0, 2]);

        let image = canvas_to_image(&canvas).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(
            image.to_rgb8().get_pixel(2, 1).0.to_vec(),
            transposed.slice(ndarray::s![1, 2, ..]).to_vec()
        );
    }

    // Tests unsupported channel counts are rejected
    // Verified by treating any channel count as RGB
    #[test]
    fn test_canvas_to_image_bad_channels() {
        let canvas = Array3::<u8>::zeros((2, 2, 2));
        assert!(matches!(
            canvas_to_image(&canvas),
            Err(MosaicError::InvalidParameter { .. })
        ));
    }

    // Tests saving creates missing directories and round-trips through PNG
    // Verified by removing directory creation
    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.png");
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, Rgb([5, 6, 7])));

        save_image(&image, &path).unwrap();
        let loaded = load_photo(&path).unwrap();

        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.to_rgb8().get_pixel(1, 1), &Rgb([5, 6, 7]));
    }

    // Tests unreadable photos report the path they came from
    // Verified by using the placeholder path conversion
    #[test]
    fn test_load_photo_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.png");
        match load_photo(&missing) {
            Err(MosaicError::ImageLoad { path, .. }) => assert_eq!(path, missing),
            other => unreachable!("Expected ImageLoad, got {other:?}"),
        }

        let bogus = dir.path().join("bogus.png");
        fs::write(&bogus, b"not a png").unwrap();
        assert!(matches!(
            load_photo(&bogus),
            Err(MosaicError::ImageLoad { .. })
        ));
    }

    // Tests unknown output extensions fail as export errors
    // Verified by mapping export failures to ImageLoad
    #[test]
    fn test_save_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let image = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        assert!(matches!(
            save_image(&image, &dir.path().join("out.unknownext")),
            Err(MosaicError::ImageExport { .. })
        ));
    }
}
