//! Tests for parallel tile arrays and quantization

#[cfg(test)]
mod tests {
    use ndarray::{Array1, Array2, Array3, Array4, array};
    use photomosaic::MosaicError;
    use photomosaic::dataset::corpus::{TileCorpus, TileDataset, compute_means};
    use photomosaic::dataset::tile::{Tile, TileShape};

    fn gray_images(values: &[u8]) -> Array4<u8> {
        Array4::from_shape_fn((values.len(), 2, 2, 1), |(n, _, _, _)| values[n])
    }

    // Tests that building from arrays computes one mean row per tile
    // Verified by leaving means zeroed
    #[test]
    fn test_from_arrays_computes_means() {
        let corpus = TileCorpus::from_arrays(gray_images(&[0, 50, 200]), array![0, 1, 2]).unwrap();

        assert_eq!(corpus.len(), 3);
        assert!(!corpus.is_empty());
        assert_eq!(corpus.tile_shape(), TileShape::new(2, 2, 1));
        assert_eq!(corpus.means().row(1).to_vec(), vec![50.0, 50.0, 50.0]);
        assert_eq!(corpus.means().row(2).to_vec(), vec![200.0, 200.0, 200.0]);
    }

    // Tests that mismatched array lengths are reported as corruption
    // Verified by comparing only images and means lengths
    #[test]
    fn test_from_arrays_length_mismatch() {
        let result = TileCorpus::from_arrays(gray_images(&[0, 50]), array![0, 1, 2]);
        assert!(matches!(result, Err(MosaicError::CorruptData { .. })));
    }

    // Tests that means must have exactly three components per row
    // Verified by removing the width check
    #[test]
    fn test_new_rejects_narrow_means() {
        let result = TileCorpus::new(gray_images(&[0]), array![0], Array2::zeros((1, 2)));
        assert!(matches!(result, Err(MosaicError::CorruptData { .. })));
    }

    // Tests collecting tiles preserves their order and labels
    // Verified by reversing the iteration order
    #[test]
    fn test_from_tiles_preserves_order() {
        let tiles = [9u8, 3, 120]
            .iter()
            .enumerate()
            .map(|(i, &v)| Tile::new(Array3::from_elem((2, 2, 3), v), i as i64 + 10).unwrap())
            .collect();

        let corpus = TileCorpus::from_tiles(tiles).unwrap();
        assert_eq!(corpus.labels(), &array![10, 11, 12]);
        assert_eq!(corpus.means().row(2).to_vec(), vec![120.0; 3]);
        assert_eq!(corpus.tile_pixels(1).unwrap()[[0, 0, 0]], 3);
        assert!(corpus.tile_pixels(3).is_none());
    }

    // Tests that an empty tile list has no geometry to build from
    // Verified by returning an empty corpus instead
    #[test]
    fn test_from_tiles_empty() {
        assert!(matches!(
            TileCorpus::from_tiles(Vec::new()),
            Err(MosaicError::EmptyCorpus)
        ));
    }

    // Tests that tiles of different shapes cannot share a corpus
    // Verified by removing the per-tile shape comparison
    #[test]
    fn test_from_tiles_shape_mismatch() {
        let tiles = vec![
            Tile::new(Array3::zeros((2, 2, 3)), 0).unwrap(),
            Tile::new(Array3::zeros((3, 2, 3)), 1).unwrap(),
        ];
        assert!(matches!(
            TileCorpus::from_tiles(tiles),
            Err(MosaicError::CorruptData { .. })
        ));
    }

    // Tests that quantization truncates means toward zero
    // Verified by rounding instead of truncating
    #[test]
    fn test_quantize_truncates_means() {
        let images =
            Array4::from_shape_vec((1, 2, 2, 1), vec![127, 128, 128, 128]).unwrap();
        let corpus = TileCorpus::from_arrays(images, array![4]).unwrap();
        assert!((corpus.means()[[0, 0]] - 127.75).abs() < 1e-12);

        let dataset = corpus.quantize().unwrap();
        assert_eq!(dataset.means().row(0).to_vec(), vec![127, 127, 127]);
        assert_eq!(dataset.labels(), &array![4u8]);
        assert_eq!(dataset.images(), corpus.images());
    }

    // Tests the quantized columns match a full quantization and leave the corpus intact
    // Verified by rounding means in quantized_columns only
    #[test]
    fn test_quantized_columns() {
        let images =
            Array4::from_shape_vec((2, 1, 2, 1), vec![10, 11, 200, 201]).unwrap();
        let corpus = TileCorpus::from_arrays(images, array![7, 9]).unwrap();

        let (labels, means) = corpus.quantized_columns().unwrap();
        assert_eq!(labels, array![7u8, 9]);
        assert_eq!(means, array![[10u8, 10, 10], [200, 200, 200]]);

        let dataset = corpus.quantize().unwrap();
        assert_eq!(dataset.labels(), &labels);
        assert_eq!(dataset.means(), means.view());
        assert!((corpus.means()[[1, 0]] - 200.5).abs() < 1e-12);
    }

    // Tests that labels outside the unsigned byte range fail with their row
    // Verified by wrapping labels with `as u8`
    #[test]
    fn test_quantize_rejects_out_of_range_labels() {
        for bad in [-1, 256] {
            let corpus = TileCorpus::from_arrays(gray_images(&[1, 2]), array![0, bad]).unwrap();
            match corpus.quantize() {
                Err(MosaicError::Encoding { array, row, value }) => {
                    assert_eq!(array, "meta");
                    assert_eq!(row, 1);
                    assert_eq!(value, bad.to_string());
                }
                other => unreachable!("Expected Encoding error, got {other:?}"),
            }
        }
    }

    // Tests that mean values outside the byte range are rejected
    // Verified by saturating instead of failing
    #[test]
    fn test_quantize_rejects_out_of_range_means() {
        let mut means = Array2::zeros((2, 3));
        means[[1, 2]] = 300.0;
        let corpus = TileCorpus::new(gray_images(&[0, 0]), array![0, 0], means).unwrap();

        assert!(matches!(
            corpus.quantize(),
            Err(MosaicError::Encoding {
                array: "means",
                row: 1,
                ..
            })
        ));
    }

    // Tests quantized dataset validation and accessors
    // Verified by skipping the parallel-length check in TileDataset::new
    #[test]
    fn test_dataset_new() {
        let dataset =
            TileDataset::new(gray_images(&[5, 6]), array![1, 1], Array2::from_elem((2, 3), 5))
                .unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.tile_shape(), TileShape::new(2, 2, 1));
        assert_eq!(dataset.tile_pixels(1).unwrap()[[1, 1, 0]], 6);

        let mismatched = TileDataset::new(
            gray_images(&[5, 6]),
            Array1::zeros(3),
            Array2::zeros((2, 3)),
        );
        assert!(matches!(mismatched, Err(MosaicError::CorruptData { .. })));
    }

    // Tests label histogram counts in ascending label order
    // Verified by counting rows instead of labels
    #[test]
    fn test_label_histogram() {
        let dataset = TileDataset::new(
            gray_images(&[0, 0, 0, 0]),
            array![3, 1, 3, 3],
            Array2::zeros((4, 3)),
        )
        .unwrap();

        let histogram: Vec<(u8, usize)> = dataset.label_histogram().into_iter().collect();
        assert_eq!(histogram, vec![(1, 1), (3, 3)]);
    }

    // Tests batch mean computation over an RGB block
    // Verified by averaging over the wrong axis
    #[test]
    fn test_compute_means() {
        let images = Array4::from_shape_fn((2, 2, 2, 3), |(n, _, _, c)| (n * 10 + c) as u8);
        let means = compute_means(images.view());
        assert_eq!(means, array![[0.0, 1.0, 2.0], [10.0, 11.0, 12.0]]);
    }
}
