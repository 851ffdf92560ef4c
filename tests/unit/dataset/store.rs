//! Tests for the columnar tile store

#[cfg(test)]
mod tests {
    use ndarray::{Array2, Array4, array};
    use ndarray_npy::NpzWriter;
    use photomosaic::MosaicError;
    use photomosaic::dataset::corpus::{TileCorpus, TileDataset};
    use photomosaic::dataset::store;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn sample_corpus() -> TileCorpus {
        let images = Array4::from_shape_fn((3, 2, 2, 3), |(n, y, x, c)| {
            (n * 40 + y * 10 + x * 3 + c) as u8
        });
        TileCorpus::from_arrays(images, array![0, 9, 255]).unwrap()
    }

    // Tests that a written store reads back as the quantized corpus
    // Verified by writing full-precision means
    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiles.npz");
        let corpus = sample_corpus();

        store::write(&corpus, &path).unwrap();
        let dataset = store::read(&path).unwrap();

        assert_eq!(dataset, corpus.quantize().unwrap());
        assert_eq!(dataset.images(), corpus.images());
        assert_eq!(dataset.labels(), &array![0u8, 9, 255]);
        // (0 + 10 + 3 + 13) / 4 = 6.5 truncated
        assert_eq!(dataset.means().row(0).to_vec(), vec![6, 7, 8]);
    }

    // Tests that writing replaces an existing store wholesale
    // Verified by appending to the existing archive
    #[test]
    fn test_write_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiles.npz");
        store::write(&sample_corpus(), &path).unwrap();

        let smaller = TileCorpus::from_arrays(Array4::from_elem((1, 1, 1, 1), 77), array![3]).unwrap();
        store::write(&smaller, &path).unwrap();

        let dataset = store::read(&path).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.means().row(0).to_vec(), vec![77, 77, 77]);
    }

    // Tests that an unencodable corpus leaves an existing store untouched
    // Verified by opening the destination before quantizing
    #[test]
    fn test_failed_write_keeps_previous_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiles.npz");
        store::write(&sample_corpus(), &path).unwrap();
        let before = fs::read(&path).unwrap();

        let bad = TileCorpus::from_arrays(Array4::zeros((1, 2, 2, 3)), array![300]).unwrap();
        assert!(matches!(
            store::write(&bad, &path),
            Err(MosaicError::Encoding { .. })
        ));

        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    // Tests that no staging file survives a successful write
    // Verified by copying instead of renaming the staging file
    #[test]
    fn test_write_leaves_no_staging_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiles.npz");
        store::write(&sample_corpus(), &path).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("tiles.npz")]);
    }

    // Tests that writing into a missing directory is a file system error
    // Verified by creating parent directories implicitly
    #[test]
    fn test_write_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent").join("tiles.npz");

        assert!(matches!(
            store::write(&sample_corpus(), &path),
            Err(MosaicError::FileSystem { .. })
        ));
        assert!(!path.exists());
    }

    // Tests that reading a missing store is a file system error
    // Verified by mapping open failures to Store
    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            store::read(&dir.path().join("nope.npz")),
            Err(MosaicError::FileSystem { .. })
        ));
    }

    // Tests that a file that is not an archive is a store error
    // Verified by treating unreadable archives as empty datasets
    #[test]
    fn test_read_not_an_archive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiles.npz");
        fs::write(&path, b"plain text").unwrap();

        assert!(matches!(
            store::read(&path),
            Err(MosaicError::Store { .. })
        ));
    }

    // Tests that an archive missing one of the arrays is a store error
    // Verified by defaulting missing arrays to empty
    #[test]
    fn test_read_missing_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiles.npz");
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array("images", &Array4::<u8>::zeros((1, 2, 2, 3)))
            .unwrap();
        npz.add_array("meta", &array![0u8]).unwrap();
        npz.finish().unwrap();

        match store::read(&path) {
            Err(MosaicError::Store { reason, .. }) => assert!(reason.contains("means")),
            other => unreachable!("Expected Store error, got {other:?}"),
        }
    }

    // Tests that arrays of different lengths are reported as corruption
    // Verified by skipping TileDataset validation on read
    #[test]
    fn test_read_non_parallel_arrays() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiles.npz");
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array("images", &Array4::<u8>::zeros((2, 2, 2, 3)))
            .unwrap();
        npz.add_array("meta", &array![0u8, 1]).unwrap();
        npz.add_array("means", &Array2::<u8>::zeros((3, 3))).unwrap();
        npz.finish().unwrap();

        assert!(matches!(
            store::read(&path),
            Err(MosaicError::CorruptData { .. })
        ));
    }

    // Tests that an already quantized dataset is written as-is
    // Verified by re-deriving means from images on write
    #[test]
    fn test_write_dataset_preserves_means() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiles.npz");
        let dataset = TileDataset::new(
            Array4::zeros((1, 2, 2, 1)),
            array![2],
            array![[9, 8, 7]],
        )
        .unwrap();

        store::write_dataset(&dataset, &path).unwrap();
        assert_eq!(store::read(&path).unwrap(), dataset);
    }
}
