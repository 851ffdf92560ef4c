//! Columnar tile store
//!
//! The store is a NumPy `.npz` archive holding three named arrays:
//! `images` (N, H, W, C), `meta` (N,), and `means` (N, 3), all unsigned 8-bit.
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the target, so a failed write never leaves a readable
//! partial store behind.

use crate::dataset::corpus::{TileCorpus, TileDataset};
use crate::dataset::tile::TileShape;
use crate::io::configuration::{IMAGES_ARRAY, MEANS_ARRAY, META_ARRAY};
use crate::io::error::{MosaicError, Result, WithPath};
use log::info;
use ndarray::{
    Array, Array1, Array2, Array4, ArrayView1, ArrayView2, ArrayView4, Dimension, OwnedRepr,
};
use ndarray_npy::{NpzReader, NpzWriter, ReadNpzError};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Quantize `corpus` and write it to `path`, replacing any existing store
///
/// # Errors
///
/// Returns an error if:
/// - A label or mean color does not fit an unsigned 8-bit element
/// - The destination directory is not writable
/// - The archive cannot be written or moved into place
pub fn write(corpus: &TileCorpus, path: &Path) -> Result<()> {
    let (labels, means) = corpus.quantized_columns()?;
    write_arrays(
        path,
        corpus.images(),
        labels.view(),
        means.view(),
        corpus.tile_shape(),
    )
}

/// Write an already quantized dataset to `path`, replacing any existing store
///
/// # Errors
///
/// Returns an error if the destination directory is not writable or the
/// archive cannot be written or moved into place
pub fn write_dataset(dataset: &TileDataset, path: &Path) -> Result<()> {
    write_arrays(
        path,
        dataset.images(),
        dataset.labels().view(),
        dataset.means(),
        dataset.tile_shape(),
    )
}

fn write_arrays(
    path: &Path,
    images: ArrayView4<'_, u8>,
    labels: ArrayView1<'_, u8>,
    means: ArrayView2<'_, u8>,
    shape: TileShape,
) -> Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staging =
        tempfile::NamedTempFile::new_in(directory).with_path(directory, "create staging file")?;

    let mut npz = NpzWriter::new(staging.as_file_mut());
    npz.add_array(IMAGES_ARRAY, &images)
        .map_err(|e| store_error(path, "write images", &e))?;
    npz.add_array(META_ARRAY, &labels)
        .map_err(|e| store_error(path, "write labels", &e))?;
    npz.add_array(MEANS_ARRAY, &means)
        .map_err(|e| store_error(path, "write means", &e))?;
    npz.finish()
        .map_err(|e| store_error(path, "finish archive", &e))?;

    staging
        .as_file()
        .sync_all()
        .with_path(staging.path(), "sync staging file")?;
    staging
        .persist(path)
        .map_err(|e| e.error)
        .with_path(path, "replace store")?;

    info!(
        "Wrote {} tiles ({shape:?}) to {}",
        labels.len(),
        path.display()
    );
    Ok(())
}

/// Read the full dataset stored at `path`
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist or cannot be opened
/// - The file is not an archive holding `images`, `meta`, and `means` arrays
///   of unsigned 8-bit elements with ranks 4, 1, and 2
/// - The arrays are not parallel in length or `means` is not N x 3
pub fn read(path: &Path) -> Result<TileDataset> {
    let file = File::open(path).with_path(path, "open store")?;
    let mut npz =
        NpzReader::new(BufReader::new(file)).map_err(|e| store_error(path, "open archive", &e))?;

    let images: Array4<u8> = read_array(&mut npz, IMAGES_ARRAY, path)?;
    let labels: Array1<u8> = read_array(&mut npz, META_ARRAY, path)?;
    let means: Array2<u8> = read_array(&mut npz, MEANS_ARRAY, path)?;

    let dataset = TileDataset::new(images, labels, means)?;
    info!(
        "Read {} tiles ({:?}) from {}",
        dataset.len(),
        dataset.tile_shape(),
        path.display()
    );
    Ok(dataset)
}

// Archive members may or may not carry the `.npy` suffix depending on the writer
fn read_array<R, D>(npz: &mut NpzReader<R>, name: &str, path: &Path) -> Result<Array<u8, D>>
where
    R: Read + Seek,
    D: Dimension,
{
    let result = match npz.by_name::<OwnedRepr<u8>, D>(name) {
        Err(ReadNpzError::Zip(_)) => npz.by_name::<OwnedRepr<u8>, D>(&format!("{name}.npy")),
        other => other,
    };
    result.map_err(|e| MosaicError::Store {
        path: path.to_path_buf(),
        operation: "read array",
        reason: format!("'{name}': {e}"),
    })
}

fn store_error(path: &Path, operation: &'static str, err: &impl ToString) -> MosaicError {
    MosaicError::Store {
        path: path.to_path_buf(),
        operation,
        reason: err.to_string(),
    }
}
