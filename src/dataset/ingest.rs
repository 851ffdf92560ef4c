//! Batch ingestion from pickled image archives
//!
//! A batch file is a pickled dictionary with a `data` entry holding one flat
//! channel-major record per image and a parallel `labels` entry. CIFAR
//! batches store `data` as an (N, record) NumPy array, which unpickles to the
//! array's reconstruction state and is read as one flat buffer. Records are
//! decoded into a preallocated struct-of-arrays corpus sized from the total
//! record count across all batches.

use crate::dataset::corpus::TileCorpus;
use crate::dataset::tile::TileShape;
use crate::io::configuration::{DATA_KEY, IngestConfig, LABELS_KEY};
use crate::io::error::{Result, WithPath, data_format};
use log::{debug, info};
use ndarray::{Array1, Array4, ArrayView2, s};
use serde_pickle::{DeOptions, HashableValue, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Records and labels decoded from one batch file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawBatch {
    /// File the batch was decoded from
    pub source: PathBuf,
    /// Concatenated channel-major records, `labels.len()` records long
    pub data: Vec<u8>,
    /// Label of each record
    pub labels: Vec<i64>,
}

impl RawBatch {
    /// Number of records in the batch
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the batch holds no records
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Decodes a directory of batch files into a [`TileCorpus`]
#[derive(Clone, Debug)]
pub struct BatchIngestor {
    config: IngestConfig,
}

impl BatchIngestor {
    /// Create an ingestor for the configured naming pattern and tile geometry
    ///
    /// # Errors
    ///
    /// Returns an error if the configured tile shape is invalid
    pub fn new(config: IngestConfig) -> Result<Self> {
        config.shape.validate()?;
        Ok(Self { config })
    }

    /// List batch files in `directory`, sorted by path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be read
    /// - No regular file name starts with the configured batch prefix
    pub fn discover(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let mut batches = Vec::new();
        for entry in std::fs::read_dir(directory).with_path(directory, "list batch directory")? {
            let path = entry.with_path(directory, "list batch directory")?.path();
            let matches_prefix = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&self.config.batch_prefix));
            if matches_prefix && path.is_file() {
                batches.push(path);
            }
        }

        if batches.is_empty() {
            return Err(data_format(
                directory,
                &format!("no batch files named '{}*'", self.config.batch_prefix),
            ));
        }

        batches.sort();
        Ok(batches)
    }

    /// Decode one pickled batch file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened
    /// - The file is not a pickle of a dictionary with `data` and `labels` entries
    /// - A record does not have the configured record length
    /// - Labels are not integers or do not match the record count
    pub fn decode_batch(&self, path: &Path) -> Result<RawBatch> {
        let file = File::open(path).with_path(path, "open batch")?;
        let value = serde_pickle::value_from_reader(BufReader::new(file), DeOptions::new())
            .map_err(|e| data_format(path, &e))?;

        let Value::Dict(entries) = value else {
            return Err(data_format(path, &"batch is not a pickled dictionary"));
        };

        let labels = dict_entry(&entries, LABELS_KEY)
            .ok_or_else(|| data_format(path, &format!("missing '{LABELS_KEY}' entry")))
            .and_then(|value| decode_labels(path, value))?;
        let data = dict_entry(&entries, DATA_KEY)
            .ok_or_else(|| data_format(path, &format!("missing '{DATA_KEY}' entry")))
            .and_then(|value| {
                decode_records(path, value, labels.len(), self.config.shape.record_len())
            })?;

        debug!("Decoded {} records from {}", labels.len(), path.display());

        Ok(RawBatch {
            source: path.to_path_buf(),
            data,
            labels,
        })
    }

    /// Decode every batch file in `directory` into one corpus
    ///
    /// # Errors
    ///
    /// Returns an error if no batch files are found or any batch fails to decode
    pub fn ingest(&self, directory: &Path) -> Result<TileCorpus> {
        self.ingest_with(directory, |_| {})
    }

    /// Decode every batch file, calling `on_batch` after each one is decoded
    ///
    /// # Errors
    ///
    /// Returns an error if no batch files are found, any batch fails to
    /// decode, or the batches hold no records at all
    pub fn ingest_with<F>(&self, directory: &Path, on_batch: F) -> Result<TileCorpus>
    where
        F: FnMut(&RawBatch),
    {
        let paths = self.discover(directory)?;
        self.ingest_paths(directory, &paths, on_batch)
    }

    /// Decode `paths`, previously discovered in `directory`, in the given order
    ///
    /// # Errors
    ///
    /// Returns an error if any batch fails to decode or the batches hold no
    /// records at all
    pub fn ingest_paths<F>(
        &self,
        directory: &Path,
        paths: &[PathBuf],
        mut on_batch: F,
    ) -> Result<TileCorpus>
    where
        F: FnMut(&RawBatch),
    {
        let mut batches = Vec::with_capacity(paths.len());
        for path in paths {
            let batch = self.decode_batch(path)?;
            on_batch(&batch);
            batches.push(batch);
        }

        if batches.iter().all(RawBatch::is_empty) {
            return Err(data_format(directory, &"batch files contain no records"));
        }

        let corpus = assemble(&batches, self.config.shape)?;
        info!(
            "Ingested {} tiles from {} batch files in {}",
            corpus.len(),
            paths.len(),
            directory.display()
        );
        Ok(corpus)
    }
}

/// Ingest `directory` with the default CIFAR-style configuration
///
/// # Errors
///
/// Returns an error if no batch files are found or any batch fails to decode
pub fn ingest(directory: &Path) -> Result<TileCorpus> {
    BatchIngestor::new(IngestConfig::default())?.ingest(directory)
}

/// Reconstruct decoded batches into a corpus, preserving batch and record order
///
/// Each record holds `channels` planes of `height * width` bytes. Plane `c`
/// is reshaped row-major and stored as channel `c` of the tile.
///
/// # Errors
///
/// Returns an error if `shape` is invalid or a batch's data length does not
/// match its label count
pub fn assemble(batches: &[RawBatch], shape: TileShape) -> Result<TileCorpus> {
    shape.validate()?;
    let record_len = shape.record_len();
    let plane_len = shape.plane_len();
    let total: usize = batches.iter().map(RawBatch::len).sum();

    let mut images = Array4::zeros((total, shape.height, shape.width, shape.channels));
    let mut labels = Array1::zeros(total);

    let mut row = 0;
    for batch in batches {
        if batch.data.len() != batch.len() * record_len {
            return Err(data_format(
                &batch.source,
                &format!(
                    "{} data bytes do not hold {} records of {record_len} bytes",
                    batch.data.len(),
                    batch.len()
                ),
            ));
        }

        for (record, &label) in batch.data.chunks_exact(record_len).zip(&batch.labels) {
            for (channel, plane) in record.chunks_exact(plane_len).enumerate() {
                let plane = ArrayView2::from_shape((shape.height, shape.width), plane)
                    .map_err(|e| data_format(&batch.source, &e))?;
                images.slice_mut(s![row, .., .., channel]).assign(&plane);
            }
            if let Some(slot) = labels.get_mut(row) {
                *slot = label;
            }
            row += 1;
        }
    }

    TileCorpus::from_arrays(images, labels)
}

// Batches pickled by Python 2 carry byte-string keys, Python 3 ones text keys
fn dict_entry<'a>(
    entries: &'a std::collections::BTreeMap<HashableValue, Value>,
    key: &str,
) -> Option<&'a Value> {
    entries
        .get(&HashableValue::Bytes(key.as_bytes().to_vec()))
        .or_else(|| entries.get(&HashableValue::String(key.to_string())))
}

fn decode_labels(path: &Path, value: &Value) -> Result<Vec<i64>> {
    let items = sequence_items(value)
        .ok_or_else(|| data_format(path, &format!("'{LABELS_KEY}' is not a list")))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::I64(label) => Ok(*label),
            Value::Bool(flag) => Ok(i64::from(*flag)),
            Value::Int(big) => Err(data_format(
                path,
                &format!("label {i} ({big}) is out of range"),
            )),
            other => Err(data_format(
                path,
                &format!("label {i} is not an integer: {other:?}"),
            )),
        })
        .collect()
}

fn decode_records(
    path: &Path,
    value: &Value,
    record_count: usize,
    record_len: usize,
) -> Result<Vec<u8>> {
    // A single contiguous buffer, as produced by dumping an (N, record_len) byte array
    if let Value::Bytes(flat) = value {
        return flat_records(path, flat, record_count, record_len);
    }

    if let Some(array) = PickledArray::from_state(value) {
        array.check_layout(path, record_count, record_len)?;
        return flat_records(path, array.raw, record_count, record_len);
    }

    let records = sequence_items(value).ok_or_else(|| {
        data_format(
            path,
            &format!("'{DATA_KEY}' is neither a list of records nor a byte buffer"),
        )
    })?;
    if records.len() != record_count {
        return Err(data_format(
            path,
            &format!(
                "'{DATA_KEY}' has {} records but '{LABELS_KEY}' has {record_count}",
                records.len()
            ),
        ));
    }

    let mut data = Vec::with_capacity(record_count * record_len);
    for (i, record) in records.iter().enumerate() {
        let start = data.len();
        match record {
            Value::Bytes(bytes) => data.extend_from_slice(bytes),
            other => {
                let values = sequence_items(other).ok_or_else(|| {
                    data_format(path, &format!("record {i} is not a byte buffer"))
                })?;
                for value in values {
                    data.push(pixel_value(value).ok_or_else(|| {
                        data_format(path, &format!("record {i} holds a non-byte value"))
                    })?);
                }
            }
        }

        let len = data.len() - start;
        if len != record_len {
            return Err(data_format(
                path,
                &format!("record {i} has {len} bytes, expected {record_len}"),
            ));
        }
    }
    Ok(data)
}

fn flat_records(
    path: &Path,
    flat: &[u8],
    record_count: usize,
    record_len: usize,
) -> Result<Vec<u8>> {
    if flat.len() != record_count * record_len {
        return Err(data_format(
            path,
            &format!(
                "'{DATA_KEY}' holds {} bytes, expected {record_count} records of {record_len} bytes",
                flat.len()
            ),
        ));
    }
    Ok(flat.to_vec())
}

/// A NumPy array as it survives unpickling: the state tuple
/// `(version, shape, dtype, is_fortran, raw_bytes)` its reconstructor is built from
struct PickledArray<'a> {
    shape: &'a [Value],
    is_fortran: bool,
    raw: &'a [u8],
}

impl<'a> PickledArray<'a> {
    const fn from_state(value: &'a Value) -> Option<Self> {
        let Value::Tuple(items) = value else {
            return None;
        };
        let [_, Value::Tuple(shape), _, Value::Bool(is_fortran), Value::Bytes(raw)] =
            items.as_slice()
        else {
            return None;
        };
        Some(Self {
            shape: shape.as_slice(),
            is_fortran: *is_fortran,
            raw: raw.as_slice(),
        })
    }

    // Leading axis indexes records; the remaining axes flatten to one record
    fn check_layout(&self, path: &Path, record_count: usize, record_len: usize) -> Result<()> {
        let dims = self
            .shape
            .iter()
            .map(|dim| match dim {
                Value::I64(n) => usize::try_from(*n).ok(),
                _ => None,
            })
            .collect::<Option<Vec<usize>>>()
            .ok_or_else(|| data_format(path, &format!("'{DATA_KEY}' has a malformed shape")))?;

        let Some((&leading, rest)) = dims.split_first() else {
            return Err(data_format(path, &format!("'{DATA_KEY}' is a 0-d array")));
        };
        let per_record = rest.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d));
        if leading != record_count || per_record != Some(record_len) {
            return Err(data_format(
                path,
                &format!(
                    "'{DATA_KEY}' array has shape {dims:?}, expected {record_count} records of {record_len} bytes"
                ),
            ));
        }
        if self.is_fortran && record_count > 1 && record_len > 1 {
            return Err(data_format(
                path,
                &format!("'{DATA_KEY}' array is stored in column-major order"),
            ));
        }
        Ok(())
    }
}

fn sequence_items(value: &Value) -> Option<&[Value]> {
    match value {
        Value::List(items) | Value::Tuple(items) => Some(items.as_slice()),
        _ => None,
    }
}

fn pixel_value(value: &Value) -> Option<u8> {
    match value {
        Value::I64(v) => u8::try_from(*v).ok(),
        _ => None,
    }
}
