//! Error types and context management for dataset and mosaic operations

use std::fmt;
use std::path::{Path, PathBuf};

/// Main error type for all dataset and mosaic operations
#[derive(Debug)]
pub enum MosaicError {
    /// A batch file is missing, malformed, or does not hold the expected records
    DataFormat {
        /// Batch file or directory being ingested
        path: PathBuf,
        /// Description of what's wrong with the batch data
        reason: String,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The tile store container could not be read or written
    ///
    /// Raised when the file exists but is not an archive of the expected
    /// arrays, or when the archive writer fails part way through.
    Store {
        /// Path of the store file
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying archive error message
        reason: String,
    },

    /// Parallel tile arrays disagree in length or shape
    CorruptData {
        /// Description of the inconsistency
        reason: String,
    },

    /// A value does not fit the element width declared for its array
    Encoding {
        /// Name of the array being encoded
        array: &'static str,
        /// Row (tile position) holding the value
        row: usize,
        /// The offending value
        value: String,
    },

    /// An operation needs at least one tile
    EmptyCorpus,

    /// Source photo is smaller than a single tile
    InvalidSize {
        /// Source photo dimensions (width, height)
        source_dimensions: (u32, u32),
        /// Tile dimensions (width, height)
        tile_dimensions: (usize, usize),
    },

    /// Failed to load a source photo from filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save a composed mosaic to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Tile index exceeds available tile set
    InvalidTileIndex {
        /// The invalid tile index
        index: usize,
        /// Number of tiles available
        max_tiles: usize,
    },

    /// Logger could not be installed
    Logging {
        /// Underlying logger error
        source: flexi_logger::FlexiLoggerError,
    },
}

impl fmt::Display for MosaicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataFormat { path, reason } => {
                write!(f, "Invalid batch data in '{}': {reason}", path.display())
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Store {
                path,
                operation,
                reason,
            } => {
                write!(
                    f,
                    "Tile store error during {operation} on '{}': {reason}",
                    path.display()
                )
            }
            Self::CorruptData { reason } => write!(f, "Corrupt tile data: {reason}"),
            Self::Encoding { array, row, value } => {
                write!(
                    f,
                    "Value {value} at row {row} of '{array}' does not fit in an unsigned 8-bit element"
                )
            }
            Self::EmptyCorpus => write!(f, "Tile corpus contains no tiles"),
            Self::InvalidSize {
                source_dimensions,
                tile_dimensions,
            } => {
                write!(
                    f,
                    "Source photo {}x{} is smaller than one {}x{} tile",
                    source_dimensions.0, source_dimensions.1, tile_dimensions.0, tile_dimensions.1
                )
            }
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::InvalidTileIndex { index, max_tiles } => {
                write!(f, "Tile index {index} is out of bounds ({max_tiles} tiles)")
            }
            Self::Logging { source } => write!(f, "Failed to initialize logging: {source}"),
        }
    }
}

impl std::error::Error for MosaicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            Self::Logging { source } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for dataset and mosaic results
pub type Result<T> = std::result::Result<T, MosaicError>;

/// Attaches the path and operation to bare I/O failures
pub trait WithPath<T> {
    /// Convert an I/O error into [`MosaicError::FileSystem`] for `path`
    ///
    /// # Errors
    ///
    /// Propagates the original error with the path and operation applied
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T>;
}

impl<T> WithPath<T> for std::result::Result<T, std::io::Error> {
    fn with_path(self, path: &Path, operation: &'static str) -> Result<T> {
        self.map_err(|source| MosaicError::FileSystem {
            path: path.to_path_buf(),
            operation,
            source,
        })
    }
}

impl From<image::ImageError> for MosaicError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageLoad {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<std::io::Error> for MosaicError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

impl From<flexi_logger::FlexiLoggerError> for MosaicError {
    fn from(err: flexi_logger::FlexiLoggerError) -> Self {
        Self::Logging { source: err }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MosaicError {
    MosaicError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a batch data format error
pub fn data_format(path: &Path, reason: &impl ToString) -> MosaicError {
    MosaicError::DataFormat {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Create a corrupt data error
pub fn corrupt_data(reason: &impl ToString) -> MosaicError {
    MosaicError::CorruptData {
        reason: reason.to_string(),
    }
}
