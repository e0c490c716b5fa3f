//! Error types for the engine's boundaries.
//!
//! Metric computations never fail: an incomparable pair is a `None` result.
//! These errors cover the edges instead: building a raster from untrusted
//! dimensions, decoding files, and reading or writing the metrics history.

use std::path::PathBuf;
use thiserror::Error;

/// A raster whose buffer does not describe `width * height` RGBA pixels.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// Width or height was zero.
    #[error("raster dimensions must be positive, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },

    /// Buffer length disagrees with the dimensions.
    #[error("raster of {width}x{height} needs {expected} bytes, got {actual}")]
    BufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Failures of the image source collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not one of the accepted media types.
    #[error("unsupported file type: {media_type}")]
    UnsupportedFormat { media_type: String },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Raster(#[from] RasterError),

    /// The worker comparing this pair stopped before replying.
    #[error("worker failed on {path}: {message}")]
    Worker { path: PathBuf, message: String },
}

/// Failures of the metrics history store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access metrics store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Existing content could not be parsed, so it was left untouched.
    #[error("metrics store {path} is not a valid history: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize metrics records: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Removal of a record that does not exist.
    #[error("record index {index} out of range for {len} records")]
    IndexOutOfRange { index: usize, len: usize },
}
