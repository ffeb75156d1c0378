//! Crate-specific error types for mmap-records.

use std::io;
use thiserror::Error;

/// Result alias for mmap-records operations.
pub type Result<T> = std::result::Result<T, RecordIoError>;

/// Error type covering filesystem, mapping, sizing, and patch precondition failures.
#[derive(Debug, Error)]
pub enum RecordIoError {
    /// Wrapper for `std::io::Error` (missing path, bad descriptor, mapping failure).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Pre-sizing the destination file failed.
    #[error("allocation of {size} bytes failed: {source}")]
    Allocation {
        /// Requested file length in bytes.
        size: u64,
        /// Underlying platform error.
        #[source]
        source: io::Error,
    },

    /// Error returned when attempting an operation in an incompatible mode.
    #[error("invalid access mode: {0}")]
    InvalidMode(&'static str),

    /// A requested offset/length pair is outside the mapping.
    #[error("range out of bounds: offset={offset}, len={len}, total={total}")]
    OutOfBounds {
        /// Requested offset.
        offset: u64,
        /// Requested length.
        len: u64,
        /// Total size of the mapped file.
        total: u64,
    },

    /// Serialization stopped short of the pre-computed size.
    #[error("size mismatch: estimated {expected} bytes, wrote {written}")]
    SizeMismatch {
        /// Size computed by the estimator and allocated on disk.
        expected: u64,
        /// Bytes actually produced by the writer.
        written: u64,
    },

    /// A flush operation failed.
    #[error("flush failed: {0}")]
    FlushFailed(String),

    /// The configured delimiter is empty.
    #[error("delimiter must not be empty")]
    EmptyDelimiter,

    /// A replacement value does not have the byte length of the field it replaces.
    #[error("length mismatch at row {row}, field {field}: field is {expected} bytes, replacement is {actual}")]
    LengthMismatch {
        /// Zero-based row index.
        row: usize,
        /// Zero-based field index.
        field: usize,
        /// Byte length of the field on disk.
        expected: usize,
        /// Byte length of the replacement.
        actual: usize,
    },

    /// A patch names a row or field that does not exist in the file.
    #[error("no field {field} on row {row}")]
    FieldNotFound {
        /// Zero-based row index.
        row: usize,
        /// Zero-based field index.
        field: usize,
    },
}
