//! Error types for zipchunks.

use std::io;

use thiserror::Error;

/// Errors that can occur while building or pulling an archive stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// An entry description lacks a required field.
    #[error("entry {index} is missing required field `{field}`")]
    MissingField {
        /// Position of the offending entry in the caller's input.
        index: usize,
        /// Name of the missing field.
        field: &'static str,
    },

    /// The requested chunk size is not a positive integer.
    #[error("invalid chunk size {value}: must be a positive number of bytes")]
    InvalidChunkSize {
        /// The rejected value.
        value: i64,
    },

    /// Invalid configuration parameter.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// The archive or compression encoder failed.
    #[error(transparent)]
    Encoder(#[from] EncoderError),
}

/// Failures raised by the archive or compression encoder.
///
/// These are passed through to the consumer unchanged, on the pull that
/// triggered them.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// Producing a unit of an entry's content source failed.
    #[error("reading content for `{path}`: {source}")]
    Source {
        /// Archive path of the entry being encoded.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The compressor itself failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The ZIP writer rejected an entry or failed to finish the archive.
    #[error("zip writer: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The entry path does not fit in a ZIP header.
    #[error("entry path is {len} bytes, ZIP headers allow at most 65535")]
    PathTooLong {
        /// Path length in bytes.
        len: usize,
    },
}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        StreamError::Encoder(EncoderError::Io(e))
    }
}

impl From<zip::result::ZipError> for StreamError {
    fn from(e: zip::result::ZipError) -> Self {
        StreamError::Encoder(EncoderError::Archive(e))
    }
}

impl From<std::convert::Infallible> for StreamError {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}
