//! Archive and compression encoders.
//!
//! - [`ArchiveFormat`] - The seam between normalized entries and archive bytes
//! - [`ZipFormat`] - Streaming ZIP writer on `zip::ZipWriter` (stored / deflate, ZIP64 sizes)
//! - [`GzipFragments`] - Gzip-wraps any fragment sequence
//!
//! Encoders produce fragments of unspecified, non-uniform size. Downstream
//! stages must not rely on any particular split.

mod gzip;
mod zip;

use bytes::Bytes;

use crate::entry::EntryIter;
use crate::error::StreamError;

pub use self::gzip::GzipFragments;
pub use self::zip::{ZipFormat, ZipFragments};

/// A lazy, fallible sequence of encoder output fragments.
pub type Fragments = Box<dyn Iterator<Item = Result<Bytes, StreamError>> + Send>;

/// Turns a lazy sequence of entries into a lazy sequence of archive bytes.
///
/// Implementations must pull entries (and their content) only on demand and
/// report failures on the pull that discovered them, ending the sequence
/// afterwards.
pub trait ArchiveFormat {
    /// Starts encoding `entries`.
    fn encode(&self, entries: EntryIter) -> Fragments;
}
