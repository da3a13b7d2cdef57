//! zipchunks
//!
//! Lazy streaming ZIP archives, cut into fixed-size chunks.
//!
//! `zipchunks` turns a set of named content sources into a ZIP archive byte
//! stream (optionally gzip-wrapped), produced on demand and re-segmented
//! into chunks of exactly the size you ask for. It is designed as a small,
//! composable primitive for:
//!
//! - multipart uploads with a fixed part size
//! - HTTP responses with bounded write sizes
//! - archiving data that never fits in memory
//!
//! The crate intentionally:
//! - does NOT decompress or read archives
//! - does NOT seek; every stage is single-pass
//! - does NOT run stages ahead of the consumer
//! - does NOT cap total archive size (ZIP64 kicks in when needed)
//!
//! Memory use is bounded by one chunk of leftover bytes plus whatever the
//! compressor buffers, regardless of archive size.
//!
//! # Sync
//!
//! ```no_run
//! use std::fs::File;
//! use zipchunks::{ContentSource, EntrySpec, StreamError, StreamOptions, stream};
//!
//! fn main() -> Result<(), StreamError> {
//!     let file = File::open("data.bin")?;
//!     let entries = vec![
//!         EntrySpec::file("README.txt", "hello"),
//!         EntrySpec::file("data.bin", ContentSource::reader(file)),
//!     ];
//!
//!     for chunk in stream(entries, &StreamOptions::default())? {
//!         let chunk = chunk?;
//!         println!("chunk {} bytes", chunk.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Rechunking on its own
//!
//! ```
//! use bytes::Bytes;
//! use zipchunks::{StreamError, rechunk};
//!
//! let upstream = ["ab", "cd", "e"].map(|s| Ok::<_, StreamError>(Bytes::from(s)));
//! let chunks: Vec<Bytes> = rechunk(upstream, 2)?.collect::<Result<_, _>>()?;
//! assert_eq!(chunks, vec!["ab", "cd", "e"]);
//! # Ok::<(), StreamError>(())
//! ```
//!
//! # Async (feature = "async-io")
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use zipchunks::rechunk_stream;
//!
//! async fn demo<S>(parts: S) -> Result<(), zipchunks::StreamError>
//! where
//!     S: futures_core::Stream<Item = Result<bytes::Bytes, std::io::Error>> + Unpin,
//! {
//!     let mut stream = rechunk_stream(parts, 8 * 1024 * 1024)?;
//!
//!     while let Some(chunk) = stream.next().await {
//!         println!("chunk {}", chunk?.len());
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod encoder;
mod entry;
mod error;
mod pipeline;
mod rechunk;

mod buffer; // internal (leftover queue, output sinks)

#[cfg(feature = "async-io")]
mod async_stream;

//
// Public surface
//

pub use config::{
    ChunkSize, DEFAULT_CHUNK_SIZE, DEFAULT_DEFLATE_LEVEL, DEFAULT_GZIP_LEVEL,
    DEFAULT_STORED_CHUNK_SIZE, Gzip, GzipConfig, StreamOptions,
};
pub use encoder::{ArchiveFormat, Fragments, GzipFragments, ZipFormat, ZipFragments};
pub use entry::{
    Codec, ContentSource, Entries, Entry, EntryIter, EntrySpec, READ_UNIT_SIZE, SourceUnits,
    normalize,
};
pub use error::{EncoderError, StreamError};
pub use pipeline::{ArchiveStream, stream, stream_with};
pub use rechunk::{BytesChunks, Rechunk, RechunkState, Step, rechunk, rechunk_bytes};

#[cfg(feature = "async-io")]
pub use async_stream::{RechunkStream, rechunk_stream};
