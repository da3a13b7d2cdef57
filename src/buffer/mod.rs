//! Internal buffer management.
//!
//! This module holds the byte buffers the pipeline owns: the rechunker's
//! leftover queue, the sink compressors write into, and the seekable sink
//! the ZIP writer streams through. It is an implementation detail and not
//! part of the public API.

mod archive;
mod segments;
mod sink;

pub(crate) use archive::ArchiveSink;
pub(crate) use segments::SegmentQueue;
pub(crate) use sink::FragmentSink;
