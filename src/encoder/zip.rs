//! Streaming ZIP writer.
//!
//! Entries are written by `zip::ZipWriter` into an [`ArchiveSink`] that is
//! drained after every unit of work, so at most one content unit (plus the
//! compressor's window) is resident at a time. Sizes and CRC-32 are unknown
//! when an entry starts: every entry is opened as a large file, so its local
//! header carries a ZIP64 extra field, and the real values follow the body
//! in a data descriptor with 8-byte sizes.

use std::io::{self, Write};

use ::zip::write::SimpleFileOptions;
use ::zip::{CompressionMethod, DateTime, ZipWriter};
use bytes::Bytes;
use tracing::{debug, trace};

use super::{ArchiveFormat, Fragments};
use crate::buffer::ArchiveSink;
use crate::config::{DEFAULT_DEFLATE_LEVEL, StreamOptions};
use crate::entry::{Codec, Entry, EntryIter, SourceUnits};
use crate::error::{EncoderError, StreamError};

const FILE_MODE: u32 = 0o644;

/// The built-in ZIP [`ArchiveFormat`].
///
/// # Example
///
/// ```
/// use zipchunks::{ArchiveFormat, Codec, Entry, EntryIter, ZipFormat};
///
/// let entries = EntryIter::from_entries(vec![Entry::new("a.txt", "alpha", Codec::Stored)]);
/// let archive: Vec<u8> = ZipFormat::default()
///     .encode(entries)
///     .collect::<Result<Vec<_>, _>>()?
///     .concat();
/// assert_eq!(&archive[..4], b"PK\x03\x04");
/// # Ok::<(), zipchunks::StreamError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZipFormat {
    deflate_level: u32,
}

impl ZipFormat {
    /// Creates a writer that deflates at `deflate_level` (1-9).
    pub fn new(deflate_level: u32) -> Self {
        Self { deflate_level }
    }

    /// Creates a writer using the deflate level from `options`.
    pub fn from_options(options: &StreamOptions) -> Self {
        Self::new(options.deflate_level())
    }

    /// Starts encoding `entries`, returning the concrete fragment iterator.
    pub fn fragments(&self, entries: EntryIter) -> ZipFragments {
        let sink = ArchiveSink::new();
        ZipFragments {
            entries,
            writer: Some(ZipWriter::new(sink.clone())),
            sink,
            phase: Phase::Entries,
            level: self.deflate_level,
            count: 0,
            written: 0,
        }
    }

    fn file_options(level: u32, codec: Codec) -> SimpleFileOptions {
        let (method, level) = match codec {
            Codec::Stored => (CompressionMethod::Stored, None),
            Codec::Deflated => (CompressionMethod::Deflated, Some(i64::from(level))),
        };
        SimpleFileOptions::default()
            .compression_method(method)
            .compression_level(level)
            .last_modified_time(DateTime::default())
            .unix_permissions(FILE_MODE)
            .large_file(true)
    }
}

impl Default for ZipFormat {
    fn default() -> Self {
        Self::new(DEFAULT_DEFLATE_LEVEL)
    }
}

impl ArchiveFormat for ZipFormat {
    fn encode(&self, entries: EntryIter) -> Fragments {
        Box::new(self.fragments(entries))
    }
}

/// An entry whose body is being written.
struct OpenEntry {
    path: String,
    units: SourceUnits,
    crc: crc32fast::Hasher,
    uncompressed: u64,
}

enum Phase {
    Entries,
    Body(Box<OpenEntry>),
    Finish,
    Done,
}

/// Lazy ZIP byte stream produced by [`ZipFormat`].
///
/// Each advance opens one entry, writes one body unit, or writes the
/// central directory; whatever the writer produced is then handed out as
/// one fragment.
pub struct ZipFragments {
    entries: EntryIter,
    writer: Option<ZipWriter<ArchiveSink>>,
    sink: ArchiveSink,
    phase: Phase,
    level: u32,
    count: u64,
    written: u64,
}

impl ZipFragments {
    /// Returns the number of archive bytes emitted so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    fn writer(&mut self) -> io::Result<&mut ZipWriter<ArchiveSink>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::other("zip writer already finished"))
    }

    /// Runs one unit of work. Returns `false` once the archive is complete.
    fn advance(&mut self) -> Result<bool, StreamError> {
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Entries => match self.entries.next() {
                Some(entry) => self.open(entry?)?,
                None => self.phase = Phase::Finish,
            },
            Phase::Body(mut open) => match open.units.next() {
                Some(Ok(unit)) => {
                    open.crc.update(&unit);
                    open.uncompressed += unit.len() as u64;
                    self.writer()?.write_all(&unit)?;
                    self.phase = Phase::Body(open);
                }
                Some(Err(source)) => {
                    return Err(EncoderError::Source {
                        path: open.path,
                        source,
                    }
                    .into());
                }
                None => {
                    trace!(path = %open.path, uncompressed = open.uncompressed, "finished entry");
                    self.sink.end_entry(open.crc.finalize(), open.uncompressed)?;
                    self.phase = Phase::Entries;
                }
            },
            Phase::Finish => {
                let writer = self
                    .writer
                    .take()
                    .ok_or_else(|| io::Error::other("zip writer already finished"))?;
                writer.finish()?;
                let bytes = self.sink.position()?;
                debug!(entries = self.count, bytes, "wrote central directory");
            }
            Phase::Done => return Ok(false),
        }
        Ok(true)
    }

    fn open(&mut self, entry: Entry) -> Result<(), StreamError> {
        let (path, source, codec) = entry.into_parts();
        if path.len() > u16::MAX as usize {
            return Err(EncoderError::PathTooLong { len: path.len() }.into());
        }

        let options = ZipFormat::file_options(self.level, codec);
        let offset = self.sink.position()?;
        trace!(path = %path, ?codec, offset, "encoding entry");

        self.sink.expect_header()?;
        self.writer()?.start_file(path.as_str(), options)?;
        self.sink.header_written()?;
        self.count += 1;

        self.phase = Phase::Body(Box::new(OpenEntry {
            path,
            units: source.into_units(),
            crc: crc32fast::Hasher::new(),
            uncompressed: 0,
        }));
        Ok(())
    }

    fn abort(&mut self) {
        self.phase = Phase::Done;
        self.sink.close();
        self.writer = None;
    }
}

impl Iterator for ZipFragments {
    type Item = Result<Bytes, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.advance() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => {
                    self.abort();
                    return Some(Err(e));
                }
            }
            match self.sink.take() {
                Ok(fragment) if fragment.is_empty() => continue,
                Ok(fragment) => {
                    self.written += fragment.len() as u64;
                    return Some(Ok(fragment));
                }
                Err(e) => {
                    self.abort();
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

impl std::iter::FusedIterator for ZipFragments {}

impl Drop for ZipFragments {
    fn drop(&mut self) {
        // an unfinished writer finalizes on drop; nobody reads that output
        self.sink.close();
    }
}
