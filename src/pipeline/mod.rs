//! Pipeline composition: normalize, encode, optionally gzip, rechunk.
//!
//! Every stage is a pull-based iterator nested inside the next one. Pulling
//! one fragment from an [`ArchiveStream`] pulls only as much upstream work as
//! that fragment needs, and dropping the stream drops every stage together
//! with any content source still open.

use std::iter::FusedIterator;

use bytes::Bytes;
use tracing::debug;

use crate::config::{ChunkSize, StreamOptions};
use crate::encoder::{ArchiveFormat, Fragments, GzipFragments, ZipFormat};
use crate::entry::{Entries, normalize};
use crate::error::StreamError;
use crate::rechunk::Rechunk;

enum Stage {
    Raw(Fragments),
    Rechunked(Rechunk<Fragments>),
}

/// The lazy archive byte stream returned by [`stream`].
///
/// Yields `Result<Bytes, StreamError>`. The first error ends the stream.
pub struct ArchiveStream {
    stage: Stage,
    finished: bool,
}

impl ArchiveStream {
    /// Returns `true` once the stream has ended, normally or by error.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Iterator for ArchiveStream {
    type Item = Result<Bytes, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let next = match &mut self.stage {
            Stage::Raw(fragments) => fragments.next(),
            Stage::Rechunked(rechunk) => rechunk.next(),
        };

        if !matches!(next, Some(Ok(_))) {
            self.finished = true;
        }
        next
    }
}

impl FusedIterator for ArchiveStream {}

impl std::fmt::Debug for ArchiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self.stage {
            Stage::Raw(_) => "raw",
            Stage::Rechunked(_) => "rechunked",
        };
        f.debug_struct("ArchiveStream")
            .field("stage", &stage)
            .field("finished", &self.finished)
            .finish()
    }
}

/// Streams a ZIP archive of `entries`, cut into fixed-size chunks.
///
/// Options are validated and entry lists are normalized before this returns,
/// so configuration and missing-field errors surface before any byte is
/// produced. Encoder errors surface on the pull that hits them.
///
/// # Example
///
/// ```
/// use zipchunks::{ChunkSize, EntrySpec, StreamOptions, stream};
///
/// let entries = vec![
///     EntrySpec::file("hello.txt", "hello world"),
///     EntrySpec::file("empty.txt", ""),
/// ];
/// let options = StreamOptions::default().with_chunk_size(ChunkSize::fixed(64)?);
///
/// let mut total = 0;
/// for chunk in stream(entries, &options)? {
///     let chunk = chunk?;
///     assert!(chunk.len() <= 64);
///     total += chunk.len();
/// }
/// assert!(total > 0);
/// # Ok::<(), zipchunks::StreamError>(())
/// ```
pub fn stream(
    entries: impl Into<Entries>,
    options: &StreamOptions,
) -> Result<ArchiveStream, StreamError> {
    stream_with(&ZipFormat::from_options(options), entries, options)
}

/// Like [`stream`], with a caller-supplied archive format.
pub fn stream_with<F>(
    format: &F,
    entries: impl Into<Entries>,
    options: &StreamOptions,
) -> Result<ArchiveStream, StreamError>
where
    F: ArchiveFormat + ?Sized,
{
    options.validate()?;
    let entries = normalize(entries.into(), options.default_codec())?;

    debug!(
        chunk_size = ?options.chunk_size(),
        gzip = ?options.gzip().config().map(|c| c.level()),
        codec = ?options.default_codec(),
        "starting archive stream"
    );

    let mut fragments = format.encode(entries);
    if let Some(config) = options.gzip().config() {
        fragments = Box::new(GzipFragments::new(fragments, config));
    }

    let stage = match options.chunk_size() {
        ChunkSize::Unbounded => Stage::Raw(fragments),
        ChunkSize::Fixed(target) => Stage::Rechunked(Rechunk::new(fragments, target)),
    };

    Ok(ArchiveStream {
        stage,
        finished: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Codec, EntryIter, EntrySpec};

    /// Emits each entry's units back to back, no container.
    struct Concat;

    impl ArchiveFormat for Concat {
        fn encode(&self, entries: EntryIter) -> Fragments {
            Box::new(entries.flat_map(|entry| {
                let units: Box<dyn Iterator<Item = Result<Bytes, StreamError>> + Send> =
                    match entry {
                        Ok(entry) => {
                            let (_, source, _) = entry.into_parts();
                            Box::new(source.into_units().map(|u| u.map_err(StreamError::from)))
                        }
                        Err(e) => Box::new(std::iter::once(Err(e))),
                    };
                units
            }))
        }
    }

    fn collect(stream: ArchiveStream) -> Vec<Bytes> {
        stream.collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn test_stream_with_rechunks() {
        let options = StreamOptions::default().with_chunk_size(ChunkSize::fixed(5).unwrap());
        let spec = EntrySpec::file("f.txt", vec![Bytes::from("hello world")]);
        let out = collect(stream_with(&Concat, spec, &options).unwrap());
        assert_eq!(out, vec!["hello", " worl", "d"]);
    }

    #[test]
    fn test_stream_with_unbounded_passes_through() {
        let options = StreamOptions::default().with_chunk_size(ChunkSize::Unbounded);
        let spec = EntrySpec::file("f.txt", vec![Bytes::from("ab"), Bytes::from("cde")]);
        let out = collect(stream_with(&Concat, spec, &options).unwrap());
        assert_eq!(out, vec!["ab", "cde"]);
    }

    #[test]
    fn test_stream_rejects_invalid_config_up_front() {
        let options = StreamOptions::default().with_deflate_level(42);
        let err = stream(EntrySpec::file("a", "b"), &options).unwrap_err();
        assert!(matches!(err, StreamError::InvalidConfig { .. }));
    }

    #[test]
    fn test_stream_is_fused_after_error() {
        let options = StreamOptions::default().with_chunk_size(ChunkSize::Unbounded);
        let entries = crate::entry::Entries::lazy(vec![
            EntrySpec::file("a", "1").with_codec(Codec::Stored),
            EntrySpec::new(),
        ]);
        let mut archive = stream(entries, &options).unwrap();
        assert!(archive.by_ref().any(|r| r.is_err()));
        assert!(archive.is_finished());
        assert!(archive.next().is_none());
    }
}
