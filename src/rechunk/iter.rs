//! Iterator adapters over the rechunking state machine.
//!
//! - [`rechunk`] / [`Rechunk`] - Lazy rechunking of any fragment iterator
//! - [`rechunk_bytes`] / [`BytesChunks`] - Zero-copy slicing of one resident buffer
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use zipchunks::{StreamError, rechunk};
//!
//! let fragments = ["ab", "cd", "e"].map(|s| Ok::<_, StreamError>(Bytes::from(s)));
//! let chunks: Vec<Bytes> = rechunk(fragments, 3)?.collect::<Result<_, _>>()?;
//! assert_eq!(chunks, vec!["abc", "de"]);
//! # Ok::<(), StreamError>(())
//! ```

use std::iter::FusedIterator;
use std::num::NonZeroUsize;

use bytes::Bytes;

use super::state::{RechunkState, Step};
use crate::config;
use crate::error::StreamError;

/// An iterator that re-segments upstream fragments into fixed-size ones.
///
/// Every fragment but the last is exactly the target size; the last is
/// shorter but never empty. Empty input yields nothing. After the last
/// fragment or an error the iterator is fused.
#[derive(Debug)]
pub struct Rechunk<I> {
    source: I,
    state: Option<RechunkState>,
}

impl<I> Rechunk<I> {
    /// Wraps `source` with an already validated target size.
    pub fn new(source: I, target: NonZeroUsize) -> Self {
        Self {
            source,
            state: Some(RechunkState::with_target(target)),
        }
    }

    /// Returns the number of bytes buffered but not yet emitted.
    pub fn pending_len(&self) -> usize {
        self.state.as_ref().map_or(0, RechunkState::pending_len)
    }

    /// Consumes the adapter and returns the upstream source.
    pub fn into_inner(self) -> I {
        self.source
    }
}

impl<I, E> Iterator for Rechunk<I>
where
    I: Iterator<Item = Result<Bytes, E>>,
    E: Into<StreamError>,
{
    type Item = Result<Bytes, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        let state = self.state.take()?;
        match state.step(&mut self.source) {
            Step::Emit(fragment, next) => {
                self.state = Some(next);
                Some(Ok(fragment))
            }
            Step::Last(fragment) => Some(Ok(fragment)),
            Step::Exhausted => None,
            Step::Failed(e) => Some(Err(e)),
        }
    }
}

impl<I, E> FusedIterator for Rechunk<I>
where
    I: Iterator<Item = Result<Bytes, E>>,
    E: Into<StreamError>,
{
}

/// Re-segments a lazy fragment sequence into `target_size`-byte fragments.
///
/// Nothing is pulled from `source` until the returned iterator is polled.
///
/// # Errors
///
/// [`StreamError::InvalidChunkSize`] if `target_size` is zero. The source is
/// not touched in that case.
pub fn rechunk<S, E>(source: S, target_size: usize) -> Result<Rechunk<S::IntoIter>, StreamError>
where
    S: IntoIterator<Item = Result<Bytes, E>>,
    E: Into<StreamError>,
{
    let target = config::target_size(target_size)?;
    Ok(Rechunk::new(source.into_iter(), target))
}

/// Zero-copy fixed-size slices of a single resident buffer.
#[derive(Debug, Clone)]
pub struct BytesChunks {
    data: Bytes,
    target: NonZeroUsize,
}

impl Iterator for BytesChunks {
    type Item = Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }
        let len = self.target.get().min(self.data.len());
        Some(self.data.split_to(len))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.data.len().div_ceil(self.target.get());
        (n, Some(n))
    }
}

impl ExactSizeIterator for BytesChunks {}

impl FusedIterator for BytesChunks {}

/// Re-segments one already resident buffer.
///
/// Equivalent to [`rechunk`] over a single-fragment source, but every output
/// is a slice of `data` and no leftover buffer is involved.
///
/// # Errors
///
/// [`StreamError::InvalidChunkSize`] if `target_size` is zero.
///
/// # Example
///
/// ```
/// use zipchunks::rechunk_bytes;
///
/// let chunks: Vec<_> = rechunk_bytes(&b"abcdefgh"[..], 3)?.collect();
/// assert_eq!(chunks, vec!["abc", "def", "gh"]);
/// # Ok::<(), zipchunks::StreamError>(())
/// ```
pub fn rechunk_bytes(data: impl Into<Bytes>, target_size: usize) -> Result<BytesChunks, StreamError> {
    let target = config::target_size(target_size)?;
    Ok(BytesChunks {
        data: data.into(),
        target,
    })
}
