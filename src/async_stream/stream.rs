//! Async stream adapter for rechunking.
//!
//! Runtime-agnostic: works on any `futures_core::Stream` of fragments, so it
//! composes with tokio, async-std, smol and friends.
//!
//! # Example
//!
//! ```ignore
//! use futures_util::StreamExt;
//! use zipchunks::rechunk_stream;
//!
//! async fn demo<S>(upload_parts: S) -> Result<(), zipchunks::StreamError>
//! where
//!     S: futures_core::Stream<Item = Result<bytes::Bytes, std::io::Error>>,
//! {
//!     let mut parts = Box::pin(rechunk_stream(upload_parts, 5 * 1024 * 1024)?);
//!
//!     while let Some(part) = parts.next().await {
//!         let part = part?;
//!         println!("part: {} bytes", part.len());
//!     }
//!     Ok(())
//! }
//! ```

use std::num::NonZeroUsize;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures_core::Stream;
use pin_project_lite::pin_project;

use crate::config;
use crate::error::StreamError;
use crate::rechunk::RechunkState;

pin_project! {
    /// A stream that re-segments an async fragment stream into
    /// fixed-size fragments.
    ///
    /// Same contract as [`Rechunk`](crate::Rechunk): every fragment but the
    /// last is exactly the target size, the last is non-empty, and the
    /// stream is fused after the last fragment or an error.
    pub struct RechunkStream<S> {
        #[pin]
        source: S,
        state: Option<RechunkState>,
    }
}

impl<S> RechunkStream<S> {
    /// Wraps `source` with an already validated target size.
    pub fn new(source: S, target: NonZeroUsize) -> Self {
        Self {
            source,
            state: Some(RechunkState::with_target(target)),
        }
    }

    /// Returns the number of bytes buffered but not yet emitted.
    pub fn pending_len(&self) -> usize {
        self.state.as_ref().map_or(0, RechunkState::pending_len)
    }
}

impl<S, E> Stream for RechunkStream<S>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<StreamError>,
{
    type Item = Result<Bytes, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            let Some(state) = this.state.as_mut() else {
                return Poll::Ready(None);
            };
            if let Some(out) = state.try_emit() {
                return Poll::Ready(Some(Ok(out)));
            }
            match ready!(this.source.as_mut().poll_next(cx)) {
                Some(Ok(fragment)) => state.push(fragment),
                Some(Err(e)) => {
                    *this.state = None;
                    return Poll::Ready(Some(Err(e.into())));
                }
                None => {
                    let tail = this.state.take().and_then(RechunkState::finish);
                    return Poll::Ready(tail.map(Ok));
                }
            }
        }
    }
}

/// Creates a rechunking stream over an async fragment source.
///
/// # Errors
///
/// [`StreamError::InvalidChunkSize`] if `target_size` is zero. The source is
/// not polled in that case.
pub fn rechunk_stream<S, E>(source: S, target_size: usize) -> Result<RechunkStream<S>, StreamError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<StreamError>,
{
    let target = config::target_size(target_size)?;
    Ok(RechunkStream::new(source, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use futures_util::stream;

    fn fragments(parts: &[&'static str]) -> Vec<Result<Bytes, StreamError>> {
        parts
            .iter()
            .map(|s| Ok(Bytes::from_static(s.as_bytes())))
            .collect()
    }

    async fn run(parts: &[&'static str], target: usize) -> Vec<Bytes> {
        let chunks: Vec<_> = rechunk_stream(stream::iter(fragments(parts)), target)
            .unwrap()
            .collect()
            .await;
        chunks.into_iter().collect::<Result<_, _>>().unwrap()
    }

    #[tokio::test]
    async fn test_rechunk_stream_boundaries() {
        assert_eq!(run(&["ab", "cd", "e"], 2).await, vec!["ab", "cd", "e"]);
        assert_eq!(run(&["ab", "cd", "e"], 3).await, vec!["abc", "de"]);
        assert_eq!(run(&["abcdefgh"], 3).await, vec!["abc", "def", "gh"]);
    }

    #[tokio::test]
    async fn test_rechunk_stream_empty() {
        assert!(run(&[], 3).await.is_empty());
        assert!(run(&["", ""], 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_rechunk_stream_error_ends_stream() {
        let source = stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Err(std::io::Error::other("reset")),
        ]);
        let mut chunks = rechunk_stream(source, 4).unwrap();
        assert!(matches!(chunks.next().await, Some(Err(StreamError::Encoder(_)))));
        assert!(chunks.next().await.is_none());
    }

    #[test]
    fn test_rechunk_stream_zero_size() {
        let source = stream::iter(fragments(&["a"]));
        assert!(matches!(
            rechunk_stream(source, 0),
            Err(StreamError::InvalidChunkSize { value: 0 })
        ));
    }

    #[tokio::test]
    async fn test_rechunk_stream_matches_iterator() {
        let parts = ["abcde", "", "f", "ghijklm", "n"];
        for target in 1..=6 {
            let sync: Vec<Bytes> = crate::rechunk(fragments(&parts), target)
                .unwrap()
                .collect::<Result<_, _>>()
                .unwrap();
            assert_eq!(run(&parts, target).await, sync, "target {target}");
        }
    }

    #[tokio::test]
    async fn test_rechunk_stream_pending_len() {
        let mut chunks = rechunk_stream(stream::iter(fragments(&["abcd"])), 3).unwrap();
        assert_eq!(chunks.pending_len(), 0);
        assert_eq!(chunks.next().await.unwrap().unwrap(), "abc");
        assert_eq!(chunks.pending_len(), 1);
        assert_eq!(chunks.next().await.unwrap().unwrap(), "d");
        assert!(chunks.next().await.is_none());
        assert_eq!(chunks.pending_len(), 0);
    }
}
