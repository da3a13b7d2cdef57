//! Rechunking state machine.
//!
//! [`RechunkState`] owns the leftover buffer and the target size. The
//! algorithm lives in three primitives: [`push`](RechunkState::push) buffers
//! an upstream fragment, [`try_emit`](RechunkState::try_emit) cuts a full
//! fragment once enough is buffered, and [`finish`](RechunkState::finish)
//! releases the short tail. The sync and async adapters both drive these.
//!
//! [`RechunkState::step`] wraps them for pull-based sources: it consumes the
//! state, pulls as many upstream fragments as needed to produce exactly one
//! output fragment, and hands the state back alongside that fragment. There
//! is no ambient mutable state, so the engine can be driven directly from a
//! scripted fragment list:
//!
//! ```
//! use bytes::Bytes;
//! use zipchunks::{RechunkState, Step, StreamError};
//!
//! let mut source = ["ab", "cd", "e"]
//!     .into_iter()
//!     .map(|s| Ok::<_, StreamError>(Bytes::from(s)));
//!
//! let state = RechunkState::new(3)?;
//! let Step::Emit(first, state) = state.step(&mut source) else { unreachable!() };
//! assert_eq!(first, "abc");
//! let Step::Last(last) = state.step(&mut source) else { unreachable!() };
//! assert_eq!(last, "de");
//! # Ok::<(), StreamError>(())
//! ```

use std::fmt;
use std::num::NonZeroUsize;

use bytes::Bytes;
use tracing::trace;

use crate::buffer::SegmentQueue;
use crate::config;
use crate::error::StreamError;

/// Outcome of one [`RechunkState::step`].
pub enum Step {
    /// A full-size fragment, and the state to continue from.
    Emit(Bytes, RechunkState),
    /// The final, short, non-empty fragment. The session is over.
    Last(Bytes),
    /// Upstream ended with nothing buffered. The session is over.
    Exhausted,
    /// Upstream failed. The session is over.
    Failed(StreamError),
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Emit(b, _) => write!(f, "Emit({} bytes)", b.len()),
            Step::Last(b) => write!(f, "Last({} bytes)", b.len()),
            Step::Exhausted => f.write_str("Exhausted"),
            Step::Failed(e) => write!(f, "Failed({e})"),
        }
    }
}

/// State of one rechunking session.
///
/// Holds bytes pulled from upstream but not yet emitted. Between steps the
/// buffer holds fewer than `target_size` bytes plus at most one upstream
/// fragment's worth of overshoot.
#[derive(Debug)]
pub struct RechunkState {
    leftover: SegmentQueue,
    target: NonZeroUsize,
}

impl RechunkState {
    /// Starts a session emitting fragments of `target_size` bytes.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidChunkSize`] if `target_size` is zero.
    pub fn new(target_size: usize) -> Result<Self, StreamError> {
        config::target_size(target_size).map(Self::with_target)
    }

    /// Starts a session with an already validated target size.
    pub fn with_target(target: NonZeroUsize) -> Self {
        Self {
            leftover: SegmentQueue::new(),
            target,
        }
    }

    /// Returns the target fragment size.
    pub fn target_size(&self) -> usize {
        self.target.get()
    }

    /// Returns the number of bytes buffered but not yet emitted.
    pub fn pending_len(&self) -> usize {
        self.leftover.len()
    }

    /// Buffers one upstream fragment. Empty fragments are absorbed.
    pub fn push(&mut self, fragment: Bytes) {
        self.leftover.push(fragment);
    }

    /// Cuts one full-size fragment if enough bytes are buffered.
    pub fn try_emit(&mut self) -> Option<Bytes> {
        let target = self.target.get();
        if self.leftover.len() < target {
            return None;
        }
        let out = self.leftover.split_to(target);
        trace!(len = out.len(), pending = self.leftover.len(), "emitting fragment");
        Some(out)
    }

    /// Ends the session once upstream is exhausted.
    ///
    /// Returns the short tail, or `None` when nothing is buffered.
    pub fn finish(mut self) -> Option<Bytes> {
        if self.leftover.is_empty() {
            return None;
        }
        let last = self.leftover.take_all();
        trace!(len = last.len(), "emitting final fragment");
        Some(last)
    }

    /// Produces the next output fragment.
    ///
    /// Pulls from `source` only while fewer than `target_size` bytes are
    /// buffered. Zero-length upstream fragments are absorbed.
    pub fn step<I, E>(mut self, source: &mut I) -> Step
    where
        I: Iterator<Item = Result<Bytes, E>> + ?Sized,
        E: Into<StreamError>,
    {
        loop {
            if let Some(out) = self.try_emit() {
                return Step::Emit(out, self);
            }
            match source.next() {
                Some(Ok(fragment)) => self.push(fragment),
                Some(Err(e)) => return Step::Failed(e.into()),
                None => {
                    return match self.finish() {
                        Some(last) => Step::Last(last),
                        None => Step::Exhausted,
                    };
                }
            }
        }
    }
}
