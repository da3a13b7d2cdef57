//! Queue of pending byte slices, materialized only at cut points.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};

/// Bytes pulled from upstream but not yet emitted downstream.
///
/// Appending never copies. Splitting off a prefix is zero-copy when the head
/// slice alone covers it, otherwise the prefix is assembled into a single
/// fresh allocation of exactly the requested size.
#[derive(Debug, Default)]
pub(crate) struct SegmentQueue {
    segments: VecDeque<Bytes>,
    len: usize,
}

impl SegmentQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Total number of buffered bytes.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a fragment. Empty fragments are dropped.
    pub(crate) fn push(&mut self, fragment: Bytes) {
        if fragment.is_empty() {
            return;
        }
        self.len += fragment.len();
        self.segments.push_back(fragment);
    }

    /// Removes and returns the first `n` bytes.
    ///
    /// `n` must not exceed [`len`](Self::len).
    pub(crate) fn split_to(&mut self, n: usize) -> Bytes {
        debug_assert!(n <= self.len);

        if let Some(head) = self.segments.front_mut() {
            if head.len() >= n {
                let out = head.split_to(n);
                if head.is_empty() {
                    self.segments.pop_front();
                }
                self.len -= n;
                return out;
            }
        }

        let mut out = BytesMut::with_capacity(n);
        while out.len() < n {
            let need = n - out.len();
            let Some(head) = self.segments.front_mut() else {
                break;
            };
            if head.len() <= need {
                out.extend_from_slice(&head[..]);
                self.segments.pop_front();
            } else {
                out.extend_from_slice(&head.split_to(need));
            }
        }

        self.len -= out.len();
        out.freeze()
    }

    /// Removes and returns everything buffered.
    pub(crate) fn take_all(&mut self) -> Bytes {
        match self.segments.len() {
            0 => Bytes::new(),
            1 => {
                self.len = 0;
                self.segments.pop_front().unwrap_or_default()
            }
            _ => self.split_to(self.len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(parts: &[&'static [u8]]) -> SegmentQueue {
        let mut q = SegmentQueue::new();
        for part in parts {
            q.push(Bytes::from_static(part));
        }
        q
    }

    #[test]
    fn test_push_skips_empty() {
        let q = queue(&[b"", b"ab", b""]);
        assert_eq!(q.len(), 2);
        assert_eq!(q.segments.len(), 1);
    }

    #[test]
    fn test_split_within_head_is_zero_copy() {
        let source = Bytes::from_static(b"abcdef");
        let mut q = SegmentQueue::new();
        q.push(source.clone());

        let out = q.split_to(4);
        assert_eq!(&out[..], b"abcd");
        assert_eq!(out.as_ptr(), source.as_ptr());
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_split_across_segments() {
        let mut q = queue(&[b"ab", b"cd", b"efg"]);
        assert_eq!(&q.split_to(5)[..], b"abcde");
        assert_eq!(q.len(), 2);
        assert_eq!(&q.take_all()[..], b"fg");
        assert!(q.is_empty());
    }

    #[test]
    fn test_split_exact_head_pops_segment() {
        let mut q = queue(&[b"ab", b"cd"]);
        assert_eq!(&q.split_to(2)[..], b"ab");
        assert_eq!(q.segments.len(), 1);
    }

    #[test]
    fn test_take_all_empty() {
        let mut q = SegmentQueue::new();
        assert!(q.take_all().is_empty());
    }
}
