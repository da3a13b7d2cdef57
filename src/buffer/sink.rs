//! `Write` adapter that collects encoder output into fragments.

use std::io::{self, Write};

use bytes::{Bytes, BytesMut};

/// Initial capacity of a sink's buffer (64 KiB).
pub(crate) const SINK_CAPACITY: usize = 64 * 1024;

/// A pass-through writer that accumulates everything written to it until
/// the owner drains it with [`take`](Self::take).
///
/// Compressors from `flate2` write into a sink; the pull-based stages drain
/// it after every push so nothing accumulates across pulls.
#[derive(Debug)]
pub(crate) struct FragmentSink {
    buf: BytesMut,
}

impl FragmentSink {
    pub(crate) fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(SINK_CAPACITY),
        }
    }

    /// Drains everything written so far.
    pub(crate) fn take(&mut self) -> Bytes {
        self.buf.split().freeze()
    }

    pub(crate) fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for FragmentSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for FragmentSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
