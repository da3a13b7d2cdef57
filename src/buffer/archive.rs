//! Seekable, drainable sink for the ZIP writer.
//!
//! `zip::ZipWriter` needs `Write + Seek`: after each entry it seeks back into
//! the local header to patch the CRC-32 and sizes, then seeks to the end
//! again. Bytes already handed downstream cannot be patched, so the sink
//! turns the archive into streaming form instead:
//!
//! - writes behind the end of the stream are dropped
//! - the local header gets general purpose bit 3
//! - returning to the end after a patch appends a ZIP64 data descriptor
//!
//! Offsets reported through `Seek` always match the bytes actually emitted,
//! so the central directory the writer produces points at the right places.

use std::io::{self, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::{BufMut, Bytes, BytesMut};

use super::sink::SINK_CAPACITY;

const DATA_DESCRIPTOR_SIG: u32 = 0x0807_4b50;

// Offset of the general purpose flags inside a local file header.
const FLAGS_OFFSET: u64 = 6;
const FLAG_DATA_DESCRIPTOR: u8 = 1 << 3;

/// CRC-32 and uncompressed size of an entry whose body is complete.
#[derive(Debug, Clone, Copy)]
struct PendingDescriptor {
    crc: u32,
    uncompressed: u64,
}

#[derive(Debug)]
struct SinkState {
    buf: BytesMut,
    /// Stream offset of `buf[0]`.
    drained: u64,
    /// Stream length, the offset the next appended byte lands at.
    position: u64,
    /// Offset the writer believes it is at.
    cursor: u64,
    patching: bool,
    header_armed: bool,
    header_start: Option<u64>,
    data_start: u64,
    descriptor: Option<PendingDescriptor>,
    closed: bool,
}

impl SinkState {
    fn append(&mut self, data: &[u8]) {
        if self.header_armed && self.descriptor.is_none() {
            self.header_start = Some(self.position);
            self.header_armed = false;
        }
        self.append_raw(data);
    }

    fn append_raw(&mut self, data: &[u8]) {
        if !self.closed {
            self.buf.extend_from_slice(data);
        }
        self.position += data.len() as u64;
        self.cursor = self.position;
    }

    /// Back at the end of the stream: finish the entry that was patched.
    fn resume(&mut self) {
        if !std::mem::take(&mut self.patching) {
            return;
        }
        let Some(PendingDescriptor { crc, uncompressed }) = self.descriptor.take() else {
            return;
        };
        let compressed = self.position - self.data_start;

        let mut descriptor = [0u8; 24];
        let mut out = &mut descriptor[..];
        out.put_u32_le(DATA_DESCRIPTOR_SIG);
        out.put_u32_le(crc);
        out.put_u64_le(compressed);
        out.put_u64_le(uncompressed);
        self.append_raw(&descriptor);
    }
}

/// A cloneable handle to one archive's output buffer.
///
/// One clone is owned by the `ZipWriter`, the other by the fragment iterator
/// that drains it with [`take`](Self::take) after every unit of work.
#[derive(Debug, Clone)]
pub(crate) struct ArchiveSink {
    state: Arc<Mutex<SinkState>>,
}

impl ArchiveSink {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState {
                buf: BytesMut::with_capacity(SINK_CAPACITY),
                drained: 0,
                position: 0,
                cursor: 0,
                patching: false,
                header_armed: false,
                header_start: None,
                data_start: 0,
                descriptor: None,
                closed: false,
            })),
        }
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, SinkState>> {
        self.state
            .lock()
            .map_err(|_| io::Error::other("archive sink poisoned"))
    }

    /// Marks the next byte written after the pending descriptor as the start
    /// of a local file header.
    pub(crate) fn expect_header(&self) -> io::Result<()> {
        let mut state = self.lock()?;
        state.header_armed = true;
        state.header_start = None;
        Ok(())
    }

    /// Called once the writer has emitted a complete local header: flags it
    /// as followed by a data descriptor and marks where the body begins.
    pub(crate) fn header_written(&self) -> io::Result<()> {
        let mut state = self.lock()?;
        if state.closed {
            return Ok(());
        }
        let header_start = state
            .header_start
            .take()
            .ok_or_else(|| io::Error::other("no local header was written"))?;
        let at = (header_start + FLAGS_OFFSET)
            .checked_sub(state.drained)
            .and_then(|at| usize::try_from(at).ok())
            .filter(|&at| at < state.buf.len())
            .ok_or_else(|| io::Error::other("local header already drained"))?;
        state.buf[at] |= FLAG_DATA_DESCRIPTOR;
        state.data_start = state.position;
        Ok(())
    }

    /// Records the CRC-32 and uncompressed size of the entry just written.
    ///
    /// The descriptor is appended once the writer has finished the entry.
    pub(crate) fn end_entry(&self, crc: u32, uncompressed: u64) -> io::Result<()> {
        self.lock()?.descriptor = Some(PendingDescriptor { crc, uncompressed });
        Ok(())
    }

    /// Drains everything written so far.
    pub(crate) fn take(&self) -> io::Result<Bytes> {
        let mut state = self.lock()?;
        let out = state.buf.split().freeze();
        state.drained += out.len() as u64;
        Ok(out)
    }

    /// Returns the number of archive bytes produced so far.
    pub(crate) fn position(&self) -> io::Result<u64> {
        Ok(self.lock()?.position)
    }

    /// Stops retaining output. Offsets keep advancing so a writer that is
    /// finalized on drop stays consistent.
    pub(crate) fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
            state.buf.clear();
        }
    }
}

impl Default for ArchiveSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for ArchiveSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut state = self.lock()?;
        if state.cursor < state.position {
            let end = state.cursor + data.len() as u64;
            if end > state.position {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "patch runs past the end of the archive",
                ));
            }
            state.cursor = end;
            return Ok(data.len());
        }
        state.resume();
        state.append(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for ArchiveSink {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut state = self.lock()?;
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::Current(d) => state.cursor.checked_add_signed(d),
            SeekFrom::End(d) => state.position.checked_add_signed(d),
        };
        let target = target
            .filter(|&t| t <= state.position)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "seek out of range"))?;

        if target < state.position {
            state.patching = true;
            state.cursor = target;
        } else {
            state.cursor = target;
            state.resume();
        }
        Ok(state.cursor)
    }
}
