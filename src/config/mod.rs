//! Configuration for archive streaming.
//!
//! This module provides the types that control a [`stream`](crate::stream):
//!
//! - [`StreamOptions`] - Chunk size, gzip wrapping and codec defaults
//! - [`ChunkSize`] - Fixed output chunk size, or unbounded passthrough
//! - [`Gzip`] / [`GzipConfig`] - Whether and how the archive is gzip-wrapped
//!
//! # Example
//!
//! ```
//! use zipchunks::{ChunkSize, Codec, GzipConfig, StreamOptions};
//!
//! // 1 MiB chunks of a stored archive, gzip-wrapped at level 6
//! let options = StreamOptions::stored()
//!     .with_chunk_size(ChunkSize::fixed(1024 * 1024)?)
//!     .with_gzip(GzipConfig::new().with_level(6));
//! options.validate()?;
//!
//! // Raw encoder output, no rechunking
//! let options = StreamOptions::default().with_chunk_size(ChunkSize::Unbounded);
//! assert_eq!(options.default_codec(), Codec::Deflated);
//! # Ok::<(), zipchunks::StreamError>(())
//! ```

use std::num::NonZeroUsize;

use crate::entry::Codec;
use crate::error::StreamError;

/// Default output chunk size for deflated archives (5 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Default output chunk size for stored archives (32 MiB).
pub const DEFAULT_STORED_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// Default gzip level when wrapping is enabled without a level (maximum ratio).
pub const DEFAULT_GZIP_LEVEL: u32 = 9;

/// Default deflate level for ZIP entries.
pub const DEFAULT_DEFLATE_LEVEL: u32 = 6;

/// Highest compression level accepted by deflate and gzip.
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Lowest deflate level the ZIP writer accepts.
pub const MIN_DEFLATE_LEVEL: u32 = 1;

/// Target size of the output chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkSize {
    /// Every chunk but the last is exactly this many bytes.
    Fixed(NonZeroUsize),
    /// Pass encoder output through unchanged.
    Unbounded,
}

impl ChunkSize {
    /// Creates a fixed chunk size from a signed byte count.
    ///
    /// Returns [`StreamError::InvalidChunkSize`] for zero or negative values.
    pub fn new(bytes: i64) -> Result<Self, StreamError> {
        usize::try_from(bytes)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(ChunkSize::Fixed)
            .ok_or(StreamError::InvalidChunkSize { value: bytes })
    }

    /// Creates a fixed chunk size.
    ///
    /// Returns [`StreamError::InvalidChunkSize`] for zero.
    pub fn fixed(bytes: usize) -> Result<Self, StreamError> {
        target_size(bytes).map(ChunkSize::Fixed)
    }

    /// Returns the fixed size in bytes, or `None` when unbounded.
    pub fn get(&self) -> Option<usize> {
        match self {
            ChunkSize::Fixed(n) => Some(n.get()),
            ChunkSize::Unbounded => None,
        }
    }
}

/// Validates a fragment target size.
///
/// Every entry point that takes a raw `usize` target goes through here.
pub(crate) fn target_size(bytes: usize) -> Result<NonZeroUsize, StreamError> {
    NonZeroUsize::new(bytes).ok_or(StreamError::InvalidChunkSize { value: 0 })
}

impl TryFrom<i64> for ChunkSize {
    type Error = StreamError;

    fn try_from(bytes: i64) -> Result<Self, Self::Error> {
        Self::new(bytes)
    }
}

impl From<NonZeroUsize> for ChunkSize {
    fn from(bytes: NonZeroUsize) -> Self {
        ChunkSize::Fixed(bytes)
    }
}

/// Parameters for gzip wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GzipConfig {
    level: Option<u32>,
}

impl GzipConfig {
    /// Creates a configuration with the default level.
    pub const fn new() -> Self {
        Self { level: None }
    }

    /// Sets the compression level (0-9).
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    /// Returns the effective compression level.
    pub fn level(&self) -> u32 {
        self.level.unwrap_or(DEFAULT_GZIP_LEVEL)
    }
}

/// Whether the archive is wrapped in a gzip member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Gzip {
    /// No compression stage after the archive encoder.
    #[default]
    Disabled,
    /// Gzip-wrap the archive with the given parameters.
    Enabled(GzipConfig),
}

impl Gzip {
    /// Returns the configuration if wrapping is enabled.
    pub fn config(&self) -> Option<&GzipConfig> {
        match self {
            Gzip::Disabled => None,
            Gzip::Enabled(config) => Some(config),
        }
    }
}

impl From<bool> for Gzip {
    fn from(enabled: bool) -> Self {
        if enabled {
            Gzip::Enabled(GzipConfig::default())
        } else {
            Gzip::Disabled
        }
    }
}

impl From<GzipConfig> for Gzip {
    fn from(config: GzipConfig) -> Self {
        Gzip::Enabled(config)
    }
}

/// Options for [`stream`](crate::stream).
///
/// Two presets mirror the two common archive flavours:
///
/// - [`StreamOptions::deflated`] - deflated entries, 5 MiB chunks (the default)
/// - [`StreamOptions::stored`] - stored entries, 32 MiB chunks
///
/// Both are only starting points; every field can be overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamOptions {
    chunk_size: ChunkSize,
    gzip: Gzip,
    default_codec: Codec,
    deflate_level: u32,
}

impl StreamOptions {
    /// Deflated entries, [`DEFAULT_CHUNK_SIZE`] chunks, no gzip.
    pub fn deflated() -> Self {
        Self {
            chunk_size: ChunkSize::Fixed(DEFLATED_CHUNK),
            gzip: Gzip::Disabled,
            default_codec: Codec::Deflated,
            deflate_level: DEFAULT_DEFLATE_LEVEL,
        }
    }

    /// Stored entries, [`DEFAULT_STORED_CHUNK_SIZE`] chunks, no gzip.
    pub fn stored() -> Self {
        Self {
            chunk_size: ChunkSize::Fixed(STORED_CHUNK),
            gzip: Gzip::Disabled,
            default_codec: Codec::Stored,
            deflate_level: DEFAULT_DEFLATE_LEVEL,
        }
    }

    /// Sets the output chunk size.
    pub fn with_chunk_size(mut self, chunk_size: ChunkSize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets gzip wrapping (`true`, `false` or a [`GzipConfig`]).
    pub fn with_gzip(mut self, gzip: impl Into<Gzip>) -> Self {
        self.gzip = gzip.into();
        self
    }

    /// Sets the codec used by entries that do not pick one.
    pub fn with_default_codec(mut self, codec: Codec) -> Self {
        self.default_codec = codec;
        self
    }

    /// Sets the deflate level for deflated ZIP entries (1-9).
    pub fn with_deflate_level(mut self, level: u32) -> Self {
        self.deflate_level = level;
        self
    }

    /// Returns the output chunk size.
    pub fn chunk_size(&self) -> ChunkSize {
        self.chunk_size
    }

    /// Returns the gzip setting.
    pub fn gzip(&self) -> &Gzip {
        &self.gzip
    }

    /// Returns the codec for entries without an override.
    pub fn default_codec(&self) -> Codec {
        self.default_codec
    }

    /// Returns the deflate level for ZIP entries.
    pub fn deflate_level(&self) -> u32 {
        self.deflate_level
    }

    /// Validates the current configuration.
    pub fn validate(&self) -> Result<(), StreamError> {
        if !(MIN_DEFLATE_LEVEL..=MAX_COMPRESSION_LEVEL).contains(&self.deflate_level) {
            return Err(StreamError::InvalidConfig {
                message: "deflate level must be between 1 and 9",
            });
        }

        if let Some(config) = self.gzip.config() {
            if config.level() > MAX_COMPRESSION_LEVEL {
                return Err(StreamError::InvalidConfig {
                    message: "gzip level must be between 0 and 9",
                });
            }
        }

        Ok(())
    }
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::deflated()
    }
}

const DEFLATED_CHUNK: NonZeroUsize = nonzero(DEFAULT_CHUNK_SIZE);
const STORED_CHUNK: NonZeroUsize = nonzero(DEFAULT_STORED_CHUNK_SIZE);

const fn nonzero(n: usize) -> NonZeroUsize {
    match NonZeroUsize::new(n) {
        Some(n) => n,
        None => panic!("chunk size constant must be non-zero"),
    }
}
