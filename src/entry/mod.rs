//! Entry types and normalization.
//!
//! - [`EntrySpec`] / [`Entries`] - What the caller hands in
//! - [`Entry`] - Canonical `(path, source, codec)` consumed by the encoder
//! - [`ContentSource`] - Literal, listed, lazy or reader-backed bytes
//! - [`normalize`] - The single dispatch point over input shapes

mod normalize;
mod source;

pub use normalize::{Codec, Entries, Entry, EntryIter, EntrySpec, normalize};
pub use source::{ContentSource, READ_UNIT_SIZE, SourceUnits};
