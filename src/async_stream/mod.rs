//! Async streaming support for rechunking.
//!
//! This module rechunks any `futures_core::Stream` of byte fragments, making
//! it runtime-agnostic and compatible with tokio, async-std, smol, and other
//! async runtimes.
//!
//! - [`rechunk_stream`] - Creates an async stream of fixed-size fragments
//!
//! This module requires the `async-io` feature to be enabled.

mod stream;

pub use stream::{RechunkStream, rechunk_stream};
