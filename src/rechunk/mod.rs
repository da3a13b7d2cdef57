//! Byte rechunking: arbitrary upstream fragments in, fixed-size fragments out.
//!
//! - [`RechunkState`] - Explicit state machine with a `step()` function
//! - [`Rechunk`] - Lazy iterator adapter over the state machine
//! - [`BytesChunks`] - Zero-copy slicing of one resident buffer

mod iter;
mod state;

pub use iter::{BytesChunks, Rechunk, rechunk, rechunk_bytes};
pub use state::{RechunkState, Step};
