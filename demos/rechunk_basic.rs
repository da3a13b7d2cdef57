//! Basic rechunking example.
//!
//! Run with:
//!     cargo run --example rechunk_basic

use bytes::Bytes;
use zipchunks::{RechunkState, Step, StreamError, rechunk, rechunk_bytes};

fn main() -> Result<(), StreamError> {
    // Uneven upstream fragments
    let upstream = ["hel", "lo wo", "", "rld, this is ", "zipchunks"];

    println!("Upstream fragments:");
    for f in &upstream {
        println!("  {:?}", f);
    }

    let fragments = upstream.map(|s| Ok::<_, StreamError>(Bytes::from(s)));
    println!("\nRechunked to 8 bytes:");
    for chunk in rechunk(fragments, 8)? {
        let chunk = chunk?;
        println!("  {:>2} bytes: {:?}", chunk.len(), chunk);
    }

    // One contiguous buffer, zero-copy
    println!("\nContiguous buffer:");
    for chunk in rechunk_bytes("abcdefghij", 4)? {
        println!("  {:?}", chunk);
    }

    // Driving the step function by hand
    println!("\nStep by step:");
    let mut source = ["ab", "cde"].map(|s| Ok::<_, StreamError>(Bytes::from(s))).into_iter();
    let mut state = RechunkState::new(2)?;
    loop {
        match state.step(&mut source) {
            Step::Emit(chunk, next) => {
                println!("  emit {:?}, {} pending", chunk, next.pending_len());
                state = next;
            }
            Step::Last(chunk) => {
                println!("  last {:?}", chunk);
                break;
            }
            Step::Exhausted => break,
            Step::Failed(e) => return Err(e),
        }
    }

    Ok(())
}
