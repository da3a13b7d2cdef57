//! Async rechunking example.
//!
//! Rechunks several async fragment streams concurrently, as an upload
//! service would when turning request bodies into fixed-size parts.
//!
//! Run with:
//!     cargo run --example async_rechunk --features async-io

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use zipchunks::{StreamError, rechunk_stream};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let bodies: Vec<Vec<u8>> = vec![
        (0..50_000).map(|i| (i % 256) as u8).collect(),
        (0..120_000).map(|i| (i % 251) as u8).collect(),
        (0..7_000).map(|i| (i % 13) as u8).collect(),
    ];

    println!("Rechunking {} streams concurrently...\n", bodies.len());

    let handles: Vec<_> = bodies
        .into_iter()
        .enumerate()
        .map(|(id, body)| tokio::spawn(rechunk_body(id, body)))
        .collect();

    for handle in handles {
        let (id, parts, total) = handle.await??;
        println!("Stream {}: {} parts, {} bytes", id, parts, total);
    }

    Ok(())
}

async fn rechunk_body(id: usize, body: Vec<u8>) -> Result<(usize, usize, usize), StreamError> {
    // Network-sized fragments
    let body = Bytes::from(body);
    let fragments: Vec<Result<Bytes, StreamError>> = (0..body.len())
        .step_by(1500)
        .map(|start| Ok(body.slice(start..(start + 1500).min(body.len()))))
        .collect();

    let mut parts = rechunk_stream(stream::iter(fragments), 16 * 1024)?;
    let mut count = 0;
    let mut total = 0;
    while let Some(part) = parts.next().await {
        total += part?.len();
        count += 1;
    }
    Ok((id, count, total))
}
