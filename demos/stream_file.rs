//! Stream one file as a gzip-wrapped ZIP archive.
//!
//! Run with:
//!     cargo run --example stream_file -- /path/to/file > out.zip.gz

use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tracing_subscriber::EnvFilter;
use zipchunks::{ChunkSize, ContentSource, EntrySpec, GzipConfig, StreamOptions, stream};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "Cargo.toml".to_string());
    let name = Path::new(&path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.clone());

    let file = File::open(&path)?;
    eprintln!("Streaming {} ({} bytes)", path, file.metadata()?.len());

    let options = StreamOptions::stored()
        .with_chunk_size(ChunkSize::fixed(256 * 1024)?)
        .with_gzip(GzipConfig::new().with_level(6));

    let mut stdout = io::stdout().lock();
    let mut chunks = 0;
    for chunk in stream(EntrySpec::file(name, ContentSource::reader(file)), &options)? {
        stdout.write_all(&chunk?)?;
        chunks += 1;
    }
    stdout.flush()?;

    eprintln!("Wrote {} chunks", chunks);
    Ok(())
}
