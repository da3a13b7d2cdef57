//! Archive a directory into fixed-size chunk files.
//!
//! Run with:
//!     cargo run --example zip_to_chunks -- <dir> <out-prefix> [chunk-bytes]
//!
//! Set `RUST_LOG=zipchunks=debug` to see pipeline logs.

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tracing_subscriber::EnvFilter;
use zipchunks::{ChunkSize, ContentSource, Entries, EntrySpec, StreamOptions, stream};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let dir = args.next().unwrap_or_else(|| "src".to_string());
    let prefix = args.next().unwrap_or_else(|| "archive.zip.part".to_string());
    let chunk_bytes: i64 = match args.next() {
        Some(n) => n.parse()?,
        None => 1024 * 1024,
    };

    let mut files = Vec::new();
    collect_files(Path::new(&dir), &mut files)?;
    files.sort();
    println!("Archiving {} files from {}\n", files.len(), dir);

    // Files are opened only when the encoder reaches them
    let specs = files.into_iter().map(|path| {
        let name = path.to_string_lossy().into_owned();
        match File::open(&path) {
            Ok(file) => EntrySpec::file(name, ContentSource::reader(file)),
            Err(e) => EntrySpec::file(name, ContentSource::lazy([Err::<Vec<u8>, _>(e)])),
        }
    });

    let options = StreamOptions::default().with_chunk_size(ChunkSize::new(chunk_bytes)?);

    let mut total = 0;
    for (i, chunk) in stream(Entries::lazy(specs), &options)?.enumerate() {
        let chunk = chunk?;
        let out = format!("{prefix}.{i:04}");
        File::create(&out)?.write_all(&chunk)?;
        println!("{out}: {} bytes", chunk.len());
        total += chunk.len();
    }

    println!("\nTotal: {total} bytes");
    Ok(())
}

fn collect_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
