#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use zipchunks::{ChunkSize, Codec, EntrySpec, StreamOptions, stream};

fuzz_target!(|input: (u16, bool, Vec<(String, bool, Vec<u8>)>)| {
    let (chunk_size, gzip, files) = input;
    let chunk_size = usize::from(chunk_size).max(1);

    let entries: Vec<EntrySpec> = files
        .into_iter()
        .enumerate()
        .map(|(i, (name, stored, data))| {
            let codec = if stored { Codec::Stored } else { Codec::Deflated };
            EntrySpec::file(format!("{i}-{name}"), data).with_codec(codec)
        })
        .collect();

    let options = StreamOptions::default()
        .with_chunk_size(ChunkSize::fixed(chunk_size).unwrap())
        .with_gzip(gzip);

    let chunks: Vec<Bytes> = match stream(entries, &options) {
        Ok(archive) => match archive.collect::<Result<Vec<Bytes>, _>>() {
            Ok(chunks) => chunks,
            // Over-long names are the only encoder failure for in-memory sources
            Err(_) => return,
        },
        Err(_) => return,
    };

    // Verify: sizing holds for real archive output
    if let Some((last, rest)) = chunks.split_last() {
        assert!(rest.iter().all(|c| c.len() == chunk_size));
        assert!(!last.is_empty() && last.len() <= chunk_size);
    }
});
