#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use zipchunks::{StreamError, rechunk};

fuzz_target!(|input: (u8, Vec<Vec<u8>>)| {
    let (target, fragments) = input;
    let target = usize::from(target).max(1);
    let expected: Vec<u8> = fragments.concat();

    let upstream = fragments
        .into_iter()
        .map(|f| Ok::<_, StreamError>(Bytes::from(f)));
    let chunks: Vec<Bytes> = rechunk(upstream, target)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    // Verify: every chunk but the last has the target size, none is empty
    if let Some((last, rest)) = chunks.split_last() {
        assert!(rest.iter().all(|c| c.len() == target));
        assert!(!last.is_empty() && last.len() <= target);
    }

    // Verify: concatenation is preserved
    assert_eq!(chunks.concat(), expected);

    // Verify: rechunking the output again is a no-op
    let again: Vec<Bytes> = rechunk(chunks.iter().cloned().map(Ok::<_, StreamError>), target)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(again, chunks);
});
