// Integration tests for the byte rechunker
// Tests cover: boundary splits, size/concatenation invariants, laziness, edge cases

use std::cell::Cell;

use bytes::Bytes;
use proptest::prelude::*;
use zipchunks::{ChunkSize, RechunkState, Step, StreamError, rechunk, rechunk_bytes};

fn fragments(parts: &[&[u8]]) -> Vec<Result<Bytes, StreamError>> {
    parts.iter().map(|p| Ok(Bytes::copy_from_slice(p))).collect()
}

fn run(parts: &[&[u8]], target: usize) -> Vec<Bytes> {
    rechunk(fragments(parts), target)
        .expect("target size should be valid")
        .collect::<Result<_, _>>()
        .expect("scripted source never fails")
}

// ============================================================================
// Boundary Splits
// ============================================================================

#[test]
fn test_boundary_split_target_two() {
    assert_eq!(run(&[b"ab", b"cd", b"e"], 2), vec!["ab", "cd", "e"]);
}

#[test]
fn test_boundary_split_target_three() {
    assert_eq!(run(&[b"ab", b"cd", b"e"], 3), vec!["abc", "de"]);
}

#[test]
fn test_target_larger_than_input() {
    assert_eq!(run(&[b"ab", b"cd", b"e"], 10), vec!["abcde"]);
}

#[test]
fn test_oversized_single_fragment() {
    assert_eq!(run(&[b"abcdefgh"], 3), vec!["abc", "def", "gh"]);
}

#[test]
fn test_target_of_one() {
    assert_eq!(run(&[b"abc", b"d"], 1), vec!["a", "b", "c", "d"]);
}

// ============================================================================
// Empty Input and Zero-Length Fragments
// ============================================================================

#[test]
fn test_empty_input_yields_nothing() {
    assert!(run(&[], 3).is_empty());
    assert!(run(&[b""], 3).is_empty());
    assert!(run(&[b"", b"", b""], 3).is_empty());
}

#[test]
fn test_zero_length_fragments_are_absorbed() {
    let with_empties = run(&[b"", b"ab", b"", b"", b"cde", b""], 2);
    let without = run(&[b"ab", b"cde"], 2);
    assert_eq!(with_empties, without);
    assert!(with_empties.iter().all(|c| !c.is_empty()));
}

#[test]
fn test_exact_multiple_has_no_trailing_empty_fragment() {
    let chunks = run(&[b"abcd", b"ef"], 3);
    assert_eq!(chunks, vec!["abc", "def"]);
}

// ============================================================================
// Invalid Sizes
// ============================================================================

#[test]
fn test_zero_target_fails_before_pulling() {
    let pulls = Cell::new(0);
    let source = std::iter::from_fn(|| {
        pulls.set(pulls.get() + 1);
        Some(Ok::<_, StreamError>(Bytes::from_static(b"x")))
    });

    assert!(matches!(
        rechunk(source, 0),
        Err(StreamError::InvalidChunkSize { value: 0 })
    ));
    assert_eq!(pulls.get(), 0);
}

#[test]
fn test_negative_target_fails() {
    let err = ChunkSize::new(-1).unwrap_err();
    assert!(matches!(err, StreamError::InvalidChunkSize { value: -1 }));
    assert!(RechunkState::new(0).is_err());
    assert!(rechunk_bytes(Bytes::from_static(b"abc"), 0).is_err());
}

// ============================================================================
// Laziness
// ============================================================================

#[test]
fn test_each_pull_reads_only_what_it_needs() {
    let pulls = Cell::new(0);
    let mut parts = vec![&b"ab"[..], b"cd", b"ef", b"gh"].into_iter();
    let source = std::iter::from_fn(|| {
        let next = parts.next()?;
        pulls.set(pulls.get() + 1);
        Some(Ok::<_, StreamError>(Bytes::from_static(next)))
    });

    let mut chunks = rechunk(source, 3).unwrap();
    assert_eq!(pulls.get(), 0);

    assert_eq!(chunks.next().unwrap().unwrap(), "abc");
    assert_eq!(pulls.get(), 2);
    assert_eq!(chunks.pending_len(), 1);

    assert_eq!(chunks.next().unwrap().unwrap(), "def");
    assert_eq!(pulls.get(), 3);
}

#[test]
fn test_step_function_driven_by_script() {
    let mut script = fragments(&[b"hello", b" ", b"world"]).into_iter();
    let mut state = RechunkState::new(4).unwrap();
    let mut emitted = Vec::new();

    loop {
        match state.step(&mut script) {
            Step::Emit(chunk, next) => {
                assert_eq!(chunk.len(), 4);
                emitted.push(chunk);
                state = next;
            }
            Step::Last(chunk) => {
                emitted.push(chunk);
                break;
            }
            Step::Exhausted => break,
            Step::Failed(e) => panic!("unexpected failure: {e}"),
        }
    }

    assert_eq!(emitted, vec!["hell", "o wo", "rld"]);
}

// ============================================================================
// Error Propagation
// ============================================================================

#[test]
fn test_upstream_error_surfaces_on_the_pull_that_hits_it() {
    let source = vec![
        Ok(Bytes::from_static(b"abcd")),
        Err(std::io::Error::other("connection reset")),
        Ok(Bytes::from_static(b"never")),
    ];
    let mut chunks = rechunk(source, 3).unwrap();

    assert_eq!(chunks.next().unwrap().unwrap(), "abc");
    let err = chunks.next().unwrap().unwrap_err();
    assert!(err.to_string().contains("connection reset"));
    assert!(chunks.next().is_none());
}

// ============================================================================
// Resident Buffer Overload
// ============================================================================

#[test]
fn test_rechunk_bytes_matches_general_path() {
    let data: Vec<u8> = (0..1000).map(|i| (i % 251) as u8).collect();
    for target in [1, 7, 64, 999, 1000, 4096] {
        let fast: Vec<Bytes> = rechunk_bytes(data.clone(), target).unwrap().collect();
        let general = run(&[&data], target);
        assert_eq!(fast, general, "target {target}");
    }
}

// ============================================================================
// Properties
// ============================================================================

fn split_points() -> impl Strategy<Value = (Vec<u8>, Vec<usize>)> {
    proptest::collection::vec(any::<u8>(), 0..2048).prop_flat_map(|data| {
        let len = data.len();
        (
            Just(data),
            proptest::collection::vec(0..=len, 0..16).prop_map(|mut cuts| {
                cuts.sort_unstable();
                cuts
            }),
        )
    })
}

fn cut(data: &[u8], cuts: &[usize]) -> Vec<Result<Bytes, StreamError>> {
    let mut out = Vec::new();
    let mut start = 0;
    for &at in cuts {
        out.push(Ok(Bytes::copy_from_slice(&data[start..at])));
        start = at;
    }
    out.push(Ok(Bytes::copy_from_slice(&data[start..])));
    out
}

proptest! {
    #[test]
    fn prop_concatenation_and_sizes((data, cuts) in split_points(), target in 1usize..300) {
        let chunks: Vec<Bytes> = rechunk(cut(&data, &cuts), target)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        prop_assert_eq!(chunks.concat(), data.clone());
        if let Some((last, rest)) = chunks.split_last() {
            prop_assert!(rest.iter().all(|c| c.len() == target));
            prop_assert!(!last.is_empty() && last.len() <= target);
        } else {
            prop_assert!(data.is_empty());
        }
        prop_assert_eq!(chunks.len(), data.len().div_ceil(target));
    }

    #[test]
    fn prop_rechunking_is_idempotent((data, cuts) in split_points(), target in 1usize..300) {
        let once: Vec<Bytes> = rechunk(cut(&data, &cuts), target)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let twice: Vec<Bytes> = rechunk(once.iter().cloned().map(Ok::<_, StreamError>), target)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_split_points_do_not_matter((data, cuts) in split_points(), target in 1usize..300) {
        let split: Vec<Bytes> = rechunk(cut(&data, &cuts), target)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        let whole: Vec<Bytes> = rechunk_bytes(data, target).unwrap().collect();
        prop_assert_eq!(split, whole);
    }
}
