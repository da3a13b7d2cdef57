//! Gzip wrapping of an encoded fragment sequence.

use std::io::Write;

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;

use crate::buffer::FragmentSink;
use crate::config::GzipConfig;
use crate::error::StreamError;

/// Wraps a fragment sequence in a single gzip member, lazily.
///
/// Each pull feeds upstream fragments to the compressor until it produces
/// output; the gzip trailer is emitted once upstream is exhausted. Upstream
/// errors are passed through unchanged and end the sequence.
pub struct GzipFragments<I> {
    source: I,
    encoder: Option<GzEncoder<FragmentSink>>,
}

impl<I> GzipFragments<I> {
    /// Starts a gzip member over `source`.
    pub fn new(source: I, config: &GzipConfig) -> Self {
        Self {
            source,
            encoder: Some(GzEncoder::new(
                FragmentSink::new(),
                Compression::new(config.level()),
            )),
        }
    }
}

impl<I> Iterator for GzipFragments<I>
where
    I: Iterator<Item = Result<Bytes, StreamError>>,
{
    type Item = Result<Bytes, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let encoder = self.encoder.as_mut()?;
            match self.source.next() {
                Some(Ok(fragment)) => {
                    if let Err(e) = encoder.write_all(&fragment) {
                        self.encoder = None;
                        return Some(Err(e.into()));
                    }
                    let out = encoder.get_mut().take();
                    if !out.is_empty() {
                        return Some(Ok(out));
                    }
                }
                Some(Err(e)) => {
                    self.encoder = None;
                    return Some(Err(e));
                }
                None => {
                    let encoder = self.encoder.take()?;
                    return match encoder.finish() {
                        Ok(sink) => Some(Ok(sink.into_bytes())),
                        Err(e) => Some(Err(e.into())),
                    };
                }
            }
        }
    }
}

impl<I> std::iter::FusedIterator for GzipFragments<I> where
    I: Iterator<Item = Result<Bytes, StreamError>>
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn gunzip(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_gzip_round_trip() {
        let source = vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::new()),
            Ok(Bytes::from_static(b"world")),
        ];
        let out: Vec<Bytes> = GzipFragments::new(source.into_iter(), &GzipConfig::new())
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(out.iter().all(|f| !f.is_empty()));
        assert_eq!(gunzip(&out.concat()), b"hello world".to_vec());
    }

    #[test]
    fn test_gzip_empty_source_is_valid_member() {
        let source = std::iter::empty::<Result<Bytes, StreamError>>();
        let out: Vec<Bytes> = GzipFragments::new(source, &GzipConfig::new())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(out.len(), 1);
        assert!(gunzip(&out[0]).is_empty());
    }

    #[test]
    fn test_gzip_passes_errors_through() {
        let source = vec![
            Ok(Bytes::from_static(b"a")),
            Err(StreamError::InvalidConfig { message: "upstream" }),
        ];
        let mut iter = GzipFragments::new(source.into_iter(), &GzipConfig::new());
        let err = iter.find_map(Result::err).unwrap();
        assert!(matches!(err, StreamError::InvalidConfig { message: "upstream" }));
        assert!(iter.next().is_none());
    }
}
