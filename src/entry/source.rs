//! Content sources and the lazy unit sequence they expand into.

use std::fmt;
use std::io::{self, Read};

use bytes::Bytes;

/// Size of the units pulled from a [`ContentSource::Reader`] (64 KiB).
pub const READ_UNIT_SIZE: usize = 64 * 1024;

/// Where an entry's bytes come from.
///
/// Every variant expands into the same lazy sequence of byte units through
/// [`ContentSource::into_units`]. Nothing is read until the encoder pulls.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use zipchunks::ContentSource;
///
/// let literal = ContentSource::from("hello world");
/// let parts = ContentSource::from(vec![Bytes::from("hello "), Bytes::from("world")]);
/// let lazy = ContentSource::lazy((0..3).map(|i| Ok::<_, std::io::Error>(vec![b'a' + i])));
/// let reader = ContentSource::reader(std::io::Cursor::new(b"from a reader".to_vec()));
///
/// let units: Vec<_> = lazy.into_units().collect::<Result<_, _>>()?;
/// assert_eq!(units, vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")]);
/// # Ok::<(), std::io::Error>(())
/// ```
pub enum ContentSource {
    /// A literal buffer.
    Bytes(Bytes),
    /// An ordered, already materialized sequence of units.
    Chunks(Vec<Bytes>),
    /// A lazy sequence of units. Errors surface as encoder errors.
    Lazy(Box<dyn Iterator<Item = io::Result<Bytes>> + Send>),
    /// A reader, pulled in [`READ_UNIT_SIZE`] units.
    Reader(Box<dyn Read + Send>),
}

impl ContentSource {
    /// Wraps a lazy sequence of units.
    pub fn lazy<I, B>(units: I) -> Self
    where
        I: IntoIterator<Item = io::Result<B>>,
        I::IntoIter: Send + 'static,
        B: Into<Bytes> + 'static,
    {
        ContentSource::Lazy(Box::new(
            units.into_iter().map(|unit| unit.map(Into::into)),
        ))
    }

    /// Wraps a reader, such as an open file.
    ///
    /// The reader is dropped as soon as the entry has been encoded, or when
    /// the stream that owns it is dropped.
    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        ContentSource::Reader(Box::new(reader))
    }

    /// Expands the source into its lazy unit sequence.
    pub fn into_units(self) -> SourceUnits {
        let inner = match self {
            ContentSource::Bytes(bytes) => Units::Once(Some(bytes)),
            ContentSource::Chunks(chunks) => Units::Chunks(chunks.into_iter()),
            ContentSource::Lazy(iter) => Units::Lazy(iter),
            ContentSource::Reader(reader) => Units::Reader(Some(reader)),
        };
        SourceUnits { inner }
    }
}

impl fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSource::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            ContentSource::Chunks(c) => write!(f, "Chunks({} units)", c.len()),
            ContentSource::Lazy(_) => f.write_str("Lazy(..)"),
            ContentSource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<Bytes> for ContentSource {
    fn from(bytes: Bytes) -> Self {
        ContentSource::Bytes(bytes)
    }
}

impl From<Vec<u8>> for ContentSource {
    fn from(bytes: Vec<u8>) -> Self {
        ContentSource::Bytes(bytes.into())
    }
}

impl From<&'static [u8]> for ContentSource {
    fn from(bytes: &'static [u8]) -> Self {
        ContentSource::Bytes(Bytes::from_static(bytes))
    }
}

impl From<&'static str> for ContentSource {
    fn from(text: &'static str) -> Self {
        ContentSource::Bytes(Bytes::from_static(text.as_bytes()))
    }
}

impl From<String> for ContentSource {
    fn from(text: String) -> Self {
        ContentSource::Bytes(text.into())
    }
}

impl From<Vec<Bytes>> for ContentSource {
    fn from(chunks: Vec<Bytes>) -> Self {
        ContentSource::Chunks(chunks)
    }
}

enum Units {
    Once(Option<Bytes>),
    Chunks(std::vec::IntoIter<Bytes>),
    Lazy(Box<dyn Iterator<Item = io::Result<Bytes>> + Send>),
    Reader(Option<Box<dyn Read + Send>>),
}

/// Lazy sequence of byte units produced by a [`ContentSource`].
///
/// Zero-length units are skipped. A reader is released as soon as it reports
/// end of input or an error.
pub struct SourceUnits {
    inner: Units,
}

impl SourceUnits {
    fn next_raw(&mut self) -> Option<io::Result<Bytes>> {
        match &mut self.inner {
            Units::Once(bytes) => bytes.take().map(Ok),
            Units::Chunks(iter) => iter.next().map(Ok),
            Units::Lazy(iter) => iter.next(),
            Units::Reader(slot) => {
                let reader = slot.as_mut()?;
                let mut buf = vec![0u8; READ_UNIT_SIZE];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => {
                            *slot = None;
                            return None;
                        }
                        Ok(n) => {
                            buf.truncate(n);
                            return Some(Ok(Bytes::from(buf)));
                        }
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => {
                            *slot = None;
                            return Some(Err(e));
                        }
                    }
                }
            }
        }
    }
}

impl Iterator for SourceUnits {
    type Item = io::Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_raw()? {
                Ok(unit) if unit.is_empty() => continue,
                other => return Some(other),
            }
        }
    }
}

impl fmt::Debug for SourceUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceUnits").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(source: ContentSource) -> Vec<Bytes> {
        source.into_units().collect::<io::Result<_>>().unwrap()
    }

    #[test]
    fn test_literal_is_one_unit() {
        assert_eq!(collect("abc".into()), vec![Bytes::from("abc")]);
    }

    #[test]
    fn test_empty_units_are_skipped() {
        let source = ContentSource::from(vec![Bytes::new(), Bytes::from("a"), Bytes::new()]);
        assert_eq!(collect(source), vec![Bytes::from("a")]);
        assert!(collect(ContentSource::from("")).is_empty());
    }

    #[test]
    fn test_reader_is_read_in_units() {
        let data = vec![7u8; READ_UNIT_SIZE + 10];
        let units = collect(ContentSource::reader(Cursor::new(data.clone())));
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].len(), READ_UNIT_SIZE);
        assert_eq!(units.concat(), data);
    }

    #[test]
    fn test_lazy_error_is_surfaced() {
        let source = ContentSource::lazy(vec![
            Ok(Bytes::from("a")),
            Err(io::Error::other("boom")),
        ]);
        let mut units = source.into_units();
        assert_eq!(units.next().unwrap().unwrap(), Bytes::from("a"));
        assert!(units.next().unwrap().is_err());
    }
}
