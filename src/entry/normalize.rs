//! Entry descriptions and their normalization into canonical entries.

use std::fmt;

use tracing::debug;

use super::ContentSource;
use crate::error::StreamError;

/// Compression method applied to an entry inside the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Bytes are stored as-is.
    Stored,
    /// Bytes are deflate-compressed.
    Deflated,
}

/// A caller-supplied entry description.
///
/// Every field is optional here; [`normalize`] reports the first missing
/// required field as [`StreamError::MissingField`].
#[derive(Debug, Default)]
pub struct EntrySpec {
    path: Option<String>,
    source: Option<ContentSource>,
    codec: Option<Codec>,
}

impl EntrySpec {
    /// Creates an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a description with a path and a source.
    pub fn file(path: impl Into<String>, source: impl Into<ContentSource>) -> Self {
        Self::new().with_path(path).with_source(source)
    }

    /// Sets the archive-relative path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the content source.
    pub fn with_source(mut self, source: impl Into<ContentSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Overrides the codec for this entry.
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = Some(codec);
        self
    }

    fn resolve(self, index: usize, default_codec: Codec) -> Result<Entry, StreamError> {
        let path = match self.path {
            Some(path) if !path.is_empty() => path,
            _ => {
                return Err(StreamError::MissingField {
                    index,
                    field: "path",
                });
            }
        };

        let source = self.source.ok_or(StreamError::MissingField {
            index,
            field: "source",
        })?;

        Ok(Entry {
            path,
            source,
            codec: self.codec.unwrap_or(default_codec),
        })
    }
}

/// A canonical archive entry.
#[derive(Debug)]
pub struct Entry {
    path: String,
    source: ContentSource,
    codec: Codec,
}

impl Entry {
    /// Creates an entry directly, bypassing normalization.
    pub fn new(path: impl Into<String>, source: impl Into<ContentSource>, codec: Codec) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            codec,
        }
    }

    /// Returns the archive-relative path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the codec.
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Consumes the entry and returns `(path, source, codec)`.
    pub fn into_parts(self) -> (String, ContentSource, Codec) {
        (self.path, self.source, self.codec)
    }
}

/// The accepted shapes of entry input.
///
/// # Example
///
/// ```
/// use zipchunks::{Entries, EntrySpec};
///
/// let one: Entries = EntrySpec::file("a.txt", "alpha").into();
/// let many: Entries = vec![
///     EntrySpec::file("a.txt", "alpha"),
///     EntrySpec::file("b.txt", "beta"),
/// ]
/// .into();
/// let lazy = Entries::lazy((0..3).map(|i| EntrySpec::file(format!("{i}.txt"), "x")));
/// ```
pub enum Entries {
    /// A single entry.
    Single(EntrySpec),
    /// An ordered list of entries.
    List(Vec<EntrySpec>),
    /// A lazy sequence of entries, validated as they are pulled.
    Lazy(Box<dyn Iterator<Item = EntrySpec> + Send>),
}

impl Entries {
    /// Wraps a lazy sequence of entry descriptions.
    pub fn lazy<I>(specs: I) -> Self
    where
        I: IntoIterator<Item = EntrySpec>,
        I::IntoIter: Send + 'static,
    {
        Entries::Lazy(Box::new(specs.into_iter()))
    }
}

impl fmt::Debug for Entries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entries::Single(spec) => f.debug_tuple("Single").field(spec).finish(),
            Entries::List(specs) => f.debug_tuple("List").field(specs).finish(),
            Entries::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl From<EntrySpec> for Entries {
    fn from(spec: EntrySpec) -> Self {
        Entries::Single(spec)
    }
}

impl From<Vec<EntrySpec>> for Entries {
    fn from(specs: Vec<EntrySpec>) -> Self {
        Entries::List(specs)
    }
}

enum Pending {
    Ready(std::vec::IntoIter<Entry>),
    Lazy {
        specs: Box<dyn Iterator<Item = EntrySpec> + Send>,
        index: usize,
        default_codec: Codec,
    },
    Failed,
}

/// Lazy sequence of canonical entries produced by [`normalize`].
pub struct EntryIter {
    pending: Pending,
}

impl EntryIter {
    /// An entry sequence over already canonical entries.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            pending: Pending::Ready(entries.into_iter()),
        }
    }
}

impl Iterator for EntryIter {
    type Item = Result<Entry, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.pending {
            Pending::Ready(entries) => entries.next().map(Ok),
            Pending::Lazy {
                specs,
                index,
                default_codec,
            } => {
                let spec = specs.next()?;
                let result = spec.resolve(*index, *default_codec);
                *index += 1;
                if result.is_err() {
                    self.pending = Pending::Failed;
                }
                Some(result)
            }
            Pending::Failed => None,
        }
    }
}

impl fmt::Debug for EntryIter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryIter").finish_non_exhaustive()
    }
}

/// Normalizes caller entry input into a lazy sequence of canonical entries.
///
/// Single entries and lists are validated completely before this returns.
/// Lazy sequences are validated one entry per pull, before any of that
/// entry's bytes are produced; the sequence ends after the first failure.
///
/// # Errors
///
/// [`StreamError::MissingField`] naming the entry index and the field
/// (`path` or `source`). An empty path counts as missing.
pub fn normalize(entries: Entries, default_codec: Codec) -> Result<EntryIter, StreamError> {
    let pending = match entries {
        Entries::Single(spec) => Pending::Ready(vec![spec.resolve(0, default_codec)?].into_iter()),
        Entries::List(specs) => {
            let entries = specs
                .into_iter()
                .enumerate()
                .map(|(index, spec)| spec.resolve(index, default_codec))
                .collect::<Result<Vec<_>, _>>()?;
            debug!(entries = entries.len(), "normalized entry list");
            Pending::Ready(entries.into_iter())
        }
        Entries::Lazy(specs) => Pending::Lazy {
            specs,
            index: 0,
            default_codec,
        },
    };

    Ok(EntryIter { pending })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(iter: EntryIter) -> Vec<String> {
        iter.map(|e| e.unwrap().path().to_owned()).collect()
    }

    #[test]
    fn test_single_entry() {
        let iter = normalize(EntrySpec::file("a.txt", "x").into(), Codec::Stored).unwrap();
        assert_eq!(paths(iter), vec!["a.txt"]);
    }

    #[test]
    fn test_list_preserves_order() {
        let specs = vec![EntrySpec::file("b", "1"), EntrySpec::file("a", "2")];
        let iter = normalize(specs.into(), Codec::Stored).unwrap();
        assert_eq!(paths(iter), vec!["b", "a"]);
    }

    #[test]
    fn test_default_codec_applies_when_unset() {
        let specs = vec![
            EntrySpec::file("a", "1"),
            EntrySpec::file("b", "2").with_codec(Codec::Stored),
        ];
        let codecs: Vec<_> = normalize(specs.into(), Codec::Deflated)
            .unwrap()
            .map(|e| e.unwrap().codec())
            .collect();
        assert_eq!(codecs, vec![Codec::Deflated, Codec::Stored]);
    }

    #[test]
    fn test_list_missing_field_is_eager() {
        let specs = vec![
            EntrySpec::file("a", "1"),
            EntrySpec::new().with_path("b"),
        ];
        let err = normalize(specs.into(), Codec::Stored).unwrap_err();
        assert!(matches!(
            err,
            StreamError::MissingField {
                index: 1,
                field: "source"
            }
        ));
    }

    #[test]
    fn test_empty_path_is_missing() {
        let err = normalize(EntrySpec::file("", "x").into(), Codec::Stored).unwrap_err();
        assert!(matches!(
            err,
            StreamError::MissingField {
                index: 0,
                field: "path"
            }
        ));
    }

    #[test]
    fn test_lazy_missing_field_reported_on_pull() {
        let specs = vec![
            EntrySpec::file("a", "1"),
            EntrySpec::new().with_source("2"),
            EntrySpec::file("c", "3"),
        ];
        let mut iter = normalize(Entries::lazy(specs), Codec::Stored).unwrap();

        assert_eq!(iter.next().unwrap().unwrap().path(), "a");
        assert!(matches!(
            iter.next(),
            Some(Err(StreamError::MissingField {
                index: 1,
                field: "path"
            }))
        ));
        assert!(iter.next().is_none());
    }
}
