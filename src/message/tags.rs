//! Tag block decoding.
//!
//! Tags are decoded on demand: most lines carry tags that no handler ever
//! inspects, so [`Message`](super::Message) keeps the raw segment and
//! builds a [`TagMap`] the first time a handler asks for one.
//!
//! Values are treated as opaque strings. Vendor-specific escaping is not
//! undone here.

use std::collections::hash_map::{self, HashMap};

use crate::error::TagLookupMiss;

/// Mapping from tag key to tag value, decoded from a tag segment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagMap {
    entries: HashMap<String, String>,
}

impl TagMap {
    /// Decode a tag segment (without the leading `@`).
    ///
    /// Pieces are separated by `;` and split on the first `=`. A piece with
    /// no `=` is a boolean-style tag with an empty value. When a key repeats,
    /// the last occurrence wins.
    pub fn decode(segment: &str) -> Self {
        let mut entries = HashMap::new();
        for piece in segment.split(';').filter(|piece| !piece.is_empty()) {
            let (key, value) = piece.split_once('=').unwrap_or((piece, ""));
            entries.insert(key.to_owned(), value.to_owned());
        }
        Self { entries }
    }

    /// Look up a tag value.
    ///
    /// An absent key is an error the caller has to handle: several checks
    /// (message deletion, badges, display name) depend on these values.
    pub fn get(&self, key: &str) -> Result<&str, TagLookupMiss> {
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| TagLookupMiss::new(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in arbitrary order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }
}

/// Iterator over the entries of a [`TagMap`].
pub struct Iter<'a> {
    inner: hash_map::Iter<'a, String, String>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
