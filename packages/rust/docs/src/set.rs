//! Slug-keyed document aggregation with last-write-wins collision handling.

use docshelf_shared::Document;
use std::collections::HashMap;
use tracing::debug;

/// The parsed documents of one library (or a union across libraries), keyed
/// by joined slug.
///
/// Insertion order is preserved for iteration but carries no meaning beyond
/// display; crawl enumeration order is implementation-defined. When two
/// documents share a slug, the later insertion wins and keeps the earlier
/// entry's position.
#[derive(Debug, Default)]
pub struct DocumentSet {
    entries: Vec<Document>,
    index: HashMap<String, usize>,
}

impl DocumentSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document, overwriting any earlier entry with the same slug.
    pub fn insert(&mut self, document: Document) {
        let key = document.slug.joined();
        match self.index.get(&key) {
            Some(&pos) => {
                debug!(slug = %key, "slug collision, keeping later document");
                self.entries[pos] = document;
            }
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(document);
            }
        }
    }

    /// Look up a document by its joined slug.
    pub fn get(&self, slug: &str) -> Option<&Document> {
        self.index.get(slug).map(|&pos| &self.entries[pos])
    }

    /// Iterate documents in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter()
    }

    /// Number of distinct slugs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no documents.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the set, yielding its documents in insertion order.
    pub fn into_documents(self) -> Vec<Document> {
        self.entries
    }

    /// Absorb another set, applying the same last-write-wins rule.
    pub fn extend(&mut self, other: DocumentSet) {
        for document in other.entries {
            self.insert(document);
        }
    }
}

impl IntoIterator for DocumentSet {
    type Item = Document;
    type IntoIter = std::vec::IntoIter<Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
