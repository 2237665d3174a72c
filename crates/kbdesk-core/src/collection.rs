//! The canonical document collection and the selection set.
//!
//! Both are plain values: they are cloned for snapshots and compared for
//! rollback checks. Shared access is handled by whoever owns them.

use std::collections::BTreeSet;

use crate::models::{Document, DocumentId};

/// Authoritative in-memory set of documents, kept in arrival order.
///
/// Ids are unique at all times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentCollection {
    documents: Vec<Document>,
}

impl DocumentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a fetched list; later duplicates of an id are dropped.
    pub fn from_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let mut collection = Self::new();
        for doc in documents {
            collection.append(doc);
        }
        collection
    }

    /// Append a document at the end.
    ///
    /// Returns `false` (and leaves the collection untouched) if a document
    /// with the same id is already present.
    pub fn append(&mut self, document: Document) -> bool {
        if self.contains(&document.id) {
            return false;
        }
        self.documents.push(document);
        true
    }

    /// Remove every document whose id is in `ids`. Returns how many went.
    pub fn remove_ids(&mut self, ids: &BTreeSet<DocumentId>) -> usize {
        let before = self.documents.len();
        self.documents.retain(|d| !ids.contains(&d.id));
        before - self.documents.len()
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.documents.iter().any(|d| &d.id == id)
    }

    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| &d.id == id)
    }

    pub fn as_slice(&self) -> &[Document] {
        &self.documents
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Ids the user has currently checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<DocumentId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.ids.contains(id)
    }

    /// Flip membership of `id`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: DocumentId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Replace the whole selection.
    pub fn select_exactly(&mut self, ids: impl IntoIterator<Item = DocumentId>) {
        self.ids = ids.into_iter().collect();
    }

    pub fn remove(&mut self, id: &DocumentId) -> bool {
        self.ids.remove(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that no longer exist in `collection`. Returns how many went.
    pub fn retain_existing(&mut self, collection: &DocumentCollection) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| collection.contains(id));
        before - self.ids.len()
    }

    pub fn ids(&self) -> &BTreeSet<DocumentId> {
        &self.ids
    }

    pub fn to_vec(&self) -> Vec<DocumentId> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
