//! In-memory document store.
//!
//! Behaves like the HTTP store (same status codes and messages) so the desk
//! can run without a server. Failures can be injected per operation, and
//! uploads can take simulated time driven by a [`ProgressSimulator`].

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tracing::debug;

use kbdesk_core::{
    DeleteManyOutcome, Document, DocumentApi, DocumentId, DocumentPage, Error, PageRequest,
    ProgressSink, Result, SourceFile,
};

use crate::simulator::ProgressSimulator;

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Upload,
    Delete,
    DeleteMany,
    Download,
}

#[derive(Default)]
struct Inner {
    documents: Vec<(Document, Bytes)>,
    fail_next: HashMap<StoreOp, VecDeque<String>>,
    fail_uploads: HashMap<String, String>,
}

/// In-memory [`DocumentApi`].
pub struct LocalDocumentStore {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
    latency: Option<ProgressSimulator>,
}

impl Default for LocalDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalDocumentStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            next_id: AtomicU64::new(1),
            latency: None,
        }
    }

    /// Seed with existing documents (no content).
    pub fn with_documents(self, documents: impl IntoIterator<Item = Document>) -> Self {
        {
            let mut inner = self.lock();
            for document in documents {
                inner.documents.push((document, Bytes::new()));
            }
        }
        self
    }

    /// Make every upload run a pure progress simulation before it resolves.
    pub fn with_simulated_latency(mut self, simulator: ProgressSimulator) -> Self {
        self.latency = Some(simulator);
        self
    }

    /// Fail the next call of `op` with `message`. Queued failures are used in order.
    pub fn fail_next(&self, op: StoreOp, message: impl Into<String>) {
        self.lock()
            .fail_next
            .entry(op)
            .or_default()
            .push_back(message.into());
    }

    /// Fail every upload of a file with this name.
    pub fn fail_upload_of(&self, name: impl Into<String>, message: impl Into<String>) {
        self.lock().fail_uploads.insert(name.into(), message.into());
    }

    /// Documents currently stored, in arrival order.
    pub fn documents(&self) -> Vec<Document> {
        self.lock().documents.iter().map(|(d, _)| d.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn injected(&self, op: StoreOp) -> Result<()> {
        let message = self.lock().fail_next.get_mut(&op).and_then(VecDeque::pop_front);
        match message {
            Some(message) => Err(Error::Api {
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }

    fn not_found() -> Error {
        Error::Api {
            status: 404,
            message: "Document not found".to_string(),
        }
    }
}

#[async_trait]
impl DocumentApi for LocalDocumentStore {
    async fn list(&self, page: Option<PageRequest>) -> Result<DocumentPage> {
        self.injected(StoreOp::List)?;
        let documents = self.documents();
        let total = documents.len() as u64;
        let documents = match page {
            Some(PageRequest { page, per_page }) if per_page > 0 => documents
                .into_iter()
                .skip(page.saturating_sub(1) as usize * per_page as usize)
                .take(per_page as usize)
                .collect(),
            _ => documents,
        };
        Ok(DocumentPage {
            documents,
            total: Some(total),
        })
    }

    async fn upload(&self, file: &SourceFile, progress: &ProgressSink) -> Result<Document> {
        if let Some(ref simulator) = self.latency {
            simulator.simulate(progress).await;
        }
        self.injected(StoreOp::Upload)?;
        if let Some(message) = self.lock().fail_uploads.get(&file.name).cloned() {
            return Err(Error::Api {
                status: 500,
                message,
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let document = Document {
            id: DocumentId::from(id.to_string()),
            name: file.display_name().to_string(),
            size_bytes: Some(file.size_bytes),
            file_type: file.file_type(),
            upload_date: Some(Utc::now().date_naive()),
            is_folder_upload: file.is_folder_upload(),
            status: Some("uploaded".to_string()),
        };
        self.lock()
            .documents
            .push((document.clone(), file.data.clone()));
        debug!(subsystem = "local_store", document_id = %document.id, "Stored document");
        Ok(document)
    }

    async fn delete(&self, id: &DocumentId) -> Result<()> {
        self.injected(StoreOp::Delete)?;
        let mut inner = self.lock();
        let before = inner.documents.len();
        inner.documents.retain(|(d, _)| &d.id != id);
        if inner.documents.len() == before {
            return Err(Self::not_found());
        }
        Ok(())
    }

    async fn delete_many(&self, ids: &[DocumentId]) -> Result<DeleteManyOutcome> {
        if ids.is_empty() {
            return Err(Error::Api {
                status: 400,
                message: "No document IDs provided".to_string(),
            });
        }
        self.injected(StoreOp::DeleteMany)?;
        let mut inner = self.lock();
        let before = inner.documents.len();
        inner.documents.retain(|(d, _)| !ids.contains(&d.id));
        Ok(DeleteManyOutcome {
            deleted_count: Some((before - inner.documents.len()) as u64),
        })
    }

    async fn download(&self, id: &DocumentId) -> Result<Bytes> {
        self.injected(StoreOp::Download)?;
        self.lock()
            .documents
            .iter()
            .find(|(d, _)| &d.id == id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(Self::not_found)
    }
}
