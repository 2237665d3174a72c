//! Core traits for kbdesk abstractions.
//!
//! The remote document store is reached only through [`DocumentApi`], so the
//! orchestration code can run against the HTTP client, the in-memory store,
//! or a test double.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::models::*;
use crate::progress::ProgressSink;

/// Remote document store boundary.
///
/// Implementations bound every call by a request timeout and report the
/// server's message (or the per-operation fallback) in their errors.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// List documents, optionally one server-side page.
    async fn list(&self, page: Option<PageRequest>) -> Result<DocumentPage>;

    /// Upload one file and return the persisted record.
    ///
    /// Implementations with a real progress signal report it through
    /// `progress`; they must not call [`ProgressSink::complete`].
    async fn upload(&self, file: &SourceFile, progress: &ProgressSink) -> Result<Document>;

    /// Delete one document.
    async fn delete(&self, id: &DocumentId) -> Result<()>;

    /// Delete several documents in one request.
    async fn delete_many(&self, ids: &[DocumentId]) -> Result<DeleteManyOutcome>;

    /// Fetch the raw content of one document.
    async fn download(&self, id: &DocumentId) -> Result<Bytes>;
}
