//! reqwest-backed [`DocumentApi`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use reqwest::{Client, Response};
use tracing::{debug, info, instrument, warn};

use kbdesk_core::defaults::{
    MSG_DELETE_FAILED, MSG_DELETE_MANY_FAILED, MSG_DOWNLOAD_FAILED, MSG_LIST_FAILED,
    MSG_UPLOAD_FAILED,
};
use kbdesk_core::{
    DeleteManyOutcome, Document, DocumentApi, DocumentId, DocumentPage, Error, PageRequest,
    ProgressSink, Result, SourceFile,
};

use crate::config::ClientConfig;
use crate::error::{status_error, transport_error};
use crate::types::*;

/// Size of the body chunks handed to the transport during an upload.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Document store client over HTTP.
pub struct HttpDocumentApi {
    client: Client,
    config: ClientConfig,
}

impl HttpDocumentApi {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::Config("base_url must not be empty".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "client",
            base_url = %config.base_url,
            timeout_secs = config.timeout_secs,
            "Initializing document store client"
        );

        Ok(Self { client, config })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Create from environment variables (see [`ClientConfig::from_env`]).
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a request, turning transport failures and non-success statuses
    /// into errors carrying `fallback` when the store gave no message.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_secs))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let err = status_error(status.as_u16(), &body, fallback);
        warn!(
            subsystem = "client",
            status = status.as_u16(),
            error = %err,
            "Document store returned an error"
        );
        Err(err)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(&self, response: Response) -> Result<T> {
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_secs))?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Multipart body that reports the share of bytes handed to the transport.
    fn upload_form(&self, file: &SourceFile, progress: &ProgressSink) -> Result<reqwest::multipart::Form> {
        let data = file.data.clone();
        let total = data.len() as u64;
        let sent = Arc::new(AtomicU64::new(0));
        let sink = progress.clone();

        let chunks: Vec<Bytes> = (0..data.len())
            .step_by(UPLOAD_CHUNK_BYTES)
            .map(|start| data.slice(start..(start + UPLOAD_CHUNK_BYTES).min(data.len())))
            .collect();
        let body = stream::iter(chunks.into_iter().map(move |chunk| {
            let done = sent.fetch_add(chunk.len() as u64, Ordering::AcqRel) + chunk.len() as u64;
            if total > 0 {
                sink.report(done as f64 / total as f64 * 100.0);
            }
            Ok::<Bytes, std::io::Error>(chunk)
        }));

        let mut part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(body),
            total,
        )
        .file_name(file.display_name().to_string());
        if let Some(ref content_type) = file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| Error::InvalidInput(format!("Invalid content type: {}", e)))?;
        }

        Ok(reqwest::multipart::Form::new().part("file", part))
    }
}

#[async_trait]
impl DocumentApi for HttpDocumentApi {
    #[instrument(skip(self), fields(subsystem = "client", op = "list"))]
    async fn list(&self, page: Option<PageRequest>) -> Result<DocumentPage> {
        let start = Instant::now();
        let mut request = self.client.get(self.config.endpoint("list"));
        if let Some(page) = page {
            request = request.query(&[("page", page.page), ("per_page", page.per_page)]);
        }

        let response = self.execute(request, MSG_LIST_FAILED).await?;
        let body: ListResponse = self.read_json(response).await?;
        let documents: Vec<Document> = body
            .documents
            .into_iter()
            .map(DocumentRecord::into_document)
            .collect();

        debug!(
            count = documents.len(),
            total = ?body.total,
            duration_ms = start.elapsed().as_millis() as u64,
            "Listed documents"
        );
        Ok(DocumentPage {
            documents,
            total: body.total,
        })
    }

    #[instrument(skip(self, file, progress), fields(subsystem = "client", op = "upload", file_name = %file.display_name()))]
    async fn upload(&self, file: &SourceFile, progress: &ProgressSink) -> Result<Document> {
        let start = Instant::now();
        let form = self.upload_form(file, progress)?;
        let request = self.client.post(self.config.endpoint("upload")).multipart(form);

        let response = self.execute(request, MSG_UPLOAD_FAILED).await?;
        let body: UploadResponse = self.read_json(response).await?;
        if let Some(ref processing_error) = body.processing_error {
            warn!(
                error = %processing_error,
                "Document stored but post-processing failed"
            );
        }

        let document = body.document.into_document();
        debug!(
            document_id = %document.id,
            size_bytes = file.size_bytes,
            duration_ms = start.elapsed().as_millis() as u64,
            "Uploaded document"
        );
        Ok(document)
    }

    #[instrument(skip(self), fields(subsystem = "client", op = "delete"))]
    async fn delete(&self, id: &DocumentId) -> Result<()> {
        let url = self.config.document_url("delete", id.as_str())?;
        self.execute(self.client.delete(url), MSG_DELETE_FAILED)
            .await?;
        debug!(document_id = %id, "Deleted document");
        Ok(())
    }

    #[instrument(skip(self, ids), fields(subsystem = "client", op = "delete_many", count = ids.len()))]
    async fn delete_many(&self, ids: &[DocumentId]) -> Result<DeleteManyOutcome> {
        let request = self
            .client
            .delete(self.config.endpoint("delete-multiple"))
            .json(&DeleteManyRequest { document_ids: ids });

        let response = self.execute(request, MSG_DELETE_MANY_FAILED).await?;
        // The store has already committed; a malformed body only loses the count.
        let body = self
            .read_json::<DeleteManyResponse>(response)
            .await
            .unwrap_or_default();
        debug!(deleted_count = ?body.deleted_count, "Deleted documents");
        Ok(body.into())
    }

    #[instrument(skip(self), fields(subsystem = "client", op = "download"))]
    async fn download(&self, id: &DocumentId) -> Result<Bytes> {
        let url = self.config.document_url("download", id.as_str())?;
        let response = self
            .execute(self.client.get(url), MSG_DOWNLOAD_FAILED)
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_secs))?;
        debug!(document_id = %id, size_bytes = bytes.len(), "Downloaded document");
        Ok(bytes)
    }
}
