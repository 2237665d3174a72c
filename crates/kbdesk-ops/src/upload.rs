//! Sequential upload of a confirmed batch.
//!
//! Files go to the store one at a time. A failed file is recorded and the
//! loop moves on; the batch always runs to the end.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use kbdesk_core::{
    DeskEvent, Document, DocumentApi, DocumentId, Error, EventBus, NoticeLevel, ProgressSink,
    Result, SourceFile, UploadStatus,
};

use crate::config::DeskConfig;
use crate::gate::PendingBatch;
use crate::notices::NoticeKind;
use crate::state::{ActiveBatch, SharedState};
use crate::strategy::ProgressStrategy;

/// Notice shown when at least one file of a batch was stored.
pub const UPLOAD_SUCCESS_MESSAGE: &str = "Files uploaded successfully!";

/// Outcome of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub attempted: usize,
    /// Documents merged into the collection, in upload order.
    pub added: Vec<DocumentId>,
    /// `"Failed to upload <name>: <message>"` per failed file.
    pub errors: Vec<String>,
}

impl BatchReport {
    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// `"Upload completed with <n> errors: <e1>, <e2>"`, when any file failed.
    pub fn error_summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(format!(
            "Upload completed with {} errors: {}",
            self.errors.len(),
            self.errors.join(", ")
        ))
    }
}

/// Runs confirmed batches against a [`DocumentApi`].
pub struct UploadOrchestrator {
    api: Arc<dyn DocumentApi>,
    state: SharedState,
    events: EventBus,
    strategy: Arc<dyn ProgressStrategy>,
    settle_delay: Duration,
    upload_timeout: Duration,
    notice_ttl: Duration,
}

impl UploadOrchestrator {
    pub fn new(
        api: Arc<dyn DocumentApi>,
        state: SharedState,
        events: EventBus,
        strategy: Arc<dyn ProgressStrategy>,
        config: &DeskConfig,
    ) -> Self {
        Self {
            api,
            state,
            events,
            strategy,
            settle_delay: config.settle_delay(),
            upload_timeout: config.upload_timeout(),
            notice_ttl: config.notice_ttl(),
        }
    }

    /// Upload every file of `batch` in order.
    ///
    /// Fails only when another batch is already running; per-file failures
    /// are reported in the [`BatchReport`] and as the error notice.
    #[instrument(skip(self, batch), fields(subsystem = "upload", op = "batch", file_count = batch.len()))]
    pub async fn run(&self, batch: PendingBatch) -> Result<BatchReport> {
        let start = Instant::now();
        let batch_id = Uuid::now_v7();
        let files = batch.into_files();
        let total = files.len();
        let queue = ActiveBatch::new(batch_id, files.iter().map(SourceFile::preview));

        {
            let mut state = self.state.write().await;
            if state.batch.is_some() {
                return Err(Error::Conflict(
                    "An upload batch is already running".to_string(),
                ));
            }
            state.batch = Some(queue);
            state.notices.dismiss_error();
        }

        info!(%batch_id, file_count = total, "Upload batch started");
        self.events.emit(DeskEvent::BatchStarted {
            batch_id,
            file_count: total,
        });

        let mut added = Vec::new();
        let mut errors = Vec::new();

        for (index, file) in files.iter().enumerate() {
            match self.upload_one(batch_id, index, file).await {
                Ok(Some(id)) => {
                    added.push(id);
                    sleep(self.settle_delay).await;
                }
                Ok(None) => {
                    sleep(self.settle_delay).await;
                }
                Err(message) => errors.push(message),
            }
        }

        let report = BatchReport {
            batch_id,
            attempted: total,
            added,
            errors,
        };
        self.finish(&report).await;

        info!(
            %batch_id,
            added = report.added_count(),
            failed = report.errors.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Upload batch finished"
        );
        Ok(report)
    }

    /// Upload one file. `Ok(None)` means the store answered with a document
    /// already in the collection.
    async fn upload_one(
        &self,
        batch_id: Uuid,
        index: usize,
        file: &SourceFile,
    ) -> std::result::Result<Option<DocumentId>, String> {
        let name = file.display_name().to_string();
        let file_start = Instant::now();

        let events = self.events.clone();
        let sink = ProgressSink::new(move |progress| {
            events.emit(DeskEvent::ItemProgress {
                batch_id,
                index,
                progress,
            });
        });

        {
            let mut state = self.state.write().await;
            if let Some(active) = state.batch.as_mut() {
                active.start_item(index, sink.clone());
            }
        }
        debug!(%batch_id, index, file_name = %name, "Uploading file");
        self.events.emit(DeskEvent::ItemStarted {
            batch_id,
            index,
            name: name.clone(),
        });

        let outcome = self.upload_with_timeout(file, &sink).await;

        match outcome {
            Ok(document) => {
                sink.complete();
                let document_id = document.id.clone();
                let appended = {
                    let mut state = self.state.write().await;
                    let appended = state.collection.append(document);
                    mark_item(&mut state.batch, UploadStatus::Completed, 100.0);
                    appended
                };
                if !appended {
                    warn!(
                        %batch_id,
                        document_id = %document_id,
                        "Store returned a document already in the collection"
                    );
                }
                debug!(
                    %batch_id,
                    index,
                    document_id = %document_id,
                    duration_ms = file_start.elapsed().as_millis() as u64,
                    "File uploaded"
                );
                self.events.emit(DeskEvent::ItemCompleted {
                    batch_id,
                    index,
                    document_id: document_id.clone(),
                });
                Ok(appended.then_some(document_id))
            }
            Err(err) => {
                let message = format!("Failed to upload {}: {}", name, err.user_message());
                {
                    let mut state = self.state.write().await;
                    mark_item(&mut state.batch, UploadStatus::Failed, sink.value());
                }
                warn!(
                    %batch_id,
                    index,
                    file_name = %name,
                    error = %err,
                    duration_ms = file_start.elapsed().as_millis() as u64,
                    "File upload failed"
                );
                self.events.emit(DeskEvent::ItemFailed {
                    batch_id,
                    index,
                    name,
                    error: err.user_message(),
                });
                Err(message)
            }
        }
    }

    async fn upload_with_timeout(&self, file: &SourceFile, sink: &ProgressSink) -> Result<Document> {
        let upload = self.api.upload(file, sink);
        match tokio::time::timeout(self.upload_timeout, self.strategy.drive(sink, upload)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.upload_timeout.as_secs())),
        }
    }

    /// Clear transient batch state and raise the batch notices.
    async fn finish(&self, report: &BatchReport) {
        let summary = report.error_summary();
        {
            let mut state = self.state.write().await;
            state.batch = None;
            if let Some(ref summary) = summary {
                state.notices.error(summary.clone());
            }
            if !report.added.is_empty() {
                state
                    .notices
                    .success(NoticeKind::Upload, UPLOAD_SUCCESS_MESSAGE, self.notice_ttl);
            }
        }

        self.events.emit(DeskEvent::BatchFinished {
            batch_id: report.batch_id,
            added: report.added_count(),
            failed: report.errors.len(),
        });
        if let Some(summary) = summary {
            self.events.emit(DeskEvent::NoticeRaised {
                level: NoticeLevel::Error,
                message: summary,
            });
        }
        if !report.added.is_empty() {
            self.events.emit(DeskEvent::NoticeRaised {
                level: NoticeLevel::Success,
                message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            });
        }
    }
}

fn mark_item(batch: &mut Option<ActiveBatch>, status: UploadStatus, progress: f64) {
    if let Some(active) = batch.as_mut() {
        active.finish_item(status, progress);
    }
}
