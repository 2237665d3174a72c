//! The document desk: one entry point for listing, selecting, uploading,
//! deleting, and downloading.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use kbdesk_core::{
    DeleteTarget, DeskEvent, Document, DocumentApi, DocumentCollection, DocumentId,
    DownloadedFile, Error, EventBus, ItemsPerPage, NoticeLevel, Result, SelectAllState,
    SelectionSet, SourceFile, ViewParams,
};

use crate::config::DeskConfig;
use crate::delete::{DeleteManager, DeleteReport};
use crate::gate::{ConfirmationGate, Intent, PendingBatch, PendingDelete};
use crate::notices::Notice;
use crate::simulator::ProgressSimulator;
use crate::state::{ActiveBatch, DeskState, SharedState};
use crate::strategy::{ProgressStrategy, SimulatedProgress};
use crate::upload::{BatchReport, UploadOrchestrator};

/// Owned copy of the current page, for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot {
    pub documents: Vec<Document>,
    pub filtered_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub page_numbers: Vec<usize>,
    pub range_label: String,
    pub select_all: SelectAllState,
    pub has_previous: bool,
    pub has_next: bool,
    pub shows_pager: bool,
}

/// What a confirmed intent did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmed {
    Upload(BatchReport),
    Delete(DeleteReport),
}

/// Builder for a [`Desk`].
pub struct DeskBuilder {
    api: Arc<dyn DocumentApi>,
    config: DeskConfig,
    events: Option<EventBus>,
    strategy: Option<Arc<dyn ProgressStrategy>>,
}

impl DeskBuilder {
    pub fn new(api: Arc<dyn DocumentApi>) -> Self {
        Self {
            api,
            config: DeskConfig::default(),
            events: None,
            strategy: None,
        }
    }

    pub fn with_config(mut self, config: DeskConfig) -> Self {
        self.config = config;
        self
    }

    /// Publish on an existing bus instead of a new one.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Override how upload progress is driven (simulated by default).
    pub fn with_progress_strategy(mut self, strategy: Arc<dyn ProgressStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn build(self) -> Result<Desk> {
        self.config.validate()?;
        let events = self.events.unwrap_or_default();
        let strategy = self.strategy.unwrap_or_else(|| {
            Arc::new(SimulatedProgress::new(ProgressSimulator::from_config(
                &self.config,
            )))
        });
        let state = DeskState::new(ViewParams::new(self.config.items_per_page)).shared();

        info!(
            subsystem = "desk",
            progress = strategy.name(),
            settle_delay_ms = self.config.settle_delay_ms,
            "Desk initialized"
        );

        Ok(Desk {
            uploads: UploadOrchestrator::new(
                self.api.clone(),
                state.clone(),
                events.clone(),
                strategy,
                &self.config,
            ),
            deletes: DeleteManager::new(self.api.clone(), state.clone(), events.clone(), &self.config),
            gate: Mutex::new(ConfirmationGate::new(events.clone())),
            api: self.api,
            state,
            events,
            config: self.config,
        })
    }
}

/// Document library client state and operations.
pub struct Desk {
    api: Arc<dyn DocumentApi>,
    state: SharedState,
    events: EventBus,
    config: DeskConfig,
    gate: Mutex<ConfirmationGate>,
    uploads: UploadOrchestrator,
    deletes: DeleteManager,
}

impl Desk {
    /// Desk with simulated upload progress.
    pub fn new(api: Arc<dyn DocumentApi>, config: DeskConfig) -> Result<Self> {
        DeskBuilder::new(api).with_config(config).build()
    }

    pub fn builder(api: Arc<dyn DocumentApi>) -> DeskBuilder {
        DeskBuilder::new(api)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    /// Shared state handle, for renderers that hold their own read guard.
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Replace the collection with the store's list.
    ///
    /// On failure the collection is left as it was and the error banner is
    /// raised.
    #[instrument(skip(self), fields(subsystem = "desk", op = "load"))]
    pub async fn load(&self) -> Result<usize> {
        let start = Instant::now();
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.notices.dismiss_error();
        }

        match self.api.list(None).await {
            Ok(page) => {
                let count = {
                    let mut state = self.state.write().await;
                    state.collection = DocumentCollection::from_documents(page.documents);
                    let DeskState {
                        collection,
                        selection,
                        ..
                    } = &mut *state;
                    let pruned = selection.retain_existing(collection);
                    if pruned > 0 {
                        debug!(pruned, "Dropped selected ids missing from the new list");
                    }
                    state.loading = false;
                    state.collection.len()
                };
                info!(
                    count,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Documents loaded"
                );
                self.events.emit(DeskEvent::DocumentsLoaded { count });
                Ok(count)
            }
            Err(err) => {
                let message = err.user_message();
                {
                    let mut state = self.state.write().await;
                    state.loading = false;
                    state.notices.error(message.clone());
                }
                warn!(error = %err, "Failed to load documents");
                self.raise_error(message);
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    /// Owned projection of the current page.
    pub async fn page(&self) -> PageSnapshot {
        let state = self.state.read().await;
        let view = state.view();
        PageSnapshot {
            documents: view.page_slice().iter().map(|d| (*d).clone()).collect(),
            filtered_count: view.filtered.len(),
            total_pages: view.total_pages,
            current_page: view.current_page,
            page_numbers: view.page_numbers(),
            range_label: view.range_label(),
            select_all: view.select_all,
            has_previous: view.has_previous(),
            has_next: view.has_next(),
            shows_pager: view.shows_pager(),
        }
    }

    pub async fn params(&self) -> ViewParams {
        self.state.read().await.params.clone()
    }

    pub async fn documents(&self) -> Vec<Document> {
        self.state.read().await.collection.as_slice().to_vec()
    }

    pub async fn selection(&self) -> SelectionSet {
        self.state.read().await.selection.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Filter by name; back to page 1 with nothing selected.
    pub async fn set_filter(&self, term: impl Into<String>) {
        let mut state = self.state.write().await;
        state.params = state.params.with_filter(term);
        state.selection.clear();
    }

    /// Change the page size; back to page 1 with nothing selected.
    pub async fn set_items_per_page(&self, items_per_page: ItemsPerPage) {
        let mut state = self.state.write().await;
        state.params = state.params.with_items_per_page(items_per_page);
        state.selection.clear();
    }

    /// Go to `page`, clamped to the available pages. Clears the selection.
    pub async fn set_page(&self, page: usize) -> usize {
        let mut state = self.state.write().await;
        let total = state.view().total_pages.max(1);
        state.params = state.params.with_page(page.clamp(1, total));
        state.selection.clear();
        state.params.current_page()
    }

    pub async fn next_page(&self) -> usize {
        let current = self.state.read().await.view().current_page;
        self.set_page(current + 1).await
    }

    pub async fn previous_page(&self) -> usize {
        let current = self.state.read().await.view().current_page;
        self.set_page(current.saturating_sub(1)).await
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Toggle one document. Ids not in the collection are ignored.
    ///
    /// Returns whether the id is selected afterwards.
    pub async fn toggle_select(&self, id: &DocumentId) -> bool {
        let mut state = self.state.write().await;
        if !state.collection.contains(id) {
            debug!(subsystem = "desk", document_id = %id, "Ignoring toggle of unknown document");
            return false;
        }
        state.selection.toggle(id.clone())
    }

    /// Select every document on the current page, or none if they all are.
    pub async fn select_all_on_page(&self) -> SelectAllState {
        let mut state = self.state.write().await;
        let (current, page_ids) = {
            let view = state.view();
            (view.select_all, view.page_ids())
        };
        if current == SelectAllState::All {
            state.selection.clear();
            SelectAllState::None
        } else if page_ids.is_empty() {
            SelectAllState::None
        } else {
            state.selection.select_exactly(page_ids);
            SelectAllState::All
        }
    }

    // ------------------------------------------------------------------
    // Staging
    // ------------------------------------------------------------------

    /// Validate picked files and stage them for confirmation.
    ///
    /// Refused while a batch is running.
    pub async fn stage_upload(&self, files: Vec<SourceFile>) -> Result<PendingBatch> {
        if self.state.read().await.is_uploading() {
            return Err(Error::Conflict(
                "Cannot stage files while an upload batch is running".to_string(),
            ));
        }
        let batch = PendingBatch::from_files(files, &self.config)?;
        self.gate.lock().await.stage(Intent::Upload(batch.clone()));
        Ok(batch)
    }

    /// Stage deletion of one document or of the current selection.
    pub async fn stage_delete(&self, target: DeleteTarget) -> Result<PendingDelete> {
        let count = {
            let state = self.state.read().await;
            match &target {
                DeleteTarget::Single(id) if !state.collection.contains(id) => {
                    return Err(Error::NotFound(format!("Document {}", id)));
                }
                DeleteTarget::Single(_) => 1,
                DeleteTarget::Selection if state.selection.is_empty() => {
                    return Err(Error::InvalidInput("No documents selected".to_string()));
                }
                DeleteTarget::Selection => state.selection.len(),
            }
        };
        let pending = PendingDelete { target, count };
        self.gate.lock().await.stage(Intent::Delete(pending.clone()));
        Ok(pending)
    }

    /// The intent awaiting confirmation.
    pub async fn staged(&self) -> Option<Intent> {
        self.gate.lock().await.staged().cloned()
    }

    /// Discard the staged intent.
    pub async fn cancel(&self) -> Option<Intent> {
        self.gate.lock().await.cancel()
    }

    /// Execute the staged intent.
    ///
    /// A confirmed upload runs to the end of its batch. A failed delete
    /// has already been rolled back when this returns its error.
    pub async fn confirm(&self) -> Result<Confirmed> {
        let intent = self.gate.lock().await.confirm();
        match intent {
            Some(Intent::Upload(batch)) => Ok(Confirmed::Upload(self.uploads.run(batch).await?)),
            Some(Intent::Delete(pending)) => {
                Ok(Confirmed::Delete(self.deletes.delete(pending.target).await?))
            }
            None => Err(Error::InvalidInput("Nothing to confirm".to_string())),
        }
    }

    /// The running batch, if any.
    pub async fn active_batch(&self) -> Option<ActiveBatch> {
        self.state.read().await.batch.clone()
    }

    /// Message shown while a delete awaits the store.
    pub async fn pending_delete(&self) -> Option<String> {
        self.state.read().await.pending_delete.clone()
    }

    // ------------------------------------------------------------------
    // Download
    // ------------------------------------------------------------------

    /// Fetch a document's content with the filename to save it under.
    #[instrument(skip(self), fields(subsystem = "desk", op = "download"))]
    pub async fn download(&self, id: &DocumentId) -> Result<DownloadedFile> {
        let suggested_name = self
            .state
            .read()
            .await
            .collection
            .get(id)
            .map(Document::suggested_filename)
            .unwrap_or_else(|| format!("document-{}", id));

        match self.api.download(id).await {
            Ok(bytes) => {
                debug!(document_id = %id, size_bytes = bytes.len(), "Download ready");
                Ok(DownloadedFile {
                    suggested_name,
                    bytes,
                })
            }
            Err(err) => {
                let message = err.user_message();
                self.state.write().await.notices.error(message.clone());
                warn!(document_id = %id, error = %err, "Download failed");
                self.raise_error(message);
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Notices
    // ------------------------------------------------------------------

    pub async fn current_error(&self) -> Option<String> {
        self.state
            .read()
            .await
            .notices
            .current_error()
            .map(String::from)
    }

    pub async fn dismiss_error(&self) {
        self.state.write().await.notices.dismiss_error();
    }

    /// Success notices still visible, with expired ones dropped.
    pub async fn active_notices(&self) -> Vec<Notice> {
        let mut state = self.state.write().await;
        state.notices.prune();
        state.notices.active().into_iter().cloned().collect()
    }

    fn raise_error(&self, message: String) {
        self.events.emit(DeskEvent::NoticeRaised {
            level: NoticeLevel::Error,
            message,
        });
    }
}
