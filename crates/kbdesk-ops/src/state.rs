//! Shared desk state.
//!
//! The collection and selection are the persistent state; everything else is
//! what the UI renders around them. All of it sits behind one
//! `tokio::sync::RwLock` so a mutation and its bookkeeping are applied under a
//! single write guard.

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use kbdesk_core::{
    project, DocumentCollection, FilePreview, PageView, ProgressSink, SelectionSet, UploadItem,
    UploadStatus, ViewParams,
};

use crate::notices::Notices;

/// Shared handle to [`DeskState`].
pub type SharedState = Arc<RwLock<DeskState>>;

/// The upload batch currently running.
///
/// Every file gets an [`UploadItem`] in `Pending` when the batch starts; items
/// move to `Uploading` one at a time and end `Completed` or `Failed`.
#[derive(Debug, Clone)]
pub struct ActiveBatch {
    pub batch_id: Uuid,
    pub total: usize,
    /// 1-based position of the file being uploaded; 0 before the first starts.
    pub current: usize,
    pub(crate) items: Vec<UploadItem>,
    pub(crate) progress: Option<ProgressSink>,
}

impl ActiveBatch {
    pub fn new(batch_id: Uuid, files: impl IntoIterator<Item = FilePreview>) -> Self {
        let items: Vec<UploadItem> = files
            .into_iter()
            .enumerate()
            .map(|(index, file)| UploadItem::pending(index, file))
            .collect();
        Self {
            batch_id,
            total: items.len(),
            current: 0,
            items,
            progress: None,
        }
    }

    /// Queue state of every file, with live progress for the one in flight.
    pub fn items(&self) -> Vec<UploadItem> {
        self.items.iter().map(|item| self.with_live_progress(item)).collect()
    }

    /// Snapshot of the item in flight with its live progress.
    pub fn current_item(&self) -> Option<UploadItem> {
        let item = self.items.get(self.current.checked_sub(1)?)?;
        Some(self.with_live_progress(item))
    }

    /// `"2 of 3 files"`.
    pub fn counter_label(&self) -> String {
        format!("{} of {} files", self.current, self.total)
    }

    /// Move item `index` to `Uploading` with `sink` as its progress source.
    pub(crate) fn start_item(&mut self, index: usize, sink: ProgressSink) {
        if let Some(item) = self.items.get_mut(index) {
            item.status = UploadStatus::Uploading;
            self.current = index + 1;
            self.progress = Some(sink);
        }
    }

    /// Record the outcome of the item in flight.
    pub(crate) fn finish_item(&mut self, status: UploadStatus, progress: f64) {
        let Some(index) = self.current.checked_sub(1) else {
            return;
        };
        if let Some(item) = self.items.get_mut(index) {
            item.status = status;
            item.progress = item.progress.max(progress);
        }
        self.progress = None;
    }

    fn with_live_progress(&self, item: &UploadItem) -> UploadItem {
        let mut item = item.clone();
        if item.status == UploadStatus::Uploading {
            if let Some(ref sink) = self.progress {
                item.progress = item.progress.max(sink.value());
            }
        }
        item
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeskState {
    pub collection: DocumentCollection,
    pub selection: SelectionSet,
    pub params: ViewParams,
    /// A list request is in flight.
    pub loading: bool,
    /// Message shown while an optimistic delete awaits the store.
    pub pending_delete: Option<String>,
    pub batch: Option<ActiveBatch>,
    pub notices: Notices,
}

impl DeskState {
    pub fn new(params: ViewParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Current page projection.
    pub fn view(&self) -> PageView<'_> {
        project(self.collection.as_slice(), &self.params, &self.selection)
    }

    pub fn is_uploading(&self) -> bool {
        self.batch.is_some()
    }

    pub fn is_deleting(&self) -> bool {
        self.pending_delete.is_some()
    }
}
