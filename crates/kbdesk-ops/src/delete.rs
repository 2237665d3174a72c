//! Optimistic deletes with full rollback.
//!
//! Snapshot and removal happen under one write guard, so no reader sees the
//! collection between them. The store is called afterwards; on failure both
//! snapshots are written back unchanged.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use kbdesk_core::{
    DeleteTarget, DeskEvent, DocumentApi, DocumentCollection, DocumentId, Error, EventBus,
    NoticeLevel, Result, SelectionSet,
};

use crate::config::DeskConfig;
use crate::notices::NoticeKind;
use crate::state::SharedState;

/// `"document"` or `"documents"`.
fn documents(count: usize) -> &'static str {
    if count == 1 {
        "document"
    } else {
        "documents"
    }
}

/// `"Deleting 3 documents..."`.
pub fn pending_message(count: usize) -> String {
    format!("Deleting {} {}...", count, documents(count))
}

/// `"3 documents deleted successfully"`.
pub fn success_message(count: usize) -> String {
    format!("{} {} deleted successfully", count, documents(count))
}

/// Outcome of a committed delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: Vec<DocumentId>,
    /// Count reported by the store, when it sent one.
    pub store_count: Option<u64>,
}

/// Applies deletes locally, then confirms them with the store.
pub struct DeleteManager {
    api: Arc<dyn DocumentApi>,
    state: SharedState,
    events: EventBus,
    notice_ttl: Duration,
}

struct Snapshot {
    collection: DocumentCollection,
    selection: SelectionSet,
}

impl DeleteManager {
    pub fn new(
        api: Arc<dyn DocumentApi>,
        state: SharedState,
        events: EventBus,
        config: &DeskConfig,
    ) -> Self {
        Self {
            api,
            state,
            events,
            notice_ttl: config.notice_ttl(),
        }
    }

    /// Delete one document or the current selection.
    ///
    /// On failure the collection and selection are restored to exactly what
    /// they were before the removal and the error banner is raised.
    #[instrument(skip(self), fields(subsystem = "delete", op = "delete"))]
    pub async fn delete(&self, target: DeleteTarget) -> Result<DeleteReport> {
        let start = Instant::now();
        let (ids, snapshot) = self.apply(&target).await?;
        let count = ids.len();

        let result = match &target {
            DeleteTarget::Single(id) => self.api.delete(id).await.map(|_| None),
            DeleteTarget::Selection => self
                .api
                .delete_many(&ids)
                .await
                .map(|outcome| outcome.deleted_count),
        };

        match result {
            Ok(store_count) => {
                let message = success_message(count);
                {
                    let mut state = self.state.write().await;
                    // A refresh that landed while the store call was in flight
                    // may have brought the targeted ids back.
                    let targeted: BTreeSet<DocumentId> = ids.iter().cloned().collect();
                    let resurrected = state.collection.remove_ids(&targeted);
                    for id in &ids {
                        state.selection.remove(id);
                    }
                    if resurrected > 0 {
                        debug!(resurrected, "Dropped deleted documents restored by a refresh");
                    }
                    state.pending_delete = None;
                    state
                        .notices
                        .success(NoticeKind::Delete, message.clone(), self.notice_ttl);
                }
                info!(
                    count,
                    store_count = ?store_count,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Delete committed"
                );
                self.events.emit(DeskEvent::DeleteCommitted { count });
                self.events.emit(DeskEvent::NoticeRaised {
                    level: NoticeLevel::Success,
                    message,
                });
                Ok(DeleteReport {
                    deleted: ids,
                    store_count,
                })
            }
            Err(err) => {
                let message = err.user_message();
                {
                    let mut state = self.state.write().await;
                    // Documents uploaded while the delete was pending survive the rollback.
                    let arrived: Vec<_> = state
                        .collection
                        .iter()
                        .filter(|d| !snapshot.collection.contains(&d.id))
                        .cloned()
                        .collect();
                    state.collection = snapshot.collection;
                    for document in arrived {
                        state.collection.append(document);
                    }
                    state.selection = snapshot.selection;
                    state.pending_delete = None;
                    state.notices.error(message.clone());
                }
                warn!(
                    count,
                    error = %err,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Delete rolled back"
                );
                self.events.emit(DeskEvent::DeleteRolledBack {
                    count,
                    error: message.clone(),
                });
                self.events.emit(DeskEvent::NoticeRaised {
                    level: NoticeLevel::Error,
                    message,
                });
                Err(err)
            }
        }
    }

    /// Snapshot, then remove the targeted ids, under one write guard.
    async fn apply(&self, target: &DeleteTarget) -> Result<(Vec<DocumentId>, Snapshot)> {
        let mut state = self.state.write().await;
        if state.pending_delete.is_some() {
            return Err(Error::Conflict("A delete is already in progress".to_string()));
        }

        let ids: Vec<DocumentId> = match target {
            DeleteTarget::Single(id) => {
                if !state.collection.contains(id) {
                    return Err(Error::NotFound(format!("Document {}", id)));
                }
                vec![id.clone()]
            }
            DeleteTarget::Selection => state.selection.to_vec(),
        };
        if ids.is_empty() {
            return Err(Error::InvalidInput("No documents selected".to_string()));
        }

        let snapshot = Snapshot {
            collection: state.collection.clone(),
            selection: state.selection.clone(),
        };

        let targeted: BTreeSet<DocumentId> = ids.iter().cloned().collect();
        state.collection.remove_ids(&targeted);
        match target {
            DeleteTarget::Single(id) => {
                state.selection.remove(id);
            }
            DeleteTarget::Selection => state.selection.clear(),
        }
        let message = pending_message(ids.len());
        state.pending_delete = Some(message.clone());
        drop(state);

        self.events.emit(DeskEvent::DeletePending {
            count: ids.len(),
            message,
        });
        Ok((ids, snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DeskState;
    use async_trait::async_trait;
    use bytes::Bytes;
    use kbdesk_core::{
        DeleteManyOutcome, Document, DocumentPage, PageRequest, ProgressSink, SourceFile,
        ViewParams,
    };
    use std::sync::Mutex;
    use tokio::sync::Notify;

    struct GatedStore {
        fail_with: Option<String>,
        release: Notify,
        calls: Mutex<Vec<String>>,
    }

    impl GatedStore {
        fn new(fail_with: Option<&str>) -> Self {
            Self {
                fail_with: fail_with.map(String::from),
                release: Notify::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        async fn respond(&self) -> Result<()> {
            self.release.notified().await;
            match self.fail_with {
                Some(ref message) => Err(Error::Api {
                    status: 500,
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl DocumentApi for GatedStore {
        async fn list(&self, _page: Option<PageRequest>) -> Result<DocumentPage> {
            Ok(DocumentPage::default())
        }

        async fn upload(&self, _file: &SourceFile, _progress: &ProgressSink) -> Result<Document> {
            Err(Error::Internal("unused".into()))
        }

        async fn delete(&self, id: &DocumentId) -> Result<()> {
            self.calls.lock().unwrap().push(format!("delete:{id}"));
            self.respond().await
        }

        async fn delete_many(&self, ids: &[DocumentId]) -> Result<DeleteManyOutcome> {
            self.calls.lock().unwrap().push(format!("delete_many:{}", ids.len()));
            self.respond().await?;
            Ok(DeleteManyOutcome {
                deleted_count: Some(ids.len() as u64),
            })
        }

        async fn download(&self, _id: &DocumentId) -> Result<Bytes> {
            Ok(Bytes::new())
        }
    }

    fn doc(id: &str) -> Document {
        Document {
            id: DocumentId::from(id),
            name: format!("{id}.pdf"),
            size_bytes: Some(10),
            file_type: "PDF".to_string(),
            upload_date: None,
            is_folder_upload: false,
            status: None,
        }
    }

    async fn setup(
        store: Arc<GatedStore>,
        ids: &[&str],
        selected: &[&str],
    ) -> (Arc<DeleteManager>, SharedState) {
        let state = DeskState::new(ViewParams::default()).shared();
        {
            let mut s = state.write().await;
            s.collection = DocumentCollection::from_documents(ids.iter().map(|i| doc(i)));
            s.selection
                .select_exactly(selected.iter().map(|i| DocumentId::from(*i)));
        }
        let manager = Arc::new(DeleteManager::new(
            store,
            state.clone(),
            EventBus::new(64),
            &DeskConfig::default(),
        ));
        (manager, state)
    }

    #[test]
    fn test_messages_pluralize() {
        assert_eq!(pending_message(1), "Deleting 1 document...");
        assert_eq!(pending_message(3), "Deleting 3 documents...");
        assert_eq!(success_message(1), "1 document deleted successfully");
        assert_eq!(success_message(0), "0 documents deleted successfully");
    }

    #[tokio::test]
    async fn test_selection_delete_is_optimistic_then_commits() {
        let store = Arc::new(GatedStore::new(None));
        let (manager, state) = setup(store.clone(), &["1", "2", "3"], &["1", "3"]).await;

        let task = tokio::spawn({
            let manager = manager.clone();
            async move { manager.delete(DeleteTarget::Selection).await }
        });
        tokio::task::yield_now().await;
        while store.calls.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }

        {
            let s = state.read().await;
            let remaining: Vec<&str> = s.collection.iter().map(|d| d.id.as_str()).collect();
            assert_eq!(remaining, vec!["2"]);
            assert!(s.selection.is_empty());
            assert_eq!(s.pending_delete.as_deref(), Some("Deleting 2 documents..."));
        }

        store.release.notify_one();
        let report = task.await.unwrap().unwrap();
        assert_eq!(report.store_count, Some(2));
        assert_eq!(*store.calls.lock().unwrap(), vec!["delete_many:2"]);

        let s = state.read().await;
        assert!(s.pending_delete.is_none());
        assert!(!s.collection.contains(&DocumentId::from("1")));
        assert!(!s.collection.contains(&DocumentId::from("3")));
        assert_eq!(
            s.notices.active_of(NoticeKind::Delete).map(|n| n.message.as_str()),
            Some("2 documents deleted successfully")
        );
    }

    #[tokio::test]
    async fn test_commit_drops_ids_restored_by_refresh() {
        let store = Arc::new(GatedStore::new(None));
        let (manager, state) = setup(store.clone(), &["1", "2", "3"], &["1", "3"]).await;

        let task = tokio::spawn({
            let manager = manager.clone();
            async move { manager.delete(DeleteTarget::Selection).await }
        });
        while store.calls.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        // A re-fetch lands before the store confirms, and the user reselects.
        {
            let mut s = state.write().await;
            s.collection = DocumentCollection::from_documents(["1", "2", "3"].map(doc));
            s.selection.toggle(DocumentId::from("1"));
        }

        store.release.notify_one();
        task.await.unwrap().unwrap();

        let s = state.read().await;
        let ids: Vec<&str> = s.collection.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
        assert!(s.selection.is_empty());
        assert!(s.pending_delete.is_none());
    }

    #[tokio::test]
    async fn test_failed_delete_restores_pointwise() {
        let store = Arc::new(GatedStore::new(Some("permission denied")));
        let (manager, state) = setup(store.clone(), &["1", "2", "3", "4"], &["2", "4"]).await;
        let (before_collection, before_selection) = {
            let s = state.read().await;
            (s.collection.clone(), s.selection.clone())
        };

        store.release.notify_one();
        let err = manager.delete(DeleteTarget::Selection).await.unwrap_err();
        assert_eq!(err.user_message(), "permission denied");

        let s = state.read().await;
        assert_eq!(s.collection, before_collection);
        assert_eq!(s.selection, before_selection);
        assert!(s.pending_delete.is_none());
        assert_eq!(s.notices.current_error(), Some("permission denied"));
    }

    #[tokio::test]
    async fn test_rollback_keeps_documents_that_arrived_meanwhile() {
        let store = Arc::new(GatedStore::new(Some("timeout")));
        let (manager, state) = setup(store.clone(), &["1", "2"], &["1"]).await;

        let task = tokio::spawn({
            let manager = manager.clone();
            async move { manager.delete(DeleteTarget::Selection).await }
        });
        while store.calls.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        state.write().await.collection.append(doc("9"));

        store.release.notify_one();
        task.await.unwrap().unwrap_err();

        let s = state.read().await;
        let ids: Vec<&str> = s.collection.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "9"]);
        assert_eq!(s.selection.to_vec(), vec![DocumentId::from("1")]);
    }

    #[tokio::test]
    async fn test_single_delete_prunes_selection() {
        let store = Arc::new(GatedStore::new(None));
        let (manager, state) = setup(store.clone(), &["1", "2"], &["1", "2"]).await;

        store.release.notify_one();
        manager
            .delete(DeleteTarget::Single(DocumentId::from("1")))
            .await
            .unwrap();

        assert_eq!(*store.calls.lock().unwrap(), vec!["delete:1"]);
        let s = state.read().await;
        assert_eq!(s.collection.len(), 1);
        assert_eq!(s.selection.to_vec(), vec![DocumentId::from("2")]);
        assert_eq!(
            s.notices.active_of(NoticeKind::Delete).map(|n| n.message.as_str()),
            Some("1 document deleted successfully")
        );
    }

    #[tokio::test]
    async fn test_single_delete_failure_restores_selection() {
        let store = Arc::new(GatedStore::new(Some("Document not found")));
        let (manager, state) = setup(store.clone(), &["1", "2"], &["1"]).await;

        store.release.notify_one();
        manager
            .delete(DeleteTarget::Single(DocumentId::from("1")))
            .await
            .unwrap_err();

        let s = state.read().await;
        assert_eq!(s.collection.len(), 2);
        assert!(s.selection.contains(&DocumentId::from("1")));
    }

    #[tokio::test]
    async fn test_empty_selection_is_rejected_without_calls() {
        let store = Arc::new(GatedStore::new(None));
        let (manager, _) = setup(store.clone(), &["1"], &[]).await;

        let err = manager.delete(DeleteTarget::Selection).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_single_id_is_not_found() {
        let store = Arc::new(GatedStore::new(None));
        let (manager, _) = setup(store.clone(), &["1"], &[]).await;

        let err = manager
            .delete(DeleteTarget::Single(DocumentId::from("9")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(store.calls.lock().unwrap().is_empty());
    }
}
