//! End-to-end desk flows against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use kbdesk_ops::{
    Confirmed, DeleteTarget, Desk, DeskConfig, DeskEvent, Document, DocumentApi, DocumentId,
    FixedIncrements, Intent, ItemsPerPage, LocalDocumentStore, ProgressSimulator, ProgressSink,
    SelectAllState, SimulatedProgress, SourceFile, StoreOp, UploadStatus,
};

fn named(names: &[&str]) -> Vec<Document> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Document {
            id: DocumentId::from(format!("{}", i + 1)),
            name: name.to_string(),
            size_bytes: Some(2048),
            file_type: "PDF".to_string(),
            upload_date: None,
            is_folder_upload: false,
            status: Some("uploaded".to_string()),
        })
        .collect()
}

fn numbered(n: usize) -> Vec<Document> {
    let names: Vec<String> = (1..=n).map(|i| format!("doc-{i:02}.pdf")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    named(&refs)
}

async fn desk(store: Arc<LocalDocumentStore>) -> Desk {
    let config = DeskConfig::default();
    let desk = Desk::builder(store)
        .with_config(config.clone())
        .with_progress_strategy(Arc::new(SimulatedProgress::new(ProgressSimulator::new(
            config.progress_tick(),
            config.progress_ceiling,
            FixedIncrements::constant(20.0),
        ))))
        .build()
        .expect("valid config");
    desk.load().await.expect("initial load");
    desk
}

#[tokio::test(start_paused = true)]
async fn test_batch_with_one_failure() {
    let store = Arc::new(LocalDocumentStore::new());
    store.fail_upload_of("b.txt", "disk full");
    let desk = desk(store.clone()).await;
    let mut events = desk.events().subscribe();

    let batch = desk
        .stage_upload(vec![
            SourceFile::new("a.txt", "alpha"),
            SourceFile::new("b.txt", "beta"),
            SourceFile::new("c.txt", "gamma"),
        ])
        .await
        .unwrap();
    assert_eq!(batch.len(), 3);

    let report = match desk.confirm().await.unwrap() {
        Confirmed::Upload(report) => report,
        other => panic!("unexpected outcome: {other:?}"),
    };

    assert_eq!(report.added_count(), 2);
    assert_eq!(report.errors, vec!["Failed to upload b.txt: disk full"]);

    let names: Vec<String> = desk.documents().await.into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["a.txt", "c.txt"]);
    assert_eq!(
        desk.current_error().await.as_deref(),
        Some("Upload completed with 1 errors: Failed to upload b.txt: disk full")
    );
    assert_eq!(desk.active_notices().await.len(), 1);
    assert!(desk.active_batch().await.is_none());

    let mut started = Vec::new();
    while let Ok(envelope) = events.try_recv() {
        if let DeskEvent::ItemStarted { name, .. } = envelope.payload {
            started.push(name);
        }
    }
    assert_eq!(started, vec!["a.txt", "b.txt", "c.txt"]);
}

#[tokio::test(start_paused = true)]
async fn test_batch_progress_visible_while_running() {
    let store = Arc::new(LocalDocumentStore::new().with_simulated_latency(
        ProgressSimulator::new(Duration::from_millis(100), 100.0, FixedIncrements::constant(25.0)),
    ));
    let desk = Arc::new(desk(store).await);

    desk.stage_upload(vec![
        SourceFile::new("one.md", "1"),
        SourceFile::new("two.md", "2"),
    ])
    .await
    .unwrap();

    let runner = tokio::spawn({
        let desk = desk.clone();
        async move { desk.confirm().await }
    });

    tokio::time::sleep(Duration::from_millis(250)).await;
    let active = desk.active_batch().await.expect("batch running");
    assert_eq!(active.counter_label(), "1 of 2 files");
    let item = active.current_item().expect("item in flight");
    assert_eq!(item.file.name, "one.md");
    assert!(item.progress > 0.0 && item.progress < 100.0);
    let statuses: Vec<UploadStatus> = active.items().iter().map(|i| i.status).collect();
    assert_eq!(statuses, vec![UploadStatus::Uploading, UploadStatus::Pending]);

    // Staging another batch is refused while this one runs.
    assert!(desk
        .stage_upload(vec![SourceFile::new("three.md", "3")])
        .await
        .is_err());

    runner.await.unwrap().unwrap();
    assert_eq!(desk.documents().await.len(), 2);
    assert!(desk.active_batch().await.is_none());
}

#[tokio::test]
async fn test_filter_report() {
    let store = Arc::new(LocalDocumentStore::new().with_documents(named(&[
        "Q1 Report.pdf",
        "notes.txt",
        "annual-REPORT.docx",
    ])));
    let desk = desk(store).await;
    desk.toggle_select(&DocumentId::from("2")).await;

    desk.set_filter("report").await;

    let page = desk.page().await;
    let names: Vec<&str> = page.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Q1 Report.pdf", "annual-REPORT.docx"]);
    assert_eq!(page.filtered_count, 2);
    assert_eq!(page.current_page, 1);
    assert!(desk.selection().await.is_empty());
}

#[tokio::test]
async fn test_twelve_documents_page_two() {
    let store = Arc::new(LocalDocumentStore::new().with_documents(numbered(12)));
    let desk = desk(store).await;

    desk.set_page(2).await;
    let page = desk.page().await;

    assert_eq!(page.total_pages, 3);
    let names: Vec<&str> = page.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["doc-06.pdf", "doc-07.pdf", "doc-08.pdf", "doc-09.pdf", "doc-10.pdf"]
    );
    assert_eq!(page.range_label, "Showing 6-10 of 12 documents");
    assert_eq!(page.page_numbers, vec![1, 2, 3]);
    assert!(page.has_previous && page.has_next && page.shows_pager);
}

#[tokio::test]
async fn test_select_all_then_page_size_change() {
    let store = Arc::new(LocalDocumentStore::new().with_documents(numbered(12)));
    let desk = desk(store).await;
    desk.set_page(2).await;

    assert_eq!(desk.select_all_on_page().await, SelectAllState::All);
    assert_eq!(desk.selection().await.len(), 5);

    desk.set_items_per_page(ItemsPerPage::count(10).unwrap()).await;

    assert!(desk.selection().await.is_empty());
    let page = desk.page().await;
    assert_eq!(page.current_page, 1);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.select_all, SelectAllState::None);

    desk.set_items_per_page(ItemsPerPage::All).await;
    let page = desk.page().await;
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.documents.len(), 12);
    assert_eq!(page.range_label, "Showing all 12 documents");
    assert!(!page.shows_pager);
}

#[tokio::test]
async fn test_delete_selection_commits() {
    let store = Arc::new(LocalDocumentStore::new().with_documents(numbered(4)));
    let desk = desk(store.clone()).await;
    desk.toggle_select(&DocumentId::from("1")).await;
    desk.toggle_select(&DocumentId::from("3")).await;

    let pending = desk.stage_delete(DeleteTarget::Selection).await.unwrap();
    assert_eq!(pending.count, 2);

    let report = match desk.confirm().await.unwrap() {
        Confirmed::Delete(report) => report,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(report.store_count, Some(2));

    let remaining: Vec<String> = desk
        .documents()
        .await
        .into_iter()
        .map(|d| d.id.to_string())
        .collect();
    assert_eq!(remaining, vec!["2", "4"]);
    assert!(desk.selection().await.is_empty());
    assert_eq!(store.documents().len(), 2);
    assert!(desk.pending_delete().await.is_none());
    assert_eq!(
        desk.active_notices().await[0].message,
        "2 documents deleted successfully"
    );
}

#[tokio::test]
async fn test_delete_selection_rolls_back() {
    let store = Arc::new(LocalDocumentStore::new().with_documents(numbered(4)));
    let desk = desk(store.clone()).await;
    desk.toggle_select(&DocumentId::from("2")).await;
    desk.toggle_select(&DocumentId::from("4")).await;
    let before_docs = desk.documents().await;
    let before_selection = desk.selection().await;

    store.fail_next(StoreOp::DeleteMany, "Failed to delete documents: db locked");
    desk.stage_delete(DeleteTarget::Selection).await.unwrap();
    let err = desk.confirm().await.unwrap_err();

    assert_eq!(err.user_message(), "Failed to delete documents: db locked");
    assert_eq!(desk.documents().await, before_docs);
    assert_eq!(desk.selection().await, before_selection);
    assert_eq!(store.documents().len(), 4);
    assert_eq!(
        desk.current_error().await.as_deref(),
        Some("Failed to delete documents: db locked")
    );
}

#[tokio::test]
async fn test_last_stage_wins() {
    let store = Arc::new(LocalDocumentStore::new().with_documents(numbered(2)));
    let desk = desk(store.clone()).await;

    desk.stage_upload(vec![SourceFile::new("x.txt", "x")])
        .await
        .unwrap();
    desk.stage_delete(DeleteTarget::Single(DocumentId::from("1")))
        .await
        .unwrap();
    assert!(matches!(desk.staged().await, Some(Intent::Delete(_))));

    assert!(matches!(desk.confirm().await.unwrap(), Confirmed::Delete(_)));
    // The replaced upload never ran.
    assert_eq!(store.documents().len(), 1);
    assert!(desk.staged().await.is_none());
}

#[tokio::test]
async fn test_download_unknown_document_uses_fallback_name() {
    let store = Arc::new(LocalDocumentStore::new());
    let stored = store
        .upload(&SourceFile::new("late.txt", "late"), &ProgressSink::detached())
        .await
        .unwrap();
    // The desk never loaded this one, so it has no name to suggest.
    let desk = Desk::new(store.clone(), DeskConfig::default()).unwrap();

    let file = desk.download(&stored.id).await.unwrap();
    assert_eq!(file.suggested_name, format!("document-{}", stored.id));

    let dir = tempfile::tempdir().unwrap();
    let path = file.save_into(dir.path()).await.unwrap();
    assert_eq!(path, dir.path().join(format!("document-{}", stored.id)));
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"late");
}
