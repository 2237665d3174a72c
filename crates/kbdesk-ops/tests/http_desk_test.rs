//! Desk flows against the HTTP client and a wiremock document store.

use std::sync::Arc;
use std::time::Duration;

use kbdesk_client::{ClientConfig, HttpDocumentApi};
use kbdesk_ops::{
    Confirmed, DeleteTarget, Desk, DeskConfig, DeskEvent, DocumentId, ReportedProgress,
    SourceFile,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn desk_for(server: &MockServer) -> Desk {
    desk_with_timeout(server, 5)
}

fn desk_with_timeout(server: &MockServer, timeout_secs: u64) -> Desk {
    let client = ClientConfig::default()
        .with_base_url(format!("{}/api/document", server.uri()))
        .with_timeout_secs(timeout_secs);
    let api = Arc::new(HttpDocumentApi::new(client).expect("client"));
    Desk::builder(api)
        .with_config(DeskConfig::default().with_settle_delay(10))
        .with_progress_strategy(Arc::new(ReportedProgress))
        .build()
        .expect("desk")
}

async fn mount_list(server: &MockServer, documents: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/document/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "documents": documents })))
        .mount(server)
        .await;
}

async fn mount_upload(server: &MockServer, name: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/document/upload"))
        .and(body_string_contains(format!("filename=\"{}\"", name)))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

fn stored(id: i64, name: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "message": "File uploaded successfully",
        "document": {"id": id, "name": name, "file_size": 5, "file_type": "TXT",
                     "upload_date": "2026-10-01", "status": "uploaded"}
    }))
}

#[tokio::test]
async fn test_upload_batch_over_http() {
    let server = MockServer::start().await;
    mount_list(&server, json!([])).await;
    mount_upload(&server, "a.txt", stored(1, "a.txt")).await;
    mount_upload(
        &server,
        "b.txt",
        ResponseTemplate::new(500).set_body_json(json!({"error": "disk full"})),
    )
    .await;
    mount_upload(&server, "c.txt", stored(3, "c.txt")).await;

    let desk = desk_for(&server).await;
    desk.load().await.unwrap();
    let mut events = desk.events().subscribe();

    desk.stage_upload(vec![
        SourceFile::new("a.txt", "alpha"),
        SourceFile::new("b.txt", "bravo"),
        SourceFile::new("c.txt", "charl"),
    ])
    .await
    .unwrap();
    let report = match desk.confirm().await.unwrap() {
        Confirmed::Upload(report) => report,
        other => panic!("unexpected outcome: {other:?}"),
    };

    assert_eq!(report.added, vec![DocumentId::from(1i64), DocumentId::from(3i64)]);
    assert_eq!(report.errors, vec!["Failed to upload b.txt: disk full"]);
    assert_eq!(
        desk.current_error().await.as_deref(),
        Some("Upload completed with 1 errors: Failed to upload b.txt: disk full")
    );

    // Streamed progress for the first file reaches 100 only on completion.
    let mut first_file = Vec::new();
    while let Ok(envelope) = events.try_recv() {
        if let DeskEvent::ItemProgress { index: 0, progress, .. } = envelope.payload {
            first_file.push(progress);
        }
    }
    assert_eq!(first_file.last(), Some(&100.0));
    assert!(first_file[..first_file.len() - 1].iter().all(|p| *p < 100.0));
}

#[tokio::test]
async fn test_delete_selection_over_http_rolls_back() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            {"id": 1, "name": "a.pdf", "file_type": "PDF"},
            {"id": 2, "name": "b.pdf", "file_type": "PDF"},
            {"id": 3, "name": "c.pdf", "file_type": "PDF"}
        ]),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/api/document/delete-multiple"))
        .and(body_json(json!({"document_ids": ["1", "3"]})))
        .respond_with(ResponseTemplate::new(500).set_body_string(""))
        .expect(1)
        .mount(&server)
        .await;

    let desk = desk_for(&server).await;
    desk.load().await.unwrap();
    desk.toggle_select(&DocumentId::from(1i64)).await;
    desk.toggle_select(&DocumentId::from(3i64)).await;
    let before = desk.documents().await;

    desk.stage_delete(DeleteTarget::Selection).await.unwrap();
    let err = desk.confirm().await.unwrap_err();

    assert_eq!(err.user_message(), "Failed to delete documents");
    assert_eq!(desk.documents().await, before);
    assert_eq!(desk.selection().await.len(), 2);
    assert!(desk.pending_delete().await.is_none());
}

#[tokio::test]
async fn test_delete_timeout_rolls_back() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        json!([
            {"id": 1, "name": "a.pdf", "file_type": "PDF"},
            {"id": 2, "name": "b.pdf", "file_type": "PDF"}
        ]),
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/api/document/delete-multiple"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"deleted_count": 1}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let desk = desk_with_timeout(&server, 1);
    desk.load().await.unwrap();
    desk.toggle_select(&DocumentId::from(2i64)).await;
    let before_docs = desk.documents().await;
    let before_selection = desk.selection().await;

    desk.stage_delete(DeleteTarget::Selection).await.unwrap();
    let err = desk.confirm().await.unwrap_err();

    assert!(matches!(err, kbdesk_ops::Error::Timeout(1)));
    assert_eq!(desk.documents().await, before_docs);
    assert_eq!(desk.selection().await, before_selection);
    assert_eq!(
        desk.current_error().await.as_deref(),
        Some("Request timed out after 1s")
    );
}
