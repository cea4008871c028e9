//! Integration tests for the Quip HTTP client.
//!
//! These tests run `QuipClient` against a wiremock server, covering endpoint
//! layout, authentication, retries and the HTML fallback source.

use std::time::Duration;

use quip_export_core::{
    ApiError, ChildRef, ClientConfig, DocumentService, ExportConfig, ExportFormat, Exporter,
    QuipClient, RetryPolicy,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

/// Retry policy with millisecond delays and no jitter.
fn fast_retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(
        max_attempts,
        Duration::from_millis(1),
        Duration::from_millis(10),
        2.0,
    )
    .with_max_jitter(Duration::ZERO)
}

fn client_for(server: &MockServer, max_attempts: u32) -> QuipClient {
    let config = ClientConfig::new(server.uri(), TOKEN)
        .with_retry_policy(fast_retry_policy(max_attempts));
    QuipClient::new(config).unwrap()
}

fn folder_body(title: &str, children: serde_json::Value) -> serde_json::Value {
    json!({ "folder": { "id": "ignored", "title": title }, "children": children })
}

#[tokio::test]
async fn test_folder_metadata_and_children_sent_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/folders/F1"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_body(
            "Team",
            json!([
                { "folder_id": "F2" },
                { "thread_id": "T1" },
                { "unexpected": true }
            ]),
        )))
        .mount(&server)
        .await;
    let client = client_for(&server, 1);

    let folder = client.get_folder("F1").await.unwrap();
    assert_eq!(folder.id, "F1");
    assert_eq!(folder.title, "Team");

    let page = client.list_children("F1", None).await.unwrap();
    assert_eq!(
        page.children,
        vec![
            ChildRef::Folder("F2".to_string()),
            ChildRef::Document("T1".to_string())
        ]
    );
    assert_eq!(page.next_cursor, None);
}

#[tokio::test]
async fn test_rejected_token_maps_to_auth_required_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/folders/F1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, 3);

    let err = client.get_folder("F1").await.unwrap_err();

    assert!(err.is_auth());
    assert!(matches!(err, ApiError::AuthRequired { status: 401, .. }));
}

#[tokio::test]
async fn test_transient_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/folders/F1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1/folders/F1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_body("Team", json!([]))))
        .mount(&server)
        .await;
    let client = client_for(&server, 3);

    let folder = client.get_folder("F1").await.unwrap();

    assert_eq!(folder.title, "Team");
}

#[tokio::test]
async fn test_not_found_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/threads/T404"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, 3);

    let err = client.get_document("T404").await.unwrap_err();

    assert!(matches!(err, ApiError::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_error_payload_maps_to_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/folders/F1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Bad request",
            "error_description": "Invalid folder id"
        })))
        .mount(&server)
        .await;
    let client = client_for(&server, 1);

    let err = client.get_folder("F1").await.unwrap_err();

    match err {
        ApiError::Service { message, .. } => {
            assert_eq!(message, "Bad request: Invalid folder id");
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_thread_is_fetched_once_per_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/threads/T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread": { "id": "T1", "title": "Plan" },
            "html": "<h1>Plan</h1>",
            "blobs": [ { "id": "B1", "name": "chart.png" } ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, 1);

    let document = client.get_document("T1").await.unwrap();
    let html = client
        .export_document("T1", ExportFormat::Html)
        .await
        .unwrap();
    let attachments = client.list_attachments("T1").await.unwrap();

    assert_eq!(document.title, "Plan");
    assert_eq!(html, b"<h1>Plan</h1>");
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].id, "B1");
    assert_eq!(attachments[0].name, "chart.png");
}

#[tokio::test]
async fn test_folder_is_fetched_once_for_title_and_children() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/folders/F1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_body(
            "Team",
            json!([{ "thread_id": "T1" }]),
        )))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, 1);

    let folder = client.get_folder("F1").await.unwrap();
    let page = client.list_children("F1", None).await.unwrap();

    assert_eq!(folder.title, "Team");
    assert_eq!(page.children, vec![ChildRef::Document("T1".to_string())]);
}

#[tokio::test]
async fn test_folder_is_refetched_on_next_visit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/folders/F1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_body("Team", json!([]))))
        .expect(2)
        .mount(&server)
        .await;
    let client = client_for(&server, 1);

    for _ in 0..2 {
        client.get_folder("F1").await.unwrap();
        client.list_children("F1", None).await.unwrap();
    }
}

#[tokio::test]
async fn test_exporting_empty_folder_requests_it_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/folders/F1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_body("Empty", json!([]))))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, 1);
    let out = TempDir::new().unwrap();
    let config = ExportConfig {
        request_delay: Duration::ZERO,
        ..ExportConfig::default()
    };

    let summary = Exporter::new(&client, config)
        .export("F1", out.path())
        .await
        .unwrap();

    assert!(out.path().join("Empty").is_dir());
    assert!(summary.is_clean());
}

#[tokio::test]
async fn test_docx_export_and_blob_download_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/threads/T1/export/docx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK-docx".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1/blob/T1/B1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"blob".to_vec()))
        .mount(&server)
        .await;
    let client = client_for(&server, 1);

    let docx = client
        .export_document("T1", ExportFormat::Docx)
        .await
        .unwrap();
    let blob = client.download_attachment("T1", "B1").await.unwrap();

    assert_eq!(docx, b"PK-docx");
    assert_eq!(blob, b"blob");
}

#[tokio::test]
async fn test_html_export_without_html_is_not_supported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/threads/T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread": { "title": "Empty" },
            "html": ""
        })))
        .mount(&server)
        .await;
    let client = client_for(&server, 1);

    let err = client
        .export_document("T1", ExportFormat::Html)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotSupported { .. }));
}

#[tokio::test]
async fn test_exporter_over_http_falls_back_to_html() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/folders/ROOT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_body(
            "Team",
            json!([{ "thread_id": "T1" }]),
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1/threads/T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread": { "title": "Sheet" },
            "html": "<table></table>",
            "blobs": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1/threads/T1/export/docx"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;
    let client = client_for(&server, 1);
    let out = TempDir::new().unwrap();
    let config = ExportConfig {
        request_delay: Duration::ZERO,
        ..ExportConfig::default()
    };

    let summary = Exporter::new(&client, config)
        .export("ROOT", out.path())
        .await
        .unwrap();

    let html = std::fs::read_to_string(out.path().join("Team/Sheet.html")).unwrap();
    assert_eq!(html, "<table></table>");
    assert!(!out.path().join("Team/Sheet.docx").exists());
    assert_eq!(summary.fallback_exports(), 1);
    assert!(summary.is_clean());
}
