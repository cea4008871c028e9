//! End-to-end CLI tests for the quip-export binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quip_export() -> Command {
    let mut cmd = Command::cargo_bin("quip-export").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    quip_export()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Export a Quip folder tree"))
        .stdout(predicate::str::contains("--token-file"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    quip_export()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quip-export"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    quip_export()
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Without a token and with piped stdin, the binary must fail instead of prompting.
#[test]
fn test_binary_missing_token_fails_without_prompt() {
    quip_export()
        .args(["--folder", "https://quip.com/AbC123"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No access token provided"));
}

#[test]
fn test_binary_missing_folder_fails_without_prompt() {
    quip_export()
        .args(["--token", "tok"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No folder provided"));
}

#[test]
fn test_binary_empty_token_file_fails() {
    let dir = TempDir::new().unwrap();
    let token_file = dir.path().join("token");
    std::fs::write(&token_file, "   \n").unwrap();

    quip_export()
        .arg("--token-file")
        .arg(&token_file)
        .args(["--folder", "AbC123"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Access token is empty"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_exports_folder_against_mock_api() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/folders/ROOT"))
        .and(header("authorization", "Bearer file-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "folder": { "title": "Team" },
            "children": [ { "thread_id": "T1" } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1/threads/T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "thread": { "title": "Plan" },
            "html": "<p>plan</p>",
            "blobs": [ { "id": "B1", "name": "notes.txt" } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1/threads/T1/export/docx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"docx-bytes".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1/blob/T1/B1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"attached".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let token_file = dir.path().join("token");
    std::fs::write(&token_file, "file-token\n").unwrap();
    let output = dir.path().join("out");

    quip_export()
        .arg("--token-file")
        .arg(&token_file)
        .args(["--token", "ignored-flag-token"])
        .args(["--folder", "https://quip.com/ROOT"])
        .args(["--api-url", server.uri().as_str()])
        .args(["--rate-limit", "0", "--max-retries", "1"])
        .arg("--output")
        .arg(&output)
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Documents:   1 exported"))
        .stdout(predicate::str::contains("Attachments: 1 saved"));

    assert_eq!(
        std::fs::read(output.join("Team/Plan.docx")).unwrap(),
        b"docx-bytes"
    );
    assert_eq!(
        std::fs::read_to_string(output.join("Team/Plan_attachments/notes.txt")).unwrap(),
        "attached"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_reports_partial_failures_and_exits_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/folders/ROOT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "folder": { "title": "Team" },
            "children": [ { "thread_id": "GONE" } ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/1/threads/GONE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();

    quip_export()
        .args(["--token", "tok", "--folder", "ROOT", "--quiet"])
        .args(["--api-url", server.uri().as_str(), "--rate-limit", "0"])
        .arg("--output")
        .arg(dir.path())
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("[document] GONE"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_rejected_token_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1/folders/ROOT"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();

    quip_export()
        .args(["--token", "bad", "--folder", "ROOT"])
        .args(["--api-url", server.uri().as_str()])
        .arg("--output")
        .arg(dir.path())
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("access token rejected"))
        .stderr(predicate::str::contains("https://quip.com/dev/token"));
}
