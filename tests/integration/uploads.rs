//! Integration tests for multipart uploads

use super::*;
use openai_transport::{OpenAIError, RequestOptions};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use wiremock::{Request, Respond};

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

fn upload_fields(file: &Path, purpose: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    fields.insert("file".to_string(), file.to_string_lossy().into_owned());
    fields.insert("purpose".to_string(), purpose.to_string());
    fields
}

async fn single_upload(mock_server: &MockServer) -> (String, Vec<Part>) {
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let request = &requests[0];
    let content_type = request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    let parts = parse_multipart(&content_type, &request.body);
    (content_type, parts)
}

fn mount_files_endpoint() -> Mock {
    mock_with_auth("/files", "POST").respond_with(
        ResponseTemplate::new(200).set_body_json(json!({"id": "file-abc123", "object": "file"})),
    )
}

#[tokio::test]
async fn test_fine_tune_json_is_sent_as_jsonl() {
    let mock_server = setup_mock_server().await;
    mount_files_endpoint().mount(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_file(
        dir.path(),
        "training.JSON",
        r#"[
            {"messages": [{"role": "user", "content": "hi"}]},
            {"messages": [{"role": "user", "content": "bye"}]}
        ]"#,
    );

    let client = client_for(&mock_server).unwrap();
    let body = client
        .request_upload("/files", &upload_fields(&file, "fine-tune"), &RequestOptions::new())
        .await
        .unwrap();
    let response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(response["id"], "file-abc123");

    let (content_type, parts) = single_upload(&mock_server).await;
    assert!(content_type.starts_with("multipart/form-data; boundary="));

    let file_part = parts.iter().find(|p| p.name == "file").unwrap();
    assert_eq!(file_part.filename.as_deref(), Some("training.JSON"));

    let lines: Vec<&str> = file_part.data.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(file_part.data.ends_with('\n'));
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["messages"][0]["content"], "hi");
    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["messages"][0]["content"], "bye");

    let purpose = parts.iter().find(|p| p.name == "purpose").unwrap();
    assert_eq!(purpose.data, "fine-tune");
}

#[tokio::test]
async fn test_assistants_json_is_sent_verbatim() {
    let mock_server = setup_mock_server().await;
    mount_files_endpoint().mount(&mock_server).await;

    let content = "[\n  {\"doc\": 1}\n]\n";
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "knowledge.json", content);

    let client = client_for(&mock_server).unwrap();
    client
        .request_upload("/files", &upload_fields(&file, "assistants"), &RequestOptions::new())
        .await
        .unwrap();

    let (_, parts) = single_upload(&mock_server).await;
    let file_part = parts.iter().find(|p| p.name == "file").unwrap();
    assert_eq!(file_part.data, content);
}

#[tokio::test]
async fn test_non_json_file_is_sent_verbatim_for_fine_tune() {
    let mock_server = setup_mock_server().await;
    mount_files_endpoint().mount(&mock_server).await;

    let content = "prompt,completion\nhello,world\n";
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "data.csv", content);

    let client = client_for(&mock_server).unwrap();
    client
        .request_upload("/files", &upload_fields(&file, "fine-tune"), &RequestOptions::new())
        .await
        .unwrap();

    let (_, parts) = single_upload(&mock_server).await;
    let file_part = parts.iter().find(|p| p.name == "file").unwrap();
    assert_eq!(file_part.filename.as_deref(), Some("data.csv"));
    assert_eq!(file_part.data, content);
}

#[tokio::test]
async fn test_file_part_is_never_duplicated() {
    let mock_server = setup_mock_server().await;
    mount_files_endpoint().mount(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "notes.txt", "plain text");

    let mut fields = upload_fields(&file, "assistants");
    fields.insert("description".to_string(), "reference notes".to_string());

    let client = client_for(&mock_server).unwrap();
    client
        .request_upload("/files", &fields, &RequestOptions::new())
        .await
        .unwrap();

    let (_, parts) = single_upload(&mock_server).await;
    assert_eq!(parts.len(), 3);
    assert_eq!(parts.iter().filter(|p| p.name == "file").count(), 1);

    let description = parts.iter().find(|p| p.name == "description").unwrap();
    assert_eq!(description.data, "reference notes");
    assert!(description.filename.is_none());
}

#[tokio::test]
async fn test_missing_file_sends_nothing() {
    let mock_server = setup_mock_server().await;
    mount_files_endpoint().expect(0).mount(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");

    let client = client_for(&mock_server).unwrap();
    let err = client
        .request_upload("/files", &upload_fields(&missing, "fine-tune"), &RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, OpenAIError::FileAccess { .. }));
}

#[tokio::test]
async fn test_malformed_fine_tune_json_sends_nothing() {
    let mock_server = setup_mock_server().await;
    mount_files_endpoint().expect(0).mount(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "broken.json", r#"[{"a": 1}, {"b": "#);

    let client = client_for(&mock_server).unwrap();
    let err = client
        .request_upload("/files", &upload_fields(&file, "fine-tune"), &RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, OpenAIError::Conversion { .. }));
}

#[tokio::test]
async fn test_upload_rejected_by_api() {
    let mock_server = setup_mock_server().await;
    mock_with_auth("/files", "POST")
        .respond_with(error_response(400, "Invalid file format for Fine-Tuning API."))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "train.json", r#"[{"text": "x"}]"#);

    let client = client_for(&mock_server).unwrap();
    let err = client
        .request_upload("/files", &upload_fields(&file, "fine-tune"), &RequestOptions::new())
        .await
        .unwrap_err();

    match err {
        OpenAIError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid file format for Fine-Tuning API.");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

/// Answers with the received request body.
struct EchoBody;

impl Respond for EchoBody {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_bytes(request.body.clone())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_uploads_share_one_client() {
    let mock_server = setup_mock_server().await;
    mock_with_auth("/files", "POST")
        .respond_with(EchoBody)
        .expect(8)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(client_for(&mock_server).unwrap());

    let mut handles = Vec::new();
    for i in 0..8 {
        let marker = format!("upload-{}", i);
        let file = write_file(
            dir.path(),
            &format!("batch-{}.json", i),
            &format!(r#"[{{"marker": "{}"}}]"#, marker),
        );
        let fields = upload_fields(&file, "fine-tune");
        let client = Arc::clone(&client);

        handles.push(tokio::spawn(async move {
            let echoed = client
                .request_upload("/files", &fields, &RequestOptions::new())
                .await
                .unwrap();
            (marker, String::from_utf8(echoed.to_vec()).unwrap())
        }));
    }

    for handle in handles {
        let (marker, echoed) = handle.await.unwrap();
        assert!(echoed.contains(&format!("{{\"marker\":\"{}\"}}\n", marker)));
        for other in 0..8 {
            let other_marker = format!("\"upload-{}\"", other);
            if format!("\"{}\"", marker) != other_marker {
                assert!(!echoed.contains(&other_marker));
            }
        }
    }
}
