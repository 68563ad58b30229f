//! Integration tests for body-less, raw and JSON requests

use super::*;
use bytes::Bytes;
use openai_transport::{OpenAIError, RequestOptions, TransportError};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, body_string, header};

#[tokio::test]
async fn test_get_returns_raw_body() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/models", "GET")
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"object":"list","data":[]}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).unwrap();
    let body = client
        .request("GET", "/models", &RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(body, Bytes::from(r#"{"object":"list","data":[]}"#));
}

#[tokio::test]
async fn test_base_url_trailing_slash_is_joined_once() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/v1/files", "GET")
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = OpenAIClient::builder()
        .api_key(API_KEY)
        .base_url(format!("{}/v1/", mock_server.uri()))
        .build()
        .unwrap();

    client
        .request("GET", "/files", &RequestOptions::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_json_request() {
    let mock_server = setup_mock_server().await;
    let payload = json!({
        "model": "gpt-3.5-turbo",
        "training_file": "file-abc123"
    });

    mock_with_auth("/fine_tuning/jobs", "POST")
        .and(header("Content-Type", "application/json"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "ftjob-1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).unwrap();
    let body = client
        .request_json("POST", "/fine_tuning/jobs", &payload, &RequestOptions::new())
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["id"], "ftjob-1");
}

#[tokio::test]
async fn test_raw_stream_request() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/raw", "POST")
        .and(body_string("first chunk, second chunk"))
        .respond_with(ResponseTemplate::new(201).set_body_string("stored"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let chunks: Vec<OpenAIResult<Bytes>> = vec![
        Ok(Bytes::from("first chunk, ")),
        Ok(Bytes::from("second chunk")),
    ];

    let client = client_for(&mock_server).unwrap();
    let body = client
        .request_raw(
            "POST",
            "/raw",
            Box::pin(futures::stream::iter(chunks)),
            &RequestOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(body, Bytes::from("stored"));
}

#[tokio::test]
async fn test_api_error_message_is_extracted() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/models", "GET")
        .respond_with(error_response(401, "bad key"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).unwrap();
    let err = client
        .request("GET", "/models", &RequestOptions::new())
        .await
        .unwrap_err();

    match err {
        OpenAIError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "bad key");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_api_error_fallback_message() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/empty", "GET")
        .respond_with(ResponseTemplate::new(500).set_body_string("{}"))
        .mount(&mock_server)
        .await;
    mock_with_auth("/html", "GET")
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).unwrap();
    for (route, expected_status) in [("/empty", 500), ("/html", 502)] {
        let err = client
            .request("GET", route, &RequestOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(expected_status));
        assert!(err.to_string().contains("unknown API error"));
    }
}

#[tokio::test]
async fn test_status_classification_boundaries() {
    let mock_server = setup_mock_server().await;

    for status in [200u16, 204, 299, 300, 404] {
        Mock::given(wiremock::matchers::path(format!("/status/{}", status)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;
    }

    let client = client_for(&mock_server).unwrap();
    for (status, success) in [(200, true), (204, true), (299, true), (300, false), (404, false)] {
        let result = client
            .request("GET", &format!("/status/{}", status), &RequestOptions::new())
            .await;
        assert_eq!(result.is_ok(), success, "status {}", status);
    }
}

#[tokio::test]
async fn test_per_call_timeout() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/slow", "GET")
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).unwrap();
    let err = client
        .request(
            "GET",
            "/slow",
            &RequestOptions::new().with_timeout(Duration::from_millis(200)),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OpenAIError::Transport(TransportError::Timeout { .. })
    ));
}

#[tokio::test]
async fn test_cancellation() {
    let mock_server = setup_mock_server().await;

    mock_with_auth("/slow", "GET")
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).unwrap();
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let err = client
        .request(
            "GET",
            "/slow",
            &RequestOptions::new().with_cancellation(token),
        )
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_connection_refused() {
    let client = OpenAIClient::builder()
        .api_key(API_KEY)
        .base_url("http://127.0.0.1:9")
        .build()
        .unwrap();

    let err = client
        .request("GET", "/models", &RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, OpenAIError::Transport(_)));
}
