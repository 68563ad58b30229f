//! Integration tests using WireMock
//!
//! These drive the real reqwest transport against a local mock server, covering
//! authentication, every body shape, upload conversion and error mapping.

mod requests;
mod uploads;

use openai_transport::{OpenAIClient, OpenAIResult};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub const API_KEY: &str = "sk-test-api-key";

/// Starts a fresh mock server.
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at `server` with a short timeout.
pub fn client_for(server: &MockServer) -> OpenAIResult<OpenAIClient> {
    OpenAIClient::builder()
        .api_key(API_KEY)
        .base_url(server.uri())
        .timeout(Duration::from_secs(5))
        .build()
}

/// Mock matching an authenticated request.
pub fn mock_with_auth(path_matcher: &str, method_matcher: &str) -> MockBuilder {
    Mock::given(method(method_matcher))
        .and(path(path_matcher))
        .and(header("Authorization", format!("Bearer {}", API_KEY).as_str()))
}

/// Error envelope response.
pub fn error_response(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(serde_json::json!({
        "error": {
            "message": message,
            "type": "invalid_request_error",
            "param": null,
            "code": null
        }
    }))
}

/// One part of a received multipart body.
#[derive(Debug)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub data: String,
}

/// Splits a received multipart body using the boundary from its content type.
pub fn parse_multipart(content_type: &str, body: &[u8]) -> Vec<Part> {
    let boundary = content_type
        .split("boundary=")
        .nth(1)
        .expect("content type has no boundary");
    let text = String::from_utf8_lossy(body).into_owned();
    let delimiter = format!("--{}", boundary);

    let mut parts = Vec::new();
    for section in text.split(delimiter.as_str()).skip(1) {
        if section.starts_with("--") {
            break;
        }
        let section = section.trim_start_matches("\r\n");
        let (head, data) = section.split_once("\r\n\r\n").expect("part without headers");
        let data = data.strip_suffix("\r\n").unwrap_or(data);

        let quoted = |key: &str| {
            let marker = format!("{}=\"", key);
            head.find(marker.as_str()).map(|start| {
                let rest = &head[start + marker.len()..];
                rest[..rest.find('"').unwrap_or(rest.len())].to_string()
            })
        };

        parts.push(Part {
            name: quoted("; name").unwrap_or_default(),
            filename: quoted("filename"),
            data: data.to_string(),
        });
    }
    parts
}
