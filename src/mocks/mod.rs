//! Mock transport for testing the client without a network.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use url::Url;

use crate::errors::TransportError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, RequestOptions};

/// A request as the mock saw it, with the body drained.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body bytes.
    pub body: Bytes,
}

impl RecordedRequest {
    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A canned response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
    /// Artificial latency before answering.
    pub delay: Option<Duration>,
}

impl MockResponse {
    /// A 200 response carrying `value` as JSON.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        Self {
            status: 200,
            body: serde_json::to_vec(value).unwrap_or_default().into(),
            delay: None,
        }
    }

    /// A response carrying the API error envelope.
    pub fn error(status: u16, message: &str) -> Self {
        let error = serde_json::json!({
            "error": {
                "message": message,
                "type": "invalid_request_error"
            }
        });

        Self {
            status,
            body: serde_json::to_vec(&error).unwrap_or_default().into(),
            delay: None,
        }
    }

    /// A response with an arbitrary raw body.
    pub fn raw(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
        }
    }

    /// Overrides the status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Delays the response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Records every request and answers from a queue.
///
/// An empty queue answers 500 with an error envelope.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<MockResponse, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    /// Creates a mock with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn queue(&self, response: MockResponse) {
        lock(&self.responses).push_back(Ok(response));
    }

    /// Queues a JSON response.
    pub fn queue_json<T: serde::Serialize>(&self, value: &T) {
        self.queue(MockResponse::json(value));
    }

    /// Queues an error envelope response.
    pub fn queue_error(&self, status: u16, message: &str) {
        self.queue(MockResponse::error(status, message));
    }

    /// Queues a network-level failure.
    pub fn queue_failure(&self, error: TransportError) {
        lock(&self.responses).push_back(Err(error));
    }

    /// All recorded requests, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    fn next_response(&self) -> Result<MockResponse, TransportError> {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Ok(MockResponse::error(500, "No mock response configured")))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(
        &self,
        request: HttpRequest,
        options: &RequestOptions,
    ) -> Result<HttpResponse, TransportError> {
        let body = request
            .body
            .collect()
            .await
            .map_err(|e| TransportError::Body {
                message: e.to_string(),
            })?;

        lock(&self.requests).push(RecordedRequest {
            method: request.method,
            url: request.url,
            headers: request.headers,
            body,
        });

        let response = self.next_response()?;

        if let Some(delay) = response.delay {
            let sleep = tokio::time::sleep(delay);
            match &options.cancellation {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(TransportError::Cancelled),
                        _ = sleep => {}
                    }
                }
                None => sleep.await,
            }
        } else if options
            .cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
        {
            return Err(TransportError::Cancelled);
        }

        Ok(HttpResponse {
            status: response.status,
            headers: HeaderMap::new(),
            body: response.body,
        })
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("queued", &lock(&self.responses).len())
            .field("requests", &lock(&self.requests).len())
            .finish()
    }
}
