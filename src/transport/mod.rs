//! HTTP transport layer.
//!
//! Requests flow through three pieces: [`RequestBuilder`] turns a method, path and
//! [`RequestBody`] into an authenticated [`HttpRequest`], an [`HttpTransport`] executes
//! it, and [`ResponseHandler`] classifies the buffered [`HttpResponse`].

mod http_transport;
mod multipart;
mod request_builder;
mod response;

pub use http_transport::{HttpTransport, ReqwestTransport};
pub use multipart::{MultipartBody, MultipartEncoder, MultipartWriter, FILE_FIELD};
pub use request_builder::{join_url, RequestBuilder};
pub use response::ResponseHandler;

#[cfg(test)]
pub(crate) use multipart::decode;

use bytes::{Bytes, BytesMut};
use futures::{Stream, TryStreamExt};
use http::{HeaderMap, Method};
use std::pin::Pin;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::errors::OpenAIResult;

/// Content type of JSON request bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Forward-only stream of body bytes.
pub type ByteStream = Pin<Box<dyn Stream<Item = OpenAIResult<Bytes>> + Send + Sync>>;

/// The body of an outgoing request. Exactly one shape is active per call.
pub enum RequestBody {
    /// No body.
    Empty,
    /// Raw bytes streamed as-is.
    Raw(ByteStream),
    /// An encoded JSON document.
    Json(Bytes),
    /// A finalized multipart form.
    Multipart(MultipartBody),
}

impl RequestBody {
    /// Wraps in-memory bytes as a raw body.
    pub fn raw_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        RequestBody::Raw(Box::pin(futures::stream::once(async move { Ok(bytes) })))
    }

    /// Content type implied by the body shape, if any.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            RequestBody::Empty | RequestBody::Raw(_) => None,
            RequestBody::Json(_) => Some(JSON_CONTENT_TYPE),
            RequestBody::Multipart(form) => Some(form.content_type()),
        }
    }

    /// Drains the body into memory.
    pub async fn collect(self) -> OpenAIResult<Bytes> {
        match self {
            RequestBody::Empty => Ok(Bytes::new()),
            RequestBody::Json(bytes) => Ok(bytes),
            RequestBody::Multipart(form) => Ok(form.into_bytes()),
            RequestBody::Raw(stream) => {
                let buf = stream
                    .try_fold(BytesMut::new(), |mut buf, chunk| async move {
                        buf.extend_from_slice(&chunk);
                        Ok(buf)
                    })
                    .await?;
                Ok(buf.freeze())
            }
        }
    }
}

impl std::fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Raw(_) => f.write_str("Raw(<stream>)"),
            RequestBody::Json(bytes) => f.debug_tuple("Json").field(&bytes.len()).finish(),
            RequestBody::Multipart(form) => f.debug_tuple("Multipart").field(form).finish(),
        }
    }
}

/// A fully built request, ready to be sent.
#[derive(Debug)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers, including authorization.
    pub headers: HeaderMap,
    /// Request body.
    pub body: RequestBody,
}

/// A response with its body read to completion.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Returns true if the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        ResponseHandler::is_success(self.status)
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Deadline for this call, overriding the client timeout.
    pub timeout: Option<Duration>,
    /// Token that aborts the in-flight request when cancelled.
    pub cancellation: Option<CancellationToken>,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attaches a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}
