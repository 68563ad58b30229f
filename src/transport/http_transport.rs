use async_trait::async_trait;
use reqwest::{Body, Client, ClientBuilder};
use std::time::Duration;
use tracing::instrument;

use crate::errors::TransportError;
use crate::transport::{HttpRequest, HttpResponse, RequestBody, RequestOptions};

/// HTTP transport trait.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends the request and reads the whole response body.
    ///
    /// Implementations must stop promptly once `options.cancellation` fires and
    /// report [`TransportError::Cancelled`].
    async fn send(
        &self,
        request: HttpRequest,
        options: &RequestOptions,
    ) -> Result<HttpResponse, TransportError>;
}

/// HTTP transport implementation using reqwest.
///
/// The underlying client pools connections and is shared by all concurrent calls.
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a new transport with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| TransportError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self { client, timeout })
    }

    /// Wraps an existing reqwest client.
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn map_send_error(&self, err: reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout { timeout }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else {
            TransportError::Request {
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(
        skip(self, request, options),
        fields(method = %request.method, url = %request.url)
    )]
    async fn send(
        &self,
        request: HttpRequest,
        options: &RequestOptions,
    ) -> Result<HttpResponse, TransportError> {
        let timeout = options.timeout.unwrap_or(self.timeout);

        let mut req_builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .timeout(timeout);

        req_builder = match request.body {
            RequestBody::Empty => req_builder,
            RequestBody::Raw(stream) => req_builder.body(Body::wrap_stream(stream)),
            RequestBody::Json(bytes) => req_builder.body(bytes),
            RequestBody::Multipart(form) => req_builder.body(form.into_bytes()),
        };

        let exchange = async {
            let response = req_builder
                .send()
                .await
                .map_err(|e| self.map_send_error(e, timeout))?;

            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout { timeout }
                } else {
                    TransportError::Body {
                        message: e.to_string(),
                    }
                }
            })?;

            tracing::debug!(status, body_bytes = body.len(), "received response");

            Ok::<_, TransportError>(HttpResponse {
                status,
                headers,
                body,
            })
        };

        match &options.cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!("request cancelled by caller");
                        Err(TransportError::Cancelled)
                    }
                    result = exchange => result,
                }
            }
            None => exchange.await,
        }
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("timeout", &self.timeout)
            .finish()
    }
}
