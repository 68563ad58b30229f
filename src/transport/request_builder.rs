use http::header::{HeaderValue, CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, Method};
use std::sync::Arc;
use url::Url;

use crate::auth::AuthProvider;
use crate::config::ConfigProvider;
use crate::errors::{OpenAIError, OpenAIResult};
use crate::transport::{HttpRequest, RequestBody};

/// Builds authenticated requests against the configured base URL.
pub struct RequestBuilder {
    config: Arc<dyn ConfigProvider>,
    auth: Arc<dyn AuthProvider>,
    default_headers: HeaderMap,
}

impl RequestBuilder {
    /// Creates a builder reading the base URL from `config` and signing with `auth`.
    pub fn new(config: Arc<dyn ConfigProvider>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            config,
            auth,
            default_headers: HeaderMap::new(),
        }
    }

    /// Sets the user agent sent with every request.
    pub fn with_user_agent(mut self, user_agent: &str) -> OpenAIResult<Self> {
        let value = HeaderValue::from_str(user_agent).map_err(|e| {
            OpenAIError::request_construction(format!("invalid user agent: {}", e))
        })?;
        self.default_headers.insert(USER_AGENT, value);
        Ok(self)
    }

    /// Builds a request. Nothing is sent.
    pub fn build(&self, method: &str, path: &str, body: RequestBody) -> OpenAIResult<HttpRequest> {
        let method = Method::from_bytes(method.as_bytes()).map_err(|_| {
            OpenAIError::request_construction(format!("invalid HTTP method {:?}", method))
        })?;

        let url = Url::parse(&join_url(self.config.base_url(), path))?;

        let mut headers = self.default_headers.clone();
        self.auth.apply_auth(&mut headers)?;

        if let Some(content_type) = body.content_type() {
            let value = HeaderValue::from_str(content_type).map_err(|e| {
                OpenAIError::request_construction(format!("invalid content type: {}", e))
            })?;
            headers.insert(CONTENT_TYPE, value);
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }
}

/// Joins a path onto a base URL with exactly one separating slash.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("base_url", &self.config.base_url())
            .field("scheme", &self.auth.scheme())
            .finish()
    }
}
