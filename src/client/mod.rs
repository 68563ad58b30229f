//! OpenAI API client.
//!
//! [`OpenAIClient`] is the single entry point for sending requests. It owns the
//! request builder and a shared transport; every call is independent, so one client
//! can serve any number of concurrent requests.

use bytes::Bytes;
use futures::TryStreamExt;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::auth::{AuthProvider, BearerAuth};
use crate::config::{default_user_agent, ConfigProvider, OpenAIConfig, OpenAIConfigBuilder};
use crate::errors::{OpenAIError, OpenAIResult};
use crate::jsonl;
use crate::purpose::UploadPurpose;
use crate::transport::{
    ByteStream, HttpRequest, HttpTransport, MultipartEncoder, RequestBody, RequestBuilder,
    RequestOptions, ReqwestTransport, ResponseHandler, FILE_FIELD,
};

/// Upload field holding the purpose code.
pub const PURPOSE_FIELD: &str = "purpose";

/// Client for the OpenAI REST API.
///
/// # Example
///
/// ```rust,no_run
/// use openai_transport::{OpenAIClient, RequestOptions};
/// use std::collections::HashMap;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = OpenAIClient::builder()
///         .api_key("sk-your-api-key")
///         .build()?;
///
///     let models = client.request("GET", "/models", &RequestOptions::new()).await?;
///     println!("{}", String::from_utf8_lossy(&models));
///
///     let mut fields = HashMap::new();
///     fields.insert("file".to_string(), "training.json".to_string());
///     fields.insert("purpose".to_string(), "fine-tune".to_string());
///     let uploaded = client.request_upload("/files", &fields, &RequestOptions::new()).await?;
///     println!("{}", String::from_utf8_lossy(&uploaded));
///     Ok(())
/// }
/// ```
pub struct OpenAIClient {
    config: Arc<dyn ConfigProvider>,
    request_builder: RequestBuilder,
    transport: Arc<dyn HttpTransport>,
}

impl OpenAIClient {
    /// Creates a new client builder.
    pub fn builder() -> OpenAIClientBuilder {
        OpenAIClientBuilder::new()
    }

    /// Creates a client from a configuration.
    pub fn new(config: OpenAIConfig) -> OpenAIResult<Self> {
        OpenAIClientBuilder::new().config(config).build()
    }

    /// Creates a client from `OPENAI_*` environment variables.
    pub fn from_env() -> OpenAIResult<Self> {
        Self::new(OpenAIConfig::from_env()?)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &dyn ConfigProvider {
        self.config.as_ref()
    }

    /// Sends a request with no body.
    #[instrument(skip(self, options))]
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        options: &RequestOptions,
    ) -> OpenAIResult<Bytes> {
        let request = self.request_builder.build(method, path, RequestBody::Empty)?;
        self.execute(request, options).await
    }

    /// Sends `body` as-is. No content type is set.
    #[instrument(skip(self, body, options))]
    pub async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: ByteStream,
        options: &RequestOptions,
    ) -> OpenAIResult<Bytes> {
        let request = self
            .request_builder
            .build(method, path, RequestBody::Raw(body))?;
        self.execute(request, options).await
    }

    /// Serializes `body` to JSON and sends it with `Content-Type: application/json`.
    #[instrument(skip(self, body, options))]
    pub async fn request_json<T>(
        &self,
        method: &str,
        path: &str,
        body: &T,
        options: &RequestOptions,
    ) -> OpenAIResult<Bytes>
    where
        T: Serialize + ?Sized + Sync,
    {
        let encoded = serde_json::to_vec(body)
            .map_err(|e| OpenAIError::encoding(format!("failed to encode json body: {}", e)))?;

        let request = self
            .request_builder
            .build(method, path, RequestBody::Json(Bytes::from(encoded)))?;
        self.execute(request, options).await
    }

    /// Uploads a local file as `multipart/form-data` with `POST`.
    ///
    /// `fields["file"]` is the local path; its base name becomes the part's filename.
    /// Every other entry is sent as a plain form field. A `.json` file uploaded with
    /// a fine-tuning `purpose` is converted to JSONL on the way out.
    #[instrument(skip(self, fields, options))]
    pub async fn request_upload(
        &self,
        path: &str,
        fields: &HashMap<String, String>,
        options: &RequestOptions,
    ) -> OpenAIResult<Bytes> {
        let file_path = fields.get(FILE_FIELD).ok_or_else(|| {
            OpenAIError::request_construction(format!(
                "upload fields must include {:?}",
                FILE_FIELD
            ))
        })?;

        let file = tokio::fs::File::open(file_path)
            .await
            .map_err(|source| OpenAIError::FileAccess {
                path: PathBuf::from(file_path),
                source,
            })?;

        let filename = Path::new(file_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.clone());

        let purpose = fields
            .get(PURPOSE_FIELD)
            .and_then(|code| UploadPurpose::from_code(code));

        let content: ByteStream = if jsonl::should_convert(&filename, purpose) {
            tracing::debug!(filename = %filename, "converting upload to jsonl");
            Box::pin(jsonl::convert_file(file.into_std().await).await?)
        } else {
            Box::pin(ReaderStream::new(file).map_err(|e| {
                OpenAIError::encoding(format!("failed to copy file content: {}", e))
            }))
        };

        let form = MultipartEncoder::encode(content, &filename, fields).await?;
        let request = self
            .request_builder
            .build("POST", path, RequestBody::Multipart(form))?;
        self.execute(request, options).await
    }

    async fn execute(&self, request: HttpRequest, options: &RequestOptions) -> OpenAIResult<Bytes> {
        let response = self.transport.send(request, options).await?;
        ResponseHandler::handle(response)
    }
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.config.base_url())
            .field("timeout", &self.config.timeout())
            .finish()
    }
}

/// Builder for [`OpenAIClient`].
#[derive(Default)]
pub struct OpenAIClientBuilder {
    config_builder: OpenAIConfigBuilder,
    config: Option<Arc<dyn ConfigProvider>>,
    user_agent: Option<String>,
    transport: Option<Arc<dyn HttpTransport>>,
    auth: Option<Arc<dyn AuthProvider>>,
}

impl OpenAIClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a prepared configuration; overrides the individual setters below.
    pub fn config(mut self, config: OpenAIConfig) -> Self {
        if self.user_agent.is_none() {
            self.user_agent = Some(config.user_agent.clone());
        }
        self.config = Some(Arc::new(config));
        self
    }

    /// Uses a custom configuration provider.
    pub fn config_provider(mut self, config: Arc<dyn ConfigProvider>) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_key(api_key);
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(base_url);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets a custom auth provider.
    pub fn auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Builds the client.
    pub fn build(self) -> OpenAIResult<OpenAIClient> {
        let config: Arc<dyn ConfigProvider> = match self.config {
            Some(config) => config,
            None => Arc::new(self.config_builder.build()?),
        };

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(
                ReqwestTransport::new(config.timeout())
                    .map_err(|e| OpenAIError::configuration(e.to_string()))?,
            ),
        };

        let auth: Arc<dyn AuthProvider> = match self.auth {
            Some(a) => a,
            None => Arc::new(BearerAuth::from_string(config.api_key())),
        };

        let user_agent = self.user_agent.unwrap_or_else(default_user_agent);
        let request_builder =
            RequestBuilder::new(Arc::clone(&config), auth).with_user_agent(&user_agent)?;

        tracing::debug!(base_url = config.base_url(), "OpenAI client initialized");

        Ok(OpenAIClient {
            config,
            request_builder,
            transport,
        })
    }
}
