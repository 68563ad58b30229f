//! Configuration for the OpenAI transport.
//!
//! The client only ever reads three values from its configuration: the base URL, the
//! API key and the request timeout. They are exposed through [`ConfigProvider`] so the
//! client can be handed any read-only source; [`OpenAIConfig`] is the stock one.

use secrecy::{ExposeSecret, SecretString};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::errors::{OpenAIError, OpenAIResult};

/// Default base URL for the OpenAI API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default request timeout (60 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Read-only configuration capability consumed by the client.
pub trait ConfigProvider: Send + Sync {
    /// Base URL that request paths are joined onto.
    fn base_url(&self) -> &str;

    /// API key sent as a bearer token.
    fn api_key(&self) -> &str;

    /// Timeout applied to every request.
    fn timeout(&self) -> Duration;
}

/// Where configuration values are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigSource {
    /// Process environment (`OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_TIMEOUT`).
    #[default]
    Env,
}

impl FromStr for ConfigSource {
    type Err = OpenAIError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "env" => Ok(ConfigSource::Env),
            other => Err(OpenAIError::configuration(format!(
                "unsupported configuration source: {:?}",
                other
            ))),
        }
    }
}

/// Configuration for the OpenAI client.
#[derive(Clone)]
pub struct OpenAIConfig {
    api_key: SecretString,
    /// Base URL for API requests, without a trailing slash.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl OpenAIConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> OpenAIConfigBuilder {
        OpenAIConfigBuilder::new()
    }

    /// Loads the configuration from the given source.
    pub fn load(source: ConfigSource) -> OpenAIResult<Self> {
        match source {
            ConfigSource::Env => Self::from_env(),
        }
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENAI_API_KEY` (required): API key for authentication
    /// - `OPENAI_BASE_URL` (optional): Custom base URL
    /// - `OPENAI_TIMEOUT` (optional): Request timeout in seconds
    pub fn from_env() -> OpenAIResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            OpenAIError::configuration("OPENAI_API_KEY environment variable not set")
        })?;

        let mut builder = OpenAIConfigBuilder::new().api_key(api_key);

        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            builder = builder.base_url(base_url);
        }

        if let Ok(timeout_str) = std::env::var("OPENAI_TIMEOUT") {
            let secs = timeout_str.parse::<u64>().map_err(|_| {
                OpenAIError::configuration(format!(
                    "OPENAI_TIMEOUT must be a whole number of seconds, got {:?}",
                    timeout_str
                ))
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Returns the API key hint (last 4 characters) for debugging.
    pub fn api_key_hint(&self) -> String {
        crate::auth::key_hint(self.api_key.expose_secret())
    }
}

impl ConfigProvider for OpenAIConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Builder for [`OpenAIConfig`].
#[derive(Default)]
pub struct OpenAIConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl OpenAIConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Overrides the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> OpenAIResult<OpenAIConfig> {
        let api_key = self
            .api_key
            .ok_or_else(|| OpenAIError::configuration("API key is required"))?;

        if api_key.is_empty() {
            return Err(OpenAIError::configuration("API key cannot be empty"));
        }

        if !api_key.starts_with("sk-") {
            tracing::warn!("API key does not match expected OpenAI format (sk-*)");
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let parsed = Url::parse(&base_url).map_err(|e| {
            OpenAIError::configuration(format!("Invalid base URL {:?}: {}", base_url, e))
        })?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(OpenAIError::configuration(format!(
                "Base URL must use http or https, got {:?}",
                parsed.scheme()
            )));
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(OpenAIError::configuration("Timeout must be greater than 0"));
        }

        Ok(OpenAIConfig {
            api_key: SecretString::new(api_key),
            base_url,
            timeout,
            user_agent: self.user_agent.unwrap_or_else(default_user_agent),
        })
    }
}

pub(crate) fn default_user_agent() -> String {
    format!("openai-transport/{}", env!("CARGO_PKG_VERSION"))
}
