//! Authentication for outgoing requests.
//!
//! The API uses bearer-token authentication; the key stays wrapped in a
//! [`SecretString`] until the header is written.

use http::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use crate::errors::{OpenAIError, OpenAIResult};

/// Authentication provider trait.
pub trait AuthProvider: Send + Sync {
    /// Apply authentication to request headers.
    fn apply_auth(&self, headers: &mut HeaderMap) -> OpenAIResult<()>;

    /// Get the authentication scheme name.
    fn scheme(&self) -> &str;
}

/// Bearer token authentication with an API key.
pub struct BearerAuth {
    api_key: SecretString,
}

impl BearerAuth {
    /// Creates a new bearer authentication provider.
    pub fn new(api_key: SecretString) -> Self {
        Self { api_key }
    }

    /// Creates from a string API key.
    pub fn from_string(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
        }
    }

    /// Gets a hint of the API key for debugging (last 4 characters).
    pub fn key_hint(&self) -> String {
        key_hint(self.api_key.expose_secret())
    }
}

/// Last four characters of `key`, or `****` for keys of four characters or fewer.
pub(crate) fn key_hint(key: &str) -> String {
    let mut tail: Vec<char> = key.chars().rev().take(5).collect();
    if tail.len() <= 4 {
        return "****".to_string();
    }
    tail.truncate(4);
    format!("...{}", tail.into_iter().rev().collect::<String>())
}

impl AuthProvider for BearerAuth {
    fn apply_auth(&self, headers: &mut HeaderMap) -> OpenAIResult<()> {
        let mut value =
            HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))
                .map_err(|_| {
                    OpenAIError::request_construction(
                        "API key contains characters not allowed in a header",
                    )
                })?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    fn scheme(&self) -> &str {
        "Bearer"
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("api_key", &"[REDACTED]")
            .field("key_hint", &self.key_hint())
            .finish()
    }
}
