//! Error types for the OpenAI transport.
//!
//! Every failure is terminal: nothing in this crate retries. Each variant names the
//! pipeline stage that failed so callers can tell a missing upload file apart from a
//! rejected request or a dropped connection.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

mod mapping;

pub use mapping::{ApiErrorDetail, ApiErrorResponse, ErrorMapper, UNKNOWN_API_ERROR};

/// Result type alias for transport operations.
pub type OpenAIResult<T> = Result<T, OpenAIError>;

/// Error type for every client operation.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// The local upload file could not be opened or read.
    #[error("failed to open file {path:?}: {source}")]
    FileAccess {
        /// Path supplied by the caller.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The JSON array input could not be converted to JSONL.
    #[error("failed to convert json to jsonl: {message}")]
    Conversion {
        /// Description of the malformed input.
        message: String,
    },

    /// A request body (multipart or JSON) could not be assembled.
    #[error("failed to encode request body: {message}")]
    Encoding {
        /// Description of the failing write.
        message: String,
    },

    /// The method, URL or headers do not form a valid request.
    #[error("failed to build request: {message}")]
    RequestConstruction {
        /// Description of the invalid component.
        message: String,
    },

    /// Network-level failure, including timeouts and cancellation.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] TransportError),

    /// The API answered with a non-2xx status.
    #[error("unexpected status {status} ({message})")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the API error envelope, or a generic fallback.
        message: String,
    },

    /// An upload purpose code is not one the API recognizes.
    #[error("invalid purpose value for OpenAI API request: {code:?}")]
    InvalidPurpose {
        /// The rejected code.
        code: String,
    },

    /// The client configuration is missing or invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration issue.
        message: String,
    },
}

impl OpenAIError {
    /// Creates a conversion error.
    pub fn conversion(message: impl Into<String>) -> Self {
        OpenAIError::Conversion {
            message: message.into(),
        }
    }

    /// Creates an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        OpenAIError::Encoding {
            message: message.into(),
        }
    }

    /// Creates a request construction error.
    pub fn request_construction(message: impl Into<String>) -> Self {
        OpenAIError::RequestConstruction {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        OpenAIError::Configuration {
            message: message.into(),
        }
    }

    /// Returns the HTTP status for API errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            OpenAIError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the call was aborted through its cancellation token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OpenAIError::Transport(TransportError::Cancelled))
    }
}

/// Network-level failures raised by the HTTP transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established (DNS, refused, TLS handshake).
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// The request exceeded its deadline.
    #[error("Timeout after {timeout:?}")]
    Timeout {
        /// Deadline that elapsed.
        timeout: Duration,
    },

    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,

    /// The response body could not be read to completion.
    #[error("failed to read response body: {message}")]
    Body {
        /// Error message.
        message: String,
    },

    /// Any other failure while sending.
    #[error("Request error: {message}")]
    Request {
        /// Error message.
        message: String,
    },
}

impl From<url::ParseError> for OpenAIError {
    fn from(err: url::ParseError) -> Self {
        OpenAIError::RequestConstruction {
            message: format!("Invalid URL: {}", err),
        }
    }
}
