use serde::Deserialize;

use crate::errors::OpenAIError;

/// Message used when a failure response carries no usable error envelope.
pub const UNKNOWN_API_ERROR: &str = "unknown API error";

/// Error envelope returned by the API on failed requests.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    /// The error details.
    pub error: ApiErrorDetail,
}

/// Detailed API error information.
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// The error type.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// The error code.
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    /// The parameter that caused the error.
    #[serde(default)]
    pub param: Option<String>,
}

/// Maps failed responses onto [`OpenAIError::Api`].
pub struct ErrorMapper;

impl ErrorMapper {
    /// Builds the error for a non-2xx response body.
    pub fn from_response(status: u16, body: &[u8]) -> OpenAIError {
        OpenAIError::Api {
            status,
            message: Self::extract_message(body),
        }
    }

    /// Extracts the envelope message, falling back to [`UNKNOWN_API_ERROR`].
    pub fn extract_message(body: &[u8]) -> String {
        Self::parse_error_response(body)
            .map(|r| r.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNKNOWN_API_ERROR.to_string())
    }

    /// Parses the error envelope, if the body holds one.
    pub fn parse_error_response(body: &[u8]) -> Option<ApiErrorResponse> {
        serde_json::from_slice(body).ok()
    }
}
