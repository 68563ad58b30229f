use bytes::Bytes;

use crate::errors::{ErrorMapper, OpenAIResult};
use crate::transport::HttpResponse;

/// Classifies buffered responses.
pub struct ResponseHandler;

impl ResponseHandler {
    /// Returns the body of a 2xx response, or the API error for anything else.
    pub fn handle(response: HttpResponse) -> OpenAIResult<Bytes> {
        if Self::is_success(response.status) {
            return Ok(response.body);
        }

        let error = ErrorMapper::from_response(response.status, &response.body);
        tracing::warn!(status = response.status, error = %error, "API request failed");
        Err(error)
    }

    /// Success is the half-open range [200, 300).
    pub fn is_success(status: u16) -> bool {
        (200..300).contains(&status)
    }
}
