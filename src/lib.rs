//! OpenAI API transport.
//!
//! A small async client that sends authenticated requests to the OpenAI REST API
//! and hands back raw response bytes. Higher-level services decode those bytes
//! into their own types.
//!
//! # Features
//!
//! - **Four request shapes**: no body, raw byte stream, JSON, and multipart file upload
//! - **JSONL conversion**: `.json` arrays uploaded for fine-tuning are streamed out
//!   as one object per line
//! - **Normalized errors**: each failure names the stage that failed, and non-2xx
//!   responses carry the API's own error message
//! - **Cancellation**: every call takes a [`tokio_util::sync::CancellationToken`]
//!   and an optional per-call timeout
//! - **Observability**: `tracing` spans on every call
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use openai_transport::{OpenAIClient, RequestOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenAIClient::from_env()?;
//!
//!     let body = client
//!         .request_json(
//!             "POST",
//!             "/fine_tuning/jobs",
//!             &json!({"model": "gpt-3.5-turbo", "training_file": "file-abc123"}),
//!             &RequestOptions::new(),
//!         )
//!         .await?;
//!     println!("{}", String::from_utf8_lossy(&body));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod jsonl;
pub mod observability;
pub mod purpose;
pub mod transport;

// Re-exports for convenience
pub use client::{OpenAIClient, OpenAIClientBuilder};
pub use config::{ConfigProvider, ConfigSource, OpenAIConfig};
pub use errors::{OpenAIError, OpenAIResult, TransportError};
pub use purpose::UploadPurpose;
pub use transport::{ByteStream, RequestOptions};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
