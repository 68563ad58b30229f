//! Observability for the OpenAI transport.
//!
//! The client emits `tracing` spans and events; this module only installs a
//! subscriber for binaries that do not bring their own.

mod logging;

pub use logging::{LogFormat, LogLevel, LoggingConfig};
