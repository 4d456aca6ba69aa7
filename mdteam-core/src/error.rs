//! Error types for the mdteam core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! for each layer that can fail.

use std::path::PathBuf;

/// Errors from LLM provider interactions.
///
/// The pipeline never catches these; they travel unchanged to whoever
/// called [`MedicalTeam::run`](crate::pipeline::MedicalTeam::run).
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Usage quota exhausted: {message}")]
    QuotaExceeded { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },
}

impl LlmError {
    /// Whether the provider refused the call because of usage limits.
    ///
    /// The chat layer renders these as a temporary-unavailability notice
    /// instead of a generic failure.
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. } | LlmError::QuotaExceeded { .. }
        )
    }
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::ParseError {
            message: err.to_string(),
        }
    }
}

/// Errors from the SQLite transcript store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open transcript database {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("Transcript query failed: {message}")]
    Query { message: String },

    #[error("Transcript task join error: {message}")]
    TaskJoin { message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Query {
            message: err.to_string(),
        }
    }
}

/// Errors surfaced by the chat layer before or around a reply.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message cannot be empty.")]
    EmptyMessage,

    #[error(transparent)]
    Store(#[from] StoreError),
}
