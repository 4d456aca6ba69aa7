//! LLM provider implementations.
//!
//! Everything speaks the OpenAI chat-completions protocol; the `"mock"`
//! provider label yields the scripted [`MockLlmProvider`] for offline runs.
//!
//! Use `create_provider()` to instantiate the provider named in the config.

pub mod openai_compat;

use crate::brain::{LlmProvider, MockLlmProvider};
use crate::config::LlmConfig;
use crate::error::LlmError;
use std::sync::Arc;
use tracing::info;

pub use openai_compat::OpenAiCompatibleProvider;

/// Create an LLM provider based on the configuration.
///
/// - `"mock"` → `MockLlmProvider` (no network, placeholder answers)
/// - everything else → `OpenAiCompatibleProvider` (OpenRouter, OpenAI, Ollama, ...)
///
/// Returns an error if the provider cannot be initialized, usually because
/// the API key is missing.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    for warning in config.validate() {
        tracing::warn!(%warning, "LLM configuration");
    }

    let provider: Arc<dyn LlmProvider> = match config.provider.as_str() {
        "mock" => Arc::new(MockLlmProvider::new()),
        _ => Arc::new(OpenAiCompatibleProvider::new(config)?),
    };
    info!(
        provider = %config.provider,
        model = %provider.model_name(),
        "LLM provider initialized"
    );
    Ok(provider)
}
