//! Reasoning backend seam: "invoke this role with this request".

use crate::brain::LlmProvider;
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::roles::TeamRole;
use crate::tasks::ReasoningRequest;
use crate::types::{CompletionRequest, Content, Message};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Raw output of one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutput {
    Text(String),
    /// Segmented output, in the order the backend produced it.
    Parts(Vec<String>),
}

impl BackendOutput {
    /// Collapse into a single trimmed string. Parts are joined by newlines,
    /// skipping empty segments.
    pub fn into_text(self) -> String {
        match self {
            BackendOutput::Text(text) => text.trim().to_string(),
            BackendOutput::Parts(parts) => parts
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<Content> for BackendOutput {
    fn from(content: Content) -> Self {
        match content {
            Content::Text { text } => BackendOutput::Text(text),
            multi @ Content::MultiPart { .. } => BackendOutput::Parts(multi.text_parts()),
        }
    }
}

/// The text-generation service invoked once per role per request.
///
/// Failures are returned unchanged; callers above the pipeline decide how to
/// present them.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    async fn invoke(
        &self,
        role: &TeamRole,
        request: &ReasoningRequest,
    ) -> Result<BackendOutput, LlmError>;
}

/// Adapts an [`LlmProvider`] into a [`ReasoningBackend`].
///
/// The role becomes the system message; the rendered prompt and its
/// expected-output contract become the user message.
pub struct ProviderBackend {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
    max_tokens: Option<usize>,
}

impl ProviderBackend {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: Some(config.max_tokens),
        }
    }

    fn completion_request(&self, role: &TeamRole, request: &ReasoningRequest) -> CompletionRequest {
        let system = Message::system(role.system_prompt())
            .with_metadata("role", serde_json::json!(role.id))
            .with_metadata("task", serde_json::json!(request.kind));
        let user = Message::user(format!(
            "{}\n\nExpected output: {}",
            request.prompt, request.expected_output
        ));
        CompletionRequest {
            messages: vec![system, user],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            model: None,
        }
    }
}

#[async_trait]
impl ReasoningBackend for ProviderBackend {
    async fn invoke(
        &self,
        role: &TeamRole,
        request: &ReasoningRequest,
    ) -> Result<BackendOutput, LlmError> {
        debug!(
            role = %role.id,
            task = %request.kind,
            model = self.provider.model_name(),
            "Invoking reasoning backend"
        );
        let response = self
            .provider
            .complete(self.completion_request(role, request))
            .await?;
        Ok(response.message.content.into())
    }
}
