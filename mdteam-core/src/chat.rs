//! Chat layer: routes a message to the team pipeline or to a plain
//! conversational reply, and records both sides in the transcript store.
//!
//! This is the only place that catches backend failures. Quota errors become
//! a temporary-unavailability notice; anything else becomes a generic
//! apology and is logged.

use crate::brain::LlmProvider;
use crate::config::{ChatConfig, LlmConfig, MdTeamConfig};
use crate::error::ChatError;
use crate::pipeline::{MedicalTeam, PipelineResult, ProviderBackend};
use crate::roles::RoleRegistry;
use crate::router::QueryRouter;
use crate::transcript::{ChatSummary, TranscriptEntry, TranscriptStore};
use crate::types::{CompletionRequest, Content, Message, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Appended to every medical reply.
pub const MEDICAL_DISCLAIMER: &str = "⚠ Not a substitute for real medical advice.";

/// Reply used when the backend refuses a medical query for usage limits.
pub const QUOTA_EXHAUSTED_REPLY: &str = "⚠ Medical AI service is temporarily unavailable due to usage limits.\n\nPlease try again later.";

/// Reply used for any other failure on the medical path.
pub const INTERNAL_ERROR_REPLY: &str =
    "⚠ An internal error occurred while processing the medical query.";

/// What the caller gets back for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub is_medical: bool,
}

/// Render a pipeline result as the user-facing medical reply.
pub fn render_medical_reply(result: &PipelineResult) -> String {
    let reasoning = result
        .reasoning
        .iter()
        .map(|r| format!("- {r}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Medical Reasoning (Educational Only)\n\n\
         Complexity: {}\n\n\
         Reasoning:\n{}\n\n\
         Final Opinion:\n{}\n\n\
         {}",
        result.complexity, reasoning, result.final_text, MEDICAL_DISCLAIMER
    )
}

/// Message handling for one deployment; shared across requests.
pub struct ChatService {
    team: MedicalTeam,
    provider: Arc<dyn LlmProvider>,
    store: TranscriptStore,
    router: QueryRouter,
    chat: ChatConfig,
    temperature: f32,
    max_tokens: usize,
}

impl ChatService {
    pub fn new(
        team: MedicalTeam,
        provider: Arc<dyn LlmProvider>,
        store: TranscriptStore,
        router: QueryRouter,
        chat: ChatConfig,
        llm: &LlmConfig,
    ) -> Self {
        Self {
            team,
            provider,
            store,
            router,
            chat,
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
        }
    }

    /// Wire the standard team, router and chat settings from configuration.
    pub fn from_config(
        config: &MdTeamConfig,
        provider: Arc<dyn LlmProvider>,
        store: TranscriptStore,
    ) -> Self {
        let backend = ProviderBackend::new(Arc::clone(&provider), &config.llm);
        let team = MedicalTeam::new(Arc::new(RoleRegistry::standard()), Arc::new(backend));
        let router = QueryRouter::new(config.router.keywords.iter().cloned());
        Self::new(
            team,
            provider,
            store,
            router,
            config.chat.clone(),
            &config.llm,
        )
    }

    /// Replace the keyword router.
    pub fn with_router(mut self, router: QueryRouter) -> Self {
        self.router = router;
        self
    }

    /// Fresh conversation identifier.
    pub fn new_chat_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Answer one message and record both sides of the exchange.
    pub async fn handle(&self, chat_id: &str, message: &str) -> Result<ChatReply, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let is_medical = self.router.is_medical(message);
        info!(chat_id, is_medical, "Handling chat message");

        self.store.append(chat_id, Role::User, message).await?;
        let reply = if is_medical {
            self.medical_reply(message).await
        } else {
            self.general_reply(chat_id).await?
        };
        self.store.append(chat_id, Role::Assistant, &reply).await?;

        Ok(ChatReply { reply, is_medical })
    }

    async fn medical_reply(&self, query: &str) -> String {
        match self.team.run(query).await {
            Ok(result) => render_medical_reply(&result),
            Err(e) if e.is_quota_exhausted() => {
                warn!(error = %e, "Team pipeline hit usage limits");
                QUOTA_EXHAUSTED_REPLY.to_string()
            }
            Err(e) => {
                error!(error = %e, "Team pipeline failed");
                INTERNAL_ERROR_REPLY.to_string()
            }
        }
    }

    /// Replay the whole transcript (which already ends with the new user
    /// message) behind the system prompt.
    async fn general_reply(&self, chat_id: &str) -> Result<String, ChatError> {
        let history = self.store.history(chat_id).await?;

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(&self.chat.system_prompt));
        for entry in &history {
            match entry.chat_role() {
                Some(role) => messages.push(Message::new(role, Content::text(&entry.message))),
                None => warn!(role = %entry.role, "Skipping transcript entry with unknown role"),
            }
        }

        let request = CompletionRequest {
            messages,
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            model: self.chat.model.clone(),
        };

        let reply = match self.provider.complete(request).await {
            Ok(response) => response.message.content.text_parts().join("\n"),
            Err(e) => {
                warn!(error = %e, "General reply failed");
                format!("Error contacting model: {e}")
            }
        };
        Ok(reply)
    }

    pub async fn history(&self, chat_id: &str) -> Result<Vec<TranscriptEntry>, ChatError> {
        Ok(self.store.history(chat_id).await?)
    }

    pub async fn delete_history(&self, chat_id: &str) -> Result<usize, ChatError> {
        Ok(self.store.delete(chat_id).await?)
    }

    pub async fn list_chats(&self) -> Result<Vec<ChatSummary>, ChatError> {
        Ok(self.store.list_chats().await?)
    }
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("team", &self.team)
            .field("store", &self.store)
            .field("model", &self.provider.model_name())
            .finish()
    }
}
