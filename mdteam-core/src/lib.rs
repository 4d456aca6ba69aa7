//! # mdteam Core
//!
//! Core library for mdteam, a chat backend that answers medical questions
//! with a simulated multidisciplinary team.
//! Provides the role registry, task templates, the complexity-gated reasoning
//! pipeline, the LLM interface (brain), keyword routing, the transcript store,
//! the chat service, the HTTP gateway, configuration and fundamental types.

pub mod brain;
pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod providers;
pub mod roles;
pub mod router;
pub mod tasks;
pub mod transcript;
pub mod types;

// Re-export commonly used types at the crate root.
pub use brain::{LlmProvider, MockLlmProvider};
pub use chat::{ChatReply, ChatService, render_medical_reply};
pub use config::{ChatConfig, LlmConfig, MdTeamConfig, load_config};
pub use error::{ChatError, ConfigError, LlmError, StoreError};
pub use gateway::{AppState, GatewayConfig};
pub use pipeline::{
    BackendOutput, ComplexityTier, MedicalTeam, PipelineResult, ProviderBackend,
    ReasoningBackend,
};
pub use providers::create_provider;
pub use roles::{RoleId, RoleRegistry, TeamRole, get_roles};
pub use router::QueryRouter;
pub use tasks::{ReasoningRequest, TaskKind, TaskPlan, build_requests};
pub use transcript::{ChatSummary, TranscriptEntry, TranscriptStore};
pub use types::{CompletionRequest, CompletionResponse, Content, Message, Role, TokenUsage};
