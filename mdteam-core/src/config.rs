//! Configuration system for mdteam.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/mdteam/config.toml` and/or `.mdteam/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::gateway::GatewayConfig;
use crate::router::DEFAULT_MEDICAL_KEYWORDS;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MdTeamConfig {
    pub llm: LlmConfig,
    pub chat: ChatConfig,
    pub store: StoreConfig,
    pub gateway: GatewayConfig,
    pub router: RouterConfig,
}

impl MdTeamConfig {
    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Configuration for the LLM backend used by every role and by general chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider label, informational ("openrouter", "openai", "local").
    pub provider: String,
    /// Model identifier (e.g., "deepseek/deepseek-r1").
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Inline API key; takes precedence over `api_key_env` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Optional base URL override for the API endpoint.
    pub base_url: Option<String>,
    /// Maximum tokens to generate in a response.
    pub max_tokens: usize,
    /// Default temperature for generation.
    pub temperature: f32,
    /// Transport-level timeout for a single completion call (0 = none).
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openrouter".to_string(),
            model: "deepseek/deepseek-r1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            api_key: None,
            base_url: Some("https://openrouter.ai/api/v1".to_string()),
            max_tokens: 2048,
            temperature: 0.3,
            request_timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Validate this LLM config and return any warnings.
    ///
    /// Returns an empty Vec if the config is valid. Does not error.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.model.trim().is_empty() {
            warnings.push("llm.model is empty; every completion will be rejected".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            warnings.push(format!(
                "temperature ({}) is outside the usual 0.0-2.0 range",
                self.temperature
            ));
        }
        if self.max_tokens == 0 {
            warnings.push("max_tokens is 0; responses will be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            warnings.push(
                "request_timeout_secs is 0; a hung backend call blocks the query indefinitely"
                    .to_string(),
            );
        }
        warnings
    }
}

/// Configuration for the general (non-medical) chat path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Model override for general replies; falls back to `llm.model`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// System prompt prepended to every replayed transcript.
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: None,
            system_prompt: concat!(
                "You are a highly intelligent and helpful assistant. ",
                "Always answer clearly, concisely, and in well-structured language."
            )
            .to_string(),
        }
    }
}

/// Configuration for the transcript database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database. Relative paths resolve against the workspace.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("chat_history.db"),
        }
    }
}

impl StoreConfig {
    /// Resolve the database path against a workspace directory.
    pub fn resolve(&self, workspace: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            workspace.join(&self.path)
        }
    }
}

/// Keywords that route a message to the reasoning pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub keywords: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_MEDICAL_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `MDTEAM_`)
/// 3. Workspace-local config (`.mdteam/config.toml`)
/// 4. User config (`~/.config/mdteam/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&MdTeamConfig>,
) -> Result<MdTeamConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(MdTeamConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "mdteam", "mdteam") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".mdteam").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // MDTEAM_LLM__MODEL, MDTEAM_GATEWAY__PORT, ...
    figment = figment.merge(Env::prefixed("MDTEAM_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    Ok(figment.extract()?)
}
