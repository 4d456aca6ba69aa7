//! Subcommand handlers.

use crate::repl;
use crate::{Commands, ConfigAction};
use mdteam_core::chat::{MEDICAL_DISCLAIMER, QUOTA_EXHAUSTED_REPLY};
use mdteam_core::gateway::{AppState, run_gateway};
use mdteam_core::{
    ChatService, LlmConfig, LlmProvider, MdTeamConfig, MedicalTeam, PipelineResult,
    ProviderBackend, QueryRouter, TranscriptStore, create_provider, get_roles,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    model: Option<&str>,
) -> anyhow::Result<()> {
    match command {
        Commands::Config { action } => handle_config(action, workspace),
        Commands::Serve { host, port } => {
            let mut config = load(workspace, model)?;
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            serve(config, workspace).await
        }
        Commands::Chat { chat_id } => {
            let config = load(workspace, model)?;
            let service = build_service(&config, workspace)?.with_router(QueryRouter::minimal());
            repl::run_interactive(&service, &chat_id).await
        }
        Commands::Ask { query } => {
            let config = load(workspace, model)?;
            ask(&config, &query).await
        }
        Commands::History { chat_id, json } => {
            let config = load(workspace, model)?;
            let store = open_store(&config, workspace)?;
            let history = store.history(&chat_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else if history.is_empty() {
                println!("No messages for chat '{}'.", chat_id);
            } else {
                for entry in &history {
                    println!("[{}] {}: {}", entry.timestamp, entry.role, entry.message);
                }
            }
            Ok(())
        }
        Commands::Clear { chat_id } => {
            let config = load(workspace, model)?;
            let store = open_store(&config, workspace)?;
            let removed = store.delete(&chat_id).await?;
            println!("Deleted {} message(s) from chat '{}'.", removed, chat_id);
            Ok(())
        }
    }
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".mdteam");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&MdTeamConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = mdteam_core::load_config(Some(workspace), None)?;
            println!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

/// Load layered configuration and apply the `--model` override.
fn load(workspace: &Path, model: Option<&str>) -> anyhow::Result<MdTeamConfig> {
    let mut config = mdteam_core::load_config(Some(workspace), None)?;
    if let Some(model) = model {
        config.llm.model = model.to_string();
    }
    Ok(config)
}

fn open_store(config: &MdTeamConfig, workspace: &Path) -> anyhow::Result<TranscriptStore> {
    Ok(TranscriptStore::open(&config.store.resolve(workspace))?)
}

fn build_service(config: &MdTeamConfig, workspace: &Path) -> anyhow::Result<ChatService> {
    let provider = create_provider(&config.llm)?;
    let store = open_store(config, workspace)?;
    Ok(ChatService::from_config(config, provider, store))
}

async fn serve(config: MdTeamConfig, workspace: &Path) -> anyhow::Result<()> {
    let service = build_service(&config, workspace)?;
    let state = AppState::new(service);
    println!(
        "mdteam gateway listening on http://{}",
        config.gateway.bind_addr()
    );

    tokio::select! {
        result = run_gateway(&config.gateway, state) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
    }
    Ok(())
}

async fn ask(config: &MdTeamConfig, query: &str) -> anyhow::Result<()> {
    let query = query.trim();
    if query.is_empty() {
        anyhow::bail!("Query cannot be empty.");
    }

    let provider = create_provider(&config.llm)?;
    ask_with(provider, &config.llm, query).await
}

/// Run the team once on `provider`. Usage-limit refusals print the notice
/// and still fail the command.
async fn ask_with(
    provider: Arc<dyn LlmProvider>,
    llm: &LlmConfig,
    query: &str,
) -> anyhow::Result<()> {
    let backend = ProviderBackend::new(provider, llm);
    let team = MedicalTeam::new(Arc::new(get_roles()), Arc::new(backend));

    match team.run(query).await {
        Ok(result) => {
            println!("{}", format_ask_output(&result));
            Ok(())
        }
        Err(e) if e.is_quota_exhausted() => {
            eprintln!("{}", QUOTA_EXHAUSTED_REPLY);
            Err(e.into())
        }
        Err(e) => Err(anyhow::anyhow!("Medical team query failed: {}", e)),
    }
}

/// Terminal rendering of a single team run, summaries numbered.
fn format_ask_output(result: &PipelineResult) -> String {
    let mut out = format!("Complexity: {}\n\nReasoning:\n", result.complexity);
    if result.reasoning.is_empty() {
        out.push_str("(none)\n");
    }
    for (i, summary) in result.reasoning.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, summary));
    }
    out.push_str(&format!(
        "\nFinal Opinion:\n{}\n\n{}",
        result.final_text, MEDICAL_DISCLAIMER
    ));
    out
}
