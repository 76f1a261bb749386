//! cbot CLI: ask a question, list sessions, delete a session. Config
//! from env and optional CLI args.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use cbot_cli::{AppConfig, Cli, Commands};
use cbot_core::{init_tracing, ChatRequest};
use conversation::{
    ConversationController, KeywordResolver, MatcherConfig, StaticTokenVerifier,
};
use llm_client::{LlmConfig, OpenAILlmClient};
use prompt::{BuiltinTemplates, FsTemplateSource, TemplateSource};
use storage::{CatalogRepository, SqlitePoolManager, TurnLogRepository};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    init_tracing(&config.log_file_path)?;

    let controller = build_controller(&config).await?;

    match cli.command {
        Commands::Ask {
            token,
            message,
            session,
        } => {
            let request = ChatRequest {
                id_token: token,
                message,
                current_session_idx: session,
            };
            let reply = controller
                .chat(&request)
                .await
                .map_err(|e| anyhow::anyhow!("{} (status {})", e, e.status_code()))?;
            println!("[{}]", reply.session_title);
            println!("{}", reply.message);
        }
        Commands::Sessions { token } => {
            let sessions = controller
                .list_sessions(&token)
                .await
                .map_err(|e| anyhow::anyhow!("{} (status {})", e, e.status_code()))?;
            if sessions.is_empty() {
                println!("No sessions.");
                return Ok(());
            }
            for s in &sessions {
                let created = s
                    .created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{} ({} turn(s), created {})", s.session_name, s.logs.len(), created);
            }
        }
        Commands::DeleteSession { token, session_id } => {
            let outcome = controller
                .delete_session(&token, &session_id)
                .await
                .map_err(|e| anyhow::anyhow!("{} (status {})", e, e.status_code()))?;
            println!("{}", outcome.message);
            if let Some(from) = outcome.renumbered_from {
                println!("Sessions from number {} were renumbered down.", from);
            }
        }
    }

    Ok(())
}

/// Builds every collaborator once and wires the controller.
async fn build_controller(config: &AppConfig) -> Result<ConversationController> {
    let pool = SqlitePoolManager::new(&config.database_url)
        .await
        .context("Open SQLite database (check DATABASE_URL)")?;
    let catalog = CatalogRepository::with_pool(pool.clone()).await?;
    let turn_log = TurnLogRepository::with_pool(pool).await?;

    let llm = OpenAILlmClient::with_base_url(
        config.llm.api_key().to_string(),
        config.llm.base_url().to_string(),
    )
    .with_model(config.llm.model().to_string());

    let templates: Arc<dyn TemplateSource> = match &config.prompts_dir {
        Some(dir) => Arc::new(FsTemplateSource::new(dir)),
        None => Arc::new(BuiltinTemplates),
    };

    Ok(ConversationController::new(
        catalog,
        turn_log,
        Arc::new(llm),
        templates,
        Arc::new(StaticTokenVerifier::from_token_list(&config.auth_tokens)),
        KeywordResolver::new(MatcherConfig::default()),
    ))
}
