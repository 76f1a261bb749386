//! CLI parser and config loading.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use llm_client::EnvLlmConfig;

#[derive(Parser)]
#[command(name = "cbot")]
#[command(about = "Campus navigation chatbot CLI", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one message and print the reply (config from env).
    Ask {
        #[arg(short, long)]
        token: String,
        /// The question to ask.
        message: String,
        /// Session number the message belongs to.
        #[arg(short, long, default_value = "0")]
        session: i64,
    },
    /// List the user's past sessions, earliest first.
    Sessions {
        #[arg(short, long)]
        token: String,
    },
    /// Delete one session; later sessions are renumbered down.
    DeleteSession {
        #[arg(short, long)]
        token: String,
        /// Full session id, e.g. `새로운 세션_002`.
        session_id: String,
    },
}

/// Runtime configuration loaded from environment variables.
pub struct AppConfig {
    pub database_url: String,
    pub log_file_path: String,
    /// `token:uid` comma list accepted by the identity verifier.
    pub auth_tokens: String,
    /// Directory of prompt template files; embedded copies when unset.
    pub prompts_dir: Option<String>,
    pub llm: EnvLlmConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./cbot.db".to_string());
        let log_file_path = std::env::var("LOG_FILE_PATH")
            .unwrap_or_else(|_| "./logs/cbot.log".to_string());
        let auth_tokens = std::env::var("AUTH_TOKENS")
            .context("AUTH_TOKENS not set (expected `token:uid,...`)")?;
        let prompts_dir = std::env::var("PROMPTS_DIR").ok();
        let llm = EnvLlmConfig::from_env()?;
        Ok(Self {
            database_url,
            log_file_path,
            auth_tokens,
            prompts_dir,
            llm,
        })
    }
}
