//! # LLM client abstraction
//!
//! Defines the [`LlmClient`] trait and an OpenAI implementation over
//! [async-openai]. The engine treats the completion model as a black box:
//! one system prompt and one user message in, reply text out.

use anyhow::Result;
use async_trait::async_trait;

mod config;
mod openai_llm;

pub use config::{EnvLlmConfig, LlmConfig};
pub use openai_llm::OpenAILlmClient;

/// Completion model interface: `(system prompt, user message) -> reply text`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String>;
}

/// Masks an API key/token for safe logging: shows first 7 chars + "***" + last 4 chars.
/// If length <= 11, returns "***" to avoid leaking any part of the key.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 {
        "***".to_string()
    } else {
        let head_len = 7.min(len);
        let tail_len = 4.min(len.saturating_sub(head_len));
        let head = &token[..head_len];
        let tail = if tail_len > 0 {
            &token[len - tail_len..]
        } else {
            ""
        };
        format!("{}***{}", head, tail)
    }
}
