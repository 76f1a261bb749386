//! OpenAI implementation of [`LlmClient`] over async-openai.

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

use super::{mask_token, LlmClient};

/// Chat-completion client for OpenAI-compatible APIs.
#[derive(Clone)]
pub struct OpenAILlmClient {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    /// Stored only for masked logging.
    api_key_for_logging: String,
}

impl OpenAILlmClient {
    pub fn new(api_key: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.clone());
        Self {
            client: Arc::new(Client::with_config(config)),
            model: "gpt-3.5-turbo".to_string(),
            api_key_for_logging: api_key,
        }
    }

    /// Custom base URL (proxies, compatible endpoints).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.clone())
            .with_api_base(base_url);
        Self {
            client: Arc::new(Client::with_config(config)),
            model: "gpt-3.5-turbo".to_string(),
            api_key_for_logging: api_key,
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }
}

#[async_trait]
impl LlmClient for OpenAILlmClient {
    #[instrument(skip(self, system_prompt, user_message))]
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt.to_string())
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message.to_string())
                .build()?
                .into(),
        ];

        tracing::info!(
            model = %self.model,
            message_count = messages.len(),
            api_key = %mask_token(&self.api_key_for_logging),
            "OpenAI chat_completion request"
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()?;

        if let Ok(json) = serde_json::to_string_pretty(&request) {
            tracing::debug!(request_json = %json, "OpenAI chat_completion request JSON");
        }

        let response = self.client.chat().create(request).await?;

        if let Some(ref u) = response.usage {
            tracing::info!(
                prompt_tokens = u.prompt_tokens,
                completion_tokens = u.completion_tokens,
                total_tokens = u.total_tokens,
                "OpenAI chat_completion usage"
            );
        }

        if let Some(choice) = response.choices.first() {
            Ok(choice
                .message
                .content
                .clone()
                .unwrap_or_default()
                .trim()
                .to_string())
        } else {
            anyhow::bail!("No response from OpenAI");
        }
    }
}
