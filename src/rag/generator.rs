//! Text generation through a hosted model.

use crate::config::ChatSettings;
use crate::error::{EduError, Result};
use crate::openai::create_client_with;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// A hosted generative model: prompt in, text out.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Generator for any OpenAI-compatible chat-completions endpoint.
pub struct ChatCompletionGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl ChatCompletionGenerator {
    pub fn new(
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: &str,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }

    /// Build a generator from chat settings.
    ///
    /// A missing API key is an error unless the default OpenAI endpoint is
    /// used, which falls back to `OPENAI_API_KEY`.
    pub fn from_settings(settings: &ChatSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key();
        if api_key.is_none() && settings.api_base.is_some() {
            return Err(EduError::Config(format!(
                "No API key found in {}",
                settings.api_key_env
            )));
        }

        let client = create_client_with(
            settings.api_base.as_deref(),
            api_key,
            Duration::from_secs(settings.timeout_secs),
        )?;
        Ok(Self::new(client, &settings.model, settings.temperature))
    }
}

#[async_trait]
impl Generator for ChatCompletionGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| EduError::Rag(e.to_string()))?;
        let messages: Vec<ChatCompletionRequestMessage> = vec![message.into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| EduError::Rag(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            EduError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| EduError::Rag("Empty response from model".to_string()))?;

        debug!("Generated {} characters", text.len());
        Ok(text.trim().to_string())
    }
}
