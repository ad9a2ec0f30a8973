use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use super::openai::OpenAiChatModel;
use super::traits::ChatModel;
use super::types::ModelConfig;
use crate::app::Config;

/// Factory for creating the chat model from configuration
pub struct ModelFactory;

impl ModelFactory {
    /// Create the configured chat model
    ///
    /// Returns `Ok(None)` when no API key is available; the orchestrator's
    /// fallback policy decides what that means for incoming messages.
    pub fn from_config(config: &Config) -> Result<Option<Arc<dyn ChatModel>>> {
        let Some(api_key) = config.openai.api_key() else {
            warn!(
                env = %config.openai.api_key_env,
                "No API key found, chat model is not configured"
            );
            return Ok(None);
        };

        let params = ModelConfig {
            temperature: config.openai.temperature,
            max_tokens: None,
        };

        let model = OpenAiChatModel::new(
            &config.openai.base_url,
            &config.openai.chat_model,
            api_key,
            params,
            config.openai.request_timeout(),
        )?;
        info!(model = %config.openai.chat_model, "Chat model configured");

        Ok(Some(Arc::new(model)))
    }
}
