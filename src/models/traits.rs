use anyhow::Result;
use async_trait::async_trait;

use super::types::{ModelResponse, Turn};

/// Core trait that all chat model backends must implement
///
/// The model sees the full ordered turn sequence, system preamble first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send a conversation to the model and get a single assistant response
    async fn chat(&self, turns: &[Turn]) -> Result<ModelResponse>;

    /// Get the name of the model
    fn name(&self) -> &str;

    /// Validate that the model endpoint is reachable
    async fn validate_connection(&self) -> Result<bool> {
        Ok(true)
    }
}
