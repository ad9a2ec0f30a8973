use anyhow::Result;
use async_trait::async_trait;

/// Speech-to-text capability
///
/// Stateless: implementations never see or touch conversation history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe raw audio bytes; `format` is a file extension hint such as `m4a`
    async fn transcribe(&self, audio: &[u8], format: &str) -> Result<String>;
}
