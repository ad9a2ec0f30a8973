use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

use super::openai::WhisperTranscriber;
use super::traits::Transcriber;
use crate::app::Config;
use crate::constants::EMPTY_TRANSCRIPT_PLACEHOLDER;
use crate::utils::WaiterError;

/// Audio-to-text side channel with the placeholder and error rules applied
pub struct TranscriptionService {
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl TranscriptionService {
    pub fn new(transcriber: Option<Arc<dyn Transcriber>>) -> Self {
        Self { transcriber }
    }

    /// Build the Whisper client when an API key is available
    pub fn from_config(config: &Config) -> Result<Self> {
        let Some(api_key) = config.openai.api_key() else {
            return Ok(Self::new(None));
        };

        let transcriber = WhisperTranscriber::new(
            api_key,
            &config.openai.base_url,
            &config.openai.transcription_model,
            config.openai.request_timeout(),
        )?;
        Ok(Self::new(Some(Arc::new(transcriber))))
    }

    pub fn is_configured(&self) -> bool {
        self.transcriber.is_some()
    }

    /// Transcribe `audio`, never returning an empty string
    ///
    /// A blank transcript, or empty input, yields the fixed placeholder.
    pub async fn transcribe(&self, audio: &[u8], format: &str) -> Result<String, WaiterError> {
        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or(WaiterError::NotConfigured("transcription"))?;

        if audio.is_empty() {
            debug!("Empty audio upload, skipping provider call");
            return Ok(EMPTY_TRANSCRIPT_PLACEHOLDER.to_string());
        }

        let text = transcriber.transcribe(audio, format).await.map_err(|e| {
            warn!(error = %e, bytes = audio.len(), "Transcription failed");
            WaiterError::TranscriptionUnavailable(format!("{e:#}"))
        })?;

        let text = text.trim();
        if text.is_empty() {
            Ok(EMPTY_TRANSCRIPT_PLACEHOLDER.to_string())
        } else {
            Ok(text.to_string())
        }
    }
}
