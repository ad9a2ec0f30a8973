use anyhow::{Context as _, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::traits::Transcriber;
use crate::constants::HTTP_CONNECT_TIMEOUT_SECS;

/// Whisper transcription against an OpenAI-compatible `/audio/transcriptions` endpoint
pub struct WhisperTranscriber {
    api_key: String,
    client: Client,
    model: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl WhisperTranscriber {
    pub fn new(api_key: String, base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_key,
            client: Client::builder()
                .timeout(timeout)
                .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
                .build()?,
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn mime_type(format: &str) -> &'static str {
        match format.to_lowercase().as_str() {
            "ogg" | "oga" => "audio/ogg",
            "mp3" => "audio/mpeg",
            "wav" => "audio/wav",
            "webm" => "audio/webm",
            "flac" => "audio/flac",
            "mp4" => "audio/mp4",
            _ => "audio/m4a",
        }
    }

    fn file_extension(format: &str) -> &'static str {
        match format.to_lowercase().as_str() {
            "ogg" | "oga" => "ogg",
            "mp3" => "mp3",
            "wav" => "wav",
            "webm" => "webm",
            "flac" => "flac",
            "mp4" => "mp4",
            _ => "m4a",
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &[u8], format: &str) -> Result<String> {
        let filename = format!("audio.{}", Self::file_extension(format));
        let part = Part::bytes(audio.to_vec())
            .file_name(filename)
            .mime_str(Self::mime_type(format))?;

        let form = Form::new()
            .text("model", self.model.clone())
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("Failed to reach transcription endpoint at {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Whisper API error ({status}): {error_text}");
        }

        let transcription: TranscriptionResponse = response
            .json()
            .await
            .context("Malformed transcription response")?;
        Ok(transcription.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_mime_type_defaults_to_m4a() {
        assert_eq!(WhisperTranscriber::mime_type("MP3"), "audio/mpeg");
        assert_eq!(WhisperTranscriber::mime_type("oga"), "audio/ogg");
        assert_eq!(WhisperTranscriber::mime_type("xyz"), "audio/m4a");
        assert_eq!(WhisperTranscriber::file_extension("xyz"), "m4a");
        assert_eq!(WhisperTranscriber::file_extension("WAV"), "wav");
    }

    #[tokio::test]
    async fn test_transcribe_posts_multipart_and_reads_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .and(bearer_token("sk-test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"text": "one chicken rice please"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transcriber = WhisperTranscriber::new(
            "sk-test".to_string(),
            &server.uri(),
            "whisper-1",
            Duration::from_secs(5),
        )
        .unwrap();

        let text = transcriber.transcribe(b"fake-audio", "m4a").await.unwrap();
        assert_eq!(text, "one chicken rice please");
    }

    #[tokio::test]
    async fn test_transcribe_surfaces_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let transcriber = WhisperTranscriber::new(
            "sk-test".to_string(),
            &server.uri(),
            "whisper-1",
            Duration::from_secs(5),
        )
        .unwrap();

        let err = transcriber.transcribe(b"x", "wav").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
