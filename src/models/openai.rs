use anyhow::{Context as _, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::traits::ChatModel;
use super::types::{ModelConfig, ModelResponse, TokenUsage, Turn};
use crate::constants::{HEALTH_CHECK_TIMEOUT_SECS, HTTP_CONNECT_TIMEOUT_SECS};

/// Chat model backed by an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiChatModel {
    client: Client,
    base_url: String,
    model_name: String,
    api_key: String,
    params: ModelConfig,
}

impl OpenAiChatModel {
    /// Create a new chat client
    ///
    /// `timeout` bounds the whole HTTP round trip, not just the connect phase.
    pub fn new(
        base_url: &str,
        model_name: &str,
        api_key: String,
        params: ModelConfig,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(timeout)
                .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
            api_key,
            params,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn chat(&self, turns: &[Turn]) -> Result<ModelResponse> {
        // Turn already serializes to {"role", "content"}
        let mut request_body = json!({
            "model": self.model_name,
            "messages": turns,
        });

        if let Some(temp) = self.params.temperature {
            request_body["temperature"] = json!(temp);
        }
        if let Some(max_tokens) = self.params.max_tokens {
            request_body["max_tokens"] = json!(max_tokens);
        }

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .with_context(|| format!("Failed to reach chat endpoint at {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat API error ({status}): {error_text}");
        }

        let response_json: ChatCompletionResponse = response
            .json()
            .await
            .context("Malformed chat completion response")?;

        let content = response_json
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("Malformed chat completion response: no message content")?;

        Ok(ModelResponse {
            content,
            usage: response_json.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            model_name: response_json.model.unwrap_or_else(|| self.model_name.clone()),
        })
    }

    fn name(&self) -> &str {
        &self.model_name
    }

    async fn validate_connection(&self) -> Result<bool> {
        let models_url = format!("{}/models", self.base_url);

        // Shorter timeout than chat requests
        let health_client = Client::builder()
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
            .build()?;

        match health_client
            .get(&models_url)
            .bearer_auth(&self.api_key)
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

// Response structures (OpenAI format)

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiChatModel {
        OpenAiChatModel::new(
            &server.uri(),
            "gpt-4o",
            "sk-test".to_string(),
            ModelConfig::default(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_chat_sends_turns_and_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt-4o-2024-08-06",
                "choices": [{"message": {"role": "assistant", "content": "  Hello!  "}}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = client_for(&server);
        let response = model
            .chat(&[Turn::system("be brief"), Turn::user("hi")])
            .await
            .unwrap();

        // Trimming is the orchestrator's job
        assert_eq!(response.content, "  Hello!  ");
        assert_eq!(response.model_name, "gpt-4o-2024-08-06");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[tokio::test]
    async fn test_chat_surfaces_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .chat(&[Turn::user("hi")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid api key"));
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .chat(&[Turn::user("hi")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Malformed"));
    }
}
