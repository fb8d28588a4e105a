use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use showroom_core::config::{LlmConfig, LlmProvider};
use showroom_core::dialogue::ChatMessage;
use tracing::debug;

/// Generative fallback for turns the deterministic engine cannot answer.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// `history` starts with the system prompt and ends with the pending user
    /// message.
    async fn complete(&self, history: &[ChatMessage]) -> Result<String>;
}

pub fn client_from_config(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    match config.provider {
        LlmProvider::Ollama => Ok(Arc::new(OllamaClient::new(config)?)),
        LlmProvider::Disabled => Ok(Arc::new(UnavailableLlm)),
    }
}

/// Client for a local or remote Ollama server (`POST /api/chat`).
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
    options: OllamaOptions,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| anyhow!("llm.base_url is required for the ollama provider"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("failed to build ollama http client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            options: OllamaOptions {
                temperature: config.temperature,
                repeat_penalty: config.repeat_penalty,
            },
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request<'a>(&'a self, history: &'a [ChatMessage]) -> OllamaChatRequest<'a> {
        OllamaChatRequest {
            model: &self.model,
            messages: history,
            stream: false,
            options: &self.options,
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, history: &[ChatMessage]) -> Result<String> {
        let mut request = self.client.post(&self.endpoint).json(&self.request(history));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.context("ollama request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("ollama returned {status}: {body}");
        }

        let parsed: OllamaChatResponse =
            response.json().await.context("ollama response was not valid chat json")?;
        debug!(
            event_name = "llm.ollama.completed",
            model = %self.model,
            chars = parsed.message.content.len(),
            "fallback completion received"
        );
        Ok(parsed.message.content)
    }
}

/// Stand-in used when no generative backend is configured. Every call fails,
/// so unresolved turns get the fixed apology.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableLlm;

#[async_trait]
impl LlmClient for UnavailableLlm {
    async fn complete(&self, _history: &[ChatMessage]) -> Result<String> {
        bail!("no fallback model is configured")
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: &'a OllamaOptions,
}

#[derive(Clone, Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    repeat_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use showroom_core::config::{AppConfig, LlmProvider};
    use showroom_core::dialogue::ChatMessage;

    use super::{client_from_config, LlmClient, OllamaChatResponse, OllamaClient, UnavailableLlm};

    #[test]
    fn chat_request_is_non_streaming_with_sampling_options() {
        let mut config = AppConfig::default().llm;
        config.base_url = Some("http://localhost:11434/".to_string());
        let client = OllamaClient::new(&config).expect("client");
        assert_eq!(client.endpoint(), "http://localhost:11434/api/chat");

        let history = vec![ChatMessage::user("Tell me about the Swift")];
        let body = serde_json::to_value(client.request(&history)).expect("serialize");

        assert_eq!(body["model"], "phi");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Tell me about the Swift");
        assert!((body["options"]["temperature"].as_f64().unwrap_or_default() - 0.3).abs() < 1e-6);
        assert!(
            (body["options"]["repeat_penalty"].as_f64().unwrap_or_default() - 1.2).abs() < 1e-6
        );
    }

    #[test]
    fn chat_response_content_is_extracted() {
        let parsed: OllamaChatResponse = serde_json::from_str(
            r#"{"model":"phi","message":{"role":"assistant","content":"Hello!"},"done":true}"#,
        )
        .expect("parse");
        assert_eq!(parsed.message.content, "Hello!");
    }

    #[test]
    fn missing_base_url_is_rejected() {
        let mut config = AppConfig::default().llm;
        config.base_url = None;
        assert!(OllamaClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn disabled_provider_always_fails() {
        let mut config = AppConfig::default().llm;
        config.provider = LlmProvider::Disabled;
        let client = client_from_config(&config).expect("client");

        assert!(client.complete(&[ChatMessage::user("hello")]).await.is_err());
        assert!(UnavailableLlm.complete(&[]).await.is_err());
    }
}
