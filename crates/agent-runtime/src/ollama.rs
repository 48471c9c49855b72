//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` against a local Ollama server
//! (`POST /api/chat`, `GET /api/tags`). Structured requests set Ollama's
//! `format: "json"` so the model is constrained to JSON output.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{
        Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo,
        TokenUsage,
    },
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    pub port: u16,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            timeout_secs: 120,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("OLLAMA_HOST")
            .unwrap_or_else(|_| "http://localhost".into());
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(11434);

        Self {
            host,
            port,
            ..Default::default()
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }
}

// Wire types for the Ollama REST API

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    model: String,
    message: ResponseMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<LocalModel>,
}

#[derive(Deserialize)]
struct LocalModel {
    name: String,
    #[serde(default)]
    size: Option<u64>,
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create from configuration
    pub fn from_config(config: OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OllamaConfig::from_env())
    }

    /// Create with default localhost settings
    pub fn localhost() -> Result<Self> {
        Self::from_config(OllamaConfig::default())
    }

    pub const fn config(&self) -> &OllamaConfig {
        &self.config
    }

    const fn role_name(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn build_request<'a>(messages: &'a [Message], opts: &'a GenerationOptions) -> ChatRequest<'a> {
        ChatRequest {
            model: &opts.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: Self::role_name(m.role),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            format: opts.json_mode.then_some("json"),
            options: ChatOptions {
                temperature: opts.temperature,
                top_p: opts.top_p,
                num_predict: opts.max_tokens,
            },
        }
    }

    fn convert_completion(response: ChatResponse) -> Completion {
        let usage = match (response.prompt_eval_count, response.eval_count) {
            (None, None) => None,
            (prompt, eval) => {
                let prompt_tokens = prompt.unwrap_or(0);
                let completion_tokens = eval.unwrap_or(0);
                Some(TokenUsage {
                    prompt_tokens,
                    completion_tokens,
                    total_tokens: prompt_tokens.saturating_add(completion_tokens),
                })
            }
        };

        let finish_reason = match response.done_reason.as_deref() {
            Some("length") => Some(FinishReason::Length),
            Some(_) | None => Some(FinishReason::Stop),
        };

        Completion {
            content: response.message.content,
            model: response.model,
            usage,
            finish_reason,
        }
    }

    fn transport_error(e: &reqwest::Error) -> AgentError {
        if e.is_timeout() || e.is_connect() {
            AgentError::ProviderUnavailable(e.to_string())
        } else {
            AgentError::Provider(e.to_string())
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: "Ollama".into(),
            models,
            supports_json_mode: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.list_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let url = format!("{}/api/chat", self.config.base_url());
        let request = Self::build_request(messages, options);

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AgentError::RateLimited(format!("Ollama returned {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider(format!("Ollama returned {status}: {body}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Invalid Ollama response: {e}")))?;

        Ok(Self::convert_completion(body))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.config.base_url());
        let tags: TagsResponse = self.client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Invalid Ollama response: {e}")))?;

        Ok(tags
            .models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.clone(),
                name: m.name,
                size_bytes: m.size,
            })
            .collect())
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        // Llama tokenizer is roughly 4 chars per token
        u32::try_from(text.len() / 4).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.host, "http://localhost");
        assert_eq!(config.port, 11434);
        assert_eq!(config.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_request_shape() {
        let messages = vec![
            Message::system("You are helpful."),
            Message::user("Hello"),
        ];
        let opts = GenerationOptions::json();

        let request = serde_json::to_value(OllamaProvider::build_request(&messages, &opts)).unwrap();
        assert_eq!(request["format"], "json");
        assert_eq!(request["stream"], false);
        assert_eq!(request["messages"][0]["role"], "system");
        assert_eq!(request["messages"][1]["content"], "Hello");

        let plain = serde_json::to_value(OllamaProvider::build_request(&messages, &GenerationOptions::default())).unwrap();
        assert!(plain.get("format").is_none());
    }

    #[test]
    fn test_completion_conversion() {
        let body = r#"{
            "model": "llama3.2",
            "created_at": "2024-01-01T00:00:00Z",
            "message": {"role": "assistant", "content": "{\"summary\": \"ok\"}"},
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": 12,
            "eval_count": 8
        }"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        let completion = OllamaProvider::convert_completion(response);

        assert_eq!(completion.content, "{\"summary\": \"ok\"}");
        assert_eq!(completion.usage.unwrap().total_tokens, 20);
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
    }
}
