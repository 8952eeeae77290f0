//! Blocking client for OpenAI-compatible chat completion endpoints.

use std::env;
use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::generator::{PromptRequest, TextGenerator};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const USER_AGENT_VALUE: &str = concat!("tabmap/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the generation service (`[provider]` in `tabmap.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API base URL; `/chat/completions` is appended.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Sampling temperature. Zero keeps answers as repeatable as the service allows.
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// API key. Falls back to `OPENAI_API_KEY` when unset.
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

impl ProviderConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured key, or `OPENAI_API_KEY` if the config has none.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| match env::var("OPENAI_API_KEY") {
                Ok(key) if !key.trim().is_empty() => Some(key),
                _ => None,
            })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// [`TextGenerator`] backed by a chat completion API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: HttpClient,
    config: ProviderConfig,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(config: ProviderConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .resolved_api_key()
            .ok_or(GenerationError::MissingApiKey)?;
        let http = HttpClient::builder()
            .user_agent(USER_AGENT_VALUE)
            .timeout(config.timeout())
            .build()
            .map_err(|e| GenerationError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn map_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.config.timeout())
        } else {
            GenerationError::from(err)
        }
    }
}

impl TextGenerator for OpenAiClient {
    fn generate(&self, request: &PromptRequest) -> Result<String, GenerationError> {
        let mut messages = Vec::with_capacity(2);
        if !request.system.trim().is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &request.system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.human,
        });
        let body = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages,
        };

        tracing::debug!(
            model = %self.config.model,
            prompt_bytes = request.system.len() + request.human.len(),
            "sending chat completion request"
        );

        let response = self
            .http
            .post(self.config.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().map_err(|e| self.map_error(e))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyResponse)
    }
}
