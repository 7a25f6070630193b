//! OpenAI chat-completions backend for the oracle

use super::{OracleError, OracleRequest, StructuredOracle};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Oracle backed by an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiOracle {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponseRaw {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiOracle {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    /// Set a custom base URL (proxies, compatible servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl StructuredOracle for OpenAiOracle {
    async fn generate(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let start = std::time::Instant::now();
        let body = ChatBody {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: &request.system_prompt,
                },
                Message {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenAI request failed");
                if e.is_connect() {
                    OracleError::Unavailable(e.to_string())
                } else {
                    OracleError::InvocationFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI API error");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    OracleError::Unavailable(format!("{}: {}", status, error_text))
                }
                _ => OracleError::InvocationFailed(format!("{}: {}", status, error_text)),
            });
        }

        let raw: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| OracleError::Parse(e.to_string()))?;

        debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis(),
            "OpenAI chat completion"
        );

        raw.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_else(|| "{}".to_string()))
            .ok_or_else(|| OracleError::InvocationFailed("no choices in response".to_string()))
    }
}
