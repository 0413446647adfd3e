/// Chat completions client for the AI engine.
///
/// Talks to any OpenAI-compatible `POST {base_url}/chat/completions`
/// endpoint with the synchronous `ureq` client and returns the first
/// choice's message content.
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::schema::AiConfig;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// A single message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error body returned by most OpenAI-compatible services.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiErrorDetail {
    Object { message: String },
    Text(String),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous chat completions client, built once per engine.
#[derive(Debug)]
pub struct ChatClient {
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
    max_tokens: u32,
    temperature: f64,
}

impl ChatClient {
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.trim().to_string(),
            timeout: Duration::from_millis(config.timeout_ms),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Send the conversation and return the assistant's reply text.
    pub fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let resp = ureq::post(&self.endpoint)
            .timeout(self.timeout)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&body);

        let resp = match resp {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                let detail = resp
                    .into_json::<ApiErrorBody>()
                    .map(|b| match b.error {
                        ApiErrorDetail::Object { message } => message,
                        ApiErrorDetail::Text(text) => text,
                    })
                    .unwrap_or_else(|_| "no error detail".to_string());
                anyhow::bail!("AI service returned {code}: {detail}");
            }
            Err(e) => return Err(e).context("AI service request failed"),
        };

        let parsed: CompletionResponse = resp
            .into_json()
            .context("failed to parse AI service response")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            anyhow::bail!("AI service returned an empty response");
        }

        Ok(content)
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
