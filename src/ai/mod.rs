/// AI engine: the second opinion in the dual-result analysis.
///
/// Sends the clause to an OpenAI-compatible chat completions endpoint and
/// turns the model's JSON answer into an [`AiAnalysis`]. Every failure mode
/// (missing key, transport error, malformed JSON, missing field) becomes an
/// [`AiOutcome::Failed`] so the rule-based half of the result is never lost.
///
/// # Configuration
///
/// Driven by the `[ai]` config section. The engine is considered
/// unconfigured when `ai.enabled = false` or no API key is set
/// (`CLAUSESCOPE_AI_API_KEY`).
use std::time::Instant;

pub mod client;
pub mod prompts;
pub mod validation;

use crate::activity;
use crate::analysis::{AiAnalysis, AiOutcome};
use crate::config::schema::AiConfig;

use client::{ChatClient, ChatMessage};

/// Message carried by the AI panel when no credentials are configured.
pub const NOT_CONFIGURED: &str =
    "AI service not configured: set CLAUSESCOPE_AI_API_KEY to enable AI analysis";

/// Anything that can give an AI opinion on a clause.
pub trait AiEngine {
    fn analyze(&self, clause: &str) -> AiOutcome;

    /// Whether the engine can reach a model at all.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Build the engine described by the config.
pub fn engine_from_config(config: &AiConfig) -> Box<dyn AiEngine> {
    if !config.enabled {
        return Box::new(Unavailable("AI analysis is disabled in configuration".to_string()));
    }
    if config.api_key.trim().is_empty() {
        return Box::new(Unavailable(NOT_CONFIGURED.to_string()));
    }
    Box::new(ChatEngine {
        client: ChatClient::from_config(config),
    })
}

/// Engine that always reports the same failure.
#[derive(Debug)]
pub struct Unavailable(pub String);

impl AiEngine for Unavailable {
    fn analyze(&self, _clause: &str) -> AiOutcome {
        AiOutcome::failed(self.0.clone())
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Engine backed by a chat completions endpoint.
#[derive(Debug)]
pub struct ChatEngine {
    client: ChatClient,
}

impl AiEngine for ChatEngine {
    fn analyze(&self, clause: &str) -> AiOutcome {
        let start = Instant::now();
        match self.request(clause) {
            Ok(analysis) => {
                activity::record_ai_call(
                    self.client.model_name(),
                    start.elapsed().as_millis() as u64,
                    None,
                );
                AiOutcome::Analysis(analysis)
            }
            Err(e) => {
                let message = format!("Unexpected error: {e:#}");
                activity::record_ai_call(
                    self.client.model_name(),
                    start.elapsed().as_millis() as u64,
                    Some(&message),
                );
                AiOutcome::failed(message)
            }
        }
    }
}

impl ChatEngine {
    fn request(&self, clause: &str) -> anyhow::Result<AiAnalysis> {
        let messages = vec![
            ChatMessage::system(prompts::SYSTEM_PROMPT),
            ChatMessage::user(prompts::build_user_prompt(clause)),
        ];
        let reply = self.client.chat(&messages)?;
        validation::parse_ai_reply(&reply)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
