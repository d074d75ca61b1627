use std::env;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use suraksha_core::models::{ChatMessage, Role};
use suraksha_core::PlanCatalog;
use thiserror::Error;

use crate::prompt::build_system_prompt;

const DEFAULT_BASE_URL: &str = "https://ai.gateway.lovable.dev";
const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("gateway rate limit exceeded")]
    RateLimited,
    #[error("gateway quota exhausted")]
    QuotaExhausted,
    #[error("gateway returned status {status}")]
    Gateway { status: u16, body: String },
    #[error("gateway response had no message content")]
    EmptyResponse,
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl LlmError {
    /// The three user-facing failure messages. A failed turn is terminal;
    /// the rule-based wizard is never invoked as a fallback here.
    pub fn user_message(&self) -> &'static str {
        match self {
            LlmError::RateLimited => {
                "I'm receiving too many requests right now. Please wait a moment and try again."
            }
            LlmError::QuotaExhausted => {
                "The AI service needs to be recharged. Please contact support."
            }
            _ => "I apologize, but I'm having trouble responding right now. Please try again.",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Reads gateway settings from the environment. Returns None when no
    /// API key is configured, which disables AI mode entirely.
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("SURAKSHA_GATEWAY_API_KEY").ok()?;
        let base_url =
            env::var("SURAKSHA_GATEWAY_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model =
            env::var("SURAKSHA_GATEWAY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout_secs = env::var("SURAKSHA_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Some(Self {
            base_url,
            api_key,
            model,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Chat-completions client for the hosted model gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build gateway HTTP client")?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// One conversation turn: system prompt (rendered from the catalog,
    /// plus optional search context) followed by the full transcript.
    pub async fn complete(
        &self,
        catalog: &PlanCatalog,
        transcript: &[ChatMessage],
        search_context: Option<&str>,
    ) -> Result<String, LlmError> {
        let system = build_system_prompt(catalog, search_context);

        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: system,
        });
        for message in transcript {
            messages.push(WireMessage {
                role: match message.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: message.content.clone(),
            });
        }

        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .context("gateway request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "gateway returned an error");
            return Err(match status.as_u16() {
                429 => LlmError::RateLimited,
                402 => LlmError::QuotaExhausted,
                code => LlmError::Gateway { status: code, body },
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .context("failed to decode gateway response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_quota_carry_specific_messages() {
        assert!(LlmError::RateLimited.user_message().contains("too many requests"));
        assert!(LlmError::QuotaExhausted.user_message().contains("recharged"));
        let generic = LlmError::Gateway {
            status: 500,
            body: String::new(),
        };
        assert!(generic.user_message().contains("trouble responding"));
    }

    #[test]
    fn completion_response_decodes_gateway_shape() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello");
    }
}
