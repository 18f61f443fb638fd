//! OpenAI-compatible chat-completions backend for the grounded generator.
//!
//! Two modes: `Mock` (the default) answers deterministically without network
//! I/O and reports itself unconfigured, so the pipeline shows its fixed
//! not-configured notice instead of pretending to generate. `Live` POSTs to
//! `<base_url>/chat/completions` with bearer auth and a bounded per-request
//! timeout. Works with any OpenAI-compatible provider (Groq, OpenAI, local
//! gateways).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use bistro_core::{GatewayConfig, LlmBackend};

const ENV_LLM_API_KEY: &str = "BISTRO_LLM_API_KEY";

/// Sampling temperature for every completion; low keeps answers close to the
/// grounding block.
const TEMPERATURE: f32 = 0.3;

/// Generation mode: mock (no network) or live API calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LlmMode {
    #[default]
    Mock,
    Live,
}

impl LlmMode {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "live" => LlmMode::Live,
            _ => LlmMode::Mock,
        }
    }
}

/// Chat-completions client implementing [`LlmBackend`].
pub struct ChatClient {
    mode: LlmMode,
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl ChatClient {
    /// Builds a client from gateway config; the API key comes from the
    /// `BISTRO_LLM_API_KEY` environment variable only.
    pub fn from_config(cfg: &GatewayConfig) -> Self {
        Self {
            mode: LlmMode::parse(&cfg.llm_mode),
            http: reqwest::Client::new(),
            base_url: cfg.llm_base_url.trim().to_string(),
            api_key: std::env::var(ENV_LLM_API_KEY).unwrap_or_default(),
            model: cfg.llm_model.trim().to_string(),
            timeout: Duration::from_secs(cfg.llm_timeout_secs.clamp(1, 120)),
        }
    }

    /// Mock-mode client for tests and local development.
    pub fn mock() -> Self {
        Self {
            mode: LlmMode::Mock,
            http: reqwest::Client::new(),
            base_url: String::new(),
            api_key: String::new(),
            model: String::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn mode(&self) -> LlmMode {
        self.mode
    }

    fn mock_generate(&self, user_message: &str) -> String {
        let preview: String = user_message.chars().take(60).collect();
        format!(
            "Thanks! (AI chat is running in mock mode.) You asked: \"{}\" — \
            please use the buttons for menu, hours, location, or contact 😊",
            preview
        )
    }

    async fn live_generate(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        if !self.is_configured() {
            return Err("llm backend is not fully configured".into());
        }

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            temperature: TEMPERATURE,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("chat completions returned status {}", status).into());
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        match parsed.choices.into_iter().next() {
            Some(choice) if !choice.message.content.trim().is_empty() => {
                Ok(choice.message.content)
            }
            _ => Err("chat completions response had no usable choices".into()),
        }
    }
}

#[async_trait]
impl LlmBackend for ChatClient {
    /// Mock mode always reports unconfigured; live mode needs base URL,
    /// API key, and model.
    fn is_configured(&self) -> bool {
        match self.mode {
            LlmMode::Mock => false,
            LlmMode::Live => {
                !self.base_url.is_empty() && !self.api_key.is_empty() && !self.model.is_empty()
            }
        }
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        match self.mode {
            LlmMode::Mock => Ok(self.mock_generate(user_message)),
            LlmMode::Live => {
                tracing::debug!(
                    target: "bistro::llm",
                    model = %self.model,
                    prompt_len = system_prompt.len(),
                    "dispatching live completion"
                );
                self.live_generate(system_prompt, user_message).await
            }
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parsing_defaults_to_mock() {
        assert_eq!(LlmMode::parse("live"), LlmMode::Live);
        assert_eq!(LlmMode::parse("LIVE "), LlmMode::Live);
        assert_eq!(LlmMode::parse("mock"), LlmMode::Mock);
        assert_eq!(LlmMode::parse("banana"), LlmMode::Mock);
        assert_eq!(LlmMode::parse(""), LlmMode::Mock);
    }

    #[test]
    fn mock_client_reports_unconfigured() {
        assert!(!ChatClient::mock().is_configured());
    }

    #[tokio::test]
    async fn mock_completion_is_deterministic_and_offline() {
        let client = ChatClient::mock();
        let a = client.complete("system", "any ramen?").await.unwrap();
        let b = client.complete("system", "any ramen?").await.unwrap();
        assert_eq!(a, b);
        assert!(a.contains("any ramen?"));
    }

    #[tokio::test]
    async fn live_mode_without_credentials_errors_cleanly() {
        let client = ChatClient {
            mode: LlmMode::Live,
            http: reqwest::Client::new(),
            base_url: String::new(),
            api_key: String::new(),
            model: String::new(),
            timeout: Duration::from_secs(1),
        };
        assert!(!client.is_configured());
        let err = client.complete("system", "user").await.unwrap_err();
        assert!(err.to_string().contains("not fully configured"));
    }

    #[test]
    fn completion_response_parses_with_missing_fields() {
        let parsed: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_empty());

        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{ "choices": [ { "message": { "content": "hi there" } } ] }"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content, "hi there");
    }
}
