//! OpenAI-compatible chat completions gateway.
//!
//! Works against any endpoint that speaks `POST {base_url}/chat/completions`
//! with Bearer authentication.

use async_trait::async_trait;
use reqwest::Client;
use roundtable_application::{CompletionGateway, GatewayError, TurnCompletion, TurnOutcome};
use roundtable_domain::{PromptTemplate, Transcript, TurnContext};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::FileGatewayConfig;

/// Transport-level cap; the scheduler applies its own turn timeout on top
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

/// Completion gateway backed by an OpenAI-compatible HTTP API
pub struct OpenAiCompletionGateway {
    client: Client,
    config: FileGatewayConfig,
    api_key: String,
}

impl OpenAiCompletionGateway {
    /// Create a gateway, reading the API key from `config.api_key_env`
    pub fn new(config: FileGatewayConfig) -> Result<Self, GatewayError> {
        let api_key = config.api_key().ok_or_else(|| {
            GatewayError::MissingCredentials(format!(
                "set {} or use the scripted gateway (--offline)",
                config.api_key_env
            ))
        })?;
        Ok(Self::with_api_key(config, api_key))
    }

    pub fn with_api_key(config: FileGatewayConfig, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            config,
            api_key: api_key.into(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, system: String, user: String) -> ChatCompletionRequest<'_> {
        ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    async fn chat(&self, request: &ChatCompletionRequest<'_>) -> Result<String, GatewayError> {
        let url = self.api_url("chat/completions");
        debug!("Sending chat completion request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else if e.is_connect() {
                    GatewayError::ConnectionError(e.to_string())
                } else {
                    GatewayError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!("Chat completion response status: {}", status);

        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => GatewayError::MissingCredentials(format!("HTTP {}: {}", status, body)),
                _ => GatewayError::RequestFailed(format!("HTTP {}: {}", status, body)),
            });
        }
        parse_content(&body)
    }
}

fn parse_content(body: &str) -> Result<String, GatewayError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("JSON parse error: {}", e)))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| GatewayError::InvalidResponse("No content in response".to_string()))
}

#[async_trait]
impl CompletionGateway for OpenAiCompletionGateway {
    async fn generate_turn(&self, ctx: &TurnContext, cancel: CancellationToken) -> TurnOutcome {
        let request = self.request(
            PromptTemplate::turn_system(&ctx.speaker),
            PromptTemplate::turn_prompt(ctx),
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => TurnOutcome::Cancelled,
            result = self.chat(&request) => TurnOutcome::from(result.map(TurnCompletion::new)),
        }
    }

    async fn generate_summary(&self, transcript: &Transcript) -> Result<String, GatewayError> {
        let request = self.request(
            PromptTemplate::summary_system().to_string(),
            PromptTemplate::summary_prompt(transcript),
        );
        self.chat(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::{
        DiscussionSession, ParticipantConfig, ParticipantRole, SessionId, SessionType, Topic,
    };

    fn gateway(base_url: &str) -> OpenAiCompletionGateway {
        let config = FileGatewayConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        };
        OpenAiCompletionGateway::with_api_key(config, "test-key")
    }

    #[test]
    fn test_api_url_joins_cleanly() {
        let gw = gateway("http://localhost:8080/v1/");
        assert_eq!(gw.api_url("/chat/completions"), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let gw = gateway("http://localhost:8080/v1");
        let request = gw.request("sys".into(), "usr".into());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
        assert_eq!(json["max_tokens"], 800);
    }

    #[test]
    fn test_parse_content() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"  The tide turns.\n"},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_content(body).unwrap(), "The tide turns.");

        let empty = r#"{"choices":[]}"#;
        assert!(matches!(parse_content(empty), Err(GatewayError::InvalidResponse(_))));
        assert!(matches!(parse_content("<html>"), Err(GatewayError::InvalidResponse(_))));
    }

    #[test]
    fn test_missing_api_key() {
        let config = FileGatewayConfig {
            api_key_env: "ROUNDTABLE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            OpenAiCompletionGateway::new(config),
            Err(GatewayError::MissingCredentials(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        // Port 9 (discard) is never contacted: the token is already cancelled
        let gw = gateway("http://127.0.0.1:9/v1");
        let mut session = DiscussionSession::new(
            SessionId::new("s1"),
            None,
            Topic::try_new("Salt and smoke").unwrap(),
            SessionType::Discussion,
            vec![
                ParticipantConfig::new(ParticipantRole::Writer),
                ParticipantConfig::new(ParticipantRole::Editor),
            ],
            1,
        )
        .unwrap();
        session.start().unwrap();
        let ctx = TurnContext::build(&session, 10).unwrap();

        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(gw.generate_turn(&ctx, token).await, TurnOutcome::Cancelled);
    }
}
