//! Completion Gateway port
//!
//! Defines the interface to the external text-generation service that
//! produces a participant's turn and the closing summary.

use async_trait::async_trait;
use roundtable_domain::{MessageId, Transcript, TurnContext};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can occur during completion gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Timeout")]
    Timeout,

    #[error("Cancelled")]
    Cancelled,

    #[error("Other error: {0}")]
    Other(String),
}

/// Content produced for one turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnCompletion {
    pub content: String,
    pub confidence: Option<f32>,
    pub emotional_tone: Option<String>,
    pub thinking_time_ms: Option<u64>,
    /// Earlier message this turn answers, if the generator chose one
    pub reply_to: Option<MessageId>,
}

impl TurnCompletion {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_emotional_tone(mut self, tone: impl Into<String>) -> Self {
        self.emotional_tone = Some(tone.into());
        self
    }

    pub fn with_thinking_time_ms(mut self, ms: u64) -> Self {
        self.thinking_time_ms = Some(ms);
        self
    }

    pub fn with_reply_to(mut self, id: MessageId) -> Self {
        self.reply_to = Some(id);
        self
    }
}

/// Result of a single turn attempt
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Completed(TurnCompletion),
    /// The cancellation token fired; no partial content is returned
    Cancelled,
    Failed(String),
}

impl From<Result<TurnCompletion, GatewayError>> for TurnOutcome {
    fn from(result: Result<TurnCompletion, GatewayError>) -> Self {
        match result {
            Ok(completion) => TurnOutcome::Completed(completion),
            Err(GatewayError::Cancelled) => TurnOutcome::Cancelled,
            Err(e) => TurnOutcome::Failed(e.to_string()),
        }
    }
}

/// Gateway for turn and summary generation
///
/// Implementations (adapters) live in the infrastructure layer. A turn call
/// must watch `cancel` and return [`TurnOutcome::Cancelled`] promptly once
/// it fires.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Generate one participant's contribution
    async fn generate_turn(&self, context: &TurnContext, cancel: CancellationToken) -> TurnOutcome;

    /// Summarize a (possibly partial) transcript
    async fn generate_summary(&self, transcript: &Transcript) -> Result<String, GatewayError>;
}

#[async_trait]
impl CompletionGateway for Box<dyn CompletionGateway> {
    async fn generate_turn(&self, context: &TurnContext, cancel: CancellationToken) -> TurnOutcome {
        (**self).generate_turn(context, cancel).await
    }

    async fn generate_summary(&self, transcript: &Transcript) -> Result<String, GatewayError> {
        (**self).generate_summary(transcript).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_result() {
        let ok: TurnOutcome = Ok(TurnCompletion::new("hi")).into();
        assert_eq!(ok, TurnOutcome::Completed(TurnCompletion::new("hi")));

        let cancelled: TurnOutcome = Err(GatewayError::Cancelled).into();
        assert_eq!(cancelled, TurnOutcome::Cancelled);

        let failed: TurnOutcome = Err(GatewayError::Timeout).into();
        assert_eq!(failed, TurnOutcome::Failed("Timeout".into()));
    }
}
