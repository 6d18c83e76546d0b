//! Offline gateway producing deterministic contributions.
//!
//! Used with `--offline` and `provider = "scripted"`: no network, no
//! credentials, same output for the same context. Handy for demos and for
//! exercising the orchestrator end to end.

use async_trait::async_trait;
use roundtable_application::{
    CompletionGateway, GatewayError, TurnCompletion, TurnOutcome, fallback_summary,
};
use roundtable_domain::util::preview;
use roundtable_domain::{ParticipantRole, Transcript, TurnContext};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const QUOTE_CHARS: usize = 80;

/// Deterministic completion gateway
#[derive(Debug, Clone, Default)]
pub struct ScriptedCompletionGateway {
    delay: Duration,
}

impl ScriptedCompletionGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated thinking time before each turn returns
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

fn role_line(role: &ParticipantRole) -> &'static str {
    match role {
        ParticipantRole::Writer => {
            "Here is a beat to build on: a small, concrete moment that forces a choice."
        }
        ParticipantRole::Editor => {
            "Structurally, we need the turn to land earlier and the stakes to be explicit."
        }
        ParticipantRole::Proofreader => {
            "Names, tense and timeline are consistent so far; watch the point of view in the last exchange."
        }
        ParticipantRole::DeputyEditor => {
            "This fits the overall arc, but the tone has to match what readers were promised."
        }
        ParticipantRole::Custom(_) => "From my angle there is more to dig into here before we move on.",
    }
}

fn tone(ctx: &TurnContext) -> &'static str {
    match ctx.speaker.personality.traits.dominant().first().copied() {
        Some("creativity") => "enthusiastic",
        Some("rigor") => "analytical",
        Some("empathy") => "warm",
        Some("assertiveness") => "firm",
        Some("humor") => "wry",
        _ => "measured",
    }
}

fn compose(ctx: &TurnContext) -> TurnCompletion {
    let mut content = match ctx.recent_messages.last() {
        None => format!("To open on \"{}\": ", ctx.topic),
        Some(last) => format!(
            "Picking up from {} (\"{}\"): ",
            ctx.sender_name(last),
            preview(&last.content, QUOTE_CHARS)
        ),
    };
    content.push_str(role_line(&ctx.speaker.role));

    if let Some(note) = ctx.interventions.first() {
        content.push_str(&format!(
            " Taking the note \"{}\" on board.",
            preview(&note.message.content, QUOTE_CHARS)
        ));
    }
    if ctx.is_final_round() {
        content.push_str(" As this is the final round, I would lock this in.");
    }
    content.push_str(&format!(" [{} · round {}]", ctx.speaker.display_name, ctx.round + 1));

    let rigor = ctx.speaker.personality.traits.rigor;
    let mut completion = TurnCompletion::new(content)
        .with_confidence((0.5 + 0.4 * rigor).clamp(0.0, 1.0))
        .with_emotional_tone(tone(ctx));
    if let Some(last) = ctx.recent_messages.last() {
        completion = completion.with_reply_to(last.id.clone());
    }
    completion
}

#[async_trait]
impl CompletionGateway for ScriptedCompletionGateway {
    async fn generate_turn(&self, ctx: &TurnContext, cancel: CancellationToken) -> TurnOutcome {
        if !self.delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return TurnOutcome::Cancelled,
                _ = tokio::time::sleep(self.delay) => {}
            }
        }
        if cancel.is_cancelled() {
            return TurnOutcome::Cancelled;
        }
        TurnOutcome::Completed(compose(ctx))
    }

    async fn generate_summary(&self, transcript: &Transcript) -> Result<String, GatewayError> {
        Ok(fallback_summary(transcript))
    }
}
