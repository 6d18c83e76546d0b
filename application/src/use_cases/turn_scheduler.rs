//! Turn Scheduler — the per-session scheduling loop.
//!
//! One loop runs per session as a single tokio task, so at most one gateway
//! call is outstanding per session. Each iteration:
//!
//! 1. **Prepare** (locked): decide whether to exit, wait, conclude or run
//!    the pending participant's turn; mark the participant `thinking`.
//! 2. **Execute** (unlocked): call the gateway under a child cancellation
//!    token, bounded by the turn timeout.
//! 3. **Resolve** (locked): append, skip, retry or escalate, then move the
//!    round-robin cursor.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::conclusion;
use super::session_runtime::{SessionGuard, SessionRuntime};
use crate::config::OrchestratorConfig;
use crate::events::SessionEvent;
use crate::ports::completion_gateway::{CompletionGateway, TurnCompletion, TurnOutcome};
use roundtable_domain::{
    FailureAction, MessageMetadata, ParticipantId, ParticipantStatus, SessionStatus, Transcript,
    TurnAdvance, TurnContext,
};

/// A turn ready to be sent to the gateway
struct PreparedTurn {
    participant: ParticipantId,
    context: TurnContext,
    token: CancellationToken,
}

/// What the loop does next
enum Step {
    Exit,
    Wait,
    Turn(PreparedTurn),
    Conclude(Transcript),
}

/// Runs one session until it is concluded or the orchestrator shuts down
pub(crate) struct TurnScheduler<G: CompletionGateway + 'static> {
    runtime: Arc<SessionRuntime>,
    gateway: Arc<G>,
    config: OrchestratorConfig,
}

impl<G: CompletionGateway + 'static> TurnScheduler<G> {
    pub fn new(runtime: Arc<SessionRuntime>, gateway: Arc<G>, config: OrchestratorConfig) -> Self {
        Self {
            runtime,
            gateway,
            config,
        }
    }

    pub async fn run(self) {
        debug!(session = %self.runtime.id, "Scheduling loop started");
        loop {
            match self.prepare() {
                Step::Exit => break,
                Step::Wait => {
                    tokio::select! {
                        _ = self.runtime.shutdown.cancelled() => break,
                        _ = self.runtime.wake.notified() => {}
                    }
                }
                Step::Turn(turn) => {
                    let outcome = self.execute(&turn).await;
                    if let Some((backoff, token)) = self.resolve(turn, outcome) {
                        self.wait_backoff(backoff, token).await;
                    }
                }
                Step::Conclude(transcript) => {
                    info!(session = %self.runtime.id, "Round limit reached");
                    conclusion::finish(
                        &self.runtime,
                        self.gateway.as_ref(),
                        transcript,
                        self.config.summary_timeout,
                    )
                    .await;
                    break;
                }
            }
        }
        debug!(session = %self.runtime.id, "Scheduling loop stopped");
    }

    fn prepare(&self) -> Step {
        if self.runtime.shutdown.is_cancelled() {
            return Step::Exit;
        }
        let mut guard = self.runtime.lock();
        if guard.session.status() == SessionStatus::Concluded {
            return Step::Exit;
        }
        if guard.concluding {
            return Step::Wait;
        }

        // The round limit concludes a paused session too
        let Some(participant) = guard.session.next_participant().map(|p| p.id.clone()) else {
            return match conclusion::begin(&mut guard) {
                Ok(transcript) => Step::Conclude(transcript),
                Err(e) => {
                    warn!(session = %self.runtime.id, "Cannot conclude at round limit: {}", e);
                    Step::Wait
                }
            };
        };
        if guard.session.status() != SessionStatus::Active {
            return Step::Wait;
        }
        let Some(context) = TurnContext::build(&guard.session, self.config.context_window) else {
            return Step::Wait;
        };
        if let Err(e) = guard.set_participant_status(&participant, ParticipantStatus::Thinking) {
            warn!(session = %self.runtime.id, "Cannot start turn: {}", e);
            return Step::Wait;
        }

        let token = self.runtime.shutdown.child_token();
        guard.in_flight = Some(token.clone());
        debug!(
            session = %self.runtime.id,
            participant = %participant,
            round = context.round,
            interventions = context.interventions.len(),
            "Turn started"
        );
        Step::Turn(PreparedTurn {
            participant,
            context,
            token,
        })
    }

    async fn execute(&self, turn: &PreparedTurn) -> TurnOutcome {
        let started = Instant::now();
        let call = self
            .gateway
            .generate_turn(&turn.context, turn.token.clone());

        let outcome = tokio::select! {
            biased;
            _ = turn.token.cancelled() => TurnOutcome::Cancelled,
            result = tokio::time::timeout(self.config.turn_timeout, call) => match result {
                Ok(outcome) => outcome,
                Err(_) => TurnOutcome::Failed(format!(
                    "no response within {}s",
                    self.config.turn_timeout.as_secs_f32()
                )),
            },
        };

        match outcome {
            TurnOutcome::Completed(mut completion) => {
                if completion.thinking_time_ms.is_none() {
                    completion.thinking_time_ms = Some(started.elapsed().as_millis() as u64);
                }
                TurnOutcome::Completed(completion)
            }
            other => other,
        }
    }

    /// Apply a turn outcome. Returns a backoff wait when the turn is retried.
    fn resolve(&self, turn: PreparedTurn, outcome: TurnOutcome) -> Option<(Duration, CancellationToken)> {
        let mut guard = self.runtime.lock();
        guard.in_flight = None;

        if guard.concluding || guard.session.status().is_terminal() || self.runtime.shutdown.is_cancelled() {
            debug!(session = %self.runtime.id, participant = %turn.participant, "Turn discarded");
            return None;
        }

        // A cancelled token wins over whatever the gateway managed to return
        let outcome = if turn.token.is_cancelled() {
            TurnOutcome::Cancelled
        } else {
            match outcome {
                TurnOutcome::Cancelled => {
                    TurnOutcome::Failed("gateway reported cancellation without a cancel request".into())
                }
                other => other,
            }
        };

        match outcome {
            TurnOutcome::Cancelled => {
                self.on_cancelled(&mut guard, &turn.participant);
                None
            }
            TurnOutcome::Completed(completion) if completion.content.trim().is_empty() => {
                info!(session = %self.runtime.id, participant = %turn.participant, "Blank turn skipped");
                if let Err(e) = guard.set_participant_status(&turn.participant, ParticipantStatus::Idle) {
                    warn!(session = %self.runtime.id, "{}", e);
                }
                self.advance(&mut guard);
                None
            }
            TurnOutcome::Completed(completion) => {
                self.on_completed(&mut guard, &turn, completion);
                None
            }
            TurnOutcome::Failed(reason) => self.on_failed(&mut guard, &turn.participant, &reason),
        }
    }

    fn on_cancelled(&self, guard: &mut SessionGuard<'_>, participant: &ParticipantId) {
        let before = guard.session.participant(participant).map(|p| p.status);
        match guard.session.record_turn_cancelled(participant) {
            Ok(()) => {
                debug!(session = %self.runtime.id, participant = %participant, "Turn cancelled");
                if before != Some(ParticipantStatus::Idle) {
                    guard.publish_status(participant, ParticipantStatus::Idle);
                }
            }
            Err(e) => warn!(session = %self.runtime.id, "{}", e),
        }
    }

    fn on_completed(&self, guard: &mut SessionGuard<'_>, turn: &PreparedTurn, completion: TurnCompletion) {
        let participant = &turn.participant;
        if let Err(e) = guard.set_participant_status(participant, ParticipantStatus::Responding) {
            warn!(session = %self.runtime.id, "{}", e);
            return;
        }

        let mut metadata = MessageMetadata::default();
        if let Some(confidence) = completion.confidence {
            metadata = metadata.with_confidence(confidence);
        }
        if let Some(tone) = completion.emotional_tone {
            metadata = metadata.with_emotional_tone(tone);
        }
        if let Some(ms) = completion.thinking_time_ms {
            metadata = metadata.with_thinking_time_ms(ms);
        }
        if let Some(reply_to) = completion.reply_to {
            if guard.session.has_message(&reply_to) {
                metadata = metadata.with_reply_to(reply_to);
            } else {
                warn!(session = %self.runtime.id, reply_to = %reply_to, "Dropping reply to unknown message");
            }
        }

        let appended = guard.session.append_agent_message(
            participant,
            completion.content,
            metadata,
            turn.context.interventions_high_water(),
        );
        let message = match appended {
            Ok(message) => message.clone(),
            Err(e) => {
                warn!(session = %self.runtime.id, "Message rejected: {}", e);
                return;
            }
        };
        debug!(
            session = %self.runtime.id,
            participant = %participant,
            sequence = message.sequence,
            "Message appended"
        );
        guard.message_appended(&message);

        if let Err(e) = guard.set_participant_status(participant, ParticipantStatus::Idle) {
            warn!(session = %self.runtime.id, "{}", e);
        }
        self.advance(guard);
    }

    fn on_failed(
        &self,
        guard: &mut SessionGuard<'_>,
        participant: &ParticipantId,
        reason: &str,
    ) -> Option<(Duration, CancellationToken)> {
        let before = guard.session.participant(participant).map(|p| p.status);
        let failures = match guard.session.record_turn_failure(participant) {
            Ok(n) => n,
            Err(e) => {
                warn!(session = %self.runtime.id, "{}", e);
                return None;
            }
        };
        if before != Some(ParticipantStatus::Error) {
            guard.publish_status(participant, ParticipantStatus::Error);
        }
        warn!(
            session = %self.runtime.id,
            participant = %participant,
            failures,
            "Turn failed: {}",
            reason
        );

        match self.config.retry.on_failure(failures) {
            FailureAction::Retry { attempt, backoff } => {
                debug!(
                    session = %self.runtime.id,
                    participant = %participant,
                    attempt,
                    "Retrying after {:?}",
                    backoff
                );
                let token = self.runtime.shutdown.child_token();
                guard.in_flight = Some(token.clone());
                Some((backoff, token))
            }
            FailureAction::Escalate => {
                self.escalate(guard, participant, failures, reason);
                None
            }
        }
    }

    /// Exhausted retries: resolve the turn, document the failure, then pause
    /// unless that was the final turn
    fn escalate(&self, guard: &mut SessionGuard<'_>, participant: &ParticipantId, failures: u32, reason: &str) {
        let name = guard
            .session
            .participant(participant)
            .map(|p| p.display_name())
            .unwrap_or_else(|| participant.to_string());
        let final_turn = self.advance(guard) == Some(TurnAdvance::MaxRoundsReached);
        let outlook = if final_turn {
            "That was the final turn; the discussion concludes."
        } else {
            "The discussion is paused; resume to continue with the next participant."
        };
        let note = format!(
            "{} failed {} consecutive attempts (last error: {}). {}",
            name, failures, reason, outlook
        );
        match guard.session.append_system_message(note) {
            Ok(message) => {
                let message = message.clone();
                guard.message_appended(&message);
            }
            Err(e) => warn!(session = %self.runtime.id, "{}", e),
        }

        if final_turn {
            warn!(session = %self.runtime.id, participant = %participant, "Final turn failed, concluding");
            return;
        }
        if guard.session.status() == SessionStatus::Active {
            if let Err(e) = guard.session.pause() {
                warn!(session = %self.runtime.id, "{}", e);
                return;
            }
            guard.persist_session();
            guard.publish(SessionEvent::SessionStatusChanged {
                session_id: self.runtime.id.clone(),
                status: SessionStatus::Paused,
                reason: Some(format!("{} exhausted its retries", name)),
            });
        }
        warn!(session = %self.runtime.id, participant = %participant, "Session paused after repeated failures");
    }

    /// Move the cursor past a resolved turn
    fn advance(&self, guard: &mut SessionGuard<'_>) -> Option<TurnAdvance> {
        let advance = match guard.session.advance_turn() {
            Ok(advance) => advance,
            Err(e) => {
                warn!(session = %self.runtime.id, "{}", e);
                return None;
            }
        };
        match advance {
            TurnAdvance::NextTurn => {}
            TurnAdvance::RoundCompleted(round) => {
                info!(session = %self.runtime.id, round, "Round completed");
                guard.persist_session();
            }
            TurnAdvance::MaxRoundsReached => guard.persist_session(),
        }
        guard.publish_progress();
        Some(advance)
    }

    async fn wait_backoff(&self, backoff: Duration, token: CancellationToken) {
        tokio::select! {
            _ = token.cancelled() => {
                debug!(session = %self.runtime.id, "Backoff interrupted");
            }
            _ = tokio::time::sleep(backoff) => {}
        }
        let mut guard = self.runtime.lock();
        guard.in_flight = None;
    }
}
