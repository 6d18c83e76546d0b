//! Conclusion path shared by `conclude_session` and the round limit.
//!
//! Conclusion runs in two steps. [`begin`] claims the session under the
//! lock, cancels whatever is in flight and snapshots the transcript.
//! [`finish`] awaits the summary outside the lock and then applies the
//! terminal transition. A failed, blank or timed-out summary is replaced by
//! [`fallback_summary`], so a claimed session always ends up concluded.

use chrono::Utc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::session_runtime::{SessionGuard, SessionRuntime};
use crate::events::SessionEvent;
use crate::ports::completion_gateway::CompletionGateway;
use roundtable_domain::util::preview;
use roundtable_domain::{
    DiscussionSession, DomainError, ParticipantStatus, SessionCommand, Transcript,
};

/// Characters of each participant's last contribution quoted in a fallback summary
const FALLBACK_QUOTE_CHARS: usize = 160;

/// Claim the session for conclusion and snapshot its transcript.
///
/// Fails if the session is already concluded or another conclusion is
/// running.
pub(crate) fn begin(guard: &mut SessionGuard<'_>) -> Result<Transcript, DomainError> {
    if guard.concluding {
        return Err(DomainError::InvalidTransition {
            status: guard.session.status(),
            command: SessionCommand::Conclude,
        });
    }
    guard.session.check(SessionCommand::Conclude)?;
    guard.concluding = true;
    guard.cancel_in_flight();
    Ok(Transcript::of(&guard.session))
}

/// Generate the summary and move the session to `concluded`
pub(crate) async fn finish<G: CompletionGateway + ?Sized>(
    runtime: &SessionRuntime,
    gateway: &G,
    transcript: Transcript,
    summary_timeout: Duration,
) -> DiscussionSession {
    let generated = tokio::select! {
        _ = runtime.shutdown.cancelled() => None,
        result = tokio::time::timeout(summary_timeout, gateway.generate_summary(&transcript)) => {
            match result {
                Ok(Ok(summary)) if !summary.trim().is_empty() => Some(summary),
                Ok(Ok(_)) => {
                    warn!(session = %runtime.id, "Summary was blank, composing fallback");
                    None
                }
                Ok(Err(e)) => {
                    warn!(session = %runtime.id, "Summary generation failed: {}", e);
                    None
                }
                Err(_) => {
                    warn!(session = %runtime.id, "Summary generation timed out after {:?}", summary_timeout);
                    None
                }
            }
        }
    };
    let summary = generated.unwrap_or_else(|| fallback_summary(&transcript));

    let concluded = {
        let mut guard = runtime.lock();
        let before: Vec<_> = guard
            .session
            .participants()
            .iter()
            .map(|p| (p.id.clone(), p.status))
            .collect();

        if let Err(e) = guard.session.conclude(summary.clone()) {
            error!(session = %runtime.id, "Conclusion rejected: {}", e);
        }
        guard.in_flight = None;

        for (id, status) in before {
            if status != ParticipantStatus::Finished {
                guard.publish_status(&id, ParticipantStatus::Finished);
            }
        }
        guard.persist_session();
        guard.publish_progress();
        guard.publish(SessionEvent::SessionConcluded {
            session_id: runtime.id.clone(),
            summary,
            rounds_completed: guard.session.current_round(),
            message_count: guard.session.messages().len(),
            timestamp: Utc::now(),
        });
        guard.session.clone()
    };

    runtime.close_events();
    runtime.wake.notify_one();
    info!(
        session = %runtime.id,
        rounds = concluded.current_round(),
        messages = concluded.messages().len(),
        "Session concluded"
    );
    concluded
}

/// Summary composed locally from the transcript
pub fn fallback_summary(transcript: &Transcript) -> String {
    let mut summary = format!(
        "Discussion on \"{}\" ({}) ended after {} of {} rounds",
        transcript.topic, transcript.session_type, transcript.rounds_completed, transcript.max_rounds
    );
    if transcript.is_empty() {
        summary.push_str(" before anyone contributed.");
        return summary;
    }
    summary.push_str(&format!(" with {} messages.", transcript.messages.len()));

    for speaker in &transcript.participants {
        let last = transcript
            .messages
            .iter()
            .rev()
            .find(|m| m.sender.is_agent(&speaker.id));
        if let Some(message) = last {
            summary.push_str(&format!(
                "\n- {}: {}",
                speaker.display_name,
                preview(&message.content, FALLBACK_QUOTE_CHARS)
            ));
        }
    }

    let interventions = transcript.messages.iter().filter(|m| m.sender.is_human()).count();
    if interventions > 0 {
        summary.push_str(&format!("\nHuman interventions: {}", interventions));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::{
        MessageMetadata, ParticipantConfig, ParticipantId, ParticipantRole, SessionId,
        SessionType, Topic,
    };

    fn session() -> DiscussionSession {
        let mut session = DiscussionSession::new(
            SessionId::new("s1"),
            None,
            Topic::try_new("A harbour town in winter").unwrap(),
            SessionType::Feedback,
            vec![
                ParticipantConfig::new(ParticipantRole::Writer),
                ParticipantConfig::new(ParticipantRole::Editor),
            ],
            3,
        )
        .unwrap();
        session.start().unwrap();
        session
    }

    #[test]
    fn test_fallback_for_empty_transcript() {
        let summary = fallback_summary(&Transcript::of(&session()));
        assert_eq!(
            summary,
            "Discussion on \"A harbour town in winter\" (feedback) ended after 0 of 3 rounds before anyone contributed."
        );
    }

    #[test]
    fn test_fallback_quotes_last_contributions() {
        let mut session = session();
        let writer = ParticipantId::new("writer");
        session
            .append_agent_message(&writer, "First draft.".into(), MessageMetadata::default(), None)
            .unwrap();
        session
            .append_human_message("Colder, please.".into(), MessageMetadata::default())
            .unwrap();
        session
            .append_agent_message(&writer, "Second\ndraft.".into(), MessageMetadata::default(), None)
            .unwrap();

        let summary = fallback_summary(&Transcript::of(&session));
        assert!(summary.contains("with 3 messages."));
        assert!(summary.contains("- Writer: Second draft."));
        assert!(!summary.contains("First draft."));
        assert!(!summary.contains("- Editor"));
        assert!(summary.ends_with("Human interventions: 1"));
    }
}
