//! Progress calculator.
//!
//! [`DiscussionProgress`] is derived from a session snapshot and never
//! stored; recomputing it has no side effects.

use crate::core::ids::ParticipantId;
use crate::session::entities::DiscussionSession;
use serde::{Deserialize, Serialize};

/// Progress of one participant: authored messages against the round limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantProgress {
    pub participant_id: ParticipantId,
    pub messages: usize,
    /// `messages / max_rounds`, capped at 1.0
    pub ratio: f64,
}

/// Completion state of a discussion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionProgress {
    pub current_round: u32,
    pub max_rounds: u32,
    pub completed_turns: usize,
    pub total_turns: usize,
    /// `completed_turns / total_turns`
    pub overall: f64,
    pub participants: Vec<ParticipantProgress>,
}

impl DiscussionProgress {
    pub fn calculate(session: &DiscussionSession) -> Self {
        let max_rounds = session.max_rounds();
        let roster = session.participants();
        let total_turns = max_rounds as usize * roster.len();
        let completed_turns =
            (session.current_round() as usize * roster.len() + session.turn_cursor()).min(total_turns);

        let participants = roster
            .iter()
            .map(|p| {
                let messages = session
                    .messages()
                    .iter()
                    .filter(|m| m.sender.is_agent(&p.id))
                    .count();
                ParticipantProgress {
                    participant_id: p.id.clone(),
                    messages,
                    ratio: ratio(messages, max_rounds as usize),
                }
            })
            .collect();

        Self {
            current_round: session.current_round(),
            max_rounds,
            completed_turns,
            total_turns,
            overall: ratio(completed_turns, total_turns),
            participants,
        }
    }

    pub fn percent(&self) -> u8 {
        (self.overall * 100.0).round() as u8
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::SessionId;
    use crate::core::topic::Topic;
    use crate::participant::entities::ParticipantConfig;
    use crate::participant::role::ParticipantRole;
    use crate::session::entities::SessionType;
    use crate::session::message::MessageMetadata;

    fn session() -> DiscussionSession {
        let mut s = DiscussionSession::new(
            SessionId::new("p"),
            None,
            Topic::try_new("Heist on the moon").unwrap(),
            SessionType::PlotCreation,
            vec![
                ParticipantConfig::new(ParticipantRole::Writer),
                ParticipantConfig::new(ParticipantRole::Editor),
            ],
            2,
        )
        .unwrap();
        s.start().unwrap();
        s
    }

    #[test]
    fn test_fresh_session_has_no_progress() {
        let progress = DiscussionProgress::calculate(&session());
        assert_eq!(progress.total_turns, 4);
        assert_eq!(progress.completed_turns, 0);
        assert_eq!(progress.overall, 0.0);
        assert!(progress.participants.iter().all(|p| p.ratio == 0.0));
    }

    fn of<'a>(progress: &'a DiscussionProgress, id: &str) -> &'a ParticipantProgress {
        progress
            .participants
            .iter()
            .find(|p| p.participant_id.as_str() == id)
            .unwrap()
    }

    #[test]
    fn test_progress_tracks_turns_and_authors() {
        let mut s = session();
        let writer = ParticipantId::new("writer");
        s.append_agent_message(&writer, "one".into(), MessageMetadata::default(), None)
            .unwrap();
        s.advance_turn().unwrap();
        s.append_human_message("nudge".into(), MessageMetadata::default())
            .unwrap();

        let progress = DiscussionProgress::calculate(&s);
        assert_eq!(progress.completed_turns, 1);
        assert_eq!(progress.overall, 0.25);
        assert_eq!(of(&progress, "writer").ratio, 0.5);
        assert_eq!(of(&progress, "editor").messages, 0);
        assert_eq!(progress.percent(), 25);
    }

    #[test]
    fn test_participant_ratio_is_capped() {
        let mut s = session();
        let writer = ParticipantId::new("writer");
        for _ in 0..5 {
            s.append_agent_message(&writer, "again".into(), MessageMetadata::default(), None)
                .unwrap();
        }
        let progress = DiscussionProgress::calculate(&s);
        assert_eq!(of(&progress, "writer").ratio, 1.0);
    }

    #[test]
    fn test_full_run_is_complete() {
        let mut s = session();
        for _ in 0..4 {
            s.advance_turn().unwrap();
        }
        let progress = DiscussionProgress::calculate(&s);
        assert_eq!(progress.overall, 1.0);
        assert_eq!(progress.completed_turns, progress.total_turns);
        assert_eq!(progress.percent(), 100);
    }
}
