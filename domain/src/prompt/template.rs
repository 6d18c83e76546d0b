//! Prompt templates for discussion turns and summaries

use crate::context::{Speaker, Transcript, TurnContext};
use crate::util::truncate_str;

/// Longest slice of a single message quoted back into a prompt
const MAX_QUOTED_BYTES: usize = 4_000;

/// Templates for rendering contexts into chat prompts
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt describing the speaker's persona
    pub fn turn_system(speaker: &Speaker) -> String {
        let mut prompt = format!(
            r#"You are {name}, the {role} in a writers' room discussion.
Your duty: {duty}
Stay in character. Respond with a single contribution of a few paragraphs at most.
Build on what others said; do not repeat earlier points verbatim."#,
            name = speaker.display_name,
            role = speaker.role.display_name(),
            duty = speaker.role.duty(),
        );

        let dominant = speaker.personality.traits.dominant();
        if !dominant.is_empty() {
            prompt.push_str(&format!(
                "\nYour strongest traits: {}.",
                dominant.join(", ")
            ));
        }
        if let Some(style) = &speaker.personality.style {
            prompt.push_str(&format!("\nVoice and style: {}", style));
        }
        prompt
    }

    /// User prompt for one turn
    pub fn turn_prompt(ctx: &TurnContext) -> String {
        let mut prompt = format!(
            "Topic ({}): {}\nRound {} of {}.\n",
            ctx.session_type,
            ctx.topic,
            ctx.round + 1,
            ctx.max_rounds
        );

        let others: Vec<_> = ctx
            .roster
            .iter()
            .filter(|s| s.id != ctx.speaker.id)
            .map(|s| format!("{} ({})", s.display_name, s.role))
            .collect();
        prompt.push_str(&format!("At the table with you: {}\n", others.join(", ")));

        if ctx.recent_messages.is_empty() {
            prompt.push_str("\nNobody has spoken yet. Open the discussion.\n");
        } else {
            prompt.push_str("\nDiscussion so far:\n");
            for message in &ctx.recent_messages {
                prompt.push_str(&format!(
                    "\n[{}] {}:\n{}\n",
                    message.sequence,
                    ctx.sender_name(message),
                    truncate_str(&message.content, MAX_QUOTED_BYTES)
                ));
            }
        }

        if !ctx.interventions.is_empty() {
            prompt.push_str("\nThe human lead has asked the room to take the following into account (most important first):\n");
            for intervention in &ctx.interventions {
                prompt.push_str(&format!(
                    "- ({} priority) {}\n",
                    intervention.impact,
                    truncate_str(&intervention.message.content, MAX_QUOTED_BYTES)
                ));
            }
        }

        if ctx.is_final_round() {
            prompt.push_str("\nThis is the final round: steer toward conclusions.\n");
        }

        prompt.push_str(&format!("\nNow give your contribution as {}.", ctx.speaker.display_name));
        prompt
    }

    /// System prompt for summary generation
    pub fn summary_system() -> &'static str {
        r#"You are the secretary of a writers' room.
Your task is to summarize a discussion faithfully: the ideas proposed, the objections raised,
the decisions reached and the open questions left. Do not invent content that was not said."#
    }

    /// User prompt for summary generation
    pub fn summary_prompt(transcript: &Transcript) -> String {
        let mut prompt = format!(
            "Topic ({}): {}\nRounds completed: {} of {}\n\nTranscript:\n",
            transcript.session_type,
            transcript.topic,
            transcript.rounds_completed,
            transcript.max_rounds
        );
        for message in &transcript.messages {
            prompt.push_str(&format!(
                "\n[{}] {}:\n{}\n",
                message.sequence,
                transcript.sender_name(message),
                truncate_str(&message.content, MAX_QUOTED_BYTES)
            ));
        }
        prompt.push_str(
            r#"
Write the summary with these sections:
## Key Ideas
## Decisions
## Open Questions"#,
        );
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{ParticipantId, SessionId};
    use crate::core::topic::Topic;
    use crate::participant::entities::ParticipantConfig;
    use crate::participant::persona::{Personality, TraitWeights};
    use crate::participant::role::ParticipantRole;
    use crate::session::entities::{DiscussionSession, SessionType};
    use crate::session::message::{Impact, MessageMetadata};

    fn session() -> DiscussionSession {
        let writer = ParticipantConfig::new(ParticipantRole::Writer).with_personality(
            Personality::default()
                .with_display_name("Ines")
                .with_style("lyrical")
                .with_traits(TraitWeights {
                    creativity: 0.9,
                    ..Default::default()
                }),
        );
        let mut s = DiscussionSession::new(
            SessionId::new("t"),
            None,
            Topic::try_new("Orchard at the end of the world").unwrap(),
            SessionType::Feedback,
            vec![writer, ParticipantConfig::new(ParticipantRole::Editor)],
            1,
        )
        .unwrap();
        s.start().unwrap();
        s
    }

    #[test]
    fn test_turn_system_includes_persona() {
        let ctx = TurnContext::build(&session(), 10).unwrap();
        let system = PromptTemplate::turn_system(&ctx.speaker);
        assert!(system.contains("You are Ines, the Writer"));
        assert!(system.contains("creativity"));
        assert!(system.contains("lyrical"));
    }

    #[test]
    fn test_turn_prompt_opening_and_final_round() {
        let ctx = TurnContext::build(&session(), 10).unwrap();
        let prompt = PromptTemplate::turn_prompt(&ctx);
        assert!(prompt.contains("Topic (feedback): Orchard at the end of the world"));
        assert!(prompt.contains("Nobody has spoken yet"));
        assert!(prompt.contains("Editor (editor)"));
        assert!(prompt.contains("final round"));
    }

    #[test]
    fn test_turn_prompt_lists_interventions() {
        let mut s = session();
        s.append_human_message(
            "Kill the narrator".into(),
            MessageMetadata::default().with_impact(Impact::High),
        )
        .unwrap();
        let ctx = TurnContext::build(&s, 10).unwrap();
        let prompt = PromptTemplate::turn_prompt(&ctx);
        assert!(prompt.contains("(high priority) Kill the narrator"));
        assert!(prompt.contains("[0] human"));
    }

    #[test]
    fn test_summary_prompt_contains_transcript() {
        let mut s = session();
        s.append_agent_message(
            &ParticipantId::new("writer"),
            "The orchard blooms in winter.".into(),
            MessageMetadata::default(),
            None,
        )
        .unwrap();
        let prompt = PromptTemplate::summary_prompt(&Transcript::of(&s));
        assert!(prompt.contains("[0] Ines:\nThe orchard blooms in winter."));
        assert!(prompt.contains("## Open Questions"));
    }
}
