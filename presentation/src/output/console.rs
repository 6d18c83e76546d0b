//! Console output formatter for discussion sessions

use colored::Colorize;
use roundtable_domain::{
    DiscussionProgress, DiscussionSession, Message, Sender, SessionStatus, SessionSummary,
    Transcript,
};

/// Formats sessions and messages for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Full transcript followed by the summary
    pub fn format_transcript(session: &DiscussionSession) -> String {
        let transcript = Transcript::of(session);
        let mut output = String::new();

        output.push_str(&Self::header("Writers' Roundtable"));
        output.push('\n');
        output.push_str(&Self::session_info(session, &transcript));

        output.push_str(&Self::section_header("Discussion"));
        if transcript.is_empty() {
            output.push_str(&format!("\n{}\n", "(nobody spoke)".dimmed()));
        }
        for message in &transcript.messages {
            output.push('\n');
            output.push_str(&Self::format_message(message, &transcript.sender_name(message)));
            output.push('\n');
        }

        output.push_str(&Self::section_header("Summary"));
        output.push_str(&format!(
            "\n{}\n",
            session.summary().unwrap_or("(not concluded)")
        ));

        output.push_str(&Self::footer());
        output
    }

    /// Concise output: topic and summary only
    pub fn format_summary(session: &DiscussionSession) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}\n\n",
            "=== Roundtable Summary ===".cyan().bold()
        ));
        output.push_str(&format!("{} {}\n", "Topic:".bold(), session.topic()));
        output.push_str(&format!(
            "{} {} of {} rounds, {} messages\n\n",
            "Covered:".dimmed(),
            session.current_round(),
            session.max_rounds(),
            session.messages().len()
        ));
        output.push_str(session.summary().unwrap_or("(not concluded)"));
        output.push('\n');
        output
    }

    /// The session as pretty-printed JSON
    pub fn format_json(session: &DiscussionSession) -> String {
        serde_json::to_string_pretty(session).unwrap_or_else(|_| "{}".to_string())
    }

    /// One message with a colored header line
    pub fn format_message(message: &Message, sender_name: &str) -> String {
        let round = message
            .metadata
            .round
            .map(|r| format!(" · round {}", r + 1))
            .unwrap_or_default();
        let title = format!("── [{}] {}{} ──", message.sequence, sender_name, round);
        let title = match &message.sender {
            Sender::Agent(_) => title.yellow().bold(),
            Sender::Human => title.green().bold(),
            Sender::System => title.red().bold(),
        };

        let mut details = Vec::new();
        if let Some(impact) = message.metadata.impact {
            details.push(format!("impact: {}", impact));
        }
        if let Some(tone) = &message.metadata.emotional_tone {
            details.push(format!("tone: {}", tone));
        }
        if let Some(confidence) = message.metadata.confidence {
            details.push(format!("confidence: {:.0}%", confidence * 100.0));
        }

        let mut output = title.to_string();
        if !details.is_empty() {
            output.push_str(&format!(" {}", details.join(", ").dimmed()));
        }
        output.push('\n');
        output.push_str(&Self::indent(&message.content, "  "));
        output
    }

    /// One line of round and turn progress
    pub fn format_status(status: SessionStatus, progress: &DiscussionProgress) -> String {
        let status = match status {
            SessionStatus::Active => status.to_string().green(),
            SessionStatus::Paused => status.to_string().yellow(),
            _ => status.to_string().normal(),
        };
        let speakers = progress
            .participants
            .iter()
            .map(|p| format!("{} {}", p.participant_id, p.messages))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} round {}/{}, turn {}/{} ({}%) [{}]",
            status,
            (progress.current_round + 1).min(progress.max_rounds),
            progress.max_rounds,
            progress.completed_turns,
            progress.total_turns,
            progress.percent(),
            speakers
        )
    }

    /// Table of stored sessions
    pub fn format_session_list(sessions: &[SessionSummary]) -> String {
        if sessions.is_empty() {
            return format!("{}\n", "No stored sessions.".dimmed());
        }
        let mut output = String::new();
        for summary in sessions {
            output.push_str(&format!(
                "{} {:<10} {:>2}/{:<2} {:>4} msgs  {}  {}\n",
                summary.id.to_string().cyan(),
                summary.status.to_string(),
                summary.current_round,
                summary.max_rounds,
                summary.message_count,
                summary.created_at.format("%Y-%m-%d %H:%M"),
                summary.topic
            ));
        }
        output
    }

    fn session_info(session: &DiscussionSession, transcript: &Transcript) -> String {
        let names = transcript
            .participants
            .iter()
            .map(|s| format!("{} ({})", s.display_name, s.role))
            .collect::<Vec<_>>()
            .join(", ");
        let mut output = format!("{} {}\n", "Topic:".cyan().bold(), session.topic());
        output.push_str(&format!("{} {}\n", "Type:".cyan().bold(), session.session_type()));
        if let Some(project) = session.project_id() {
            output.push_str(&format!("{} {}\n", "Project:".cyan().bold(), project));
        }
        output.push_str(&format!("{} {}\n", "Participants:".cyan().bold(), names));
        output.push_str(&format!(
            "{} {} of {}\n",
            "Rounds:".cyan().bold(),
            session.current_round(),
            session.max_rounds()
        ));
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
