use crate::output::console::ConsoleFormatter;
use colored::Colorize;
use roundtable_application::{CompletionGateway, DiscussionOrchestrator};
use roundtable_domain::{Impact, SessionId};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Pause,
    Resume,
    Conclude,
    Status,
    Impact(Impact),
    Help,
    Quit,
    /// Free text sent to the room
    Note(String),
    /// Blank line
    Empty,
    /// Unknown command or bad argument, with the message to show
    Invalid(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ConsoleCommand::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ConsoleCommand::Note(line.to_string());
        };
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        match name.to_lowercase().as_str() {
            "pause" | "p" => ConsoleCommand::Pause,
            "resume" | "r" => ConsoleCommand::Resume,
            "conclude" | "c" | "end" => ConsoleCommand::Conclude,
            "status" | "s" => ConsoleCommand::Status,
            "help" | "h" | "?" => ConsoleCommand::Help,
            "quit" | "q" | "exit" => ConsoleCommand::Quit,
            "impact" | "i" => match arg.parse::<Impact>() {
                Ok(impact) => ConsoleCommand::Impact(impact),
                Err(_) => ConsoleCommand::Invalid("usage: /impact <low|medium|high>".to_string()),
            },
            other => ConsoleCommand::Invalid(format!("unknown command '/{}', try /help", other)),
        }
    }
}

/// Why the console stopped reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// The session concluded
    SessionEnded,
    /// `/quit` was entered
    Quit,
    /// Input was closed
    Eof,
}

/// Operator console bound to one running session
pub struct InteractiveConsole<G: CompletionGateway + 'static> {
    orchestrator: Arc<DiscussionOrchestrator<G>>,
    session_id: SessionId,
    impact: Impact,
}

impl<G: CompletionGateway + 'static> InteractiveConsole<G> {
    pub fn new(orchestrator: Arc<DiscussionOrchestrator<G>>, session_id: SessionId) -> Self {
        Self {
            orchestrator,
            session_id,
            impact: Impact::default(),
        }
    }

    /// Read and execute lines until `/quit`, end of input, or `ended` fires
    pub async fn run<R: AsyncBufRead + Unpin>(
        &mut self,
        input: R,
        ended: CancellationToken,
    ) -> ConsoleExit {
        self.print_welcome();
        let mut lines = input.lines();
        loop {
            let line = tokio::select! {
                biased;
                _ = ended.cancelled() => return ConsoleExit::SessionEnded,
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) => {
                    if let Some(exit) = self.handle(ConsoleCommand::parse(&line)).await {
                        return exit;
                    }
                }
                Ok(None) => return ConsoleExit::Eof,
                Err(e) => {
                    eprintln!("{} {}", "Input error:".red(), e);
                    return ConsoleExit::Eof;
                }
            }
        }
    }

    /// Execute one command. Returns `Some` when the console should stop.
    pub async fn handle(&mut self, command: ConsoleCommand) -> Option<ConsoleExit> {
        let id = self.session_id.clone();
        let result = match command {
            ConsoleCommand::Empty => Ok(()),
            ConsoleCommand::Help => {
                self.print_help();
                Ok(())
            }
            ConsoleCommand::Quit => return Some(ConsoleExit::Quit),
            ConsoleCommand::Invalid(message) => {
                println!("{}", message.yellow());
                Ok(())
            }
            ConsoleCommand::Impact(impact) => {
                self.impact = impact;
                println!("{} notes now carry {} impact", "->".cyan(), impact);
                Ok(())
            }
            ConsoleCommand::Pause => self.orchestrator.pause_session(&id),
            ConsoleCommand::Resume => self.orchestrator.resume_session(&id),
            ConsoleCommand::Conclude => {
                println!("{} writing the summary...", "->".cyan());
                self.orchestrator.conclude_session(&id).await.map(|_| ())
            }
            ConsoleCommand::Status => self.orchestrator.get_session(&id).map(|session| {
                let progress = roundtable_domain::DiscussionProgress::calculate(&session);
                println!(
                    "{}",
                    ConsoleFormatter::format_status(session.status(), &progress)
                );
            }),
            ConsoleCommand::Note(text) => self
                .orchestrator
                .submit_human_message(&id, &text, self.impact)
                .map(|_| ()),
        };
        if let Err(e) = result {
            println!("{} {}", "x".red(), e);
        }
        None
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Interactive mode: type a note to add it to the discussion.".bold());
        println!("{}", "Commands: /pause /resume /conclude /status /impact <level> /help /quit".dimmed());
        println!();
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Commands:".cyan().bold());
        println!("  /pause            Stop after (or instead of) the current turn");
        println!("  /resume           Continue with the pending participant");
        println!("  /conclude         Stop and write the summary");
        println!("  /status           Show round and turn progress");
        println!("  /impact <level>   Weight of later notes: low, medium, high (now {})", self.impact);
        println!("  /help             Show this help");
        println!("  /quit             Leave without a summary");
        println!();
        println!("Any other line is sent to the room as a note.");
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use roundtable_application::{
        GatewayError, SessionEvent, StartSessionInput, TurnOutcome,
    };
    use roundtable_domain::{
        ParticipantConfig, ParticipantRole, Sender, SessionStatus, Transcript, TurnContext,
    };

    /// Turns never finish on their own
    struct StallingGateway;

    #[async_trait]
    impl CompletionGateway for StallingGateway {
        async fn generate_turn(&self, _ctx: &TurnContext, cancel: CancellationToken) -> TurnOutcome {
            cancel.cancelled().await;
            TurnOutcome::Cancelled
        }

        async fn generate_summary(&self, _transcript: &Transcript) -> Result<String, GatewayError> {
            Ok("Console summary.".to_string())
        }
    }

    async fn running_session() -> (Arc<DiscussionOrchestrator<StallingGateway>>, SessionId) {
        let orchestrator = Arc::new(DiscussionOrchestrator::new(Arc::new(StallingGateway)));
        let handle = orchestrator
            .start_session(StartSessionInput::new(
                "A map that redraws itself",
                vec![
                    ParticipantConfig::new(ParticipantRole::Writer),
                    ParticipantConfig::new(ParticipantRole::Editor),
                ],
            ))
            .await
            .unwrap();
        (orchestrator, handle.session_id)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ConsoleCommand::parse("  "), ConsoleCommand::Empty);
        assert_eq!(ConsoleCommand::parse("/PAUSE"), ConsoleCommand::Pause);
        assert_eq!(ConsoleCommand::parse("/r"), ConsoleCommand::Resume);
        assert_eq!(ConsoleCommand::parse("/end"), ConsoleCommand::Conclude);
        assert_eq!(ConsoleCommand::parse("/impact high"), ConsoleCommand::Impact(Impact::High));
        assert!(matches!(ConsoleCommand::parse("/impact"), ConsoleCommand::Invalid(_)));
        assert!(matches!(ConsoleCommand::parse("/dance"), ConsoleCommand::Invalid(_)));
        assert_eq!(
            ConsoleCommand::parse(" Make the map older "),
            ConsoleCommand::Note("Make the map older".to_string())
        );
    }

    #[tokio::test]
    async fn test_notes_carry_selected_impact() {
        let (orchestrator, id) = running_session().await;
        let mut console = InteractiveConsole::new(orchestrator.clone(), id.clone());
        let input: &[u8] = b"The ink is alive\n/impact low\nKeep it quiet\n/pause\n/status\n/quit\n";

        let exit = console.run(input, CancellationToken::new()).await;
        assert_eq!(exit, ConsoleExit::Quit);

        let session = orchestrator.get_session(&id).unwrap();
        assert_eq!(session.status(), SessionStatus::Paused);
        let notes: Vec<_> = session
            .messages()
            .iter()
            .filter(|m| m.sender == Sender::Human)
            .map(|m| (m.content.as_str(), m.metadata.impact))
            .collect();
        assert_eq!(
            notes,
            vec![
                ("The ink is alive", Some(Impact::Medium)),
                ("Keep it quiet", Some(Impact::Low)),
            ]
        );
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn test_conclude_and_end_of_input() {
        let (orchestrator, id) = running_session().await;
        let mut events = orchestrator.subscribe(&id).unwrap();
        let mut console = InteractiveConsole::new(orchestrator.clone(), id.clone());

        let exit = console.run(&b"/conclude\n"[..], CancellationToken::new()).await;
        assert_eq!(exit, ConsoleExit::Eof);

        let session = orchestrator.get_session(&id).unwrap();
        assert_eq!(session.status(), SessionStatus::Concluded);
        assert_eq!(session.summary(), Some("Console summary."));

        let mut concluded = false;
        while let Ok(event) = events.recv().await {
            concluded |= matches!(event, SessionEvent::SessionConcluded { .. });
        }
        assert!(concluded);
    }

    #[tokio::test]
    async fn test_rejected_commands_keep_console_open() {
        let (orchestrator, id) = running_session().await;
        let mut console = InteractiveConsole::new(orchestrator.clone(), id.clone());
        // Resuming an active session is rejected; the console keeps going
        assert_eq!(console.handle(ConsoleCommand::Resume).await, None);
        assert_eq!(console.handle(ConsoleCommand::Note("   ".into())).await, None);
        assert_eq!(orchestrator.get_session(&id).unwrap().status(), SessionStatus::Active);
        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn test_session_end_stops_reading() {
        let (orchestrator, id) = running_session().await;
        let mut console = InteractiveConsole::new(orchestrator.clone(), id);
        let ended = CancellationToken::new();
        ended.cancel();
        // Input that never produces a line
        let (_writer, reader) = tokio::io::duplex(64);
        let exit = console.run(tokio::io::BufReader::new(reader), ended).await;
        assert_eq!(exit, ConsoleExit::SessionEnded);
        orchestrator.shutdown().await;
    }
}
