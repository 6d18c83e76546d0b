//! Progress reporting driven by session events
//!
//! Observers only render what the event stream tells them; the orchestrator
//! stays the single source of truth.

use crate::output::console::ConsoleFormatter;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use roundtable_application::SessionEvent;
use roundtable_domain::{Message, ParticipantId, ParticipantStatus, Sender, SessionStatus};
use std::collections::HashMap;
use tokio::sync::broadcast::{self, error::RecvError};

/// Receives a session's events in publication order
pub trait EventObserver {
    fn on_event(&self, event: &SessionEvent);

    /// The observer fell behind and `skipped` events were dropped
    fn on_lagged(&self, _skipped: u64) {}
}

/// Forward events to `observer` until the session's channel closes.
///
/// Returns the summary if a `session.concluded` event was seen.
pub async fn follow_events(
    mut events: broadcast::Receiver<SessionEvent>,
    observer: &dyn EventObserver,
) -> Option<String> {
    let mut summary = None;
    loop {
        match events.recv().await {
            Ok(event) => {
                if let SessionEvent::SessionConcluded { summary: text, .. } = &event {
                    summary = Some(text.clone());
                }
                observer.on_event(&event);
            }
            Err(RecvError::Lagged(skipped)) => observer.on_lagged(skipped),
            Err(RecvError::Closed) => break,
        }
    }
    summary
}

/// Wait until the session pauses itself after exhausted retries.
///
/// Returns the pause reason, or `None` once the channel closes. Operator
/// pauses carry no reason and are ignored.
pub async fn wait_for_auto_pause(mut events: broadcast::Receiver<SessionEvent>) -> Option<String> {
    loop {
        match events.recv().await {
            Ok(SessionEvent::SessionStatusChanged {
                status: SessionStatus::Paused,
                reason: Some(reason),
                ..
            }) => return Some(reason),
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => return None,
        }
    }
}

/// Display names keyed by participant id
pub type NameMap = HashMap<ParticipantId, String>;

fn sender_name(names: &NameMap, message: &Message) -> String {
    match &message.sender {
        Sender::Agent(id) => names.get(id).cloned().unwrap_or_else(|| id.to_string()),
        other => other.to_string(),
    }
}

/// Reports progress with an indicatif bar, printing messages above it
pub struct ProgressReporter {
    bar: ProgressBar,
    names: NameMap,
    show_messages: bool,
}

impl ProgressReporter {
    pub fn new(names: NameMap) -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(Self::turn_style());
        bar.set_prefix("Roundtable");
        Self {
            bar,
            names,
            show_messages: true,
        }
    }

    /// Print each appended message above the bar
    pub fn with_messages(mut self, show: bool) -> Self {
        self.show_messages = show;
        self
    }

    fn turn_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn name(&self, id: &ParticipantId) -> String {
        self.names.get(id).cloned().unwrap_or_else(|| id.to_string())
    }
}

impl EventObserver for ProgressReporter {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::SessionStarted {
                participants,
                max_rounds,
                ..
            } => {
                self.bar
                    .set_length(*max_rounds as u64 * participants.len() as u64);
                self.bar.set_message("Starting...");
                self.bar.enable_steady_tick(std::time::Duration::from_millis(120));
            }
            SessionEvent::ProgressUpdated { progress, .. } => {
                self.bar.set_length(progress.total_turns as u64);
                self.bar.set_position(progress.completed_turns as u64);
            }
            SessionEvent::ParticipantStatusChanged {
                participant_id,
                status,
                ..
            } => match status {
                ParticipantStatus::Thinking => self
                    .bar
                    .set_message(format!("{} is thinking...", self.name(participant_id))),
                ParticipantStatus::Error => self
                    .bar
                    .set_message(format!("{} {} failed", "x".red(), self.name(participant_id))),
                _ => {}
            },
            SessionEvent::MessageAppended { message, .. } => {
                if self.show_messages {
                    self.bar.println(format!(
                        "{}\n",
                        ConsoleFormatter::format_message(message, &sender_name(&self.names, message))
                    ));
                }
            }
            SessionEvent::SessionStatusChanged { status, reason, .. } => {
                let label = match status {
                    SessionStatus::Paused => "paused".yellow(),
                    SessionStatus::Active => "resumed".green(),
                    other => other.to_string().normal(),
                };
                match reason {
                    Some(reason) => self.bar.set_message(format!("{} ({})", label, reason)),
                    None => self.bar.set_message(label.to_string()),
                }
            }
            SessionEvent::SessionConcluded { .. } => {
                self.bar.finish_with_message(format!("{}", "concluded".green()));
            }
            SessionEvent::PersistenceDegraded { reason, .. } => {
                self.bar.println(format!(
                    "{} session storage failed, continuing in memory: {}",
                    "!".yellow().bold(),
                    reason
                ));
            }
        }
    }

    fn on_lagged(&self, skipped: u64) {
        self.bar
            .println(format!("{}", format!("({} events skipped)", skipped).dimmed()));
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress {
    names: NameMap,
}

impl SimpleProgress {
    pub fn new(names: NameMap) -> Self {
        Self { names }
    }
}

impl EventObserver for SimpleProgress {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::SessionStarted {
                topic, max_rounds, ..
            } => {
                println!("{} {} ({} rounds)", "->".cyan(), topic.bold(), max_rounds);
            }
            SessionEvent::MessageAppended { message, .. } => {
                println!(
                    "{}\n",
                    ConsoleFormatter::format_message(message, &sender_name(&self.names, message))
                );
            }
            SessionEvent::SessionStatusChanged { status, reason, .. } => {
                println!(
                    "{} session {}{}",
                    "->".cyan(),
                    status,
                    reason.as_deref().map(|r| format!(": {}", r)).unwrap_or_default()
                );
            }
            SessionEvent::SessionConcluded {
                rounds_completed,
                message_count,
                ..
            } => {
                println!(
                    "  {} concluded after {} rounds, {} messages",
                    "v".green(),
                    rounds_completed,
                    message_count
                );
            }
            SessionEvent::PersistenceDegraded { reason, .. } => {
                println!("  {} storage degraded: {}", "x".red(), reason);
            }
            _ => {}
        }
    }

    fn on_lagged(&self, skipped: u64) {
        println!("  ({} events skipped)", skipped);
    }
}

/// Observer that renders nothing (--quiet)
pub struct SilentProgress;

impl EventObserver for SilentProgress {
    fn on_event(&self, _event: &SessionEvent) {}
}
