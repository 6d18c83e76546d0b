//! CLI entrypoint for writers-roundtable
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use colored::Colorize;
use roundtable_application::{CompletionGateway, DiscussionOrchestrator, StartSessionInput};
use roundtable_domain::{ParticipantConfig, SessionId, SessionStatus};
use roundtable_infrastructure::{ConfigLoader, FileConfig, build_gateway, build_repository};
use roundtable_presentation::{
    Cli, ConsoleExit, ConsoleFormatter, EventObserver, InteractiveConsole, NameMap, OutputConfig,
    OutputFormat, ProgressMode, ProgressReporter, SilentProgress, SimpleProgress, follow_events,
    parse_participant, wait_for_auto_pause,
};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

type Orchestrator = DiscussionOrchestrator<Box<dyn CompletionGateway>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("failed to load configuration: {}", e))?
    };

    let log_guard = init_logging(cli.verbose, config.logging.file.as_deref())?;
    info!("Starting writers-roundtable");

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }
    check_config(&config)?;
    if !config.output.color {
        colored::control::set_override(false);
    }

    // === Dependency Injection ===
    let repository = build_repository(&config.persistence)?;
    let gateway = Arc::new(build_gateway(&config.gateway, cli.offline || cli.list)?);
    let orchestrator = Arc::new(DiscussionOrchestrator::with_config(
        gateway,
        repository,
        config.to_orchestrator_config(),
    ));

    let project = cli.project.clone().or_else(|| config.discussion.project.clone());

    if cli.list {
        let sessions = orchestrator.list_sessions(project.as_deref());
        print!("{}", ConsoleFormatter::format_session_list(&sessions));
        return Ok(());
    }

    let topic = match cli.topic.clone() {
        Some(topic) => topic,
        None => bail!("A topic is required. Use --list to show stored sessions."),
    };

    let mut input = StartSessionInput::new(topic, participants(&cli, &config)?)
        .with_session_type(
            cli.session_type
                .unwrap_or_else(|| config.discussion.parse_session_type().0),
        );
    if let Some(rounds) = cli.rounds {
        input = input.with_max_rounds(rounds);
    }
    if let Some(project) = project {
        input = input.with_project(project);
    }

    let output = OutputConfig::resolve(
        cli.output,
        config.output.format.as_deref(),
        config.output.color,
        cli.quiet,
        cli.interactive,
    );

    let handle = orchestrator.start_session(input).await?;
    let session_id = handle.session_id;
    let events = handle.events;
    let names: NameMap = orchestrator
        .get_session(&session_id)?
        .participants()
        .iter()
        .map(|p| (p.id.clone(), p.display_name()))
        .collect();

    let observer: Box<dyn EventObserver> = match output.progress {
        ProgressMode::Bar => Box::new(ProgressReporter::new(names).with_messages(output.live_messages)),
        ProgressMode::Lines => Box::new(SimpleProgress::new(names)),
        ProgressMode::Silent => Box::new(SilentProgress),
    };

    // Without a console nobody can resume an automatic pause
    let auto_pauses = if cli.interactive {
        None
    } else {
        Some(orchestrator.subscribe(&session_id)?)
    };

    let ended = CancellationToken::new();
    let follow = async {
        follow_events(events, observer.as_ref()).await;
        ended.cancel();
    };
    let control = async {
        if cli.interactive {
            let mut console = InteractiveConsole::new(orchestrator.clone(), session_id.clone());
            let exit = tokio::select! {
                exit = console.run(BufReader::new(tokio::io::stdin()), ended.clone()) => exit,
                _ = tokio::signal::ctrl_c() => {
                    conclude_on_interrupt(&orchestrator, &session_id).await;
                    ConsoleExit::SessionEnded
                }
            };
            match exit {
                ConsoleExit::Quit => {
                    if let Err(e) = orchestrator.pause_session(&session_id) {
                        warn!("Could not pause before quitting: {}", e);
                    }
                    orchestrator.shutdown().await;
                    return;
                }
                ConsoleExit::Eof => info!("Input closed, letting the discussion finish"),
                ConsoleExit::SessionEnded => {}
            }
        }
        let auto_paused = async move {
            match auto_pauses {
                Some(events) => wait_for_auto_pause(events).await,
                None => None,
            }
        };
        tokio::select! {
            _ = ended.cancelled() => {}
            Some(reason) = auto_paused => {
                eprintln!(
                    "{} {}; concluding with the transcript so far",
                    "!".yellow().bold(),
                    reason
                );
                if let Err(e) = orchestrator.conclude_session(&session_id).await {
                    warn!("Could not conclude after automatic pause: {}", e);
                }
            }
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    conclude_on_interrupt(&orchestrator, &session_id).await;
                }
            }
        }
    };
    tokio::join!(follow, control);

    let session = orchestrator.get_session(&session_id)?;
    if session.status() != SessionStatus::Concluded {
        eprintln!(
            "{} session {} stopped before concluding ({})",
            "!".yellow().bold(),
            session_id,
            session.status()
        );
    }
    let rendered = match output.format {
        OutputFormat::Transcript => ConsoleFormatter::format_transcript(&session),
        OutputFormat::Summary => ConsoleFormatter::format_summary(&session),
        OutputFormat::Json => ConsoleFormatter::format_json(&session),
    };
    println!("{}", rendered);

    orchestrator.shutdown().await;

    if cli.interactive {
        // A pending stdin read would keep the runtime from shutting down
        drop(log_guard);
        std::process::exit(0);
    }
    Ok(())
}

/// Initialize logging: stderr by verbosity, plus an optional log file
fn init_logging(verbose: u8, file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let (file_layer, guard) = match file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(log_file);
            let file_level = if verbose < 2 { "info" } else { level };
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(file_level));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::new(level)),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Print config warnings; refuse to start on errors
fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        eprintln!("{} {}", "warning:".yellow().bold(), issue);
    }
    let errors: Vec<_> = issues.iter().filter(|i| i.is_error()).collect();
    if !errors.is_empty() {
        for issue in &errors {
            eprintln!("{} {}", "error:".red().bold(), issue);
        }
        bail!("invalid configuration ({} errors)", errors.len());
    }
    Ok(())
}

/// Roster from `--participant` flags, falling back to the configured one
fn participants(cli: &Cli, config: &FileConfig) -> Result<Vec<ParticipantConfig>> {
    if cli.participant.is_empty() {
        return Ok(config.discussion.parse_participants().0);
    }
    cli.participant
        .iter()
        .map(|spec| parse_participant(spec).map_err(|e| anyhow!(e)))
        .collect()
}

async fn conclude_on_interrupt(orchestrator: &Orchestrator, session_id: &SessionId) {
    eprintln!("{} interrupted, writing the summary...", "!".yellow().bold());
    if let Err(e) = orchestrator.conclude_session(session_id).await {
        warn!("Could not conclude after interrupt: {}", e);
    }
}
