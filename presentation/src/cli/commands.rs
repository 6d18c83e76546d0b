//! CLI command definitions

use clap::{Parser, ValueEnum};
use roundtable_domain::{ParticipantConfig, ParticipantRole, Personality, SessionType};
use std::path::PathBuf;

/// How a finished session is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Every message followed by the summary
    #[default]
    Transcript,
    /// Only the closing summary
    Summary,
    /// The concluded session as JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// CLI arguments for roundtable
#[derive(Parser, Debug)]
#[command(name = "roundtable")]
#[command(author, version, about = "Writers' roundtable - AI writing agents discuss a topic in turns")]
#[command(long_about = r#"
Roundtable convenes 2 to 5 AI writing agents (writer, editor, proofreader,
deputy editor or any custom role) around a creative-writing topic. They
speak in a fixed round-robin order for a limited number of rounds, then a
summary is written. In interactive mode you can pause, resume, conclude
and add your own notes while the discussion runs.

Configuration files are loaded from (lowest to highest priority):
1. ~/.config/writers-roundtable/config.toml   Global config
2. ./roundtable.toml or ./.roundtable.toml    Project-level config
3. --config <path>                            Explicit config file
4. ROUNDTABLE_* environment variables (e.g. ROUNDTABLE_GATEWAY__MODEL)

Example:
  roundtable "A lighthouse keeper finds a letter addressed to her future self"
  roundtable -p writer:Mara -p editor -p proofreader -r 3 "Opening chapter pacing"
  roundtable -i --offline -t plot_creation "Heist on a night train"
"#)]
pub struct Cli {
    /// The topic to discuss (not required with --list)
    pub topic: Option<String>,

    /// Participant as `role` or `role:Display Name`, in turn order (repeatable)
    #[arg(short, long, value_name = "ROLE[:NAME]")]
    pub participant: Vec<String>,

    /// Number of rounds (overrides discussion.max_rounds)
    #[arg(short, long, value_name = "N")]
    pub rounds: Option<u32>,

    /// Session type label
    #[arg(short = 't', long, value_name = "TYPE")]
    pub session_type: Option<SessionType>,

    /// Project the session belongs to
    #[arg(long, value_name = "ID")]
    pub project: Option<String>,

    /// Output format (defaults to output.format, then transcript)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Read commands and notes from stdin while the discussion runs
    #[arg(short, long)]
    pub interactive: bool,

    /// Use the scripted gateway; no network or API key needed
    #[arg(long)]
    pub offline: bool,

    /// List stored sessions (optionally filtered by --project) and exit
    #[arg(long)]
    pub list: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

/// Parse a `--participant` value: `role` or `role:Display Name`
pub fn parse_participant(spec: &str) -> Result<ParticipantConfig, String> {
    let (role, name) = match spec.split_once(':') {
        Some((role, name)) => (role.trim(), Some(name.trim())),
        None => (spec.trim(), None),
    };
    if role.is_empty() {
        return Err(format!("participant '{}' has no role", spec));
    }
    let Ok(role) = role.parse::<ParticipantRole>();
    let config = ParticipantConfig::new(role);
    Ok(match name {
        Some(name) if !name.is_empty() => {
            config.with_personality(Personality::default().with_display_name(name))
        }
        Some(_) => return Err(format!("participant '{}' has an empty display name", spec)),
        None => config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "roundtable",
            "-p",
            "writer:Mara",
            "-p",
            "editor",
            "-r",
            "3",
            "-t",
            "plot_creation",
            "-o",
            "json",
            "-vv",
            "--offline",
            "Heist on a night train",
        ])
        .unwrap();
        assert_eq!(cli.topic.as_deref(), Some("Heist on a night train"));
        assert_eq!(cli.participant, vec!["writer:Mara", "editor"]);
        assert_eq!(cli.rounds, Some(3));
        assert_eq!(cli.session_type, Some(SessionType::PlotCreation));
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.verbose, 2);
        assert!(cli.offline);
        assert!(!cli.interactive);
    }

    #[test]
    fn test_parse_participant() {
        let mara = parse_participant("writer: Mara Voss").unwrap();
        assert_eq!(mara.role, ParticipantRole::Writer);
        assert_eq!(mara.personality.display_name.as_deref(), Some("Mara Voss"));

        let custom = parse_participant("dramaturg").unwrap();
        assert_eq!(custom.role, ParticipantRole::Custom("dramaturg".to_string()));
        assert!(custom.personality.display_name.is_none());

        assert!(parse_participant(":Nobody").is_err());
        assert!(parse_participant("editor:").is_err());
    }

    #[test]
    fn test_output_format_from_config_string() {
        assert_eq!("summary".parse::<OutputFormat>(), Ok(OutputFormat::Summary));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("pdf".parse::<OutputFormat>().is_err());
    }
}
