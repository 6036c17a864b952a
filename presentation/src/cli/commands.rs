//! CLI command definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for study-relay
#[derive(Parser, Debug)]
#[command(name = "study-relay")]
#[command(author, version, about = "Experimental-condition chat relay for research studies")]
#[command(long_about = r#"
study-relay assigns participants to experimental conditions, relays their
messages to an Azure OpenAI deployment and keeps the full transcript.

Deployment settings come from MODEL_ENDPOINT, MODEL_DEPLOYMENT,
MODEL_API_VERSION, MODEL_SUBSCRIPTION_KEY, MODEL_MAX_RETRIES and
MODEL_RETRY_DELAY. All six are required for `chat`, `send` and `show`.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./relay.toml        Project-level config
3. ~/.config/study-relay/config.toml   Global config

Example:
  study-relay conditions
  study-relay show 2
  study-relay chat --condition 1 --stream
  study-relay send --participant p-017 --sse "Hello there"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Study document (structured or legacy array)
    #[arg(long, value_name = "PATH", global = true)]
    pub conditions: Option<PathBuf>,

    /// Append transcripts to this JSONL file instead of keeping them in memory
    #[arg(long, value_name = "PATH", global = true)]
    pub transcript: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the conditions of the study
    Conditions,

    /// Print the resolved configuration of one condition as JSON
    Show {
        /// Zero-based condition index
        index: usize,
    },

    /// Interactive console conversation (type END to finish)
    Chat(ChatArgs),

    /// Send a single message and print the reply
    Send(SendArgs),
}

/// Participant and condition selection shared by `chat` and `send`
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Condition index; a random enabled condition when omitted
    #[arg(long, value_name = "INDEX")]
    pub condition: Option<usize>,

    /// Seed for random condition assignment
    #[arg(long)]
    pub seed: Option<u64>,

    /// Participant identifier used to key the transcript
    #[arg(long, value_name = "ID")]
    pub participant: Option<String>,

    /// Put the assistant in task-complete mode before sending
    #[arg(long)]
    pub task_inactive: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Print replies as they stream in
    #[arg(long)]
    pub stream: bool,

    /// Suppress the progress spinner
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Emit the reply as event-stream frames
    #[arg(long)]
    pub sse: bool,

    /// Message text
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_chat_with_globals() {
        let cli = Cli::parse_from([
            "study-relay",
            "-vv",
            "--conditions",
            "pilot.json",
            "chat",
            "--condition",
            "2",
            "--stream",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.conditions, Some(PathBuf::from("pilot.json")));
        match cli.command {
            Command::Chat(args) => {
                assert_eq!(args.session.condition, Some(2));
                assert!(args.stream);
                assert!(!args.session.task_inactive);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_send() {
        let cli = Cli::parse_from([
            "study-relay",
            "send",
            "--participant",
            "p-1",
            "--sse",
            "--task-inactive",
            "hello there",
        ]);
        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.session.participant.as_deref(), Some("p-1"));
                assert!(args.sse);
                assert!(args.session.task_inactive);
                assert_eq!(args.message, "hello there");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
