use crate::model::TimeUnit;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "focus", version, about = "Terminal focus timer")]
pub struct Cli {
    /// Use this config file instead of searching for one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config file to .focus/config.yml in the current directory
    Init,
    /// Print the effective configuration
    Config,
    /// Add a single task, start it and count down in the terminal
    Countdown {
        /// Task text
        text: String,
        /// Duration, in --unit
        #[arg(long, short = 'd')]
        duration: Option<u64>,
        /// hour, minute or second
        #[arg(long, short = 'u')]
        unit: Option<TimeUnit>,
    },
    /// Launch the interactive TUI
    Tui,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_args() {
        let cli = Cli::parse_from(["focus", "countdown", "Write report", "-d", "2", "-u", "minute"]);
        match cli.command {
            Some(Command::Countdown {
                text,
                duration,
                unit,
            }) => {
                assert_eq!(text, "Write report");
                assert_eq!(duration, Some(2));
                assert_eq!(unit, Some(TimeUnit::Minute));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_defaults_to_no_subcommand() {
        let cli = Cli::parse_from(["focus", "--config", "/tmp/focus.yml"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/focus.yml")));
    }

    #[test]
    fn test_rejects_unknown_unit() {
        assert!(Cli::try_parse_from(["focus", "countdown", "x", "-u", "week"]).is_err());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
