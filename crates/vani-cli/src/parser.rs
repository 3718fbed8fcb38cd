//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface definition for the playback tool.
#[derive(Parser)]
#[command(name = "vani")]
#[command(about = "Read text aloud with seekable playback")]
#[command(version)]
pub struct Cli {
    /// JSON playback config (skip size, rate range, voice polling)
    #[arg(long, global = true, env = "VANI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["vani", "--verbose", "--config", "/tmp/vani.json", "voices"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/vani.json")));
        assert!(matches!(cli.command, Some(Commands::Voices { .. })));
    }

    #[test]
    fn test_read_args() {
        let cli = Cli::parse_from([
            "vani", "read", "story.txt", "--rate", "1.5", "--voice", "sim-bn-bd", "--from", "120",
        ]);
        let Some(Commands::Read {
            source,
            rate,
            voice,
            from,
            no_interactive,
            ..
        }) = cli.command
        else {
            panic!("expected read command");
        };
        assert_eq!(source, "story.txt");
        assert_eq!(rate, Some(1.5));
        assert_eq!(voice.as_deref(), Some("sim-bn-bd"));
        assert_eq!(from, 120);
        assert!(!no_interactive);
    }

    #[test]
    fn test_detect_inline_text() {
        let cli = Cli::parse_from(["vani", "detect", "আমি"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Detect { text: Some(ref t), file: None }) if t == "আমি"
        ));
    }
}
