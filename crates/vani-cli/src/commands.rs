//! Subcommands.

use std::path::PathBuf;

use clap::Subcommand;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Report whether text contains Bangla script
    Detect {
        /// Text to analyse (reads --file or stdin when omitted)
        text: Option<String>,
        /// Read the text from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// List the engine's voices grouped by language
    Voices {
        /// Simulate a platform whose voice list loads on this poll
        #[arg(long, value_name = "POLL")]
        ready_after: Option<u32>,
        /// Simulate a platform that never reports any voices
        #[arg(long, conflicts_with = "ready_after")]
        no_voices: bool,
    },

    /// Read a text file aloud with interactive transport controls
    Read {
        /// Text file to read, or "-" for stdin
        source: String,
        /// Speaking rate multiplier
        #[arg(short, long)]
        rate: Option<f32>,
        /// Voice id to use (see `vani voices`)
        #[arg(long)]
        voice: Option<String>,
        /// Character offset to start from
        #[arg(long, default_value_t = 0)]
        from: usize,
        /// Play once without reading commands from stdin
        #[arg(long)]
        no_interactive: bool,
        /// Simulate a platform whose voice list loads on this poll
        #[arg(long, value_name = "POLL")]
        ready_after: Option<u32>,
    },
}
