//! CLI-specific error types and exit codes.

use thiserror::Error;
use vani_voice::{ConfigError, VoiceError};

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Playback error reported by the controller.
    #[error("{0}")]
    Voice(#[from] VoiceError),

    /// Unparseable interactive command or argument.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CliError {
    /// Map error to an exit code (see sysexits.h).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Voice(VoiceError::EngineUnavailable | VoiceError::NoVoicesAvailable) => 69, // EX_UNAVAILABLE
            Self::Voice(VoiceError::EmptyInput) => 65, // EX_DATAERR
            Self::Voice(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Voice(VoiceError::EmptyInput).exit_code(), 65);
        assert_eq!(CliError::Voice(VoiceError::EngineUnavailable).exit_code(), 69);
        assert_eq!(CliError::Arguments("x".into()).exit_code(), 2);
        assert_eq!(CliError::Config(ConfigError::ZeroSkip).exit_code(), 78);
    }

    #[test]
    fn test_voice_error_message_passes_through() {
        let err = CliError::from(VoiceError::EmptyInput);
        assert_eq!(err.to_string(), "Please enter or paste some text");
    }
}
