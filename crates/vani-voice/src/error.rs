//! Playback controller error types.

/// Errors that can occur while driving the speech engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoiceError {
    /// No speech engine is available at all.
    ///
    /// Fatal for the controller: every command returns this error and the UI
    /// should render a disabled state.
    #[error("Speech synthesis is not available on this platform")]
    EngineUnavailable,

    /// Playback was requested with blank text.
    #[error("Please enter or paste some text")]
    EmptyInput,

    /// The voice catalog was still empty after the polling budget ran out.
    #[error("No text-to-speech voices detected — install a TTS language pack")]
    NoVoicesAvailable,

    /// The engine rejected a request or failed mid-utterance.
    #[error("Speech engine error: {0}")]
    EngineError(String),

    /// A voice id that is not part of the current catalog was selected.
    #[error("Voice '{0}' is not in the current voice catalog")]
    UnknownVoice(String),

    /// The playback service task has shut down.
    #[error("Playback service is not running")]
    ServiceStopped,
}
