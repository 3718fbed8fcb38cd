//! Seekable text-to-speech playback.
//!
//! Platform speech engines can only speak a string from its beginning. This
//! crate layers a transport (play, pause, resume, stop, skip, rate change)
//! on top of such an engine by tracking the character position from the
//! engine's boundary callbacks and restarting synthesis from that position
//! whenever the user seeks or changes the rate.
//!
//! - [`controller`]: the synchronous transport state machine
//! - [`service`]: a tokio task that owns the controller and polls voices
//! - [`backend`]: the engine port plus a timer-driven simulated engine
//! - [`catalog`]: the voice list with its bounded polling budget
//! - [`script`]: Bengali script detection for the input text

#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tokio_test as _;

pub mod backend;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod script;
pub mod service;
pub mod session;

// Re-export key types for convenience
pub use backend::simulated::{SimulatedEngine, SimulatedEngineOptions};
pub use backend::{
    EngineEvent, Generation, SpeechEngine, UtteranceEvent, UtteranceHandle, UtteranceRequest,
    VoiceDescriptor, engine_channel,
};
pub use catalog::{CatalogStatus, PollOutcome, VoiceCatalog, VoiceGroup};
pub use config::{ConfigError, PlaybackConfig, load_config, validate_config};
pub use controller::{PlaybackController, PlaybackEvent, PlaybackSnapshot, ProgressUpdate};
pub use error::VoiceError;
pub use script::{ScriptHint, detect_script};
pub use service::{PlaybackHandle, PlaybackPort, PlaybackService};
pub use session::{PlaybackSession, PlaybackState, PositionTracker};
