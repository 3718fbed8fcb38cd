//! Speech engine port: the engine-agnostic interface the controller drives.
//!
//! The [`PlaybackController`](crate::controller::PlaybackController) owns a
//! `Box<dyn SpeechEngine>` and never talks to a concrete engine directly, so a
//! platform engine (browser `speechSynthesis`, SAPI, speech-dispatcher, ...)
//! can be swapped in without touching the transport logic.
//!
//! Engines deliver their notifications asynchronously through an
//! [`EngineEventSender`]. Every utterance notification carries the
//! [`Generation`] of the request that produced it so the controller can drop
//! callbacks from superseded utterances.
//!
//! ## Engine implementations
//!
//! | Module          | Notes                                            |
//! |-----------------|--------------------------------------------------|
//! | [`simulated`]   | In-process engine driven by tokio timers         |

pub mod simulated;

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::VoiceError;

// ── Shared types ───────────────────────────────────────────────────

/// Monotonic tag distinguishing the active request from superseded ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    /// The generation following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A voice offered by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDescriptor {
    /// Stable identifier (e.g. a voice URI).
    pub id: String,

    /// Human-readable name.
    pub display_name: String,

    /// BCP 47 language tag, possibly empty.
    pub language_tag: String,

    /// Whether the engine reports this voice as its default.
    pub is_default: bool,
}

impl VoiceDescriptor {
    /// Convenience constructor.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        language_tag: impl Into<String>,
        is_default: bool,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            language_tag: language_tag.into(),
            is_default,
        }
    }

    /// Label shown in a voice picker: `"<name> (<lang>)"`, plus a default marker.
    #[must_use]
    pub fn label(&self) -> String {
        if self.is_default {
            format!("{} ({}) [default]", self.display_name, self.language_tag)
        } else {
            format!("{} ({})", self.display_name, self.language_tag)
        }
    }
}

/// A single synthesis request handed to the engine.
///
/// Engines report boundary offsets relative to `text_slice`; the controller
/// adds `start_offset_base` back to obtain absolute positions.
#[derive(Debug, Clone, PartialEq)]
pub struct UtteranceRequest {
    /// Tag echoed back on every notification for this request.
    pub generation: Generation,

    /// Suffix of the session text starting at `start_offset_base`.
    pub text_slice: String,

    /// Speaking rate multiplier.
    pub rate: f32,

    /// Selected voice, or `None` for the engine default.
    pub voice_id: Option<String>,

    /// Absolute character offset of the first character in `text_slice`.
    pub start_offset_base: usize,
}

/// Engine-side handle of an issued utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtteranceHandle {
    /// Generation of the request this handle belongs to.
    pub generation: Generation,
}

impl UtteranceHandle {
    #[must_use]
    pub const fn new(generation: Generation) -> Self {
        Self { generation }
    }
}

/// Notification emitted for a specific utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceEvent {
    /// Audio output began.
    Started,

    /// Progress marker (usually a word boundary).
    ///
    /// `char_index` is relative to the request's `text_slice`. `None` means
    /// the engine did not supply a usable numeric offset.
    Boundary { char_index: Option<usize> },

    /// The utterance finished naturally.
    Ended,

    /// The utterance failed.
    Error(String),

    /// The engine paused output.
    Paused,

    /// The engine resumed output.
    Resumed,
}

/// Everything an engine can report back to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A notification tagged with the generation of its request.
    Utterance {
        generation: Generation,
        event: UtteranceEvent,
    },

    /// The engine's voice list changed (e.g. platform voices finished loading).
    VoicesChanged,
}

impl EngineEvent {
    /// Shorthand for an utterance notification.
    #[must_use]
    pub const fn utterance(generation: Generation, event: UtteranceEvent) -> Self {
        Self::Utterance { generation, event }
    }
}

/// Channel on which engines deliver [`EngineEvent`]s.
pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;

/// Receiving end of the engine notification channel.
pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Create the engine notification channel.
#[must_use]
pub fn engine_channel() -> (EngineEventSender, EngineEventReceiver) {
    mpsc::unbounded_channel()
}

// ── Speech Engine Trait ────────────────────────────────────────────

/// Backend-agnostic speech synthesis engine.
///
/// All methods return immediately; progress is reported later through the
/// engine's [`EngineEventSender`]. Implementations must be `Send` so the
/// controller can live on a tokio task.
#[cfg_attr(test, mockall::automock)]
pub trait SpeechEngine: Send {
    /// Current voice list. May be empty while the platform is still loading it.
    fn list_voices(&self) -> Vec<VoiceDescriptor>;

    /// Begin speaking `request.text_slice`.
    ///
    /// Returns a handle on successful issuance. Failures that happen after
    /// issuance are reported as [`UtteranceEvent::Error`].
    fn speak(&mut self, request: UtteranceRequest) -> Result<UtteranceHandle, VoiceError>;

    /// Pause the given utterance.
    fn pause(&mut self, handle: UtteranceHandle);

    /// Resume the given utterance.
    fn resume(&mut self, handle: UtteranceHandle);

    /// Cancel every queued or speaking utterance. Safe to call when idle.
    fn cancel_all(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_advances() {
        let g = Generation::default();
        assert_eq!(g.next(), Generation(1));
        assert!(g.next() > g);
        assert_eq!(Generation(7).to_string(), "#7");
    }

    #[test]
    fn voice_label_marks_default() {
        let voice = VoiceDescriptor::new("v1", "Tanishaa", "bn-IN", true);
        assert_eq!(voice.label(), "Tanishaa (bn-IN) [default]");

        let voice = VoiceDescriptor::new("v2", "Samantha", "en-US", false);
        assert_eq!(voice.label(), "Samantha (en-US)");
    }

    #[test]
    fn voice_descriptor_serializes_camel_case() {
        let voice = VoiceDescriptor::new("v1", "Tanishaa", "bn-IN", false);
        let json = serde_json::to_value(&voice).unwrap();
        assert_eq!(json["displayName"], "Tanishaa");
        assert_eq!(json["languageTag"], "bn-IN");
        assert_eq!(json["isDefault"], false);
    }
}
