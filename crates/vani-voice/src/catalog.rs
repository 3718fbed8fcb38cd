//! Voice catalog — the engine's voice list, grouped for presentation.
//!
//! Platform engines often report an empty voice list until they finish
//! loading asynchronously. The catalog therefore tracks a polling budget:
//! each empty poll consumes one attempt, and once the budget is spent the
//! catalog settles into a terminal [`CatalogStatus::Unavailable`] state. A
//! "voices changed" notification from the engine refills the budget.

use serde::{Deserialize, Serialize};

use crate::backend::VoiceDescriptor;

/// Group label for voices without a language tag.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Substrings (lowercase) that mark a language tag as Bengali.
const BENGALI_LANGUAGE_MARKERS: &[&str] = &["bn", "ben", "bangla", "bengali"];

/// Substrings (lowercase) that mark a display name as Bengali.
const BENGALI_NAME_MARKERS: &[&str] = &["bangla", "bengali"];

// ── Status ─────────────────────────────────────────────────────────

/// Loading status of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CatalogStatus {
    /// Still polling the engine.
    #[default]
    Loading,

    /// The engine reported a non-empty voice list.
    Ready,

    /// Polling budget exhausted with no voices.
    Unavailable,
}

/// What the caller should do after recording a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Voices are available; stop polling.
    Ready,

    /// Still empty; poll again after the configured interval.
    Retry,

    /// Still empty and out of attempts; stop polling for good.
    Exhausted,
}

/// Voices sharing a language tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceGroup {
    pub language: String,
    pub voices: Vec<VoiceDescriptor>,
}

// ── Catalog ────────────────────────────────────────────────────────

/// Last fetched voice list plus polling bookkeeping.
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    voices: Vec<VoiceDescriptor>,
    status: CatalogStatus,
    attempts: u32,
    max_attempts: u32,
}

impl VoiceCatalog {
    /// Create an empty catalog that tolerates `max_attempts` empty polls.
    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        Self {
            voices: Vec::new(),
            status: CatalogStatus::Loading,
            attempts: 0,
            max_attempts,
        }
    }

    #[must_use]
    pub const fn status(&self) -> CatalogStatus {
        self.status
    }

    /// Empty polls recorded since the last reset.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn voices(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Record the result of one `list_voices` call.
    pub fn record_poll(&mut self, voices: Vec<VoiceDescriptor>) -> PollOutcome {
        if !voices.is_empty() {
            tracing::debug!(count = voices.len(), "Voice catalog loaded");
            self.voices = voices;
            self.status = CatalogStatus::Ready;
            return PollOutcome::Ready;
        }

        self.voices.clear();
        self.attempts = self.attempts.saturating_add(1);

        if self.attempts <= self.max_attempts {
            self.status = CatalogStatus::Loading;
            PollOutcome::Retry
        } else {
            tracing::warn!(
                attempts = self.attempts,
                "No voices detected after exhausting poll budget"
            );
            self.status = CatalogStatus::Unavailable;
            PollOutcome::Exhausted
        }
    }

    /// Refill the polling budget (the engine announced a voice list change).
    pub const fn reset_attempts(&mut self) {
        self.attempts = 0;
        if matches!(self.status, CatalogStatus::Unavailable) {
            self.status = CatalogStatus::Loading;
        }
    }

    /// Whether `id` refers to a voice in the last fetched list.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.voices.iter().any(|v| v.id == id)
    }

    /// Voices grouped by language tag, in first-seen order.
    #[must_use]
    pub fn grouped(&self) -> Vec<VoiceGroup> {
        let mut groups: Vec<VoiceGroup> = Vec::new();
        for voice in &self.voices {
            let language = if voice.language_tag.is_empty() {
                UNKNOWN_LANGUAGE
            } else {
                voice.language_tag.as_str()
            };

            match groups.iter_mut().find(|g| g.language == language) {
                Some(group) => group.voices.push(voice.clone()),
                None => groups.push(VoiceGroup {
                    language: language.to_string(),
                    voices: vec![voice.clone()],
                }),
            }
        }
        groups
    }

    /// First voice that looks Bengali by language tag or name.
    #[must_use]
    pub fn preferred_voice(&self) -> Option<&VoiceDescriptor> {
        self.voices.iter().find(|v| is_bengali_voice(v))
    }
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_VOICE_POLL_ATTEMPTS)
    }
}

/// Bengali-indicator heuristic used for default voice selection.
#[must_use]
pub fn is_bengali_voice(voice: &VoiceDescriptor) -> bool {
    let lang = voice.language_tag.to_lowercase();
    let name = voice.display_name.to_lowercase();
    BENGALI_LANGUAGE_MARKERS.iter().any(|m| lang.contains(m))
        || BENGALI_NAME_MARKERS.iter().any(|m| name.contains(m))
}
