//! Playback session data and the position tracker.
//!
//! Offsets are measured in `char`s of the session text. The tracker converts
//! engine progress (relative to the slice being spoken) back into absolute
//! offsets and refuses to move backward within a single utterance, which
//! guards against out-of-order boundary callbacks.

use serde::{Deserialize, Serialize};

// ── Transport state ────────────────────────────────────────────────

/// Transport state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    /// Nothing active or paused.
    #[default]
    Idle,

    /// An utterance is issued and (expected to be) producing audio.
    Speaking,

    /// An utterance is issued but paused.
    Paused,
}

impl PlaybackState {
    /// Whether an utterance is logically in flight (speaking or paused).
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Speaking | Self::Paused)
    }
}

// ── Position tracker ───────────────────────────────────────────────

/// Tracks the absolute character offset of playback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionTracker {
    current_offset: usize,
    total_length: usize,
    start_offset_base: usize,
}

impl PositionTracker {
    /// Create a tracker for a text of `total_length` characters.
    #[must_use]
    pub const fn new(total_length: usize) -> Self {
        Self {
            current_offset: 0,
            total_length,
            start_offset_base: 0,
        }
    }

    #[must_use]
    pub const fn current_offset(&self) -> usize {
        self.current_offset
    }

    #[must_use]
    pub const fn total_length(&self) -> usize {
        self.total_length
    }

    /// Absolute offset at which the active utterance's slice begins.
    #[must_use]
    pub const fn start_offset_base(&self) -> usize {
        self.start_offset_base
    }

    /// `current_offset / total_length`, capped at 1.0 (0.0 for empty text).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_fraction(&self) -> f64 {
        if self.total_length == 0 {
            return 0.0;
        }
        (self.current_offset as f64 / self.total_length as f64).min(1.0)
    }

    /// A new utterance was issued at `base`.
    pub fn begin_utterance(&mut self, base: usize) {
        let base = base.min(self.total_length);
        self.start_offset_base = base;
        self.current_offset = base;
    }

    /// The engine reported that the active utterance started.
    ///
    /// Never moves the offset backward, so a repeated `Started` is harmless.
    pub fn on_started(&mut self) {
        self.current_offset = self.current_offset.max(self.start_offset_base);
    }

    /// Apply a boundary notification.
    ///
    /// Returns `true` if the offset moved. Missing offsets and offsets that
    /// would move playback backward are ignored.
    pub fn on_boundary(&mut self, relative: Option<usize>) -> bool {
        let Some(relative) = relative else {
            return false;
        };

        let absolute = self
            .start_offset_base
            .saturating_add(relative)
            .min(self.total_length);

        if absolute < self.current_offset {
            tracing::trace!(
                absolute,
                current = self.current_offset,
                "Ignoring out-of-order boundary"
            );
            return false;
        }

        let moved = absolute != self.current_offset;
        self.current_offset = absolute;
        moved
    }

    /// The active utterance reached its natural end.
    pub fn on_ended(&mut self) {
        self.current_offset = self.total_length;
    }

    /// Rewind to the start (used by stop).
    pub fn reset(&mut self) {
        self.current_offset = 0;
        self.start_offset_base = 0;
    }
}

// ── Session ────────────────────────────────────────────────────────

/// All mutable playback state, owned by the controller.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    text: Vec<char>,
    rate: f32,
    state: PlaybackState,
    position: PositionTracker,
}

impl PlaybackSession {
    /// Create a session for `text`, trimmed of surrounding whitespace.
    #[must_use]
    pub fn new(text: &str, rate: f32) -> Self {
        let text: Vec<char> = text.trim().chars().collect();
        let total = text.len();
        Self {
            text,
            rate,
            state: PlaybackState::Idle,
            position: PositionTracker::new(total),
        }
    }

    /// Whether there is nothing to speak.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The full session text.
    #[must_use]
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    /// Suffix of the text starting at `offset` (empty when past the end).
    #[must_use]
    pub fn slice_from(&self, offset: usize) -> String {
        self.text.get(offset..).map_or_else(String::new, |s| s.iter().collect())
    }

    #[must_use]
    pub const fn total_length(&self) -> usize {
        self.position.total_length()
    }

    #[must_use]
    pub const fn rate(&self) -> f32 {
        self.rate
    }

    pub const fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

    #[must_use]
    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    pub const fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
    }

    #[must_use]
    pub const fn position(&self) -> &PositionTracker {
        &self.position
    }

    pub const fn position_mut(&mut self) -> &mut PositionTracker {
        &mut self.position
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new("", 1.0)
    }
}
