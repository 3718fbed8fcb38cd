//! Playback controller — transport state machine over a non-seekable engine.
//!
//! The engine can only "speak this text"; it cannot seek inside an utterance
//! that is already playing. The controller layers a seekable transport on top:
//!
//! ```text
//!            play / play_from
//!   Idle ─────────────────────────▶ Speaking ◀──── resume ────┐
//!    ▲  ◀── stop / ended / error ──    │                      │
//!    │                                 └──── pause ─────▶ Paused
//!    └───────────────── stop / ended / error ─────────────────┘
//! ```
//!
//! Seeking and rate changes go through [`PlaybackController::restart_from`]:
//! cancel the in-flight utterance, issue a new one for the remaining text, and
//! (if the transport was paused) pause again once the engine reports that the
//! new utterance started.
//!
//! Every issued request gets a fresh [`Generation`]. Engine notifications for
//! any other generation are discarded, so callbacks from canceled utterances
//! can never move the position or the state.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::backend::{
    EngineEvent, Generation, SpeechEngine, UtteranceEvent, UtteranceHandle, UtteranceRequest,
};
use crate::catalog::{CatalogStatus, PollOutcome, VoiceCatalog, VoiceGroup};
use crate::config::PlaybackConfig;
use crate::error::VoiceError;
use crate::script::{ScriptHint, detect_script};
use crate::session::{PlaybackSession, PlaybackState};

// ── Events emitted by the controller ───────────────────────────────

/// Position update for progress displays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub offset: usize,
    pub total: usize,
    pub fraction: f64,
}

/// Events emitted by the controller to the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Transport state changed.
    StateChanged(PlaybackState),

    /// Playback position changed.
    Progress(ProgressUpdate),

    /// Speaking rate changed.
    RateChanged(f32),

    /// Voice catalog status changed (voices loaded, or gave up).
    CatalogChanged(CatalogStatus),

    /// Selected voice changed (`None` = engine default).
    VoiceSelected(Option<String>),

    /// An error the UI should surface.
    Error(VoiceError),
}

/// Read-only view of everything a UI needs to render the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub engine_available: bool,
    pub state: PlaybackState,
    pub offset: usize,
    pub total: usize,
    pub progress: f64,
    pub rate: f32,
    pub script_hint: ScriptHint,
    pub selected_voice: Option<String>,
    pub catalog_status: CatalogStatus,
    pub voice_groups: Vec<VoiceGroup>,
}

// ── Active utterance bookkeeping ───────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct ActiveUtterance {
    handle: UtteranceHandle,

    /// Whether the engine has reported `Started` for this utterance.
    started: bool,

    /// Pause the engine as soon as `Started` arrives.
    pause_on_start: bool,
}

// ── Controller ─────────────────────────────────────────────────────

/// Seekable playback transport over a [`SpeechEngine`].
pub struct PlaybackController {
    /// `None` when the platform has no speech capability at all.
    engine: Option<Box<dyn SpeechEngine>>,

    /// Text buffer as typed by the user; copied into a session on `play`.
    input: String,

    /// Immutable text + position + rate + transport state for the current run.
    session: PlaybackSession,

    /// The single utterance that is logically in flight.
    active: Option<ActiveUtterance>,

    /// Generation of the most recently issued request.
    generation: Generation,

    catalog: VoiceCatalog,

    selected_voice: Option<String>,

    event_tx: mpsc::UnboundedSender<PlaybackEvent>,

    config: PlaybackConfig,
}

impl PlaybackController {
    /// Create a controller driving `engine`.
    ///
    /// Returns the controller and a receiver for [`PlaybackEvent`]s.
    #[must_use]
    pub fn new(
        engine: Box<dyn SpeechEngine>,
        config: PlaybackConfig,
    ) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        Self::build(Some(engine), config)
    }

    /// Create a controller for a platform without speech synthesis.
    ///
    /// Every command fails with [`VoiceError::EngineUnavailable`].
    #[must_use]
    pub fn without_engine(config: PlaybackConfig) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (controller, rx) = Self::build(None, config);
        tracing::warn!("Speech synthesis unavailable, controller disabled");
        controller.emit(PlaybackEvent::Error(VoiceError::EngineUnavailable));
        (controller, rx)
    }

    fn build(
        engine: Option<Box<dyn SpeechEngine>>,
        config: PlaybackConfig,
    ) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let rate = config.clamp_rate(config.initial_rate);

        let controller = Self {
            engine,
            input: String::new(),
            session: PlaybackSession::new("", rate),
            active: None,
            generation: Generation::default(),
            catalog: VoiceCatalog::new(config.max_voice_poll_attempts),
            selected_voice: None,
            event_tx,
            config,
        };

        (controller, event_rx)
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Whether a speech engine is present.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    #[must_use]
    pub const fn state(&self) -> PlaybackState {
        self.session.state()
    }

    #[must_use]
    pub const fn current_offset(&self) -> usize {
        self.session.position().current_offset()
    }

    #[must_use]
    pub const fn total_length(&self) -> usize {
        self.session.total_length()
    }

    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        self.session.position().progress_fraction()
    }

    #[must_use]
    pub const fn rate(&self) -> f32 {
        self.session.rate()
    }

    /// Generation of the most recently issued request.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Script hint for the current input buffer.
    #[must_use]
    pub fn script_hint(&self) -> ScriptHint {
        detect_script(&self.input)
    }

    #[must_use]
    pub fn selected_voice(&self) -> Option<&str> {
        self.selected_voice.as_deref()
    }

    #[must_use]
    pub const fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Everything the UI needs in one value.
    #[must_use]
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            engine_available: self.is_available(),
            state: self.state(),
            offset: self.current_offset(),
            total: self.total_length(),
            progress: self.progress_fraction(),
            rate: self.rate(),
            script_hint: self.script_hint(),
            selected_voice: self.selected_voice.clone(),
            catalog_status: self.catalog.status(),
            voice_groups: self.catalog.grouped(),
        }
    }

    // ── Input ──────────────────────────────────────────────────────

    /// Replace the text buffer. Takes effect on the next `play`.
    ///
    /// Returns the script hint for the new text.
    pub fn set_text(&mut self, text: impl Into<String>) -> ScriptHint {
        self.input = text.into();
        self.script_hint()
    }

    // ── Transport commands ─────────────────────────────────────────

    /// Start speaking the input from the beginning.
    pub fn play(&mut self) -> Result<(), VoiceError> {
        self.play_from(0)
    }

    /// Start speaking the input from character `offset`.
    ///
    /// Legal from any state; any current utterance is canceled first.
    pub fn play_from(&mut self, offset: usize) -> Result<(), VoiceError> {
        self.ensure_engine()?;

        let mut session = PlaybackSession::new(&self.input, self.session.rate());
        if session.is_empty() {
            tracing::debug!("Refusing to play blank text");
            self.emit(PlaybackEvent::Error(VoiceError::EmptyInput));
            return Err(VoiceError::EmptyInput);
        }

        if self.catalog.status() == CatalogStatus::Unavailable {
            tracing::warn!("Playing without any detected voices");
        }

        self.cancel_active();
        session.set_state(self.state());
        self.session = session;

        if offset >= self.session.total_length() {
            self.finish_at_end();
            return Ok(());
        }

        tracing::info!(
            offset,
            total = self.session.total_length(),
            rate = self.session.rate(),
            "Starting playback"
        );
        self.restart_from(offset, self.session.rate(), false)
    }

    /// Pause the current utterance.
    ///
    /// Only meaningful while speaking. If the engine has not started the
    /// utterance yet, the pause is deferred until it does.
    pub fn pause(&mut self) -> Result<(), VoiceError> {
        self.ensure_engine()?;

        if self.state() != PlaybackState::Speaking {
            tracing::debug!(state = ?self.state(), "Ignoring pause");
            return Ok(());
        }

        let Some(active) = self.active.as_mut() else {
            self.set_state(PlaybackState::Idle);
            return Ok(());
        };

        if active.started {
            let handle = active.handle;
            if let Some(engine) = self.engine.as_mut() {
                engine.pause(handle);
            }
        } else {
            active.pause_on_start = true;
        }

        self.set_state(PlaybackState::Paused);
        Ok(())
    }

    /// Resume a paused utterance.
    pub fn resume(&mut self) -> Result<(), VoiceError> {
        self.ensure_engine()?;

        if self.state() != PlaybackState::Paused {
            tracing::debug!(state = ?self.state(), "Ignoring resume");
            return Ok(());
        }

        let Some(active) = self.active.as_mut() else {
            self.set_state(PlaybackState::Idle);
            return Ok(());
        };

        if active.started {
            let handle = active.handle;
            if let Some(engine) = self.engine.as_mut() {
                engine.resume(handle);
            }
        } else {
            // Engine never paused; just drop the deferred pause.
            active.pause_on_start = false;
        }

        self.set_state(PlaybackState::Speaking);
        Ok(())
    }

    /// Cancel playback and rewind to the start.
    pub fn stop(&mut self) -> Result<(), VoiceError> {
        self.ensure_engine()?;

        self.cancel_active();
        self.session.position_mut().reset();
        self.set_state(PlaybackState::Idle);
        self.emit_progress();
        Ok(())
    }

    /// Move the playback position by `delta` characters.
    ///
    /// Only legal while speaking or paused; the transport stays in the same
    /// state. Seeking forward to or past the end finishes playback instead of
    /// issuing an empty request.
    pub fn seek_by(&mut self, delta: isize) -> Result<(), VoiceError> {
        self.ensure_engine()?;

        let state = self.state();
        if !state.is_active() {
            tracing::debug!(delta, "Ignoring seek while idle");
            return Ok(());
        }

        let current = self.current_offset();
        let total = self.total_length();

        let target = if delta < 0 {
            current.saturating_sub(delta.unsigned_abs())
        } else {
            current.saturating_add(delta.unsigned_abs())
        };

        if delta >= 0 && target >= total {
            tracing::debug!(current, total, "Seek past end, finishing playback");
            self.finish_at_end();
            return Ok(());
        }

        if target == current {
            return Ok(());
        }

        tracing::debug!(from = current, to = target, "Seeking");
        self.restart_from(target, self.rate(), state == PlaybackState::Paused)
    }

    /// Skip backward by the configured amount.
    pub fn seek_backward(&mut self) -> Result<(), VoiceError> {
        let skip = isize::try_from(self.config.skip_chars).unwrap_or(isize::MAX);
        self.seek_by(-skip)
    }

    /// Skip forward by the configured amount.
    pub fn seek_forward(&mut self) -> Result<(), VoiceError> {
        let skip = isize::try_from(self.config.skip_chars).unwrap_or(isize::MAX);
        self.seek_by(skip)
    }

    /// Change the speaking rate (clamped to the configured range).
    ///
    /// While speaking or paused, the utterance is restarted at the current
    /// offset with the new rate.
    pub fn set_rate(&mut self, rate: f32) -> Result<(), VoiceError> {
        self.ensure_engine()?;

        let rate = self.config.clamp_rate(rate);
        if (rate - self.rate()).abs() < f32::EPSILON {
            return Ok(());
        }

        tracing::info!(old = self.rate(), new = rate, "Speaking rate changed");
        self.session.set_rate(rate);
        self.emit(PlaybackEvent::RateChanged(rate));

        let state = self.state();
        if state.is_active() {
            let offset = self.current_offset();
            return self.restart_from(offset, rate, state == PlaybackState::Paused);
        }
        Ok(())
    }

    /// Increase the rate by one step.
    pub fn rate_up(&mut self) -> Result<(), VoiceError> {
        self.set_rate(self.rate() + self.config.rate_step)
    }

    /// Decrease the rate by one step.
    pub fn rate_down(&mut self) -> Result<(), VoiceError> {
        self.set_rate(self.rate() - self.config.rate_step)
    }

    /// Select a voice for subsequent utterances (`None` = engine default).
    ///
    /// The id must belong to the last fetched catalog. The current utterance
    /// keeps its voice.
    pub fn select_voice(&mut self, voice_id: Option<String>) -> Result<(), VoiceError> {
        self.ensure_engine()?;

        if let Some(ref id) = voice_id {
            if !self.catalog.contains(id) {
                return Err(VoiceError::UnknownVoice(id.clone()));
            }
        }

        if self.selected_voice != voice_id {
            tracing::info!(voice = ?voice_id, "Voice selected");
            self.selected_voice.clone_from(&voice_id);
            self.emit(PlaybackEvent::VoiceSelected(voice_id));
        }
        Ok(())
    }

    // ── Segment restart ────────────────────────────────────────────

    /// Cancel whatever is playing and speak the text from `offset`.
    ///
    /// This is the single path behind play, seek and rate change. When
    /// `resume_as_paused` is set the transport reports `Paused` immediately
    /// and the engine is asked to pause once it reports `Started`.
    pub fn restart_from(
        &mut self,
        offset: usize,
        rate: f32,
        resume_as_paused: bool,
    ) -> Result<(), VoiceError> {
        self.ensure_engine()?;
        self.cancel_active();

        let offset = offset.min(self.session.total_length());
        self.generation = self.generation.next();
        self.session.set_rate(rate);
        self.session.position_mut().begin_utterance(offset);

        let request = UtteranceRequest {
            generation: self.generation,
            text_slice: self.session.slice_from(offset),
            rate,
            voice_id: self.selected_voice.clone(),
            start_offset_base: offset,
        };

        tracing::debug!(
            generation = %request.generation,
            offset,
            slice_len = request.text_slice.len(),
            resume_as_paused,
            "Issuing utterance"
        );

        let result = match self.engine.as_mut() {
            Some(engine) => engine.speak(request),
            None => Err(VoiceError::EngineUnavailable),
        };

        match result {
            Ok(handle) => {
                self.active = Some(ActiveUtterance {
                    handle,
                    started: false,
                    pause_on_start: resume_as_paused,
                });
                self.set_state(if resume_as_paused {
                    PlaybackState::Paused
                } else {
                    PlaybackState::Speaking
                });
                self.emit_progress();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Engine rejected utterance");
                self.set_state(PlaybackState::Idle);
                self.emit(PlaybackEvent::Error(e.clone()));
                Err(e)
            }
        }
    }

    // ── Engine notifications ───────────────────────────────────────

    /// Apply a notification from the engine.
    ///
    /// Returns the poll outcome when the event triggered a catalog refresh,
    /// so the caller can schedule further polls.
    pub fn handle_engine_event(&mut self, event: EngineEvent) -> Option<PollOutcome> {
        match event {
            EngineEvent::Utterance { generation, event } => {
                self.handle_utterance_event(generation, event);
                None
            }
            EngineEvent::VoicesChanged => {
                tracing::debug!("Engine voice list changed");
                self.catalog.reset_attempts();
                Some(self.poll_voices())
            }
        }
    }

    fn handle_utterance_event(&mut self, generation: Generation, event: UtteranceEvent) {
        let Some(active) = self.active.filter(|a| a.handle.generation == generation) else {
            tracing::trace!(%generation, current = %self.generation, ?event, "Discarding stale engine event");
            return;
        };

        match event {
            UtteranceEvent::Started if active.started => {
                tracing::trace!(%generation, "Ignoring repeated start");
            }

            UtteranceEvent::Started => {
                self.active = Some(ActiveUtterance {
                    started: true,
                    pause_on_start: false,
                    ..active
                });
                self.session.position_mut().on_started();

                if active.pause_on_start {
                    if let Some(engine) = self.engine.as_mut() {
                        engine.pause(active.handle);
                    }
                    self.set_state(PlaybackState::Paused);
                } else {
                    self.set_state(PlaybackState::Speaking);
                }
                self.emit_progress();
            }

            UtteranceEvent::Boundary { char_index } => {
                if self.session.position_mut().on_boundary(char_index) {
                    self.emit_progress();
                }
            }

            UtteranceEvent::Ended => {
                tracing::debug!(%generation, "Utterance finished");
                self.active = None;
                self.session.position_mut().on_ended();
                self.set_state(PlaybackState::Idle);
                self.emit_progress();
            }

            UtteranceEvent::Error(reason) => {
                tracing::warn!(%generation, reason = %reason, "Speech engine error");
                self.active = None;
                self.set_state(PlaybackState::Idle);
                self.emit(PlaybackEvent::Error(VoiceError::EngineError(reason)));
            }

            UtteranceEvent::Paused => self.set_state(PlaybackState::Paused),

            UtteranceEvent::Resumed => {
                if !active.pause_on_start {
                    self.set_state(PlaybackState::Speaking);
                }
            }
        }
    }

    // ── Voice catalog ──────────────────────────────────────────────

    /// Fetch the engine's voice list once and update the catalog.
    pub fn poll_voices(&mut self) -> PollOutcome {
        let Some(engine) = self.engine.as_ref() else {
            return PollOutcome::Exhausted;
        };

        let before = self.catalog.status();
        let outcome = self.catalog.record_poll(engine.list_voices());

        match outcome {
            PollOutcome::Ready => self.apply_default_voice(),
            PollOutcome::Exhausted => {
                self.emit(PlaybackEvent::Error(VoiceError::NoVoicesAvailable));
            }
            PollOutcome::Retry => {}
        }

        if self
            .selected_voice
            .as_deref()
            .is_some_and(|id| !self.catalog.contains(id))
        {
            self.selected_voice = None;
            self.emit(PlaybackEvent::VoiceSelected(None));
        }

        if self.catalog.status() != before || outcome == PollOutcome::Ready {
            self.emit(PlaybackEvent::CatalogChanged(self.catalog.status()));
        }

        outcome
    }

    /// Keep a still-valid selection; otherwise use the configured voice, then
    /// the Bengali heuristic, then the engine default.
    fn apply_default_voice(&mut self) {
        if self
            .selected_voice
            .as_deref()
            .is_some_and(|id| self.catalog.contains(id))
        {
            return;
        }

        let choice = self
            .config
            .preferred_voice
            .as_deref()
            .filter(|id| self.catalog.contains(id))
            .map(str::to_string)
            .or_else(|| self.catalog.preferred_voice().map(|v| v.id.clone()));

        if choice != self.selected_voice {
            tracing::info!(voice = ?choice, "Default voice selected");
            self.selected_voice.clone_from(&choice);
            self.emit(PlaybackEvent::VoiceSelected(choice));
        }
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn ensure_engine(&self) -> Result<(), VoiceError> {
        if self.engine.is_some() {
            Ok(())
        } else {
            Err(VoiceError::EngineUnavailable)
        }
    }

    /// Cancel the engine and forget the active utterance. Idempotent.
    fn cancel_active(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.cancel_all();
        }
        if let Some(active) = self.active.take() {
            tracing::trace!(generation = %active.handle.generation, "Canceled utterance");
        }
    }

    /// Treat playback as having reached the end of the text.
    fn finish_at_end(&mut self) {
        self.cancel_active();
        self.session.position_mut().on_ended();
        self.set_state(PlaybackState::Idle);
        self.emit_progress();
    }

    /// Transition to a new state and emit a state-change event.
    fn set_state(&mut self, new_state: PlaybackState) {
        if self.session.state() != new_state {
            tracing::debug!(old = ?self.session.state(), new = ?new_state, "Playback state transition");
            self.session.set_state(new_state);
            self.emit(PlaybackEvent::StateChanged(new_state));
        }
    }

    fn emit_progress(&self) {
        let position = self.session.position();
        self.emit(PlaybackEvent::Progress(ProgressUpdate {
            offset: position.current_offset(),
            total: position.total_length(),
            fraction: position.progress_fraction(),
        }));
    }

    /// Emit an event; a dropped receiver is ignored.
    fn emit(&self, event: PlaybackEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("Playback event receiver dropped");
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if self.active.is_some() {
            self.cancel_active();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockSpeechEngine, VoiceDescriptor};

    const ALPHABET: &str = "abcdefghij";

    fn text_of(len: usize) -> String {
        ALPHABET.chars().cycle().take(len).collect()
    }

    /// Mock engine that accepts every request and tolerates cancel/pause/resume.
    fn permissive_engine() -> MockSpeechEngine {
        let mut engine = MockSpeechEngine::new();
        engine
            .expect_speak()
            .returning(|req| Ok(UtteranceHandle::new(req.generation)));
        engine.expect_cancel_all().return_const(());
        engine.expect_pause().return_const(());
        engine.expect_resume().return_const(());
        engine.expect_list_voices().returning(Vec::new);
        engine
    }

    fn started(controller: &mut PlaybackController) {
        let generation = controller.generation();
        controller.handle_engine_event(EngineEvent::utterance(generation, UtteranceEvent::Started));
    }

    fn boundary(controller: &mut PlaybackController, char_index: Option<usize>) {
        let generation = controller.generation();
        controller.handle_engine_event(EngineEvent::utterance(
            generation,
            UtteranceEvent::Boundary { char_index },
        ));
    }

    #[test]
    fn controller_creates_in_idle_state() {
        let (controller, _rx) =
            PlaybackController::new(Box::new(permissive_engine()), PlaybackConfig::default());
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(controller.is_available());
        assert!((controller.rate() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn play_issues_full_text_request() {
        let mut engine = MockSpeechEngine::new();
        engine.expect_cancel_all().return_const(());
        engine
            .expect_speak()
            .withf(|req| req.start_offset_base == 0 && req.text_slice == "hello world")
            .times(1)
            .returning(|req| Ok(UtteranceHandle::new(req.generation)));

        let (mut controller, _rx) =
            PlaybackController::new(Box::new(engine), PlaybackConfig::default());
        controller.set_text("  hello world  ");
        controller.play().unwrap();

        assert_eq!(controller.state(), PlaybackState::Speaking);
        assert_eq!(controller.total_length(), 11);
    }

    #[test]
    fn play_blank_text_is_rejected_without_request() {
        let mut engine = MockSpeechEngine::new();
        engine.expect_speak().never();
        engine.expect_cancel_all().never();

        let (mut controller, _rx) =
            PlaybackController::new(Box::new(engine), PlaybackConfig::default());
        controller.set_text("   ");
        assert_eq!(controller.play(), Err(VoiceError::EmptyInput));
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn seek_forward_restarts_at_new_offset() {
        let mut engine = MockSpeechEngine::new();
        engine.expect_cancel_all().return_const(());
        engine
            .expect_speak()
            .withf(|req| req.start_offset_base == 0)
            .times(1)
            .returning(|req| Ok(UtteranceHandle::new(req.generation)));
        engine
            .expect_speak()
            .withf(|req| req.start_offset_base == 170 && req.text_slice.chars().count() == 330)
            .times(1)
            .returning(|req| Ok(UtteranceHandle::new(req.generation)));

        let (mut controller, _rx) =
            PlaybackController::new(Box::new(engine), PlaybackConfig::default());
        controller.set_text(text_of(500));
        controller.play().unwrap();
        started(&mut controller);
        boundary(&mut controller, Some(120));

        controller.seek_forward().unwrap();
        started(&mut controller);

        assert_eq!(controller.current_offset(), 170);
        assert_eq!(controller.state(), PlaybackState::Speaking);
    }

    #[test]
    fn paused_seek_pauses_after_start() {
        let mut engine = MockSpeechEngine::new();
        engine.expect_cancel_all().return_const(());
        engine
            .expect_speak()
            .returning(|req| Ok(UtteranceHandle::new(req.generation)));
        // once for the user pause, once for the re-pause after restart
        engine.expect_pause().times(2).return_const(());

        let (mut controller, _rx) =
            PlaybackController::new(Box::new(engine), PlaybackConfig::default());
        controller.set_text(text_of(500));
        controller.play().unwrap();
        started(&mut controller);
        boundary(&mut controller, Some(200));
        controller.pause().unwrap();

        controller.seek_backward().unwrap();
        assert_eq!(controller.state(), PlaybackState::Paused);

        started(&mut controller);
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert_eq!(controller.current_offset(), 150);
    }

    #[test]
    fn rate_change_while_idle_issues_nothing() {
        let mut engine = MockSpeechEngine::new();
        engine.expect_speak().never();

        let (mut controller, mut rx) =
            PlaybackController::new(Box::new(engine), PlaybackConfig::default());
        controller.rate_up().unwrap();

        assert!((controller.rate() - 1.25).abs() < f32::EPSILON);
        assert_eq!(rx.try_recv().unwrap(), PlaybackEvent::RateChanged(1.25));
    }

    #[test]
    fn rate_is_clamped() {
        let (mut controller, _rx) =
            PlaybackController::new(Box::new(permissive_engine()), PlaybackConfig::default());
        controller.set_rate(9.0).unwrap();
        assert!((controller.rate() - 2.0).abs() < f32::EPSILON);
        controller.set_rate(0.0).unwrap();
        assert!((controller.rate() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn engine_speak_failure_returns_to_idle() {
        let mut engine = MockSpeechEngine::new();
        engine.expect_cancel_all().return_const(());
        engine
            .expect_speak()
            .returning(|_| Err(VoiceError::EngineError("busy".to_string())));

        let (mut controller, _rx) =
            PlaybackController::new(Box::new(engine), PlaybackConfig::default());
        controller.set_text("hello");
        let err = controller.play().unwrap_err();
        assert_eq!(err, VoiceError::EngineError("busy".to_string()));
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn without_engine_every_command_is_unavailable() {
        let (mut controller, mut rx) = PlaybackController::without_engine(PlaybackConfig::default());
        assert!(!controller.is_available());
        assert_eq!(
            rx.try_recv().unwrap(),
            PlaybackEvent::Error(VoiceError::EngineUnavailable)
        );

        controller.set_text("hello");
        assert_eq!(controller.play(), Err(VoiceError::EngineUnavailable));
        assert_eq!(controller.pause(), Err(VoiceError::EngineUnavailable));
        assert_eq!(controller.stop(), Err(VoiceError::EngineUnavailable));
        assert_eq!(controller.seek_forward(), Err(VoiceError::EngineUnavailable));
        assert_eq!(controller.rate_up(), Err(VoiceError::EngineUnavailable));
        assert!(!controller.snapshot().engine_available);
    }

    #[test]
    fn poll_selects_bengali_voice() {
        let mut engine = MockSpeechEngine::new();
        engine.expect_list_voices().returning(|| {
            vec![
                VoiceDescriptor::new("en", "Alex", "en-US", true),
                VoiceDescriptor::new("bn", "Bangla", "bn-BD", false),
            ]
        });

        let (mut controller, _rx) =
            PlaybackController::new(Box::new(engine), PlaybackConfig::default());
        assert_eq!(controller.poll_voices(), PollOutcome::Ready);
        assert_eq!(controller.selected_voice(), Some("bn"));
    }

    #[test]
    fn configured_voice_wins_over_heuristic() {
        let mut engine = MockSpeechEngine::new();
        engine.expect_list_voices().returning(|| {
            vec![
                VoiceDescriptor::new("en", "Alex", "en-US", true),
                VoiceDescriptor::new("bn", "Bangla", "bn-BD", false),
            ]
        });

        let config = PlaybackConfig {
            preferred_voice: Some("en".to_string()),
            ..Default::default()
        };
        let (mut controller, _rx) = PlaybackController::new(Box::new(engine), config);
        controller.poll_voices();
        assert_eq!(controller.selected_voice(), Some("en"));
    }

    #[test]
    fn select_unknown_voice_is_rejected() {
        let (mut controller, _rx) =
            PlaybackController::new(Box::new(permissive_engine()), PlaybackConfig::default());
        assert_eq!(
            controller.select_voice(Some("ghost".to_string())),
            Err(VoiceError::UnknownVoice("ghost".to_string()))
        );
        assert!(controller.select_voice(None).is_ok());
    }

    #[test]
    fn selected_voice_is_sent_with_request() {
        let mut engine = MockSpeechEngine::new();
        engine
            .expect_list_voices()
            .returning(|| vec![VoiceDescriptor::new("v1", "Voice", "en-US", false)]);
        engine.expect_cancel_all().return_const(());
        engine
            .expect_speak()
            .withf(|req| req.voice_id.as_deref() == Some("v1"))
            .times(1)
            .returning(|req| Ok(UtteranceHandle::new(req.generation)));

        let (mut controller, _rx) =
            PlaybackController::new(Box::new(engine), PlaybackConfig::default());
        controller.poll_voices();
        controller.select_voice(Some("v1".to_string())).unwrap();
        controller.set_text("hello");
        controller.play().unwrap();
    }

    #[test]
    fn snapshot_reflects_state() {
        let (mut controller, _rx) =
            PlaybackController::new(Box::new(permissive_engine()), PlaybackConfig::default());
        controller.set_text("আমার সোনার বাংলা");
        controller.play().unwrap();
        started(&mut controller);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Speaking);
        assert_eq!(snapshot.script_hint, ScriptHint::Bengali);
        assert_eq!(snapshot.total, 16);
        assert_eq!(snapshot.catalog_status, CatalogStatus::Loading);
    }
}
