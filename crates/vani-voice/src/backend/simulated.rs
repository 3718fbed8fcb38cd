//! In-process speech engine driven by tokio timers.
//!
//! Produces no audio. Each utterance "speaks" its text at a fixed character
//! rate (scaled by the request's rate multiplier) and reports `Started`, one
//! `Boundary` per word, and `Ended`, the way a platform engine would.
//!
//! Like browser engines, canceling an utterance makes it report an
//! `"interrupted"` error under its own generation, and the voice list can be
//! configured to stay empty for the first few polls.
//!
//! `speak` spawns onto the current tokio runtime and must be called from
//! within one.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{
    EngineEvent, EngineEventSender, Generation, SpeechEngine, UtteranceEvent, UtteranceHandle,
    UtteranceRequest, VoiceDescriptor,
};
use crate::error::VoiceError;

/// Characters per second spoken at rate 1.0 (roughly 180 words per minute).
pub const DEFAULT_CHARS_PER_SECOND: f64 = 15.0;

/// Tunables for [`SimulatedEngine`].
#[derive(Debug, Clone)]
pub struct SimulatedEngineOptions {
    /// Voices reported once the list is "loaded".
    pub voices: Vec<VoiceDescriptor>,

    /// The voice list is empty for the first `voices_ready_after - 1` calls
    /// to `list_voices`. `None` keeps it empty forever.
    pub voices_ready_after: Option<u32>,

    /// Speaking speed at rate 1.0.
    pub chars_per_second: f64,

    /// When set, every `speak` call is rejected with this reason.
    pub reject_speak: Option<String>,
}

impl Default for SimulatedEngineOptions {
    fn default() -> Self {
        Self {
            voices: default_voices(),
            voices_ready_after: Some(1),
            chars_per_second: DEFAULT_CHARS_PER_SECOND,
            reject_speak: None,
        }
    }
}

/// A small mixed-language voice list.
#[must_use]
pub fn default_voices() -> Vec<VoiceDescriptor> {
    vec![
        VoiceDescriptor::new("sim-en-us", "Simulated English", "en-US", true),
        VoiceDescriptor::new("sim-en-gb", "Simulated British", "en-GB", false),
        VoiceDescriptor::new("sim-bn-bd", "Simulated Bangla", "bn-BD", false),
        VoiceDescriptor::new("sim-bn-in", "Simulated Bengali (India)", "bn-IN", false),
    ]
}

struct RunningUtterance {
    handle: UtteranceHandle,
    task: JoinHandle<()>,
    paused_tx: watch::Sender<bool>,
}

/// Timer-based [`SpeechEngine`].
pub struct SimulatedEngine {
    events: EngineEventSender,
    options: SimulatedEngineOptions,
    list_calls: AtomicU32,
    current: Option<RunningUtterance>,
}

impl SimulatedEngine {
    /// Create an engine that reports through `events`.
    #[must_use]
    pub const fn new(events: EngineEventSender, options: SimulatedEngineOptions) -> Self {
        Self {
            events,
            options,
            list_calls: AtomicU32::new(0),
            current: None,
        }
    }

    /// Number of `list_voices` calls so far.
    #[must_use]
    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::Relaxed)
    }

    /// Announce that the voice list changed.
    pub fn notify_voices_changed(&self) {
        let _ = self.events.send(EngineEvent::VoicesChanged);
    }

    fn send(&self, generation: Generation, event: UtteranceEvent) {
        let _ = self.events.send(EngineEvent::utterance(generation, event));
    }
}

impl SpeechEngine for SimulatedEngine {
    fn list_voices(&self) -> Vec<VoiceDescriptor> {
        let calls = self.list_calls.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        match self.options.voices_ready_after {
            Some(ready_after) if calls >= ready_after => self.options.voices.clone(),
            _ => Vec::new(),
        }
    }

    fn speak(&mut self, request: UtteranceRequest) -> Result<UtteranceHandle, VoiceError> {
        if let Some(reason) = &self.options.reject_speak {
            return Err(VoiceError::EngineError(reason.clone()));
        }
        if !(request.rate.is_finite() && request.rate > 0.0) {
            return Err(VoiceError::EngineError(format!("invalid rate {}", request.rate)));
        }
        let speed = self.options.chars_per_second;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(VoiceError::EngineError(format!("invalid speaking speed {speed}")));
        }

        // One utterance at a time, like the platform queue after cancel.
        self.cancel_all();

        let handle = UtteranceHandle::new(request.generation);
        let (paused_tx, paused_rx) = watch::channel(false);
        let chars_per_second = self.options.chars_per_second * f64::from(request.rate);

        tracing::trace!(
            generation = %request.generation,
            chars = request.text_slice.chars().count(),
            chars_per_second,
            "Simulated utterance issued"
        );

        let task = tokio::spawn(run_utterance(
            request.generation,
            request.text_slice,
            chars_per_second,
            self.events.clone(),
            paused_rx,
        ));

        self.current = Some(RunningUtterance {
            handle,
            task,
            paused_tx,
        });
        Ok(handle)
    }

    fn pause(&mut self, handle: UtteranceHandle) {
        if let Some(current) = self.current.as_ref().filter(|c| c.handle == handle) {
            if !current.paused_tx.send_replace(true) {
                self.send(handle.generation, UtteranceEvent::Paused);
            }
        }
    }

    fn resume(&mut self, handle: UtteranceHandle) {
        if let Some(current) = self.current.as_ref().filter(|c| c.handle == handle) {
            if current.paused_tx.send_replace(false) {
                self.send(handle.generation, UtteranceEvent::Resumed);
            }
        }
    }

    fn cancel_all(&mut self) {
        if let Some(current) = self.current.take() {
            current.task.abort();
            if !current.task.is_finished() {
                self.send(
                    current.handle.generation,
                    UtteranceEvent::Error("interrupted".to_string()),
                );
            }
        }
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        if let Some(current) = self.current.take() {
            current.task.abort();
        }
    }
}

/// Char indices at which a word starts.
fn word_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut prev_is_space = true;
    for (i, c) in text.chars().enumerate() {
        let is_space = c.is_whitespace();
        if prev_is_space && !is_space {
            starts.push(i);
        }
        prev_is_space = is_space;
    }
    starts
}

#[allow(clippy::cast_precision_loss)]
fn speaking_time(chars: usize, chars_per_second: f64) -> Duration {
    Duration::from_secs_f64(chars as f64 / chars_per_second)
}

/// Sleep for `duration` of unpaused time.
///
/// Returns `false` if the engine dropped the pause channel.
async fn speak_for(duration: Duration, paused_rx: &mut watch::Receiver<bool>) -> bool {
    let mut remaining = duration;
    loop {
        let unpaused = paused_rx.wait_for(|paused| !*paused).await.is_ok();
        if !unpaused {
            return false;
        }

        let started = tokio::time::Instant::now();
        tokio::select! {
            () = tokio::time::sleep(remaining) => return true,
            changed = paused_rx.changed() => {
                if changed.is_err() {
                    return false;
                }
                remaining = remaining.saturating_sub(started.elapsed());
            }
        }
    }
}

async fn run_utterance(
    generation: Generation,
    text: String,
    chars_per_second: f64,
    events: EngineEventSender,
    mut paused_rx: watch::Receiver<bool>,
) {
    let send = |event| {
        let _ = events.send(EngineEvent::utterance(generation, event));
    };

    send(UtteranceEvent::Started);

    let total = text.chars().count();
    let mut position = 0;
    for start in word_starts(&text) {
        if !speak_for(speaking_time(start - position, chars_per_second), &mut paused_rx).await {
            return;
        }
        position = start;
        send(UtteranceEvent::Boundary {
            char_index: Some(start),
        });
    }

    if !speak_for(speaking_time(total - position, chars_per_second), &mut paused_rx).await {
        return;
    }
    send(UtteranceEvent::Ended);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::engine_channel;

    fn request(generation: u64, text: &str) -> UtteranceRequest {
        UtteranceRequest {
            generation: Generation(generation),
            text_slice: text.to_string(),
            rate: 1.0,
            voice_id: None,
            start_offset_base: 0,
        }
    }

    #[test]
    fn word_starts_skip_whitespace_runs() {
        assert_eq!(word_starts("hi  there you"), vec![0, 4, 10]);
        assert_eq!(word_starts("  lead"), vec![2]);
        assert_eq!(word_starts("আমার সোনার"), vec![0, 5]);
        assert!(word_starts("   ").is_empty());
    }

    #[test]
    fn voices_appear_after_configured_polls() {
        let (tx, _rx) = engine_channel();
        let engine = SimulatedEngine::new(
            tx,
            SimulatedEngineOptions {
                voices_ready_after: Some(3),
                ..Default::default()
            },
        );
        assert!(engine.list_voices().is_empty());
        assert!(engine.list_voices().is_empty());
        assert_eq!(engine.list_voices().len(), 4);
        assert_eq!(engine.list_calls(), 3);
    }

    #[test]
    fn voices_never_ready() {
        let (tx, _rx) = engine_channel();
        let engine = SimulatedEngine::new(
            tx,
            SimulatedEngineOptions {
                voices_ready_after: None,
                ..Default::default()
            },
        );
        for _ in 0..100 {
            assert!(engine.list_voices().is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn utterance_reports_words_and_end() {
        let (tx, mut rx) = engine_channel();
        let mut engine = SimulatedEngine::new(tx, SimulatedEngineOptions::default());
        engine.speak(request(1, "one two")).unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            let done = matches!(
                event,
                EngineEvent::Utterance {
                    event: UtteranceEvent::Ended,
                    ..
                }
            );
            events.push(event);
            if done {
                break;
            }
        }

        let g = Generation(1);
        assert_eq!(
            events,
            vec![
                EngineEvent::utterance(g, UtteranceEvent::Started),
                EngineEvent::utterance(g, UtteranceEvent::Boundary { char_index: Some(0) }),
                EngineEvent::utterance(g, UtteranceEvent::Boundary { char_index: Some(4) }),
                EngineEvent::utterance(g, UtteranceEvent::Ended),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_reports_interrupted_under_old_generation() {
        let (tx, mut rx) = engine_channel();
        let mut engine = SimulatedEngine::new(tx, SimulatedEngineOptions::default());
        engine.speak(request(1, "a fairly long sentence to speak")).unwrap();
        engine.cancel_all();

        assert_eq!(
            rx.recv().await.unwrap(),
            EngineEvent::utterance(Generation(1), UtteranceEvent::Error("interrupted".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pause_and_resume_are_reported() {
        let (tx, mut rx) = engine_channel();
        let mut engine = SimulatedEngine::new(tx, SimulatedEngineOptions::default());
        let handle = engine.speak(request(1, "hello world")).unwrap();

        engine.pause(handle);
        engine.pause(handle);
        engine.resume(handle);

        assert_eq!(
            rx.recv().await.unwrap(),
            EngineEvent::utterance(Generation(1), UtteranceEvent::Paused)
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            EngineEvent::utterance(Generation(1), UtteranceEvent::Resumed)
        );
    }

    #[test]
    fn zero_speaking_speed_is_rejected() {
        let (tx, _rx) = engine_channel();
        let mut engine = SimulatedEngine::new(
            tx,
            SimulatedEngineOptions {
                chars_per_second: 0.0,
                ..Default::default()
            },
        );
        assert!(matches!(
            engine.speak(request(1, "hi")),
            Err(VoiceError::EngineError(_))
        ));
    }

    #[test]
    fn rejected_speak_is_an_error() {
        let (tx, _rx) = engine_channel();
        let mut engine = SimulatedEngine::new(
            tx,
            SimulatedEngineOptions {
                reject_speak: Some("no audio device".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(
            engine.speak(request(1, "hi")),
            Err(VoiceError::EngineError("no audio device".to_string()))
        );
    }
}
