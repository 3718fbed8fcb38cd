//! `PlaybackService` — runs a [`PlaybackController`] on its own tokio task.
//!
//! The controller is a synchronous `&mut self` state machine. The service
//! gives it a single owner: one task that serializes user commands, engine
//! notifications and voice-poll timer ticks, so none of them can interleave
//! with each other.
//!
//! Callers talk to the task through a cloneable [`PlaybackHandle`]. Every
//! request carries a oneshot reply channel; if the task is gone the request
//! fails with [`VoiceError::ServiceStopped`]. Controller events are
//! re-published on a broadcast channel so any number of UIs can subscribe.

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::backend::simulated::{SimulatedEngine, SimulatedEngineOptions};
use crate::backend::{EngineEventReceiver, engine_channel};
use crate::catalog::PollOutcome;
use crate::config::PlaybackConfig;
use crate::controller::{PlaybackController, PlaybackEvent, PlaybackSnapshot};
use crate::error::VoiceError;
use crate::script::ScriptHint;

/// Capacity of the broadcast channel carrying [`PlaybackEvent`]s.
const EVENT_CAPACITY: usize = 256;

// ── Port ───────────────────────────────────────────────────────────

/// Transport-agnostic playback interface used by front-ends.
#[async_trait]
pub trait PlaybackPort: Send + Sync {
    /// Replace the text buffer; returns its script hint.
    async fn set_text(&self, text: String) -> Result<ScriptHint, VoiceError>;

    async fn play(&self) -> Result<(), VoiceError>;

    async fn play_from(&self, offset: usize) -> Result<(), VoiceError>;

    async fn pause(&self) -> Result<(), VoiceError>;

    async fn resume(&self) -> Result<(), VoiceError>;

    async fn stop(&self) -> Result<(), VoiceError>;

    async fn seek_backward(&self) -> Result<(), VoiceError>;

    async fn seek_forward(&self) -> Result<(), VoiceError>;

    async fn set_rate(&self, rate: f32) -> Result<(), VoiceError>;

    async fn rate_up(&self) -> Result<(), VoiceError>;

    async fn rate_down(&self) -> Result<(), VoiceError>;

    /// `None` selects the engine default.
    async fn select_voice(&self, voice_id: Option<String>) -> Result<(), VoiceError>;

    async fn snapshot(&self) -> Result<PlaybackSnapshot, VoiceError>;
}

// ── Commands ───────────────────────────────────────────────────────

type Reply<T> = oneshot::Sender<Result<T, VoiceError>>;

/// A request sent from a handle to the service task.
enum PlaybackCommand {
    SetText { text: String, reply: Reply<ScriptHint> },
    PlayFrom { offset: usize, reply: Reply<()> },
    Pause { reply: Reply<()> },
    Resume { reply: Reply<()> },
    Stop { reply: Reply<()> },
    SeekBy { delta: isize, reply: Reply<()> },
    SeekBackward { reply: Reply<()> },
    SeekForward { reply: Reply<()> },
    SetRate { rate: f32, reply: Reply<()> },
    RateUp { reply: Reply<()> },
    RateDown { reply: Reply<()> },
    SelectVoice { voice_id: Option<String>, reply: Reply<()> },
    Snapshot { reply: Reply<PlaybackSnapshot> },
    Shutdown,
}

// ── Handle ─────────────────────────────────────────────────────────

/// Cloneable proxy to a running [`PlaybackService`].
#[derive(Clone)]
pub struct PlaybackHandle {
    cmd_tx: mpsc::UnboundedSender<PlaybackCommand>,
    events_tx: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackHandle {
    /// Receive every [`PlaybackEvent`] emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events_tx.subscribe()
    }

    /// Move the position by `delta` characters.
    pub async fn seek_by(&self, delta: isize) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| PlaybackCommand::SeekBy { delta, reply })
            .await
    }

    /// Stop playback and end the service task (fire-and-forget).
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(PlaybackCommand::Shutdown);
    }

    /// Whether the service task is still accepting commands.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.cmd_tx.is_closed()
    }

    /// Send a command and wait for its reply. Channel failures map to
    /// [`VoiceError::ServiceStopped`].
    async fn send_and_recv<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> PlaybackCommand,
    ) -> Result<T, VoiceError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(tx))
            .map_err(|_| VoiceError::ServiceStopped)?;
        rx.await.map_err(|_| VoiceError::ServiceStopped)?
    }
}

#[async_trait]
impl PlaybackPort for PlaybackHandle {
    async fn set_text(&self, text: String) -> Result<ScriptHint, VoiceError> {
        self.send_and_recv(|reply| PlaybackCommand::SetText { text, reply })
            .await
    }

    async fn play(&self) -> Result<(), VoiceError> {
        self.play_from(0).await
    }

    async fn play_from(&self, offset: usize) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| PlaybackCommand::PlayFrom { offset, reply })
            .await
    }

    async fn pause(&self) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| PlaybackCommand::Pause { reply })
            .await
    }

    async fn resume(&self) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| PlaybackCommand::Resume { reply })
            .await
    }

    async fn stop(&self) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| PlaybackCommand::Stop { reply })
            .await
    }

    async fn seek_backward(&self) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| PlaybackCommand::SeekBackward { reply })
            .await
    }

    async fn seek_forward(&self) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| PlaybackCommand::SeekForward { reply })
            .await
    }

    async fn set_rate(&self, rate: f32) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| PlaybackCommand::SetRate { rate, reply })
            .await
    }

    async fn rate_up(&self) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| PlaybackCommand::RateUp { reply })
            .await
    }

    async fn rate_down(&self) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| PlaybackCommand::RateDown { reply })
            .await
    }

    async fn select_voice(&self, voice_id: Option<String>) -> Result<(), VoiceError> {
        self.send_and_recv(|reply| PlaybackCommand::SelectVoice { voice_id, reply })
            .await
    }

    async fn snapshot(&self) -> Result<PlaybackSnapshot, VoiceError> {
        self.send_and_recv(|reply| PlaybackCommand::Snapshot { reply })
            .await
    }
}

// ── Service ────────────────────────────────────────────────────────

/// Owner task for a [`PlaybackController`].
pub struct PlaybackService {
    controller: PlaybackController,
    controller_events: mpsc::UnboundedReceiver<PlaybackEvent>,
    engine_events: EngineEventReceiver,
    cmd_rx: mpsc::UnboundedReceiver<PlaybackCommand>,
    events_tx: broadcast::Sender<PlaybackEvent>,
    next_poll: Option<Instant>,
}

impl PlaybackService {
    /// Spawn the service task.
    ///
    /// `controller_events` is the receiver returned alongside the controller;
    /// `engine_events` is the receiving end of the channel the controller's
    /// engine reports on. Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(
        controller: PlaybackController,
        controller_events: mpsc::UnboundedReceiver<PlaybackEvent>,
        engine_events: EngineEventReceiver,
    ) -> (PlaybackHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let service = Self {
            controller,
            controller_events,
            engine_events,
            cmd_rx,
            events_tx: events_tx.clone(),
            next_poll: Some(Instant::now()),
        };

        let task = tokio::spawn(service.run());
        (PlaybackHandle { cmd_tx, events_tx }, task)
    }

    /// Spawn a service around a [`SimulatedEngine`].
    #[must_use]
    pub fn spawn_simulated(
        config: PlaybackConfig,
        options: SimulatedEngineOptions,
    ) -> (PlaybackHandle, JoinHandle<()>) {
        let (engine_tx, engine_rx) = engine_channel();
        let engine = SimulatedEngine::new(engine_tx, options);
        let (controller, controller_events) = PlaybackController::new(Box::new(engine), config);
        Self::spawn(controller, controller_events, engine_rx)
    }

    // ── Event loop ─────────────────────────────────────────────────

    async fn run(mut self) {
        tracing::debug!("Playback service started");

        loop {
            let next_poll = self.next_poll;
            let poll_due = async move {
                match next_poll {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(PlaybackCommand::Shutdown) | None => break,
                    Some(cmd) => self.dispatch(cmd),
                },

                Some(event) = self.controller_events.recv() => self.publish(event),

                Some(event) = self.engine_events.recv() => {
                    if let Some(outcome) = self.controller.handle_engine_event(event) {
                        self.schedule_poll(outcome);
                    }
                }

                () = poll_due => {
                    let outcome = self.controller.poll_voices();
                    self.schedule_poll(outcome);
                }
            }
        }

        if self.controller.state().is_active() {
            let _ = self.controller.stop();
        }
        while let Ok(event) = self.controller_events.try_recv() {
            self.publish(event);
        }
        tracing::debug!("Playback service stopped");
    }

    fn schedule_poll(&mut self, outcome: PollOutcome) {
        self.next_poll = match outcome {
            PollOutcome::Retry => {
                Some(Instant::now() + self.controller.config().voice_poll_interval())
            }
            PollOutcome::Ready | PollOutcome::Exhausted => None,
        };
    }

    fn publish(&self, event: PlaybackEvent) {
        // No subscribers is fine; events are advisory.
        let _ = self.events_tx.send(event);
    }

    fn dispatch(&mut self, cmd: PlaybackCommand) {
        let c = &mut self.controller;
        match cmd {
            PlaybackCommand::SetText { text, reply } => {
                let _ = reply.send(Ok(c.set_text(text)));
            }
            PlaybackCommand::PlayFrom { offset, reply } => {
                let _ = reply.send(c.play_from(offset));
            }
            PlaybackCommand::Pause { reply } => {
                let _ = reply.send(c.pause());
            }
            PlaybackCommand::Resume { reply } => {
                let _ = reply.send(c.resume());
            }
            PlaybackCommand::Stop { reply } => {
                let _ = reply.send(c.stop());
            }
            PlaybackCommand::SeekBy { delta, reply } => {
                let _ = reply.send(c.seek_by(delta));
            }
            PlaybackCommand::SeekBackward { reply } => {
                let _ = reply.send(c.seek_backward());
            }
            PlaybackCommand::SeekForward { reply } => {
                let _ = reply.send(c.seek_forward());
            }
            PlaybackCommand::SetRate { rate, reply } => {
                let _ = reply.send(c.set_rate(rate));
            }
            PlaybackCommand::RateUp { reply } => {
                let _ = reply.send(c.rate_up());
            }
            PlaybackCommand::RateDown { reply } => {
                let _ = reply.send(c.rate_down());
            }
            PlaybackCommand::SelectVoice { voice_id, reply } => {
                let _ = reply.send(c.select_voice(voice_id));
            }
            PlaybackCommand::Snapshot { reply } => {
                let _ = reply.send(Ok(c.snapshot()));
            }
            PlaybackCommand::Shutdown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::PlaybackState;

    #[tokio::test(start_paused = true)]
    async fn snapshot_round_trips_through_task() {
        let (handle, _task) =
            PlaybackService::spawn_simulated(PlaybackConfig::default(), SimulatedEngineOptions::default());

        let hint = handle.set_text("hello there".to_string()).await.unwrap();
        assert_eq!(hint, ScriptHint::Other);

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Idle);
        assert!(snapshot.engine_available);
    }

    #[tokio::test(start_paused = true)]
    async fn requests_after_shutdown_fail() {
        let (handle, task) =
            PlaybackService::spawn_simulated(PlaybackConfig::default(), SimulatedEngineOptions::default());

        handle.shutdown();
        task.await.unwrap();

        assert!(!handle.is_running());
        assert_eq!(handle.play().await, Err(VoiceError::ServiceStopped));
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_engine_rejects_commands() {
        let (engine_tx, engine_rx) = engine_channel();
        drop(engine_tx);
        let (controller, events) = PlaybackController::without_engine(PlaybackConfig::default());
        let (handle, _task) = PlaybackService::spawn(controller, events, engine_rx);

        handle.set_text("text".to_string()).await.unwrap();
        assert_eq!(handle.play().await, Err(VoiceError::EngineUnavailable));
        assert!(!handle.snapshot().await.unwrap().engine_available);
    }
}
