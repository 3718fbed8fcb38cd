//! Command handlers.
//!
//! Handlers are thin: read input, talk to the playback service through
//! [`PlaybackPort`](vani_voice::PlaybackPort), format output.

pub mod detect;
pub mod read;
pub mod voices;

use tokio::sync::broadcast;
use vani_voice::{
    CatalogStatus, PlaybackEvent, PlaybackHandle, PlaybackPort, PlaybackSnapshot,
    SimulatedEngineOptions, VoiceError,
};

/// Engine options for the simulated platform.
pub fn engine_options(ready_after: Option<u32>, no_voices: bool) -> SimulatedEngineOptions {
    SimulatedEngineOptions {
        voices_ready_after: if no_voices {
            None
        } else {
            Some(ready_after.unwrap_or(1))
        },
        ..SimulatedEngineOptions::default()
    }
}

/// Wait until the voice catalog has settled (ready or unavailable).
pub async fn wait_for_catalog(
    handle: &PlaybackHandle,
    events: &mut broadcast::Receiver<PlaybackEvent>,
) -> Result<PlaybackSnapshot, VoiceError> {
    loop {
        let snapshot = handle.snapshot().await?;
        if snapshot.catalog_status != CatalogStatus::Loading {
            return Ok(snapshot);
        }
        match events.recv().await {
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => return Err(VoiceError::ServiceStopped),
        }
    }
}
