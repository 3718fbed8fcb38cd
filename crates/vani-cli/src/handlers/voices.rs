//! `vani voices` — list the engine's voice catalog.

use vani_voice::{CatalogStatus, PlaybackConfig, PlaybackService, VoiceError};

use super::{engine_options, wait_for_catalog};
use crate::error::CliError;
use crate::presentation::{format_catalog_status, format_voice_groups};

pub async fn execute(
    config: PlaybackConfig,
    ready_after: Option<u32>,
    no_voices: bool,
) -> Result<(), CliError> {
    let (handle, task) =
        PlaybackService::spawn_simulated(config, engine_options(ready_after, no_voices));
    let mut events = handle.subscribe();

    let snapshot = wait_for_catalog(&handle, &mut events).await;
    handle.shutdown();
    let _ = task.await;
    let snapshot = snapshot?;

    if snapshot.catalog_status == CatalogStatus::Unavailable {
        return Err(VoiceError::NoVoicesAvailable.into());
    }

    let count = snapshot.voice_groups.iter().map(|g| g.voices.len()).sum();
    println!("{}", format_catalog_status(snapshot.catalog_status, count));
    print!(
        "{}",
        format_voice_groups(&snapshot.voice_groups, snapshot.selected_voice.as_deref())
    );
    Ok(())
}
