//! Terminal formatting for playback status and voice lists.
//!
//! Format-only: no controller state is changed here.

use std::fmt::Write;

use vani_voice::{CatalogStatus, PlaybackSnapshot, PlaybackState, VoiceError, VoiceGroup};

/// Width of the progress bar in cells.
const BAR_WIDTH: usize = 20;

/// Short label for a transport state.
pub const fn state_label(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Idle => "idle",
        PlaybackState::Speaking => "speaking",
        PlaybackState::Paused => "paused",
    }
}

/// `[#####---------------]  120/500  24%  speaking @1.00x`
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn format_progress(snapshot: &PlaybackSnapshot) -> String {
    let fraction = snapshot.progress.clamp(0.0, 1.0);
    let filled = ((fraction * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!(
        "[{}{}] {:>5}/{:<5} {:>3.0}%  {} @{:.2}x",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        snapshot.offset,
        snapshot.total,
        fraction * 100.0,
        state_label(snapshot.state),
        snapshot.rate,
    )
}

/// Voice list grouped by language; the selected voice is starred.
pub fn format_voice_groups(groups: &[VoiceGroup], selected: Option<&str>) -> String {
    let mut out = String::new();
    for group in groups {
        let _ = writeln!(out, "{}:", group.language);
        for voice in &group.voices {
            let marker = if selected == Some(voice.id.as_str()) { '*' } else { ' ' };
            let _ = writeln!(out, "  {marker} {:<24} {}", voice.id, voice.label());
        }
    }
    out
}

/// One-line catalog summary.
pub fn format_catalog_status(status: CatalogStatus, voice_count: usize) -> String {
    match status {
        CatalogStatus::Loading => "Loading voices...".to_string(),
        CatalogStatus::Ready => format!("{voice_count} voice(s) available"),
        CatalogStatus::Unavailable => VoiceError::NoVoicesAvailable.to_string(),
    }
}
