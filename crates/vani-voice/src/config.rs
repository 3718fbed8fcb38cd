//! Playback configuration and validation.
//!
//! Pure data types with serde support so the CLI (or any UI bridge) can load
//! them from a JSON file. Every field has a default, so partial files work.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Characters skipped by a single rewind/forward (about five seconds of speech).
pub const DEFAULT_SKIP_CHARS: usize = 50;

/// Rate change applied by a single rate-up/rate-down.
pub const DEFAULT_RATE_STEP: f32 = 0.25;

/// Slowest supported speaking rate.
pub const MIN_RATE: f32 = 0.5;

/// Fastest supported speaking rate.
pub const MAX_RATE: f32 = 2.0;

/// Delay between voice catalog polls.
pub const DEFAULT_VOICE_POLL_INTERVAL_MS: u64 = 100;

/// Number of empty polls tolerated before the catalog is declared unavailable.
pub const DEFAULT_MAX_VOICE_POLL_ATTEMPTS: u32 = 50;

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackConfig {
    /// Characters skipped by `seek_backward` / `seek_forward`.
    pub skip_chars: usize,

    /// Rate delta applied by `rate_up` / `rate_down`.
    pub rate_step: f32,

    /// Lower rate clamp.
    pub min_rate: f32,

    /// Upper rate clamp.
    pub max_rate: f32,

    /// Rate used when the controller is created.
    pub initial_rate: f32,

    /// Delay between voice catalog polls, in milliseconds.
    pub voice_poll_interval_ms: u64,

    /// Empty polls tolerated before giving up on the catalog.
    pub max_voice_poll_attempts: u32,

    /// Voice id to select once the catalog loads, overriding the Bengali heuristic.
    pub preferred_voice: Option<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            skip_chars: DEFAULT_SKIP_CHARS,
            rate_step: DEFAULT_RATE_STEP,
            min_rate: MIN_RATE,
            max_rate: MAX_RATE,
            initial_rate: 1.0,
            voice_poll_interval_ms: DEFAULT_VOICE_POLL_INTERVAL_MS,
            max_voice_poll_attempts: DEFAULT_MAX_VOICE_POLL_ATTEMPTS,
            preferred_voice: None,
        }
    }
}

impl PlaybackConfig {
    /// Poll interval as a [`Duration`].
    #[must_use]
    pub const fn voice_poll_interval(&self) -> Duration {
        Duration::from_millis(self.voice_poll_interval_ms)
    }

    /// Clamp a rate into the configured range.
    ///
    /// Unlike `f32::clamp` this never panics on an unvalidated range; a NaN
    /// rate maps to `min_rate`.
    #[must_use]
    pub fn clamp_rate(&self, rate: f32) -> f32 {
        if rate.is_nan() {
            return self.min_rate;
        }
        rate.max(self.min_rate).min(self.max_rate)
    }
}

/// Configuration validation / loading error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Rate range must satisfy 0 < min <= max, got {min}..={max}")]
    InvalidRateRange { min: f32, max: f32 },

    #[error("Initial rate {rate} is outside {min}..={max}")]
    InitialRateOutOfRange { rate: f32, min: f32, max: f32 },

    #[error("Rate step must be positive, got {0}")]
    InvalidRateStep(f32),

    #[error("Skip amount must be at least one character")]
    ZeroSkip,

    #[error("Voice poll interval must be positive")]
    ZeroPollInterval,

    #[error("Preferred voice id cannot be empty")]
    EmptyPreferredVoice,

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Validate configuration values.
pub fn validate_config(config: &PlaybackConfig) -> Result<(), ConfigError> {
    if !(config.min_rate > 0.0 && config.min_rate <= config.max_rate) {
        return Err(ConfigError::InvalidRateRange {
            min: config.min_rate,
            max: config.max_rate,
        });
    }

    if !(config.min_rate..=config.max_rate).contains(&config.initial_rate) {
        return Err(ConfigError::InitialRateOutOfRange {
            rate: config.initial_rate,
            min: config.min_rate,
            max: config.max_rate,
        });
    }

    if config.rate_step <= 0.0 || !config.rate_step.is_finite() {
        return Err(ConfigError::InvalidRateStep(config.rate_step));
    }

    if config.skip_chars == 0 {
        return Err(ConfigError::ZeroSkip);
    }

    if config.voice_poll_interval_ms == 0 {
        return Err(ConfigError::ZeroPollInterval);
    }

    if config
        .preferred_voice
        .as_ref()
        .is_some_and(|v| v.trim().is_empty())
    {
        return Err(ConfigError::EmptyPreferredVoice);
    }

    Ok(())
}

/// Load and validate a JSON config file.
pub fn load_config(path: &Path) -> Result<PlaybackConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: PlaybackConfig = serde_json::from_str(&content)?;
    validate_config(&config)?;
    tracing::debug!(path = %path.display(), "Loaded playback config");
    Ok(config)
}
