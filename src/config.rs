//! Engine configuration parameters
//!
//! All tunable timing for polling and alarm effects.  Values can be
//! overridden from a JSON file shipped with the app build.

use std::path::Path;

use anyhow::Context;
use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Maximum number of on/off segments in a vibration pattern.
pub const MAX_PATTERN_LEN: usize = 8;

/// Vibration pattern in milliseconds, alternating buzz / pause.
pub type VibrationPattern = Vec<u32, MAX_PATTERN_LEN>;

/// Core engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // --- Polling ---
    /// Poll interval for the foreground alarm hook (milliseconds)
    pub foreground_interval_ms: u32,
    /// Poll interval while the setup test screen is open (milliseconds)
    pub test_mode_interval_ms: u32,

    // --- Persistent alarm ---
    /// Period between repeated vibration bursts (milliseconds)
    pub vibration_period_ms: u32,
    /// Buzz/pause segments of one burst (milliseconds)
    pub vibration_pattern: VibrationPattern,

    // --- Transient banner ---
    /// Delay before a motion/sound banner clears itself (milliseconds)
    pub transient_dismiss_ms: u32,

    // --- Runtime ---
    /// Resolution of the alarm clock task (milliseconds)
    pub alarm_tick_ms: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Polling
            foreground_interval_ms: 5000,
            test_mode_interval_ms: 1000,

            // Persistent alarm
            vibration_period_ms: 3500,
            vibration_pattern: default_pattern(),

            // Transient banner
            transient_dismiss_ms: 1000,

            // Runtime
            alarm_tick_ms: 100,
        }
    }
}

const DEFAULT_PATTERN: [u32; 5] = [500, 200, 500, 200, 500];
const _: () = assert!(DEFAULT_PATTERN.len() <= MAX_PATTERN_LEN);

fn default_pattern() -> VibrationPattern {
    VibrationPattern::from_slice(&DEFAULT_PATTERN).unwrap_or_default()
}

impl EngineConfig {
    /// Total length of one vibration burst.
    pub fn pattern_duration_ms(&self) -> u32 {
        self.vibration_pattern.iter().sum()
    }

    /// Reject values that would produce a broken alarm loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.foreground_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("foreground_interval_ms must be > 0"));
        }
        if self.test_mode_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("test_mode_interval_ms must be > 0"));
        }
        if self.vibration_pattern.is_empty() {
            return Err(ConfigError::ValidationFailed("vibration_pattern is empty"));
        }
        if self.vibration_pattern.len() % 2 == 0 {
            return Err(ConfigError::ValidationFailed(
                "vibration_pattern must start and end with a buzz",
            ));
        }
        if self.vibration_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("vibration_period_ms must be > 0"));
        }
        if self.pattern_duration_ms() > self.vibration_period_ms {
            return Err(ConfigError::ValidationFailed(
                "vibration_pattern outlasts vibration_period_ms",
            ));
        }
        if self.transient_dismiss_ms == 0 {
            return Err(ConfigError::ValidationFailed("transient_dismiss_ms must be > 0"));
        }
        if self.alarm_tick_ms == 0 {
            return Err(ConfigError::ValidationFailed("alarm_tick_ms must be > 0"));
        }
        Ok(())
    }

    /// Parse and validate a JSON document.  Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }
}

/// Load a config file from disk.
pub fn load_file(path: impl AsRef<Path>) -> anyhow::Result<EngineConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading engine config {}", path.display()))?;
    EngineConfig::from_json(&text)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("parsing engine config {}", path.display()))
}
