use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Complete runtime configuration.
///
/// Values come from (in increasing priority) the built-in defaults, an
/// `autovol.toml` config file, and explicit CLI flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Friendly name of the playback device (used by the CLI backend).
    pub device_name: String,
    /// Hard floor for any volume change, manual or automatic (0-100).
    pub volume_min: i32,
    /// Hard ceiling for any volume change, manual or automatic (0-100).
    pub volume_max: i32,
    /// Ceiling for automatic adjustments only; manual changes may exceed it.
    pub volume_baseline_max: i32,
    /// User-adjustable loudness reference in dB.
    pub target_db: f32,
    /// Level above which content counts as loud.
    pub threshold_loud: f32,
    /// Level below which content counts as quiet.
    pub threshold_quiet: f32,
    /// Base volume step for the adjustment strategies (1-10).
    pub adjustment_step: i32,
    /// Minimum seconds between automatic adjustments outside silence.
    pub min_adjustment_interval: f32,
    /// Seconds automation stands down after a manual volume change.
    pub manual_pause_duration: f32,
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Frame length in seconds (0, 1.0].
    pub chunk_duration: f32,
    /// Capacity of the loudness/classification history windows.
    pub smoothing_window: usize,
    /// RMS level frames are rescaled toward before spectral analysis.
    pub normalization_target_rms: f32,
    /// Upper bound on the normalization gain.
    pub normalization_max_factor: f32,
    /// Levels below this (or exactly -inf) count as silence.
    pub silence_threshold_db: f32,
    /// Minimum normalized score for a dialogue verdict.
    pub dialogue_threshold: f32,
    /// Minimum normalized score for a music verdict.
    pub music_threshold: f32,
    /// Recalibrate loudness thresholds from manual volume changes.
    pub adaptive_thresholds: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_name: "Living Room TV".into(),
            volume_min: 20,
            volume_max: 85,
            volume_baseline_max: 75,
            target_db: -25.0,
            threshold_loud: -20.0,
            threshold_quiet: -45.0,
            adjustment_step: 6,
            min_adjustment_interval: 0.3,
            manual_pause_duration: 10.0,
            sample_rate: 44100,
            chunk_duration: 0.4,
            smoothing_window: 5,
            normalization_target_rms: 0.15,
            normalization_max_factor: 20.0,
            silence_threshold_db: -65.0,
            dialogue_threshold: 0.15,
            music_threshold: 0.35,
            adaptive_thresholds: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "volume limits must satisfy 0 <= min < baseline_max <= max <= 100 \
         (got min={min}, baseline_max={baseline_max}, max={max})"
    )]
    VolumeLimits {
        min: i32,
        baseline_max: i32,
        max: i32,
    },
    #[error("threshold_quiet ({quiet}) must be below threshold_loud ({loud})")]
    Thresholds { quiet: f32, loud: f32 },
    #[error("adjustment_step must be in 1..=10 (got {0})")]
    AdjustmentStep(i32),
    #[error("chunk_duration must be in (0.0, 1.0] seconds (got {0})")]
    ChunkDuration(f32),
    #[error("sample_rate must be positive")]
    SampleRate,
    #[error("smoothing_window must be at least 1")]
    SmoothingWindow,
}

impl Settings {
    /// Samples per frame at the configured rate and duration.
    pub fn chunk_size(&self) -> usize {
        (self.sample_rate as f32 * self.chunk_duration) as usize
    }

    /// Reject invalid combinations up front; nothing is coerced at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0 <= self.volume_min
            && self.volume_min < self.volume_baseline_max
            && self.volume_baseline_max <= self.volume_max
            && self.volume_max <= 100)
        {
            return Err(ConfigError::VolumeLimits {
                min: self.volume_min,
                baseline_max: self.volume_baseline_max,
                max: self.volume_max,
            });
        }
        if self.threshold_quiet >= self.threshold_loud {
            return Err(ConfigError::Thresholds {
                quiet: self.threshold_quiet,
                loud: self.threshold_loud,
            });
        }
        if !(1..=10).contains(&self.adjustment_step) {
            return Err(ConfigError::AdjustmentStep(self.adjustment_step));
        }
        if !(self.chunk_duration > 0.0 && self.chunk_duration <= 1.0) {
            return Err(ConfigError::ChunkDuration(self.chunk_duration));
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::SampleRate);
        }
        if self.smoothing_window < 1 {
            return Err(ConfigError::SmoothingWindow);
        }
        Ok(())
    }
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    use anyhow::Context;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let settings: Settings = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn chunk_size_follows_rate_and_duration() {
        let settings = Settings {
            sample_rate: 44100,
            chunk_duration: 0.4,
            ..Settings::default()
        };
        assert_eq!(settings.chunk_size(), 17640);
    }

    #[test]
    fn rejects_inverted_volume_limits() {
        let settings = Settings {
            volume_min: 80,
            volume_baseline_max: 75,
            volume_max: 85,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::VolumeLimits { .. })
        ));
    }

    #[test]
    fn rejects_baseline_above_max() {
        let settings = Settings {
            volume_baseline_max: 90,
            volume_max: 85,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let settings = Settings {
            threshold_quiet: -10.0,
            threshold_loud: -20.0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Thresholds { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_step() {
        let settings = Settings {
            adjustment_step: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
        let settings = Settings {
            adjustment_step: 11,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_overlong_chunk() {
        let settings = Settings {
            chunk_duration: 1.5,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ChunkDuration(_))
        ));
    }

    #[test]
    fn parses_partial_toml() {
        let settings: Settings =
            toml::from_str("volume_max = 90\ntarget_db = -30.0").unwrap();
        assert_eq!(settings.volume_max, 90);
        assert_eq!(settings.target_db, -30.0);
        assert_eq!(settings.volume_min, 20);
    }
}
