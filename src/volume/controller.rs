use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::audio::classifier::{AudioType, Classification};
use crate::config::Settings;
use crate::device::SharedDevice;
use crate::state::shared::SharedState;

use super::limits::VolumeLimits;
use super::strategy::{AdjustmentStrategy, DialogueStrategy, MusicStrategy, SilenceStrategy};

/// Minimum spacing between automatic adjustments while silent; tighter than
/// the configured interval so volume recovers before content resumes.
const SILENCE_ADJUSTMENT_INTERVAL: Duration = Duration::from_millis(300);

/// Decides whether and how far to move the device volume for each incoming
/// classification, and arbitrates against manual control.
pub struct VolumeController {
    settings: Settings,
    device: SharedDevice,
    state: Arc<SharedState>,
    limits: VolumeLimits,
    dialogue: DialogueStrategy,
    music: MusicStrategy,
    silence: SilenceStrategy,
    last_adjustment: Mutex<Option<Instant>>,
}

impl VolumeController {
    pub fn new(settings: &Settings, device: SharedDevice, state: Arc<SharedState>) -> Self {
        Self {
            settings: settings.clone(),
            device,
            state,
            limits: VolumeLimits::new(settings),
            dialogue: DialogueStrategy,
            music: MusicStrategy,
            silence: SilenceStrategy,
            last_adjustment: Mutex::new(None),
        }
    }

    /// Silence is anything below the threshold, with -inf (true silence)
    /// always included.
    pub fn is_silence(&self, loudness_db: f32) -> bool {
        loudness_db == f32::NEG_INFINITY || loudness_db < self.settings.silence_threshold_db
    }

    /// Run the guard sequence and, when every guard passes, push a new
    /// volume to the device. Returns the applied volume, `None` on hold.
    pub fn adjust_based_on_type(
        &self,
        loudness_db: f32,
        classification: &Classification,
    ) -> Option<i32> {
        let is_silence = self.is_silence(loudness_db);

        if !self.can_adjust(is_silence, classification) {
            return None;
        }

        let current = self.device.lock().unwrap().get_volume()?;

        let adjustment = self.calculate_adjustment(loudness_db, classification, is_silence);
        if adjustment == 0 {
            return None;
        }

        let new_volume = self.limits.apply(current + adjustment, false);

        if self.device.lock().unwrap().set_volume(new_volume) {
            *self.last_adjustment.lock().unwrap() = Some(Instant::now());
            self.state.set_volume(new_volume);
            log::debug!(
                "Auto adjust {:+} -> {}% ({} at {:.0}%, {:.1} dB)",
                adjustment,
                new_volume,
                classification.audio_type,
                classification.confidence * 100.0,
                loudness_db,
            );
            Some(new_volume)
        } else {
            log::debug!("Device refused volume {new_volume}%, skipping this cycle");
            None
        }
    }

    fn can_adjust(&self, is_silence: bool, classification: &Classification) -> bool {
        // Never move volume on ambiguous, non-silent content.
        if classification.audio_type == AudioType::Unknown && !is_silence {
            return false;
        }

        // A recent manual change wins over dialogue/music automation.
        if matches!(
            classification.audio_type,
            AudioType::Dialogue | AudioType::Music
        ) && self.state.manual_override_active()
        {
            return false;
        }

        let min_interval = if is_silence {
            SILENCE_ADJUSTMENT_INTERVAL
        } else {
            Duration::from_secs_f32(self.settings.min_adjustment_interval)
        };
        match *self.last_adjustment.lock().unwrap() {
            Some(at) if at.elapsed() < min_interval => false,
            _ => true,
        }
    }

    fn calculate_adjustment(
        &self,
        loudness_db: f32,
        classification: &Classification,
        is_silence: bool,
    ) -> i32 {
        if is_silence {
            return self
                .silence
                .calculate_adjustment(classification, loudness_db, &self.settings);
        }
        match classification.audio_type {
            AudioType::Dialogue => {
                self.dialogue
                    .calculate_adjustment(classification, loudness_db, &self.settings)
            }
            AudioType::Music => {
                self.music
                    .calculate_adjustment(classification, loudness_db, &self.settings)
            }
            AudioType::Unknown => 0,
        }
    }

    /// Apply a user-initiated volume delta.
    ///
    /// Manual changes may exceed the baseline ceiling (not the absolute
    /// limits) and open the override window that suppresses automation.
    pub fn manual_adjust(&self, delta: i32) -> Option<i32> {
        let current = self.device.lock().unwrap().get_volume()?;
        let new_volume = self.limits.apply(current + delta, true);

        if self.device.lock().unwrap().set_volume(new_volume) {
            self.state.record_manual_adjustment();
            self.state.set_volume(new_volume);
            log::info!("Manual adjust {delta:+} -> {new_volume}%");
            Some(new_volume)
        } else {
            None
        }
    }

    /// Shift the loudness baseline; no direct effect on volume.
    pub fn adjust_baseline(&self, delta_db: f32) {
        self.state.adjust_baseline(delta_db);
        log::info!("Baseline moved to {:.1} dB", self.state.target_db());
    }
}
