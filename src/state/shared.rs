use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::audio::classifier::{AudioType, Classification};
use crate::config::Settings;

/// Point-in-time copy of the shared record, safe to format or inspect
/// without holding the lock.
#[derive(Clone, Copy, Debug)]
pub struct StateSnapshot {
    pub current_volume: Option<i32>,
    pub loudness_db: f32,
    pub audio_type: AudioType,
    pub confidence: f32,
    pub manual_override_active: bool,
    pub manual_pause_remaining: Duration,
    pub target_db: f32,
    pub volume_baseline_max: i32,
}

struct StateFields {
    current_volume: Option<i32>,
    loudness_db: f32,
    audio_type: AudioType,
    confidence: f32,
    manual_adjustment_at: Option<Instant>,
    target_db: f32,
}

/// Mutable record shared between the pipeline and input contexts.
///
/// One mutex guards every field; it is held only for the duration of a
/// field read or write, never across a device call.
pub struct SharedState {
    fields: Mutex<StateFields>,
    manual_pause_duration: Duration,
    volume_baseline_max: i32,
}

impl SharedState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            fields: Mutex::new(StateFields {
                current_volume: None,
                loudness_db: 0.0,
                audio_type: AudioType::Unknown,
                confidence: 0.0,
                manual_adjustment_at: None,
                target_db: settings.target_db,
            }),
            manual_pause_duration: Duration::from_secs_f32(settings.manual_pause_duration),
            volume_baseline_max: settings.volume_baseline_max,
        }
    }

    pub fn set_volume(&self, volume: i32) {
        self.fields.lock().unwrap().current_volume = Some(volume);
    }

    pub fn current_volume(&self) -> Option<i32> {
        self.fields.lock().unwrap().current_volume
    }

    pub fn set_loudness(&self, loudness_db: f32) {
        self.fields.lock().unwrap().loudness_db = loudness_db;
    }

    pub fn set_classification(&self, classification: &Classification) {
        let mut fields = self.fields.lock().unwrap();
        fields.audio_type = classification.audio_type;
        fields.confidence = classification.confidence;
    }

    /// Stamp the start of a manual-override cooldown window.
    pub fn record_manual_adjustment(&self) {
        self.fields.lock().unwrap().manual_adjustment_at = Some(Instant::now());
    }

    /// True while the cooldown after a manual volume change is running.
    pub fn manual_override_active(&self) -> bool {
        let fields = self.fields.lock().unwrap();
        match fields.manual_adjustment_at {
            Some(at) => at.elapsed() < self.manual_pause_duration,
            None => false,
        }
    }

    /// Shift the loudness baseline; consumed by calibration and display.
    pub fn adjust_baseline(&self, delta_db: f32) {
        self.fields.lock().unwrap().target_db += delta_db;
    }

    pub fn target_db(&self) -> f32 {
        self.fields.lock().unwrap().target_db
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let fields = self.fields.lock().unwrap();
        let manual_pause_remaining = match fields.manual_adjustment_at {
            Some(at) => self.manual_pause_duration.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        };
        StateSnapshot {
            current_volume: fields.current_volume,
            loudness_db: fields.loudness_db,
            audio_type: fields.audio_type,
            confidence: fields.confidence,
            manual_override_active: !manual_pause_remaining.is_zero(),
            manual_pause_remaining,
            target_db: fields.target_db,
            volume_baseline_max: self.volume_baseline_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SharedState {
        SharedState::new(&Settings::default())
    }

    #[test]
    fn starts_with_no_volume_and_no_override() {
        let state = state();
        assert_eq!(state.current_volume(), None);
        assert!(!state.manual_override_active());
        let snap = state.snapshot();
        assert_eq!(snap.manual_pause_remaining, Duration::ZERO);
    }

    #[test]
    fn volume_updates_are_visible() {
        let state = state();
        state.set_volume(42);
        assert_eq!(state.current_volume(), Some(42));
    }

    #[test]
    fn manual_adjustment_opens_override_window() {
        let state = state();
        state.record_manual_adjustment();
        assert!(state.manual_override_active());
        let snap = state.snapshot();
        assert!(snap.manual_override_active);
        assert!(snap.manual_pause_remaining <= Duration::from_secs_f32(10.0));
        assert!(snap.manual_pause_remaining > Duration::from_secs_f32(9.0));
    }

    #[test]
    fn override_expires() {
        let settings = Settings {
            manual_pause_duration: 0.0,
            ..Settings::default()
        };
        let state = SharedState::new(&settings);
        state.record_manual_adjustment();
        assert!(!state.manual_override_active());
    }

    #[test]
    fn baseline_adjustments_accumulate() {
        let state = state();
        state.adjust_baseline(1.0);
        state.adjust_baseline(1.0);
        state.adjust_baseline(-3.0);
        assert!((state.target_db() - (-26.0)).abs() < 1e-6);
    }

    #[test]
    fn classification_is_reflected_in_snapshot() {
        let state = state();
        state.set_classification(&Classification::summary(AudioType::Music, 0.8));
        state.set_loudness(-32.5);
        let snap = state.snapshot();
        assert_eq!(snap.audio_type, AudioType::Music);
        assert!((snap.confidence - 0.8).abs() < 1e-6);
        assert!((snap.loudness_db - (-32.5)).abs() < 1e-6);
    }
}
