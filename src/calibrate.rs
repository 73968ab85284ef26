use crate::config::Settings;

// Bounds for the learned thresholds. The creep step is capped so one
// outlier frame cannot drag a threshold far.
const CREEP_MAX_STEP_DB: f32 = 5.0;
const QUIET_CREEP_CEILING_DB: f32 = -20.0;
const LOUD_CREEP_FLOOR_DB: f32 = -25.0;
const HIGH_VOLUME_MARK: i32 = 70;
const LOW_VOLUME_MARK: i32 = 40;
const QUIET_DRIFT_CEILING_DB: f32 = -25.0;
const LOUD_DRIFT_FLOOR_DB: f32 = -20.0;

/// Learns loudness thresholds from manual volume changes.
///
/// Explicitly-invoked calibration hook: the input consumer feeds it after a
/// successful manual adjustment when enabled, and the learned values are
/// reported for the user to adopt. It never mutates the running pipeline's
/// thresholds on its own.
pub struct AdaptiveThresholds {
    base_loud: f32,
    base_quiet: f32,
    threshold_loud: f32,
    threshold_quiet: f32,
    user_set_volume: Option<i32>,
}

impl AdaptiveThresholds {
    pub fn new(settings: &Settings) -> Self {
        Self {
            base_loud: settings.threshold_loud,
            base_quiet: settings.threshold_quiet,
            threshold_loud: settings.threshold_loud,
            threshold_quiet: settings.threshold_quiet,
            user_set_volume: None,
        }
    }

    /// Fold one manual volume change into the thresholds.
    ///
    /// Turning the volume up while the signal reads quieter than the quiet
    /// threshold means the threshold was too low; turning it down while
    /// louder than the loud threshold means that one was too high. Extreme
    /// resting volumes drift the thresholds a step per event.
    pub fn observe_manual_volume(
        &mut self,
        volume: i32,
        current_db: f32,
        previous_volume: Option<i32>,
    ) {
        self.user_set_volume = Some(volume);
        let previous = previous_volume.unwrap_or(volume);

        if current_db != 0.0 {
            let change = volume - previous;
            if change > 0 && current_db < self.threshold_quiet {
                let step = ((self.threshold_quiet - current_db) / 2.0).min(CREEP_MAX_STEP_DB);
                self.threshold_quiet =
                    (self.threshold_quiet + step).min(QUIET_CREEP_CEILING_DB);
            } else if change < 0 && current_db > self.threshold_loud {
                let step = ((current_db - self.threshold_loud) / 2.0).min(CREEP_MAX_STEP_DB);
                self.threshold_loud = (self.threshold_loud - step).max(LOUD_CREEP_FLOOR_DB);
            }
        }

        if volume > HIGH_VOLUME_MARK {
            self.threshold_quiet = (self.threshold_quiet + 1.0).min(QUIET_DRIFT_CEILING_DB);
        } else if volume < LOW_VOLUME_MARK {
            self.threshold_loud = (self.threshold_loud - 1.0).max(LOUD_DRIFT_FLOOR_DB);
        }
    }

    pub fn threshold_loud(&self) -> f32 {
        self.threshold_loud
    }

    pub fn threshold_quiet(&self) -> f32 {
        self.threshold_quiet
    }

    pub fn reset(&mut self) {
        self.threshold_loud = self.base_loud;
        self.threshold_quiet = self.base_quiet;
        self.user_set_volume = None;
    }
}
