use crate::config::Settings;

/// Two-tier volume clamp.
///
/// Every change is bounded by `[volume_min, volume_max]`; automatic changes
/// are additionally capped at `volume_baseline_max`, so automation can never
/// push louder than the user's own ceiling allows.
#[derive(Clone, Copy, Debug)]
pub struct VolumeLimits {
    volume_min: i32,
    volume_max: i32,
    volume_baseline_max: i32,
}

impl VolumeLimits {
    pub fn new(settings: &Settings) -> Self {
        Self {
            volume_min: settings.volume_min,
            volume_max: settings.volume_max,
            volume_baseline_max: settings.volume_baseline_max,
        }
    }

    pub fn apply(&self, volume: i32, is_manual: bool) -> i32 {
        let volume = volume.clamp(self.volume_min, self.volume_max);
        if !is_manual {
            volume.min(self.volume_baseline_max)
        } else {
            volume
        }
    }
}
