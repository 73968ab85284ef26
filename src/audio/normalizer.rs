use crate::config::Settings;

/// Rescales frames toward a reference loudness before spectral analysis.
///
/// A quiet frame captured from across the room must produce the same
/// spectral ratios as a loud frame of the same content; only the ratios
/// reach the classifier, never absolute level.
pub struct Normalizer {
    target_rms: f32,
    max_factor: f32,
}

impl Normalizer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            target_rms: settings.normalization_target_rms,
            max_factor: settings.normalization_max_factor,
        }
    }

    /// Scale every sample so the frame RMS approaches the target.
    ///
    /// The gain is capped at `max_factor` to keep near-zero input from
    /// blowing up numerically. Exact silence passes through untouched.
    pub fn normalize(&self, frame: &mut [f32]) {
        let rms = super::rms(frame);
        if rms > 0.0 {
            let factor = (self.target_rms / rms).min(self.max_factor);
            for sample in frame.iter_mut() {
                *sample *= factor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new(&Settings::default())
    }

    #[test]
    fn silence_passes_through() {
        let mut frame = vec![0.0f32; 128];
        normalizer().normalize(&mut frame);
        assert!(frame.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn weak_frame_reaches_target_rms() {
        let mut frame = vec![0.05f32; 256];
        normalizer().normalize(&mut frame);
        let rms = crate::audio::rms(&frame);
        assert!((rms - 0.15).abs() < 1e-4, "rms was {rms}");
    }

    #[test]
    fn gain_is_capped_for_near_silent_frames() {
        // RMS 0.001 would need a 150x gain; the cap holds it at 20x.
        let mut frame = vec![0.001f32; 256];
        normalizer().normalize(&mut frame);
        assert!(frame.iter().all(|&s| (s - 0.02).abs() < 1e-6));
    }

    #[test]
    fn loud_frames_are_attenuated() {
        let mut frame = vec![0.9f32; 256];
        normalizer().normalize(&mut frame);
        let rms = crate::audio::rms(&frame);
        assert!((rms - 0.15).abs() < 1e-4);
    }
}
