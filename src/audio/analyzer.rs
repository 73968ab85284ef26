use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::config::Settings;

use super::features::SpectrumFeatures;
use super::rms;

// Band edges in Hz. Bass stops at 200 so the voice fundamental is not
// counted as instrumentation; formants (500-2000) carry most of the
// intelligibility signal.
const BAND_BASS_LOW: f32 = 20.0;
const BAND_VOICE_FUNDAMENTAL_LOW: f32 = 200.0;
const BAND_VOICE_FORMANTS_LOW: f32 = 500.0;
const BAND_VOICE_HARMONICS_LOW: f32 = 2000.0;
const BAND_HIGH_MID_LOW: f32 = 4000.0;
const BAND_HIGH_LOW: f32 = 8000.0;

/// Summed magnitudes of the six analysis bands.
#[derive(Clone, Copy, Debug, Default)]
struct BandEnergy {
    bass: f32,
    voice_fundamental: f32,
    voice_formants: f32,
    voice_harmonics: f32,
    high_mid: f32,
    high: f32,
}

impl BandEnergy {
    fn total(&self) -> f32 {
        self.bass
            + self.voice_fundamental
            + self.voice_formants
            + self.voice_harmonics
            + self.high_mid
            + self.high
    }

    fn voice(&self) -> f32 {
        self.voice_fundamental + self.voice_formants + self.voice_harmonics
    }
}

/// Computes loudness and spectral features from mono frames.
pub struct Analyzer {
    sample_rate: u32,
    chunk_size: usize,
    fft: Arc<dyn Fft<f32>>,
}

impl Analyzer {
    pub fn new(settings: &Settings) -> Self {
        let chunk_size = settings.chunk_size();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(chunk_size);
        Self {
            sample_rate: settings.sample_rate,
            chunk_size,
            fft,
        }
    }

    /// Frame loudness as 20*log10(RMS).
    ///
    /// Exact silence yields negative infinity, which stays ordered below
    /// every finite threshold; it is a defined sentinel, not an error.
    pub fn loudness_db(&self, frame: &[f32]) -> f32 {
        let rms = rms(frame);
        if rms > 0.0 {
            20.0 * rms.log10()
        } else {
            f32::NEG_INFINITY
        }
    }

    /// Extract the nine spectral ratios from a (normalized) frame.
    ///
    /// A frame with zero total band energy maps to all-zero features.
    pub fn spectral_features(&self, frame: &[f32]) -> SpectrumFeatures {
        if frame.is_empty() {
            return SpectrumFeatures::default();
        }

        let mut buffer: Vec<Complex<f32>> =
            frame.iter().map(|&s| Complex::new(s, 0.0)).collect();
        if frame.len() == self.chunk_size {
            self.fft.process(&mut buffer);
        } else {
            let mut planner = FftPlanner::new();
            planner.plan_fft_forward(frame.len()).process(&mut buffer);
        }

        // Real input: keep the non-redundant half spectrum, DC included.
        let half = frame.len() / 2 + 1;
        let magnitude: Vec<f32> = buffer[..half].iter().map(|c| c.norm()).collect();
        let freq_resolution = self.sample_rate as f32 / frame.len() as f32;

        let mut bands = BandEnergy::default();
        for (bin, &mag) in magnitude.iter().enumerate() {
            let freq = bin as f32 * freq_resolution;
            if freq < BAND_BASS_LOW {
                continue;
            } else if freq < BAND_VOICE_FUNDAMENTAL_LOW {
                bands.bass += mag;
            } else if freq < BAND_VOICE_FORMANTS_LOW {
                bands.voice_fundamental += mag;
            } else if freq < BAND_VOICE_HARMONICS_LOW {
                bands.voice_formants += mag;
            } else if freq < BAND_HIGH_MID_LOW {
                bands.voice_harmonics += mag;
            } else if freq < BAND_HIGH_LOW {
                bands.high_mid += mag;
            } else {
                bands.high += mag;
            }
        }

        let total = bands.total();
        if total == 0.0 {
            return SpectrumFeatures::default();
        }

        let mean = magnitude.iter().sum::<f32>() / magnitude.len() as f32;
        let spectral_variation = if mean > 0.0 {
            let variance = magnitude
                .iter()
                .map(|&m| (m - mean) * (m - mean))
                .sum::<f32>()
                / magnitude.len() as f32;
            variance.sqrt() / mean
        } else {
            0.0
        };

        let voice = bands.voice();
        let bass_to_voice_ratio = if voice > 0.0 { bands.bass / voice } else { 0.0 };
        let high_to_voice_ratio = if voice > 0.0 {
            (bands.high_mid + bands.high) / voice
        } else {
            0.0
        };

        SpectrumFeatures {
            voice_ratio: voice / total,
            voice_formants_ratio: bands.voice_formants / total,
            bass_to_voice_ratio,
            high_to_voice_ratio,
            spectral_variation,
            background_music_ratio: (bands.bass + bands.high_mid + bands.high) / total,
            ratio_voice_formants: bands.voice_formants / total,
            ratio_bass: bands.bass / total,
            ratio_high: bands.high / total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> Analyzer {
        Analyzer::new(&Settings::default())
    }

    /// A pure tone at the given frequency, one default chunk long.
    fn tone(freq: f32, amplitude: f32) -> Vec<f32> {
        let settings = Settings::default();
        let n = settings.chunk_size();
        (0..n)
            .map(|i| {
                let t = i as f32 / settings.sample_rate as f32;
                amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    #[test]
    fn silence_is_negative_infinity() {
        let frame = vec![0.0f32; 1024];
        assert_eq!(analyzer().loudness_db(&frame), f32::NEG_INFINITY);
    }

    #[test]
    fn full_scale_square_is_zero_db() {
        let frame = vec![1.0f32; 1024];
        let db = analyzer().loudness_db(&frame);
        assert!(db.abs() < 1e-4, "db was {db}");
    }

    #[test]
    fn sine_loudness_matches_rms() {
        // RMS of a sine is A / sqrt(2): 0.5 amplitude -> about -9.03 dB.
        let frame = tone(1000.0, 0.5);
        let db = analyzer().loudness_db(&frame);
        assert!((db - (-9.03)).abs() < 0.1, "db was {db}");
    }

    #[test]
    fn silent_frame_has_all_zero_features() {
        let frame = vec![0.0f32; 1024];
        let features = analyzer().spectral_features(&frame);
        assert_eq!(features, SpectrumFeatures::default());
    }

    #[test]
    fn formant_tone_lands_in_formant_band() {
        let features = analyzer().spectral_features(&tone(1000.0, 0.3));
        assert!(
            features.voice_formants_ratio > 0.5,
            "voice_formants_ratio was {}",
            features.voice_formants_ratio
        );
        assert!(features.voice_ratio > features.background_music_ratio);
    }

    #[test]
    fn bass_tone_lands_in_bass_band() {
        let features = analyzer().spectral_features(&tone(100.0, 0.3));
        assert!(features.ratio_bass > 0.5, "ratio_bass was {}", features.ratio_bass);
        assert!(features.background_music_ratio > 0.5);
    }

    #[test]
    fn high_tone_lands_in_high_band() {
        let features = analyzer().spectral_features(&tone(10000.0, 0.3));
        assert!(features.ratio_high > 0.5, "ratio_high was {}", features.ratio_high);
    }

    #[test]
    fn ratios_of_total_are_bounded() {
        let features = analyzer().spectral_features(&tone(440.0, 0.4));
        for ratio in [
            features.voice_ratio,
            features.voice_formants_ratio,
            features.background_music_ratio,
            features.ratio_voice_formants,
            features.ratio_bass,
            features.ratio_high,
        ] {
            assert!((0.0..=1.0).contains(&ratio), "ratio was {ratio}");
        }
    }

    #[test]
    fn odd_length_frames_are_handled() {
        let frame: Vec<f32> = (0..1023)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 44100.0).sin())
            .collect();
        let features = analyzer().spectral_features(&frame);
        assert!(features.voice_formants_ratio > 0.0);
    }
}
