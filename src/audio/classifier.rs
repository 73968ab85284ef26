use std::fmt;

use crate::config::Settings;

use super::features::SpectrumFeatures;

/// Kind of audible content a frame was judged to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioType {
    Dialogue,
    Music,
    Unknown,
}

impl fmt::Display for AudioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioType::Dialogue => write!(f, "dialogue"),
            AudioType::Music => write!(f, "music"),
            AudioType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Normalized two-way score split; both zero when nothing scored.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TypeScores {
    pub dialogue: f32,
    pub music: f32,
}

/// Outcome of classifying one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub audio_type: AudioType,
    pub confidence: f32,
    pub features: Option<SpectrumFeatures>,
    pub scores: TypeScores,
}

impl Classification {
    /// Result without per-frame features, as produced by history voting.
    pub fn summary(audio_type: AudioType, confidence: f32) -> Self {
        let scores = match audio_type {
            AudioType::Dialogue => TypeScores {
                dialogue: confidence,
                music: 0.0,
            },
            AudioType::Music => TypeScores {
                dialogue: 0.0,
                music: confidence,
            },
            AudioType::Unknown => TypeScores::default(),
        };
        Self {
            audio_type,
            confidence,
            features: None,
            scores,
        }
    }

    pub fn unknown() -> Self {
        Self::summary(AudioType::Unknown, 0.0)
    }
}

// ---------------------------------------------------------------------------
// Scoring constants. Each `(threshold, weight)` pair adds its weight when the
// feature crosses the threshold; the paired gates additionally require the
// backing-track ratio on the other side of its own threshold.
// ---------------------------------------------------------------------------

/// Formant floor for the voice-plus-backing-track signature.
const VOCAL_FORMANTS_MIN: f32 = 0.08;
/// Backing-track floor for the voice-plus-backing-track signature.
const VOCAL_BACKING_MIN: f32 = 0.20;

/// Clean formants (no backing track) are the strongest dialogue signal.
const DIALOGUE_CLEAN_FORMANTS_WEIGHT: f32 = 0.8;
/// Formants with a backing track still hint weakly at dialogue.
const DIALOGUE_BACKED_FORMANTS_WEIGHT: f32 = 0.3;
/// (formants above, backing below, weight)
const DIALOGUE_FORMANT_GATES: [(f32, f32, f32); 3] =
    [(0.12, 0.18, 0.5), (0.18, 0.12, 0.3), (0.22, 0.08, 0.2)];
const DIALOGUE_VOICE_RATIO_STEPS: [(f32, f32); 3] = [(0.15, 0.6), (0.25, 0.4), (0.35, 0.3)];
const DIALOGUE_BASS_TO_VOICE_STEPS: [(f32, f32); 3] = [(1.5, 0.3), (0.8, 0.3), (0.5, 0.2)];
const DIALOGUE_VARIATION_STEPS: [(f32, f32); 3] = [(2.0, 0.2), (1.2, 0.3), (0.8, 0.2)];
const DIALOGUE_FORMANT_SHARE_STEPS: [(f32, f32); 2] = [(0.12, 0.4), (0.18, 0.3)];
const DIALOGUE_LOW_HIGH_STEPS: [(f32, f32); 2] = [(0.35, 0.2), (0.25, 0.1)];

/// (formants above, backing above, weight): sung vocals over instrumentation.
const MUSIC_VOCAL_GATES: [(f32, f32, f32); 3] =
    [(0.08, 0.20, 0.8), (0.08, 0.30, 0.5), (0.12, 0.25, 0.4)];
const MUSIC_BASS_TO_VOICE_STEPS: [(f32, f32); 3] = [(0.4, 0.4), (0.6, 0.3), (0.8, 0.2)];
const MUSIC_HIGH_TO_VOICE_STEPS: [(f32, f32); 3] = [(0.6, 0.3), (0.9, 0.3), (1.2, 0.2)];
const MUSIC_VARIATION_STEPS: [(f32, f32); 3] = [(0.8, 0.3), (1.2, 0.3), (1.8, 0.2)];
const MUSIC_BACKING_STEPS: [(f32, f32); 3] = [(0.20, 0.4), (0.30, 0.3), (0.40, 0.2)];
const MUSIC_LOW_VOICE_STEPS: [(f32, f32); 2] = [(0.3, 0.2), (0.2, 0.2)];
const MUSIC_LOW_FORMANTS_STEPS: [(f32, f32); 2] = [(0.15, 0.2), (0.10, 0.2)];

/// Music verdict floor inside the voice-plus-backing-track branch.
const VOCAL_BRANCH_MUSIC_MIN: f32 = 0.30;
/// Confidence assigned when the vocal branch defaults to music with no score.
const VOCAL_BRANCH_FALLBACK_CONFIDENCE: f32 = 0.5;
/// Relaxed music floors for the final tiebreak.
const TIEBREAK_BACKED_MUSIC_MIN: f32 = 0.25;
const TIEBREAK_MUSIC_MIN: f32 = 0.30;
/// Relaxed dialogue floor for the final tiebreak.
const TIEBREAK_DIALOGUE_MIN: f32 = 0.15;

fn ladder_above(value: f32, steps: &[(f32, f32)]) -> f32 {
    steps
        .iter()
        .filter(|(threshold, _)| value > *threshold)
        .map(|(_, weight)| weight)
        .sum()
}

fn ladder_below(value: f32, steps: &[(f32, f32)]) -> f32 {
    steps
        .iter()
        .filter(|(threshold, _)| value < *threshold)
        .map(|(_, weight)| weight)
        .sum()
}

/// Maps spectral features to dialogue/music/unknown with a confidence.
///
/// Additive threshold scoring, not a trained model: each rule adds a fixed
/// bonus when its feature crosses a fixed threshold, the two raw sums are
/// normalized into a two-way split, and a small decision tree picks the
/// final type.
pub struct Classifier {
    dialogue_threshold: f32,
    music_threshold: f32,
}

impl Classifier {
    pub fn new(settings: &Settings) -> Self {
        Self {
            dialogue_threshold: settings.dialogue_threshold,
            music_threshold: settings.music_threshold,
        }
    }

    /// Pure function of the features; no hidden state.
    pub fn classify(&self, features: &SpectrumFeatures) -> Classification {
        let mut dialogue = score_dialogue(features);
        let mut music = score_music(features);

        let total = dialogue + music;
        if total > 0.0 {
            dialogue /= total;
            music /= total;
        }

        let (audio_type, confidence) = self.determine_type(dialogue, music, features);

        Classification {
            audio_type,
            confidence,
            features: Some(*features),
            scores: TypeScores { dialogue, music },
        }
    }

    fn determine_type(
        &self,
        dialogue: f32,
        music: f32,
        features: &SpectrumFeatures,
    ) -> (AudioType, f32) {
        let vocal_backing = features.voice_formants_ratio > VOCAL_FORMANTS_MIN
            && features.background_music_ratio > VOCAL_BACKING_MIN;

        if vocal_backing {
            // Strong formants over instrumentation: sung vocals unless the
            // dialogue score clearly wins.
            if music > VOCAL_BRANCH_MUSIC_MIN {
                (AudioType::Music, music)
            } else if dialogue > music && dialogue > self.dialogue_threshold {
                (AudioType::Dialogue, dialogue)
            } else {
                let confidence = if music > 0.0 {
                    music
                } else {
                    VOCAL_BRANCH_FALLBACK_CONFIDENCE
                };
                (AudioType::Music, confidence)
            }
        } else if dialogue > music && dialogue > self.dialogue_threshold {
            (AudioType::Dialogue, dialogue)
        } else if music > dialogue && music > self.music_threshold {
            (AudioType::Music, music)
        } else if features.background_music_ratio > VOCAL_BACKING_MIN
            && music > TIEBREAK_BACKED_MUSIC_MIN
        {
            (AudioType::Music, music)
        } else if dialogue > music && dialogue > TIEBREAK_DIALOGUE_MIN {
            (AudioType::Dialogue, dialogue)
        } else if music > dialogue && music > TIEBREAK_MUSIC_MIN {
            (AudioType::Music, music)
        } else {
            (AudioType::Unknown, dialogue.max(music))
        }
    }
}

fn score_dialogue(f: &SpectrumFeatures) -> f32 {
    let mut score = 0.0;

    if f.voice_formants_ratio > VOCAL_FORMANTS_MIN {
        if f.background_music_ratio < VOCAL_BACKING_MIN {
            score += DIALOGUE_CLEAN_FORMANTS_WEIGHT;
        } else {
            score += DIALOGUE_BACKED_FORMANTS_WEIGHT;
        }
    }
    for (formants_min, backing_max, weight) in DIALOGUE_FORMANT_GATES {
        if f.voice_formants_ratio > formants_min && f.background_music_ratio < backing_max {
            score += weight;
        }
    }

    score += ladder_above(f.voice_ratio, &DIALOGUE_VOICE_RATIO_STEPS);
    score += ladder_below(f.bass_to_voice_ratio, &DIALOGUE_BASS_TO_VOICE_STEPS);
    score += ladder_below(f.spectral_variation, &DIALOGUE_VARIATION_STEPS);
    score += ladder_above(f.ratio_voice_formants, &DIALOGUE_FORMANT_SHARE_STEPS);
    score += ladder_below(f.ratio_high, &DIALOGUE_LOW_HIGH_STEPS);

    score
}

fn score_music(f: &SpectrumFeatures) -> f32 {
    let mut score = 0.0;

    for (formants_min, backing_min, weight) in MUSIC_VOCAL_GATES {
        if f.voice_formants_ratio > formants_min && f.background_music_ratio > backing_min {
            score += weight;
        }
    }

    score += ladder_above(f.bass_to_voice_ratio, &MUSIC_BASS_TO_VOICE_STEPS);
    score += ladder_above(f.high_to_voice_ratio, &MUSIC_HIGH_TO_VOICE_STEPS);
    score += ladder_above(f.spectral_variation, &MUSIC_VARIATION_STEPS);
    score += ladder_above(f.background_music_ratio, &MUSIC_BACKING_STEPS);
    score += ladder_below(f.voice_ratio, &MUSIC_LOW_VOICE_STEPS);
    score += ladder_below(f.voice_formants_ratio, &MUSIC_LOW_FORMANTS_STEPS);

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(&Settings::default())
    }

    /// Clean speech: strong formants, almost no bass or treble energy.
    fn speech_features() -> SpectrumFeatures {
        SpectrumFeatures {
            voice_ratio: 0.6,
            voice_formants_ratio: 0.25,
            bass_to_voice_ratio: 0.2,
            high_to_voice_ratio: 0.3,
            spectral_variation: 0.6,
            background_music_ratio: 0.05,
            ratio_voice_formants: 0.25,
            ratio_bass: 0.05,
            ratio_high: 0.05,
        }
    }

    /// Instrumental music: heavy bass and treble, thin voice band.
    fn instrumental_features() -> SpectrumFeatures {
        SpectrumFeatures {
            voice_ratio: 0.15,
            voice_formants_ratio: 0.05,
            bass_to_voice_ratio: 1.2,
            high_to_voice_ratio: 1.5,
            spectral_variation: 2.0,
            background_music_ratio: 0.6,
            ratio_voice_formants: 0.05,
            ratio_bass: 0.3,
            ratio_high: 0.3,
        }
    }

    /// Sung vocals: speech-like formants over an instrumental bed.
    fn sung_vocals_features() -> SpectrumFeatures {
        SpectrumFeatures {
            voice_ratio: 0.35,
            voice_formants_ratio: 0.15,
            bass_to_voice_ratio: 0.7,
            high_to_voice_ratio: 0.8,
            spectral_variation: 1.0,
            background_music_ratio: 0.35,
            ratio_voice_formants: 0.15,
            ratio_bass: 0.15,
            ratio_high: 0.2,
        }
    }

    #[test]
    fn clean_speech_is_dialogue() {
        let result = classifier().classify(&speech_features());
        assert_eq!(result.audio_type, AudioType::Dialogue);
        assert!(result.confidence > 0.9);
    }

    #[test]
    fn instrumental_is_music() {
        let result = classifier().classify(&instrumental_features());
        assert_eq!(result.audio_type, AudioType::Music);
        assert!(result.confidence > 0.5);
    }

    #[test]
    fn sung_vocals_resolve_to_music_not_dialogue() {
        // Formants alone look like speech; the backing-track branch is what
        // keeps lyrics from being boosted as dialogue.
        let result = classifier().classify(&sung_vocals_features());
        assert_eq!(result.audio_type, AudioType::Music);
    }

    #[test]
    fn scores_normalize_to_one() {
        for features in [
            speech_features(),
            instrumental_features(),
            sung_vocals_features(),
        ] {
            let result = classifier().classify(&features);
            let sum = result.scores.dialogue + result.scores.music;
            assert!((sum - 1.0).abs() < 1e-6, "sum was {sum}");
        }
    }

    #[test]
    fn confidence_stays_in_unit_range() {
        for features in [
            SpectrumFeatures::default(),
            speech_features(),
            instrumental_features(),
            sung_vocals_features(),
        ] {
            let result = classifier().classify(&features);
            assert!(
                (0.0..=1.0).contains(&result.confidence),
                "confidence was {}",
                result.confidence
            );
        }
    }

    #[test]
    fn classification_carries_its_features() {
        let features = speech_features();
        let result = classifier().classify(&features);
        assert_eq!(result.features, Some(features));
    }

    #[test]
    fn summary_mirrors_confidence_into_scores() {
        let summary = Classification::summary(AudioType::Music, 0.7);
        assert_eq!(summary.scores.music, 0.7);
        assert_eq!(summary.scores.dialogue, 0.0);
        assert_eq!(summary.features, None);
    }
}
