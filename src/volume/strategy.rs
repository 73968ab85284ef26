use crate::audio::classifier::Classification;
use crate::config::Settings;

// Confidence floors are exclusive; at or below them a strategy holds still.
const DIALOGUE_CONFIDENCE_FLOOR: f32 = 0.25;
const DIALOGUE_BASE_MULTIPLIER: f32 = 2.0;
const DIALOGUE_CONFIDENCE_SLOPE: f32 = 3.0;
const MUSIC_CONFIDENCE_FLOOR: f32 = 0.5;
const MUSIC_BASE_MULTIPLIER: f32 = 0.8;
const MUSIC_CONFIDENCE_SLOPE: f32 = 0.8;
const SILENCE_STEP_MULTIPLIER: f32 = 2.0;

/// Signed volume delta for one detected content type.
///
/// Magnitudes are truncated toward zero before the sign is applied, for
/// positive and negative adjustments alike.
pub trait AdjustmentStrategy {
    fn calculate_adjustment(
        &self,
        classification: &Classification,
        loudness_db: f32,
        settings: &Settings,
    ) -> i32;
}

/// Aggressive boost for speech; intelligibility is the top priority.
///
/// Scales from 2x the base step just above the floor to 5x at full
/// confidence.
pub struct DialogueStrategy;

impl AdjustmentStrategy for DialogueStrategy {
    fn calculate_adjustment(
        &self,
        classification: &Classification,
        _loudness_db: f32,
        settings: &Settings,
    ) -> i32 {
        let confidence = classification.confidence;
        if confidence <= DIALOGUE_CONFIDENCE_FLOOR {
            return 0;
        }
        let multiplier = DIALOGUE_BASE_MULTIPLIER
            + (confidence - DIALOGUE_CONFIDENCE_FLOOR) * DIALOGUE_CONFIDENCE_SLOPE;
        (settings.adjustment_step as f32 * multiplier) as i32
    }
}

/// Gentle reduction for music; losing a little detail is tolerable.
pub struct MusicStrategy;

impl AdjustmentStrategy for MusicStrategy {
    fn calculate_adjustment(
        &self,
        classification: &Classification,
        _loudness_db: f32,
        settings: &Settings,
    ) -> i32 {
        let confidence = classification.confidence;
        if confidence <= MUSIC_CONFIDENCE_FLOOR {
            return 0;
        }
        let multiplier =
            MUSIC_BASE_MULTIPLIER + (confidence - MUSIC_CONFIDENCE_FLOOR) * MUSIC_CONFIDENCE_SLOPE;
        -((settings.adjustment_step as f32 * multiplier) as i32)
    }
}

/// Fast fixed boost during silence so the next real content is audible.
pub struct SilenceStrategy;

impl AdjustmentStrategy for SilenceStrategy {
    fn calculate_adjustment(
        &self,
        _classification: &Classification,
        _loudness_db: f32,
        settings: &Settings,
    ) -> i32 {
        (settings.adjustment_step as f32 * SILENCE_STEP_MULTIPLIER) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::classifier::AudioType;

    fn dialogue(confidence: f32) -> Classification {
        Classification::summary(AudioType::Dialogue, confidence)
    }

    fn music(confidence: f32) -> Classification {
        Classification::summary(AudioType::Music, confidence)
    }

    fn settings_with_step(step: i32) -> Settings {
        Settings {
            adjustment_step: step,
            ..Settings::default()
        }
    }

    #[test]
    fn dialogue_scales_with_confidence() {
        let settings = settings_with_step(5);
        let strategy = DialogueStrategy;
        // 5 * (2.0 + 0.65 * 3.0) = 19.75 -> truncated to 19
        let adjustment = strategy.calculate_adjustment(&dialogue(0.9), -30.0, &settings);
        assert_eq!(adjustment, 19);
        assert!(adjustment > settings.adjustment_step);
    }

    #[test]
    fn dialogue_at_or_below_floor_holds() {
        let settings = settings_with_step(5);
        let strategy = DialogueStrategy;
        assert_eq!(strategy.calculate_adjustment(&dialogue(0.25), -30.0, &settings), 0);
        assert_eq!(strategy.calculate_adjustment(&dialogue(0.1), -30.0, &settings), 0);
    }

    #[test]
    fn dialogue_just_above_floor_moves_twice_the_step() {
        let settings = settings_with_step(6);
        let adjustment =
            DialogueStrategy.calculate_adjustment(&dialogue(0.26), -30.0, &settings);
        assert_eq!(adjustment, 12);
    }

    #[test]
    fn music_at_or_below_floor_holds() {
        let settings = settings_with_step(5);
        let strategy = MusicStrategy;
        assert_eq!(strategy.calculate_adjustment(&music(0.5), -30.0, &settings), 0);
        assert_eq!(strategy.calculate_adjustment(&music(0.3), -30.0, &settings), 0);
    }

    #[test]
    fn music_reduces_volume() {
        let settings = settings_with_step(5);
        // 5 * (0.8 + 0.4 * 0.8) = 5.6 -> magnitude truncated to 5
        let adjustment = MusicStrategy.calculate_adjustment(&music(0.9), -30.0, &settings);
        assert_eq!(adjustment, -5);
    }

    #[test]
    fn silence_boosts_by_twice_the_step() {
        let settings = settings_with_step(6);
        let adjustment = SilenceStrategy.calculate_adjustment(
            &Classification::unknown(),
            f32::NEG_INFINITY,
            &settings,
        );
        assert_eq!(adjustment, 12);
    }
}
