use std::collections::VecDeque;

use crate::audio::classifier::{AudioType, Classification};

/// Confidence a lone sample needs before the window will vouch for it.
const SINGLE_SAMPLE_CONFIDENCE_MIN: f32 = 0.3;

/// Sliding window of recent loudness readings and classification results.
///
/// Owned by the pipeline context only; both queues evict their oldest entry
/// once the smoothing window is full.
pub struct History {
    capacity: usize,
    levels: VecDeque<f32>,
    classifications: VecDeque<Classification>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            levels: VecDeque::with_capacity(capacity),
            classifications: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push_level(&mut self, loudness_db: f32) {
        if self.levels.len() == self.capacity {
            self.levels.pop_front();
        }
        self.levels.push_back(loudness_db);
    }

    pub fn push_classification(&mut self, classification: Classification) {
        if self.classifications.len() == self.capacity {
            self.classifications.pop_front();
        }
        self.classifications.push_back(classification);
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Mean of all queued loudness values; 0.0 when empty.
    pub fn smoothed_loudness(&self) -> f32 {
        if self.levels.is_empty() {
            return 0.0;
        }
        self.levels.iter().sum::<f32>() / self.levels.len() as f32
    }

    /// Mean of the last `n` loudness values, falling back to the full
    /// window when fewer are queued.
    pub fn recent_loudness(&self, n: usize) -> f32 {
        if self.levels.len() < n {
            return self.smoothed_loudness();
        }
        let recent = self.levels.iter().rev().take(n);
        recent.sum::<f32>() / n as f32
    }

    /// Majority vote over the window.
    ///
    /// With fewer than two samples, the single sample is returned only when
    /// its confidence clears the floor. With two or more, dialogue and music
    /// counts compete; the winner's confidence is the mean over its own
    /// samples. Equal nonzero counts are ambiguous and return `None` so the
    /// controller holds the current volume.
    pub fn predominant_type(&self) -> Option<Classification> {
        if self.classifications.len() < 2 {
            let single = self.classifications.front()?;
            if single.confidence > SINGLE_SAMPLE_CONFIDENCE_MIN {
                return Some(*single);
            }
            return None;
        }

        let mut dialogue_count = 0usize;
        let mut music_count = 0usize;
        let mut dialogue_confidence = 0.0f32;
        let mut music_confidence = 0.0f32;

        for result in &self.classifications {
            match result.audio_type {
                AudioType::Dialogue => {
                    dialogue_count += 1;
                    dialogue_confidence += result.confidence;
                }
                AudioType::Music => {
                    music_count += 1;
                    music_confidence += result.confidence;
                }
                AudioType::Unknown => {}
            }
        }

        if dialogue_count > music_count {
            Some(Classification::summary(
                AudioType::Dialogue,
                dialogue_confidence / dialogue_count as f32,
            ))
        } else if music_count > dialogue_count {
            Some(Classification::summary(
                AudioType::Music,
                music_confidence / music_count as f32,
            ))
        } else {
            // Either all unknown, or dialogue and music tied.
            None
        }
    }

    pub fn clear(&mut self) {
        self.levels.clear();
        self.classifications.clear();
    }
}
