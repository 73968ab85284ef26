use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;

use crate::audio::analyzer::Analyzer;
use crate::audio::classifier::{AudioType, Classification, Classifier};
use crate::audio::normalizer::Normalizer;
use crate::config::Settings;
use crate::source::FrameSource;
use crate::state::history::History;
use crate::state::shared::SharedState;
use crate::volume::controller::VolumeController;

/// Confidence above which two samples are enough to act on.
const FAST_PATH_CONFIDENCE: f32 = 0.4;
/// Number of recent levels averaged on the fast paths.
const FAST_PATH_WINDOW: usize = 2;
/// Levels needed before the full smoothing window is trusted.
const STABLE_PATH_MIN_LEVELS: usize = 3;

/// Drives one frame at a time through normalize -> analyze -> classify ->
/// history, then hands the smoothed evidence to the volume controller.
///
/// Owned by the pipeline context; the history windows are private to it.
pub struct Engine {
    settings: Settings,
    normalizer: Normalizer,
    analyzer: Analyzer,
    classifier: Classifier,
    history: History,
    controller: Arc<VolumeController>,
    state: Arc<SharedState>,
}

impl Engine {
    pub fn new(
        settings: &Settings,
        controller: Arc<VolumeController>,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            settings: settings.clone(),
            normalizer: Normalizer::new(settings),
            analyzer: Analyzer::new(settings),
            classifier: Classifier::new(settings),
            history: History::new(settings.smoothing_window),
            controller,
            state,
        }
    }

    /// Full pipeline step for one frame; returns the volume applied by the
    /// controller, if any.
    ///
    /// Loudness comes from the raw frame; normalization happens only ahead
    /// of the spectral analysis, so weak signals classify like strong ones
    /// without distorting the level readings.
    pub fn process_frame(&mut self, frame: &mut [f32]) -> Option<i32> {
        let loudness_db = self.analyzer.loudness_db(frame);
        let is_silence = self.controller.is_silence(loudness_db);

        self.history.push_level(loudness_db);
        self.state.set_loudness(loudness_db);

        let predominant = if is_silence {
            Classification::unknown()
        } else {
            self.normalizer.normalize(frame);
            let features = self.analyzer.spectral_features(frame);
            let classification = self.classifier.classify(&features);
            self.history.push_classification(classification);
            self.history
                .predominant_type()
                .unwrap_or_else(Classification::unknown)
        };
        self.state.set_classification(&predominant);

        self.dispatch(loudness_db, is_silence, &predominant)
    }

    /// Responsiveness ladder: silence acts on the instantaneous level,
    /// confident detections act on a short recent mean, everything else
    /// waits for the full smoothing window (or for loud/music evidence).
    fn dispatch(
        &self,
        loudness_db: f32,
        is_silence: bool,
        predominant: &Classification,
    ) -> Option<i32> {
        let levels = self.history.level_count();

        if is_silence && levels >= 1 {
            return self.controller.adjust_based_on_type(loudness_db, predominant);
        }

        if matches!(
            predominant.audio_type,
            AudioType::Dialogue | AudioType::Music
        ) && predominant.confidence > FAST_PATH_CONFIDENCE
            && levels >= FAST_PATH_WINDOW
        {
            let recent = self.history.recent_loudness(FAST_PATH_WINDOW);
            return self.controller.adjust_based_on_type(recent, predominant);
        }

        if levels >= STABLE_PATH_MIN_LEVELS {
            return self
                .controller
                .adjust_based_on_type(self.history.smoothed_loudness(), predominant);
        }

        if levels >= FAST_PATH_WINDOW {
            let recent = self.history.recent_loudness(FAST_PATH_WINDOW);
            if recent > self.settings.threshold_loud
                || predominant.audio_type == AudioType::Music
            {
                return self.controller.adjust_based_on_type(recent, predominant);
            }
        }

        None
    }

    /// Pull frames until the source runs dry or the running flag clears.
    pub fn run(&mut self, source: &mut dyn FrameSource, running: &AtomicBool) -> Result<()> {
        while running.load(Ordering::SeqCst) {
            let Some(mut frame) = source.next_frame()? else {
                log::info!("Audio source exhausted");
                break;
            };
            let _ = self.process_frame(&mut frame);
        }
        Ok(())
    }
}
