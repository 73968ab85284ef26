use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::Settings;

/// Delivers fixed-size mono frames to the pipeline.
///
/// Live capture backends sit behind this seam; the crate ships a WAV
/// replay source for offline runs and calibration.
pub trait FrameSource: Send {
    /// Next frame of `chunk_size` samples, or `None` once exhausted.
    fn next_frame(&mut self) -> Result<Option<Vec<f32>>>;
}

/// Replays a WAV file as the ambient feed.
///
/// Stereo files are mixed down to mono. In real-time mode each frame is
/// delivered after one chunk duration, mimicking a live capture; otherwise
/// frames stream as fast as the pipeline consumes them. A trailing partial
/// frame is dropped.
pub struct WavSource {
    samples: Vec<f32>,
    position: usize,
    chunk_size: usize,
    pacing: Option<Duration>,
}

impl WavSource {
    pub fn open(path: &Path, settings: &Settings, realtime: bool) -> Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
        let spec = reader.spec();

        if spec.sample_rate != settings.sample_rate {
            log::warn!(
                "WAV sample rate {} differs from configured {}; band edges will shift",
                spec.sample_rate,
                settings.sample_rate
            );
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .context("Failed to decode WAV samples")?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .context("Failed to decode WAV samples")?
            }
        };

        let samples = mix_to_mono(&interleaved, spec.channels as usize);

        let pacing = realtime.then(|| Duration::from_secs_f32(settings.chunk_duration));
        Ok(Self {
            samples,
            position: 0,
            chunk_size: settings.chunk_size(),
            pacing,
        })
    }

    #[cfg(test)]
    fn from_samples(samples: Vec<f32>, chunk_size: usize) -> Self {
        Self {
            samples,
            position: 0,
            chunk_size,
            pacing: None,
        }
    }
}

/// Average interleaved channels down to one.
fn mix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

impl FrameSource for WavSource {
    fn next_frame(&mut self) -> Result<Option<Vec<f32>>> {
        let end = self.position + self.chunk_size;
        if end > self.samples.len() {
            return Ok(None);
        }
        let frame = self.samples[self.position..end].to_vec();
        self.position = end;
        if let Some(pacing) = self.pacing {
            std::thread::sleep(pacing);
        }
        Ok(Some(frame))
    }
}
