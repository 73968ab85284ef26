pub mod analyzer;
pub mod classifier;
pub mod features;
pub mod normalizer;

/// Root-mean-square amplitude of a frame; 0.0 for an empty frame.
pub fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32).sqrt()
}
