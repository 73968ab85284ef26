/// Spectral features extracted from a single frame.
///
/// All fields are ratios of summed band magnitudes (or a variation
/// coefficient) and are zero for a frame with no spectral energy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpectrumFeatures {
    /// Combined voice-band energy (fundamental + formants + harmonics)
    /// over total in-band energy.
    pub voice_ratio: f32,
    /// Voice-formant band (500-2000 Hz) over total in-band energy.
    pub voice_formants_ratio: f32,
    /// Bass band over combined voice-band energy.
    pub bass_to_voice_ratio: f32,
    /// High-mid plus high band over combined voice-band energy.
    pub high_to_voice_ratio: f32,
    /// Coefficient of variation of the magnitude spectrum.
    pub spectral_variation: f32,
    /// Bass + high-mid + high band over total in-band energy.
    pub background_music_ratio: f32,
    /// Voice-formant band over total in-band energy.
    pub ratio_voice_formants: f32,
    /// Bass band over total in-band energy.
    pub ratio_bass: f32,
    /// High band (8 kHz+) over total in-band energy.
    pub ratio_high: f32,
}
