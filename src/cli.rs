use clap::Parser;
use std::path::PathBuf;

use crate::config::Settings;

#[derive(Parser, Debug)]
#[command(
    name = "autovol",
    about = "Keeps a playback device at a comfortable volume based on what it hears"
)]
pub struct Cli {
    /// WAV file to monitor as the ambient feed
    pub input: Option<PathBuf>,

    /// Config file path (default: autovol.toml, then the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Playback device name
    #[arg(short, long)]
    pub device: Option<String>,

    /// Base URL of an HTTP volume endpoint (preferred backend)
    #[arg(long)]
    pub device_url: Option<String>,

    /// Program used by the subprocess backend
    #[arg(long, default_value = "catt")]
    pub device_cli: String,

    /// Minimum allowed volume
    #[arg(long)]
    pub volume_min: Option<i32>,

    /// Maximum allowed volume
    #[arg(long)]
    pub volume_max: Option<i32>,

    /// Ceiling automatic adjustments never exceed
    #[arg(long)]
    pub volume_baseline_max: Option<i32>,

    /// Decibel threshold to consider 'too loud'
    #[arg(long)]
    pub threshold_loud: Option<f32>,

    /// Decibel threshold to consider 'too quiet'
    #[arg(long)]
    pub threshold_quiet: Option<f32>,

    /// Target decibel level
    #[arg(long)]
    pub target_db: Option<f32>,

    /// Volume adjustment step size
    #[arg(long)]
    pub step: Option<i32>,

    /// Learn loudness thresholds from manual adjustments
    #[arg(long)]
    pub adaptive: bool,

    /// Deliver frames as fast as possible instead of in real time
    #[arg(long)]
    pub no_realtime: bool,
}

impl Cli {
    /// Overlay explicitly-provided flags onto the loaded settings.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(device) = &self.device {
            settings.device_name = device.clone();
        }
        if let Some(volume_min) = self.volume_min {
            settings.volume_min = volume_min;
        }
        if let Some(volume_max) = self.volume_max {
            settings.volume_max = volume_max;
        }
        if let Some(baseline_max) = self.volume_baseline_max {
            settings.volume_baseline_max = baseline_max;
        }
        if let Some(threshold_loud) = self.threshold_loud {
            settings.threshold_loud = threshold_loud;
        }
        if let Some(threshold_quiet) = self.threshold_quiet {
            settings.threshold_quiet = threshold_quiet;
        }
        if let Some(target_db) = self.target_db {
            settings.target_db = target_db;
        }
        if let Some(step) = self.step {
            settings.adjustment_step = step;
        }
        if self.adaptive {
            settings.adaptive_thresholds = true;
        }
    }
}
