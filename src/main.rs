mod audio;
mod calibrate;
mod cli;
mod config;
mod device;
mod engine;
mod input;
mod source;
mod state;
mod volume;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use audio::classifier::AudioType;
use calibrate::AdaptiveThresholds;
use cli::Cli;
use config::Settings;
use device::catt::CattDevice;
use device::http::HttpDevice;
use device::{FailoverDevice, VolumeDevice};
use engine::Engine;
use source::WavSource;
use state::shared::{SharedState, StateSnapshot};
use volume::controller::VolumeController;

const STATUS_INTERVAL: Duration = Duration::from_millis(500);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect autovol.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("autovol.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(config_dir) = dirs::config_dir() {
            let global = config_dir.join("autovol").join("config.toml");
            if global.exists() {
                return Some(global);
            }
        }
        None
    });
    let mut settings = match &config_path {
        Some(path) => {
            let settings = config::load_settings(path)?;
            log::info!("Loaded config from {}", path.display());
            settings
        }
        None => Settings::default(),
    };
    cli.apply_to(&mut settings);
    settings.validate().context("Invalid configuration")?;

    let input = cli.input.as_ref().context("Input WAV file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("autovol - ambient-aware volume control");
    log::info!("Input: {}", input.display());
    log::info!("Device: {}", settings.device_name);
    log::info!(
        "Limits: {}-{}% (auto ceiling {}%)",
        settings.volume_min,
        settings.volume_max,
        settings.volume_baseline_max
    );

    // 1. Build and connect the playback device
    let device: Box<dyn VolumeDevice> = match &cli.device_url {
        Some(url) => Box::new(FailoverDevice::new(
            Box::new(HttpDevice::new(url)?),
            Box::new(CattDevice::with_program(&cli.device_cli, &settings.device_name)),
        )),
        None => Box::new(CattDevice::with_program(&cli.device_cli, &settings.device_name)),
    };
    let device = device::shared(device);
    if !device.lock().unwrap().connect() {
        anyhow::bail!(
            "Could not connect to playback device '{}'",
            settings.device_name
        );
    }

    // 2. Seed shared state with the device's current volume
    let state = Arc::new(SharedState::new(&settings));
    let initial_volume = device
        .lock()
        .unwrap()
        .get_volume()
        .context("Could not read initial volume from the device")?;
    state.set_volume(initial_volume);
    log::info!("Initial volume: {initial_volume}%");

    // 3. Wire the decision engine
    let controller = Arc::new(VolumeController::new(&settings, device.clone(), state.clone()));
    let mut engine = Engine::new(&settings, controller.clone(), state.clone());
    let mut wav = WavSource::open(input, &settings, !cli.no_realtime)?;

    // 4. Start the pipeline and input contexts
    let running = Arc::new(AtomicBool::new(true));

    let pipeline = {
        let running = running.clone();
        std::thread::spawn(move || {
            if let Err(err) = engine.run(&mut wav, &running) {
                log::error!("Pipeline stopped: {err:#}");
            }
            running.store(false, Ordering::SeqCst);
        })
    };

    let (tx, rx) = mpsc::channel();
    // Detached on purpose: a blocked stdin read ends with the process.
    let _stdin = input::spawn_stdin_reader(tx, running.clone());
    let calibration = settings
        .adaptive_thresholds
        .then(|| AdaptiveThresholds::new(&settings));
    let events = {
        let controller = controller.clone();
        let state = state.clone();
        let running = running.clone();
        std::thread::spawn(move || {
            input::run_event_loop(rx, controller, state, calibration, running)
        })
    };

    println!("Keyboard control: +/- volume, b+/b- baseline, q quit");

    // 5. Repaint the status line until shutdown
    let mut last_len = 0usize;
    while running.load(Ordering::SeqCst) {
        let line = status_line(&state.snapshot());
        print!("\r{line:<last_len$}");
        last_len = line.len();
        std::io::stdout().flush().ok();
        std::thread::sleep(STATUS_INTERVAL);
    }
    println!();

    if let Err(err) = pipeline.join() {
        log::error!("Pipeline thread panicked: {err:?}");
    }
    if let Err(err) = events.join() {
        log::error!("Input thread panicked: {err:?}");
    }
    device.lock().unwrap().disconnect();
    log::info!("Done");
    Ok(())
}

fn status_line(snapshot: &StateSnapshot) -> String {
    let volume = match snapshot.current_volume {
        Some(volume) => volume.to_string(),
        None => "--".into(),
    };
    let audio_type = match snapshot.audio_type {
        AudioType::Unknown => "Unknown".to_string(),
        AudioType::Dialogue => format!("Dialogue ({:.0}%)", snapshot.confidence * 100.0),
        AudioType::Music => format!("Music ({:.0}%)", snapshot.confidence * 100.0),
    };
    let mode = if snapshot.manual_override_active {
        format!("Manual: {}s", snapshot.manual_pause_remaining.as_secs())
    } else {
        "Auto".to_string()
    };
    format!(
        "Volume: {volume}% (max: {}%) | Audio: {:.1} dB | Type: {audio_type} | {mode} | Target: {:.1} dB",
        snapshot.volume_baseline_max, snapshot.loudness_db, snapshot.target_db
    )
}
