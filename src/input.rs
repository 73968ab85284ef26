use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::calibrate::AdaptiveThresholds;
use crate::state::shared::SharedState;
use crate::volume::controller::VolumeController;

/// Volume delta applied per manual up/down event.
pub const MANUAL_VOLUME_STEP: i32 = 2;
/// Baseline delta applied per baseline up/down event, in dB.
pub const BASELINE_STEP_DB: f32 = 1.0;

/// Discrete user commands; the transport that produces them is
/// interchangeable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlEvent {
    VolumeUp,
    VolumeDown,
    BaselineUp,
    BaselineDown,
    Quit,
}

/// Map one input line to a control event; unrecognized lines are ignored.
pub fn parse_event(line: &str) -> Option<ControlEvent> {
    match line.trim() {
        "+" | "u" | "up" => Some(ControlEvent::VolumeUp),
        "-" | "d" | "down" => Some(ControlEvent::VolumeDown),
        "b+" => Some(ControlEvent::BaselineUp),
        "b-" => Some(ControlEvent::BaselineDown),
        "q" | "quit" => Some(ControlEvent::Quit),
        _ => None,
    }
}

/// Thin stdin adapter: one command per line.
pub fn spawn_stdin_reader(
    tx: Sender<ControlEvent>,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            if !running.load(Ordering::SeqCst) {
                break;
            }
            let Ok(line) = line else { break };
            if let Some(event) = parse_event(&line) {
                let quit = event == ControlEvent::Quit;
                if tx.send(event).is_err() || quit {
                    break;
                }
            }
        }
    })
}

/// Consume control events until shutdown.
///
/// Manual volume deltas go through the controller (opening the override
/// window); baseline deltas mutate shared state directly. When calibration
/// is enabled, each successful manual change feeds the threshold learner.
pub fn run_event_loop(
    rx: Receiver<ControlEvent>,
    controller: Arc<VolumeController>,
    state: Arc<SharedState>,
    mut calibration: Option<AdaptiveThresholds>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::SeqCst) {
        let event = match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        match event {
            ControlEvent::VolumeUp => {
                apply_manual(MANUAL_VOLUME_STEP, &controller, &state, calibration.as_mut());
            }
            ControlEvent::VolumeDown => {
                apply_manual(-MANUAL_VOLUME_STEP, &controller, &state, calibration.as_mut());
            }
            ControlEvent::BaselineUp => controller.adjust_baseline(BASELINE_STEP_DB),
            ControlEvent::BaselineDown => controller.adjust_baseline(-BASELINE_STEP_DB),
            ControlEvent::Quit => {
                running.store(false, Ordering::SeqCst);
                break;
            }
        }
    }
}

fn apply_manual(
    delta: i32,
    controller: &VolumeController,
    state: &SharedState,
    calibration: Option<&mut AdaptiveThresholds>,
) {
    let previous = state.current_volume();
    let Some(new_volume) = controller.manual_adjust(delta) else {
        log::warn!("Manual adjustment skipped, device unavailable");
        return;
    };
    if let Some(calibration) = calibration {
        let loudness_db = state.snapshot().loudness_db;
        calibration.observe_manual_volume(new_volume, loudness_db, previous);
        log::info!(
            "Calibrated thresholds: quiet {:.1} dB, loud {:.1} dB",
            calibration.threshold_quiet(),
            calibration.threshold_loud(),
        );
    }
}
