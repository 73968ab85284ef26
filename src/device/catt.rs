use std::process::Command;

use super::VolumeDevice;

/// Fallback backend driving a `catt`-compatible CLI.
///
/// Every call spawns a subprocess, so it is noticeably slower than the
/// HTTP backend, but it needs nothing beyond the tool on PATH. There is no
/// session to hold open; "connected" just means the last status probe
/// succeeded.
pub struct CattDevice {
    program: String,
    device_name: String,
    connected: bool,
}

impl CattDevice {
    pub fn new(device_name: &str) -> Self {
        Self::with_program("catt", device_name)
    }

    pub fn with_program(program: &str, device_name: &str) -> Self {
        Self {
            program: program.to_string(),
            device_name: device_name.to_string(),
            connected: false,
        }
    }

    fn status_output(&self) -> Option<String> {
        let output = Command::new(&self.program)
            .args(["-d", &self.device_name, "status"])
            .output();
        match output {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                log::debug!("{} status exited with {}", self.program, output.status);
                None
            }
            Err(err) => {
                log::debug!("Failed to run {}: {err}", self.program);
                None
            }
        }
    }
}

/// Pull the volume out of `catt status` output.
fn parse_status_volume(stdout: &str) -> Option<i32> {
    stdout.lines().find_map(|line| {
        line.strip_prefix("Volume:")
            .and_then(|rest| rest.trim().parse().ok())
    })
}

impl VolumeDevice for CattDevice {
    fn connect(&mut self) -> bool {
        self.connected = self.status_output().is_some();
        self.connected
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn get_volume(&mut self) -> Option<i32> {
        parse_status_volume(&self.status_output()?)
    }

    fn set_volume(&mut self, volume: i32) -> bool {
        let output = Command::new(&self.program)
            .args(["-d", &self.device_name, "volume", &volume.to_string()])
            .output();
        match output {
            Ok(output) => output.status.success(),
            Err(err) => {
                log::debug!("Failed to run {}: {err}", self.program);
                false
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn name(&self) -> &str {
        &self.device_name
    }
}
