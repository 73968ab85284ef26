use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::VolumeDevice;

/// Bounded timeout for every device request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize, Serialize)]
struct VolumePayload {
    volume: i32,
}

/// Fast backend speaking a minimal HTTP volume endpoint.
///
/// The blocking client keeps its connection pool alive across calls, so
/// after the first request get/set round-trips stay cheap. Expected
/// endpoint: `GET <base>/volume` returning `{"volume": N}` and
/// `PUT <base>/volume` accepting the same payload.
pub struct HttpDevice {
    client: reqwest::blocking::Client,
    endpoint: String,
    label: String,
    connected: bool,
}

impl HttpDevice {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for the playback device")?;
        let endpoint = format!("{}/volume", base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            label: format!("http ({base_url})"),
            connected: false,
        })
    }

    fn fetch_volume(&self) -> Option<i32> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .and_then(|r| r.error_for_status())
            .ok()?;
        let payload: VolumePayload = response.json().ok()?;
        Some(payload.volume)
    }
}

impl VolumeDevice for HttpDevice {
    fn connect(&mut self) -> bool {
        self.connected = self.fetch_volume().is_some();
        self.connected
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn get_volume(&mut self) -> Option<i32> {
        if !self.connected {
            return None;
        }
        let volume = self.fetch_volume();
        if volume.is_none() {
            log::debug!("Volume read failed at {}", self.endpoint);
        }
        volume
    }

    fn set_volume(&mut self, volume: i32) -> bool {
        if !self.connected {
            return false;
        }
        match self
            .client
            .put(&self.endpoint)
            .json(&VolumePayload { volume })
            .send()
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                log::debug!("Volume set rejected: HTTP {}", response.status());
                false
            }
            Err(err) => {
                log::debug!("Volume set failed: {err}");
                false
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn name(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_drops_trailing_slash() {
        let device = HttpDevice::new("http://tv.local:8008/").unwrap();
        assert_eq!(device.endpoint, "http://tv.local:8008/volume");
    }

    #[test]
    fn starts_disconnected_and_refuses_io() {
        let mut device = HttpDevice::new("http://tv.local:8008").unwrap();
        assert!(!device.is_connected());
        assert_eq!(device.get_volume(), None);
        assert!(!device.set_volume(40));
    }

    #[test]
    fn volume_payload_round_trips() {
        let payload: VolumePayload = serde_json::from_str(r#"{"volume": 42}"#).unwrap();
        assert_eq!(payload.volume, 42);
        let body = serde_json::to_string(&VolumePayload { volume: 55 }).unwrap();
        assert_eq!(body, r#"{"volume":55}"#);
    }
}
