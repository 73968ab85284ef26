pub mod catt;
pub mod http;

use std::sync::{Arc, Mutex};

/// Capability surface of a remote playback device.
///
/// Implementations may block on network or subprocess I/O with bounded
/// timeouts; every failure is transient and reported as `None`/`false`,
/// never as a panic or error. The next cycle retries naturally.
pub trait VolumeDevice: Send {
    fn connect(&mut self) -> bool;
    fn disconnect(&mut self);
    /// Current volume in 0..=100, or `None` when unreachable.
    fn get_volume(&mut self) -> Option<i32>;
    /// Returns true when the device accepted the new volume.
    fn set_volume(&mut self, volume: i32) -> bool;
    fn is_connected(&self) -> bool;
    fn name(&self) -> &str;
}

/// Device handle shared between the pipeline and input contexts. Its mutex
/// serializes device I/O and is independent of the shared-state lock.
pub type SharedDevice = Arc<Mutex<Box<dyn VolumeDevice>>>;

pub fn shared(device: Box<dyn VolumeDevice>) -> SharedDevice {
    Arc::new(Mutex::new(device))
}

#[derive(Clone, Copy, PartialEq)]
enum Active {
    None,
    Primary,
    Fallback,
}

/// Composition wrapper over a fast primary backend and a slower fallback.
///
/// Selection happens at connect time: the primary is tried first and the
/// fallback only when it refuses. Calls then delegate to whichever side is
/// active.
pub struct FailoverDevice {
    primary: Box<dyn VolumeDevice>,
    fallback: Box<dyn VolumeDevice>,
    active: Active,
}

impl FailoverDevice {
    pub fn new(primary: Box<dyn VolumeDevice>, fallback: Box<dyn VolumeDevice>) -> Self {
        Self {
            primary,
            fallback,
            active: Active::None,
        }
    }

    fn active_mut(&mut self) -> Option<&mut Box<dyn VolumeDevice>> {
        match self.active {
            Active::None => None,
            Active::Primary => Some(&mut self.primary),
            Active::Fallback => Some(&mut self.fallback),
        }
    }
}

impl VolumeDevice for FailoverDevice {
    fn connect(&mut self) -> bool {
        if self.primary.connect() {
            log::info!("Connected via {}", self.primary.name());
            self.active = Active::Primary;
            return true;
        }
        log::warn!(
            "{} unreachable, trying {}",
            self.primary.name(),
            self.fallback.name()
        );
        if self.fallback.connect() {
            log::info!("Connected via {}", self.fallback.name());
            self.active = Active::Fallback;
            return true;
        }
        self.active = Active::None;
        false
    }

    fn disconnect(&mut self) {
        if let Some(device) = self.active_mut() {
            device.disconnect();
        }
        self.active = Active::None;
    }

    fn get_volume(&mut self) -> Option<i32> {
        self.active_mut()?.get_volume()
    }

    fn set_volume(&mut self, volume: i32) -> bool {
        match self.active_mut() {
            Some(device) => device.set_volume(volume),
            None => false,
        }
    }

    fn is_connected(&self) -> bool {
        match self.active {
            Active::None => false,
            Active::Primary => self.primary.is_connected(),
            Active::Fallback => self.fallback.is_connected(),
        }
    }

    fn name(&self) -> &str {
        match self.active {
            Active::Fallback => self.fallback.name(),
            _ => self.primary.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDevice {
        label: &'static str,
        reachable: bool,
        connected: bool,
        volume: i32,
    }

    impl FakeDevice {
        fn new(label: &'static str, reachable: bool) -> Self {
            Self {
                label,
                reachable,
                connected: false,
                volume: 50,
            }
        }
    }

    impl VolumeDevice for FakeDevice {
        fn connect(&mut self) -> bool {
            self.connected = self.reachable;
            self.connected
        }

        fn disconnect(&mut self) {
            self.connected = false;
        }

        fn get_volume(&mut self) -> Option<i32> {
            self.connected.then_some(self.volume)
        }

        fn set_volume(&mut self, volume: i32) -> bool {
            if self.connected {
                self.volume = volume;
            }
            self.connected
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn name(&self) -> &str {
            self.label
        }
    }

    #[test]
    fn prefers_the_primary_backend() {
        let mut device = FailoverDevice::new(
            Box::new(FakeDevice::new("primary", true)),
            Box::new(FakeDevice::new("fallback", true)),
        );
        assert!(device.connect());
        assert_eq!(device.name(), "primary");
        assert_eq!(device.get_volume(), Some(50));
    }

    #[test]
    fn falls_back_when_primary_refuses() {
        let mut device = FailoverDevice::new(
            Box::new(FakeDevice::new("primary", false)),
            Box::new(FakeDevice::new("fallback", true)),
        );
        assert!(device.connect());
        assert_eq!(device.name(), "fallback");
        assert!(device.set_volume(60));
        assert_eq!(device.get_volume(), Some(60));
    }

    #[test]
    fn reports_failure_when_both_refuse() {
        let mut device = FailoverDevice::new(
            Box::new(FakeDevice::new("primary", false)),
            Box::new(FakeDevice::new("fallback", false)),
        );
        assert!(!device.connect());
        assert!(!device.is_connected());
        assert_eq!(device.get_volume(), None);
        assert!(!device.set_volume(60));
    }

    #[test]
    fn disconnect_clears_the_active_backend() {
        let mut device = FailoverDevice::new(
            Box::new(FakeDevice::new("primary", true)),
            Box::new(FakeDevice::new("fallback", true)),
        );
        device.connect();
        device.disconnect();
        assert!(!device.is_connected());
        assert_eq!(device.get_volume(), None);
    }
}
