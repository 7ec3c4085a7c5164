// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/rayshed

//! Runtime toggle store
//!
//! One atomic boolean per flag. The dispatch thread reads these on every
//! iteration and the command thread flips them one at a time; no cross-flag
//! consistency is needed or provided.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::Config;

/// Mutable runtime flags shared between the dispatch loop and the command
/// server.
#[derive(Debug)]
pub struct RuntimeToggleStore {
    debug: AtomicBool,
    vibration: AtomicBool,
    weather: AtomicBool,
    cosmics: AtomicBool,
    publish: AtomicBool,
    log: AtomicBool,
    device: AtomicBool,
}

impl RuntimeToggleStore {
    /// Build the initial flag set from the merged configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            debug: AtomicBool::new(config.debug),
            vibration: AtomicBool::new(config.monitoring.vibration),
            weather: AtomicBool::new(config.monitoring.weather),
            cosmics: AtomicBool::new(config.monitoring.cosmics),
            publish: AtomicBool::new(config.broker.enabled),
            log: AtomicBool::new(config.logging.enabled),
            device: AtomicBool::new(true),
        }
    }

    /// Debug diagnostics flag.
    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Vibration monitoring flag.
    pub fn vibration(&self) -> bool {
        self.vibration.load(Ordering::Relaxed)
    }

    /// Weather monitoring flag.
    pub fn weather(&self) -> bool {
        self.weather.load(Ordering::Relaxed)
    }

    /// Cosmic ray monitoring flag.
    pub fn cosmics(&self) -> bool {
        self.cosmics.load(Ordering::Relaxed)
    }

    /// Event publication flag.
    pub fn publish(&self) -> bool {
        self.publish.load(Ordering::Relaxed)
    }

    /// Local event log flag.
    pub fn log(&self) -> bool {
        self.log.load(Ordering::Relaxed)
    }

    /// Serial device administratively enabled.
    pub fn device(&self) -> bool {
        self.device.load(Ordering::Relaxed)
    }

    /// Flip the debug flag, returning the new value.
    pub fn toggle_debug(&self) -> bool {
        !self.debug.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flip the vibration monitoring flag, returning the new value.
    pub fn toggle_vibration(&self) -> bool {
        !self.vibration.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flip the weather monitoring flag, returning the new value.
    pub fn toggle_weather(&self) -> bool {
        !self.weather.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flip the cosmic ray monitoring flag, returning the new value.
    pub fn toggle_cosmics(&self) -> bool {
        !self.cosmics.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flip the publication flag, returning the new value.
    pub fn toggle_publish(&self) -> bool {
        !self.publish.fetch_xor(true, Ordering::Relaxed)
    }

    /// Flip the event log flag, returning the new value.
    pub fn toggle_log(&self) -> bool {
        !self.log.fetch_xor(true, Ordering::Relaxed)
    }

    /// Set the serial device flag.
    pub fn set_device(&self, enabled: bool) {
        self.device.store(enabled, Ordering::Relaxed);
    }
}

impl Default for RuntimeToggleStore {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_returns_new_value() {
        let toggles = RuntimeToggleStore::default();
        assert!(!toggles.debug());

        assert!(toggles.toggle_debug());
        assert!(toggles.debug());

        assert!(!toggles.toggle_debug());
        assert!(!toggles.debug());
    }

    #[test]
    fn test_flags_are_independent() {
        let toggles = RuntimeToggleStore::default();
        toggles.toggle_vibration();

        assert!(!toggles.vibration());
        assert!(toggles.weather());
        assert!(toggles.cosmics());
        assert!(toggles.publish());
        assert!(toggles.log());
        assert!(toggles.device());
    }
}
