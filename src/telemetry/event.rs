// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/rayshed

//! Event assembly
//!
//! An [`Event`] is an immutable snapshot of everything the bridge knows,
//! stamped with the detector identity, a monotonic sequence number and the
//! wall-clock time. The [`EventAssembler`] decides whether an incoming
//! record qualifies and builds the event when it does.

use chrono::Utc;
use serde::Serialize;

use super::sensors::{SensorCategory, SensorState};
use super::toggles::RuntimeToggleStore;
use super::SequenceAllocator;

/// A fully assembled telemetry event, ready for publication.
///
/// Serializes to a flat record with stable keys: `detector_id`, `sequence`,
/// `date`, then one key per sensor category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Stable per-instance detector identifier.
    pub detector_id: String,
    /// Monotonic sequence number, starting at 1 for the process lifetime.
    pub sequence: u64,
    /// Human-readable UTC timestamp captured at construction.
    pub date: String,
    /// Full copy of the sensor snapshot at construction time.
    #[serde(flatten)]
    pub sensors: SensorState,
}

/// Builds events from qualifying sensor updates.
pub struct EventAssembler {
    detector_id: String,
    sequence: SequenceAllocator,
}

impl EventAssembler {
    /// Create an assembler for the given detector identity.
    pub fn new(detector_id: impl Into<String>) -> Self {
        Self {
            detector_id: detector_id.into(),
            sequence: SequenceAllocator::new(),
        }
    }

    /// Build an event if the category is a trigger and its monitoring toggle
    /// is currently on.
    ///
    /// Triggers are checked in the fixed order vibration, weather, cosmic.
    /// Each line carries exactly one category, so at most one event results,
    /// and a sequence number is consumed only when an event is built. The
    /// snapshot is copied in full; later merges never alter a built event.
    pub fn maybe_build(
        &mut self,
        category: SensorCategory,
        toggles: &RuntimeToggleStore,
        state: &SensorState,
    ) -> Option<Event> {
        let qualifies = match category {
            SensorCategory::Vibration => toggles.vibration(),
            SensorCategory::Temperature => toggles.weather(),
            SensorCategory::Cosmic => toggles.cosmics(),
            _ => false,
        };

        if !qualifies {
            return None;
        }

        Some(Event {
            detector_id: self.detector_id.clone(),
            sequence: self.sequence.next(),
            date: Utc::now().format("%a %b %e %H:%M:%S %Y").to_string(),
            sensors: state.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::RuntimeToggleStore;

    fn all_on() -> RuntimeToggleStore {
        RuntimeToggleStore::default()
    }

    #[test]
    fn test_sequence_numbers_start_at_one_and_increase() {
        let mut assembler = EventAssembler::new("aa:bb:cc:dd:ee:ff");
        let toggles = all_on();
        let state = SensorState::default();

        let first = assembler
            .maybe_build(SensorCategory::Vibration, &toggles, &state)
            .unwrap();
        let second = assembler
            .maybe_build(SensorCategory::Temperature, &toggles, &state)
            .unwrap();
        let third = assembler
            .maybe_build(SensorCategory::Cosmic, &toggles, &state)
            .unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(third.sequence, 3);
    }

    #[test]
    fn test_passive_categories_never_build() {
        let mut assembler = EventAssembler::new("id");
        let toggles = all_on();
        let state = SensorState::default();

        for category in [
            SensorCategory::Barometer,
            SensorCategory::Magnetometer,
            SensorCategory::Accelerometer,
            SensorCategory::Location,
            SensorCategory::Timing,
            SensorCategory::Status,
        ] {
            assert!(assembler.maybe_build(category, &toggles, &state).is_none());
        }
    }

    #[test]
    fn test_disabled_toggle_suppresses_and_consumes_no_sequence() {
        let mut assembler = EventAssembler::new("id");
        let toggles = all_on();
        toggles.toggle_vibration(); // off
        let state = SensorState::default();

        assert!(assembler
            .maybe_build(SensorCategory::Vibration, &toggles, &state)
            .is_none());
        assert!(assembler
            .maybe_build(SensorCategory::Vibration, &toggles, &state)
            .is_none());

        // The suppressed lines must not have burned sequence numbers.
        let event = assembler
            .maybe_build(SensorCategory::Cosmic, &toggles, &state)
            .unwrap();
        assert_eq!(event.sequence, 1);
    }

    #[test]
    fn test_reenabling_takes_effect_on_next_line() {
        let mut assembler = EventAssembler::new("id");
        let toggles = all_on();
        let state = SensorState::default();

        toggles.toggle_weather(); // off
        assert!(assembler
            .maybe_build(SensorCategory::Temperature, &toggles, &state)
            .is_none());

        toggles.toggle_weather(); // back on
        assert!(assembler
            .maybe_build(SensorCategory::Temperature, &toggles, &state)
            .is_some());
    }

    #[test]
    fn test_event_snapshot_is_a_full_copy() {
        let mut assembler = EventAssembler::new("id");
        let toggles = all_on();
        let mut state = SensorState::default();
        state.merge(r#"{"vibration": {"direction": "1", "count": "3"}}"#);

        let event = assembler
            .maybe_build(SensorCategory::Vibration, &toggles, &state)
            .unwrap();

        // Mutating the live snapshot afterwards must not change the event.
        state.merge(r#"{"vibration": {"direction": "9", "count": "99"}}"#);
        assert_eq!(event.sensors.vibration.direction, "1");
        assert_eq!(event.sensors.vibration.count, "3");
    }

    #[test]
    fn test_event_serializes_flat_with_stable_keys() {
        let mut assembler = EventAssembler::new("aa:bb:cc:dd:ee:ff");
        let toggles = all_on();
        let mut state = SensorState::default();
        state.merge(r#"{"vibration": {"direction": "1", "count": "3"}}"#);

        let event = assembler
            .maybe_build(SensorCategory::Vibration, &toggles, &state)
            .unwrap();
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["detector_id"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(value["sequence"], 1);
        assert!(value["date"].is_string());
        assert_eq!(value["vibration"]["direction"], "1");
        assert_eq!(value["vibration"]["count"], "3");
        // Background categories ride along with their defaults.
        assert_eq!(value["temperature"]["humidity"], "0.0");
        assert_eq!(value["status"]["queue_size"], "0");
        assert!(value["event"].is_null());
    }
}
