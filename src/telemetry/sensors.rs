// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/rayshed

//! Sensor snapshot state and record decoding
//!
//! The detector firmware emits one JSON record per line, each with a single
//! top-level category key, e.g. `{"vibration": {"direction": "1", "count": "3"}}`.
//! Sub-attribute values arrive as strings or bare numbers depending on the
//! firmware revision; both are kept in their textual form, and no range
//! validation is done here. Validation is the downstream consumer's job.

use serde::{Deserialize, Deserializer, Serialize};

/// Accept a JSON string or bare number, keeping numbers in their textual
/// form. Anything else is a decode failure.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// Record categories understood by the bridge.
///
/// Vibration, temperature and cosmic records can trigger an event; the rest
/// only refresh the background snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorCategory {
    /// Temperature/humidity sample (the weather trigger).
    Temperature,
    /// Barometric sample.
    Barometer,
    /// Vibration/seismic sample.
    Vibration,
    /// Magnetometer axes.
    Magnetometer,
    /// Accelerometer axes.
    Accelerometer,
    /// GPS fix.
    Location,
    /// Firmware timing counters.
    Timing,
    /// Firmware/hardware health flags.
    Status,
    /// Cosmic-ray event payload, `event` on the wire.
    #[serde(rename = "event")]
    Cosmic,
}

/// Temperature/humidity reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    /// Degrees Celsius, as reported.
    #[serde(deserialize_with = "string_or_number")]
    pub temperature: String,
    /// Relative humidity percentage, as reported.
    #[serde(deserialize_with = "string_or_number")]
    pub humidity: String,
}

impl Default for TemperatureReading {
    fn default() -> Self {
        Self {
            temperature: "0.0".to_string(),
            humidity: "0.0".to_string(),
        }
    }
}

/// Barometric reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarometerReading {
    /// Degrees Celsius, as reported.
    #[serde(deserialize_with = "string_or_number")]
    pub temperature: String,
    /// Pressure in hPa, as reported.
    #[serde(deserialize_with = "string_or_number")]
    pub pressure: String,
    /// Barometric altitude in metres, as reported.
    #[serde(deserialize_with = "string_or_number")]
    pub altitude: String,
}

impl Default for BarometerReading {
    fn default() -> Self {
        Self {
            temperature: "0.0".to_string(),
            pressure: "0.0".to_string(),
            altitude: "0.0".to_string(),
        }
    }
}

/// Vibration reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibrationReading {
    /// Direction bitmask from the accelerometer interrupt.
    #[serde(deserialize_with = "string_or_number")]
    pub direction: String,
    /// Running vibration event count.
    #[serde(deserialize_with = "string_or_number")]
    pub count: String,
}

impl Default for VibrationReading {
    fn default() -> Self {
        Self {
            direction: "0".to_string(),
            count: "0".to_string(),
        }
    }
}

/// Three-axis reading, shared by the magnetometer and accelerometer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisReading {
    /// X axis value, as reported.
    #[serde(deserialize_with = "string_or_number")]
    pub x: String,
    /// Y axis value, as reported.
    #[serde(deserialize_with = "string_or_number")]
    pub y: String,
    /// Z axis value, as reported.
    #[serde(deserialize_with = "string_or_number")]
    pub z: String,
}

impl Default for AxisReading {
    fn default() -> Self {
        Self {
            x: "0.0".to_string(),
            y: "0.0".to_string(),
            z: "0.0".to_string(),
        }
    }
}

/// GPS location reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReading {
    /// Latitude in decimal degrees.
    #[serde(deserialize_with = "string_or_number")]
    pub latitude: String,
    /// Longitude in decimal degrees.
    #[serde(deserialize_with = "string_or_number")]
    pub longitude: String,
    /// GPS altitude in metres.
    #[serde(deserialize_with = "string_or_number")]
    pub altitude: String,
}

impl Default for LocationReading {
    fn default() -> Self {
        Self {
            latitude: "0.0".to_string(),
            longitude: "0.0".to_string(),
            altitude: "0.0".to_string(),
        }
    }
}

/// Firmware timing counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingReading {
    /// Seconds since firmware boot.
    #[serde(deserialize_with = "string_or_number")]
    pub uptime: String,
    /// Tick counter frequency in Hz.
    #[serde(deserialize_with = "string_or_number")]
    pub counter_frequency: String,
    /// Firmware wall-clock string.
    #[serde(deserialize_with = "string_or_number")]
    pub time_string: String,
}

impl Default for TimingReading {
    fn default() -> Self {
        Self {
            uptime: "0".to_string(),
            counter_frequency: "0".to_string(),
            time_string: "0".to_string(),
        }
    }
}

/// Firmware/hardware health flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReading {
    /// Records waiting in the firmware output queue.
    #[serde(deserialize_with = "string_or_number")]
    pub queue_size: String,
    /// Events dropped by the firmware.
    #[serde(deserialize_with = "string_or_number")]
    pub missed_events: String,
    /// Output buffer error flag.
    #[serde(deserialize_with = "string_or_number")]
    pub buffer_error: String,
    /// Temperature sensor health flag.
    #[serde(deserialize_with = "string_or_number")]
    pub temp_status: String,
    /// Barometer health flag.
    #[serde(deserialize_with = "string_or_number")]
    pub baro_status: String,
    /// Accelerometer health flag.
    #[serde(deserialize_with = "string_or_number")]
    pub accel_status: String,
    /// Magnetometer health flag.
    #[serde(deserialize_with = "string_or_number")]
    pub mag_status: String,
    /// GPS health flag.
    #[serde(deserialize_with = "string_or_number")]
    pub gps_status: String,
}

impl Default for StatusReading {
    fn default() -> Self {
        Self {
            queue_size: "0".to_string(),
            missed_events: "0".to_string(),
            buffer_error: "0".to_string(),
            temp_status: "0".to_string(),
            baro_status: "0".to_string(),
            accel_status: "0".to_string(),
            mag_status: "0".to_string(),
            gps_status: "0".to_string(),
        }
    }
}

/// Latest full snapshot per sensor category.
///
/// Owned by the dispatch thread; a category field is only ever replaced
/// wholesale by a successfully decoded record of that exact category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    /// Latest temperature/humidity sample.
    pub temperature: TemperatureReading,
    /// Latest barometric sample.
    pub barometer: BarometerReading,
    /// Latest vibration sample.
    pub vibration: VibrationReading,
    /// Latest magnetometer axes.
    pub magnetometer: AxisReading,
    /// Latest accelerometer axes.
    pub accelerometer: AxisReading,
    /// Latest GPS fix.
    pub location: LocationReading,
    /// Latest firmware timing counters.
    pub timing: TimingReading,
    /// Latest firmware health flags.
    pub status: StatusReading,
    /// Cosmic-ray payload, free-form. Null until the first cosmic record.
    pub event: serde_json::Value,
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            temperature: TemperatureReading::default(),
            barometer: BarometerReading::default(),
            vibration: VibrationReading::default(),
            magnetometer: AxisReading::default(),
            accelerometer: AxisReading::default(),
            location: LocationReading::default(),
            timing: TimingReading::default(),
            status: StatusReading::default(),
            event: serde_json::Value::Null,
        }
    }
}

/// One decoded record, tagged by its top-level category key.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum SensorUpdate {
    Temperature(TemperatureReading),
    Barometer(BarometerReading),
    Vibration(VibrationReading),
    Magnetometer(AxisReading),
    Accelerometer(AxisReading),
    Location(LocationReading),
    Timing(TimingReading),
    Status(StatusReading),
    Event(serde_json::Value),
}

impl SensorState {
    /// Merge one raw line from the detector into the snapshot.
    ///
    /// The firmware uses a relaxed quoting convention, so single quotes are
    /// normalized to double quotes before parsing. Anything that doesn't
    /// decode into a known category is discarded and the snapshot is left
    /// untouched.
    pub fn merge(&mut self, line: &str) -> Option<SensorCategory> {
        let line = line
            .trim_end_matches(|c| c == '\n' || c == '\r')
            .replace('\'', "\"");

        let update: SensorUpdate = serde_json::from_str(&line).ok()?;

        Some(match update {
            SensorUpdate::Temperature(reading) => {
                self.temperature = reading;
                SensorCategory::Temperature
            }
            SensorUpdate::Barometer(reading) => {
                self.barometer = reading;
                SensorCategory::Barometer
            }
            SensorUpdate::Vibration(reading) => {
                self.vibration = reading;
                SensorCategory::Vibration
            }
            SensorUpdate::Magnetometer(reading) => {
                self.magnetometer = reading;
                SensorCategory::Magnetometer
            }
            SensorUpdate::Accelerometer(reading) => {
                self.accelerometer = reading;
                SensorCategory::Accelerometer
            }
            SensorUpdate::Location(reading) => {
                self.location = reading;
                SensorCategory::Location
            }
            SensorUpdate::Timing(reading) => {
                self.timing = reading;
                SensorCategory::Timing
            }
            SensorUpdate::Status(reading) => {
                self.status = reading;
                SensorCategory::Status
            }
            SensorUpdate::Event(payload) => {
                self.event = payload;
                SensorCategory::Cosmic
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_vibration_replaces_field() {
        let mut state = SensorState::default();
        let category = state.merge(r#"{"vibration": {"direction": "1", "count": "3"}}"#);

        assert_eq!(category, Some(SensorCategory::Vibration));
        assert_eq!(state.vibration.direction, "1");
        assert_eq!(state.vibration.count, "3");
    }

    #[test]
    fn test_merge_normalizes_single_quotes() {
        let mut state = SensorState::default();
        let category = state.merge("{'temperature': {'temperature': '23.5', 'humidity': '40.1'}}\n");

        assert_eq!(category, Some(SensorCategory::Temperature));
        assert_eq!(state.temperature.temperature, "23.5");
        assert_eq!(state.temperature.humidity, "40.1");
    }

    #[test]
    fn test_merge_strips_trailing_crlf() {
        let mut state = SensorState::default();
        let category = state.merge("{\"location\": {\"latitude\": \"46.2\", \"longitude\": \"6.1\", \"altitude\": \"375\"}}\r\n");

        assert_eq!(category, Some(SensorCategory::Location));
        assert_eq!(state.location.latitude, "46.2");
    }

    #[test]
    fn test_merge_malformed_line_is_discarded() {
        let mut state = SensorState::default();
        let before = state.clone();

        assert_eq!(state.merge("not json at all"), None);
        assert_eq!(state.merge(r#"{"vibration": "#), None);
        assert_eq!(state, before);
    }

    #[test]
    fn test_merge_unknown_category_is_discarded() {
        let mut state = SensorState::default();
        let before = state.clone();

        assert_eq!(state.merge(r#"{"unknown_category": {}}"#), None);
        assert_eq!(state, before);
    }

    #[test]
    fn test_merge_replaces_wholesale_not_per_attribute() {
        let mut state = SensorState::default();
        state.merge(r#"{"vibration": {"direction": "2", "count": "7"}}"#);
        // A later record for a different category must not touch vibration.
        state.merge(r#"{"accelerometer": {"x": "0.1", "y": "0.2", "z": "0.9"}}"#);

        assert_eq!(state.vibration.direction, "2");
        assert_eq!(state.vibration.count, "7");
        assert_eq!(state.accelerometer.z, "0.9");
    }

    #[test]
    fn test_merge_cosmic_payload_is_free_form() {
        let mut state = SensorState::default();
        let category = state.merge(
            r#"{"event": {"event_number": "4", "ticks": "123", "adc": "[[0,1],[2,3]]"}}"#,
        );

        assert_eq!(category, Some(SensorCategory::Cosmic));
        assert_eq!(state.event["event_number"], "4");
        assert_eq!(state.event["adc"], "[[0,1],[2,3]]");
    }

    #[test]
    fn test_merge_accepts_bare_numeric_values() {
        let mut state = SensorState::default();
        let category = state.merge(r#"{"vibration": {"direction": 1, "count": 3}}"#);

        assert_eq!(category, Some(SensorCategory::Vibration));
        assert_eq!(state.vibration.direction, "1");
        assert_eq!(state.vibration.count, "3");
    }

    #[test]
    fn test_merge_keeps_numeric_values_in_textual_form() {
        let mut state = SensorState::default();
        let category = state.merge(r#"{"temperature": {"temperature": 23.5, "humidity": 40}}"#);

        assert_eq!(category, Some(SensorCategory::Temperature));
        assert_eq!(state.temperature.temperature, "23.5");
        assert_eq!(state.temperature.humidity, "40");
    }

    #[test]
    fn test_merged_field_round_trips() {
        let mut state = SensorState::default();
        state.merge(r#"{"barometer": {"temperature": "21.0", "pressure": "966.1", "altitude": "401.2"}}"#);

        let serialized = serde_json::to_value(&state.barometer).unwrap();
        assert_eq!(
            serialized,
            serde_json::json!({"temperature": "21.0", "pressure": "966.1", "altitude": "401.2"})
        );
    }
}
