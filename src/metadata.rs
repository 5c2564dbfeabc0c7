//! Read-only information recorded by the camera.
use std::fmt;

use serde_derive::*;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl RecordingTime {
    /// Whether the fields form a plausible calendar time. Files
    /// written without a clock carry all zeroes.
    pub fn is_valid(&self) -> bool {
        (1..=12).contains(&self.month)
            && (1..=31).contains(&self.day)
            && self.hour < 24
            && self.minute < 60
            && self.second < 61
    }
}

impl fmt::Display for RecordingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Temperature range (Celsius) the camera was set to at
/// recording time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRange {
    pub min: f32,
    pub max: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub device_name: String,
    pub part_number: String,
    pub firmware: String,
    pub serial_number: u32,
    /// Horizontal field of view in degrees.
    pub field_of_view: u16,
    pub recorded_at: RecordingTime,
    pub measurement_range: MeasurementRange,
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata {
            device_name: "Unknown".into(),
            part_number: String::new(),
            firmware: String::new(),
            serial_number: 0,
            field_of_view: 0,
            recorded_at: RecordingTime::default(),
            measurement_range: MeasurementRange::default(),
        }
    }
}

/// Decode a NUL padded text field.
pub(crate) fn text_field(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}
