use serde::{Deserialize, Serialize};
use std::fmt;

/// A single sensor value. Untagged, so it goes over the wire as a bare
/// JSON boolean or number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Presence(bool),
    Rainfall(f64),
}

/// Request body for the device telemetry endpoint. The receiver stamps the
/// time, so only the value is sent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPayload {
    pub value: Reading,
}

impl TelemetryPayload {
    pub fn new(value: Reading) -> Self {
        Self { value }
    }
}

impl fmt::Display for TelemetryPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
