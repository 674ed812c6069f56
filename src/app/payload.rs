//! Published payload shapes.
//!
//! Absent measurements are omitted from the JSON, never sent as `null`.
//! Climate values are rounded to two decimals on the wire.

use serde::Serialize;

use crate::telemetry::{Reading, round_to};

/// `co2_data` topic.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Co2Payload {
    pub co2: u32,
}

/// `sensor_data` topic.
#[derive(Debug, Clone, Serialize)]
pub struct SensorPayload<'a> {
    pub timestamp: u64,
    pub device_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co2: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thi: Option<f32>,
}

impl<'a> SensorPayload<'a> {
    pub fn from_reading(reading: &Reading, timestamp: u64, device_id: &'a str) -> Self {
        Self {
            timestamp,
            device_id,
            co2: reading.co2_ppm,
            temperature: reading.temperature_c.map(|t| round_to(t, 2)),
            humidity: reading.humidity_percent.map(|h| round_to(h, 2)),
            thi: reading.comfort_index.map(|c| round_to(c, 2)),
        }
    }

    /// Whether anything beyond `timestamp`/`device_id` would be sent.
    pub fn has_measurements(&self) -> bool {
        self.co2.is_some()
            || self.temperature.is_some()
            || self.humidity.is_some()
            || self.thi.is_some()
    }
}

/// `system_status` topic.
#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload<'a> {
    pub uptime: u64,
    pub memory_free: u32,
    pub successful_readings: u32,
    pub successful_transmissions: u32,
    pub sensor_errors: u32,
    pub mqtt_errors: u32,
    pub wifi_errors: u32,
    pub timestamp: u64,
    pub device_id: &'a str,
}
