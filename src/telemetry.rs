//! Telemetry model.
//!
//! Holds the latest validated [`Reading`] and derives the comfort index
//! (temperature-humidity index, THI) from it.  A reading is replaced
//! wholesale by each accepted sample and never partially mutated: a rejected
//! sample leaves the previous reading exactly as it was.

use crate::config::CO2_MAX_PPM;

/// A measurement as delivered by the sensor adapter, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawSample {
    pub co2_ppm: Option<i32>,
    pub temperature_c: Option<f32>,
    pub humidity_percent: Option<f32>,
}

/// The latest validated measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    pub co2_ppm: Option<u32>,
    pub temperature_c: Option<f32>,
    pub humidity_percent: Option<f32>,
    /// Present iff both temperature and humidity are present.
    pub comfort_index: Option<f32>,
}

/// Why a sample was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// CO2 outside `0..=50000` ppm.
    Co2OutOfRange(i32),
}

impl core::fmt::Display for Rejected {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Co2OutOfRange(ppm) => write!(f, "Invalid CO2: {ppm}"),
        }
    }
}

/// Comfort index, rounded to one decimal.
///
/// `0.81·T + 0.01·H·(0.99·T − 14.3) + 46.3`
pub fn comfort_index(temperature_c: f32, humidity_percent: f32) -> f32 {
    let thi = 0.81 * temperature_c
        + 0.01 * humidity_percent * (0.99 * temperature_c - 14.3)
        + 46.3;
    round_to(thi, 1)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f32, decimals: i32) -> f32 {
    let scale = 10f32.powi(decimals);
    (value * scale).round() / scale
}

/// Owner of the latest reading and the success counter.
#[derive(Debug, Default)]
pub struct TelemetryModel {
    latest: Option<Reading>,
    successful_readings: u32,
}

impl TelemetryModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `raw` and, if accepted, make it the current reading.
    ///
    /// Non-finite temperature or humidity values are treated as absent.
    pub fn ingest_sample(&mut self, raw: RawSample) -> Result<Reading, Rejected> {
        let co2_ppm = match raw.co2_ppm {
            Some(ppm) if !(0..=CO2_MAX_PPM).contains(&ppm) => {
                return Err(Rejected::Co2OutOfRange(ppm));
            }
            Some(ppm) => Some(ppm as u32),
            None => None,
        };

        let temperature_c = raw.temperature_c.filter(|t| t.is_finite());
        let humidity_percent = raw.humidity_percent.filter(|h| h.is_finite());
        let comfort_index = match (temperature_c, humidity_percent) {
            (Some(t), Some(h)) => Some(comfort_index(t, h)),
            _ => None,
        };

        let reading = Reading {
            co2_ppm,
            temperature_c,
            humidity_percent,
            comfort_index,
        };
        self.latest = Some(reading);
        self.successful_readings = self.successful_readings.wrapping_add(1);
        Ok(reading)
    }

    /// Latest accepted reading, if any.
    pub fn latest(&self) -> Option<&Reading> {
        self.latest.as_ref()
    }

    /// Latest CO2 value, if any reading carried one.
    pub fn co2_ppm(&self) -> Option<u32> {
        self.latest.and_then(|r| r.co2_ppm)
    }

    pub fn successful_readings(&self) -> u32 {
        self.successful_readings
    }
}
