//! Unified error types for the CO2 monitor firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level loop's error handling uniform.  All variants are `Copy` so they
//! can be carried inside events and health records without allocation.
//!
//! Most errors never reach the loop: they are absorbed next to their source
//! (a health-counter increment, a local reinitialisation).  Only an error that
//! escapes [`MonitorService::run_pass`](crate::app::service::MonitorService::run_pass)
//! is treated as fatal.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The CO2 sensor could not be read or reset.
    Sensor(SensorError),
    /// The digit display rejected a command.
    Display(DisplayError),
    /// The wireless link, broker session, or time sync failed.
    Comms(CommsError),
    /// A board-level peripheral (watchdog, LED GPIO) failed.
    Hardware(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Display(e) => write!(f, "display: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Hardware(msg) => write!(f, "hardware: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I2C transaction failed (NACK, arbitration loss, timeout).
    Bus,
    /// A measurement word failed its CRC-8 check.
    Crc,
    /// The sensor is not present or was never initialised.
    Unavailable,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "I2C bus error"),
            Self::Crc => write!(f, "CRC mismatch"),
            Self::Unavailable => write!(f, "sensor unavailable"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Display errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// Driving the CLK/DIO lines failed.
    Gpio,
    /// Brightness outside 0–7.
    InvalidBrightness,
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio => write!(f, "GPIO write failed"),
            Self::InvalidBrightness => write!(f, "brightness out of range"),
        }
    }
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The Wi-Fi interface could not be (de)activated.
    LinkActivateFailed,
    /// The join request was rejected outright.
    LinkConnectFailed,
    /// SSID or password does not fit the driver's limits.
    InvalidCredentials,
    /// The broker refused or never acknowledged the session.
    BrokerConnectFailed,
    /// No live broker session to publish on.
    NotConnected,
    /// A publish was not accepted by the session.
    PublishFailed,
    /// Closing the session reported an error.
    DisconnectFailed,
    /// SNTP did not complete within its retry budget.
    TimeSyncFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkActivateFailed => write!(f, "WiFi interface activation failed"),
            Self::LinkConnectFailed => write!(f, "WiFi connect failed"),
            Self::InvalidCredentials => write!(f, "WiFi credentials invalid"),
            Self::BrokerConnectFailed => write!(f, "MQTT connect failed"),
            Self::NotConnected => write!(f, "MQTT not connected"),
            Self::PublishFailed => write!(f, "MQTT publish failed"),
            Self::DisconnectFailed => write!(f, "MQTT disconnect failed"),
            Self::TimeSyncFailed => write!(f, "NTP sync failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
