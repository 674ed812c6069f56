//! System configuration parameters
//!
//! Network and broker settings are loaded once at startup through a
//! [`ConfigPort`](crate::app::ports::ConfigPort); everything else is a
//! compile-time constant.  Absent or broken configuration falls back to
//! placeholder values: the device still runs, the link and broker steps
//! simply fail, and the monitor operates offline.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{ConfigError, ConfigPort};

// --- Timing (seconds unless noted) ---

/// Sensor sampling cadence.
pub const SENSOR_READ_INTERVAL_SECS: u64 = 30;
/// Reading publish cadence.
pub const PUBLISH_INTERVAL_SECS: u64 = 30;
/// CO2 / comfort-index display alternation.
pub const DISPLAY_SWITCH_INTERVAL_SECS: u64 = 3;
/// Heap reclamation + Resource Guard check.
pub const RECLAIM_INTERVAL_SECS: u64 = 60;
/// Link / broker reconciliation.
pub const CONNECTION_CHECK_INTERVAL_SECS: u64 = 300;
/// System status report.
pub const STATUS_REPORT_INTERVAL_SECS: u64 = 3600;
/// Uptime after which a preventive reboot is taken.
pub const PREVENTIVE_REBOOT_SECS: u64 = 86_400;

/// Wall-clock budget of one loop pass (milliseconds).
pub const PASS_BUDGET_MS: u32 = 1000;
/// Liveness blink length (milliseconds).
pub const LED_BLINK_MS: u32 = 50;
/// Hardware watchdog timeout (milliseconds).
pub const WATCHDOG_TIMEOUT_MS: u32 = 30_000;

/// Link join polls, one per second.
pub const LINK_JOIN_POLLS: u32 = 30;
/// Pause between join polls and around the interface bounce (milliseconds).
pub const LINK_POLL_MS: u32 = 1000;

/// Pause that lets the log flush before an emergency reboot (milliseconds).
pub const EMERGENCY_FLUSH_MS: u32 = 1000;
/// Pause before a preventive reboot (milliseconds).
pub const PREVENTIVE_REBOOT_DELAY_MS: u32 = 2000;
/// Pause before a fatal-fault reboot (milliseconds).
pub const FATAL_REBOOT_DELAY_MS: u32 = 5000;

// --- Memory thresholds (free bytes) ---

pub const MEMORY_WARNING_THRESHOLD: u32 = 20_000;
pub const MEMORY_CRITICAL_THRESHOLD: u32 = 12_000;
pub const MEMORY_EMERGENCY_THRESHOLD: u32 = 8000;
/// Reclamation passes run before free memory is sampled.
pub const RECLAIM_PASSES: u32 = 3;

// --- Failure thresholds (consecutive failures) ---

/// Generic threshold, used for the wireless link.
pub const MAX_CONSECUTIVE_ERRORS: u32 = 20;
pub const MAX_SENSOR_FAILURES: u32 = 15;
pub const MAX_MQTT_FAILURES: u32 = 10;

// --- Telemetry ---

/// Largest plausible CO2 concentration (ppm); anything above is rejected.
pub const CO2_MAX_PPM: i32 = 50_000;

// --- Display ---

pub const DISPLAY_BRIGHTNESS: u8 = 7;

// --- Storage ---

/// Mount point of the SPIFFS data partition.
pub const FS_BASE_PATH: &str = "/spiffs";
pub const CONFIG_PATH: &str = "/spiffs/config.json";
pub const LOG_PATH: &str = "/spiffs/system.log";

// --- Log sink ---

/// The log file is deleted once it grows beyond this many bytes.
pub const LOG_MAX_BYTES: u64 = 50_000;

/// Network and broker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    // --- Wireless link ---
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,

    // --- Broker ---
    /// Broker host name or IPv4 address.
    pub mqtt_server: heapless::String<64>,
    pub mqtt_port: u16,
    /// MQTT client id; also published as `device_id`.
    pub mqtt_client_id: heapless::String<32>,
    /// Session keepalive, extended for long unattended runs.
    pub mqtt_keepalive_secs: u16,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: fixed("YOUR_WIFI_SSID"),
            wifi_password: fixed("YOUR_WIFI_PASSWORD"),
            mqtt_server: fixed("192.168.1.100"),
            mqtt_port: 1883,
            mqtt_client_id: fixed("pico_w_co2_monitor"),
            mqtt_keepalive_secs: 120,
        }
    }
}

impl MonitorConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wifi_ssid.is_empty() {
            return Err(ConfigError::ValidationFailed("wifi_ssid is empty"));
        }
        if self.mqtt_server.is_empty() {
            return Err(ConfigError::ValidationFailed("mqtt_server is empty"));
        }
        if self.mqtt_port == 0 {
            return Err(ConfigError::ValidationFailed("mqtt_port must be non-zero"));
        }
        if self.mqtt_client_id.is_empty() {
            return Err(ConfigError::ValidationFailed("mqtt_client_id is empty"));
        }
        if self.mqtt_keepalive_secs == 0 {
            return Err(ConfigError::ValidationFailed("mqtt_keepalive_secs must be non-zero"));
        }
        Ok(())
    }
}

/// Load the configuration once, falling back to placeholders on any error.
pub fn load_or_default(store: &impl ConfigPort) -> MonitorConfig {
    match store.load() {
        Ok(cfg) => {
            info!("Config loaded (SSID='{}', broker={}:{})", cfg.wifi_ssid, cfg.mqtt_server, cfg.mqtt_port);
            cfg
        }
        Err(e) => {
            warn!("Config load failed ({}), using placeholder defaults", e);
            MonitorConfig::default()
        }
    }
}

/// Copy `s` into a fixed-capacity string, truncating at capacity.
fn fixed<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
