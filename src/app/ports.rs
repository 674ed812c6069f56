//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! Every device the monitor talks to (sensor, display, radio, broker, clock,
//! watchdog, heap, reset line) is reached through one of these traits.  The
//! [`MonitorService`](super::service::MonitorService) consumes them via
//! generics or `&mut dyn`, so the core never touches hardware directly and
//! every resilience path can be driven by a mock.
//!
//! All port errors are typed: callers handle every failure explicitly at the
//! call site instead of unwinding.

use core::net::Ipv4Addr;

use crate::config::MonitorConfig;
use crate::error::{CommsError, DisplayError, Error, SensorError};
use crate::telemetry::RawSample;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// CO2 / temperature / humidity sensor.
///
/// The adapter decides which fields a sample carries; the core never probes
/// for alternate field names.
pub trait SensorPort {
    /// Whether a fresh measurement is waiting.
    fn data_ready(&mut self) -> Result<bool, SensorError>;

    /// Fetch the pending measurement.
    fn read(&mut self) -> Result<RawSample, SensorError>;

    /// Restart the sensor's measurement cycle.
    fn reset(&mut self) -> Result<(), SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → 4-digit display)
// ───────────────────────────────────────────────────────────────

pub trait DisplayPort {
    /// Show up to four characters, left-aligned.
    fn show(&mut self, text: &str) -> Result<(), DisplayError>;

    /// Show an integer, right-aligned.
    fn show_number(&mut self, value: i32) -> Result<(), DisplayError>;

    /// Set brightness, 0 (dim) – 7 (bright).
    fn set_brightness(&mut self, level: u8) -> Result<(), DisplayError>;
}

// ───────────────────────────────────────────────────────────────
// Wireless link port
// ───────────────────────────────────────────────────────────────

pub trait LinkPort {
    /// Power the station interface up or down.
    fn activate(&mut self, on: bool) -> Result<(), CommsError>;

    /// Request an association.  Returns once the request is issued; poll
    /// [`is_connected`](Self::is_connected) for the outcome.
    fn connect(&mut self, ssid: &str, password: &str) -> Result<(), CommsError>;

    fn is_connected(&self) -> bool;

    /// Address assigned by DHCP, when associated.
    fn local_address(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// Broker ports
// ───────────────────────────────────────────────────────────────

/// Logical publish channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// `{co2}` only.
    Co2,
    /// Combined reading.
    Sensor,
    /// Hourly system status.
    Status,
}

impl Topic {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Co2 => "co2_data",
            Self::Sensor => "sensor_data",
            Self::Status => "system_status",
        }
    }
}

/// Opens broker sessions.  Each call yields a brand-new session; stale
/// sessions are never revived.
pub trait BrokerConnector {
    type Session: BrokerSession;

    fn connect(&mut self, config: &MonitorConfig) -> Result<Self::Session, CommsError>;
}

/// A live broker session.  Replaced wholesale, never repaired in place.
pub trait BrokerSession {
    fn publish(&mut self, topic: Topic, payload: &[u8]) -> Result<(), CommsError>;

    fn disconnect(&mut self) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Platform services
// ───────────────────────────────────────────────────────────────

/// Monotonic and wall-clock time plus bounded sleeping.
pub trait TimePort {
    /// Milliseconds since boot (monotonic).
    fn uptime_ms(&self) -> u64;

    /// Seconds since the Unix epoch (meaningful after a time sync).
    fn unix_time(&self) -> u64;

    /// Block for `ms` milliseconds.
    fn sleep_ms(&mut self, ms: u32);

    /// Seconds since boot (monotonic).
    fn uptime_secs(&self) -> u64 {
        self.uptime_ms() / 1000
    }
}

/// One-shot, best-effort wall-clock synchronisation.
pub trait TimeSyncPort {
    fn sync(&mut self) -> Result<(), CommsError>;
}

/// Hardware countdown timer.  If not fed within its timeout the device
/// reboots unconditionally.
pub trait WatchdogPort {
    fn arm(&mut self, timeout_ms: u32) -> Result<(), Error>;

    fn feed(&mut self);
}

/// Free-heap observation.
pub trait MemoryProbe {
    /// Run one reclamation pass (compaction, cache release).
    fn reclaim(&mut self);

    /// Free heap in bytes right now.
    fn free_bytes(&mut self) -> u32;
}

/// Single liveness LED.
pub trait IndicatorPort {
    fn set(&mut self, on: bool) -> Result<(), Error>;
}

/// The one place a reboot actually happens.  On hardware it never returns.
pub trait RebootPort {
    fn reboot(&mut self, reason: RebootReason);
}

/// Why the process is being restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootReason {
    /// Free heap fell below the emergency threshold.
    MemoryExhausted,
    /// Scheduled uptime-bounded restart.
    Preventive,
    /// An error escaped the main loop.
    Fatal,
}

impl core::fmt::Display for RebootReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MemoryExhausted => write!(f, "memory exhausted"),
            Self::Preventive => write!(f, "preventive"),
            Self::Fatal => write!(f, "fatal error"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, log file).
/// Emitting must never fail.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads the startup configuration.
///
/// Implementations MUST validate before returning: invalid ranges are
/// reported as [`ConfigError::ValidationFailed`], never silently clamped.
pub trait ConfigPort {
    fn load(&self) -> Result<MonitorConfig, ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No config stored (first boot).
    NotFound,
    /// Stored config failed deserialization (malformed or oversized field).
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Per-call bundle of platform services
// ───────────────────────────────────────────────────────────────

/// Platform services the loop borrows for the duration of one call.
///
/// Devices that are *replaced* during operation (sensor, display, link,
/// broker session) are owned by the service; everything here lives for the
/// whole process and is only borrowed.
pub struct SystemPorts<'a> {
    pub time: &'a mut dyn TimePort,
    pub watchdog: &'a mut dyn WatchdogPort,
    pub memory: &'a mut dyn MemoryProbe,
    pub indicator: &'a mut dyn IndicatorPort,
    pub time_sync: &'a mut dyn TimeSyncPort,
    pub sink: &'a mut dyn EventSink,
}
